// ==========================================
// 学籍课程规则引擎 - 选课校验分组
// ==========================================
// 职责: 描述先修学年规则按哪些学期序号分组校验
// 规则:
// - YEAR 模型: 同一学年两个学期作为一个校验组
// - SEMESTER 模型: 每个学期独立成组
// - 显式配置: 条目列表覆盖模型默认分组
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::EnrolmentModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 一个独立校验组包含的学期序号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolmentModelConfigEntry {
    pub period_orders: BTreeSet<u8>,
}

impl EnrolmentModelConfigEntry {
    pub fn new(orders: impl IntoIterator<Item = u8>) -> Self {
        Self {
            period_orders: orders.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolmentModelConfig {
    pub entries: Vec<EnrolmentModelConfigEntry>,
}

impl EnrolmentModelConfig {
    /// 选课模型对应的默认分组
    pub fn for_model(model: EnrolmentModel) -> Self {
        let entries = match model {
            EnrolmentModel::Year => vec![EnrolmentModelConfigEntry::new([1, 2])],
            EnrolmentModel::Semester => vec![
                EnrolmentModelConfigEntry::new([1]),
                EnrolmentModelConfigEntry::new([2]),
            ],
        };
        Self { entries }
    }

    /// 条目非空且互不重叠
    pub fn validate(&self) -> DomainResult<()> {
        if self.entries.is_empty() {
            return Err(DomainError::InvalidEnrolmentModelConfig("分组为空".to_string()));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.entries {
            if entry.period_orders.is_empty() {
                return Err(DomainError::InvalidEnrolmentModelConfig(
                    "分组条目不能为空".to_string(),
                ));
            }
            for order in &entry.period_orders {
                if *order == 0 || !seen.insert(*order) {
                    return Err(DomainError::InvalidEnrolmentModelConfig(format!(
                        "学期序号重复或无效: {}",
                        order
                    )));
                }
            }
        }
        Ok(())
    }

    /// 学期序号所在的校验组 (未配置的学期独立成组)
    pub fn group_for(&self, semester_order: u8) -> BTreeSet<u8> {
        self.entries
            .iter()
            .find(|entry| entry.period_orders.contains(&semester_order))
            .map(|entry| entry.period_orders.clone())
            .unwrap_or_else(|| BTreeSet::from([semester_order]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_model_groups_both_semesters() {
        let config = EnrolmentModelConfig::for_model(EnrolmentModel::Year);
        assert_eq!(config.group_for(1), BTreeSet::from([1, 2]));
        assert_eq!(config.group_for(2), BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_semester_model_isolates_semesters() {
        let config = EnrolmentModelConfig::for_model(EnrolmentModel::Semester);
        assert_eq!(config.group_for(1), BTreeSet::from([1]));
        assert_eq!(config.group_for(2), BTreeSet::from([2]));
    }

    #[test]
    fn test_overlapping_entries_rejected() {
        let config = EnrolmentModelConfig {
            entries: vec![
                EnrolmentModelConfigEntry::new([1, 2]),
                EnrolmentModelConfigEntry::new([2]),
            ],
        };
        assert!(config.validate().is_err());
    }
}
