// ==========================================
// 学籍课程规则引擎 - 课程规则定义
// ==========================================
// 职责: 封闭的规则变体集合 + 公共字段 (挂载模块、上下文范围、有效期)
// 红线: 新增规则 = 扩展枚举变体, 不做继承式钩子
// 红线: 上下限不一致的规则在创建时拒绝, 不留到评估期
// ==========================================

use crate::domain::calendar::ValidityWindow;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::{ContextId, CurricularRuleId, CurricularRuleType, DegreeModuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CurricularRuleKind {
    /// 学分区间 [min, max]
    CreditsLimit { min_credits: f64, max_credits: f64 },
    /// 子模块数量区间 [min, max]
    DegreeModulesSelectionLimit { min_modules: u32, max_modules: u32 },
    /// 指定模块集合须全部通过 (可在另一课程组内计数)
    DegreeModuleSetApproval {
        required_modules: BTreeSet<DegreeModuleId>,
        approval_group: Option<DegreeModuleId>,
        show_warning: bool,
    },
    /// 先修学年须已完成 / 已选
    PreviousYearsEnrolment,
    /// 须由协调人选课
    EnrolmentToBeApprovedByCoordinator,
}

impl CurricularRuleKind {
    pub fn rule_type(&self) -> CurricularRuleType {
        match self {
            CurricularRuleKind::CreditsLimit { .. } => CurricularRuleType::CreditsLimit,
            CurricularRuleKind::DegreeModulesSelectionLimit { .. } => {
                CurricularRuleType::DegreeModulesSelectionLimit
            }
            CurricularRuleKind::DegreeModuleSetApproval { .. } => {
                CurricularRuleType::DegreeModuleSetApproval
            }
            CurricularRuleKind::PreviousYearsEnrolment => CurricularRuleType::PreviousYearsEnrolment,
            CurricularRuleKind::EnrolmentToBeApprovedByCoordinator => {
                CurricularRuleType::EnrolmentToBeApprovedByCoordinator
            }
        }
    }

    /// 是否参与结业判定 (先修学年 / 协调人门控只作用于选课)
    pub fn is_conclusion_rule(&self) -> bool {
        matches!(
            self,
            CurricularRuleKind::CreditsLimit { .. }
                | CurricularRuleKind::DegreeModulesSelectionLimit { .. }
                | CurricularRuleKind::DegreeModuleSetApproval { .. }
        )
    }

    /// 是否只能挂载在课程组上
    pub fn requires_course_group(&self) -> bool {
        matches!(
            self,
            CurricularRuleKind::CreditsLimit { .. }
                | CurricularRuleKind::DegreeModulesSelectionLimit { .. }
                | CurricularRuleKind::DegreeModuleSetApproval { .. }
        )
    }

    /// 变体载荷自洽性校验
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            CurricularRuleKind::CreditsLimit {
                min_credits,
                max_credits,
            } => validate_limits(*min_credits, *max_credits),
            CurricularRuleKind::DegreeModulesSelectionLimit {
                min_modules,
                max_modules,
            } => validate_limits(*min_modules as f64, *max_modules as f64),
            CurricularRuleKind::DegreeModuleSetApproval {
                required_modules, ..
            } => {
                if required_modules.is_empty() {
                    Err(DomainError::EmptyApprovalSet)
                } else {
                    Ok(())
                }
            }
            CurricularRuleKind::PreviousYearsEnrolment
            | CurricularRuleKind::EnrolmentToBeApprovedByCoordinator => Ok(()),
        }
    }

    /// 规则引用的其他学位模块 (用于计划归属校验)
    pub fn referenced_modules(&self) -> Vec<DegreeModuleId> {
        match self {
            CurricularRuleKind::DegreeModuleSetApproval {
                required_modules,
                approval_group,
                ..
            } => required_modules
                .iter()
                .copied()
                .chain(approval_group.iter().copied())
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn validate_limits(min: f64, max: f64) -> DomainResult<()> {
    if !min.is_finite() || min < 0.0 {
        return Err(DomainError::NegativeLimit(min));
    }
    if !max.is_finite() || max < 0.0 {
        return Err(DomainError::NegativeLimit(max));
    }
    if min > max {
        return Err(DomainError::InconsistentLimits { min, max });
    }
    Ok(())
}

// ==========================================
// CurricularRule - 课程规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurricularRule {
    pub id: CurricularRuleId,
    pub degree_module_to_apply_rule: DegreeModuleId,
    /// 仅当模块位于该父课程组下时生效
    pub context_course_group: Option<DegreeModuleId>,
    /// 仅当模块经由该上下文到达时生效
    pub context: Option<ContextId>,
    pub window: ValidityWindow,
    pub kind: CurricularRuleKind,
}

impl CurricularRule {
    pub fn rule_type(&self) -> CurricularRuleType {
        self.kind.rule_type()
    }

    /// 同一变体、同一范围的规则按时间相互替代
    pub(crate) fn supersession_key(
        &self,
    ) -> (CurricularRuleType, Option<DegreeModuleId>, Option<ContextId>) {
        (self.rule_type(), self.context_course_group, self.context)
    }
}

/// 新建规则的描述 (id 由计划分配)
#[derive(Debug, Clone, PartialEq)]
pub struct NewCurricularRule {
    pub degree_module_to_apply_rule: DegreeModuleId,
    pub context_course_group: Option<DegreeModuleId>,
    pub context: Option<ContextId>,
    pub window: ValidityWindow,
    pub kind: CurricularRuleKind,
}

impl NewCurricularRule {
    pub fn new(module: DegreeModuleId, window: ValidityWindow, kind: CurricularRuleKind) -> Self {
        Self {
            degree_module_to_apply_rule: module,
            context_course_group: None,
            context: None,
            window,
            kind,
        }
    }

    pub fn with_context_course_group(mut self, group: DegreeModuleId) -> Self {
        self.context_course_group = Some(group);
        self
    }

    pub fn with_context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_limit_min_above_max_rejected() {
        let kind = CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules: 4,
            max_modules: 3,
        };
        assert!(matches!(
            kind.validate(),
            Err(DomainError::InconsistentLimits { .. })
        ));
    }

    #[test]
    fn test_credits_limit_negative_rejected() {
        let kind = CurricularRuleKind::CreditsLimit {
            min_credits: -1.0,
            max_credits: 6.0,
        };
        assert!(matches!(kind.validate(), Err(DomainError::NegativeLimit(_))));
    }

    #[test]
    fn test_enrolment_only_rules_are_not_conclusion_rules() {
        assert!(!CurricularRuleKind::PreviousYearsEnrolment.is_conclusion_rule());
        assert!(!CurricularRuleKind::EnrolmentToBeApprovedByCoordinator.is_conclusion_rule());
        assert!(CurricularRuleKind::CreditsLimit {
            min_credits: 0.0,
            max_credits: 6.0
        }
        .is_conclusion_rule());
    }
}
