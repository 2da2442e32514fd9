// ==========================================
// 学籍课程规则引擎 - 课程学期位置
// ==========================================
// 职责: 学年 / 学期 / 季度位置树,提供绝对序号与跨粒度比较
// 说明: 与日历无关,只表示课程在培养方案中的抽象位置
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::{CurricularPeriodId, CurricularPeriodType, PlanId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurricularPeriod {
    pub id: CurricularPeriodId,
    pub period_type: CurricularPeriodType,
    pub child_order: u8, // 在父位置中的序号 (从 1 开始)
    pub parent: Option<CurricularPeriodId>,
}

// ==========================================
// CurricularPeriods - 位置树 (计划内 arena)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurricularPeriods {
    plan: PlanId,
    periods: BTreeMap<CurricularPeriodId, CurricularPeriod>,
    next_seq: u32,
}

impl CurricularPeriods {
    pub fn new(plan: PlanId) -> Self {
        Self {
            plan,
            periods: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn get(&self, id: CurricularPeriodId) -> Option<&CurricularPeriod> {
        self.periods.get(&id)
    }

    pub fn contains(&self, id: CurricularPeriodId) -> bool {
        self.periods.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurricularPeriod> {
        self.periods.values()
    }

    fn find(
        &self,
        parent: Option<CurricularPeriodId>,
        period_type: CurricularPeriodType,
        order: u8,
    ) -> Option<CurricularPeriodId> {
        self.periods
            .values()
            .find(|p| p.parent == parent && p.period_type == period_type && p.child_order == order)
            .map(|p| p.id)
    }

    fn insert(
        &mut self,
        parent: Option<CurricularPeriodId>,
        period_type: CurricularPeriodType,
        order: u8,
    ) -> CurricularPeriodId {
        if let Some(existing) = self.find(parent, period_type, order) {
            return existing;
        }
        self.next_seq += 1;
        let id = CurricularPeriodId::new(self.plan, self.next_seq);
        self.periods.insert(
            id,
            CurricularPeriod {
                id,
                period_type,
                child_order: order,
                parent,
            },
        );
        id
    }

    /// 取得 (或创建) 第 year 学年
    pub fn year(&mut self, year: u8) -> DomainResult<CurricularPeriodId> {
        if year == 0 {
            return Err(DomainError::InvalidCurricularPeriod("学年序号从 1 开始".to_string()));
        }
        Ok(self.insert(None, CurricularPeriodType::Year, year))
    }

    /// 取得 (或创建) 第 year 学年第 semester 学期
    pub fn semester(&mut self, year: u8, semester: u8) -> DomainResult<CurricularPeriodId> {
        if !(1..=2).contains(&semester) {
            return Err(DomainError::InvalidCurricularPeriod(format!(
                "学期序号无效: {}",
                semester
            )));
        }
        let parent = self.year(year)?;
        Ok(self.insert(Some(parent), CurricularPeriodType::Semester, semester))
    }

    /// 取得 (或创建) 第 year 学年第 semester 学期第 trimester 季度
    pub fn trimester(
        &mut self,
        year: u8,
        semester: u8,
        trimester: u8,
    ) -> DomainResult<CurricularPeriodId> {
        if !(1..=2).contains(&trimester) {
            return Err(DomainError::InvalidCurricularPeriod(format!(
                "季度序号无效: {}",
                trimester
            )));
        }
        let parent = self.semester(year, semester)?;
        Ok(self.insert(Some(parent), CurricularPeriodType::Trimester, trimester))
    }

    /// 同粒度下的绝对序号 (如 第2学年第1学期 → 3)
    pub fn absolute_order(&self, id: CurricularPeriodId) -> Option<u32> {
        let period = self.periods.get(&id)?;
        match period.parent {
            None => Some(period.child_order as u32),
            Some(parent_id) => {
                let parent = self.periods.get(&parent_id)?;
                let per_parent =
                    parent.period_type.quarter_units() / period.period_type.quarter_units();
                let parent_order = self.absolute_order(parent_id)?;
                Some((parent_order - 1) * per_parent + period.child_order as u32)
            }
        }
    }

    /// 所在学年序号
    pub fn year_order(&self, id: CurricularPeriodId) -> Option<u8> {
        let year = self.year_period(id)?;
        self.periods.get(&year).map(|period| period.child_order)
    }

    /// 所在学期序号 (学年位置返回 None, 季度返回所属学期)
    pub fn semester_order(&self, id: CurricularPeriodId) -> Option<u8> {
        let period = self.periods.get(&id)?;
        match period.period_type {
            CurricularPeriodType::Year => None,
            CurricularPeriodType::Semester => Some(period.child_order),
            CurricularPeriodType::Trimester => self.semester_order(period.parent?),
        }
    }

    /// 以季度为单位的位置区间 [start, end)
    fn position(&self, id: CurricularPeriodId) -> Option<(u32, u32)> {
        let period = self.periods.get(&id)?;
        let units = period.period_type.quarter_units();
        let order = self.absolute_order(id)?;
        Some(((order - 1) * units, order * units))
    }

    /// a 是否完全位于 b 之前 (跨粒度)
    pub fn is_before(&self, a: CurricularPeriodId, b: CurricularPeriodId) -> bool {
        match (self.position(a), self.position(b)) {
            (Some((_, a_end)), Some((b_start, _))) => a_end <= b_start,
            _ => false,
        }
    }

    /// 所在学年位置
    pub fn year_period(&self, id: CurricularPeriodId) -> Option<CurricularPeriodId> {
        let mut current = self.periods.get(&id)?;
        while let Some(parent) = current.parent {
            current = self.periods.get(&parent)?;
        }
        Some(current.id)
    }

    /// 位置是否与所在学年的指定学期重叠 (整学年位置与每个学期都重叠)
    pub fn overlaps_semesters(&self, id: CurricularPeriodId, semesters: &BTreeSet<u8>) -> bool {
        let (Some((start, end)), Some(year)) = (self.position(id), self.year_order(id)) else {
            return false;
        };
        let year_start = (year as u32 - 1) * CurricularPeriodType::Year.quarter_units();
        let units = CurricularPeriodType::Semester.quarter_units();
        semesters.iter().filter(|order| **order > 0).any(|order| {
            let semester_start = year_start + (*order as u32 - 1) * units;
            start < semester_start + units && semester_start < end
        })
    }
}
