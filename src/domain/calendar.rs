// ==========================================
// 学籍课程规则引擎 - 执行学期日历
// ==========================================
// 职责: 执行学年 / 学期的排序、前后查找、有效期判定
// 红线: 有效期结束学期为空表示开放 (无限远)
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::ExecutionIntervalId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ExecutionInterval - 执行学年 / 学期
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionIntervalKind {
    Year,
    Semester(u8),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionInterval {
    pub id: ExecutionIntervalId,
    pub name: String,
    pub kind: ExecutionIntervalKind,
    pub begin: NaiveDate,
    pub end: NaiveDate,                      // 含当日
    pub parent: Option<ExecutionIntervalId>, // 学期所属学年
}

impl ExecutionInterval {
    pub fn is_year(&self) -> bool {
        matches!(self.kind, ExecutionIntervalKind::Year)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.begin <= date && date <= self.end
    }
}

// ==========================================
// Trait: ExecutionCalendar
// ==========================================
// 用途: 规则有效期判定与先修年份推导所需的日历查询
// 实现者: AcademicCalendar（内存日历）
pub trait ExecutionCalendar: Send + Sync {
    fn interval(&self, id: ExecutionIntervalId) -> Option<&ExecutionInterval>;

    /// a 是否早于或等于 b (按开始日期)
    fn is_before_or_equals(&self, a: ExecutionIntervalId, b: ExecutionIntervalId) -> bool;

    /// 同粒度的下一个执行期
    fn next(&self, id: ExecutionIntervalId) -> Option<ExecutionIntervalId>;

    /// 同粒度的上一个执行期
    fn previous(&self, id: ExecutionIntervalId) -> Option<ExecutionIntervalId>;

    /// 学年下的学期 (学期返回空)
    fn child_intervals(&self, id: ExecutionIntervalId) -> Vec<ExecutionIntervalId>;

    /// 执行期所属学年 (学年返回自身)
    fn year_of(&self, id: ExecutionIntervalId) -> Option<ExecutionIntervalId>;
}

// ==========================================
// AcademicCalendar - 内存执行日历
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcademicCalendar {
    intervals: BTreeMap<ExecutionIntervalId, ExecutionInterval>,
    next_seq: u32,
}

impl AcademicCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> ExecutionIntervalId {
        self.next_seq += 1;
        ExecutionIntervalId(self.next_seq)
    }

    /// 新增执行学年
    pub fn add_year(
        &mut self,
        name: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<ExecutionIntervalId> {
        if begin >= end {
            return Err(DomainError::InvalidExecutionInterval(format!(
                "{}: begin={} end={}",
                name, begin, end
            )));
        }
        if self
            .intervals
            .values()
            .any(|other| other.is_year() && other.begin <= end && begin <= other.end)
        {
            return Err(DomainError::InvalidExecutionInterval(format!(
                "{}: 与已有学年重叠",
                name
            )));
        }

        let id = self.allocate();
        self.intervals.insert(
            id,
            ExecutionInterval {
                id,
                name: name.to_string(),
                kind: ExecutionIntervalKind::Year,
                begin,
                end,
                parent: None,
            },
        );
        Ok(id)
    }

    /// 在学年下新增学期
    pub fn add_semester(
        &mut self,
        year: ExecutionIntervalId,
        order: u8,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<ExecutionIntervalId> {
        let year_interval = self
            .intervals
            .get(&year)
            .filter(|interval| interval.is_year())
            .ok_or(DomainError::UnknownExecutionInterval(year))?;

        if begin >= end || begin < year_interval.begin || end > year_interval.end {
            return Err(DomainError::InvalidExecutionInterval(format!(
                "学期 {} 超出学年 {} 范围",
                order, year_interval.name
            )));
        }
        let duplicated = self.intervals.values().any(|other| {
            other.parent == Some(year) && other.kind == ExecutionIntervalKind::Semester(order)
        });
        if order == 0 || duplicated {
            return Err(DomainError::InvalidExecutionInterval(format!(
                "学年 {} 学期序号无效: {}",
                year_interval.name, order
            )));
        }

        let name = format!("{} S{}", year_interval.name, order);
        let id = self.allocate();
        self.intervals.insert(
            id,
            ExecutionInterval {
                id,
                name,
                kind: ExecutionIntervalKind::Semester(order),
                begin,
                end,
                parent: Some(year),
            },
        );
        Ok(id)
    }

    /// 同粒度执行期,按开始日期排序
    fn same_granularity(&self, id: ExecutionIntervalId) -> Vec<&ExecutionInterval> {
        let Some(reference) = self.intervals.get(&id) else {
            return Vec::new();
        };
        let mut peers: Vec<&ExecutionInterval> = self
            .intervals
            .values()
            .filter(|other| other.is_year() == reference.is_year())
            .collect();
        peers.sort_by_key(|interval| (interval.begin, interval.id));
        peers
    }
}

impl ExecutionCalendar for AcademicCalendar {
    fn interval(&self, id: ExecutionIntervalId) -> Option<&ExecutionInterval> {
        self.intervals.get(&id)
    }

    fn is_before_or_equals(&self, a: ExecutionIntervalId, b: ExecutionIntervalId) -> bool {
        match (self.intervals.get(&a), self.intervals.get(&b)) {
            (Some(a), Some(b)) => a.begin <= b.begin,
            _ => false,
        }
    }

    fn next(&self, id: ExecutionIntervalId) -> Option<ExecutionIntervalId> {
        let peers = self.same_granularity(id);
        let index = peers.iter().position(|interval| interval.id == id)?;
        peers.get(index + 1).map(|interval| interval.id)
    }

    fn previous(&self, id: ExecutionIntervalId) -> Option<ExecutionIntervalId> {
        let peers = self.same_granularity(id);
        let index = peers.iter().position(|interval| interval.id == id)?;
        index.checked_sub(1).map(|prev| peers[prev].id)
    }

    fn child_intervals(&self, id: ExecutionIntervalId) -> Vec<ExecutionIntervalId> {
        let mut children: Vec<&ExecutionInterval> = self
            .intervals
            .values()
            .filter(|interval| interval.parent == Some(id))
            .collect();
        children.sort_by_key(|interval| interval.begin);
        children.into_iter().map(|interval| interval.id).collect()
    }

    fn year_of(&self, id: ExecutionIntervalId) -> Option<ExecutionIntervalId> {
        let interval = self.intervals.get(&id)?;
        match interval.parent {
            Some(parent) => Some(parent),
            None => Some(interval.id),
        }
    }
}

// ==========================================
// ValidityWindow - 有效期窗口
// ==========================================
// 以执行期为粒度: [begin 的开始日期, end 的结束日期], end 为空表示开放
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub begin: ExecutionIntervalId,
    pub end: Option<ExecutionIntervalId>,
}

impl ValidityWindow {
    pub fn new(begin: ExecutionIntervalId, end: Option<ExecutionIntervalId>) -> Self {
        Self { begin, end }
    }

    pub fn open(begin: ExecutionIntervalId) -> Self {
        Self { begin, end: None }
    }

    /// 校验窗口引用存在且开始不晚于结束
    pub fn validate(&self, calendar: &dyn ExecutionCalendar) -> DomainResult<()> {
        calendar
            .interval(self.begin)
            .ok_or(DomainError::UnknownExecutionInterval(self.begin))?;
        if let Some(end) = self.end {
            calendar
                .interval(end)
                .ok_or(DomainError::UnknownExecutionInterval(end))?;
            if !calendar.is_before_or_equals(self.begin, end) {
                return Err(DomainError::InvalidValidityWindow {
                    begin: self.begin,
                    end,
                });
            }
        }
        Ok(())
    }

    /// 日期范围 (结束为 None 表示开放)
    pub fn date_range(&self, calendar: &dyn ExecutionCalendar) -> Option<(NaiveDate, Option<NaiveDate>)> {
        let begin = calendar.interval(self.begin)?.begin;
        let end = match self.end {
            Some(end) => Some(calendar.interval(end)?.end),
            None => None,
        };
        Some((begin, end))
    }

    pub fn begin_date(&self, calendar: &dyn ExecutionCalendar) -> Option<NaiveDate> {
        calendar.interval(self.begin).map(|interval| interval.begin)
    }

    /// 与执行期有任意重叠
    pub fn overlaps(&self, calendar: &dyn ExecutionCalendar, interval: ExecutionIntervalId) -> bool {
        let (Some((begin, end)), Some(target)) = (self.date_range(calendar), calendar.interval(interval))
        else {
            return false;
        };
        begin <= target.end && end.map_or(true, |end| target.begin <= end)
    }

    /// 与另一窗口有任意重叠
    pub fn overlaps_window(&self, calendar: &dyn ExecutionCalendar, other: &ValidityWindow) -> bool {
        let (Some((begin, end)), Some((other_begin, other_end))) =
            (self.date_range(calendar), other.date_range(calendar))
        else {
            return false;
        };
        let starts_before_other_ends = other_end.map_or(true, |other_end| begin <= other_end);
        let other_starts_before_end = end.map_or(true, |end| other_begin <= end);
        starts_before_other_ends && other_starts_before_end
    }

    /// 窗口在执行期内是否有效
    ///
    /// # 规则
    /// - 学期: 窗口包含该学期的开始日期
    /// - 学年: 窗口在学年任一学期内有效 (按学年聚合)
    pub fn is_valid(&self, calendar: &dyn ExecutionCalendar, interval: ExecutionIntervalId) -> bool {
        let Some(target) = calendar.interval(interval) else {
            return false;
        };
        if target.is_year() {
            return self.overlaps(calendar, interval);
        }
        let Some((begin, end)) = self.date_range(calendar) else {
            return false;
        };
        begin <= target.begin && end.map_or(true, |end| target.begin <= end)
    }
}
