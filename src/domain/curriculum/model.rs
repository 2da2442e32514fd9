use crate::domain::types::{
    CurriculumGroupId, CurriculumLineId, DegreeModuleId, DismissalKind, EnrolmentState,
    ExecutionIntervalId, NoCourseGroupType,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurriculumGroupKind {
    /// 对应结构中的课程组
    Structural(DegreeModuleId),
    /// 无结构对应的课程组
    NoCourseGroup(NoCourseGroupType),
}

// ==========================================
// CurriculumGroup - 学生课程组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumGroup {
    pub id: CurriculumGroupId,
    pub parent: Option<CurriculumGroupId>,
    pub kind: CurriculumGroupKind,
    pub child_groups: Vec<CurriculumGroupId>,
    pub lines: Vec<CurriculumLineId>,
}

impl CurriculumGroup {
    pub fn degree_module(&self) -> Option<DegreeModuleId> {
        match self.kind {
            CurriculumGroupKind::Structural(module) => Some(module),
            CurriculumGroupKind::NoCourseGroup(_) => None,
        }
    }

    pub fn is_no_course_group(&self) -> bool {
        matches!(self.kind, CurriculumGroupKind::NoCourseGroup(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurriculumLineKind {
    Enrolment { state: EnrolmentState },
    Dismissal { kind: DismissalKind },
}

// ==========================================
// CurriculumLine - 课程记录行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumLine {
    pub id: CurriculumLineId,
    pub group: CurriculumGroupId,
    /// 学分认定类免修可不对应具体课程
    pub degree_module: Option<DegreeModuleId>,
    pub execution_interval: ExecutionIntervalId,
    pub ects_credits: f64,
    pub kind: CurriculumLineKind,
}

impl CurriculumLine {
    /// 通过 (含免修)
    pub fn is_approved(&self) -> bool {
        matches!(
            self.kind,
            CurriculumLineKind::Enrolment {
                state: EnrolmentState::Approved
            } | CurriculumLineKind::Dismissal { .. }
        )
    }

    /// 已选未评定
    pub fn is_enrolled(&self) -> bool {
        matches!(
            self.kind,
            CurriculumLineKind::Enrolment {
                state: EnrolmentState::Enrolled
            }
        )
    }

    pub fn is_flunked(&self) -> bool {
        matches!(
            self.kind,
            CurriculumLineKind::Enrolment {
                state: EnrolmentState::Flunked
            }
        )
    }

    pub fn is_annulled(&self) -> bool {
        matches!(
            self.kind,
            CurriculumLineKind::Enrolment {
                state: EnrolmentState::Annulled
            }
        )
    }

    /// 有效记录: 已选 / 通过 / 免修
    pub fn is_active(&self) -> bool {
        self.is_approved() || self.is_enrolled()
    }

    pub fn is_equivalence_dismissal(&self) -> bool {
        matches!(
            self.kind,
            CurriculumLineKind::Dismissal {
                kind: DismissalKind::Equivalence
            }
        )
    }
}
