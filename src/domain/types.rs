// ==========================================
// 学籍课程规则引擎 - 领域类型定义
// ==========================================
// 职责: 标识符、状态枚举、规则级别
// 红线: 标识符只在所属计划内有效,跨计划引用必须显式报错
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 学位课程计划标识 (Plan Id)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub u32);

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DCP{}", self.0)
    }
}

// 计划内标识: 携带所属计划,用于检测跨计划挂载
macro_rules! plan_scoped_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub plan: PlanId,
            pub seq: u32,
        }

        impl $name {
            pub const fn new(plan: PlanId, seq: u32) -> Self {
                Self { plan, seq }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}-{}"), self.plan.0, self.seq)
            }
        }
    };
}

plan_scoped_id!(
    /// 学位模块标识 (课程组 / 课程)
    DegreeModuleId,
    "DM"
);
plan_scoped_id!(
    /// 上下文 (父子边) 标识
    ContextId,
    "CTX"
);
plan_scoped_id!(
    /// 课程规则标识
    CurricularRuleId,
    "CR"
);
plan_scoped_id!(
    /// 课程学期位置标识
    CurricularPeriodId,
    "CP"
);

// 学生课程记录内标识
macro_rules! local_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

local_id!(
    /// 学生课程组标识
    CurriculumGroupId,
    "CG"
);
local_id!(
    /// 学生课程记录行标识
    CurriculumLineId,
    "CL"
);
local_id!(
    /// 执行学期 / 学年标识
    ExecutionIntervalId,
    "EI"
);

// ==========================================
// 课程学期位置类型 (Curricular Period Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurricularPeriodType {
    Year,
    Semester,
    Trimester,
}

impl CurricularPeriodType {
    /// 相对学年的权重 (学年=1.0, 学期=0.5, 季度=0.25)
    pub fn weight(self) -> f32 {
        self.quarter_units() as f32 / 4.0
    }

    /// 以季度为单位的跨度,用于跨粒度比较时避免浮点误差
    pub(crate) const fn quarter_units(self) -> u32 {
        match self {
            CurricularPeriodType::Year => 4,
            CurricularPeriodType::Semester => 2,
            CurricularPeriodType::Trimester => 1,
        }
    }
}

impl fmt::Display for CurricularPeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurricularPeriodType::Year => write!(f, "YEAR"),
            CurricularPeriodType::Semester => write!(f, "SEMESTER"),
            CurricularPeriodType::Trimester => write!(f, "TRIMESTER"),
        }
    }
}

// ==========================================
// 选课校验粒度 (Enrolment Model)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrolmentModel {
    #[default]
    Year,
    Semester,
}

impl EnrolmentModel {
    pub fn parse_code(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "YEAR" => Some(EnrolmentModel::Year),
            "SEMESTER" => Some(EnrolmentModel::Semester),
            _ => None,
        }
    }
}

impl fmt::Display for EnrolmentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrolmentModel::Year => write!(f, "YEAR"),
            EnrolmentModel::Semester => write!(f, "SEMESTER"),
        }
    }
}

// ==========================================
// 无结构课程组类型 (No Course Group)
// ==========================================
// 游离于结构树之外的学生课程组: 单科选修 / 课外
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoCourseGroupType {
    Standalone,
    ExtraCurricular,
}

impl fmt::Display for NoCourseGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoCourseGroupType::Standalone => write!(f, "STANDALONE"),
            NoCourseGroupType::ExtraCurricular => write!(f, "EXTRA_CURRICULAR"),
        }
    }
}

// ==========================================
// 课程规则执行级别 (Curricular Rule Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurricularRuleLevel {
    #[default]
    EnrolmentWithRules,
    StandaloneEnrolment,
    StandaloneEnrolmentNoRules,
    ExtraEnrolment,
    EnrolmentNoRules,
}

impl CurricularRuleLevel {
    pub fn parse_code(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ENROLMENT_WITH_RULES" => Some(CurricularRuleLevel::EnrolmentWithRules),
            "STANDALONE_ENROLMENT" => Some(CurricularRuleLevel::StandaloneEnrolment),
            "STANDALONE_ENROLMENT_NO_RULES" => Some(CurricularRuleLevel::StandaloneEnrolmentNoRules),
            "EXTRA_ENROLMENT" => Some(CurricularRuleLevel::ExtraEnrolment),
            "ENROLMENT_NO_RULES" => Some(CurricularRuleLevel::EnrolmentNoRules),
            _ => None,
        }
    }

    /// 是否评估挂载在目标模块自身的规则
    pub fn evaluates_module_rules(self) -> bool {
        matches!(
            self,
            CurricularRuleLevel::EnrolmentWithRules | CurricularRuleLevel::StandaloneEnrolment
        )
    }

    /// 是否评估祖先课程组上的规则
    pub fn evaluates_group_rules(self) -> bool {
        matches!(self, CurricularRuleLevel::EnrolmentWithRules)
    }

    /// 选课落入的无结构课程组 (None 表示落入结构镜像)
    pub fn target_bucket(self) -> Option<NoCourseGroupType> {
        match self {
            CurricularRuleLevel::StandaloneEnrolment
            | CurricularRuleLevel::StandaloneEnrolmentNoRules => Some(NoCourseGroupType::Standalone),
            CurricularRuleLevel::ExtraEnrolment => Some(NoCourseGroupType::ExtraCurricular),
            CurricularRuleLevel::EnrolmentWithRules | CurricularRuleLevel::EnrolmentNoRules => None,
        }
    }
}

impl fmt::Display for CurricularRuleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CurricularRuleLevel::EnrolmentWithRules => "ENROLMENT_WITH_RULES",
            CurricularRuleLevel::StandaloneEnrolment => "STANDALONE_ENROLMENT",
            CurricularRuleLevel::StandaloneEnrolmentNoRules => "STANDALONE_ENROLMENT_NO_RULES",
            CurricularRuleLevel::ExtraEnrolment => "EXTRA_ENROLMENT",
            CurricularRuleLevel::EnrolmentNoRules => "ENROLMENT_NO_RULES",
        };
        write!(f, "{}", code)
    }
}

// ==========================================
// 选课记录状态 (Enrolment State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrolmentState {
    Enrolled, // 已选课,未评定
    Approved, // 通过
    Flunked,  // 未通过 (历史记录保留)
    Annulled, // 已撤销
}

impl fmt::Display for EnrolmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrolmentState::Enrolled => write!(f, "ENROLLED"),
            EnrolmentState::Approved => write!(f, "APPROVED"),
            EnrolmentState::Flunked => write!(f, "FLUNKED"),
            EnrolmentState::Annulled => write!(f, "ANNULLED"),
        }
    }
}

// ==========================================
// 免修类型 (Dismissal Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DismissalKind {
    Equivalence, // 等效认定 (对应具体课程)
    Credits,     // 学分认定 (不对应具体课程)
}

// ==========================================
// 选课发起方 (Enrolment Requester)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrolmentRequester {
    #[default]
    Student,
    Coordinator,
    AcademicOffice,
}

impl EnrolmentRequester {
    pub fn is_self_service(self) -> bool {
        matches!(self, EnrolmentRequester::Student)
    }
}

// ==========================================
// 课程规则类型标签 (Curricular Rule Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurricularRuleType {
    CreditsLimit,
    DegreeModulesSelectionLimit,
    DegreeModuleSetApproval,
    PreviousYearsEnrolment,
    EnrolmentToBeApprovedByCoordinator,
}

impl fmt::Display for CurricularRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurricularRuleType::CreditsLimit => write!(f, "CreditsLimit"),
            CurricularRuleType::DegreeModulesSelectionLimit => {
                write!(f, "DegreeModulesSelectionLimit")
            }
            CurricularRuleType::DegreeModuleSetApproval => write!(f, "DegreeModuleSetApprovalRule"),
            CurricularRuleType::PreviousYearsEnrolment => {
                write!(f, "PreviousYearsEnrolmentCurricularRule")
            }
            CurricularRuleType::EnrolmentToBeApprovedByCoordinator => {
                write!(f, "EnrolmentToBeApprovedByCoordinator")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_weights() {
        assert_eq!(CurricularPeriodType::Year.weight(), 1.0);
        assert_eq!(CurricularPeriodType::Semester.weight(), 0.5);
        assert_eq!(CurricularPeriodType::Trimester.weight(), 0.25);
    }

    #[test]
    fn test_rule_level_round_trip_codes() {
        for level in [
            CurricularRuleLevel::EnrolmentWithRules,
            CurricularRuleLevel::StandaloneEnrolment,
            CurricularRuleLevel::StandaloneEnrolmentNoRules,
            CurricularRuleLevel::ExtraEnrolment,
            CurricularRuleLevel::EnrolmentNoRules,
        ] {
            assert_eq!(CurricularRuleLevel::parse_code(&level.to_string()), Some(level));
        }
        assert_eq!(CurricularRuleLevel::parse_code("bogus"), None);
    }

    #[test]
    fn test_rule_level_buckets() {
        assert_eq!(CurricularRuleLevel::EnrolmentWithRules.target_bucket(), None);
        assert_eq!(
            CurricularRuleLevel::ExtraEnrolment.target_bucket(),
            Some(NoCourseGroupType::ExtraCurricular)
        );
        assert!(!CurricularRuleLevel::StandaloneEnrolment.evaluates_group_rules());
        assert!(CurricularRuleLevel::StandaloneEnrolment.evaluates_module_rules());
    }

    #[test]
    fn test_plan_scoped_id_display() {
        let id = DegreeModuleId::new(PlanId(7), 3);
        assert_eq!(id.to_string(), "DM7-3");
        assert_eq!(CurriculumLineId(4).to_string(), "CL4");
    }
}
