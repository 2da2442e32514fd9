// ==========================================
// 学籍课程规则引擎 - 领域模型层
// ==========================================
// 职责: 学位结构树、课程规则定义、学生课程记录、执行日历
// 红线: 不含规则评估逻辑, 不含数据访问逻辑
// ==========================================

pub mod calendar;
pub mod curricular_period;
pub mod curriculum;
pub mod degree_module;
pub mod enrolment_model;
pub mod error;
pub mod rule;
pub mod structure;
pub mod types;

// 重导出核心类型
pub use calendar::{
    AcademicCalendar, ExecutionCalendar, ExecutionInterval, ExecutionIntervalKind, ValidityWindow,
};
pub use curricular_period::{CurricularPeriod, CurricularPeriods};
pub use curriculum::{
    CurriculumGroup, CurriculumGroupKind, CurriculumLine, CurriculumLineKind, CurriculumReadModel,
    StudentCurricularPlan,
};
pub use degree_module::{
    Context, DegreeModule, DegreeModuleKind, DegreeModuleType, ProgramConclusion,
};
pub use enrolment_model::{EnrolmentModelConfig, EnrolmentModelConfigEntry};
pub use error::{CurriculumError, CurriculumResult, DomainError, DomainResult};
pub use rule::{CurricularRule, CurricularRuleKind, NewCurricularRule};
pub use structure::{DegreeCurricularPlan, StructurePath};
pub use types::{
    ContextId, CurricularPeriodId, CurricularPeriodType, CurricularRuleId, CurricularRuleLevel,
    CurricularRuleType, CurriculumGroupId, CurriculumLineId, DegreeModuleId, DismissalKind,
    EnrolmentModel, EnrolmentRequester, EnrolmentState, ExecutionIntervalId, NoCourseGroupType,
    PlanId,
};
