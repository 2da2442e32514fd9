// ==========================================
// 学籍课程规则引擎 - 引擎层
// ==========================================
// 职责: 结业判定与选课校验, 不做 I/O
// 红线: 评估结果 (FALSE/WARNING/FAIL) 是值而不是错误
// 红线: 所有规则必须输出可本地化的消息键
// ==========================================

pub mod conclusion;
pub mod enrolment;
pub mod result;
pub mod rules;

// 重导出核心引擎
pub use conclusion::{ConclusionEngine, ConclusionMode, ConclusionSummary};
pub use enrolment::{
    DegreeModuleToEnrol, EnrolmentContext, EnrolmentError, EnrolmentPipeline, EnrolmentResult,
    ModuleEnrolmentOutcome,
};
pub use result::{RuleResult, RuleResultMessage, RuleValue, Severity};
pub use rules::{EnrolmentScope, PendingEnrolment};
