// ==========================================
// 学籍课程规则引擎 - 核心库
// ==========================================
// 职责: 学位结构树、课程规则、结业判定、选课校验
// 技术栈: Rust + SQLite (配置)
// 系统定位: 同步、纯内存的规则评估库 (调用方预先加载数据)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 结构树、规则定义、学生课程记录
pub mod domain;

// 引擎层 - 结业判定与选课校验
pub mod engine;

// 配置层 - 学位选课配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ContextId, CurricularRuleLevel, CurriculumGroupId, CurriculumLineId, DegreeModuleId,
    EnrolmentModel, EnrolmentRequester, ExecutionIntervalId, PlanId,
};

// 领域实体
pub use domain::{
    AcademicCalendar, CurricularRule, CurricularRuleKind, DegreeCurricularPlan, NewCurricularRule,
    StudentCurricularPlan, ValidityWindow,
};

// 引擎
pub use engine::{
    ConclusionEngine, EnrolmentContext, EnrolmentError, EnrolmentPipeline, EnrolmentResult,
    RuleResult, RuleValue, Severity,
};

// 配置
pub use config::{ConfigManager, EngineConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学籍课程规则引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
