// ==========================================
// 学籍课程规则引擎 - 领域层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 结构错误在编写期立即报出,不得静默忽略
// 红线: 规则评估结果 (FALSE/WARNING/FAIL) 不是错误
// ==========================================

use crate::domain::types::{
    ContextId, CurricularPeriodId, CurricularRuleId, CurriculumGroupId, CurriculumLineId,
    DegreeModuleId, EnrolmentState, ExecutionIntervalId, PlanId,
};
use thiserror::Error;

/// 结构编写 / 规则配置错误
#[derive(Error, Debug)]
pub enum DomainError {
    // ===== 引用错误 =====
    #[error("学位模块不存在: {0}")]
    UnknownDegreeModule(DegreeModuleId),

    #[error("上下文不存在: {0}")]
    UnknownContext(ContextId),

    #[error("课程规则不存在: {0}")]
    UnknownCurricularRule(CurricularRuleId),

    #[error("课程学期位置不存在: {0}")]
    UnknownCurricularPeriod(CurricularPeriodId),

    #[error("执行学期不存在: {0}")]
    UnknownExecutionInterval(ExecutionIntervalId),

    #[error("引用不属于当前计划: reference={reference}, plan={plan}")]
    MismatchedPlan { reference: String, plan: PlanId },

    // ===== 结构错误 =====
    #[error("学位模块不是课程组: {0}")]
    NotACourseGroup(DegreeModuleId),

    #[error("同级名称重复: parent={parent}, name={name}")]
    DuplicateSiblingName { parent: DegreeModuleId, name: String },

    #[error("上下文有效期无效: 开始学期 {begin} 晚于结束学期 {end}")]
    InvalidValidityWindow {
        begin: ExecutionIntervalId,
        end: ExecutionIntervalId,
    },

    #[error("上下文超出父课程组允许的有效期: parent={0}")]
    ContextOutsideParentWindow(DegreeModuleId),

    #[error("上下文有效期重叠: parent={parent}, child={child}")]
    OverlappingContext {
        parent: DegreeModuleId,
        child: DegreeModuleId,
    },

    #[error("结构出现环: parent={parent}, child={child}")]
    CyclicStructure {
        parent: DegreeModuleId,
        child: DegreeModuleId,
    },

    #[error("上下文仍被课程规则引用: context={context}, rule={rule}")]
    ContextReferencedByRule {
        context: ContextId,
        rule: CurricularRuleId,
    },

    #[error("学位模块仍有子上下文: {0}")]
    ModuleHasChildContexts(DegreeModuleId),

    #[error("学位模块仍被学生课程记录引用: {0}")]
    ModuleReferencedByCurriculum(DegreeModuleId),

    #[error("学位模块仍被课程规则引用: module={module}, rule={rule}")]
    ModuleReferencedByRule {
        module: DegreeModuleId,
        rule: CurricularRuleId,
    },

    #[error("根课程组不可删除: {0}")]
    CannotDeleteRoot(DegreeModuleId),

    #[error("课程学期位置层级无效: {0}")]
    InvalidCurricularPeriod(String),

    #[error("执行学期无效: {0}")]
    InvalidExecutionInterval(String),

    // ===== 规则配置错误 =====
    #[error("规则上下限不一致: min={min}, max={max}")]
    InconsistentLimits { min: f64, max: f64 },

    #[error("规则上下限不能为负数: {0}")]
    NegativeLimit(f64),

    #[error("模块数量上下限必须为整数: {0}")]
    FractionalModuleLimit(f64),

    #[error("模块数量上下限超出范围: {0}")]
    ModuleLimitOutOfRange(f64),

    #[error("课程学分不能为负数: {0}")]
    NegativeCredits(f64),

    #[error("规则不支持修改上下限: {0}")]
    LimitsNotSupported(CurricularRuleId),

    #[error("审批规则至少需要一个学位模块")]
    EmptyApprovalSet,

    #[error("规则 {rule_type} 只能挂载在课程组上: {module}")]
    RuleRequiresCourseGroup {
        rule_type: String,
        module: DegreeModuleId,
    },

    #[error("选课校验分组无效: {0}")]
    InvalidEnrolmentModelConfig(String),

    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 学生课程记录错误
#[derive(Error, Debug)]
pub enum CurriculumError {
    #[error("学生课程组不存在: {0}")]
    UnknownGroup(CurriculumGroupId),

    #[error("课程记录不存在: {0}")]
    UnknownLine(CurriculumLineId),

    #[error("学位模块已有有效课程记录: module={module}, line={line}")]
    DuplicateActiveLine {
        module: DegreeModuleId,
        line: CurriculumLineId,
    },

    #[error("无效的状态转换: line={line}, from={from} to={to}")]
    InvalidStateTransition {
        line: CurriculumLineId,
        from: EnrolmentState,
        to: EnrolmentState,
    },

    #[error("学生课程组不能承载课程记录: {0}")]
    NotALineContainer(CurriculumGroupId),

    #[error("学生课程记录与学位计划不匹配: expected={expected}, found={found}")]
    WrongDegreePlan { expected: PlanId, found: PlanId },

    #[error("学位模块不可达: {0}")]
    UnreachableModule(DegreeModuleId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type CurriculumResult<T> = Result<T, CurriculumError>;
