use crate::domain::structure::StructurePath;
use crate::domain::types::{
    ContextId, CurricularRuleLevel, CurriculumLineId, DegreeModuleId, EnrolmentRequester,
    ExecutionIntervalId,
};
use crate::engine::result::{RuleResult, RuleResultMessage, Severity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 待选模块 (可指定经由的上下文)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeModuleToEnrol {
    pub module: DegreeModuleId,
    pub context: Option<ContextId>,
}

// ==========================================
// EnrolmentContext - 选课批次输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolmentContext {
    pub execution_interval: ExecutionIntervalId,
    pub degree_modules_to_evaluate: Vec<DegreeModuleToEnrol>,
    pub lines_to_remove: Vec<CurriculumLineId>,
    pub rule_level: CurricularRuleLevel,
    pub requester: EnrolmentRequester,
}

impl EnrolmentContext {
    pub fn new(execution_interval: ExecutionIntervalId) -> Self {
        Self {
            execution_interval,
            degree_modules_to_evaluate: Vec::new(),
            lines_to_remove: Vec::new(),
            rule_level: CurricularRuleLevel::default(),
            requester: EnrolmentRequester::default(),
        }
    }

    pub fn with_module(mut self, module: DegreeModuleId) -> Self {
        self.degree_modules_to_evaluate.push(DegreeModuleToEnrol {
            module,
            context: None,
        });
        self
    }

    /// 经由指定上下文选课 (同一模块挂在多处时)
    pub fn with_module_in_context(mut self, module: DegreeModuleId, context: ContextId) -> Self {
        self.degree_modules_to_evaluate.push(DegreeModuleToEnrol {
            module,
            context: Some(context),
        });
        self
    }

    pub fn removing(mut self, line: CurriculumLineId) -> Self {
        self.lines_to_remove.push(line);
        self
    }

    pub fn with_rule_level(mut self, level: CurricularRuleLevel) -> Self {
        self.rule_level = level;
        self
    }

    pub fn with_requester(mut self, requester: EnrolmentRequester) -> Self {
        self.requester = requester;
        self
    }
}

/// 单个模块的评估结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEnrolmentOutcome {
    pub degree_module: DegreeModuleId,
    pub context: Option<ContextId>,
    pub path: Option<StructurePath>,
    pub ects_credits: f64,
    pub result: RuleResult,
    /// 提交后新建的课程记录
    pub enrolled_line: Option<CurriculumLineId>,
}

// ==========================================
// EnrolmentResult - 选课批次结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolmentResult {
    pub batch_id: Uuid,
    pub rule_level: CurricularRuleLevel,
    pub outcomes: Vec<ModuleEnrolmentOutcome>,
    pub combined: RuleResult,
}

impl EnrolmentResult {
    pub fn is_success(&self) -> bool {
        !self.combined.is_fail()
    }

    /// 通过但带警告的消息
    pub fn warnings(&self) -> Vec<&RuleResultMessage> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.severity == Severity::Warning)
            .flat_map(|outcome| outcome.result.messages.iter())
            .collect()
    }

    pub fn outcome_for(&self, module: DegreeModuleId) -> Option<&ModuleEnrolmentOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.degree_module == module)
    }
}
