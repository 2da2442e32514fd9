// ==========================================
// 学籍课程规则引擎 - 规则评估分派
// ==========================================
// 职责: 封闭规则变体 → 每种评估模式一个分派函数
// 红线: 新增规则 = 新增变体 + 在两个分派函数中各加一个分支
// 红线: 所有规则必须输出可本地化的消息键
// ==========================================

mod coordinator;
mod credits_limit;
mod previous_years;
mod selection_limit;
mod set_approval;

use crate::domain::calendar::ExecutionCalendar;
use crate::domain::curriculum::{CurriculumGroup, CurriculumLine, CurriculumReadModel};
use crate::domain::rule::{CurricularRule, CurricularRuleKind};
use crate::domain::structure::{DegreeCurricularPlan, StructurePath};
use crate::domain::types::{
    CurriculumLineId, DegreeModuleId, EnrolmentRequester, ExecutionIntervalId,
};
use crate::engine::conclusion::{ConclusionEngine, ConclusionMode};
use crate::engine::result::RuleResult;
use std::collections::BTreeSet;

/// 结业模式下评估单条规则
pub fn evaluate_for_conclusion(
    engine: &ConclusionEngine<'_>,
    rule: &CurricularRule,
    group: &CurriculumGroup,
    interval: ExecutionIntervalId,
    mode: ConclusionMode,
) -> RuleResult {
    match &rule.kind {
        CurricularRuleKind::CreditsLimit {
            min_credits,
            max_credits,
        } => credits_limit::conclusion(engine, group, *min_credits, *max_credits, mode),
        CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules,
            max_modules,
        } => selection_limit::conclusion(engine, group, *min_modules, *max_modules, interval, mode),
        CurricularRuleKind::DegreeModuleSetApproval {
            required_modules,
            approval_group,
            show_warning,
        } => set_approval::conclusion(
            engine,
            rule,
            required_modules,
            *approval_group,
            *show_warning,
            mode,
        ),
        // 只作用于选课
        CurricularRuleKind::PreviousYearsEnrolment
        | CurricularRuleKind::EnrolmentToBeApprovedByCoordinator => RuleResult::success(),
    }
}

/// 选课模式下评估单条规则
pub fn evaluate_for_enrolment(
    scope: &EnrolmentScope<'_>,
    rule: &CurricularRule,
    target: &PendingEnrolment,
) -> RuleResult {
    match &rule.kind {
        CurricularRuleKind::CreditsLimit { max_credits, .. } => {
            credits_limit::enrolment(scope, rule, *max_credits)
        }
        CurricularRuleKind::DegreeModulesSelectionLimit { max_modules, .. } => {
            selection_limit::enrolment(scope, rule, *max_modules)
        }
        // 审批集合在选课时不适用
        CurricularRuleKind::DegreeModuleSetApproval { .. } => RuleResult::success(),
        CurricularRuleKind::PreviousYearsEnrolment => previous_years::enrolment(scope, target),
        CurricularRuleKind::EnrolmentToBeApprovedByCoordinator => {
            coordinator::enrolment(scope, rule, target)
        }
    }
}

/// 规则是否按目标模块逐一评估 (否则按规则汇总评估一次)
pub fn is_module_dependent(rule: &CurricularRule) -> bool {
    matches!(
        rule.kind,
        CurricularRuleKind::PreviousYearsEnrolment
            | CurricularRuleKind::EnrolmentToBeApprovedByCoordinator
    )
}

// ==========================================
// 选课评估上下文
// ==========================================

/// 批次中待选的一个模块
#[derive(Debug, Clone)]
pub struct PendingEnrolment {
    pub module: DegreeModuleId,
    /// 结构路径 (单科/课外选课可能不在结构树中)
    pub path: Option<StructurePath>,
    pub ects_credits: f64,
}

impl PendingEnrolment {
    /// 是否位于某课程组子树下
    pub fn is_below(&self, group: DegreeModuleId) -> bool {
        self.module != group && self.path.as_ref().map_or(false, |path| path.contains(group))
    }

    /// 路径上紧随 group 之后的模块
    pub fn child_below(&self, group: DegreeModuleId) -> Option<DegreeModuleId> {
        let path = self.path.as_ref()?;
        let index = path.steps.iter().position(|(module, _)| *module == group)?;
        path.steps.get(index + 1).map(|(module, _)| *module)
    }
}

pub struct EnrolmentScope<'a> {
    pub structure: &'a DegreeCurricularPlan,
    pub calendar: &'a dyn ExecutionCalendar,
    pub curriculum: &'a dyn CurriculumReadModel,
    pub interval: ExecutionIntervalId,
    pub requester: EnrolmentRequester,
    pub pending: &'a [PendingEnrolment],
    pub removed: &'a BTreeSet<CurriculumLineId>,
}

impl<'a> EnrolmentScope<'a> {
    pub fn conclusion_engine(&self) -> ConclusionEngine<'a> {
        ConclusionEngine::new(self.structure, self.calendar, self.curriculum)
    }

    /// 选课后仍有效的记录 (通过, 或已选且不在本批次撤销之列)
    pub fn counts(&self, line: &CurriculumLine) -> bool {
        line.is_approved() || (line.is_enrolled() && !self.removed.contains(&line.id))
    }

    /// 模块是否已覆盖: 已通过 / 已选未撤销 / 本批次待选
    pub fn is_covered(&self, module: DegreeModuleId) -> bool {
        self.curriculum
            .lines_for_module(module)
            .iter()
            .any(|line| self.counts(line))
            || self.pending.iter().any(|pending| pending.module == module)
    }

    /// 课程组子树中仍有效的记录
    pub fn counted_lines(&self, group: DegreeModuleId) -> Vec<&'a CurriculumLine> {
        self.curriculum
            .group_for_module(group)
            .map(|curriculum_group| self.curriculum.subtree_lines(curriculum_group.id))
            .unwrap_or_default()
            .into_iter()
            .filter(|line| self.counts(line))
            .collect()
    }

    /// 本批次中位于课程组子树下的待选模块
    pub fn pending_below(&self, group: DegreeModuleId) -> impl Iterator<Item = &'a PendingEnrolment> + '_ {
        self.pending.iter().filter(move |pending| pending.is_below(group))
    }
}
