// ==========================================
// 学籍课程规则引擎 - 模块集合审批规则
// ==========================================
// 规则: 指定模块须全部在审批课程组子树中通过
// - 审批课程组缺省为规则挂载的课程组
// - 移入无结构课程组的记录不再计入
// 结业: 未满足 → 可选警告 (仍可能满足) 或失败
// 可结业: 缺失模块均已选 → 成功 (可选警告), 否则失败
// ==========================================

use crate::domain::rule::CurricularRule;
use crate::domain::types::DegreeModuleId;
use crate::engine::conclusion::{ConclusionEngine, ConclusionMode};
use crate::engine::result::{RuleResult, RuleResultMessage, RuleValue};
use std::collections::BTreeSet;

struct ApprovalStatus {
    missing: Vec<DegreeModuleId>,
    /// 至少一个缺失模块未处于已选状态
    impossible: bool,
}

fn approval_status(
    engine: &ConclusionEngine<'_>,
    target_group: DegreeModuleId,
    required: &BTreeSet<DegreeModuleId>,
) -> ApprovalStatus {
    let curriculum = engine.curriculum();
    let Some(group) = curriculum.group_for_module(target_group) else {
        return ApprovalStatus {
            missing: required.iter().copied().collect(),
            impossible: true,
        };
    };

    let lines = curriculum.subtree_lines(group.id);
    let approved: BTreeSet<DegreeModuleId> = lines
        .iter()
        .filter(|line| line.is_approved())
        .filter_map(|line| line.degree_module)
        .collect();
    let enrolled: BTreeSet<DegreeModuleId> = lines
        .iter()
        .filter(|line| line.is_enrolled())
        .filter_map(|line| line.degree_module)
        .collect();

    let missing: Vec<DegreeModuleId> = required
        .iter()
        .filter(|module| !approved.contains(module))
        .copied()
        .collect();
    let impossible = missing.iter().any(|module| !enrolled.contains(module));
    ApprovalStatus {
        missing,
        impossible,
    }
}

pub(super) fn conclusion(
    engine: &ConclusionEngine<'_>,
    rule: &CurricularRule,
    required: &BTreeSet<DegreeModuleId>,
    approval_group: Option<DegreeModuleId>,
    show_warning: bool,
    mode: ConclusionMode,
) -> RuleResult {
    let structure = engine.structure();
    let module = rule.degree_module_to_apply_rule;
    let target = approval_group.unwrap_or(module);
    let status = approval_status(engine, target, required);
    if status.missing.is_empty() {
        return RuleResult::success();
    }

    let missing_names = status
        .missing
        .iter()
        .map(|id| structure.module_name(*id))
        .collect::<Vec<_>>()
        .join(", ");
    let warning_message = match approval_group {
        Some(other) if other != module => RuleResultMessage::new(
            "label.DegreeModuleSetApprovalRule.conclusion.warning.otherGroup",
            vec![
                structure.module_name(module),
                structure.module_name(other),
                missing_names.clone(),
            ],
        ),
        _ => RuleResultMessage::new(
            "label.DegreeModuleSetApprovalRule.conclusion.warning",
            vec![structure.module_name(module), missing_names.clone()],
        ),
    }
    .for_module(module);
    let failure_message = RuleResultMessage::new(
        "label.DegreeModuleSetApprovalRule.conclusion.failed",
        vec![structure.module_name(module), missing_names],
    )
    .for_module(module);

    match mode {
        ConclusionMode::Concluded if show_warning && !status.impossible => {
            RuleResult::warning(RuleValue::False, warning_message)
        }
        ConclusionMode::Concluded => RuleResult::failure(failure_message),
        ConclusionMode::CanConclude if status.impossible => RuleResult::failure(failure_message),
        ConclusionMode::CanConclude if show_warning => {
            RuleResult::warning(RuleValue::True, warning_message)
        }
        ConclusionMode::CanConclude => RuleResult::success(),
    }
}
