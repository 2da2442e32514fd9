// ==========================================
// 学籍课程规则引擎 - 学分上下限规则
// ==========================================
// 结业: 已通过学分落在 [min, max]
// 可结业: 已通过 + 已选学分达到 min, 且已通过学分不超过 max
// 选课: 已通过 + 已选 (扣除撤销) + 本批次待选不超过 max
// ==========================================

use super::EnrolmentScope;
use crate::domain::curriculum::CurriculumGroup;
use crate::domain::rule::CurricularRule;
use crate::engine::conclusion::{ConclusionEngine, ConclusionMode, CREDITS_EPSILON};
use crate::engine::result::{RuleResult, RuleResultMessage};

pub(super) fn conclusion(
    engine: &ConclusionEngine<'_>,
    group: &CurriculumGroup,
    min_credits: f64,
    max_credits: f64,
    mode: ConclusionMode,
) -> RuleResult {
    let approved = engine.approved_credits(group.id);
    let reachable = match mode {
        ConclusionMode::Concluded => approved,
        ConclusionMode::CanConclude => approved + engine.enrolled_credits(group.id),
    };
    let name = engine.group_name(group);

    if reachable + CREDITS_EPSILON < min_credits {
        return RuleResult::failure(
            RuleResultMessage::new(
                "label.CreditsLimit.conclusion.minimum.not.reached",
                vec![name, format_credits(min_credits), format_credits(reachable)],
            )
            .for_optional_module(group.degree_module()),
        );
    }
    if approved > max_credits + CREDITS_EPSILON {
        return RuleResult::failure(
            RuleResultMessage::new(
                "label.CreditsLimit.conclusion.maximum.exceeded",
                vec![name, format_credits(max_credits), format_credits(approved)],
            )
            .for_optional_module(group.degree_module()),
        );
    }
    RuleResult::success()
}

pub(super) fn enrolment(scope: &EnrolmentScope<'_>, rule: &CurricularRule, max_credits: f64) -> RuleResult {
    let group = rule.degree_module_to_apply_rule;
    let existing: f64 = scope
        .counted_lines(group)
        .iter()
        .map(|line| line.ects_credits)
        .sum();
    let pending: f64 = scope
        .pending_below(group)
        .map(|pending| pending.ects_credits)
        .sum();
    let total = existing + pending;

    if total > max_credits + CREDITS_EPSILON {
        return RuleResult::failure(
            RuleResultMessage::new(
                "label.CreditsLimit.enrolment.maximum.exceeded",
                vec![
                    scope.structure.module_name(group),
                    format_credits(max_credits),
                    format_credits(total),
                ],
            )
            .for_module(group),
        );
    }
    RuleResult::success()
}

/// 学分展示格式 (整数不带小数位)
pub(crate) fn format_credits(value: f64) -> String {
    if (value - value.round()).abs() < CREDITS_EPSILON {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}
