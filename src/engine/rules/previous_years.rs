// ==========================================
// 学籍课程规则引擎 - 先修学年规则
// ==========================================
// 规则: 目标上下文位于第 N 学年时, 之前学年同一校验组内的课程须已覆盖
// - 覆盖: 已通过 / 已选且未在本批次撤销 / 本批次待选
// - 校验组: 由选课模型 (学年 / 学期) 或显式分组决定
// - 课程组的学分或数量下限已可达成 (或已结业) 时, 其子树不再要求
// ==========================================

use super::{EnrolmentScope, PendingEnrolment};
use crate::domain::rule::CurricularRuleKind;
use crate::domain::types::{CurricularPeriodId, DegreeModuleId, ExecutionIntervalId};
use crate::engine::conclusion::CREDITS_EPSILON;
use crate::engine::result::{RuleResult, RuleResultMessage};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub(super) fn enrolment(scope: &EnrolmentScope<'_>, target: &PendingEnrolment) -> RuleResult {
    let structure = scope.structure;
    let periods = structure.periods();
    let Some(context) = target
        .path
        .as_ref()
        .and_then(|path| path.target_context())
        .and_then(|id| structure.context(id))
    else {
        return RuleResult::success();
    };
    let period = context.curricular_period;
    let Some(year) = periods.year_order(period).filter(|year| *year > 1) else {
        return RuleResult::success();
    };
    let Some(target_year) = periods.year_period(period) else {
        return RuleResult::success();
    };

    let config = structure.enrolment_model_config();
    let validation_group: Option<BTreeSet<u8>> =
        periods.semester_order(period).map(|order| config.group_for(order));
    // 之前学年中与校验组学期重叠的位置 (整学年目标: 之前学年全部)
    let required = |candidate: CurricularPeriodId| -> bool {
        periods.is_before(candidate, target_year)
            && validation_group
                .as_ref()
                .map_or(true, |group| periods.overlaps_semesters(candidate, group))
    };

    let execution_year = scope
        .calendar
        .year_of(scope.interval)
        .unwrap_or(scope.interval);
    let mut missing = Vec::new();
    let mut visited = HashSet::new();
    collect_missing(
        scope,
        structure.root(),
        execution_year,
        &required,
        &mut visited,
        &mut missing,
    );

    if missing.is_empty() {
        return RuleResult::success();
    }
    debug!(
        target_module = %target.module,
        year,
        missing = missing.len(),
        "先修学年课程未覆盖"
    );
    let names = missing
        .iter()
        .map(|module| structure.module_name(*module))
        .collect::<Vec<_>>()
        .join(", ");
    RuleResult::failure(
        RuleResultMessage::new(
            "label.PreviousYearsEnrolmentCurricularRule.enrolment.previous.years.missing",
            vec![structure.module_name(target.module), names],
        )
        .for_module(target.module),
    )
}

fn collect_missing(
    scope: &EnrolmentScope<'_>,
    group: DegreeModuleId,
    year: ExecutionIntervalId,
    required: &dyn Fn(CurricularPeriodId) -> bool,
    visited: &mut HashSet<DegreeModuleId>,
    missing: &mut Vec<DegreeModuleId>,
) {
    if !visited.insert(group) || lower_limits_reachable(scope, group) {
        return;
    }
    let structure = scope.structure;
    for context in
        structure.valid_child_contexts_for_execution_aggregation(scope.calendar, group, year)
    {
        let Some(child) = structure.module(context.child) else {
            continue;
        };
        if !child.is_leaf() {
            collect_missing(scope, child.id, year, required, visited, missing);
        } else if required(context.curricular_period)
            && !scope.is_covered(child.id)
            && !missing.contains(&child.id)
        {
            missing.push(child.id);
        }
    }
}

/// 课程组的学分 / 数量下限是否已可达成 (无此类规则返回 false)
fn lower_limits_reachable(scope: &EnrolmentScope<'_>, group: DegreeModuleId) -> bool {
    let limits: Vec<&CurricularRuleKind> = scope
        .structure
        .curricular_rules(scope.calendar, group, None, scope.interval)
        .into_iter()
        .map(|rule| &rule.kind)
        .filter(|kind| {
            matches!(
                kind,
                CurricularRuleKind::CreditsLimit { .. }
                    | CurricularRuleKind::DegreeModulesSelectionLimit { .. }
            )
        })
        .collect();
    if limits.is_empty() {
        return false;
    }
    if let Some(curriculum_group) = scope.curriculum.group_for_module(group) {
        if scope
            .conclusion_engine()
            .is_concluded(curriculum_group.id, scope.interval)
            .is_true()
        {
            return true;
        }
    }

    limits.iter().all(|kind| match kind {
        CurricularRuleKind::CreditsLimit { min_credits, .. } => {
            let existing: f64 = scope
                .counted_lines(group)
                .iter()
                .map(|line| line.ects_credits)
                .sum();
            let pending: f64 = scope
                .pending_below(group)
                .map(|pending| pending.ects_credits)
                .sum();
            existing + pending + CREDITS_EPSILON >= *min_credits
        }
        CurricularRuleKind::DegreeModulesSelectionLimit { min_modules, .. } => {
            let covered = scope
                .structure
                .child_contexts(group)
                .into_iter()
                .map(|context| context.child)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter(|child| {
                    scope.is_covered(*child)
                        || !scope.counted_lines(*child).is_empty()
                        || scope.pending_below(*child).next().is_some()
                })
                .count();
            covered as u32 >= *min_modules
        }
        _ => true,
    })
}
