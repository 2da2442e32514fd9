// ==========================================
// 学籍课程规则引擎 - 子模块数量规则
// ==========================================
// 计数单位: 课程组的直接子模块 (去重)
// - 子课程: 结业模式需通过, 可结业模式通过或已选即可
// - 子课程组: 自身有结业规则且按同一模式判定为 TRUE 才计入
// 选课: 仅检查上限, 计入现有有效记录与本批次待选
// ==========================================

use super::EnrolmentScope;
use crate::domain::curriculum::CurriculumGroup;
use crate::domain::rule::CurricularRule;
use crate::domain::types::{DegreeModuleId, ExecutionIntervalId};
use crate::engine::conclusion::{ConclusionEngine, ConclusionMode};
use crate::engine::result::{RuleResult, RuleResultMessage};
use std::collections::BTreeSet;

pub(super) fn conclusion(
    engine: &ConclusionEngine<'_>,
    group: &CurriculumGroup,
    min_modules: u32,
    max_modules: u32,
    interval: ExecutionIntervalId,
    mode: ConclusionMode,
) -> RuleResult {
    let curriculum = engine.curriculum();
    let mut approved: BTreeSet<DegreeModuleId> = BTreeSet::new();
    let mut possible: BTreeSet<DegreeModuleId> = BTreeSet::new();

    for line in curriculum.lines_of(group.id) {
        let Some(module) = line.degree_module else {
            continue;
        };
        if line.is_approved() {
            approved.insert(module);
            possible.insert(module);
        } else if line.is_enrolled() {
            possible.insert(module);
        }
    }

    for child in curriculum.child_groups(group.id) {
        let Some(module) = child.degree_module() else {
            continue;
        };
        if engine.conclusion_rules(child, interval).is_empty() {
            continue;
        }
        if engine.is_concluded(child.id, interval).is_true() {
            approved.insert(module);
            possible.insert(module);
        } else if mode == ConclusionMode::CanConclude
            && engine.can_conclude(child.id, interval).is_true()
        {
            possible.insert(module);
        }
    }

    let counted = match mode {
        ConclusionMode::Concluded => approved.len(),
        ConclusionMode::CanConclude => possible.len(),
    } as u32;
    let approved_count = approved.len() as u32;

    if counted < min_modules || approved_count > max_modules {
        return RuleResult::failure(
            RuleResultMessage::new(
                "label.DegreeModulesSelectionLimit.conclusion.failed",
                vec![
                    engine.group_name(group),
                    min_modules.to_string(),
                    max_modules.to_string(),
                    counted.to_string(),
                ],
            )
            .for_optional_module(group.degree_module()),
        );
    }
    RuleResult::success()
}

pub(super) fn enrolment(scope: &EnrolmentScope<'_>, rule: &CurricularRule, max_modules: u32) -> RuleResult {
    let group = rule.degree_module_to_apply_rule;
    let mut selected: BTreeSet<DegreeModuleId> = BTreeSet::new();

    if let Some(curriculum_group) = scope.curriculum.group_for_module(group) {
        for line in scope.curriculum.lines_of(curriculum_group.id) {
            if let Some(module) = line.degree_module.filter(|_| scope.counts(line)) {
                selected.insert(module);
            }
        }
        for child in scope.curriculum.child_groups(curriculum_group.id) {
            let Some(module) = child.degree_module() else {
                continue;
            };
            let in_use = scope
                .curriculum
                .subtree_lines(child.id)
                .iter()
                .any(|line| scope.counts(line));
            if in_use {
                selected.insert(module);
            }
        }
    }
    selected.extend(scope.pending.iter().filter_map(|pending| pending.child_below(group)));

    let count = selected.len() as u32;
    if count > max_modules {
        return RuleResult::failure(
            RuleResultMessage::new(
                "label.DegreeModulesSelectionLimit.enrolment.maximum.exceeded",
                vec![
                    scope.structure.module_name(group),
                    max_modules.to_string(),
                    count.to_string(),
                ],
            )
            .for_module(group),
        );
    }
    RuleResult::success()
}
