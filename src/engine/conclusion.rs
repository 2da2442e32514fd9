// ==========================================
// 学籍课程规则引擎 - 结业判定引擎
// ==========================================
// 职责: isConcluded / canConclude 共用一个评估器, 仅乐观程度不同
// 规则:
// - 无规则且无子记录: 已结业 = TRUE (空真), 可结业 = FALSE (刻意不对称)
// - 无规则有子记录: 逐模块检查课程记录, 子课程组递归
// - 有规则: 学分规则择一, 数量规则取或, 其余取与 (不短路)
// 红线: 只读遍历, 不修改结构与课程记录
// ==========================================

use crate::domain::calendar::ExecutionCalendar;
use crate::domain::curriculum::{CurriculumGroup, CurriculumReadModel};
use crate::domain::rule::{CurricularRule, CurricularRuleKind};
use crate::domain::structure::DegreeCurricularPlan;
use crate::domain::types::{ContextId, CurriculumGroupId, DegreeModuleId, ExecutionIntervalId};
use crate::engine::result::{RuleResult, RuleResultMessage};
use crate::engine::rules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// 学分比较容差
pub(crate) const CREDITS_EPSILON: f64 = 1e-9;

/// 评估模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConclusionMode {
    /// 严格: 只计已通过记录
    Concluded,
    /// 宽松: 已选未评定记录也计入下限
    CanConclude,
}

/// 结业检查点汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusionSummary {
    pub curriculum_group: CurriculumGroupId,
    pub degree_module: DegreeModuleId,
    pub program_conclusion: String,
    pub approved_credits: f64,
    pub concluded: RuleResult,
    pub can_conclude: RuleResult,
}

// ==========================================
// ConclusionEngine - 结业判定引擎
// ==========================================
pub struct ConclusionEngine<'a> {
    structure: &'a DegreeCurricularPlan,
    calendar: &'a dyn ExecutionCalendar,
    curriculum: &'a dyn CurriculumReadModel,
}

impl<'a> ConclusionEngine<'a> {
    pub fn new(
        structure: &'a DegreeCurricularPlan,
        calendar: &'a dyn ExecutionCalendar,
        curriculum: &'a dyn CurriculumReadModel,
    ) -> Self {
        Self {
            structure,
            calendar,
            curriculum,
        }
    }

    pub fn structure(&self) -> &'a DegreeCurricularPlan {
        self.structure
    }

    pub fn calendar(&self) -> &'a dyn ExecutionCalendar {
        self.calendar
    }

    pub fn curriculum(&self) -> &'a dyn CurriculumReadModel {
        self.curriculum
    }

    /// 课程组是否已结业 (严格)
    pub fn is_concluded(&self, group: CurriculumGroupId, interval: ExecutionIntervalId) -> RuleResult {
        self.evaluate(group, interval, ConclusionMode::Concluded)
    }

    /// 课程组是否仍可结业 (已选课程计入)
    pub fn can_conclude(&self, group: CurriculumGroupId, interval: ExecutionIntervalId) -> RuleResult {
        self.evaluate(group, interval, ConclusionMode::CanConclude)
    }

    /// 按模式评估课程组
    #[instrument(level = "debug", skip(self))]
    pub fn evaluate(
        &self,
        group: CurriculumGroupId,
        interval: ExecutionIntervalId,
        mode: ConclusionMode,
    ) -> RuleResult {
        let Some(curriculum_group) = self.curriculum.group(group) else {
            return RuleResult::unknown(RuleResultMessage::new(
                "label.curriculumGroup.unknown",
                vec![group.to_string()],
            ));
        };

        let rules = self.conclusion_rules(curriculum_group, interval);
        let result = if rules.is_empty() {
            self.evaluate_without_rules(curriculum_group, interval, mode)
        } else {
            self.evaluate_rules(curriculum_group, rules, interval, mode)
        };
        debug!(
            group = %group,
            ?mode,
            value = ?result.value,
            severity = ?result.severity,
            "课程组评估完成"
        );
        result
    }

    /// 学生课程组在结构中经由的上下文 (父课程组 → 本课程组)
    pub fn group_context(
        &self,
        group: &CurriculumGroup,
        interval: ExecutionIntervalId,
    ) -> Option<ContextId> {
        let module = group.degree_module()?;
        let parent_module = group
            .parent
            .and_then(|parent| self.curriculum.group(parent))
            .and_then(|parent| parent.degree_module())?;
        self.structure
            .context_between(self.calendar, parent_module, module, interval)
            .map(|ctx| ctx.id)
    }

    /// 课程组在执行期生效的结业规则
    ///
    /// # 规则
    /// - 按上下文解析的规则 (上下文课程组须为直接父课程组)
    /// - 另加上下文课程组为更上层祖先的学分规则, 供择优
    pub fn conclusion_rules(
        &self,
        group: &CurriculumGroup,
        interval: ExecutionIntervalId,
    ) -> Vec<&'a CurricularRule> {
        let Some(module) = group.degree_module() else {
            return Vec::new();
        };
        let context = self.group_context(group, interval);
        let mut rules: Vec<&'a CurricularRule> = self
            .structure
            .curricular_rules(self.calendar, module, context, interval)
            .into_iter()
            .filter(|rule| rule.kind.is_conclusion_rule())
            .collect();

        let ancestors = self.ancestor_modules(group);
        let ancestor_scoped: Vec<&'a CurricularRule> = self
            .structure
            .rules_attached_to(module)
            .into_iter()
            .filter(|rule| matches!(rule.kind, CurricularRuleKind::CreditsLimit { .. }))
            .filter(|rule| {
                rule.context_course_group
                    .map_or(false, |scope| ancestors.contains(&scope))
            })
            .filter(|rule| rule.context.is_none() || rule.context == context)
            .filter(|rule| rule.window.is_valid(self.calendar, interval))
            .filter(|rule| rules.iter().all(|existing| existing.id != rule.id))
            .collect();
        if !ancestor_scoped.is_empty() {
            rules.extend(ancestor_scoped);
            rules.sort_by_key(|rule| rule.id);
        }
        rules
    }

    fn evaluate_rules(
        &self,
        group: &CurriculumGroup,
        rules: Vec<&CurricularRule>,
        interval: ExecutionIntervalId,
        mode: ConclusionMode,
    ) -> RuleResult {
        let (credits, rest): (Vec<&CurricularRule>, Vec<&CurricularRule>) = rules
            .into_iter()
            .partition(|rule| matches!(rule.kind, CurricularRuleKind::CreditsLimit { .. }));
        let (selection, others): (Vec<&CurricularRule>, Vec<&CurricularRule>) = rest
            .into_iter()
            .partition(|rule| {
                matches!(rule.kind, CurricularRuleKind::DegreeModulesSelectionLimit { .. })
            });

        let mut results = Vec::new();
        if let Some(rule) = self.pick_credits_rule(group, &credits) {
            results.push(rules::evaluate_for_conclusion(self, rule, group, interval, mode));
        }
        if !selection.is_empty() {
            results.push(RuleResult::or_all(selection.iter().map(|rule| {
                rules::evaluate_for_conclusion(self, rule, group, interval, mode)
            })));
        }
        results.extend(
            others
                .iter()
                .map(|rule| rules::evaluate_for_conclusion(self, rule, group, interval, mode)),
        );
        RuleResult::and_all(results)
    }

    /// 多条学分规则: 优先上下文课程组为祖先者, 否则取第一条
    fn pick_credits_rule<'r>(
        &self,
        group: &CurriculumGroup,
        credits: &[&'r CurricularRule],
    ) -> Option<&'r CurricularRule> {
        let ancestors = self.ancestor_modules(group);
        credits
            .iter()
            .find(|rule| {
                rule.context_course_group
                    .map_or(false, |scope| ancestors.contains(&scope))
            })
            .or_else(|| credits.first())
            .copied()
    }

    fn ancestor_modules(&self, group: &CurriculumGroup) -> Vec<DegreeModuleId> {
        let mut modules = Vec::new();
        let mut current = group.parent;
        while let Some(id) = current {
            let Some(parent) = self.curriculum.group(id) else {
                break;
            };
            modules.extend(parent.degree_module());
            current = parent.parent;
        }
        modules
    }

    /// 无规则课程组
    ///
    /// # 规则
    /// - 无子记录: 已结业 TRUE, 可结业 FALSE
    /// - 课程记录按模块分组: 已结业需有通过记录, 可结业需有通过或已选记录
    /// - 子结构课程组递归; 无结构课程组不参与上级判定
    fn evaluate_without_rules(
        &self,
        group: &CurriculumGroup,
        interval: ExecutionIntervalId,
        mode: ConclusionMode,
    ) -> RuleResult {
        let lines: Vec<_> = self
            .curriculum
            .lines_of(group.id)
            .into_iter()
            .filter(|line| !line.is_annulled())
            .collect();
        let child_groups: Vec<&CurriculumGroup> = self
            .curriculum
            .child_groups(group.id)
            .into_iter()
            .filter(|child| !child.is_no_course_group())
            .collect();

        if lines.is_empty() && child_groups.is_empty() {
            return match mode {
                ConclusionMode::Concluded => RuleResult::success(),
                ConclusionMode::CanConclude => RuleResult::failure(
                    RuleResultMessage::new(
                        "label.curriculumGroup.empty.cannot.conclude",
                        vec![self.group_name(group)],
                    )
                    .for_optional_module(group.degree_module()),
                ),
            };
        }

        // 学分认定类免修不对应模块, 视为已通过
        let mut per_module: BTreeMap<DegreeModuleId, (bool, bool)> = BTreeMap::new();
        for line in &lines {
            if let Some(module) = line.degree_module {
                let entry = per_module.entry(module).or_insert((false, false));
                entry.0 |= line.is_approved();
                entry.1 |= line.is_enrolled();
            }
        }

        let line_results = per_module.into_iter().map(|(module, (approved, enrolled))| {
            let satisfied = match mode {
                ConclusionMode::Concluded => approved,
                ConclusionMode::CanConclude => approved || enrolled,
            };
            if satisfied {
                RuleResult::success()
            } else {
                RuleResult::failure(
                    RuleResultMessage::new(
                        "label.curriculumLine.not.approved",
                        vec![self.structure.module_name(module)],
                    )
                    .for_module(module),
                )
            }
        });
        let group_results = child_groups
            .iter()
            .map(|child| self.evaluate(child.id, interval, mode));

        RuleResult::and_all(line_results.chain(group_results).collect::<Vec<_>>())
    }

    /// 课程组显示名称
    pub fn group_name(&self, group: &CurriculumGroup) -> String {
        match group.degree_module() {
            Some(module) => self.structure.module_name(module),
            None => group.id.to_string(),
        }
    }

    /// 子树已通过学分 (不含无结构课程组)
    pub fn approved_credits(&self, group: CurriculumGroupId) -> f64 {
        self.curriculum
            .subtree_lines(group)
            .iter()
            .filter(|line| line.is_approved())
            .map(|line| line.ects_credits)
            .sum()
    }

    /// 子树已选未评定学分 (不含无结构课程组)
    pub fn enrolled_credits(&self, group: CurriculumGroupId) -> f64 {
        self.curriculum
            .subtree_lines(group)
            .iter()
            .filter(|line| line.is_enrolled())
            .map(|line| line.ects_credits)
            .sum()
    }

    /// 各结业检查点 (带 ProgramConclusion 标记的课程组) 的判定汇总
    pub fn conclusion_summaries(&self, interval: ExecutionIntervalId) -> Vec<ConclusionSummary> {
        let mut summaries = Vec::new();
        let mut stack = vec![self.curriculum.root_group()];
        while let Some(id) = stack.pop() {
            let Some(group) = self.curriculum.group(id) else {
                continue;
            };
            stack.extend(group.child_groups.iter().rev().copied());

            let Some(module) = group.degree_module() else {
                continue;
            };
            let Some(conclusion) = self
                .structure
                .module(module)
                .and_then(|m| m.program_conclusion())
            else {
                continue;
            };
            summaries.push(ConclusionSummary {
                curriculum_group: id,
                degree_module: module,
                program_conclusion: conclusion.name.clone(),
                approved_credits: self.approved_credits(id),
                concluded: self.is_concluded(id, interval),
                can_conclude: self.can_conclude(id, interval),
            });
        }
        summaries
    }
}
