use super::core::DegreeCurricularPlan;
use crate::domain::calendar::ExecutionCalendar;
use crate::domain::degree_module::{Context, DegreeModuleType};
use crate::domain::rule::CurricularRuleKind;
use crate::domain::types::{ContextId, DegreeModuleId, ExecutionIntervalId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 根到目标模块的一条结构路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructurePath {
    /// (模块, 到达该模块的上下文); 首项为根 (上下文为空)
    pub steps: Vec<(DegreeModuleId, Option<ContextId>)>,
}

impl StructurePath {
    pub fn target(&self) -> Option<DegreeModuleId> {
        self.steps.last().map(|(module, _)| *module)
    }

    pub fn target_context(&self) -> Option<ContextId> {
        self.steps.last().and_then(|(_, context)| *context)
    }

    /// 目标的祖先课程组 (根在前, 不含目标)
    pub fn ancestors(&self) -> &[(DegreeModuleId, Option<ContextId>)] {
        match self.steps.split_last() {
            Some((_, ancestors)) => ancestors,
            None => &[],
        }
    }

    pub fn contains(&self, module: DegreeModuleId) -> bool {
        self.steps.iter().any(|(m, _)| *m == module)
    }
}

impl DegreeCurricularPlan {
    fn sorted_contexts<'a>(&'a self, mut contexts: Vec<&'a Context>) -> Vec<&'a Context> {
        contexts.sort_by_key(|ctx| (ctx.child_order, ctx.id));
        contexts
    }

    /// 全部子上下文 (不论有效期)
    pub fn child_contexts(&self, group: DegreeModuleId) -> Vec<&Context> {
        self.sorted_contexts(self.contexts.values().filter(|ctx| ctx.parent == group).collect())
    }

    /// 与执行期重叠的子上下文
    pub fn valid_child_contexts(
        &self,
        calendar: &dyn ExecutionCalendar,
        group: DegreeModuleId,
        interval: ExecutionIntervalId,
    ) -> Vec<&Context> {
        self.sorted_contexts(
            self.contexts
                .values()
                .filter(|ctx| ctx.parent == group && ctx.window.overlaps(calendar, interval))
                .collect(),
        )
    }

    /// 在学年任一学期有效的子上下文 (学年/学期粒度混用的计划)
    pub fn valid_child_contexts_for_execution_aggregation(
        &self,
        calendar: &dyn ExecutionCalendar,
        group: DegreeModuleId,
        year: ExecutionIntervalId,
    ) -> Vec<&Context> {
        let year = calendar.year_of(year).unwrap_or(year);
        let children = calendar.child_intervals(year);
        self.sorted_contexts(
            self.contexts
                .values()
                .filter(|ctx| ctx.parent == group)
                .filter(|ctx| {
                    if children.is_empty() {
                        ctx.window.overlaps(calendar, year)
                    } else {
                        children.iter().any(|child| ctx.window.is_valid(calendar, *child))
                    }
                })
                .collect(),
        )
    }

    /// 深度优先收集学年内经有效上下文可达的模块
    ///
    /// # 参数
    /// - module_type: 仅收集指定类型 (None 表示全部)
    pub fn collect_all_child_degree_modules(
        &self,
        calendar: &dyn ExecutionCalendar,
        group: DegreeModuleId,
        module_type: Option<DegreeModuleType>,
        year: ExecutionIntervalId,
    ) -> Vec<DegreeModuleId> {
        let mut collected = Vec::new();
        let mut visited = HashSet::new();
        self.collect_into(calendar, group, module_type, year, &mut visited, &mut collected);
        collected
    }

    fn collect_into(
        &self,
        calendar: &dyn ExecutionCalendar,
        group: DegreeModuleId,
        module_type: Option<DegreeModuleType>,
        year: ExecutionIntervalId,
        visited: &mut HashSet<DegreeModuleId>,
        collected: &mut Vec<DegreeModuleId>,
    ) {
        for ctx in self.valid_child_contexts_for_execution_aggregation(calendar, group, year) {
            if !visited.insert(ctx.child) {
                continue;
            }
            let Some(child) = self.modules.get(&ctx.child) else {
                continue;
            };
            if module_type.map_or(true, |wanted| child.module_type() == wanted) {
                collected.push(child.id);
            }
            if !child.is_leaf() {
                self.collect_into(calendar, child.id, module_type, year, visited, collected);
            }
        }
    }

    /// 全部父上下文 (不论有效期)
    pub fn parent_contexts(&self, module: DegreeModuleId) -> Vec<&Context> {
        self.sorted_contexts(self.contexts.values().filter(|ctx| ctx.child == module).collect())
    }

    /// 父子之间在执行期有效的上下文
    pub fn context_between(
        &self,
        calendar: &dyn ExecutionCalendar,
        parent: DegreeModuleId,
        child: DegreeModuleId,
        interval: ExecutionIntervalId,
    ) -> Option<&Context> {
        self.valid_child_contexts(calendar, parent, interval)
            .into_iter()
            .find(|ctx| ctx.child == child)
    }

    /// 从根沿有效上下文到目标模块的第一条路径 (按子序号深度优先)
    pub fn path_to_module(
        &self,
        calendar: &dyn ExecutionCalendar,
        target: DegreeModuleId,
        interval: ExecutionIntervalId,
    ) -> Option<StructurePath> {
        let mut steps = vec![(self.root, None)];
        let mut visited = HashSet::new();
        if self.search_path(calendar, target, interval, &mut steps, &mut visited) {
            Some(StructurePath { steps })
        } else {
            None
        }
    }

    fn search_path(
        &self,
        calendar: &dyn ExecutionCalendar,
        target: DegreeModuleId,
        interval: ExecutionIntervalId,
        steps: &mut Vec<(DegreeModuleId, Option<ContextId>)>,
        visited: &mut HashSet<DegreeModuleId>,
    ) -> bool {
        let Some(&(current, _)) = steps.last() else {
            return false;
        };
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        for ctx in self.valid_child_contexts(calendar, current, interval) {
            steps.push((ctx.child, Some(ctx.id)));
            if self.search_path(calendar, target, interval, steps, visited) {
                return true;
            }
            steps.pop();
        }
        false
    }

    /// 经由指定上下文到达其子模块的路径
    pub fn path_through_context(
        &self,
        calendar: &dyn ExecutionCalendar,
        context: ContextId,
        interval: ExecutionIntervalId,
    ) -> Option<StructurePath> {
        let ctx = self.contexts.get(&context)?;
        if !ctx.window.overlaps(calendar, interval) {
            return None;
        }
        let mut path = self.path_to_module(calendar, ctx.parent, interval)?;
        path.steps.push((ctx.child, Some(ctx.id)));
        Some(path)
    }

    // ==========================================
    // ECTS 学分函数
    // ==========================================

    /// 最少学分: 课程 → 课程学分; 课程组 → 学分规则下限, 否则为有效子模块之和
    pub fn min_ects_credits(
        &self,
        calendar: &dyn ExecutionCalendar,
        module: DegreeModuleId,
        interval: ExecutionIntervalId,
    ) -> f64 {
        self.ects_credits(calendar, module, interval, true, &mut HashSet::new())
    }

    /// 最多学分: 课程 → 课程学分; 课程组 → 学分规则上限, 否则为有效子模块之和
    pub fn max_ects_credits(
        &self,
        calendar: &dyn ExecutionCalendar,
        module: DegreeModuleId,
        interval: ExecutionIntervalId,
    ) -> f64 {
        self.ects_credits(calendar, module, interval, false, &mut HashSet::new())
    }

    fn ects_credits(
        &self,
        calendar: &dyn ExecutionCalendar,
        module: DegreeModuleId,
        interval: ExecutionIntervalId,
        minimum: bool,
        visited: &mut HashSet<DegreeModuleId>,
    ) -> f64 {
        let Some(degree_module) = self.modules.get(&module) else {
            return 0.0;
        };
        if let Some(credits) = degree_module.course_ects_credits() {
            return credits;
        }
        if !visited.insert(module) {
            return 0.0;
        }

        let credits_rule = self
            .curricular_rules(calendar, module, None, interval)
            .into_iter()
            .find_map(|rule| match rule.kind {
                CurricularRuleKind::CreditsLimit {
                    min_credits,
                    max_credits,
                } => Some((min_credits, max_credits)),
                _ => None,
            });
        if let Some((min_credits, max_credits)) = credits_rule {
            return if minimum { min_credits } else { max_credits };
        }

        self.valid_child_contexts(calendar, module, interval)
            .iter()
            .map(|ctx| self.ects_credits(calendar, ctx.child, interval, minimum, visited))
            .sum()
    }
}
