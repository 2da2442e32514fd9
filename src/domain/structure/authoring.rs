use super::core::DegreeCurricularPlan;
use crate::domain::calendar::{ExecutionCalendar, ValidityWindow};
use crate::domain::curriculum::CurriculumReadModel;
use crate::domain::degree_module::{
    normalize_name, Context, DegreeModule, DegreeModuleKind, ProgramConclusion,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::{ContextId, CurricularPeriodId, DegreeModuleId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

impl DegreeCurricularPlan {
    // ==========================================
    // 学位模块创建
    // ==========================================

    /// 新建课程组 (尚未挂载, 需通过 add_context 连接到树)
    pub fn add_course_group(&mut self, name: &str) -> DegreeModuleId {
        let id = DegreeModuleId::new(self.id, self.allocate_seq());
        self.modules.insert(
            id,
            DegreeModule {
                id,
                name: name.to_string(),
                kind: DegreeModuleKind::CourseGroup {
                    program_conclusion: None,
                },
            },
        );
        debug!(module = %id, name, "新建课程组");
        id
    }

    /// 新建课程
    ///
    /// # 参数
    /// - name: 课程名称
    /// - code: 课程代码
    /// - ects_credits: ECTS 学分 (非负)
    pub fn add_curricular_course(
        &mut self,
        name: &str,
        code: &str,
        ects_credits: f64,
    ) -> DomainResult<DegreeModuleId> {
        if !ects_credits.is_finite() || ects_credits < 0.0 {
            return Err(DomainError::NegativeCredits(ects_credits));
        }
        let id = DegreeModuleId::new(self.id, self.allocate_seq());
        self.modules.insert(
            id,
            DegreeModule {
                id,
                name: name.to_string(),
                kind: DegreeModuleKind::CurricularCourse {
                    code: code.to_string(),
                    ects_credits,
                },
            },
        );
        debug!(module = %id, name, code, ects_credits, "新建课程");
        Ok(id)
    }

    /// 标记课程组为结业检查点
    pub fn set_program_conclusion(
        &mut self,
        group: DegreeModuleId,
        conclusion: Option<ProgramConclusion>,
    ) -> DomainResult<()> {
        self.require_course_group(group)?;
        if let Some(DegreeModule {
            kind: DegreeModuleKind::CourseGroup { program_conclusion },
            ..
        }) = self.modules.get_mut(&group)
        {
            *program_conclusion = conclusion;
        }
        Ok(())
    }

    // ==========================================
    // 上下文创建
    // ==========================================

    /// 在父课程组下挂载子模块
    ///
    /// # 校验
    /// - 父模块必须是本计划的课程组, 子模块与学期位置必须属于本计划
    /// - 有效期开始不晚于结束, 且落在父课程组自身上下文的有效期范围内
    /// - 同一父子对的上下文有效期不得重叠
    /// - 不得成环
    /// - 规范化名称不得与兄弟节点重复 (并递归检查挂入的子树)
    pub fn add_context(
        &mut self,
        calendar: &dyn ExecutionCalendar,
        parent: DegreeModuleId,
        child: DegreeModuleId,
        curricular_period: CurricularPeriodId,
        window: ValidityWindow,
        child_order: u32,
    ) -> DomainResult<ContextId> {
        self.require_course_group(parent)?;
        self.require_module(child)?;
        self.ensure_same_plan(curricular_period.plan, curricular_period)?;
        if !self.periods.contains(curricular_period) {
            return Err(DomainError::UnknownCurricularPeriod(curricular_period));
        }
        window.validate(calendar)?;

        if let Some(hull) = self.allowed_window(calendar, parent) {
            if !window_within(calendar, &window, hull) {
                return Err(DomainError::ContextOutsideParentWindow(parent));
            }
        }

        let overlapping = self.contexts.values().any(|existing| {
            existing.parent == parent
                && existing.child == child
                && existing.window.overlaps_window(calendar, &window)
        });
        if overlapping {
            return Err(DomainError::OverlappingContext { parent, child });
        }

        if child == parent || self.is_reachable(child, parent) {
            return Err(DomainError::CyclicStructure { parent, child });
        }

        self.check_sibling_names(parent, child)?;
        self.check_subtree_names(child, &mut HashSet::new())?;

        let id = ContextId::new(self.id, self.allocate_seq());
        self.contexts.insert(
            id,
            Context {
                id,
                parent,
                child,
                curricular_period,
                window,
                child_order,
            },
        );
        info!(context = %id, parent = %parent, child = %child, "新增上下文");
        Ok(id)
    }

    /// 父课程组允许的有效期范围 (其所有父上下文的并集外包)
    ///
    /// # 返回
    /// - None: 根课程组或尚未挂载的课程组, 不限制
    fn allowed_window(
        &self,
        calendar: &dyn ExecutionCalendar,
        parent: DegreeModuleId,
    ) -> Option<(NaiveDate, Option<NaiveDate>)> {
        if parent == self.root {
            return None;
        }
        let ranges: Vec<(NaiveDate, Option<NaiveDate>)> = self
            .contexts
            .values()
            .filter(|ctx| ctx.child == parent)
            .filter_map(|ctx| ctx.window.date_range(calendar))
            .collect();
        let begin = ranges.iter().map(|(begin, _)| *begin).min()?;
        let end = if ranges.iter().any(|(_, end)| end.is_none()) {
            None
        } else {
            ranges.iter().filter_map(|(_, end)| *end).max()
        };
        Some((begin, end))
    }

    /// from 沿任意时期的上下文向下能否到达 target
    pub(super) fn is_reachable(&self, from: DegreeModuleId, target: DegreeModuleId) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.contexts
                    .values()
                    .filter(|ctx| ctx.parent == current)
                    .map(|ctx| ctx.child),
            );
        }
        false
    }

    fn check_sibling_names(&self, parent: DegreeModuleId, child: DegreeModuleId) -> DomainResult<()> {
        let Some(child_module) = self.modules.get(&child) else {
            return Ok(());
        };
        let name = child_module.normalized_name();
        let duplicated = self
            .contexts
            .values()
            .filter(|ctx| ctx.parent == parent && ctx.child != child)
            .filter_map(|ctx| self.modules.get(&ctx.child))
            .any(|sibling| sibling.normalized_name() == name);
        if duplicated {
            return Err(DomainError::DuplicateSiblingName {
                parent,
                name: child_module.name.clone(),
            });
        }
        Ok(())
    }

    fn check_subtree_names(
        &self,
        group: DegreeModuleId,
        visited: &mut HashSet<DegreeModuleId>,
    ) -> DomainResult<()> {
        if !visited.insert(group) {
            return Ok(());
        }
        let children: BTreeSet<DegreeModuleId> = self
            .contexts
            .values()
            .filter(|ctx| ctx.parent == group)
            .map(|ctx| ctx.child)
            .collect();

        let mut seen = HashSet::new();
        for child in &children {
            let Some(module) = self.modules.get(child) else {
                continue;
            };
            if !seen.insert(normalize_name(&module.name)) {
                return Err(DomainError::DuplicateSiblingName {
                    parent: group,
                    name: module.name.clone(),
                });
            }
            if module.is_course_group() {
                self.check_subtree_names(*child, visited)?;
            }
        }
        Ok(())
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 删除上下文 (仍被规则以上下文范围引用时拒绝)
    pub fn delete_context(&mut self, id: ContextId) -> DomainResult<Context> {
        self.require_context(id)?;
        if let Some(rule) = self.rules.values().find(|rule| rule.context == Some(id)) {
            return Err(DomainError::ContextReferencedByRule {
                context: id,
                rule: rule.id,
            });
        }
        let removed = self
            .contexts
            .remove(&id)
            .ok_or(DomainError::UnknownContext(id))?;
        info!(context = %id, "删除上下文");
        Ok(removed)
    }

    /// 删除学位模块 (连同其父上下文)
    ///
    /// # 拒绝条件
    /// - 根课程组
    /// - 仍有子上下文
    /// - 任一学生课程记录引用该模块
    /// - 任一规则挂载于该模块、以其为上下文课程组或在载荷中引用它
    /// - 其父上下文仍被规则引用
    pub fn delete_degree_module(
        &mut self,
        id: DegreeModuleId,
        curricula: &[&dyn CurriculumReadModel],
    ) -> DomainResult<DegreeModule> {
        self.require_module(id)?;
        if id == self.root {
            return Err(DomainError::CannotDeleteRoot(id));
        }
        if self.contexts.values().any(|ctx| ctx.parent == id) {
            return Err(DomainError::ModuleHasChildContexts(id));
        }
        let referenced_by_curriculum = curricula.iter().any(|curriculum| {
            curriculum.group_for_module(id).is_some()
                || !curriculum.lines_for_module(id).is_empty()
        });
        if referenced_by_curriculum {
            return Err(DomainError::ModuleReferencedByCurriculum(id));
        }
        if let Some(rule) = self.rules.values().find(|rule| {
            rule.degree_module_to_apply_rule == id
                || rule.context_course_group == Some(id)
                || rule.kind.referenced_modules().contains(&id)
        }) {
            return Err(DomainError::ModuleReferencedByRule {
                module: id,
                rule: rule.id,
            });
        }

        let parent_contexts: Vec<ContextId> = self
            .contexts
            .values()
            .filter(|ctx| ctx.child == id)
            .map(|ctx| ctx.id)
            .collect();
        for context in &parent_contexts {
            if let Some(rule) = self.rules.values().find(|rule| rule.context == Some(*context)) {
                return Err(DomainError::ContextReferencedByRule {
                    context: *context,
                    rule: rule.id,
                });
            }
        }
        for context in parent_contexts {
            self.contexts.remove(&context);
        }

        let removed = self
            .modules
            .remove(&id)
            .ok_or(DomainError::UnknownDegreeModule(id))?;
        info!(module = %id, name = %removed.name, "删除学位模块");
        Ok(removed)
    }
}

fn window_within(
    calendar: &dyn ExecutionCalendar,
    window: &ValidityWindow,
    (hull_begin, hull_end): (NaiveDate, Option<NaiveDate>),
) -> bool {
    let Some((begin, end)) = window.date_range(calendar) else {
        return false;
    };
    if begin < hull_begin {
        return false;
    }
    match (end, hull_end) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(end), Some(hull_end)) => end <= hull_end,
    }
}
