use super::core::DegreeCurricularPlan;
use crate::domain::calendar::ExecutionCalendar;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::rule::{validate_limits, CurricularRule, CurricularRuleKind, NewCurricularRule};
use crate::domain::types::{ContextId, CurricularRuleId, DegreeModuleId, ExecutionIntervalId};
use std::collections::BTreeMap;
use tracing::{debug, info};

impl DegreeCurricularPlan {
    /// 新增课程规则
    ///
    /// # 校验
    /// - 挂载模块、上下文课程组、上下文、载荷引用的模块均属于本计划
    /// - 载荷自洽 (上下限、非空审批集合)
    /// - 学分/数量/审批规则只挂载在课程组上; approval_group 必须是课程组
    /// - 有效期窗口合法
    pub fn add_curricular_rule(
        &mut self,
        calendar: &dyn ExecutionCalendar,
        new_rule: NewCurricularRule,
    ) -> DomainResult<CurricularRuleId> {
        let module = self.require_module(new_rule.degree_module_to_apply_rule)?;
        if new_rule.kind.requires_course_group() && !module.is_course_group() {
            return Err(DomainError::RuleRequiresCourseGroup {
                rule_type: new_rule.kind.rule_type().to_string(),
                module: module.id,
            });
        }
        if let Some(group) = new_rule.context_course_group {
            self.require_course_group(group)?;
        }
        if let Some(context) = new_rule.context {
            self.require_context(context)?;
        }
        for referenced in new_rule.kind.referenced_modules() {
            self.require_module(referenced)?;
        }
        if let CurricularRuleKind::DegreeModuleSetApproval {
            approval_group: Some(group),
            ..
        } = &new_rule.kind
        {
            self.require_course_group(*group)?;
        }
        new_rule.kind.validate()?;
        new_rule.window.validate(calendar)?;

        let id = CurricularRuleId::new(self.id, self.allocate_seq());
        let rule = CurricularRule {
            id,
            degree_module_to_apply_rule: new_rule.degree_module_to_apply_rule,
            context_course_group: new_rule.context_course_group,
            context: new_rule.context,
            window: new_rule.window,
            kind: new_rule.kind,
        };
        info!(
            rule = %id,
            rule_type = %rule.rule_type(),
            module = %rule.degree_module_to_apply_rule,
            "新增课程规则"
        );
        self.rules.insert(id, rule);
        Ok(id)
    }

    /// 模块在执行期生效的课程规则
    ///
    /// # 规则
    /// - 有效期窗口在执行期内有效
    /// - rule.context 限定: 查询上下文必须相同
    /// - rule.context_course_group 限定: 查询上下文的父课程组必须相同
    /// - 同变体同范围的多条规则: 开始最晚者替代其余
    ///
    /// # 返回
    /// 按规则标识排序
    pub fn curricular_rules(
        &self,
        calendar: &dyn ExecutionCalendar,
        module: DegreeModuleId,
        context: Option<ContextId>,
        interval: ExecutionIntervalId,
    ) -> Vec<&CurricularRule> {
        let query_parent = context
            .and_then(|ctx| self.contexts.get(&ctx))
            .map(|ctx| ctx.parent);

        let mut latest: BTreeMap<_, &CurricularRule> = BTreeMap::new();
        for rule in self.rules.values() {
            if rule.degree_module_to_apply_rule != module {
                continue;
            }
            if !rule.window.is_valid(calendar, interval) {
                continue;
            }
            if rule.context.is_some() && rule.context != context {
                continue;
            }
            if rule.context_course_group.is_some() && rule.context_course_group != query_parent {
                continue;
            }

            let begin = rule.window.begin_date(calendar);
            latest
                .entry(rule.supersession_key())
                .and_modify(|current: &mut &CurricularRule| {
                    if (begin, rule.id) > (current.window.begin_date(calendar), current.id) {
                        *current = rule;
                    }
                })
                .or_insert(rule);
        }

        let mut rules: Vec<&CurricularRule> = latest.into_values().collect();
        rules.sort_by_key(|rule| rule.id);
        debug!(module = %module, interval = %interval, count = rules.len(), "解析课程规则");
        rules
    }

    /// 模块上挂载的全部规则 (不论有效期与范围)
    ///
    /// 结业判定据此补入上下文课程组为更上层祖先的学分规则
    pub fn rules_attached_to(&self, module: DegreeModuleId) -> Vec<&CurricularRule> {
        self.rules
            .values()
            .filter(|rule| rule.degree_module_to_apply_rule == module)
            .collect()
    }

    // ==========================================
    // 管理端阈值修改 (立即生效, 无缓存)
    // ==========================================

    /// 修改学分/数量规则下限
    pub fn set_minimum_limit(&mut self, rule: CurricularRuleId, value: f64) -> DomainResult<()> {
        self.update_limits(rule, |min, _| *min = value)
    }

    /// 修改学分/数量规则上限
    pub fn set_maximum_limit(&mut self, rule: CurricularRuleId, value: f64) -> DomainResult<()> {
        self.update_limits(rule, |_, max| *max = value)
    }

    fn update_limits(
        &mut self,
        rule_id: CurricularRuleId,
        apply: impl FnOnce(&mut f64, &mut f64),
    ) -> DomainResult<()> {
        self.ensure_same_plan(rule_id.plan, rule_id)?;
        let rule = self
            .rules
            .get_mut(&rule_id)
            .ok_or(DomainError::UnknownCurricularRule(rule_id))?;

        match &mut rule.kind {
            CurricularRuleKind::CreditsLimit {
                min_credits,
                max_credits,
            } => {
                let (mut min, mut max) = (*min_credits, *max_credits);
                apply(&mut min, &mut max);
                validate_limits(min, max)?;
                *min_credits = min;
                *max_credits = max;
                info!(rule = %rule_id, min, max, "修改学分上下限");
            }
            CurricularRuleKind::DegreeModulesSelectionLimit {
                min_modules,
                max_modules,
            } => {
                let (mut min, mut max) = (*min_modules as f64, *max_modules as f64);
                apply(&mut min, &mut max);
                validate_limits(min, max)?;
                for value in [min, max] {
                    if value.fract() != 0.0 {
                        return Err(DomainError::FractionalModuleLimit(value));
                    }
                    if value > u32::MAX as f64 {
                        return Err(DomainError::ModuleLimitOutOfRange(value));
                    }
                }
                *min_modules = min as u32;
                *max_modules = max as u32;
                info!(rule = %rule_id, min, max, "修改模块数量上下限");
            }
            _ => return Err(DomainError::LimitsNotSupported(rule_id)),
        }
        Ok(())
    }
}
