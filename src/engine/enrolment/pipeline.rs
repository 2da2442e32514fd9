use super::context::{DegreeModuleToEnrol, EnrolmentContext, EnrolmentResult, ModuleEnrolmentOutcome};
use super::error::EnrolmentError;
use crate::domain::calendar::ExecutionCalendar;
use crate::domain::curriculum::{CurriculumReadModel, StudentCurricularPlan};
use crate::domain::structure::{DegreeCurricularPlan, StructurePath};
use crate::domain::types::{
    ContextId, CurricularRuleId, CurriculumLineId, DegreeModuleId, ExecutionIntervalId,
};
use crate::engine::result::{RuleResult, RuleResultMessage};
use crate::engine::rules::{self, EnrolmentScope, PendingEnrolment};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// EnrolmentPipeline - 选课流水线
// ==========================================
pub struct EnrolmentPipeline<'a> {
    structure: &'a DegreeCurricularPlan,
    calendar: &'a dyn ExecutionCalendar,
}

impl<'a> EnrolmentPipeline<'a> {
    pub fn new(structure: &'a DegreeCurricularPlan, calendar: &'a dyn ExecutionCalendar) -> Self {
        Self {
            structure,
            calendar,
        }
    }

    /// 评估选课批次 (不修改学生课程计划)
    ///
    /// # 返回
    /// - Ok: 无 FAIL, 可能带警告
    /// - Err(Rejected): 任一模块 FAIL, 携带首个失败的消息键
    #[instrument(level = "debug", skip(self, plan, ctx), fields(student = plan.student()))]
    pub fn evaluate(
        &self,
        plan: &StudentCurricularPlan,
        ctx: &EnrolmentContext,
    ) -> Result<EnrolmentResult, EnrolmentError> {
        plan.ensure_structure(self.structure)?;
        let interval = ctx.execution_interval;
        if self.calendar.interval(interval).is_none() {
            return Err(EnrolmentError::UnknownExecutionInterval(interval));
        }
        let removed = self.validate_removals(plan, &ctx.lines_to_remove)?;
        let requests = dedup_requests(&ctx.degree_modules_to_evaluate);

        // 1. 定位结构路径与结构预检
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in &requests {
            outcomes.push(self.resolve(plan, ctx, request, &removed));
        }

        // 2. 规则评估 (基于全部通过预检的待选模块)
        let pending: Vec<PendingEnrolment> = outcomes
            .iter()
            .filter(|outcome| !outcome.result.is_fail())
            .map(|outcome| PendingEnrolment {
                module: outcome.degree_module,
                path: outcome.path.clone(),
                ects_credits: outcome.ects_credits,
            })
            .collect();
        let scope = EnrolmentScope {
            structure: self.structure,
            calendar: self.calendar,
            curriculum: plan,
            interval,
            requester: ctx.requester,
            pending: &pending,
            removed: &removed,
        };
        let mut evaluated_group_rules: HashSet<CurricularRuleId> = HashSet::new();
        for (outcome, target) in outcomes
            .iter_mut()
            .filter(|outcome| !outcome.result.is_fail())
            .zip(pending.iter())
        {
            let results = self.evaluate_rules(&scope, ctx, target, &mut evaluated_group_rules);
            let structural = std::mem::replace(&mut outcome.result, RuleResult::success());
            outcome.result = RuleResult::and_all(std::iter::once(structural).chain(results));
        }

        let combined = RuleResult::and_all(outcomes.iter().map(|outcome| outcome.result.clone()));
        if combined.is_fail() {
            return Err(rejection(&outcomes));
        }

        let result = EnrolmentResult {
            batch_id: Uuid::new_v4(),
            rule_level: ctx.rule_level,
            outcomes,
            combined,
        };
        info!(
            batch_id = %result.batch_id,
            level = %ctx.rule_level,
            modules = result.outcomes.len(),
            warnings = result.warnings().len(),
            "选课批次评估通过"
        );
        Ok(result)
    }

    /// 评估并整批提交
    ///
    /// # 规则
    /// - 先撤销, 再按级别落入结构镜像或无结构课程组
    /// - 在副本上修改, 全部成功后替换原计划
    pub fn enrol(
        &self,
        plan: &mut StudentCurricularPlan,
        ctx: &EnrolmentContext,
    ) -> Result<EnrolmentResult, EnrolmentError> {
        let mut result = self.evaluate(plan, ctx)?;
        let mut working = plan.clone();

        for line in &ctx.lines_to_remove {
            working.annul(*line)?;
        }

        for outcome in result.outcomes.iter_mut() {
            let is_leaf = self
                .structure
                .module(outcome.degree_module)
                .map_or(false, |module| module.is_leaf());
            let group = match ctx.rule_level.target_bucket() {
                Some(bucket) => working.ensure_no_course_group(bucket),
                None => {
                    let path = outcome
                        .path
                        .as_ref()
                        .ok_or_else(|| anyhow::anyhow!("缺少结构路径: {}", outcome.degree_module))?;
                    let steps = if is_leaf { path.ancestors() } else { &path.steps[..] };
                    let modules: Vec<DegreeModuleId> =
                        steps.iter().map(|(module, _)| *module).collect();
                    working.ensure_group_path(&modules)?
                }
            };
            if is_leaf {
                let line = working.enrol(
                    group,
                    outcome.degree_module,
                    outcome.ects_credits,
                    ctx.execution_interval,
                )?;
                outcome.enrolled_line = Some(line);
            }
        }

        *plan = working;
        info!(
            batch_id = %result.batch_id,
            student = plan.student(),
            enrolled = result.outcomes.len(),
            removed = ctx.lines_to_remove.len(),
            "选课批次已提交"
        );
        Ok(result)
    }

    /// 撤销只允许针对已选未评定记录
    fn validate_removals(
        &self,
        plan: &StudentCurricularPlan,
        lines: &[CurriculumLineId],
    ) -> Result<BTreeSet<CurriculumLineId>, EnrolmentError> {
        let mut removed = BTreeSet::new();
        for id in lines {
            match plan.line(*id) {
                Some(line) if line.is_enrolled() => {
                    removed.insert(*id);
                }
                _ => return Err(EnrolmentError::InvalidRemoval(*id)),
            }
        }
        Ok(removed)
    }

    /// 定位路径并做结构预检
    fn resolve(
        &self,
        plan: &StudentCurricularPlan,
        ctx: &EnrolmentContext,
        request: &DegreeModuleToEnrol,
        removed: &BTreeSet<CurriculumLineId>,
    ) -> ModuleEnrolmentOutcome {
        let module_id = request.module;
        let mut outcome = ModuleEnrolmentOutcome {
            degree_module: module_id,
            context: request.context,
            path: None,
            ects_credits: 0.0,
            result: RuleResult::success(),
            enrolled_line: None,
        };
        let fail = |key: &str, args: Vec<String>| {
            RuleResult::failure(RuleResultMessage::new(key, args).for_module(module_id))
        };

        let Some(module) = self.structure.module(module_id) else {
            outcome.result = fail("label.enrolment.degreeModule.unknown", vec![module_id.to_string()]);
            return outcome;
        };
        let name = module.name.clone();
        outcome.ects_credits = module.course_ects_credits().unwrap_or(0.0);

        let path = self.locate(module_id, request, ctx.execution_interval);
        if path.is_none() && ctx.rule_level.target_bucket().is_none() {
            outcome.result = fail("label.enrolment.degreeModule.not.offered", vec![name]);
            return outcome;
        }
        outcome.context = path.as_ref().and_then(|p| p.target_context());
        outcome.path = path;

        if plan.is_approved(module_id) {
            outcome.result = fail("label.enrolment.degreeModule.already.approved", vec![name]);
            return outcome;
        }
        let already_enrolled = plan
            .lines_for_module(module_id)
            .iter()
            .any(|line| line.is_enrolled() && !removed.contains(&line.id));
        if already_enrolled {
            outcome.result = fail("label.enrolment.degreeModule.already.enrolled", vec![name]);
        }
        outcome
    }

    fn locate(
        &self,
        module: DegreeModuleId,
        request: &DegreeModuleToEnrol,
        interval: ExecutionIntervalId,
    ) -> Option<StructurePath> {
        match request.context {
            Some(context) => self
                .structure
                .path_through_context(self.calendar, context, interval)
                .filter(|path| path.target() == Some(module)),
            None => self.structure.path_to_module(self.calendar, module, interval),
        }
    }

    /// 目标模块自身规则 + 祖先课程组规则
    ///
    /// # 规则
    /// - 逐模块规则 (先修学年 / 协调人审批) 对每个目标各评估一次
    /// - 汇总规则 (学分 / 数量) 在整批中每条只评估一次
    fn evaluate_rules(
        &self,
        scope: &EnrolmentScope<'_>,
        ctx: &EnrolmentContext,
        target: &PendingEnrolment,
        evaluated_group_rules: &mut HashSet<CurricularRuleId>,
    ) -> Vec<RuleResult> {
        let level = ctx.rule_level;
        let mut scoped: Vec<(DegreeModuleId, Option<ContextId>)> = Vec::new();
        if level.evaluates_module_rules() {
            scoped.push((
                target.module,
                target.path.as_ref().and_then(|path| path.target_context()),
            ));
        }
        if level.evaluates_group_rules() {
            if let Some(path) = &target.path {
                scoped.extend(path.ancestors().iter().copied());
            }
        }

        let mut module_rules_seen: HashSet<CurricularRuleId> = HashSet::new();
        let mut results = Vec::new();
        for (module, context) in scoped {
            for rule in
                self.structure
                    .curricular_rules(self.calendar, module, context, ctx.execution_interval)
            {
                let first_time = if rules::is_module_dependent(rule) {
                    module_rules_seen.insert(rule.id)
                } else {
                    evaluated_group_rules.insert(rule.id)
                };
                if !first_time {
                    continue;
                }
                let result = rules::evaluate_for_enrolment(scope, rule, target);
                debug!(
                    rule = %rule.id,
                    rule_type = %rule.rule_type(),
                    target = %target.module,
                    value = ?result.value,
                    severity = ?result.severity,
                    "选课规则评估"
                );
                results.push(result);
            }
        }
        results
    }
}

/// 同一模块只保留第一次出现
fn dedup_requests(requests: &[DegreeModuleToEnrol]) -> Vec<DegreeModuleToEnrol> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(requests.len());
    for request in requests {
        if seen.insert(request.module) {
            unique.push(request.clone());
        } else {
            warn!(module = %request.module, "选课批次中模块重复, 已忽略");
        }
    }
    unique
}

fn rejection(outcomes: &[ModuleEnrolmentOutcome]) -> EnrolmentError {
    let failed: Vec<&ModuleEnrolmentOutcome> = outcomes
        .iter()
        .filter(|outcome| outcome.result.is_fail())
        .collect();
    let Some(first) = failed.first() else {
        return EnrolmentError::Other(anyhow::anyhow!("选课批次判定失败但无失败模块"));
    };
    let module = first.degree_module;
    let messages: Vec<RuleResultMessage> = failed
        .iter()
        .flat_map(|outcome| outcome.result.messages.iter().cloned())
        .collect();
    let key = first
        .result
        .messages
        .first()
        .map(|message| message.key.clone())
        .unwrap_or_default();
    warn!(module = %module, key = %key, failures = failed.len(), "选课批次被拒绝");
    EnrolmentError::Rejected {
        module,
        key,
        messages,
    }
}
