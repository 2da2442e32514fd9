use crate::domain::curricular_period::CurricularPeriods;
use crate::domain::degree_module::{Context, DegreeModule, DegreeModuleKind};
use crate::domain::enrolment_model::EnrolmentModelConfig;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::rule::CurricularRule;
use crate::domain::types::{
    ContextId, CurricularRuleId, DegreeModuleId, EnrolmentModel, PlanId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

// ==========================================
// DegreeCurricularPlan - 学位课程计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeCurricularPlan {
    pub(super) id: PlanId,
    pub(super) name: String,
    pub(super) degree_code: String,
    pub(super) root: DegreeModuleId,
    pub(super) modules: BTreeMap<DegreeModuleId, DegreeModule>,
    pub(super) contexts: BTreeMap<ContextId, Context>,
    pub(super) rules: BTreeMap<CurricularRuleId, CurricularRule>,
    pub(super) periods: CurricularPeriods,
    pub(super) enrolment_model: EnrolmentModel,
    pub(super) enrolment_model_config: Option<EnrolmentModelConfig>,
    pub(super) next_seq: u32,
}

impl DegreeCurricularPlan {
    /// 创建学位课程计划 (同时创建根课程组)
    ///
    /// # 参数
    /// - id: 计划标识
    /// - name: 计划名称 (同时作为根课程组名称)
    /// - degree_code: 学位代码, 用于读取选课模型配置
    pub fn new(id: PlanId, name: &str, degree_code: &str) -> Self {
        let root = DegreeModuleId::new(id, 1);
        let mut modules = BTreeMap::new();
        modules.insert(
            root,
            DegreeModule {
                id: root,
                name: name.to_string(),
                kind: DegreeModuleKind::CourseGroup {
                    program_conclusion: None,
                },
            },
        );

        Self {
            id,
            name: name.to_string(),
            degree_code: degree_code.to_string(),
            root,
            modules,
            contexts: BTreeMap::new(),
            rules: BTreeMap::new(),
            periods: CurricularPeriods::new(id),
            enrolment_model: EnrolmentModel::default(),
            enrolment_model_config: None,
            next_seq: 1,
        }
    }

    pub fn id(&self) -> PlanId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn degree_code(&self) -> &str {
        &self.degree_code
    }

    pub fn root(&self) -> DegreeModuleId {
        self.root
    }

    pub fn module(&self, id: DegreeModuleId) -> Option<&DegreeModule> {
        self.modules.get(&id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &DegreeModule> {
        self.modules.values()
    }

    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(&id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    pub fn rule(&self, id: CurricularRuleId) -> Option<&CurricularRule> {
        self.rules.get(&id)
    }

    pub fn rules(&self) -> impl Iterator<Item = &CurricularRule> {
        self.rules.values()
    }

    pub fn periods(&self) -> &CurricularPeriods {
        &self.periods
    }

    /// 课程学期位置 (编写期创建 学年/学期/季度)
    pub fn periods_mut(&mut self) -> &mut CurricularPeriods {
        &mut self.periods
    }

    pub fn enrolment_model(&self) -> EnrolmentModel {
        self.enrolment_model
    }

    pub fn set_enrolment_model(&mut self, model: EnrolmentModel) {
        self.enrolment_model = model;
    }

    /// 生效的选课校验分组 (显式配置优先, 否则取模型默认)
    pub fn enrolment_model_config(&self) -> EnrolmentModelConfig {
        self.enrolment_model_config
            .clone()
            .unwrap_or_else(|| EnrolmentModelConfig::for_model(self.enrolment_model))
    }

    pub fn set_enrolment_model_config(
        &mut self,
        config: Option<EnrolmentModelConfig>,
    ) -> DomainResult<()> {
        if let Some(config) = &config {
            config.validate()?;
        }
        self.enrolment_model_config = config;
        Ok(())
    }

    /// 模块显示名称 (未知模块回退为标识)
    pub fn module_name(&self, id: DegreeModuleId) -> String {
        self.modules
            .get(&id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub(super) fn allocate_seq(&mut self) -> u32 {
        self.next_seq += 1;
        self.next_seq
    }

    /// 校验引用属于本计划
    pub(super) fn ensure_same_plan(&self, plan: PlanId, reference: impl Display) -> DomainResult<()> {
        if plan != self.id {
            return Err(DomainError::MismatchedPlan {
                reference: reference.to_string(),
                plan: self.id,
            });
        }
        Ok(())
    }

    /// 查找本计划内的学位模块
    pub(super) fn require_module(&self, id: DegreeModuleId) -> DomainResult<&DegreeModule> {
        self.ensure_same_plan(id.plan, id)?;
        self.modules
            .get(&id)
            .ok_or(DomainError::UnknownDegreeModule(id))
    }

    /// 查找本计划内的课程组
    pub(super) fn require_course_group(&self, id: DegreeModuleId) -> DomainResult<&DegreeModule> {
        let module = self.require_module(id)?;
        if !module.is_course_group() {
            return Err(DomainError::NotACourseGroup(id));
        }
        Ok(module)
    }

    pub(super) fn require_context(&self, id: ContextId) -> DomainResult<&Context> {
        self.ensure_same_plan(id.plan, id)?;
        self.contexts.get(&id).ok_or(DomainError::UnknownContext(id))
    }
}
