use super::model::{CurriculumGroup, CurriculumGroupKind, CurriculumLine, CurriculumLineKind};
use super::read_model::CurriculumReadModel;
use crate::domain::error::{CurriculumError, CurriculumResult};
use crate::domain::structure::DegreeCurricularPlan;
use crate::domain::types::{
    CurriculumGroupId, CurriculumLineId, DegreeModuleId, DismissalKind, EnrolmentState,
    ExecutionIntervalId, NoCourseGroupType, PlanId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

// ==========================================
// StudentCurricularPlan - 学生课程计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentCurricularPlan {
    student: String,
    degree_plan: PlanId,
    root: CurriculumGroupId,
    groups: BTreeMap<CurriculumGroupId, CurriculumGroup>,
    lines: BTreeMap<CurriculumLineId, CurriculumLine>,
    next_group: u32,
    next_line: u32,
}

impl StudentCurricularPlan {
    /// 为学生创建课程计划 (根课程组镜像结构根)
    pub fn new(student: &str, structure: &DegreeCurricularPlan) -> Self {
        let root = CurriculumGroupId(1);
        let mut groups = BTreeMap::new();
        groups.insert(
            root,
            CurriculumGroup {
                id: root,
                parent: None,
                kind: CurriculumGroupKind::Structural(structure.root()),
                child_groups: Vec::new(),
                lines: Vec::new(),
            },
        );
        Self {
            student: student.to_string(),
            degree_plan: structure.id(),
            root,
            groups,
            lines: BTreeMap::new(),
            next_group: 1,
            next_line: 0,
        }
    }

    pub fn student(&self) -> &str {
        &self.student
    }

    /// 校验与学位计划匹配
    pub fn ensure_structure(&self, structure: &DegreeCurricularPlan) -> CurriculumResult<()> {
        if structure.id() != self.degree_plan {
            return Err(CurriculumError::WrongDegreePlan {
                expected: self.degree_plan,
                found: structure.id(),
            });
        }
        Ok(())
    }

    pub fn groups(&self) -> impl Iterator<Item = &CurriculumGroup> {
        self.groups.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &CurriculumLine> {
        self.lines.values()
    }

    fn insert_group(&mut self, parent: CurriculumGroupId, kind: CurriculumGroupKind) -> CurriculumGroupId {
        self.next_group += 1;
        let id = CurriculumGroupId(self.next_group);
        self.groups.insert(
            id,
            CurriculumGroup {
                id,
                parent: Some(parent),
                kind,
                child_groups: Vec::new(),
                lines: Vec::new(),
            },
        );
        if let Some(parent_group) = self.groups.get_mut(&parent) {
            parent_group.child_groups.push(id);
        }
        debug!(group = %id, parent = %parent, "新建学生课程组");
        id
    }

    /// 确保结构路径上的课程组均已镜像
    ///
    /// # 参数
    /// - module_path: 从结构根开始的课程组序列
    ///
    /// # 返回
    /// 路径末端的学生课程组
    pub fn ensure_group_path(&mut self, module_path: &[DegreeModuleId]) -> CurriculumResult<CurriculumGroupId> {
        let Some((first, rest)) = module_path.split_first() else {
            return Ok(self.root);
        };
        let root_module = self.groups.get(&self.root).and_then(|g| g.degree_module());
        if root_module != Some(*first) {
            return Err(CurriculumError::UnreachableModule(*first));
        }

        let mut current = self.root;
        for module in rest {
            let existing = self.groups.get(&current).and_then(|group| {
                group.child_groups.iter().copied().find(|child| {
                    self.groups
                        .get(child)
                        .map_or(false, |g| g.kind == CurriculumGroupKind::Structural(*module))
                })
            });
            current = match existing {
                Some(child) => child,
                None => {
                    if let Some(other) = self.group_for_module(*module) {
                        // 同一课程组只镜像一次
                        return Err(CurriculumError::UnreachableModule(
                            other.degree_module().unwrap_or(*module),
                        ));
                    }
                    self.insert_group(current, CurriculumGroupKind::Structural(*module))
                }
            };
        }
        Ok(current)
    }

    /// 确保根下的无结构课程组存在
    pub fn ensure_no_course_group(&mut self, kind: NoCourseGroupType) -> CurriculumGroupId {
        match self.no_course_group(kind) {
            Some(group) => group.id,
            None => self.insert_group(self.root, CurriculumGroupKind::NoCourseGroup(kind)),
        }
    }

    fn ensure_no_active_line(&self, module: DegreeModuleId) -> CurriculumResult<()> {
        if let Some(line) = self.active_line_for(module) {
            return Err(CurriculumError::DuplicateActiveLine {
                module,
                line: line.id,
            });
        }
        Ok(())
    }

    fn insert_line(
        &mut self,
        group: CurriculumGroupId,
        degree_module: Option<DegreeModuleId>,
        execution_interval: ExecutionIntervalId,
        ects_credits: f64,
        kind: CurriculumLineKind,
    ) -> CurriculumResult<CurriculumLineId> {
        if !self.groups.contains_key(&group) {
            return Err(CurriculumError::UnknownGroup(group));
        }
        if let Some(module) = degree_module {
            self.ensure_no_active_line(module)?;
        }
        self.next_line += 1;
        let id = CurriculumLineId(self.next_line);
        self.lines.insert(
            id,
            CurriculumLine {
                id,
                group,
                degree_module,
                execution_interval,
                ects_credits,
                kind,
            },
        );
        if let Some(target) = self.groups.get_mut(&group) {
            target.lines.push(id);
        }
        Ok(id)
    }

    /// 选课: 新增 "已选" 记录
    pub fn enrol(
        &mut self,
        group: CurriculumGroupId,
        module: DegreeModuleId,
        ects_credits: f64,
        interval: ExecutionIntervalId,
    ) -> CurriculumResult<CurriculumLineId> {
        let id = self.insert_line(
            group,
            Some(module),
            interval,
            ects_credits,
            CurriculumLineKind::Enrolment {
                state: EnrolmentState::Enrolled,
            },
        )?;
        info!(student = %self.student, line = %id, module = %module, "选课");
        Ok(id)
    }

    /// 免修 (等效认定对应课程; 学分认定可不对应课程)
    pub fn add_dismissal(
        &mut self,
        group: CurriculumGroupId,
        module: Option<DegreeModuleId>,
        ects_credits: f64,
        interval: ExecutionIntervalId,
        kind: DismissalKind,
    ) -> CurriculumResult<CurriculumLineId> {
        let id = self.insert_line(
            group,
            module,
            interval,
            ects_credits,
            CurriculumLineKind::Dismissal { kind },
        )?;
        info!(student = %self.student, line = %id, ?kind, "新增免修");
        Ok(id)
    }

    /// 评定通过
    pub fn approve(&mut self, line: CurriculumLineId) -> CurriculumResult<()> {
        self.transition(line, EnrolmentState::Approved, &[EnrolmentState::Enrolled])
    }

    /// 评定未通过 (保留为历史记录)
    pub fn flunk(&mut self, line: CurriculumLineId) -> CurriculumResult<()> {
        self.transition(line, EnrolmentState::Flunked, &[EnrolmentState::Enrolled])
    }

    /// 撤销选课
    pub fn annul(&mut self, line: CurriculumLineId) -> CurriculumResult<()> {
        self.transition(
            line,
            EnrolmentState::Annulled,
            &[EnrolmentState::Enrolled, EnrolmentState::Approved],
        )
    }

    fn transition(
        &mut self,
        line_id: CurriculumLineId,
        to: EnrolmentState,
        allowed_from: &[EnrolmentState],
    ) -> CurriculumResult<()> {
        let line = self
            .lines
            .get_mut(&line_id)
            .ok_or(CurriculumError::UnknownLine(line_id))?;
        match &mut line.kind {
            CurriculumLineKind::Enrolment { state } if allowed_from.contains(&*state) => {
                debug!(line = %line_id, from = %state, to = %to, "课程记录状态转换");
                *state = to;
                Ok(())
            }
            CurriculumLineKind::Enrolment { state } => Err(CurriculumError::InvalidStateTransition {
                line: line_id,
                from: *state,
                to,
            }),
            CurriculumLineKind::Dismissal { .. } => Err(CurriculumError::InvalidStateTransition {
                line: line_id,
                from: EnrolmentState::Approved,
                to,
            }),
        }
    }

    /// 移动课程记录到另一课程组 (如移入无结构课程组)
    pub fn move_line(&mut self, line_id: CurriculumLineId, target: CurriculumGroupId) -> CurriculumResult<()> {
        if !self.groups.contains_key(&target) {
            return Err(CurriculumError::UnknownGroup(target));
        }
        let line = self
            .lines
            .get_mut(&line_id)
            .ok_or(CurriculumError::UnknownLine(line_id))?;
        let source = line.group;
        line.group = target;

        if let Some(group) = self.groups.get_mut(&source) {
            group.lines.retain(|id| *id != line_id);
        }
        if let Some(group) = self.groups.get_mut(&target) {
            group.lines.push(line_id);
        }
        info!(line = %line_id, from = %source, to = %target, "移动课程记录");
        Ok(())
    }
}

impl CurriculumReadModel for StudentCurricularPlan {
    fn degree_plan(&self) -> PlanId {
        self.degree_plan
    }

    fn root_group(&self) -> CurriculumGroupId {
        self.root
    }

    fn group(&self, id: CurriculumGroupId) -> Option<&CurriculumGroup> {
        self.groups.get(&id)
    }

    fn line(&self, id: CurriculumLineId) -> Option<&CurriculumLine> {
        self.lines.get(&id)
    }

    fn group_for_module(&self, module: DegreeModuleId) -> Option<&CurriculumGroup> {
        self.groups
            .values()
            .find(|group| group.kind == CurriculumGroupKind::Structural(module))
    }

    fn no_course_group(&self, kind: NoCourseGroupType) -> Option<&CurriculumGroup> {
        self.groups
            .values()
            .find(|group| group.kind == CurriculumGroupKind::NoCourseGroup(kind))
    }

    fn lines_for_module(&self, module: DegreeModuleId) -> Vec<&CurriculumLine> {
        self.lines
            .values()
            .filter(|line| line.degree_module == Some(module))
            .collect()
    }
}
