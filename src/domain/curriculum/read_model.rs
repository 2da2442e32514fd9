use super::model::{CurriculumGroup, CurriculumLine};
use crate::domain::types::{
    CurriculumGroupId, CurriculumLineId, DegreeModuleId, NoCourseGroupType, PlanId,
};

// ==========================================
// Trait: CurriculumReadModel
// ==========================================
// 用途: 规则评估读取学生课程记录 (只读, 调用方预先加载)
// 实现者: StudentCurricularPlan
pub trait CurriculumReadModel {
    /// 所属学位课程计划
    fn degree_plan(&self) -> PlanId;

    fn root_group(&self) -> CurriculumGroupId;

    fn group(&self, id: CurriculumGroupId) -> Option<&CurriculumGroup>;

    fn line(&self, id: CurriculumLineId) -> Option<&CurriculumLine>;

    /// 结构课程组对应的学生课程组
    fn group_for_module(&self, module: DegreeModuleId) -> Option<&CurriculumGroup>;

    /// 无结构课程组
    fn no_course_group(&self, kind: NoCourseGroupType) -> Option<&CurriculumGroup>;

    /// 引用该学位模块的全部课程记录 (含历史)
    fn lines_for_module(&self, module: DegreeModuleId) -> Vec<&CurriculumLine>;

    fn child_groups(&self, id: CurriculumGroupId) -> Vec<&CurriculumGroup> {
        self.group(id)
            .map(|group| {
                group
                    .child_groups
                    .iter()
                    .filter_map(|child| self.group(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lines_of(&self, id: CurriculumGroupId) -> Vec<&CurriculumLine> {
        self.group(id)
            .map(|group| group.lines.iter().filter_map(|line| self.line(*line)).collect())
            .unwrap_or_default()
    }

    /// 子树中的课程记录 (跳过无结构课程组)
    fn subtree_lines(&self, id: CurriculumGroupId) -> Vec<&CurriculumLine> {
        let mut lines = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(group) = self.group(current) else {
                continue;
            };
            lines.extend(group.lines.iter().filter_map(|line| self.line(*line)));
            stack.extend(
                group
                    .child_groups
                    .iter()
                    .filter(|child| {
                        self.group(**child)
                            .map_or(false, |child| !child.is_no_course_group())
                    })
                    .copied(),
            );
        }
        lines
    }

    /// 学位模块是否已通过 (任一课程组中, 含免修)
    fn is_approved(&self, module: DegreeModuleId) -> bool {
        self.lines_for_module(module).iter().any(|line| line.is_approved())
    }

    /// 学位模块当前是否已选未评定
    fn is_enrolled(&self, module: DegreeModuleId) -> bool {
        self.lines_for_module(module).iter().any(|line| line.is_enrolled())
    }

    /// 学位模块的有效记录
    fn active_line_for(&self, module: DegreeModuleId) -> Option<&CurriculumLine> {
        self.lines_for_module(module)
            .into_iter()
            .find(|line| line.is_active())
    }
}
