// ==========================================
// 学籍课程规则引擎 - 学生课程记录 (结构镜像)
// ==========================================
// 职责: 学生课程组 / 课程记录行, 镜像学位结构并记录选课、通过、免修
// 红线: 每个学位模块至多一条有效 (非撤销、非未通过) 记录
// 红线: 无结构课程组 (单科/课外) 中的记录不计入结构课程组
// ==========================================

mod model;
mod read_model;
mod student_plan;


pub use model::{CurriculumGroup, CurriculumGroupKind, CurriculumLine, CurriculumLineKind};
pub use read_model::CurriculumReadModel;
pub use student_plan::StudentCurricularPlan;
