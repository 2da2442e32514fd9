// ==========================================
// 学籍课程规则引擎 - 选课流水线
// ==========================================
// 流程: 校验执行期 → 校验撤销 → 去重 → 定位结构路径
//       → 结构预检 → 规则评估 → 整批提交或整批拒绝
// 红线: 任一 FAIL 即拒绝整批, 不落任何修改
// ==========================================

mod context;
mod error;
mod pipeline;


pub use context::{DegreeModuleToEnrol, EnrolmentContext, EnrolmentResult, ModuleEnrolmentOutcome};
pub use error::EnrolmentError;
pub use pipeline::EnrolmentPipeline;
