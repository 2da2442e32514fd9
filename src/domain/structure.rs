// ==========================================
// 学籍课程规则引擎 - 学位课程计划结构
// ==========================================
// 职责: 学位模块树 (arena) + 带有效期的上下文 + 课程规则集
// 红线: 编写期结构错误立即报出 (名称重复/窗口越界/跨计划引用)
// 红线: 规则阈值不做缓存, 修改后下一次评估立即可见
// ==========================================
// 子模块:
// - core: 计划实体与基础访问
// - authoring: 模块/上下文的创建与删除
// - queries: 有效子上下文、深度遍历、路径、学分函数
// - rule_set: 规则创建、按执行期解析、阈值修改
// ==========================================

mod authoring;
mod core;
mod queries;
mod rule_set;

#[cfg(test)]
mod tests;

pub use core::DegreeCurricularPlan;
pub use queries::StructurePath;
