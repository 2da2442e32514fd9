// ==========================================
// 学籍课程规则引擎 - 配置层
// ==========================================
// 职责: 学位选课配置管理,支持学位作用域覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use engine_config_trait::{apply_enrolment_model, apply_locale, EngineConfigReader};
pub use error::{ConfigError, ConfigResult};
