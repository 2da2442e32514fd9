// ==========================================
// 学籍课程规则引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 学位作用域的配置覆盖全局配置
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{init_config_schema, open_sqlite_connection};
use crate::domain::enrolment_model::{EnrolmentModelConfig, EnrolmentModelConfigEntry};
use crate::domain::types::{CurricularRuleLevel, EnrolmentModel};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                          // 全局
    Degree { degree_code: String },  // 学位
}

impl ConfigScope {
    pub fn degree(code: &str) -> Self {
        ConfigScope::Degree {
            degree_code: code.trim().to_string(),
        }
    }

    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Degree { degree_code } => format!("degree/{}", degree_code),
        }
    }

    fn scope_type(&self) -> &'static str {
        match self {
            ConfigScope::Global => "GLOBAL",
            ConfigScope::Degree { .. } => "DEGREE",
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (不存在的配置表会被创建)
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = lock(&conn)?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            init_config_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取指定作用域的配置值（不回退）
    pub fn get_config_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<Option<String>> {
        let conn = lock(&self.conn)?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取配置值: 学位作用域优先, 否则回退到全局
    pub fn get_effective_value(&self, degree_code: &str, key: &str) -> ConfigResult<Option<String>> {
        if let Some(value) = self.get_config_value(&ConfigScope::degree(degree_code), key)? {
            debug!(degree = %degree_code, key, "使用学位作用域配置");
            return Ok(Some(value));
        }
        self.get_config_value(&ConfigScope::Global, key)
    }

    /// 写入配置值 (UPSERT)
    pub fn set_config_value(&self, scope: &ConfigScope, key: &str, value: &str) -> ConfigResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO config_scope (scope_id, scope_type) VALUES (?1, ?2)",
            params![scope.scope_id(), scope.scope_type()],
        )?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取全局配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(&ConfigScope::Global, key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有全局配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 批量评估前记录配置快照, 便于复现判定结果
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = lock(&self.conn)?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复全局配置
    ///
    /// # 返回
    /// - 恢复的配置项数量
    ///
    /// # 注意
    /// - 以 `__meta_` 开头的键为快照元信息, 不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }
        tx.commit()?;

        Ok(count)
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> ConfigResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| ConfigError::Lock(e.to_string()))
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
impl EngineConfigReader for ConfigManager {
    fn get_enrolment_model(&self, degree_code: &str) -> ConfigResult<EnrolmentModel> {
        let Some(value) = self.get_effective_value(degree_code, config_keys::ENROLMENT_MODEL)? else {
            return Ok(EnrolmentModel::default());
        };
        EnrolmentModel::parse_code(&value).ok_or_else(|| ConfigError::InvalidValue {
            key: config_keys::ENROLMENT_MODEL.to_string(),
            value,
        })
    }

    fn get_enrolment_model_config(&self, degree_code: &str) -> ConfigResult<Option<EnrolmentModelConfig>> {
        let Some(value) = self.get_effective_value(degree_code, config_keys::ENROLMENT_MODEL_CONFIG)?
        else {
            return Ok(None);
        };
        let groups: Vec<Vec<u8>> = serde_json::from_str(&value)?;
        let config = EnrolmentModelConfig {
            entries: groups.into_iter().map(EnrolmentModelConfigEntry::new).collect(),
        };
        config.validate()?;
        Ok(Some(config))
    }

    fn get_default_rule_level(&self) -> ConfigResult<CurricularRuleLevel> {
        let value = self.get_config_or_default(config_keys::DEFAULT_RULE_LEVEL, "ENROLMENT_WITH_RULES")?;
        Ok(CurricularRuleLevel::parse_code(&value).unwrap_or_else(|| {
            warn!(
                config_key = config_keys::DEFAULT_RULE_LEVEL,
                raw_value = %value,
                "规则执行级别配置无效，使用默认值"
            );
            CurricularRuleLevel::default()
        }))
    }

    fn get_locale(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::LOCALE, "zh-CN")?;
        match value.trim() {
            "zh-CN" | "en" => Ok(value.trim().to_string()),
            _ => Err(ConfigError::InvalidValue {
                key: config_keys::LOCALE.to_string(),
                value,
            }),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 选课校验粒度 (YEAR / SEMESTER), 可按学位覆盖
    pub const ENROLMENT_MODEL: &str = "enrolment_model";
    // 显式校验分组 (JSON), 可按学位覆盖
    pub const ENROLMENT_MODEL_CONFIG: &str = "enrolment_model_config";

    // 默认规则执行级别
    pub const DEFAULT_RULE_LEVEL: &str = "default_curricular_rule_level";

    // 消息语言
    pub const LOCALE: &str = "locale";
}
