use crate::domain::error::DomainError;
use thiserror::Error;

/// 配置层错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("锁获取失败: {0}")]
    Lock(String),

    #[error("配置值无效: key={key}, value={value}")]
    InvalidValue { key: String, value: String },

    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
