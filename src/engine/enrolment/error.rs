use crate::domain::error::{CurriculumError, DomainError};
use crate::domain::types::{CurriculumLineId, DegreeModuleId, ExecutionIntervalId};
use crate::engine::result::RuleResultMessage;
use thiserror::Error;

/// 选课流水线错误
#[derive(Error, Debug)]
pub enum EnrolmentError {
    /// 规则判定 FAIL: 整批拒绝, 携带首个失败规则的消息键
    #[error("选课被拒绝: module={module}, key={key}")]
    Rejected {
        module: DegreeModuleId,
        key: String,
        messages: Vec<RuleResultMessage>,
    },

    #[error("执行学期不存在: {0}")]
    UnknownExecutionInterval(ExecutionIntervalId),

    #[error("只能撤销已选未评定的课程记录: {0}")]
    InvalidRemoval(CurriculumLineId),

    #[error(transparent)]
    Curriculum(#[from] CurriculumError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl EnrolmentError {
    /// 拒绝原因消息键 (非拒绝错误返回 None)
    pub fn rejection_key(&self) -> Option<&str> {
        match self {
            EnrolmentError::Rejected { key, .. } => Some(key),
            _ => None,
        }
    }
}
