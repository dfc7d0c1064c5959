// ==========================================
// 物流枢纽流转系统 - 引擎层错误类型
// ==========================================

use thiserror::Error;

use crate::repository::error::RepositoryError;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("关联记录缺失: {entity} id={id}")]
    MissingRelation { entity: &'static str, id: String },

    #[error("无效的状态转换: {entity} {from} → {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error("级联深度超限: depth={depth}, transition={transition}")]
    CascadeDepthExceeded { depth: usize, transition: String },
}

impl EngineError {
    pub fn missing(entity: &'static str, id: &str) -> Self {
        EngineError::MissingRelation {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
