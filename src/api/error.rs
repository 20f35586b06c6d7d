// ==========================================
// OEE 监控系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository/Engine 错误为用户可读的错误消息
// 约束: 校验失败必须带字段级原因
// ==========================================

use crate::domain::production::FieldViolation;
use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与权限
    // ==========================================
    /// 生产数据校验失败（字段级原因）
    #[error("生产数据校验失败: {reason}")]
    ProductionValidationError {
        reason: String,
        violations: Vec<FieldViolation>,
    },

    #[error("无权限: actor={actor_id}, permission={permission}")]
    PermissionDenied { actor_id: String, permission: String },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 配置 / 导入
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 由字段违规列表构造校验错误
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        let reason = violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.reason))
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::ProductionValidationError { reason, violations }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation { violations } => ApiError::validation(violations),
            EngineError::UndefinedShift { minute_of_day } => {
                ApiError::ConfigurationError(format!("班次表未覆盖 minute_of_day={}", minute_of_day))
            }
            EngineError::Configuration(msg) => ApiError::ConfigurationError(msg),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
