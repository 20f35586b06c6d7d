// ==========================================
// OEE 监控系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::production::FieldViolation;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 输入校验 =====
    #[error("输入校验失败: {}", format_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    // ===== 班次判定 =====
    #[error("无法判定班次: minute_of_day={minute_of_day}")]
    UndefinedShift { minute_of_day: u32 },

    // ===== 配置 =====
    #[error("配置错误: {0}")]
    Configuration(String),
}

impl EngineError {
    /// 单字段校验错误
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            violations: vec![FieldViolation::new(field, reason)],
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
