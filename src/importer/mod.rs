// ==========================================
// OEE 监控系统 - 导入层
// ==========================================
// 职责: 外部生产数据 (CSV) → ProductionSubmission
// ==========================================

pub mod error;
pub mod production_csv;

pub use error::{ImportError, ImportResult};
pub use production_csv::{parse_timestamp, CsvRow, ProductionCsvParser};
