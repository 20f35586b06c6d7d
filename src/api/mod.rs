// ==========================================
// OEE 监控系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行/外部宿主调用
// ==========================================

pub mod config_api;
pub mod dashboard_api;
pub mod error;
pub mod production_api;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use dashboard_api::{DashboardApi, PruneReport, WindowEvaluation};
pub use error::{ApiError, ApiResult};
pub use production_api::{ImportReport, ImportRowOutcome, ProductionApi, ProductionResponse};
