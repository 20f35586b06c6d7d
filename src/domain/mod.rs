// ==========================================
// OEE 监控系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、协作接口
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod actor;
pub mod alert;
pub mod history;
pub mod production;
pub mod shift;
pub mod types;

// 重导出核心类型
pub use actor::{Actor, AllowAllPermissions, Permission, PermissionChecker};
pub use alert::{AlertEvent, AlertThresholds, MetricsSnapshot, SeverityBands, TriggeringMetrics};
pub use history::{HistoryEntry, HistoryStatistics, PeriodSummary, ShiftSummary};
pub use production::{
    FieldViolation, OeeMetrics, ProductionInterval, ProductionRecord, ProductionSubmission,
};
pub use shift::{ShiftTable, ShiftWindow, MINUTES_PER_DAY};
pub use types::{AlertKind, AlertSeverity, ShiftName, SummaryPeriod, ZeroPlannedTimePolicy};
