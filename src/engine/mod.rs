// ==========================================
// OEE 监控系统 - 引擎层
// ==========================================
// 职责: 班次判定 / OEE 计算 / 历史汇总 / 阈值告警
// 红线: Engine 不拼 SQL, 持久化只经由 trait
// ==========================================

pub mod alert_evaluator;
pub mod error;
pub mod events;
pub mod history_aggregator;
pub mod history_recorder;
pub mod oee_calculator;
pub mod repositories;
pub mod shift_resolver;

// 重导出核心引擎
pub use alert_evaluator::AlertEvaluator;
pub use error::{EngineError, EngineResult};
pub use events::{
    AlertEventPublisher, CollectingAlertPublisher, FanoutAlertPublisher, NoOpAlertPublisher,
};
pub use history_aggregator::{period_key, period_start, HistoryAggregator};
pub use history_recorder::{HistoryRecordOutcome, HistoryRecorder, HistoryWriteError};
pub use oee_calculator::{OeeCalculator, OeeParameters};
pub use repositories::{HistoryStore, MaterialRateLookup};
pub use shift_resolver::ShiftResolver;
