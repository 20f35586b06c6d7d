// ==========================================
// OEE 监控系统 - 告警领域模型
// ==========================================
// AlertThresholds: 部署级阈值配置
// SeverityBands: OEE 缺口分级
// AlertEvent: 告警事件 (核心不持久化, 交由外部 sink)
// ==========================================

use crate::domain::production::{OeeMetrics, ProductionInterval};
use crate::domain::types::{AlertKind, AlertSeverity};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// AlertThresholds - 告警阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub oee_min: f64,        // OEE 下限 (%)
    pub downtime_max: f64,   // 停机上限 (分钟)
    pub production_min: f64, // 产量下限 (件)
}

impl AlertThresholds {
    pub const DEFAULT_OEE_MIN: f64 = 65.0;
    pub const DEFAULT_DOWNTIME_MAX: f64 = 30.0;
    pub const DEFAULT_PRODUCTION_MIN: f64 = 85.0;

    /// 非法字段（负数/非有限值）逐项回退默认值
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let pick = |value: f64, default: f64, key: &str| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                tracing::warn!("告警阈值 {} 非法 ({}), 回退默认值 {}", key, value, default);
                default
            }
        };

        Self {
            oee_min: pick(self.oee_min, defaults.oee_min, "oee_min"),
            downtime_max: pick(self.downtime_max, defaults.downtime_max, "downtime_max"),
            production_min: pick(self.production_min, defaults.production_min, "production_min"),
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            oee_min: Self::DEFAULT_OEE_MIN,
            downtime_max: Self::DEFAULT_DOWNTIME_MAX,
            production_min: Self::DEFAULT_PRODUCTION_MIN,
        }
    }
}

// ==========================================
// SeverityBands - 告警分级配置
// ==========================================
// enabled = false 时为二元模式: 低于阈值即 HIGH
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityBands {
    pub enabled: bool,
    pub high_gap: f64,     // 缺口 >= high_gap 升级为 HIGH
    pub critical_gap: f64, // 缺口 >= critical_gap 升级为 CRITICAL
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            enabled: true,
            high_gap: 10.0,
            critical_gap: 20.0,
        }
    }
}

// ==========================================
// MetricsSnapshot - 告警评估输入
// ==========================================
// 单条记录或时间窗汇总均可构造
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub metrics: OeeMetrics,
    pub downtime_minutes: f64, // 评估窗口内累计停机
    pub production: f64,       // 评估窗口内合格品产量
    pub observed_at: NaiveDateTime,
}

impl MetricsSnapshot {
    /// 由单个生产区间构造
    pub fn from_interval(interval: &ProductionInterval, metrics: OeeMetrics) -> Self {
        Self {
            metrics,
            downtime_minutes: interval.downtime_minutes,
            production: interval.good_production,
            observed_at: interval.end_time.unwrap_or(interval.start_time),
        }
    }
}

// ==========================================
// TriggeringMetrics - 触发告警的指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeringMetrics {
    pub metric: String,  // 指标名: oee / downtime_minutes / production
    pub value: f64,      // 实际值
    pub threshold: f64,  // 阈值
    pub metrics: OeeMetrics,
}

// ==========================================
// AlertEvent - 告警事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub event_id: String,
    pub machine_id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub triggering_metrics: TriggeringMetrics,
    pub timestamp: NaiveDateTime,
}
