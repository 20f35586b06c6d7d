// ==========================================
// OEE 监控系统 - 阈值告警引擎
// ==========================================
// 职责: 指标快照 + 阈值 → 告警事件列表
// 规则:
//   - oee < oee_min               → low_oee (按缺口分级)
//   - downtime > downtime_max     → downtime
//   - production < production_min → production
// 红线: 多条件同时满足时全部返回; 不做跨调用去重
// ==========================================

use crate::domain::alert::{
    AlertEvent, AlertThresholds, MetricsSnapshot, SeverityBands, TriggeringMetrics,
};
use crate::domain::types::{AlertKind, AlertSeverity};
use crate::i18n::t_with_args;
use uuid::Uuid;

// ==========================================
// AlertEvaluator - 阈值告警引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    bands: SeverityBands,
}

impl AlertEvaluator {
    pub fn new(bands: SeverityBands) -> Self {
        Self { bands }
    }

    /// 评估告警
    ///
    /// # 参数
    /// - `machine_id`: 机组标识
    /// - `snapshot`: 指标快照
    /// - `thresholds`: 告警阈值 (非法字段回退默认值)
    ///
    /// # 返回
    /// 告警事件列表 (可能为空), 顺序: low_oee → downtime → production
    pub fn evaluate(
        &self,
        machine_id: &str,
        snapshot: &MetricsSnapshot,
        thresholds: &AlertThresholds,
    ) -> Vec<AlertEvent> {
        let thresholds = thresholds.sanitized();
        let mut events = Vec::new();

        // 1. OEE 下限
        let oee = snapshot.metrics.oee;
        if oee < thresholds.oee_min {
            let severity = self.oee_severity(thresholds.oee_min - oee);
            let message = t_with_args(
                "alert.low_oee",
                &[
                    ("machine", machine_id),
                    ("value", format!("{:.2}", oee).as_str()),
                    ("threshold", format!("{:.2}", thresholds.oee_min).as_str()),
                ],
            );
            events.push(self.build_event(
                machine_id,
                AlertKind::LowOee,
                severity,
                message,
                "oee",
                oee,
                thresholds.oee_min,
                snapshot,
            ));
        }

        // 2. 停机上限
        let downtime = snapshot.downtime_minutes;
        if downtime > thresholds.downtime_max {
            let severity = if downtime >= thresholds.downtime_max * 2.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            let message = t_with_args(
                "alert.downtime",
                &[
                    ("machine", machine_id),
                    ("value", format!("{:.1}", downtime).as_str()),
                    ("threshold", format!("{:.1}", thresholds.downtime_max).as_str()),
                ],
            );
            events.push(self.build_event(
                machine_id,
                AlertKind::Downtime,
                severity,
                message,
                "downtime_minutes",
                downtime,
                thresholds.downtime_max,
                snapshot,
            ));
        }

        // 3. 产量下限
        let production = snapshot.production;
        if production < thresholds.production_min {
            let severity = if production < thresholds.production_min / 2.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            let message = t_with_args(
                "alert.production",
                &[
                    ("machine", machine_id),
                    ("value", format!("{:.0}", production).as_str()),
                    ("threshold", format!("{:.0}", thresholds.production_min).as_str()),
                ],
            );
            events.push(self.build_event(
                machine_id,
                AlertKind::Production,
                severity,
                message,
                "production",
                production,
                thresholds.production_min,
                snapshot,
            ));
        }

        if !events.is_empty() {
            tracing::debug!("机组 {} 触发 {} 条告警", machine_id, events.len());
        }

        events
    }

    /// OEE 缺口分级
    ///
    /// - 未启用分级: HIGH
    /// - gap < high_gap: MEDIUM
    /// - high_gap <= gap < critical_gap: HIGH
    /// - gap >= critical_gap: CRITICAL
    pub fn oee_severity(&self, gap: f64) -> AlertSeverity {
        if !self.bands.enabled {
            return AlertSeverity::High;
        }
        if gap >= self.bands.critical_gap {
            AlertSeverity::Critical
        } else if gap >= self.bands.high_gap {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_event(
        &self,
        machine_id: &str,
        kind: AlertKind,
        severity: AlertSeverity,
        message: String,
        metric: &str,
        value: f64,
        threshold: f64,
        snapshot: &MetricsSnapshot,
    ) -> AlertEvent {
        AlertEvent {
            event_id: Uuid::new_v4().to_string(),
            machine_id: machine_id.to_string(),
            kind,
            severity,
            message,
            triggering_metrics: TriggeringMetrics {
                metric: metric.to_string(),
                value,
                threshold,
                metrics: snapshot.metrics,
            },
            timestamp: snapshot.observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::OeeMetrics;
    use chrono::NaiveDate;

    fn snapshot(oee: f64, downtime: f64, production: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            metrics: OeeMetrics {
                availability: 90.0,
                performance: 90.0,
                quality: 90.0,
                oee,
            },
            downtime_minutes: downtime,
            production,
            observed_at: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn kinds(events: &[AlertEvent]) -> Vec<AlertKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_healthy_snapshot_emits_nothing() {
        let evaluator = AlertEvaluator::default();
        let events = evaluator.evaluate("M01", &snapshot(80.0, 10.0, 200.0), &AlertThresholds::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_oee_equal_to_threshold_does_not_trigger() {
        let evaluator = AlertEvaluator::default();
        let events = evaluator.evaluate("M01", &snapshot(65.0, 30.0, 85.0), &AlertThresholds::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_all_conditions_reported_together() {
        let evaluator = AlertEvaluator::default();
        let events = evaluator.evaluate("M01", &snapshot(10.0, 45.0, 50.0), &AlertThresholds::default());
        assert_eq!(
            kinds(&events),
            vec![AlertKind::LowOee, AlertKind::Downtime, AlertKind::Production]
        );
        assert!(events.iter().all(|e| e.machine_id == "M01"));
        assert_eq!(events[0].triggering_metrics.threshold, 65.0);
        assert_eq!(events[1].triggering_metrics.value, 45.0);
    }

    #[test]
    fn test_oee_severity_banding() {
        let evaluator = AlertEvaluator::default();
        let t = AlertThresholds::default();
        let sev = |oee: f64| evaluator.evaluate("M01", &snapshot(oee, 0.0, 100.0), &t)[0].severity;
        assert_eq!(sev(60.0), AlertSeverity::Medium);
        assert_eq!(sev(55.0), AlertSeverity::High);
        assert_eq!(sev(45.0), AlertSeverity::Critical);
    }

    #[test]
    fn test_binary_mode() {
        let evaluator = AlertEvaluator::new(SeverityBands {
            enabled: false,
            ..SeverityBands::default()
        });
        let events = evaluator.evaluate("M01", &snapshot(1.0, 0.0, 100.0), &AlertThresholds::default());
        assert_eq!(events[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_downtime_and_production_severity() {
        let evaluator = AlertEvaluator::default();
        let t = AlertThresholds::default();
        let events = evaluator.evaluate("M01", &snapshot(80.0, 31.0, 80.0), &t);
        assert_eq!(events[0].severity, AlertSeverity::Medium);
        assert_eq!(events[1].severity, AlertSeverity::Medium);

        let events = evaluator.evaluate("M01", &snapshot(80.0, 60.0, 40.0), &t);
        assert_eq!(events[0].severity, AlertSeverity::High);
        assert_eq!(events[1].severity, AlertSeverity::High);
    }

    #[test]
    fn test_invalid_thresholds_fall_back_to_defaults() {
        let evaluator = AlertEvaluator::default();
        let t = AlertThresholds {
            oee_min: f64::NAN,
            downtime_max: -5.0,
            production_min: 0.0,
        };
        let events = evaluator.evaluate("M01", &snapshot(64.0, 31.0, 0.0), &t);
        assert_eq!(kinds(&events), vec![AlertKind::LowOee, AlertKind::Downtime]);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let evaluator = AlertEvaluator::default();
        let t = AlertThresholds::default();
        let s = snapshot(10.0, 45.0, 50.0);
        let first = evaluator.evaluate("M01", &s, &t);
        let second = evaluator.evaluate("M01", &s, &t);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.timestamp, b.timestamp);
        }
    }
}
