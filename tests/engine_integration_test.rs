// ==========================================
// 引擎层集成测试
// ==========================================
// 测试目标: 计算 → 班次 → 快照 → 汇总 → 告警 (纯内存, 不经数据库)
// ==========================================

mod test_helpers;

use oee_monitor::domain::alert::{AlertThresholds, MetricsSnapshot, SeverityBands};
use oee_monitor::domain::types::{AlertKind, AlertSeverity, ShiftName, SummaryPeriod};
use oee_monitor::domain::ZeroPlannedTimePolicy;
use oee_monitor::engine::{
    AlertEvaluator, HistoryAggregator, OeeCalculator, OeeParameters, ShiftResolver,
};
use test_helpers::{approx, healthy_interval, reference_interval, ts};

#[test]
fn test_reference_scenario_end_to_end() {
    let calculator = OeeCalculator::default();
    let resolver = ShiftResolver::default();
    let aggregator = HistoryAggregator::new();
    let evaluator = AlertEvaluator::default();

    let interval = reference_interval("L1", ts(2024, 3, 1, 6, 0));
    let metrics = calculator.compute(&interval).unwrap();
    assert!(approx(metrics.availability, 87.5, 1e-9));
    assert!(approx(metrics.performance, 400.0 / 23205.0 * 100.0, 1e-9));
    assert!(approx(metrics.quality, 400.0 / 430.0 * 100.0, 1e-9));
    assert!(approx(metrics.oee, 1.4031, 1e-3));
    assert!(metrics.is_within_bounds());

    let shift = resolver
        .resolve_interval(interval.start_time, interval.end_time)
        .unwrap();
    assert_eq!(shift, ShiftName::Morning);

    let entry = aggregator.build_entry("R1", Some(shift), &interval, metrics, ts(2024, 3, 1, 14, 5));
    assert_eq!(entry.timestamp, interval.start_time);
    assert!(approx(entry.total_waste, 30.0, 1e-9));

    let summaries = aggregator.summarize(&[entry], SummaryPeriod::Day);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].period_key, "2024-03-01");

    let snapshot = MetricsSnapshot::from_interval(&interval, metrics);
    let alerts = evaluator.evaluate("L1", &snapshot, &AlertThresholds::default());
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].kind, AlertKind::LowOee);
    assert_eq!(alerts[0].triggering_metrics.metric, "oee");
    assert_eq!(alerts[1].kind, AlertKind::Downtime);
    assert_eq!(alerts[1].severity, AlertSeverity::High);
    assert_eq!(alerts[0].timestamp, ts(2024, 3, 1, 14, 0));
}

#[test]
fn test_night_interval_across_midnight() {
    let resolver = ShiftResolver::default();
    let mut interval = healthy_interval("L2", ts(2024, 3, 1, 22, 0));
    interval.end_time = Some(ts(2024, 3, 2, 6, 0));

    let shift = resolver
        .resolve_interval(interval.start_time, interval.end_time)
        .unwrap();
    assert_eq!(shift, ShiftName::Night);

    let overlaps = resolver.overlap_seconds(ts(2024, 3, 1, 22, 0), ts(2024, 3, 2, 6, 0));
    let total: i64 = overlaps.iter().map(|(_, s)| *s).sum();
    assert_eq!(total, 8 * 3600);
}

#[test]
fn test_zero_planned_time_policies() {
    let mut interval = healthy_interval("L1", ts(2024, 3, 1, 8, 0));
    interval.planned_time = 0.0;
    interval.downtime_minutes = 0.0;

    let all_zero = OeeCalculator::default().compute(&interval).unwrap();
    assert_eq!(all_zero.oee, 0.0);
    assert_eq!(all_zero.quality, 0.0);

    let full_quality = OeeCalculator::new(OeeParameters {
        zero_planned_policy: ZeroPlannedTimePolicy::FullQuality,
        ..OeeParameters::default()
    })
    .compute(&interval)
    .unwrap();
    assert_eq!(full_quality.quality, 100.0);
    assert_eq!(full_quality.oee, 0.0);
}

#[test]
fn test_binary_severity_when_banding_disabled() {
    let calculator = OeeCalculator::default();
    let interval = reference_interval("L1", ts(2024, 3, 1, 6, 0));
    let metrics = calculator.compute(&interval).unwrap();

    let evaluator = AlertEvaluator::new(SeverityBands {
        enabled: false,
        ..SeverityBands::default()
    });
    let alerts = evaluator.evaluate(
        "L1",
        &MetricsSnapshot::from_interval(&interval, metrics),
        &AlertThresholds::default(),
    );
    assert_eq!(alerts[0].kind, AlertKind::LowOee);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
}

#[test]
fn test_statistics_over_mixed_entries() {
    let calculator = OeeCalculator::default();
    let aggregator = HistoryAggregator::new();

    let entries: Vec<_> = [
        healthy_interval("L1", ts(2024, 3, 1, 8, 0)),
        reference_interval("L1", ts(2024, 3, 2, 6, 0)),
    ]
    .iter()
    .enumerate()
    .map(|(i, interval)| {
        let metrics = calculator.compute(interval).unwrap();
        aggregator.build_entry(
            &format!("R{}", i),
            Some(ShiftName::Morning),
            interval,
            metrics,
            ts(2024, 3, 3, 0, 0),
        )
    })
    .collect();

    let stats = aggregator.statistics(&entries);
    assert_eq!(stats.entry_count, 2);
    assert!(approx(stats.max_oee, 100.0, 1e-9));
    assert!(approx(stats.avg_oee, (100.0 + stats.min_oee) / 2.0, 1e-9));
    assert_eq!(stats.latest.unwrap().record_id, "R1");
}
