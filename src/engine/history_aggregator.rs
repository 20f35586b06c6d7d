// ==========================================
// OEE 监控系统 - 历史汇总引擎
// ==========================================
// 职责: OEE 快照构造 + 按日/周/月/班次汇总 + 运行统计
// 红线: 纯函数, 相同输入得到相同输出
// ==========================================
// 周期键 (按业务时间的日期部分, 统一按 UTC 日期截断):
//   DAY   → YYYY-MM-DD
//   WEEK  → 周日起始日期 YYYY-MM-DD
//   MONTH → YYYY-MM
// ==========================================

use crate::domain::history::{HistoryEntry, HistoryStatistics, PeriodSummary, ShiftSummary};
use crate::domain::production::{OeeMetrics, ProductionInterval};
use crate::domain::types::{ShiftName, SummaryPeriod};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// HistoryAggregator - 历史汇总引擎
// ==========================================
pub struct HistoryAggregator {
    organic_waste_factor: f64, // 有机废料换算系数, 与质量率口径一致
}

impl Default for HistoryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryAggregator {
    pub fn new() -> Self {
        Self {
            organic_waste_factor: 1.0,
        }
    }

    pub fn with_organic_waste_factor(organic_waste_factor: f64) -> Self {
        Self {
            organic_waste_factor,
        }
    }

    // ==========================================
    // 快照构造
    // ==========================================

    /// 由生产区间与计算结果构造历史快照
    ///
    /// # 参数
    /// - `record_id`: 来源生产记录ID
    /// - `shift`: 归属班次
    /// - `interval`: 生产区间
    /// - `metrics`: 计算结果
    /// - `recorded_at`: 写入时间
    pub fn build_entry(
        &self,
        record_id: &str,
        shift: Option<ShiftName>,
        interval: &ProductionInterval,
        metrics: OeeMetrics,
        recorded_at: NaiveDateTime,
    ) -> HistoryEntry {
        HistoryEntry {
            entry_id: Uuid::new_v4().to_string(),
            machine_id: interval.machine_id.clone(),
            record_id: record_id.to_string(),
            shift,
            timestamp: interval.start_time,
            metrics,
            good_production: interval.good_production,
            total_waste: interval.total_waste(self.organic_waste_factor),
            downtime_minutes: interval.downtime_minutes,
            planned_time: interval.planned_time,
            recorded_at,
        }
    }

    // ==========================================
    // 周期汇总
    // ==========================================

    /// 按周期汇总, 结果按周期键升序
    pub fn summarize(&self, entries: &[HistoryEntry], period: SummaryPeriod) -> Vec<PeriodSummary> {
        let mut groups: BTreeMap<String, (NaiveDate, Accumulator)> = BTreeMap::new();

        for entry in entries {
            let start = period_start(entry.timestamp.date(), period);
            let key = period_key(start, period);
            groups
                .entry(key)
                .or_insert_with(|| (start, Accumulator::default()))
                .1
                .push(entry);
        }

        groups
            .into_iter()
            .map(|(period_key, (period_start, acc))| PeriodSummary {
                period,
                period_key,
                period_start,
                entry_count: acc.count,
                avg_oee: acc.mean(acc.oee),
                avg_availability: acc.mean(acc.availability),
                avg_performance: acc.mean(acc.performance),
                avg_quality: acc.mean(acc.quality),
                total_good_production: acc.good_production,
                total_waste: acc.waste,
                total_downtime_minutes: acc.downtime,
                total_planned_time: acc.planned,
            })
            .collect()
    }

    /// 按班次汇总（无班次的快照不计入）
    pub fn summarize_by_shift(&self, entries: &[HistoryEntry]) -> Vec<ShiftSummary> {
        let mut groups: BTreeMap<ShiftName, Accumulator> = BTreeMap::new();
        for entry in entries {
            if let Some(shift) = entry.shift {
                groups.entry(shift).or_default().push(entry);
            }
        }

        groups
            .into_iter()
            .map(|(shift, acc)| ShiftSummary {
                shift,
                entry_count: acc.count,
                avg_oee: acc.mean(acc.oee),
                total_good_production: acc.good_production,
                total_downtime_minutes: acc.downtime,
            })
            .collect()
    }

    // ==========================================
    // 运行统计
    // ==========================================

    /// 整体统计: 均值 / 合计 / 极值 / 最新快照
    pub fn statistics(&self, entries: &[HistoryEntry]) -> HistoryStatistics {
        let mut acc = Accumulator::default();
        let mut min_oee = f64::INFINITY;
        let mut max_oee = f64::NEG_INFINITY;
        let mut latest: Option<&HistoryEntry> = None;

        for entry in entries {
            acc.push(entry);
            min_oee = min_oee.min(entry.metrics.oee);
            max_oee = max_oee.max(entry.metrics.oee);
            latest = match latest {
                Some(current) if current.timestamp >= entry.timestamp => Some(current),
                _ => Some(entry),
            };
        }

        if acc.count == 0 {
            min_oee = 0.0;
            max_oee = 0.0;
        }

        HistoryStatistics {
            entry_count: acc.count,
            avg_oee: acc.mean(acc.oee),
            avg_availability: acc.mean(acc.availability),
            avg_performance: acc.mean(acc.performance),
            avg_quality: acc.mean(acc.quality),
            min_oee,
            max_oee,
            total_good_production: acc.good_production,
            total_waste: acc.waste,
            total_downtime_minutes: acc.downtime,
            latest: latest.cloned(),
        }
    }

    /// 保留期截止时间: 早于该时间的快照可清理
    ///
    /// 保留期超出可表示范围时取最早时间 (不清理任何快照)
    pub fn retention_cutoff(&self, now: NaiveDateTime, retention_days: u32) -> NaiveDateTime {
        Duration::try_days(retention_days as i64)
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(NaiveDateTime::MIN)
    }
}

// ==========================================
// 周期键
// ==========================================

/// 周期起始日期
pub fn period_start(date: NaiveDate, period: SummaryPeriod) -> NaiveDate {
    match period {
        SummaryPeriod::Day => date,
        SummaryPeriod::Week => {
            date - Duration::days(date.weekday().num_days_from_sunday() as i64)
        }
        SummaryPeriod::Month => date.with_day(1).unwrap_or(date),
    }
}

/// 周期键字符串（字典序即时间序）
pub fn period_key(start: NaiveDate, period: SummaryPeriod) -> String {
    match period {
        SummaryPeriod::Day | SummaryPeriod::Week => start.format("%Y-%m-%d").to_string(),
        SummaryPeriod::Month => start.format("%Y-%m").to_string(),
    }
}

// ==========================================
// Accumulator - 分组累加器
// ==========================================
#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    oee: f64,
    availability: f64,
    performance: f64,
    quality: f64,
    good_production: f64,
    waste: f64,
    downtime: f64,
    planned: f64,
}

impl Accumulator {
    fn push(&mut self, entry: &HistoryEntry) {
        self.count += 1;
        self.oee += entry.metrics.oee;
        self.availability += entry.metrics.availability;
        self.performance += entry.metrics.performance;
        self.quality += entry.metrics.quality;
        self.good_production += entry.good_production;
        self.waste += entry.total_waste;
        self.downtime += entry.downtime_minutes;
        self.planned += entry.planned_time;
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            sum / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(y: i32, m: u32, d: u32, h: u32, oee: f64, shift: Option<ShiftName>) -> HistoryEntry {
        let ts = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap();
        HistoryEntry {
            entry_id: format!("E-{}-{}-{}-{}", y, m, d, h),
            machine_id: "M01".to_string(),
            record_id: "R".to_string(),
            shift,
            timestamp: ts,
            metrics: OeeMetrics {
                availability: 90.0,
                performance: 80.0,
                quality: 95.0,
                oee,
            },
            good_production: 100.0,
            total_waste: 5.0,
            downtime_minutes: 10.0,
            planned_time: 480.0,
            recorded_at: ts,
        }
    }

    #[test]
    fn test_build_entry_normalises_organic_waste() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let interval = ProductionInterval {
            machine_id: "M01".to_string(),
            start_time: start,
            end_time: None,
            good_production: 100.0,
            film_waste: 4.0,
            organic_waste: 3.0,
            planned_time: 60.0,
            downtime_minutes: 0.0,
            target_rate_per_minute: Some(2.0),
        };

        let raw =
            HistoryAggregator::new().build_entry("R1", None, &interval, OeeMetrics::default(), start);
        assert_eq!(raw.total_waste, 7.0);

        let scaled = HistoryAggregator::with_organic_waste_factor(2.0).build_entry(
            "R1",
            None,
            &interval,
            OeeMetrics::default(),
            start,
        );
        assert_eq!(scaled.total_waste, 10.0);
        assert_eq!(agg_total_waste(&[scaled]), 10.0);
    }

    fn agg_total_waste(entries: &[HistoryEntry]) -> f64 {
        HistoryAggregator::new()
            .summarize(entries, SummaryPeriod::Day)
            .iter()
            .map(|s| s.total_waste)
            .sum()
    }

    #[test]
    fn test_summarize_empty() {
        let agg = HistoryAggregator::new();
        assert!(agg.summarize(&[], SummaryPeriod::Day).is_empty());
        assert!(agg.summarize_by_shift(&[]).is_empty());
        assert_eq!(agg.statistics(&[]).entry_count, 0);
    }

    #[test]
    fn test_summarize_by_day_sorted_and_averaged() {
        let agg = HistoryAggregator::new();
        let entries = vec![
            entry(2026, 3, 3, 8, 60.0, None),
            entry(2026, 3, 2, 8, 50.0, None),
            entry(2026, 3, 2, 15, 70.0, None),
        ];
        let out = agg.summarize(&entries, SummaryPeriod::Day);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].period_key, "2026-03-02");
        assert_eq!(out[0].entry_count, 2);
        assert_eq!(out[0].avg_oee, 60.0);
        assert_eq!(out[0].total_good_production, 200.0);
        assert_eq!(out[0].total_downtime_minutes, 20.0);
        assert_eq!(out[1].period_key, "2026-03-03");
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let agg = HistoryAggregator::new();
        let entries = vec![
            entry(2026, 3, 2, 8, 50.0, None),
            entry(2026, 3, 9, 8, 70.0, None),
        ];
        assert_eq!(
            agg.summarize(&entries, SummaryPeriod::Day),
            agg.summarize(&entries, SummaryPeriod::Day)
        );
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2026-03-01 为周日
        let agg = HistoryAggregator::new();
        let entries = vec![
            entry(2026, 3, 1, 8, 50.0, None),
            entry(2026, 3, 7, 8, 70.0, None),
            entry(2026, 3, 8, 8, 90.0, None),
        ];
        let out = agg.summarize(&entries, SummaryPeriod::Week);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].period_key, "2026-03-01");
        assert_eq!(out[0].entry_count, 2);
        assert_eq!(out[1].period_key, "2026-03-08");
    }

    #[test]
    fn test_month_keys_across_year() {
        let agg = HistoryAggregator::new();
        let entries = vec![
            entry(2026, 1, 5, 8, 50.0, None),
            entry(2025, 12, 31, 23, 70.0, None),
            entry(2026, 1, 31, 8, 90.0, None),
        ];
        let out = agg.summarize(&entries, SummaryPeriod::Month);
        let keys: Vec<&str> = out.iter().map(|s| s.period_key.as_str()).collect();
        assert_eq!(keys, vec!["2025-12", "2026-01"]);
        assert_eq!(out[1].entry_count, 2);
        assert_eq!(out[1].period_start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_summarize_by_shift_skips_unassigned() {
        let agg = HistoryAggregator::new();
        let entries = vec![
            entry(2026, 3, 2, 8, 50.0, Some(ShiftName::Morning)),
            entry(2026, 3, 2, 15, 70.0, Some(ShiftName::Afternoon)),
            entry(2026, 3, 3, 8, 70.0, Some(ShiftName::Morning)),
            entry(2026, 3, 3, 9, 10.0, None),
        ];
        let out = agg.summarize_by_shift(&entries);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].shift, ShiftName::Morning);
        assert_eq!(out[0].entry_count, 2);
        assert_eq!(out[0].avg_oee, 60.0);
    }

    #[test]
    fn test_statistics() {
        let agg = HistoryAggregator::new();
        let entries = vec![
            entry(2026, 3, 2, 8, 50.0, None),
            entry(2026, 3, 4, 8, 80.0, None),
            entry(2026, 3, 3, 8, 20.0, None),
        ];
        let stats = agg.statistics(&entries);
        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.avg_oee, 50.0);
        assert_eq!(stats.min_oee, 20.0);
        assert_eq!(stats.max_oee, 80.0);
        assert_eq!(stats.latest.unwrap().metrics.oee, 80.0);
        assert_eq!(stats.total_waste, 15.0);
    }

    #[test]
    fn test_retention_cutoff() {
        let agg = HistoryAggregator::new();
        let now = NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let cutoff = agg.retention_cutoff(now, 90);
        assert_eq!(cutoff.date(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_retention_cutoff_huge_retention_does_not_overflow() {
        let agg = HistoryAggregator::new();
        let now = NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(agg.retention_cutoff(now, 200_000_000), NaiveDateTime::MIN);
        assert_eq!(agg.retention_cutoff(now, u32::MAX), NaiveDateTime::MIN);
    }
}
