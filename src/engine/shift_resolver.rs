// ==========================================
// OEE 监控系统 - 班次判定引擎
// ==========================================
// 职责: 时间点 / 时间区间 → 班次
// 输入: 墙钟时间 (NaiveDateTime)
// 输出: ShiftName
// ==========================================
// 区间规则: 首尾同班次直接返回; 否则按真实交集时长取最大者,
// 并列时优先开始时间所在班次
// ==========================================

use crate::domain::shift::{ShiftTable, MINUTES_PER_DAY};
use crate::domain::types::ShiftName;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDateTime, Timelike};

// ==========================================
// ShiftResolver - 班次判定引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct ShiftResolver {
    table: ShiftTable,
}

impl Default for ShiftResolver {
    fn default() -> Self {
        Self {
            table: ShiftTable::default(),
        }
    }
}

impl ShiftResolver {
    /// 使用自定义班次表构造
    ///
    /// # 返回
    /// - Err(Configuration): 班次表未恰好覆盖一天 24 小时
    pub fn new(table: ShiftTable) -> EngineResult<Self> {
        validate_table(&table)?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &ShiftTable {
        &self.table
    }

    // ==========================================
    // 时间点判定
    // ==========================================

    /// 按零点起算分钟数判定班次
    pub fn resolve_minute(&self, minute_of_day: u32) -> EngineResult<ShiftName> {
        self.table
            .windows
            .iter()
            .find(|w| w.contains_minute(minute_of_day))
            .map(|w| w.name)
            .ok_or(EngineError::UndefinedShift { minute_of_day })
    }

    /// 按时间点判定班次
    pub fn resolve_shift(&self, timestamp: NaiveDateTime) -> EngineResult<ShiftName> {
        self.resolve_minute(minute_of_day(timestamp))
    }

    // ==========================================
    // 时间区间判定
    // ==========================================

    /// 按生产区间判定班次
    ///
    /// # 参数
    /// - `start_time`: 开始时间
    /// - `end_time`: 结束时间 (None 或不晚于开始时间时按开始时间判定)
    pub fn resolve_interval(
        &self,
        start_time: NaiveDateTime,
        end_time: Option<NaiveDateTime>,
    ) -> EngineResult<ShiftName> {
        let start_shift = self.resolve_shift(start_time)?;

        let end_time = match end_time {
            Some(end) if end > start_time => end,
            _ => return Ok(start_shift),
        };

        if self.resolve_shift(end_time)? == start_shift {
            return Ok(start_shift);
        }

        let overlaps = self.overlap_seconds(start_time, end_time);
        let mut best = start_shift;
        let mut best_secs = overlaps
            .iter()
            .find(|(name, _)| *name == start_shift)
            .map(|(_, s)| *s)
            .unwrap_or(0);

        for (name, secs) in &overlaps {
            if *secs > best_secs {
                best = *name;
                best_secs = *secs;
            }
        }

        Ok(best)
    }

    /// 计算区间与各班次的交集时长（秒）
    ///
    /// 逐日展开班次窗口, 跨零点窗口延伸到次日
    pub fn overlap_seconds(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Vec<(ShiftName, i64)> {
        let mut result: Vec<(ShiftName, i64)> =
            self.table.windows.iter().map(|w| (w.name, 0)).collect();

        if end_time <= start_time {
            return result;
        }

        // 前一天的跨零点窗口可能覆盖开始时间
        let first_day = start_time.date() - Duration::days(1);
        let last_day = end_time.date();

        let mut day = first_day;
        while day <= last_day {
            let midnight = day.and_time(chrono::NaiveTime::MIN);
            for (idx, window) in self.table.windows.iter().enumerate() {
                let win_start = midnight + Duration::minutes(window.start_minute as i64);
                let win_end = if window.wraps_midnight() {
                    midnight + Duration::days(1) + Duration::minutes(window.end_minute as i64)
                } else {
                    midnight + Duration::minutes(window.end_minute as i64)
                };

                let lo = start_time.max(win_start);
                let hi = end_time.min(win_end);
                if hi > lo {
                    result[idx].1 += (hi - lo).num_seconds();
                }
            }
            day += Duration::days(1);
        }

        result
    }
}

/// 零点起算分钟数（忽略秒）
pub fn minute_of_day(timestamp: NaiveDateTime) -> u32 {
    timestamp.hour() * 60 + timestamp.minute()
}

/// 校验班次表: 每一分钟恰好属于一个班次
fn validate_table(table: &ShiftTable) -> EngineResult<()> {
    if table.windows.is_empty() {
        return Err(EngineError::Configuration("班次表为空".to_string()));
    }

    for w in &table.windows {
        if w.start_minute >= MINUTES_PER_DAY || w.end_minute >= MINUTES_PER_DAY {
            return Err(EngineError::Configuration(format!(
                "班次 {} 边界超出一天范围: start={}, end={}",
                w.name, w.start_minute, w.end_minute
            )));
        }
        if w.start_minute == w.end_minute {
            return Err(EngineError::Configuration(format!(
                "班次 {} 时长为 0",
                w.name
            )));
        }
    }

    for minute in 0..MINUTES_PER_DAY {
        let hits = table
            .windows
            .iter()
            .filter(|w| w.contains_minute(minute))
            .count();
        if hits != 1 {
            return Err(EngineError::Configuration(format!(
                "班次表未划分完整: minute_of_day={} 命中 {} 个班次",
                minute, hits
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shift::ShiftWindow;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_every_minute_resolves_to_a_shift() {
        let resolver = ShiftResolver::default();
        for minute in 0..MINUTES_PER_DAY {
            assert!(resolver.resolve_minute(minute).is_ok(), "minute {}", minute);
        }
    }

    #[test]
    fn test_boundaries() {
        let resolver = ShiftResolver::default();
        assert_eq!(resolver.resolve_shift(dt(2, 5, 39)).unwrap(), ShiftName::Night);
        assert_eq!(resolver.resolve_shift(dt(2, 5, 40)).unwrap(), ShiftName::Morning);
        assert_eq!(resolver.resolve_shift(dt(2, 13, 49)).unwrap(), ShiftName::Morning);
        assert_eq!(resolver.resolve_shift(dt(2, 13, 50)).unwrap(), ShiftName::Afternoon);
        assert_eq!(resolver.resolve_shift(dt(2, 22, 7)).unwrap(), ShiftName::Afternoon);
        assert_eq!(resolver.resolve_shift(dt(2, 22, 8)).unwrap(), ShiftName::Night);
    }

    #[test]
    fn test_midnight_wrap() {
        let resolver = ShiftResolver::default();
        assert_eq!(resolver.resolve_shift(dt(2, 23, 59)).unwrap(), ShiftName::Night);
        assert_eq!(resolver.resolve_shift(dt(3, 0, 1)).unwrap(), ShiftName::Night);
    }

    #[test]
    fn test_interval_within_one_shift() {
        let resolver = ShiftResolver::default();
        let shift = resolver
            .resolve_interval(dt(2, 6, 0), Some(dt(2, 12, 0)))
            .unwrap();
        assert_eq!(shift, ShiftName::Morning);
    }

    #[test]
    fn test_interval_picks_largest_overlap() {
        let resolver = ShiftResolver::default();
        // 早班 20 分钟, 中班 130 分钟
        let shift = resolver
            .resolve_interval(dt(2, 13, 30), Some(dt(2, 16, 0)))
            .unwrap();
        assert_eq!(shift, ShiftName::Afternoon);
    }

    #[test]
    fn test_interval_across_midnight_into_morning() {
        let resolver = ShiftResolver::default();
        // 夜班 23:00-05:40 = 400 分钟, 早班 05:40-06:00 = 20 分钟
        let shift = resolver
            .resolve_interval(dt(2, 23, 0), Some(dt(3, 6, 0)))
            .unwrap();
        assert_eq!(shift, ShiftName::Night);
    }

    #[test]
    fn test_interval_same_shift_at_both_ends_wins_over_overlap() {
        let resolver = ShiftResolver::default();
        // 首尾均在中班: 即使中间早班 490 分钟最长, 仍取中班
        let shift = resolver
            .resolve_interval(dt(2, 20, 0), Some(dt(3, 14, 0)))
            .unwrap();
        assert_eq!(shift, ShiftName::Afternoon);

        // 早班 13:40 开始, 次日 05:50 结束: 首尾不同, 按交集时长
        let shift = resolver
            .resolve_interval(dt(2, 13, 40), Some(dt(3, 5, 50)))
            .unwrap();
        assert_eq!(shift, ShiftName::Afternoon);
    }

    #[test]
    fn test_open_interval_uses_start() {
        let resolver = ShiftResolver::default();
        assert_eq!(
            resolver.resolve_interval(dt(2, 14, 0), None).unwrap(),
            ShiftName::Afternoon
        );
        // 结束早于开始按开始时间处理
        assert_eq!(
            resolver
                .resolve_interval(dt(2, 14, 0), Some(dt(2, 10, 0)))
                .unwrap(),
            ShiftName::Afternoon
        );
    }

    #[test]
    fn test_overlap_totals_equal_interval_length() {
        let resolver = ShiftResolver::default();
        let overlaps = resolver.overlap_seconds(dt(2, 3, 0), dt(4, 17, 30));
        let total: i64 = overlaps.iter().map(|(_, s)| *s).sum();
        assert_eq!(total, (dt(4, 17, 30) - dt(2, 3, 0)).num_seconds());
    }

    #[test]
    fn test_invalid_table_rejected() {
        let table = ShiftTable {
            windows: vec![
                ShiftWindow::from_hm(ShiftName::Morning, (6, 0), (14, 0)),
                ShiftWindow::from_hm(ShiftName::Afternoon, (14, 0), (22, 0)),
            ],
        };
        assert!(matches!(
            ShiftResolver::new(table),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_custom_table_accepted() {
        let table = ShiftTable {
            windows: vec![
                ShiftWindow::from_hm(ShiftName::Morning, (6, 0), (14, 0)),
                ShiftWindow::from_hm(ShiftName::Afternoon, (14, 0), (22, 0)),
                ShiftWindow::from_hm(ShiftName::Night, (22, 0), (6, 0)),
            ],
        };
        let resolver = ShiftResolver::new(table).unwrap();
        assert_eq!(resolver.resolve_shift(dt(2, 5, 59)).unwrap(), ShiftName::Night);
    }
}
