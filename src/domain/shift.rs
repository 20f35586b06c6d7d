// ==========================================
// OEE 监控系统 - 班次配置领域模型
// ==========================================
// 班次为静态配置: 每个班次一个 [start, end) 墙钟窗口
// 恰好一个班次跨越零点 (start > end)
// ==========================================

use crate::domain::types::ShiftName;
use serde::{Deserialize, Serialize};

/// 一天的分钟数
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ==========================================
// ShiftWindow - 班次时间窗
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub name: ShiftName,
    pub start_minute: u32, // 零点起算分钟数 (含)
    pub end_minute: u32,   // 零点起算分钟数 (不含)
}

impl ShiftWindow {
    /// 以 时:分 构造
    pub const fn from_hm(name: ShiftName, start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            name,
            start_minute: start.0 * 60 + start.1,
            end_minute: end.0 * 60 + end.1,
        }
    }

    /// 是否跨越零点
    pub fn wraps_midnight(&self) -> bool {
        self.start_minute > self.end_minute
    }

    /// 判断零点起算分钟数是否落在窗口内
    pub fn contains_minute(&self, minute_of_day: u32) -> bool {
        if self.wraps_midnight() {
            minute_of_day >= self.start_minute || minute_of_day < self.end_minute
        } else {
            self.start_minute <= minute_of_day && minute_of_day < self.end_minute
        }
    }

    /// 窗口时长（分钟）
    pub fn duration_minutes(&self) -> u32 {
        if self.wraps_midnight() {
            MINUTES_PER_DAY - self.start_minute + self.end_minute
        } else {
            self.end_minute - self.start_minute
        }
    }
}

// ==========================================
// ShiftTable - 班次表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTable {
    pub windows: Vec<ShiftWindow>,
}

impl Default for ShiftTable {
    /// 默认三班: 早 05:40-13:50 / 中 13:50-22:08 / 夜 22:08-05:40
    fn default() -> Self {
        Self {
            windows: vec![
                ShiftWindow::from_hm(ShiftName::Morning, (5, 40), (13, 50)),
                ShiftWindow::from_hm(ShiftName::Afternoon, (13, 50), (22, 8)),
                ShiftWindow::from_hm(ShiftName::Night, (22, 8), (5, 40)),
            ],
        }
    }
}

impl ShiftTable {
    pub fn window(&self, name: ShiftName) -> Option<&ShiftWindow> {
        self.windows.iter().find(|w| w.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_full_day() {
        let table = ShiftTable::default();
        let total: u32 = table.windows.iter().map(|w| w.duration_minutes()).sum();
        assert_eq!(total, MINUTES_PER_DAY);
        assert_eq!(table.windows.iter().filter(|w| w.wraps_midnight()).count(), 1);
    }

    #[test]
    fn test_night_window_contains_both_sides_of_midnight() {
        let night = *ShiftTable::default().window(ShiftName::Night).unwrap();
        assert!(night.contains_minute(23 * 60 + 59));
        assert!(night.contains_minute(1));
        assert!(!night.contains_minute(5 * 60 + 40));
    }
}
