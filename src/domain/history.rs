// ==========================================
// OEE 监控系统 - 历史记录领域模型
// ==========================================
// HistoryEntry: 追加写入、不可变的 OEE 快照
// PeriodSummary / ShiftSummary / HistoryStatistics: 汇总结果
// ==========================================

use crate::domain::production::OeeMetrics;
use crate::domain::types::{ShiftName, SummaryPeriod};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// HistoryEntry - OEE 历史快照
// ==========================================
// 红线: 创建后不修改,只允许按保留期清理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub entry_id: String,              // 快照ID (UUID)
    pub machine_id: String,            // 机组标识
    pub record_id: String,             // 来源生产记录ID
    pub shift: Option<ShiftName>,      // 归属班次
    pub timestamp: NaiveDateTime,      // 业务时间 (生产区间开始时间)
    pub metrics: OeeMetrics,           // 指标快照

    // ===== 汇总用原始量 =====
    pub good_production: f64,
    pub total_waste: f64,              // 膜废料 + 有机废料 × 换算系数 (件)
    pub downtime_minutes: f64,
    pub planned_time: f64,

    pub recorded_at: NaiveDateTime,    // 写入时间
}

// ==========================================
// PeriodSummary - 周期汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: SummaryPeriod,
    pub period_key: String,        // DAY: YYYY-MM-DD / WEEK: 周日 YYYY-MM-DD / MONTH: YYYY-MM
    pub period_start: NaiveDate,
    pub entry_count: usize,

    // ===== 均值 =====
    pub avg_oee: f64,
    pub avg_availability: f64,
    pub avg_performance: f64,
    pub avg_quality: f64,

    // ===== 合计 =====
    pub total_good_production: f64,
    pub total_waste: f64,
    pub total_downtime_minutes: f64,
    pub total_planned_time: f64,
}

// ==========================================
// ShiftSummary - 班次汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub shift: ShiftName,
    pub entry_count: usize,
    pub avg_oee: f64,
    pub total_good_production: f64,
    pub total_downtime_minutes: f64,
}

// ==========================================
// HistoryStatistics - 运行统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatistics {
    pub entry_count: usize,
    pub avg_oee: f64,
    pub avg_availability: f64,
    pub avg_performance: f64,
    pub avg_quality: f64,
    pub min_oee: f64,
    pub max_oee: f64,
    pub total_good_production: f64,
    pub total_waste: f64,
    pub total_downtime_minutes: f64,
    pub latest: Option<HistoryEntry>,
}
