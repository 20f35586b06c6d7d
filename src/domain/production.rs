// ==========================================
// OEE 监控系统 - 生产区间领域模型
// ==========================================
// ProductionInterval: 单机组单个运行窗口的原始计数
// OeeMetrics: 可用率 / 性能率 / 质量率 / OEE (百分比, [0,100])
// ProductionRecord: 已持久化的生产记录 (含缓存指标)
// ==========================================

use crate::domain::types::ShiftName;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionInterval - 生产区间
// ==========================================
// 数量单位: good_production / film_waste 为件数, organic_waste 为质量
// 时间单位: 分钟
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionInterval {
    pub machine_id: String,                   // 机组标识
    pub start_time: NaiveDateTime,            // 开始时间
    pub end_time: Option<NaiveDateTime>,      // 结束时间 (None = 未结束)
    pub good_production: f64,                 // 合格品数量
    pub film_waste: f64,                      // 膜废料 (件)
    pub organic_waste: f64,                   // 有机废料 (质量)
    pub planned_time: f64,                    // 计划运行时间 (分钟)
    pub downtime_minutes: f64,                // 停机时间 (分钟)
    pub target_rate_per_minute: Option<f64>,  // 目标速率 (件/分钟, None = 未知)
}

impl ProductionInterval {
    /// 废料合计, 有机废料按换算系数折算为件
    pub fn total_waste(&self, organic_waste_factor: f64) -> f64 {
        self.film_waste + self.organic_waste * organic_waste_factor
    }
}

// ==========================================
// OeeMetrics - OEE 指标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OeeMetrics {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

impl OeeMetrics {
    /// 全零指标
    pub fn zero() -> Self {
        Self::default()
    }

    /// 所有指标是否都在 [0,100] 内
    pub fn is_within_bounds(&self) -> bool {
        [self.availability, self.performance, self.quality, self.oee]
            .iter()
            .all(|v| (0.0..=100.0).contains(v))
    }
}

// ==========================================
// FieldViolation - 字段级校验违规
// ==========================================
// 用途: 生产录入表单逐字段提示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// ==========================================
// ProductionRecord - 生产记录 (持久化)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    // ===== 主键 =====
    pub record_id: String,                 // 记录ID (UUID)

    // ===== 原始数据 =====
    pub interval: ProductionInterval,
    pub material_code: Option<String>,     // 物料代码 (用于目标速率查询)

    // ===== 派生数据 =====
    pub shift: Option<ShiftName>,          // 归属班次 (无法判定时为 None)
    pub metrics: OeeMetrics,               // 计算结果缓存

    // ===== 审计字段 =====
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// ProductionSubmission - 生产录入请求
// ==========================================
// 来源: 录入表单 / CSV 导入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSubmission {
    #[serde(flatten)]
    pub interval: ProductionInterval,
    #[serde(default)]
    pub material_code: Option<String>,
}
