// ==========================================
// OEE 监控系统 - 领域类型定义
// ==========================================
// 班次 / 汇总周期 / 告警类型 / 告警级别 / 零计划时间策略
// 序列化格式与数据库存储保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 班次名称 (Shift Name)
// ==========================================
// 固定三班: 早班 / 中班 / 夜班(跨零点)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftName {
    Morning,   // 早班
    Afternoon, // 中班
    Night,     // 夜班
}

impl ShiftName {
    /// 全部班次（按一天内出现顺序）
    pub const ALL: [ShiftName; 3] = [ShiftName::Morning, ShiftName::Afternoon, ShiftName::Night];

    /// 转换为字符串（用于数据库存储）
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftName::Morning => "MORNING",
            ShiftName::Afternoon => "AFTERNOON",
            ShiftName::Night => "NIGHT",
        }
    }

    /// 从数据库字符串解析（大小写不敏感）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "MORNING" => Some(ShiftName::Morning),
            "AFTERNOON" => Some(ShiftName::Afternoon),
            "NIGHT" => Some(ShiftName::Night),
            _ => None,
        }
    }
}

impl fmt::Display for ShiftName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 汇总周期 (Summary Period)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryPeriod {
    Day,   // 自然日
    Week,  // 周（周日起始）
    Month, // 自然月
}

impl SummaryPeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "DAY" | "D" => Some(SummaryPeriod::Day),
            "WEEK" | "W" => Some(SummaryPeriod::Week),
            "MONTH" | "M" => Some(SummaryPeriod::Month),
            _ => None,
        }
    }
}

impl fmt::Display for SummaryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryPeriod::Day => write!(f, "DAY"),
            SummaryPeriod::Week => write!(f, "WEEK"),
            SummaryPeriod::Month => write!(f, "MONTH"),
        }
    }
}

// ==========================================
// 告警类型 (Alert Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowOee,     // OEE 低于下限
    Downtime,   // 停机超限
    Production, // 产量不足
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowOee => "low_oee",
            AlertKind::Downtime => "downtime",
            AlertKind::Production => "production",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low_oee" => Some(AlertKind::LowOee),
            "downtime" => Some(AlertKind::Downtime),
            "production" => Some(AlertKind::Production),
            _ => None,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 告警级别 (Alert Severity)
// ==========================================
// 红线: 等级制,按缺口逐级升级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 零计划时间策略 (Zero Planned Time Policy)
// ==========================================
// planned_time <= 0 时四项指标的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZeroPlannedTimePolicy {
    AllZero,     // 四项全部为 0
    FullQuality, // 质量率记 100，其余为 0
}

impl ZeroPlannedTimePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "ALL_ZERO" => Some(ZeroPlannedTimePolicy::AllZero),
            "FULL_QUALITY" => Some(ZeroPlannedTimePolicy::FullQuality),
            _ => None,
        }
    }
}

impl fmt::Display for ZeroPlannedTimePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroPlannedTimePolicy::AllZero => write!(f, "ALL_ZERO"),
            ZeroPlannedTimePolicy::FullQuality => write!(f, "FULL_QUALITY"),
        }
    }
}
