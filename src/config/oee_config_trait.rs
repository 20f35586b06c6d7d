// ==========================================
// OEE 监控系统 - 配置读取 Trait
// ==========================================
// 职责: 定义引擎/服务所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::alert::{AlertThresholds, SeverityBands};
use crate::engine::oee_calculator::OeeParameters;
use async_trait::async_trait;
use std::error::Error;

/// 配置层 Result 别名
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// OeeConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
// 约定: 缺失或非法值返回默认值, 仅存储故障返回 Err
#[async_trait]
pub trait OeeConfigReader: Send + Sync {
    /// 获取告警阈值
    ///
    /// # 默认值
    /// - oee_min = 65, downtime_max = 30, production_min = 85
    async fn get_alert_thresholds(&self) -> ConfigResult<AlertThresholds>;

    /// 获取 OEE 计算参数
    ///
    /// # 默认值
    /// - default_target_rate = 65
    /// - performance_derating = 0.85
    /// - zero_planned_policy = ALL_ZERO
    /// - organic_waste_factor = 1.0
    async fn get_oee_parameters(&self) -> ConfigResult<OeeParameters>;

    /// 获取告警分级配置
    ///
    /// # 默认值
    /// - enabled = true, high_gap = 10, critical_gap = 20
    async fn get_severity_bands(&self) -> ConfigResult<SeverityBands>;

    /// 历史快照保留天数（默认 90）
    async fn get_history_retention_days(&self) -> ConfigResult<u32>;

    /// 历史写入超时（毫秒, 默认 2000）
    async fn get_history_write_timeout_ms(&self) -> ConfigResult<u64>;
}
