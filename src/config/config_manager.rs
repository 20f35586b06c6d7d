// ==========================================
// OEE 监控系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// 策略: 缺失/格式错误 → 默认值 + warn, 不中断业务
// ==========================================

use crate::config::oee_config_trait::{ConfigResult, OeeConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::alert::{AlertThresholds, SeverityBands};
use crate::domain::types::ZeroPlannedTimePolicy;
use crate::engine::history_recorder::DEFAULT_HISTORY_WRITE_TIMEOUT_MS;
use crate::engine::oee_calculator::OeeParameters;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 历史快照默认保留天数
pub const DEFAULT_HISTORY_RETENTION_DAYS: u32 = 90;
/// 保留期上限 (约 100 年)
pub const MAX_HISTORY_RETENTION_DAYS: u32 = 36_500;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）, 并确保 config_kv 表存在。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
            guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS config_kv (
                  scope_id TEXT NOT NULL,
                  key TEXT NOT NULL,
                  value TEXT NOT NULL,
                  updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                  PRIMARY KEY (scope_id, key)
                );
                "#,
            )?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        tracing::debug!(config_key = key, value, "配置已写入");
        Ok(())
    }

    /// 批量写入告警阈值（事务）
    ///
    /// 任一字段为负数或非有限值时整体拒绝
    pub fn update_alert_thresholds(&self, thresholds: &AlertThresholds) -> ConfigResult<()> {
        let fields = [
            (config_keys::ALERT_OEE_MIN, thresholds.oee_min),
            (config_keys::ALERT_DOWNTIME_MAX, thresholds.downtime_max),
            (config_keys::ALERT_PRODUCTION_MIN, thresholds.production_min),
        ];
        for (key, value) in fields.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(format!("告警阈值 {} 非法: {}", key, value).into());
            }
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;
        for (key, value) in fields.iter() {
            tx.execute(
                "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value.to_string()],
            )?;
        }
        tx.commit()?;

        tracing::info!(
            oee_min = thresholds.oee_min,
            downtime_max = thresholds.downtime_max,
            production_min = thresholds.production_min,
            "告警阈值已更新"
        );
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON, 键有序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取数值配置, 缺失返回默认值, 格式错误/不满足约束时 warn 后返回默认值
    fn read_parsed<T>(&self, key: &str, default: T, valid: impl Fn(&T) -> bool) -> ConfigResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(value) if valid(&value) => Ok(value),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值非法，使用默认值"
                );
                Ok(default)
            }
        }
    }

    fn read_non_negative(&self, key: &str, default: f64) -> ConfigResult<f64> {
        self.read_parsed(key, default, |v| v.is_finite() && *v >= 0.0)
    }
}

// ==========================================
// OeeConfigReader Trait 实现
// ==========================================
#[async_trait]
impl OeeConfigReader for ConfigManager {
    async fn get_alert_thresholds(&self) -> ConfigResult<AlertThresholds> {
        Ok(AlertThresholds {
            oee_min: self
                .read_non_negative(config_keys::ALERT_OEE_MIN, AlertThresholds::DEFAULT_OEE_MIN)?,
            downtime_max: self.read_non_negative(
                config_keys::ALERT_DOWNTIME_MAX,
                AlertThresholds::DEFAULT_DOWNTIME_MAX,
            )?,
            production_min: self.read_non_negative(
                config_keys::ALERT_PRODUCTION_MIN,
                AlertThresholds::DEFAULT_PRODUCTION_MIN,
            )?,
        })
    }

    async fn get_oee_parameters(&self) -> ConfigResult<OeeParameters> {
        let defaults = OeeParameters::default();

        let zero_planned_policy = match self.get_global_config_value(config_keys::ZERO_PLANNED_POLICY)? {
            None => defaults.zero_planned_policy,
            Some(raw) => ZeroPlannedTimePolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::ZERO_PLANNED_POLICY,
                    raw_value = %raw,
                    "零计划时间策略未知，使用默认值"
                );
                defaults.zero_planned_policy
            }),
        };

        Ok(OeeParameters {
            default_target_rate: self.read_parsed(
                config_keys::DEFAULT_TARGET_RATE,
                defaults.default_target_rate,
                |v| v.is_finite() && *v > 0.0,
            )?,
            performance_derating: self.read_parsed(
                config_keys::PERFORMANCE_DERATING,
                defaults.performance_derating,
                |v| v.is_finite() && *v > 0.0 && *v <= 1.0,
            )?,
            zero_planned_policy,
            organic_waste_factor: self.read_non_negative(
                config_keys::ORGANIC_WASTE_FACTOR,
                defaults.organic_waste_factor,
            )?,
        })
    }

    async fn get_severity_bands(&self) -> ConfigResult<SeverityBands> {
        let defaults = SeverityBands::default();

        let enabled = match self.get_global_config_value(config_keys::SEVERITY_BANDING)? {
            None => defaults.enabled,
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "on" => true,
                "false" | "0" | "off" => false,
                _ => {
                    tracing::warn!(
                        config_key = config_keys::SEVERITY_BANDING,
                        raw_value = %raw,
                        "告警分级开关格式错误，使用默认值"
                    );
                    defaults.enabled
                }
            },
        };
        let high_gap = self.read_non_negative(config_keys::SEVERITY_HIGH_GAP, defaults.high_gap)?;
        let critical_gap =
            self.read_non_negative(config_keys::SEVERITY_CRITICAL_GAP, defaults.critical_gap)?;

        if high_gap > critical_gap {
            tracing::warn!(high_gap, critical_gap, "分级缺口倒置，使用默认分级");
            return Ok(SeverityBands { enabled, ..defaults });
        }

        Ok(SeverityBands {
            enabled,
            high_gap,
            critical_gap,
        })
    }

    async fn get_history_retention_days(&self) -> ConfigResult<u32> {
        self.read_parsed(
            config_keys::HISTORY_RETENTION_DAYS,
            DEFAULT_HISTORY_RETENTION_DAYS,
            |v| *v > 0 && *v <= MAX_HISTORY_RETENTION_DAYS,
        )
    }

    async fn get_history_write_timeout_ms(&self) -> ConfigResult<u64> {
        self.read_parsed(
            config_keys::HISTORY_WRITE_TIMEOUT_MS,
            DEFAULT_HISTORY_WRITE_TIMEOUT_MS,
            |v| *v > 0,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 告警阈值
    pub const ALERT_OEE_MIN: &str = "alert_oee_min";
    pub const ALERT_DOWNTIME_MAX: &str = "alert_downtime_max";
    pub const ALERT_PRODUCTION_MIN: &str = "alert_production_min";

    // OEE 计算
    pub const DEFAULT_TARGET_RATE: &str = "default_target_rate";
    pub const PERFORMANCE_DERATING: &str = "performance_derating";
    pub const ZERO_PLANNED_POLICY: &str = "zero_planned_policy";
    pub const ORGANIC_WASTE_FACTOR: &str = "organic_waste_factor";

    // 告警分级
    pub const SEVERITY_BANDING: &str = "severity_banding";
    pub const SEVERITY_HIGH_GAP: &str = "severity_high_gap";
    pub const SEVERITY_CRITICAL_GAP: &str = "severity_critical_gap";

    // 历史快照
    pub const HISTORY_RETENTION_DAYS: &str = "history_retention_days";
    pub const HISTORY_WRITE_TIMEOUT_MS: &str = "history_write_timeout_ms";
}
