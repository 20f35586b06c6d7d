// ==========================================
// OEE 监控系统 - 看板 API
// ==========================================
// 职责: 历史趋势 / 周期汇总 / 班次汇总 / 运行统计 / 时间窗告警 / 告警列表
// 数据源: oee_history (追加写) + alert_event
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::OeeConfigReader;
use crate::config::DEFAULT_HISTORY_RETENTION_DAYS;
use crate::domain::actor::{Actor, Permission, PermissionChecker};
use crate::domain::alert::{AlertEvent, AlertThresholds, MetricsSnapshot, SeverityBands};
use crate::domain::history::{HistoryEntry, HistoryStatistics, PeriodSummary, ShiftSummary};
use crate::domain::production::OeeMetrics;
use crate::domain::types::SummaryPeriod;
use crate::engine::alert_evaluator::AlertEvaluator;
use crate::engine::history_aggregator::HistoryAggregator;
use crate::repository::alert_repo::AlertEventRepository;
use crate::repository::history_repo::HistoryEntryRepository;

/// 时间窗告警评估结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowEvaluation {
    pub machine_id: String,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub entry_count: usize,
    pub snapshot: MetricsSnapshot,
    pub alerts: Vec<AlertEvent>,
}

/// 历史清理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneReport {
    pub retention_days: u32,
    pub cutoff: NaiveDateTime,
    pub deleted: usize,
}

// ==========================================
// DashboardApi - 看板 API
// ==========================================
pub struct DashboardApi {
    history_repo: Arc<HistoryEntryRepository>,
    alert_repo: Arc<AlertEventRepository>,
    config: Arc<dyn OeeConfigReader>,
    permissions: Arc<dyn PermissionChecker>,
    aggregator: HistoryAggregator,
}

impl DashboardApi {
    pub fn new(
        history_repo: Arc<HistoryEntryRepository>,
        alert_repo: Arc<AlertEventRepository>,
        config: Arc<dyn OeeConfigReader>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            history_repo,
            alert_repo,
            config,
            permissions,
            aggregator: HistoryAggregator::new(),
        }
    }

    /// 历史快照（按业务时间升序）
    pub fn get_history(
        &self,
        actor: &Actor,
        machine_id: &str,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> ApiResult<Vec<HistoryEntry>> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        self.load(machine_id, from, to)
    }

    /// 周期汇总（日 / 周 / 月）
    pub fn get_period_summary(
        &self,
        actor: &Actor,
        machine_id: &str,
        period: SummaryPeriod,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> ApiResult<Vec<PeriodSummary>> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        let entries = self.load(machine_id, from, to)?;
        Ok(self.aggregator.summarize(&entries, period))
    }

    /// 班次汇总
    pub fn get_shift_summary(
        &self,
        actor: &Actor,
        machine_id: &str,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> ApiResult<Vec<ShiftSummary>> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        let entries = self.load(machine_id, from, to)?;
        Ok(self.aggregator.summarize_by_shift(&entries))
    }

    /// 运行统计
    pub fn get_statistics(
        &self,
        actor: &Actor,
        machine_id: &str,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> ApiResult<HistoryStatistics> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        let entries = self.load(machine_id, from, to)?;
        Ok(self.aggregator.statistics(&entries))
    }

    /// 时间窗告警评估
    ///
    /// 指标取窗口内均值, 停机与产量取窗口内累计;
    /// 窗口内无快照时不评估 (无告警); 只返回评估结果, 不发布
    pub async fn evaluate_window(
        &self,
        actor: &Actor,
        machine_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> ApiResult<WindowEvaluation> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        if to <= from {
            return Err(ApiError::InvalidInput(format!(
                "时间窗无效: from={} to={}",
                from, to
            )));
        }

        let entries = self.load(machine_id, Some(from), Some(to))?;
        let stats = self.aggregator.statistics(&entries);
        let snapshot = MetricsSnapshot {
            metrics: OeeMetrics {
                availability: stats.avg_availability,
                performance: stats.avg_performance,
                quality: stats.avg_quality,
                oee: stats.avg_oee,
            },
            downtime_minutes: stats.total_downtime_minutes,
            production: stats.total_good_production,
            observed_at: to,
        };

        if stats.entry_count == 0 {
            tracing::debug!(machine_id, %from, %to, "时间窗内无快照, 跳过告警评估");
            return Ok(WindowEvaluation {
                machine_id: machine_id.to_string(),
                from,
                to,
                entry_count: 0,
                snapshot,
                alerts: Vec::new(),
            });
        }

        let thresholds = self.config.get_alert_thresholds().await.unwrap_or_else(|e| {
            tracing::warn!("读取告警阈值失败, 使用默认值: {}", e);
            AlertThresholds::default()
        });
        let bands = self.config.get_severity_bands().await.unwrap_or_else(|e| {
            tracing::warn!("读取告警分级失败, 使用默认值: {}", e);
            SeverityBands::default()
        });
        let alerts = AlertEvaluator::new(bands).evaluate(machine_id, &snapshot, &thresholds);

        Ok(WindowEvaluation {
            machine_id: machine_id.to_string(),
            from,
            to,
            entry_count: stats.entry_count,
            snapshot,
            alerts,
        })
    }

    /// 最近告警（machine_id 为空时返回全部机组）
    pub fn list_recent_alerts(
        &self,
        actor: &Actor,
        machine_id: Option<&str>,
        limit: u32,
    ) -> ApiResult<Vec<AlertEvent>> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.alert_repo.find_recent(machine_id, limit)?)
    }

    /// 按保留期清理历史快照
    pub async fn prune_history(&self, actor: &Actor, now: NaiveDateTime) -> ApiResult<PruneReport> {
        self.ensure_allowed(actor, Permission::ManageSettings)?;

        let retention_days = self
            .config
            .get_history_retention_days()
            .await
            .unwrap_or(DEFAULT_HISTORY_RETENTION_DAYS);
        let cutoff = self.aggregator.retention_cutoff(now, retention_days);
        let deleted = self.history_repo.prune_before(cutoff)?;

        tracing::info!(retention_days, %cutoff, deleted, "历史快照清理完成");
        Ok(PruneReport {
            retention_days,
            cutoff,
            deleted,
        })
    }

    fn load(
        &self,
        machine_id: &str,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> ApiResult<Vec<HistoryEntry>> {
        if machine_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("机组标识不能为空".to_string()));
        }
        Ok(self.history_repo.find_by_machine(machine_id, from, to)?)
    }

    fn ensure_allowed(&self, actor: &Actor, permission: Permission) -> ApiResult<()> {
        if self.permissions.is_allowed(actor, permission) {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied {
                actor_id: actor.actor_id.clone(),
                permission: permission.as_str().to_string(),
            })
        }
    }
}
