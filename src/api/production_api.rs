// ==========================================
// OEE 监控系统 - 生产录入 API
// ==========================================
// 职责: 生产录入 / 编辑 / CSV 批量导入
// 流程: 权限 → 目标速率 → 校验 → 班次 → 指标 → 主记录落库
//       → 历史快照(尽力而为) → 告警评估 → 告警发布(失败仅告警)
// 红线: 主记录写入成功即视为成功, 历史/告警失败只进入 warnings
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::OeeConfigReader;
use crate::domain::actor::{Actor, Permission, PermissionChecker};
use crate::domain::alert::{AlertEvent, AlertThresholds, MetricsSnapshot, SeverityBands};
use crate::domain::production::{
    OeeMetrics, ProductionInterval, ProductionRecord, ProductionSubmission,
};
use crate::domain::types::ShiftName;
use crate::engine::alert_evaluator::AlertEvaluator;
use crate::engine::events::AlertEventPublisher;
use crate::engine::history_aggregator::HistoryAggregator;
use crate::engine::history_recorder::{HistoryRecorder, DEFAULT_HISTORY_WRITE_TIMEOUT_MS};
use crate::engine::oee_calculator::{OeeCalculator, OeeParameters};
use crate::engine::repositories::{HistoryStore, MaterialRateLookup};
use crate::engine::shift_resolver::ShiftResolver;
use crate::i18n::t_with_args;
use crate::importer::ProductionCsvParser;
use crate::repository::production_repo::ProductionRecordRepository;

// ==========================================
// 响应 DTO
// ==========================================

/// 生产录入/编辑结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionResponse {
    pub record: ProductionRecord,
    pub history_recorded: bool,
    pub history_entry_id: Option<String>,
    pub alerts: Vec<AlertEvent>,
    pub warnings: Vec<String>,
}

/// CSV 导入单行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowOutcome {
    pub row: usize,
    pub record_id: Option<String>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

/// CSV 导入汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub failed: usize,
    pub alert_count: usize,
    pub rows: Vec<ImportRowOutcome>,
}

// ==========================================
// ProductionApi - 生产录入 API
// ==========================================
pub struct ProductionApi {
    production_repo: Arc<ProductionRecordRepository>,
    history_store: Arc<dyn HistoryStore>,
    rate_lookup: Arc<dyn MaterialRateLookup>,
    config: Arc<dyn OeeConfigReader>,
    alert_publisher: Arc<dyn AlertEventPublisher>,
    permissions: Arc<dyn PermissionChecker>,
    shift_resolver: ShiftResolver,
}

impl ProductionApi {
    pub fn new(
        production_repo: Arc<ProductionRecordRepository>,
        history_store: Arc<dyn HistoryStore>,
        rate_lookup: Arc<dyn MaterialRateLookup>,
        config: Arc<dyn OeeConfigReader>,
        alert_publisher: Arc<dyn AlertEventPublisher>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            production_repo,
            history_store,
            rate_lookup,
            config,
            alert_publisher,
            permissions,
            shift_resolver: ShiftResolver::default(),
        }
    }

    /// 替换班次表（部署自定义班次）
    pub fn with_shift_resolver(mut self, shift_resolver: ShiftResolver) -> Self {
        self.shift_resolver = shift_resolver;
        self
    }

    // ==========================================
    // 录入
    // ==========================================

    /// 提交生产数据
    ///
    /// # 返回
    /// - Ok(ProductionResponse): 主记录已保存; 历史/告警问题见 warnings
    /// - Err(ApiError::PermissionDenied): 无录入权限
    /// - Err(ApiError::ProductionValidationError): 字段级校验失败, 未落库
    pub async fn submit_production(
        &self,
        actor: &Actor,
        submission: ProductionSubmission,
    ) -> ApiResult<ProductionResponse> {
        self.ensure_allowed(actor, Permission::SubmitProduction)?;

        let now = now_naive();
        let mut warnings = Vec::new();
        let interval = self.fill_target_rate(
            submission.interval,
            submission.material_code.as_deref(),
            &mut warnings,
        );
        let (shift, metrics) = self.compute(&interval, &mut warnings).await?;

        let record = ProductionRecord {
            record_id: Uuid::new_v4().to_string(),
            interval,
            material_code: submission.material_code,
            shift,
            metrics,
            created_by: actor.actor_id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.production_repo.save(&record)?;

        tracing::info!(
            record_id = %record.record_id,
            machine_id = %record.interval.machine_id,
            oee = record.metrics.oee,
            "生产记录已保存"
        );

        self.after_save(record, now, warnings).await
    }

    /// 编辑生产数据（重算指标, 追加新的历史快照）
    pub async fn update_production(
        &self,
        actor: &Actor,
        record_id: &str,
        submission: ProductionSubmission,
    ) -> ApiResult<ProductionResponse> {
        self.ensure_allowed(actor, Permission::EditProduction)?;

        let existing = self
            .production_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionRecord(id={})不存在", record_id)))?;

        let now = now_naive();
        let mut warnings = Vec::new();
        let interval = self.fill_target_rate(
            submission.interval,
            submission.material_code.as_deref(),
            &mut warnings,
        );
        let (shift, metrics) = self.compute(&interval, &mut warnings).await?;

        let record = ProductionRecord {
            record_id: existing.record_id,
            interval,
            material_code: submission.material_code,
            shift,
            metrics,
            created_by: existing.created_by,
            created_at: existing.created_at,
            updated_at: now,
        };
        self.production_repo.update(&record)?;

        tracing::info!(
            record_id = %record.record_id,
            actor = %actor.actor_id,
            "生产记录已更新"
        );

        self.after_save(record, now, warnings).await
    }

    /// CSV 批量导入（逐行录入, 单行失败不影响其余行）
    pub async fn import_csv(&self, actor: &Actor, path: &Path) -> ApiResult<ImportReport> {
        self.ensure_allowed(actor, Permission::SubmitProduction)?;

        let rows = ProductionCsvParser::new().parse_file(path)?;
        tracing::info!("开始导入生产数据: path={}, rows={}", path.display(), rows.len());

        let mut report = ImportReport {
            total_rows: rows.len(),
            imported: 0,
            failed: 0,
            alert_count: 0,
            rows: Vec::with_capacity(rows.len()),
        };

        for csv_row in rows {
            let outcome = match csv_row.result {
                Err(e) => Err(ApiError::from(e)),
                Ok(submission) => self.submit_production(actor, submission).await,
            };

            match outcome {
                Ok(resp) => {
                    report.imported += 1;
                    report.alert_count += resp.alerts.len();
                    report.rows.push(ImportRowOutcome {
                        row: csv_row.row,
                        record_id: Some(resp.record.record_id),
                        error: None,
                        warnings: resp.warnings,
                    });
                }
                Err(e) => {
                    tracing::warn!("第 {} 行导入失败: {}", csv_row.row, e);
                    report.failed += 1;
                    report.rows.push(ImportRowOutcome {
                        row: csv_row.row,
                        record_id: None,
                        error: Some(e.to_string()),
                        warnings: Vec::new(),
                    });
                }
            }
        }

        tracing::info!(
            imported = report.imported,
            failed = report.failed,
            "生产数据导入完成"
        );
        Ok(report)
    }

    // ==========================================
    // 内部步骤
    // ==========================================

    fn ensure_allowed(&self, actor: &Actor, permission: Permission) -> ApiResult<()> {
        if self.permissions.is_allowed(actor, permission) {
            return Ok(());
        }
        tracing::warn!(actor = %actor.actor_id, permission = permission.as_str(), "权限不足");
        Err(ApiError::PermissionDenied {
            actor_id: actor.actor_id.clone(),
            permission: permission.as_str().to_string(),
        })
    }

    /// 目标速率: 请求值优先, 其次物料速率表, 最后交给计算器默认值
    fn fill_target_rate(
        &self,
        mut interval: ProductionInterval,
        material_code: Option<&str>,
        warnings: &mut Vec<String>,
    ) -> ProductionInterval {
        if interval.target_rate_per_minute.is_some() {
            return interval;
        }
        let code = match material_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => code,
            None => return interval,
        };

        match self.rate_lookup.lookup_target_rate(code) {
            Ok(Some(rate)) => interval.target_rate_per_minute = Some(rate),
            Ok(None) => {
                tracing::debug!(material_code = code, "物料无目标速率, 使用默认值");
            }
            Err(e) => {
                tracing::warn!(material_code = code, "物料速率查询失败, 使用默认值: {}", e);
                warnings.push(format!("物料 {} 速率查询失败: {}", code, e));
            }
        }
        interval
    }

    /// 校验 + 班次判定 + 指标计算
    async fn compute(
        &self,
        interval: &ProductionInterval,
        warnings: &mut Vec<String>,
    ) -> ApiResult<(Option<ShiftName>, OeeMetrics)> {
        let calculator = OeeCalculator::new(self.oee_parameters().await);

        let violations = calculator.validate(interval);
        if !violations.is_empty() {
            return Err(ApiError::validation(violations));
        }

        let shift = match self
            .shift_resolver
            .resolve_interval(interval.start_time, interval.end_time)
        {
            Ok(shift) => Some(shift),
            Err(e) => {
                tracing::warn!(machine_id = %interval.machine_id, "班次判定失败: {}", e);
                warnings.push(t_with_args(
                    "production.undefined_shift",
                    &[("time", interval.start_time.to_string().as_str())],
                ));
                None
            }
        };

        let metrics = calculator.compute(interval)?;
        Ok((shift, metrics))
    }

    /// 主记录落库后: 历史快照 + 告警
    async fn after_save(
        &self,
        record: ProductionRecord,
        now: NaiveDateTime,
        mut warnings: Vec<String>,
    ) -> ApiResult<ProductionResponse> {
        // 1. 历史快照（尽力而为）
        let waste_factor = self.oee_parameters().await.organic_waste_factor;
        let entry = HistoryAggregator::with_organic_waste_factor(waste_factor).build_entry(
            &record.record_id,
            record.shift,
            &record.interval,
            record.metrics,
            now,
        );
        let recorder =
            HistoryRecorder::new(self.history_store.clone(), self.history_timeout_ms().await);
        let outcome = recorder.record(entry).await;
        if let Some(reason) = outcome.warning() {
            warnings.push(t_with_args(
                "production.history_write_failed",
                &[("reason", reason.as_str())],
            ));
        }

        // 2. 告警评估
        let thresholds = self.alert_thresholds().await;
        let evaluator = AlertEvaluator::new(self.severity_bands().await);
        let snapshot = MetricsSnapshot::from_interval(&record.interval, record.metrics);
        let alerts = evaluator.evaluate(&record.interval.machine_id, &snapshot, &thresholds);

        // 3. 告警发布（失败不影响结果）
        if !alerts.is_empty() {
            if let Err(e) = self.alert_publisher.publish(&alerts) {
                tracing::warn!(
                    machine_id = %record.interval.machine_id,
                    "告警发布失败: {}",
                    e
                );
                warnings.push(t_with_args(
                    "production.alert_publish_failed",
                    &[("reason", e.to_string().as_str())],
                ));
            }
        }

        Ok(ProductionResponse {
            history_recorded: outcome.is_recorded(),
            history_entry_id: outcome.is_recorded().then(|| outcome.entry().entry_id.clone()),
            record,
            alerts,
            warnings,
        })
    }

    // ===== 配置读取: 存储故障时回退默认值 =====

    async fn oee_parameters(&self) -> OeeParameters {
        self.config.get_oee_parameters().await.unwrap_or_else(|e| {
            tracing::warn!("读取 OEE 参数失败, 使用默认值: {}", e);
            OeeParameters::default()
        })
    }

    async fn alert_thresholds(&self) -> AlertThresholds {
        self.config.get_alert_thresholds().await.unwrap_or_else(|e| {
            tracing::warn!("读取告警阈值失败, 使用默认值: {}", e);
            AlertThresholds::default()
        })
    }

    async fn severity_bands(&self) -> SeverityBands {
        self.config.get_severity_bands().await.unwrap_or_else(|e| {
            tracing::warn!("读取告警分级失败, 使用默认值: {}", e);
            SeverityBands::default()
        })
    }

    async fn history_timeout_ms(&self) -> u64 {
        self.config
            .get_history_write_timeout_ms()
            .await
            .unwrap_or(DEFAULT_HISTORY_WRITE_TIMEOUT_MS)
    }
}

/// 当前时间（UTC, 秒精度）
pub(crate) fn now_naive() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
