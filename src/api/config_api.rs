// ==========================================
// OEE 监控系统 - 配置管理 API
// ==========================================
// 职责: 告警阈值 / 物料目标速率 / 通用配置 的查询与更新
// 权限: 查询需 VIEW_DASHBOARD, 更新需 MANAGE_SETTINGS
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, OeeConfigReader};
use crate::domain::actor::{Actor, Permission, PermissionChecker};
use crate::domain::alert::AlertThresholds;
use crate::engine::repositories::MaterialRateLookup;
use crate::repository::material_rate_repo::MaterialRateRepository;

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
    material_rate_repo: Arc<MaterialRateRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl ConfigApi {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        material_rate_repo: Arc<MaterialRateRepository>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            config_manager,
            material_rate_repo,
            permissions,
        }
    }

    /// 当前生效的告警阈值
    pub async fn get_alert_thresholds(&self, actor: &Actor) -> ApiResult<AlertThresholds> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        self.config_manager
            .get_alert_thresholds()
            .await
            .map_err(|e| ApiError::ConfigurationError(e.to_string()))
    }

    /// 更新告警阈值
    ///
    /// # 校验
    /// - 三项阈值均须为有限非负数, 否则整体拒绝
    pub fn update_alert_thresholds(
        &self,
        actor: &Actor,
        thresholds: AlertThresholds,
    ) -> ApiResult<AlertThresholds> {
        self.ensure_allowed(actor, Permission::ManageSettings)?;

        let fields = [
            ("oee_min", thresholds.oee_min),
            ("downtime_max", thresholds.downtime_max),
            ("production_min", thresholds.production_min),
        ];
        for (name, value) in fields.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(ApiError::InvalidInput(format!(
                    "告警阈值 {} 必须为非负数: {}",
                    name, value
                )));
            }
        }

        self.config_manager
            .update_alert_thresholds(&thresholds)
            .map_err(|e| ApiError::ConfigurationError(e.to_string()))?;

        tracing::info!(actor = %actor.actor_id, "告警阈值已由操作人更新");
        Ok(thresholds)
    }

    /// 设置物料目标速率（件/分钟）
    pub fn set_material_rate(
        &self,
        actor: &Actor,
        material_code: &str,
        target_rate_per_minute: f64,
    ) -> ApiResult<()> {
        self.ensure_allowed(actor, Permission::ManageSettings)?;
        self.material_rate_repo
            .upsert_rate(material_code, target_rate_per_minute, &actor.actor_id)?;
        tracing::info!(
            actor = %actor.actor_id,
            material_code,
            target_rate_per_minute,
            "物料目标速率已更新"
        );
        Ok(())
    }

    /// 查询物料目标速率
    pub fn get_material_rate(&self, actor: &Actor, material_code: &str) -> ApiResult<Option<f64>> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        Ok(self.material_rate_repo.lookup_target_rate(material_code)?)
    }

    /// 写入单个配置项
    pub fn set_config_value(&self, actor: &Actor, key: &str, value: &str) -> ApiResult<()> {
        self.ensure_allowed(actor, Permission::ManageSettings)?;
        self.config_manager
            .set_config_value(key, value)
            .map_err(|e| ApiError::ConfigurationError(e.to_string()))
    }

    /// 全部配置快照（JSON）
    pub fn get_config_snapshot(&self, actor: &Actor) -> ApiResult<String> {
        self.ensure_allowed(actor, Permission::ViewDashboard)?;
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::ConfigurationError(e.to_string()))
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
