// ==========================================
// OEE 监控系统 - 应用状态
// ==========================================
// 职责: 由数据库路径装配 Repository / Config / API 实例
// 连接: 全部仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, DashboardApi, ProductionApi};
use crate::config::{ConfigManager, OeeConfigReader};
use crate::db::{mark_schema_version, open_sqlite_connection};
use crate::domain::actor::{AllowAllPermissions, PermissionChecker};
use crate::engine::events::{AlertEventPublisher, FanoutAlertPublisher};
use crate::repository::{
    AlertEventRepository, HistoryEntryRepository, MaterialRateRepository,
    ProductionRecordRepository,
};

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生产录入API
    pub production_api: Arc<ProductionApi>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 配置管理器（供命令行/维护任务直接读取）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例（放行全部操作）
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_components(db_path, Arc::new(AllowAllPermissions), Vec::new())
    }

    /// 指定权限校验与额外告警下游
    ///
    /// # 参数
    /// - permissions: 外部权限校验
    /// - extra_sinks: 除 alert_event 表外的告警下游（如通知服务）
    pub fn with_components(
        db_path: String,
        permissions: Arc<dyn PermissionChecker>,
        extra_sinks: Vec<Arc<dyn AlertEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        mark_schema_version(&conn).map_err(|e| format!("schema_version 初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository / Config
        // ==========================================
        let production_repo = Arc::new(
            ProductionRecordRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ProductionRecordRepository: {}", e))?,
        );
        let history_repo = Arc::new(
            HistoryEntryRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建HistoryEntryRepository: {}", e))?,
        );
        let material_rate_repo = Arc::new(
            MaterialRateRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建MaterialRateRepository: {}", e))?,
        );
        let alert_repo = Arc::new(
            AlertEventRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建AlertEventRepository: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn OeeConfigReader> = config_manager.clone();

        // 告警: alert_event 表 + 额外下游
        let mut sinks: Vec<Arc<dyn AlertEventPublisher>> = vec![alert_repo.clone()];
        sinks.extend(extra_sinks);
        let alert_publisher: Arc<dyn AlertEventPublisher> = Arc::new(FanoutAlertPublisher::new(sinks));

        // ==========================================
        // API
        // ==========================================
        let production_api = Arc::new(ProductionApi::new(
            production_repo,
            history_repo.clone(),
            material_rate_repo.clone(),
            config_reader.clone(),
            alert_publisher,
            permissions.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            history_repo,
            alert_repo,
            config_reader,
            permissions.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(
            config_manager.clone(),
            material_rate_repo,
            permissions,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            production_api,
            dashboard_api,
            config_api,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 OEE_MONITOR_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("OEE_MONITOR_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./oee_monitor.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("oee-monitor");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("oee_monitor.db");
        }
    }

    path.to_string_lossy().to_string()
}
