// ==========================================
// 配置管理集成测试
// ==========================================
// 测试目标: ConfigApi 写入 → ConfigManager 读取 (跨连接持久化)
// ==========================================

mod test_helpers;

use oee_monitor::api::ApiError;
use oee_monitor::app::AppState;
use oee_monitor::config::{config_keys, ConfigManager, OeeConfigReader};
use oee_monitor::domain::actor::Actor;
use oee_monitor::domain::alert::AlertThresholds;
use oee_monitor::domain::types::ZeroPlannedTimePolicy;
use test_helpers::create_test_db;

fn admin() -> Actor {
    Actor::new("admin")
}

#[tokio::test]
async fn test_threshold_update_persists_across_connections() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path.clone()).unwrap();

    assert_eq!(
        state.config_api.get_alert_thresholds(&admin()).await.unwrap(),
        AlertThresholds::default()
    );

    let updated = AlertThresholds {
        oee_min: 70.0,
        downtime_max: 45.0,
        production_min: 100.0,
    };
    state
        .config_api
        .update_alert_thresholds(&admin(), updated)
        .unwrap();

    // 新连接读取
    let reopened = ConfigManager::new(&db_path).unwrap();
    assert_eq!(reopened.get_alert_thresholds().await.unwrap(), updated);
}

#[tokio::test]
async fn test_negative_threshold_rejected_without_partial_write() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    let err = state
        .config_api
        .update_alert_thresholds(
            &admin(),
            AlertThresholds {
                oee_min: 50.0,
                downtime_max: -1.0,
                production_min: 10.0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    assert_eq!(
        state.config_manager.get_alert_thresholds().await.unwrap(),
        AlertThresholds::default()
    );
}

#[tokio::test]
async fn test_oee_parameters_from_config() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    let api = &state.config_api;

    api.set_config_value(&admin(), config_keys::DEFAULT_TARGET_RATE, "80").unwrap();
    api.set_config_value(&admin(), config_keys::PERFORMANCE_DERATING, "1.5").unwrap();
    api.set_config_value(&admin(), config_keys::ZERO_PLANNED_POLICY, "full_quality").unwrap();

    let params = state.config_manager.get_oee_parameters().await.unwrap();
    assert_eq!(params.default_target_rate, 80.0);
    // 超出 (0,1] 回退默认值
    assert_eq!(params.performance_derating, 0.85);
    assert_eq!(params.zero_planned_policy, ZeroPlannedTimePolicy::FullQuality);
}

#[tokio::test]
async fn test_material_rate_and_snapshot() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    let api = &state.config_api;

    assert_eq!(api.get_material_rate(&admin(), "MAT-A").unwrap(), None);
    api.set_material_rate(&admin(), "MAT-A", 12.5).unwrap();
    assert_eq!(api.get_material_rate(&admin(), "MAT-A").unwrap(), Some(12.5));
    assert!(matches!(
        api.set_material_rate(&admin(), "MAT-A", -3.0),
        Err(ApiError::InvalidInput(_))
    ));

    api.set_config_value(&admin(), config_keys::SEVERITY_BANDING, "off").unwrap();
    let snapshot: serde_json::Value =
        serde_json::from_str(&api.get_config_snapshot(&admin()).unwrap()).unwrap();
    assert_eq!(snapshot[config_keys::SEVERITY_BANDING], "off");

    let bands = state.config_manager.get_severity_bands().await.unwrap();
    assert!(!bands.enabled);
}

#[tokio::test]
async fn test_empty_config_key_rejected() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    let err = state
        .config_api
        .set_config_value(&admin(), "  ", "1")
        .unwrap_err();
    assert!(matches!(err, ApiError::ConfigurationError(_)));
}
