// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取功能与引擎参数生效
// ==========================================

mod test_helpers;

use hub_logistics::config::{config_keys, ConfigManager, PipelineConfig};
use hub_logistics::domain::types::ExceptionCategory;
use hub_logistics::engine::PipelineEngine;
use hub_logistics::repository::ExceptionRepository;
use test_helpers::create_test_db;

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_missing_keys_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let config = config_manager.load_pipeline_config().expect("Should load config");
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.unit_penalty, 100.0);
    assert_eq!(config.per_stop_penalty, 50.0);
    assert_eq!(config.pickup_delay_threshold_minutes, 120);
}

#[test]
fn test_overrides_are_applied() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::UNIT_PENALTY, "75")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::HUB_LOCATION, "HUB-SP")
        .unwrap();

    let config = config_manager.load_pipeline_config().unwrap();
    assert_eq!(config.unit_penalty, 75.0);
    assert_eq!(config.hub_location, "HUB-SP");
    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::UNIT_PENALTY)
            .unwrap()
            .as_deref(),
        Some("75")
    );
}

#[test]
fn test_malformed_value_is_an_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::PER_STOP_PENALTY, "fifty")
        .unwrap();
    assert!(config_manager.load_pipeline_config().is_err());
}

#[test]
fn test_engine_uses_loaded_penalty() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    config_manager
        .set_global_config_value(config_keys::UNIT_PENALTY, "40")
        .unwrap();
    let config = config_manager.load_pipeline_config().unwrap();

    let conn = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
    // 收货阶段不抽检, 占位策略即可
    let engine = PipelineEngine::with_placeholder_policies(config);
    test_helpers::seed_intake(&conn, "I1", 5, 2);
    test_helpers::complete_intake(&engine, &conn, "I1").unwrap();

    let divergences = ExceptionRepository::new(&conn)
        .list_by_category(ExceptionCategory::Divergence)
        .unwrap();
    assert_eq!(divergences.len(), 1);
    assert_eq!(engine.config().unit_penalty, 40.0);
    assert_eq!(divergences[0].financial_impact, 120.0);
}
