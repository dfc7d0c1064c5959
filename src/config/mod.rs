// ==========================================
// 物流枢纽流转系统 - 配置层
// ==========================================
// 职责: 流转引擎参数 (罚金 / 阈值 / 地点) 的加载与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod pipeline_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, load_pipeline_config, ConfigManager};
pub use pipeline_config::PipelineConfig;
