// ==========================================
// 物流枢纽流转系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 阶段迁移编排引擎 (收货 → 核对 → 仓储 → 拣货 → 出库 → 配送)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 阶段反应器与异常登记
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CollectionStatus, ConferenceStatus, Direction, ExceptionCategory, ExceptionStatus,
    IntakeStatus, OrderStatus, RouteStatus, SeparationStatus, Severity, StopStatus,
    TransportStatus,
};

// 领域实体
pub use domain::{
    Actor, Collection, Conference, ExceptionContext, ExceptionPatch, Intake, Order,
    PipelineException, Route, Separation, Shipment, StockEntry, Stop, TrackingEvent, Transport,
};

// 引擎
pub use engine::{
    DispatchReport, EngineError, EngineResult, EntityMutation, ExceptionRecorder,
    ExceptionService, MutationOrigin, PipelineEngine, PolicyHooks, StageTransition,
};

// 配置
pub use config::{ConfigManager, PipelineConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "物流枢纽流转系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
