// ==========================================
// 物流枢纽流转系统 - 领域模型层
// ==========================================
// 职责: 定义实体、状态类型与状态迁移规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod exception;
pub mod intake;
pub mod order;
pub mod route;
pub mod transport;
pub mod types;

// 重导出核心类型
pub use exception::{
    Actor, AuditAction, AuditEntry, ExceptionContext, ExceptionPatch, NewException,
    PipelineException,
};
pub use intake::Intake;
pub use order::{tracking_labels, Collection, Order, Separation, Shipment, StockEntry, TrackingEvent};
pub use route::{Route, Stop};
pub use transport::{Conference, Transport};
pub use types::{
    CollectionStatus, ConferenceStatus, Direction, ExceptionCategory, ExceptionStatus,
    IntakeStatus, OrderStatus, ParseEnumError, RouteStatus, SeparationStatus, Severity,
    StopStatus, TransportStatus,
};
