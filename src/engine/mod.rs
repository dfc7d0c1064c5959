// ==========================================
// 物流枢纽流转系统 - 引擎层
// ==========================================
// 职责: 阶段跨越检测、阶段反应器、异常登记与审计
// 红线: 引擎只通过仓储层访问存储, 所有写入位于工作单元内
// ==========================================

pub mod detectors;
pub mod dispatch;
pub mod error;
pub mod estimators;
pub mod events;
pub mod exception_service;
pub mod orchestrator;
pub mod policy;
pub mod reactors;
pub mod recorder;
pub mod stage_graph;
pub mod unit_of_work;

// 重导出核心类型
pub use dispatch::detect_crossing;
pub use error::{EngineError, EngineResult};
pub use events::{EntityKind, EntityMutation, MutationOrigin};
pub use exception_service::ExceptionService;
pub use orchestrator::{DispatchReport, PipelineEngine};
pub use policy::{
    DamagedOrders, FixedValuation, InspectionPolicy, NeverDamaged, PolicyHooks,
    SampledInspection, ValuationPolicy,
};
pub use recorder::ExceptionRecorder;
pub use stage_graph::{FailureMode, StageEdge, StageTransition, MAX_CASCADE_DEPTH, STAGE_GRAPH};
pub use unit_of_work::run_in_unit_of_work;
