// ==========================================
// 物流枢纽流转系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 说明: 仓储只借用 &Connection, 事务由调用方 (引擎工作单元) 持有
// ==========================================

pub mod crossing_repo;
pub mod error;
pub mod exception_repo;
pub mod intake_repo;
pub mod order_repo;
pub mod route_repo;
pub mod stock_repo;
pub mod task_repo;
pub mod tracking_repo;
pub mod transport_repo;

// 重导出核心仓储
pub use crossing_repo::StageCrossingRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use exception_repo::{CategorySummary, ExceptionRepository};
pub use intake_repo::IntakeRepository;
pub use order_repo::OrderRepository;
pub use route_repo::{RouteRepository, StopRepository};
pub use stock_repo::StockEntryRepository;
pub use task_repo::{CollectionRepository, SeparationRepository};
pub use tracking_repo::{ShipmentRepository, TrackingEventRepository};
pub use transport_repo::{ConferenceRepository, TransportRepository};
