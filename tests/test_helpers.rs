// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成、阶段推进等功能
// ==========================================

#![allow(dead_code)]

use hub_logistics::config::PipelineConfig;
use hub_logistics::db;
use hub_logistics::logging;
use hub_logistics::domain::types::{ConferenceStatus, Direction, IntakeStatus, OrderStatus};
use hub_logistics::domain::{Conference, Intake, Order, Transport};
use hub_logistics::engine::{
    DispatchReport, EngineResult, EntityMutation, PipelineEngine, PolicyHooks,
};
use hub_logistics::repository::{
    ConferenceRepository, IntakeRepository, OrderRepository, TransportRepository,
};
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 测试用货值
pub const TEST_ORDER_VALUE: f64 = 250.0;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径非 UTF-8")?.to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(db::open_sqlite_connection(db_path)?)
}

/// 内存库 (已建表)
pub fn memory_db() -> Connection {
    logging::init_test();
    db::open_in_memory().expect("创建内存库失败")
}

/// 默认配置 + 确定性策略 (固定货值, 无货损)
pub fn test_engine() -> PipelineEngine {
    PipelineEngine::new(PipelineConfig::default(), PolicyHooks::deterministic(TEST_ORDER_VALUE))
}

pub fn engine_with_policies(policies: PolicyHooks) -> PipelineEngine {
    PipelineEngine::new(PipelineConfig::default(), policies)
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .expect("计数失败")
}

pub fn order_status(conn: &Connection, order_id: &str) -> OrderStatus {
    OrderRepository::new(conn)
        .find_by_id(order_id)
        .expect("查询订单失败")
        .expect("订单不存在")
        .status
}

// ==========================================
// 收货阶段
// ==========================================

/// 写入收货批次及其订单 (订单ID: "{intake_id}-O{n}")
pub fn seed_intake(conn: &Connection, intake_id: &str, expected: i64, order_count: usize) -> Vec<Order> {
    IntakeRepository::new(conn)
        .insert(&Intake::new(intake_id, "HUB-01", expected))
        .expect("写入收货批次失败");

    let orders = OrderRepository::new(conn);
    (1..=order_count)
        .map(|i| {
            let order = Order::new(format!("{}-O{}", intake_id, i), format!("REF-{}-{}", intake_id, i))
                .in_intake(intake_id)
                .with_status(OrderStatus::Processing);
            orders.insert(&order).expect("写入订单失败");
            order
        })
        .collect()
}

/// 模拟外部把收货批次改为 DONE, 并交给引擎
pub fn complete_intake(
    engine: &PipelineEngine,
    conn: &Connection,
    intake_id: &str,
) -> EngineResult<DispatchReport> {
    engine.handle(conn, intake_done_mutation(conn, intake_id))
}

pub fn intake_done_mutation(conn: &Connection, intake_id: &str) -> EntityMutation {
    let repo = IntakeRepository::new(conn);
    let before = repo.find_by_id(intake_id).unwrap().expect("收货批次不存在");
    repo.update_status(intake_id, IntakeStatus::Done).unwrap();
    let after = repo.find_by_id(intake_id).unwrap().unwrap();
    EntityMutation::intake(Some(before), after)
}

/// 收货完成后生成的入库运输
pub fn inbound_transport_of(conn: &Connection, intake_id: &str) -> Transport {
    let mut transports = TransportRepository::new(conn).list_by_intake(intake_id).unwrap();
    assert_eq!(transports.len(), 1, "收货批次应只有一个入库运输");
    transports.remove(0)
}

/// 入库运输上的核对
pub fn inbound_conference_of(conn: &Connection, intake_id: &str) -> Conference {
    let transport = inbound_transport_of(conn, intake_id);
    let mut conferences = ConferenceRepository::new(conn)
        .list_by_transport(&transport.transport_id)
        .unwrap();
    assert_eq!(conferences.len(), 1);
    conferences.remove(0)
}

// ==========================================
// 核对阶段
// ==========================================

/// 模拟外部录入核对结果 (DONE), 并交给引擎
pub fn complete_conference(
    engine: &PipelineEngine,
    conn: &Connection,
    conference_id: &str,
    counted: Option<i64>,
) -> EngineResult<DispatchReport> {
    let repo = ConferenceRepository::new(conn);
    let before = repo.find_by_id(conference_id).unwrap().expect("核对不存在");
    repo.record_count(conference_id, ConferenceStatus::Done, counted).unwrap();
    let after = repo.find_by_id(conference_id).unwrap().unwrap();
    engine.handle(conn, EntityMutation::conference(Some(before), after))
}

/// 写入出库运输 + 待发运订单 + 出库核对 (订单ID: "{transport_id}-O{n}")
pub fn seed_outbound(
    conn: &Connection,
    transport_id: &str,
    driver: Option<&str>,
    order_count: usize,
) -> (Transport, Conference, Vec<Order>) {
    let transports = TransportRepository::new(conn);
    let mut transport = Transport::new(transport_id, Direction::Out, order_count as i64);
    if let Some(driver) = driver {
        transport = transport.with_driver(driver);
    }
    transports.insert(&transport).unwrap();

    let orders_repo = OrderRepository::new(conn);
    let orders: Vec<Order> = (1..=order_count)
        .map(|i| {
            let order = Order::new(format!("{}-O{}", transport_id, i), format!("OUT-{}", i))
                .on_transport(transport_id)
                .with_status(OrderStatus::AwaitingShipment);
            orders_repo.insert(&order).unwrap();
            order
        })
        .collect();

    let conference = Conference::new(
        format!("{}-CONF", transport_id),
        Some(transport_id.to_string()),
        Direction::Out,
        order_count as i64,
    );
    ConferenceRepository::new(conn).insert(&conference).unwrap();
    transports
        .link_conference(transport_id, &conference.conference_id)
        .unwrap();
    transport.conference_id = Some(conference.conference_id.clone());

    (transport, conference, orders)
}
