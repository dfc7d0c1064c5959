// ==========================================
// 拣货 / 揽收 / 配送流程测试
// ==========================================
// 测试范围:
// 1. 拣货: 无库存登记 BACKLOG 但照常推进
// 2. 揽收: 超过阈值登记 ATRASO (不估算金额)
// 3. 线路结束: P 个未投递站点 → 一条 PARCEL (P × 50), 订单全部 DELIVERED
// 4. 全流程: 收货 → 入库核对 → 拣货 → 出库核对 → 线路结束
// ==========================================

mod test_helpers;

use chrono::{Duration, Utc};
use hub_logistics::domain::order::tracking_labels;
use hub_logistics::domain::types::{
    CollectionStatus, ExceptionCategory, OrderStatus, RouteStatus, SeparationStatus, Severity,
    StopStatus, TransportStatus,
};
use hub_logistics::domain::{Collection, Order, Separation};
use hub_logistics::engine::{EntityMutation, PipelineEngine, StageTransition};
use hub_logistics::repository::{
    CollectionRepository, ExceptionRepository, OrderRepository, RouteRepository,
    SeparationRepository, ShipmentRepository, StopRepository, TrackingEventRepository,
    TransportRepository,
};
use rusqlite::Connection;

// ==========================================
// 测试辅助函数
// ==========================================

fn finish_separation(engine: &PipelineEngine, conn: &Connection, separation_id: &str) {
    let repo = SeparationRepository::new(conn);
    let before = repo.find_by_id(separation_id).unwrap().unwrap();
    repo.update_status(separation_id, SeparationStatus::Separated).unwrap();
    let after = repo.find_by_id(separation_id).unwrap().unwrap();
    engine
        .handle(conn, EntityMutation::separation(Some(before), after))
        .unwrap();
}

fn finish_route(engine: &PipelineEngine, conn: &Connection, route_id: &str) {
    let repo = RouteRepository::new(conn);
    let before = repo.find_by_id(route_id).unwrap().unwrap();
    repo.update_status(route_id, RouteStatus::Finished).unwrap();
    let after = repo.find_by_id(route_id).unwrap().unwrap();
    let report = engine.handle(conn, EntityMutation::route(Some(before), after)).unwrap();
    assert_eq!(report.fired, vec![StageTransition::RouteFinished]);
}

fn route_of(conn: &Connection, transport_id: &str) -> String {
    TransportRepository::new(conn)
        .find_by_id(transport_id)
        .unwrap()
        .unwrap()
        .route_id
        .expect("运输应已关联线路")
}

// ==========================================
// 拣货
// ==========================================

#[test]
fn test_separation_without_stock_records_backlog_and_proceeds() {
    let conn = test_helpers::memory_db();
    let engine = test_helpers::test_engine();
    let order = Order::new("O1", "REF-1").with_status(OrderStatus::InStock);
    OrderRepository::new(&conn).insert(&order).unwrap();
    SeparationRepository::new(&conn)
        .insert(&Separation::new("S1", "O1"))
        .unwrap();

    finish_separation(&engine, &conn, "S1");

    let backlog = ExceptionRepository::new(&conn)
        .list_by_category(ExceptionCategory::Backlog)
        .unwrap();
    assert_eq!(backlog.len(), 1);
    assert_eq!(backlog[0].severity, Severity::High);
    assert_eq!(backlog[0].financial_impact, test_helpers::TEST_ORDER_VALUE);

    assert_eq!(test_helpers::order_status(&conn, "O1"), OrderStatus::AwaitingShipment);
    let timeline = TrackingEventRepository::new(&conn).timeline("O1").unwrap();
    assert_eq!(timeline.last().unwrap().status_label, tracking_labels::READY_FOR_SHIPPING);

    let separation = SeparationRepository::new(&conn).find_by_id("S1").unwrap().unwrap();
    assert!(separation.separated_at.is_some());
}

// ==========================================
// 揽收
// ==========================================

#[test]
fn test_late_collection_records_atraso_without_impact() {
    let conn = test_helpers::memory_db();
    let engine = test_helpers::test_engine();
    OrderRepository::new(&conn)
        .insert(&Order::new("O1", "REF-1"))
        .unwrap();
    let scheduled = Utc::now() - Duration::hours(3);
    let repo = CollectionRepository::new(&conn);
    repo.insert(&Collection::new("K1", "O1", scheduled)).unwrap();

    let before = repo.find_by_id("K1").unwrap().unwrap();
    repo.update_status("K1", CollectionStatus::Realized, None).unwrap();
    let after = repo.find_by_id("K1").unwrap().unwrap();
    let report = engine
        .handle(&conn, EntityMutation::collection(Some(before), after))
        .unwrap();
    assert_eq!(report.fired, vec![StageTransition::CollectionRealized]);

    let delays = ExceptionRepository::new(&conn)
        .list_by_category(ExceptionCategory::Atraso)
        .unwrap();
    assert_eq!(delays.len(), 1);
    assert_eq!(delays[0].severity, Severity::Medium);
    assert_eq!(delays[0].financial_impact, 0.0);

    assert_eq!(test_helpers::order_status(&conn, "O1"), OrderStatus::InTransit);
    let collection = repo.find_by_id("K1").unwrap().unwrap();
    assert!(collection.completed_at.is_some());
    assert_eq!(
        TrackingEventRepository::new(&conn)
            .count_by_label(tracking_labels::IN_TRANSIT_TO_HUB)
            .unwrap(),
        1
    );
}

#[test]
fn test_atraso_occurs_at_reported_pickup_time() {
    let conn = test_helpers::memory_db();
    let engine = test_helpers::test_engine();
    OrderRepository::new(&conn)
        .insert(&Order::new("O1", "REF-1"))
        .unwrap();
    let scheduled = Utc::now() - Duration::hours(6);
    let picked_up = scheduled + Duration::hours(4);
    let repo = CollectionRepository::new(&conn);
    repo.insert(&Collection::new("K1", "O1", scheduled)).unwrap();

    let before = repo.find_by_id("K1").unwrap().unwrap();
    repo.update_status("K1", CollectionStatus::Realized, Some(picked_up)).unwrap();
    let after = repo.find_by_id("K1").unwrap().unwrap();
    engine
        .handle(&conn, EntityMutation::collection(Some(before), after))
        .unwrap();

    let delays = ExceptionRepository::new(&conn)
        .list_by_category(ExceptionCategory::Atraso)
        .unwrap();
    assert_eq!(delays.len(), 1);
    assert_eq!(delays[0].occurred_at, picked_up);
    assert_eq!(
        repo.find_by_id("K1").unwrap().unwrap().completed_at,
        Some(picked_up)
    );
}

#[test]
fn test_on_time_collection_records_nothing() {
    let conn = test_helpers::memory_db();
    let engine = test_helpers::test_engine();
    OrderRepository::new(&conn)
        .insert(&Order::new("O1", "REF-1"))
        .unwrap();
    let scheduled = Utc::now() - Duration::minutes(30);
    let repo = CollectionRepository::new(&conn);
    repo.insert(&Collection::new("K1", "O1", scheduled)).unwrap();

    let before = repo.find_by_id("K1").unwrap().unwrap();
    repo.update_status("K1", CollectionStatus::Realized, Some(Utc::now()))
        .unwrap();
    let after = repo.find_by_id("K1").unwrap().unwrap();
    engine
        .handle(&conn, EntityMutation::collection(Some(before), after))
        .unwrap();

    assert_eq!(test_helpers::count_rows(&conn, "pipeline_exception"), 0);
    assert_eq!(test_helpers::order_status(&conn, "O1"), OrderStatus::InTransit);
}

// ==========================================
// 线路结束
// ==========================================

#[test]
fn test_route_finalization_with_pending_stops() {
    let conn = test_helpers::memory_db();
    let engine = test_helpers::test_engine();
    let (_, conference, orders) = test_helpers::seed_outbound(&conn, "T-OUT", Some("D-1"), 4);
    test_helpers::complete_conference(&engine, &conn, &conference.conference_id, Some(4)).unwrap();
    let route_id = route_of(&conn, "T-OUT");

    // 司机确认投递了第一站, 其余 3 站未确认
    StopRepository::new(&conn)
        .mark_delivered(&route_id, "T-OUT-O1", Utc::now())
        .unwrap();

    finish_route(&engine, &conn, &route_id);

    let parcels = ExceptionRepository::new(&conn)
        .list_by_category(ExceptionCategory::Parcel)
        .unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].severity, Severity::High);
    assert_eq!(parcels[0].financial_impact, 150.0);
    assert_eq!(parcels[0].context.route_id.as_deref(), Some(route_id.as_str()));

    let transport = TransportRepository::new(&conn).find_by_id("T-OUT").unwrap().unwrap();
    assert_eq!(transport.status, TransportStatus::Delivered);
    assert!(transport.completed_at.is_some());

    let shipments = ShipmentRepository::new(&conn);
    for order in &orders {
        assert_eq!(test_helpers::order_status(&conn, &order.order_id), OrderStatus::Delivered);
        let dispatched = shipments.list_by_order(&order.order_id).unwrap();
        assert_eq!(dispatched.len(), 1);
        assert!(dispatched[0].tracking_code.starts_with("TRK-"));
    }

    let stops = StopRepository::new(&conn).list_by_route(&route_id).unwrap();
    assert!(stops.iter().all(|s| s.status == StopStatus::Delivered));

    let route = RouteRepository::new(&conn).find_by_id(&route_id).unwrap().unwrap();
    assert!(route.finished_at.is_some());
}

#[test]
fn test_route_finalization_all_delivered_records_nothing() {
    let conn = test_helpers::memory_db();
    let engine = test_helpers::test_engine();
    let (_, conference, orders) = test_helpers::seed_outbound(&conn, "T-OUT", Some("D-1"), 2);
    test_helpers::complete_conference(&engine, &conn, &conference.conference_id, Some(2)).unwrap();
    let route_id = route_of(&conn, "T-OUT");

    let stops = StopRepository::new(&conn);
    for order in &orders {
        stops.mark_delivered(&route_id, &order.order_id, Utc::now()).unwrap();
    }

    finish_route(&engine, &conn, &route_id);
    assert_eq!(test_helpers::count_rows(&conn, "pipeline_exception"), 0);
}

// ==========================================
// 全流程
// ==========================================

#[test]
fn test_full_pipeline_timeline() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let conn = test_helpers::open_test_connection(&db_path).expect("打开数据库失败");
    let engine = test_helpers::test_engine();

    // 收货 → 入库核对
    test_helpers::seed_intake(&conn, "I1", 2, 2);
    test_helpers::complete_intake(&engine, &conn, "I1").unwrap();
    let conference = test_helpers::inbound_conference_of(&conn, "I1");
    test_helpers::complete_conference(&engine, &conn, &conference.conference_id, Some(2)).unwrap();

    // 拣货
    let separations = SeparationRepository::new(&conn);
    for (i, order_id) in ["I1-O1", "I1-O2"].iter().enumerate() {
        let separation_id = format!("S{}", i + 1);
        separations.insert(&Separation::new(&separation_id, *order_id)).unwrap();
        finish_separation(&engine, &conn, &separation_id);
    }

    // 出库装车
    let transports = TransportRepository::new(&conn);
    let outbound = hub_logistics::domain::Transport::new("T-OUT", hub_logistics::Direction::Out, 2)
        .with_driver("D-9");
    transports.insert(&outbound).unwrap();
    conn.execute(
        "UPDATE orders SET transport_id = 'T-OUT' WHERE order_id IN ('I1-O1', 'I1-O2')",
        [],
    )
    .unwrap();
    let out_conf = hub_logistics::domain::Conference::new(
        "C-OUT",
        Some("T-OUT".to_string()),
        hub_logistics::Direction::Out,
        2,
    );
    hub_logistics::repository::ConferenceRepository::new(&conn)
        .insert(&out_conf)
        .unwrap();
    test_helpers::complete_conference(&engine, &conn, "C-OUT", Some(2)).unwrap();

    // 线路结束
    let route_id = route_of(&conn, "T-OUT");
    finish_route(&engine, &conn, &route_id);

    let labels: Vec<String> = TrackingEventRepository::new(&conn)
        .timeline("I1-O1")
        .unwrap()
        .into_iter()
        .map(|e| e.status_label)
        .collect();
    assert_eq!(
        labels,
        vec![
            tracking_labels::RECEIVED,
            tracking_labels::STOCKED,
            tracking_labels::READY_FOR_SHIPPING,
            tracking_labels::EN_ROUTE,
            tracking_labels::DELIVERED,
        ]
    );
    assert_eq!(test_helpers::order_status(&conn, "I1-O2"), OrderStatus::Delivered);

    // 线路结束时站点均未确认 → 一条 PARCEL
    let parcels = ExceptionRepository::new(&conn)
        .list_by_category(ExceptionCategory::Parcel)
        .unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].financial_impact, 100.0);
}
