// ==========================================
// 并发跨越测试
// ==========================================
// 职责: 多个连接同时提交同一跨越, 只允许一次生效
// 场景: 同一份 "收货完成" 变更由多个线程各自的连接并发处理
// ==========================================

mod test_helpers;

use hub_logistics::domain::order::tracking_labels;
use hub_logistics::engine::StageTransition;
use hub_logistics::repository::TrackingEventRepository;
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 4;

#[test]
fn test_concurrent_intake_completion_fires_once() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let setup = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
    let orders = test_helpers::seed_intake(&setup, "I1", 3, 3);
    let mutation = test_helpers::intake_done_mutation(&setup, "I1");

    let engine = Arc::new(test_helpers::test_engine());
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let mutation = mutation.clone();
            let db_path = db_path.clone();
            thread::spawn(move || {
                let conn = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
                barrier.wait();
                engine.handle(&conn, mutation)
            })
        })
        .collect();

    let reports: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked").expect("dispatch failed"))
        .collect();

    let fired = reports
        .iter()
        .filter(|r| r.fired(StageTransition::IntakeCompleted))
        .count();
    let duplicates = reports
        .iter()
        .filter(|r| r.duplicates.contains(&StageTransition::IntakeCompleted))
        .count();
    assert_eq!(fired, 1);
    assert_eq!(duplicates, WORKERS - 1);

    assert_eq!(test_helpers::count_rows(&setup, "transport"), 1);
    assert_eq!(test_helpers::count_rows(&setup, "conference"), 1);

    let tracking = TrackingEventRepository::new(&setup);
    for order in &orders {
        let received = tracking
            .timeline(&order.order_id)
            .unwrap()
            .into_iter()
            .filter(|e| e.status_label == tracking_labels::RECEIVED)
            .count();
        assert_eq!(received, 1, "order {} should have exactly one RECEIVED", order.order_id);
    }
}

#[test]
fn test_concurrent_replay_after_commit_is_duplicate() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let setup = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
    test_helpers::seed_intake(&setup, "I2", 2, 2);
    let mutation = test_helpers::intake_done_mutation(&setup, "I2");
    let engine = test_helpers::test_engine();

    let first = engine.handle(&setup, mutation.clone()).unwrap();
    assert!(first.fired(StageTransition::IntakeCompleted));

    // 另一连接重放同一变更
    let other = test_helpers::open_test_connection(&db_path).expect("Failed to open db");
    let second = engine.handle(&other, mutation).unwrap();
    assert!(second.fired.is_empty());
    assert_eq!(second.duplicates, vec![StageTransition::IntakeCompleted]);
    assert_eq!(
        TrackingEventRepository::new(&other)
            .count_by_label(tracking_labels::RECEIVED)
            .unwrap(),
        2
    );
}
