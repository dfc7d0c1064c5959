use super::ExceptionRepository;
use crate::db::open_in_memory;
use crate::domain::exception::{Actor, AuditAction, AuditEntry, ExceptionContext, PipelineException};
use crate::domain::types::{ExceptionCategory, ExceptionStatus, Severity};
use chrono::Utc;

fn make_test_exception(id: &str, category: ExceptionCategory, impact: f64) -> PipelineException {
    let now = Utc::now();
    PipelineException {
        exception_id: id.to_string(),
        occurrence_code: format!("EXC-TEST-{}", id),
        category,
        severity: Severity::High,
        status: ExceptionStatus::Open,
        title: "测试异常".to_string(),
        description: "Test exception".to_string(),
        context: ExceptionContext::for_order("O1"),
        reported_by: Actor::System,
        assignee: None,
        resolution_note: None,
        financial_impact: impact,
        occurred_at: now,
        created_at: now,
        updated_at: now,
        resolved_at: None,
    }
}

fn make_entry(exception_id: &str, action: AuditAction) -> AuditEntry {
    AuditEntry {
        exception_id: exception_id.to_string(),
        seq: 0,
        recorded_at: Utc::now(),
        action,
        actor: Actor::user("auditor"),
        field: None,
        old_value: None,
        new_value: None,
    }
}

#[test]
fn test_insert_and_find_by_id() {
    let conn = open_in_memory().unwrap();
    let repo = ExceptionRepository::new(&conn);

    let exception = make_test_exception("e1", ExceptionCategory::Divergence, 200.0);
    repo.insert(&exception).unwrap();

    let found = repo.find_by_id("e1").unwrap().unwrap();
    assert_eq!(found.category, ExceptionCategory::Divergence);
    assert_eq!(found.context.order_id.as_deref(), Some("O1"));
    assert_eq!(found.reported_by, Actor::System);
    assert_eq!(found.financial_impact, 200.0);

    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_history_seq_is_contiguous() {
    let conn = open_in_memory().unwrap();
    let repo = ExceptionRepository::new(&conn);
    repo.insert(&make_test_exception("e1", ExceptionCategory::Parcel, 50.0))
        .unwrap();

    assert_eq!(repo.append_history(&make_entry("e1", AuditAction::Created)).unwrap(), 1);
    assert_eq!(repo.append_history(&make_entry("e1", AuditAction::Updated)).unwrap(), 2);
    assert_eq!(repo.append_history(&make_entry("e1", AuditAction::Updated)).unwrap(), 3);

    let history = repo.history("e1").unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].action, AuditAction::Created);
    assert_eq!(history[2].seq, 3);
    assert_eq!(history[1].actor, Actor::user("auditor"));
}

#[test]
fn test_history_rows_are_immutable() {
    let conn = open_in_memory().unwrap();
    let repo = ExceptionRepository::new(&conn);
    repo.insert(&make_test_exception("e1", ExceptionCategory::Parcel, 50.0))
        .unwrap();
    repo.append_history(&make_entry("e1", AuditAction::Created)).unwrap();

    let update = conn.execute("UPDATE exception_history SET action = 'UPDATED'", []);
    assert!(update.is_err());
    let delete = conn.execute("DELETE FROM exception_history", []);
    assert!(delete.is_err());
    assert_eq!(repo.history("e1").unwrap().len(), 1);
}

#[test]
fn test_summary_by_category() {
    let conn = open_in_memory().unwrap();
    let repo = ExceptionRepository::new(&conn);

    repo.insert(&make_test_exception("e1", ExceptionCategory::Parcel, 50.0)).unwrap();
    repo.insert(&make_test_exception("e2", ExceptionCategory::Parcel, 100.0)).unwrap();
    let mut closed = make_test_exception("e3", ExceptionCategory::Noshow, 300.0);
    closed.status = ExceptionStatus::Closed;
    repo.insert(&closed).unwrap();

    let all = repo.summary_by_category(false).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(repo.count_by_category(ExceptionCategory::Noshow).unwrap(), 1);

    let open = repo.summary_by_category(true).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].category, ExceptionCategory::Parcel);
    assert_eq!(open[0].count, 2);
    assert_eq!(open[0].total_financial_impact, 150.0);
}

#[test]
fn test_list_open_orders_by_severity() {
    let conn = open_in_memory().unwrap();
    let repo = ExceptionRepository::new(&conn);

    let mut medium = make_test_exception("e1", ExceptionCategory::Atraso, 0.0);
    medium.severity = Severity::Medium;
    repo.insert(&medium).unwrap();
    let mut critical = make_test_exception("e2", ExceptionCategory::Extraviado, 900.0);
    critical.severity = Severity::Critical;
    repo.insert(&critical).unwrap();

    let open = repo.list_open().unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].exception_id, "e2");
}
