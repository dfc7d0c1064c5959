// ==========================================
// 物流枢纽流转系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键 / busy_timeout)
// - 提供引擎运行所需的最小建表脚本 (非迁移工具)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存库并建表 (测试 / 演练用)
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表 (幂等)
///
/// 只追加表 (tracking_event / exception_history) 用触发器禁止 UPDATE / DELETE
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL DEFAULT 'global',
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS intake (
          intake_id TEXT PRIMARY KEY,
          location TEXT NOT NULL,
          expected_count INTEGER NOT NULL,
          status TEXT NOT NULL,
          completion_time TEXT,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS route (
          route_id TEXT PRIMARY KEY,
          driver_id TEXT,
          stop_count INTEGER NOT NULL DEFAULT 0,
          status TEXT NOT NULL,
          created_at TEXT NOT NULL,
          finished_at TEXT
        );

        CREATE TABLE IF NOT EXISTS transport (
          transport_id TEXT PRIMARY KEY,
          direction TEXT NOT NULL,
          total_count INTEGER NOT NULL DEFAULT 0,
          status TEXT NOT NULL,
          driver_id TEXT,
          intake_id TEXT REFERENCES intake(intake_id),
          conference_id TEXT REFERENCES conference(conference_id),
          route_id TEXT REFERENCES route(route_id),
          completed_at TEXT,
          created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transport_route ON transport(route_id);

        CREATE TABLE IF NOT EXISTS conference (
          conference_id TEXT PRIMARY KEY,
          transport_id TEXT REFERENCES transport(transport_id),
          direction TEXT NOT NULL,
          expected_count INTEGER NOT NULL,
          counted_count INTEGER,
          status TEXT NOT NULL,
          completed_at TEXT,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS orders (
          order_id TEXT PRIMARY KEY,
          reference TEXT NOT NULL,
          status TEXT NOT NULL,
          intake_id TEXT REFERENCES intake(intake_id),
          transport_id TEXT REFERENCES transport(transport_id),
          conference_id TEXT REFERENCES conference(conference_id),
          route_id TEXT REFERENCES route(route_id),
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_intake ON orders(intake_id);
        CREATE INDEX IF NOT EXISTS idx_orders_transport ON orders(transport_id);

        CREATE TABLE IF NOT EXISTS stock_entry (
          stock_entry_id TEXT PRIMARY KEY,
          order_id TEXT NOT NULL UNIQUE REFERENCES orders(order_id),
          quantity INTEGER NOT NULL,
          location TEXT NOT NULL,
          entry_time TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS separation (
          separation_id TEXT PRIMARY KEY,
          order_id TEXT NOT NULL REFERENCES orders(order_id),
          status TEXT NOT NULL,
          separated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS collection (
          collection_id TEXT PRIMARY KEY,
          order_id TEXT NOT NULL REFERENCES orders(order_id),
          status TEXT NOT NULL,
          scheduled_at TEXT NOT NULL,
          completed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS stop (
          stop_id TEXT PRIMARY KEY,
          route_id TEXT NOT NULL REFERENCES route(route_id),
          order_id TEXT NOT NULL REFERENCES orders(order_id),
          sequence_number INTEGER NOT NULL,
          status TEXT NOT NULL,
          delivered_at TEXT,
          UNIQUE (route_id, sequence_number),
          UNIQUE (route_id, order_id)
        );

        CREATE TABLE IF NOT EXISTS shipment (
          shipment_id TEXT PRIMARY KEY,
          order_id TEXT NOT NULL REFERENCES orders(order_id),
          transport_id TEXT REFERENCES transport(transport_id),
          carrier_note TEXT NOT NULL,
          tracking_code TEXT NOT NULL UNIQUE,
          dispatched_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tracking_event (
          event_id TEXT PRIMARY KEY,
          order_id TEXT NOT NULL REFERENCES orders(order_id),
          status_label TEXT NOT NULL,
          location TEXT NOT NULL,
          occurred_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tracking_event_order ON tracking_event(order_id);

        CREATE TRIGGER IF NOT EXISTS trg_tracking_event_no_update
        BEFORE UPDATE ON tracking_event
        BEGIN
          SELECT RAISE(ABORT, 'tracking_event is append-only');
        END;
        CREATE TRIGGER IF NOT EXISTS trg_tracking_event_no_delete
        BEFORE DELETE ON tracking_event
        BEGIN
          SELECT RAISE(ABORT, 'tracking_event is append-only');
        END;

        CREATE TABLE IF NOT EXISTS pipeline_exception (
          exception_id TEXT PRIMARY KEY,
          occurrence_code TEXT NOT NULL UNIQUE,
          category TEXT NOT NULL,
          severity TEXT NOT NULL,
          status TEXT NOT NULL,
          title TEXT NOT NULL,
          description TEXT NOT NULL,
          order_id TEXT,
          transport_id TEXT,
          intake_id TEXT,
          route_id TEXT,
          conference_id TEXT,
          reported_by TEXT NOT NULL,
          assignee TEXT,
          resolution_note TEXT,
          financial_impact REAL NOT NULL DEFAULT 0,
          occurred_at TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          resolved_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_pipeline_exception_order ON pipeline_exception(order_id);
        CREATE INDEX IF NOT EXISTS idx_pipeline_exception_status ON pipeline_exception(status);

        CREATE TABLE IF NOT EXISTS exception_history (
          exception_id TEXT NOT NULL REFERENCES pipeline_exception(exception_id),
          seq INTEGER NOT NULL,
          recorded_at TEXT NOT NULL,
          action TEXT NOT NULL,
          actor TEXT NOT NULL,
          field TEXT,
          old_value TEXT,
          new_value TEXT,
          PRIMARY KEY (exception_id, seq)
        );

        CREATE TRIGGER IF NOT EXISTS trg_exception_history_no_update
        BEFORE UPDATE ON exception_history
        BEGIN
          SELECT RAISE(ABORT, 'exception_history is append-only');
        END;
        CREATE TRIGGER IF NOT EXISTS trg_exception_history_no_delete
        BEFORE DELETE ON exception_history
        BEGIN
          SELECT RAISE(ABORT, 'exception_history is append-only');
        END;

        CREATE TABLE IF NOT EXISTS stage_crossing (
          transition TEXT NOT NULL,
          entity_id TEXT NOT NULL,
          crossed_at TEXT NOT NULL,
          PRIMARY KEY (transition, entity_id)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
