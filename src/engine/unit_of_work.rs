// ==========================================
// 物流枢纽流转系统 - 工作单元
// ==========================================
// 规则:
// - 连接处于自动提交模式: 开启 BEGIN IMMEDIATE 事务 (SQLite 下即可串行化)
// - 调用方已持有事务: 以 SAVEPOINT 加入, 失败时只回滚到保存点
// - 任一错误: 全部回滚并原样返回错误
// ==========================================

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::engine::error::EngineResult;

static SAVEPOINT_SEQ: AtomicU64 = AtomicU64::new(0);

/// 在一个工作单元内执行闭包
pub fn run_in_unit_of_work<T, F>(conn: &Connection, f: F) -> EngineResult<T>
where
    F: FnOnce(&Connection) -> EngineResult<T>,
{
    if conn.is_autocommit() {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "事务回滚失败");
                }
                Err(err)
            }
        }
    } else {
        let name = format!("uow_{}", SAVEPOINT_SEQ.fetch_add(1, Ordering::Relaxed));
        conn.execute_batch(&format!("SAVEPOINT {}", name))?;
        debug!(savepoint = %name, "加入调用方事务");

        match f(conn) {
            Ok(value) => {
                conn.execute_batch(&format!("RELEASE SAVEPOINT {}", name))?;
                Ok(value)
            }
            Err(err) => {
                let rollback = format!("ROLLBACK TO SAVEPOINT {0}; RELEASE SAVEPOINT {0};", name);
                if let Err(rollback_err) = conn.execute_batch(&rollback) {
                    warn!(savepoint = %name, error = %rollback_err, "保存点回滚失败");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::EngineError;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_commits_own_transaction() {
        let conn = setup();
        run_in_unit_of_work(&conn, |c| {
            c.execute("INSERT INTO t VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_rolls_back_own_transaction() {
        let conn = setup();
        let result: EngineResult<()> = run_in_unit_of_work(&conn, |c| {
            c.execute("INSERT INTO t VALUES (1)", [])?;
            Err(EngineError::Validation("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_joins_caller_transaction_with_savepoint() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        tx.execute("INSERT INTO t VALUES (1)", []).unwrap();

        let failed: EngineResult<()> = run_in_unit_of_work(&tx, |c| {
            c.execute("INSERT INTO t VALUES (2)", [])?;
            Err(EngineError::Validation("boom".to_string()))
        });
        assert!(failed.is_err());

        run_in_unit_of_work(&tx, |c| {
            c.execute("INSERT INTO t VALUES (3)", [])?;
            Ok(())
        })
        .unwrap();

        // 仍在调用方事务内
        assert!(!tx.is_autocommit());
        tx.commit().unwrap();

        let values: Vec<i64> = {
            let mut stmt = conn.prepare("SELECT v FROM t ORDER BY v").unwrap();
            let rows = stmt.query_map([], |row| row.get(0)).unwrap();
            rows.collect::<Result<Vec<_>, _>>().unwrap()
        };
        assert_eq!(values, vec![1, 3]);
    }
}
