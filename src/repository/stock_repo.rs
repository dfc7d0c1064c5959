// ==========================================
// 物流枢纽流转系统 - 库位仓储
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::order::StockEntry;
use crate::repository::error::RepositoryResult;

pub struct StockEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> StockEntryRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, entry: &StockEntry) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO stock_entry (stock_entry_id, order_id, quantity, location, entry_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.stock_entry_id,
                entry.order_id,
                entry.quantity,
                entry.location,
                entry.entry_time,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_order(&self, order_id: &str) -> RepositoryResult<Option<StockEntry>> {
        let entry = self
            .conn
            .query_row(
                r#"
                SELECT stock_entry_id, order_id, quantity, location, entry_time
                FROM stock_entry WHERE order_id = ?1
                "#,
                params![order_id],
                |row| {
                    Ok(StockEntry {
                        stock_entry_id: row.get(0)?,
                        order_id: row.get(1)?,
                        quantity: row.get(2)?,
                        location: row.get(3)?,
                        entry_time: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// 订单是否有正数量库存
    pub fn has_positive_stock(&self, order_id: &str) -> RepositoryResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM stock_entry WHERE order_id = ?1 AND quantity > 0",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
