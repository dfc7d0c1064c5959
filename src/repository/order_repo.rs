// ==========================================
// 物流枢纽流转系统 - 订单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 说明: 列表查询统一按 (created_at, rowid) 排序, 保证加载顺序稳定
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::order::Order;
use crate::domain::types::OrderStatus;
use crate::repository::error::RepositoryResult;

const SELECT_ORDER: &str = r#"
    SELECT order_id, reference, status, intake_id, transport_id, conference_id,
           route_id, created_at, updated_at
    FROM orders
"#;

pub struct OrderRepository<'a> {
    conn: &'a Connection,
}

impl<'a> OrderRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, order: &Order) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO orders (
                order_id, reference, status, intake_id, transport_id, conference_id,
                route_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                order.order_id,
                order.reference,
                order.status,
                order.intake_id,
                order.transport_id,
                order.conference_id,
                order.route_id,
                order.created_at,
                order.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let sql = format!("{} WHERE order_id = ?1", SELECT_ORDER);
        let order = self
            .conn
            .query_row(&sql, params![order_id], map_order)
            .optional()?;
        Ok(order)
    }

    pub fn list_by_intake(&self, intake_id: &str) -> RepositoryResult<Vec<Order>> {
        self.list_where("intake_id = ?1", intake_id)
    }

    pub fn list_by_transport(&self, transport_id: &str) -> RepositoryResult<Vec<Order>> {
        self.list_where("transport_id = ?1", transport_id)
    }

    pub fn count_by_transport(&self, transport_id: &str) -> RepositoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE transport_id = ?1",
            params![transport_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_where(&self, predicate: &str, value: &str) -> RepositoryResult<Vec<Order>> {
        let sql = format!(
            "{} WHERE {} ORDER BY created_at ASC, rowid ASC",
            SELECT_ORDER, predicate
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![value], map_order)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 批量挂载: 某收货批次下的所有订单挂到指定运输
    pub fn assign_transport_for_intake(&self, intake_id: &str, transport_id: &str) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE orders SET transport_id = ?2, updated_at = ?3 WHERE intake_id = ?1",
            params![intake_id, transport_id, Utc::now()],
        )?;
        Ok(changed)
    }

    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE order_id = ?1",
            params![order_id, status, Utc::now()],
        )?;
        Ok(changed)
    }

    pub fn link_conference(&self, order_id: &str, conference_id: &str) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE orders SET conference_id = ?2, updated_at = ?3 WHERE order_id = ?1",
            params![order_id, conference_id, Utc::now()],
        )?;
        Ok(changed)
    }

    pub fn link_route(&self, order_id: &str, route_id: &str) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE orders SET route_id = ?2, updated_at = ?3 WHERE order_id = ?1",
            params![order_id, route_id, Utc::now()],
        )?;
        Ok(changed)
    }
}

fn map_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        order_id: row.get(0)?,
        reference: row.get(1)?,
        status: row.get(2)?,
        intake_id: row.get(3)?,
        transport_id: row.get(4)?,
        conference_id: row.get(5)?,
        route_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
