// ==========================================
// 物流枢纽流转系统 - 轨迹 / 发运仓储
// ==========================================
// 红线: tracking_event 只追加 (库表触发器兜底)
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::domain::order::{Shipment, TrackingEvent};
use crate::repository::error::RepositoryResult;

// ==========================================
// TrackingEventRepository - 物流轨迹
// ==========================================
pub struct TrackingEventRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TrackingEventRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 追加一条轨迹
    pub fn append(
        &self,
        order_id: &str,
        status_label: &str,
        location: &str,
        occurred_at: DateTime<Utc>,
    ) -> RepositoryResult<TrackingEvent> {
        let event = TrackingEvent {
            event_id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            status_label: status_label.to_string(),
            location: location.to_string(),
            occurred_at,
        };
        self.conn.execute(
            r#"
            INSERT INTO tracking_event (event_id, order_id, status_label, location, occurred_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                event.event_id,
                event.order_id,
                event.status_label,
                event.location,
                event.occurred_at,
            ],
        )?;
        Ok(event)
    }

    /// 订单轨迹时间线 (按追加顺序)
    pub fn timeline(&self, order_id: &str) -> RepositoryResult<Vec<TrackingEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT event_id, order_id, status_label, location, occurred_at
            FROM tracking_event WHERE order_id = ?1
            ORDER BY rowid ASC
            "#,
        )?;
        let rows = stmt.query_map(params![order_id], |row| {
            Ok(TrackingEvent {
                event_id: row.get(0)?,
                order_id: row.get(1)?,
                status_label: row.get(2)?,
                location: row.get(3)?,
                occurred_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_by_label(&self, status_label: &str) -> RepositoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracking_event WHERE status_label = ?1",
            params![status_label],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ==========================================
// ShipmentRepository - 发运记录
// ==========================================
pub struct ShipmentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ShipmentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, shipment: &Shipment) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO shipment (shipment_id, order_id, transport_id, carrier_note, tracking_code, dispatched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                shipment.shipment_id,
                shipment.order_id,
                shipment.transport_id,
                shipment.carrier_note,
                shipment.tracking_code,
                shipment.dispatched_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_by_order(&self, order_id: &str) -> RepositoryResult<Vec<Shipment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT shipment_id, order_id, transport_id, carrier_note, tracking_code, dispatched_at
            FROM shipment WHERE order_id = ?1 ORDER BY rowid ASC
            "#,
        )?;
        let rows = stmt.query_map(params![order_id], |row| {
            Ok(Shipment {
                shipment_id: row.get(0)?,
                order_id: row.get(1)?,
                transport_id: row.get(2)?,
                carrier_note: row.get(3)?,
                tracking_code: row.get(4)?,
                dispatched_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
