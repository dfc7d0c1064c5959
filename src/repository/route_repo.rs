// ==========================================
// 物流枢纽流转系统 - 线路 / 站点仓储
// ==========================================
// 红线: (route_id, sequence_number) 唯一, 由库表约束兜底
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::route::{Route, Stop};
use crate::domain::types::{RouteStatus, StopStatus};
use crate::repository::error::RepositoryResult;

// ==========================================
// RouteRepository - 配送线路
// ==========================================
pub struct RouteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> RouteRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, route: &Route) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO route (route_id, driver_id, stop_count, status, created_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                route.route_id,
                route.driver_id,
                route.stop_count,
                route.status,
                route.created_at,
                route.finished_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, route_id: &str) -> RepositoryResult<Option<Route>> {
        let route = self
            .conn
            .query_row(
                r#"
                SELECT route_id, driver_id, stop_count, status, created_at, finished_at
                FROM route WHERE route_id = ?1
                "#,
                params![route_id],
                |row| {
                    Ok(Route {
                        route_id: row.get(0)?,
                        driver_id: row.get(1)?,
                        stop_count: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                        finished_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(route)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM route", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn set_stop_count(&self, route_id: &str, stop_count: i64) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE route SET stop_count = ?2 WHERE route_id = ?1",
            params![route_id, stop_count],
        )?;
        Ok(changed)
    }

    pub fn update_status(&self, route_id: &str, status: RouteStatus) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE route SET status = ?2 WHERE route_id = ?1",
            params![route_id, status],
        )?;
        Ok(changed)
    }

    pub fn stamp_finished(&self, route_id: &str, at: DateTime<Utc>) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE route SET finished_at = ?2 WHERE route_id = ?1 AND finished_at IS NULL",
            params![route_id, at],
        )?;
        Ok(changed)
    }
}

// ==========================================
// StopRepository - 投递站点
// ==========================================
pub struct StopRepository<'a> {
    conn: &'a Connection,
}

impl<'a> StopRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, stop: &Stop) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO stop (stop_id, route_id, order_id, sequence_number, status, delivered_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                stop.stop_id,
                stop.route_id,
                stop.order_id,
                stop.sequence_number,
                stop.status,
                stop.delivered_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_by_route(&self, route_id: &str) -> RepositoryResult<Vec<Stop>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT stop_id, route_id, order_id, sequence_number, status, delivered_at
            FROM stop WHERE route_id = ?1 ORDER BY sequence_number ASC
            "#,
        )?;
        let rows = stmt.query_map(params![route_id], map_stop)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_pending(&self, route_id: &str) -> RepositoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM stop WHERE route_id = ?1 AND status = ?2",
            params![route_id, StopStatus::Pending],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 更新站点状态 (外部投递确认)
    pub fn update_status(&self, route_id: &str, order_id: &str, status: StopStatus) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE stop SET status = ?3 WHERE route_id = ?1 AND order_id = ?2",
            params![route_id, order_id, status],
        )?;
        Ok(changed)
    }

    /// 标记投递完成
    pub fn mark_delivered(&self, route_id: &str, order_id: &str, at: DateTime<Utc>) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            r#"
            UPDATE stop SET status = ?3, delivered_at = COALESCE(delivered_at, ?4)
            WHERE route_id = ?1 AND order_id = ?2
            "#,
            params![route_id, order_id, StopStatus::Delivered, at],
        )?;
        Ok(changed)
    }
}

fn map_stop(row: &Row<'_>) -> rusqlite::Result<Stop> {
    Ok(Stop {
        stop_id: row.get(0)?,
        route_id: row.get(1)?,
        order_id: row.get(2)?,
        sequence_number: row.get(3)?,
        status: row.get(4)?,
        delivered_at: row.get(5)?,
    })
}
