// ==========================================
// 物流枢纽流转系统 - 运输 / 核对仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::transport::{Conference, Transport};
use crate::domain::types::{ConferenceStatus, TransportStatus};
use crate::repository::error::RepositoryResult;

const SELECT_TRANSPORT: &str = r#"
    SELECT transport_id, direction, total_count, status, driver_id, intake_id,
           conference_id, route_id, completed_at, created_at
    FROM transport
"#;

const SELECT_CONFERENCE: &str = r#"
    SELECT conference_id, transport_id, direction, expected_count, counted_count,
           status, completed_at, created_at
    FROM conference
"#;

// ==========================================
// TransportRepository - 运输仓储
// ==========================================
pub struct TransportRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TransportRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, transport: &Transport) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO transport (
                transport_id, direction, total_count, status, driver_id, intake_id,
                conference_id, route_id, completed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                transport.transport_id,
                transport.direction,
                transport.total_count,
                transport.status,
                transport.driver_id,
                transport.intake_id,
                transport.conference_id,
                transport.route_id,
                transport.completed_at,
                transport.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, transport_id: &str) -> RepositoryResult<Option<Transport>> {
        let sql = format!("{} WHERE transport_id = ?1", SELECT_TRANSPORT);
        let transport = self
            .conn
            .query_row(&sql, params![transport_id], map_transport)
            .optional()?;
        Ok(transport)
    }

    /// 按线路查找运输 (多条时取最早创建的一条)
    pub fn find_by_route(&self, route_id: &str) -> RepositoryResult<Option<Transport>> {
        let sql = format!(
            "{} WHERE route_id = ?1 ORDER BY created_at ASC, rowid ASC LIMIT 1",
            SELECT_TRANSPORT
        );
        let transport = self
            .conn
            .query_row(&sql, params![route_id], map_transport)
            .optional()?;
        Ok(transport)
    }

    pub fn list_by_intake(&self, intake_id: &str) -> RepositoryResult<Vec<Transport>> {
        let sql = format!("{} WHERE intake_id = ?1 ORDER BY rowid ASC", SELECT_TRANSPORT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![intake_id], map_transport)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn link_conference(&self, transport_id: &str, conference_id: &str) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE transport SET conference_id = ?2 WHERE transport_id = ?1",
            params![transport_id, conference_id],
        )?;
        Ok(changed)
    }

    pub fn link_route(&self, transport_id: &str, route_id: &str) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE transport SET route_id = ?2 WHERE transport_id = ?1",
            params![transport_id, route_id],
        )?;
        Ok(changed)
    }

    /// 更新状态 (completed_at 为 None 时保留原值)
    pub fn update_status(
        &self,
        transport_id: &str,
        status: TransportStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            r#"
            UPDATE transport
            SET status = ?2, completed_at = COALESCE(?3, completed_at)
            WHERE transport_id = ?1
            "#,
            params![transport_id, status, completed_at],
        )?;
        Ok(changed)
    }
}

// ==========================================
// ConferenceRepository - 核对仓储
// ==========================================
pub struct ConferenceRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ConferenceRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, conference: &Conference) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO conference (
                conference_id, transport_id, direction, expected_count, counted_count,
                status, completed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                conference.conference_id,
                conference.transport_id,
                conference.direction,
                conference.expected_count,
                conference.counted_count,
                conference.status,
                conference.completed_at,
                conference.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, conference_id: &str) -> RepositoryResult<Option<Conference>> {
        let sql = format!("{} WHERE conference_id = ?1", SELECT_CONFERENCE);
        let conference = self
            .conn
            .query_row(&sql, params![conference_id], map_conference)
            .optional()?;
        Ok(conference)
    }

    pub fn list_by_transport(&self, transport_id: &str) -> RepositoryResult<Vec<Conference>> {
        let sql = format!("{} WHERE transport_id = ?1 ORDER BY rowid ASC", SELECT_CONFERENCE);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![transport_id], map_conference)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 录入核对结果 (外部核对动作)
    pub fn record_count(
        &self,
        conference_id: &str,
        status: ConferenceStatus,
        counted_count: Option<i64>,
    ) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE conference SET status = ?2, counted_count = ?3 WHERE conference_id = ?1",
            params![conference_id, status, counted_count],
        )?;
        Ok(changed)
    }

    pub fn stamp_completed(&self, conference_id: &str, at: DateTime<Utc>) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE conference SET completed_at = ?2 WHERE conference_id = ?1 AND completed_at IS NULL",
            params![conference_id, at],
        )?;
        Ok(changed)
    }
}

fn map_transport(row: &Row<'_>) -> rusqlite::Result<Transport> {
    Ok(Transport {
        transport_id: row.get(0)?,
        direction: row.get(1)?,
        total_count: row.get(2)?,
        status: row.get(3)?,
        driver_id: row.get(4)?,
        intake_id: row.get(5)?,
        conference_id: row.get(6)?,
        route_id: row.get(7)?,
        completed_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_conference(row: &Row<'_>) -> rusqlite::Result<Conference> {
    Ok(Conference {
        conference_id: row.get(0)?,
        transport_id: row.get(1)?,
        direction: row.get(2)?,
        expected_count: row.get(3)?,
        counted_count: row.get(4)?,
        status: row.get(5)?,
        completed_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}
