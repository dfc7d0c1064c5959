// ==========================================
// 物流枢纽流转系统 - 收货批次仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::intake::Intake;
use crate::domain::types::IntakeStatus;
use crate::repository::error::RepositoryResult;

const SELECT_INTAKE: &str = r#"
    SELECT intake_id, location, expected_count, status, completion_time, created_at
    FROM intake
"#;

pub struct IntakeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> IntakeRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, intake: &Intake) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO intake (intake_id, location, expected_count, status, completion_time, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                intake.intake_id,
                intake.location,
                intake.expected_count,
                intake.status,
                intake.completion_time,
                intake.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, intake_id: &str) -> RepositoryResult<Option<Intake>> {
        let sql = format!("{} WHERE intake_id = ?1", SELECT_INTAKE);
        let intake = self
            .conn
            .query_row(&sql, params![intake_id], map_intake)
            .optional()?;
        Ok(intake)
    }

    pub fn update_status(&self, intake_id: &str, status: IntakeStatus) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE intake SET status = ?2 WHERE intake_id = ?1",
            params![intake_id, status],
        )?;
        Ok(changed)
    }

    /// 写入收货完成时间
    ///
    /// 只在 completion_time 为空时生效, 返回受影响行数 (0 表示已写过)
    pub fn stamp_completion(&self, intake_id: &str, at: DateTime<Utc>) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE intake SET completion_time = ?2 WHERE intake_id = ?1 AND completion_time IS NULL",
            params![intake_id, at],
        )?;
        Ok(changed)
    }
}

fn map_intake(row: &Row<'_>) -> rusqlite::Result<Intake> {
    Ok(Intake {
        intake_id: row.get(0)?,
        location: row.get(1)?,
        expected_count: row.get(2)?,
        status: row.get(3)?,
        completion_time: row.get(4)?,
        created_at: row.get(5)?,
    })
}
