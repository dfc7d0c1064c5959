// ==========================================
// 物流枢纽流转系统 - 作业任务仓储 (拣货 / 揽收)
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::order::{Collection, Separation};
use crate::domain::types::{CollectionStatus, SeparationStatus};
use crate::repository::error::RepositoryResult;

// ==========================================
// SeparationRepository - 拣货任务
// ==========================================
pub struct SeparationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SeparationRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, separation: &Separation) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO separation (separation_id, order_id, status, separated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                separation.separation_id,
                separation.order_id,
                separation.status,
                separation.separated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, separation_id: &str) -> RepositoryResult<Option<Separation>> {
        let separation = self
            .conn
            .query_row(
                "SELECT separation_id, order_id, status, separated_at FROM separation WHERE separation_id = ?1",
                params![separation_id],
                |row| {
                    Ok(Separation {
                        separation_id: row.get(0)?,
                        order_id: row.get(1)?,
                        status: row.get(2)?,
                        separated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(separation)
    }

    pub fn update_status(&self, separation_id: &str, status: SeparationStatus) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE separation SET status = ?2 WHERE separation_id = ?1",
            params![separation_id, status],
        )?;
        Ok(changed)
    }

    pub fn stamp_separated(&self, separation_id: &str, at: DateTime<Utc>) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            "UPDATE separation SET separated_at = ?2 WHERE separation_id = ?1 AND separated_at IS NULL",
            params![separation_id, at],
        )?;
        Ok(changed)
    }
}

// ==========================================
// CollectionRepository - 揽收任务
// ==========================================
pub struct CollectionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CollectionRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, collection: &Collection) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO collection (collection_id, order_id, status, scheduled_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                collection.collection_id,
                collection.order_id,
                collection.status,
                collection.scheduled_at,
                collection.completed_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, collection_id: &str) -> RepositoryResult<Option<Collection>> {
        let collection = self
            .conn
            .query_row(
                r#"
                SELECT collection_id, order_id, status, scheduled_at, completed_at
                FROM collection WHERE collection_id = ?1
                "#,
                params![collection_id],
                |row| {
                    Ok(Collection {
                        collection_id: row.get(0)?,
                        order_id: row.get(1)?,
                        status: row.get(2)?,
                        scheduled_at: row.get(3)?,
                        completed_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(collection)
    }

    /// 更新状态 (completed_at 为 None 时保留原值)
    pub fn update_status(
        &self,
        collection_id: &str,
        status: CollectionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<usize> {
        let changed = self.conn.execute(
            r#"
            UPDATE collection
            SET status = ?2, completed_at = COALESCE(?3, completed_at)
            WHERE collection_id = ?1
            "#,
            params![collection_id, status, completed_at],
        )?;
        Ok(changed)
    }
}
