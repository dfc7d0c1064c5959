// ==========================================
// 物流枢纽流转系统 - 阶段跨越台账
// ==========================================
// 职责: 记录 (transition, entity_id) 是否已被处理
// 说明: 主键冲突即视为重复跨越, 由事务隔离保证并发下只有一方成功
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::repository::error::RepositoryResult;

pub struct StageCrossingRepository<'a> {
    conn: &'a Connection,
}

impl<'a> StageCrossingRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 认领一次阶段跨越
    ///
    /// # 返回
    /// - `Ok(true)`: 首次跨越, 认领成功
    /// - `Ok(false)`: 已被处理过
    pub fn claim(&self, transition: &str, entity_id: &str) -> RepositoryResult<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO stage_crossing (transition, entity_id, crossed_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![transition, entity_id, Utc::now()],
        )?;
        Ok(changed == 1)
    }

    pub fn is_claimed(&self, transition: &str, entity_id: &str) -> RepositoryResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM stage_crossing WHERE transition = ?1 AND entity_id = ?2",
            params![transition, entity_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
