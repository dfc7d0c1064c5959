use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::domain::exception::{AuditEntry, ExceptionContext, PipelineException};
use crate::repository::error::{RepositoryError, RepositoryResult};

pub(super) const SELECT_EXCEPTION: &str = r#"
    SELECT exception_id, occurrence_code, category, severity, status, title, description,
           order_id, transport_id, intake_id, route_id, conference_id,
           reported_by, assignee, resolution_note, financial_impact,
           occurred_at, created_at, updated_at, resolved_at
    FROM pipeline_exception
"#;

// ==========================================
// ExceptionRepository - 异常仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ExceptionRepository<'a> {
    pub(super) conn: &'a Connection,
}

impl<'a> ExceptionRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入异常主记录
    pub fn insert(&self, exception: &PipelineException) -> RepositoryResult<()> {
        let ctx = &exception.context;
        self.conn.execute(
            r#"
            INSERT INTO pipeline_exception (
                exception_id, occurrence_code, category, severity, status, title, description,
                order_id, transport_id, intake_id, route_id, conference_id,
                reported_by, assignee, resolution_note, financial_impact,
                occurred_at, created_at, updated_at, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
            params![
                exception.exception_id,
                exception.occurrence_code,
                exception.category,
                exception.severity,
                exception.status,
                exception.title,
                exception.description,
                ctx.order_id,
                ctx.transport_id,
                ctx.intake_id,
                ctx.route_id,
                ctx.conference_id,
                exception.reported_by,
                exception.assignee,
                exception.resolution_note,
                exception.financial_impact,
                exception.occurred_at,
                exception.created_at,
                exception.updated_at,
                exception.resolved_at,
            ],
        )?;
        Ok(())
    }

    /// 覆盖可变字段 (状态/等级/描述/处理人/结论/金额)
    ///
    /// 只由 ExceptionService 调用, 调用方负责同时追加历史
    pub fn update_mutable_fields(&self, exception: &PipelineException) -> RepositoryResult<()> {
        let changed = self.conn.execute(
            r#"
            UPDATE pipeline_exception
            SET status = ?2, severity = ?3, description = ?4, assignee = ?5,
                resolution_note = ?6, financial_impact = ?7, updated_at = ?8, resolved_at = ?9
            WHERE exception_id = ?1
            "#,
            params![
                exception.exception_id,
                exception.status,
                exception.severity,
                exception.description,
                exception.assignee,
                exception.resolution_note,
                exception.financial_impact,
                exception.updated_at,
                exception.resolved_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::not_found("pipeline_exception", &exception.exception_id));
        }
        Ok(())
    }

    /// 追加一条审计历史, seq 由库内已有最大值 + 1 决定
    pub fn append_history(&self, entry: &AuditEntry) -> RepositoryResult<i64> {
        let seq = self.next_history_seq(&entry.exception_id)?;
        self.conn.execute(
            r#"
            INSERT INTO exception_history (
                exception_id, seq, recorded_at, action, actor, field, old_value, new_value
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.exception_id,
                seq,
                entry.recorded_at,
                entry.action.as_str(),
                entry.actor,
                entry.field,
                entry.old_value,
                entry.new_value,
            ],
        )?;
        Ok(seq)
    }

    fn next_history_seq(&self, exception_id: &str) -> RepositoryResult<i64> {
        let seq: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM exception_history WHERE exception_id = ?1",
            params![exception_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }
}

pub(super) fn map_exception(row: &Row<'_>) -> rusqlite::Result<PipelineException> {
    Ok(PipelineException {
        exception_id: row.get(0)?,
        occurrence_code: row.get(1)?,
        category: row.get(2)?,
        severity: row.get(3)?,
        status: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        context: ExceptionContext {
            order_id: row.get(7)?,
            transport_id: row.get(8)?,
            intake_id: row.get(9)?,
            route_id: row.get(10)?,
            conference_id: row.get(11)?,
        },
        reported_by: row.get(12)?,
        assignee: row.get(13)?,
        resolution_note: row.get(14)?,
        financial_impact: row.get(15)?,
        occurred_at: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
        resolved_at: row.get::<_, Option<DateTime<Utc>>>(19)?,
    })
}
