use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::core::{map_exception, ExceptionRepository, SELECT_EXCEPTION};
use crate::domain::exception::{Actor, AuditAction, AuditEntry, PipelineException};
use crate::domain::types::{ExceptionCategory, ExceptionStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 按分类汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: ExceptionCategory,
    pub count: i64,
    pub total_financial_impact: f64,
}

impl<'a> ExceptionRepository<'a> {
    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, exception_id: &str) -> RepositoryResult<Option<PipelineException>> {
        let sql = format!("{} WHERE exception_id = ?1", SELECT_EXCEPTION);
        let exception = self
            .conn
            .query_row(&sql, params![exception_id], map_exception)
            .optional()?;
        Ok(exception)
    }

    pub fn list_by_order(&self, order_id: &str) -> RepositoryResult<Vec<PipelineException>> {
        let sql = format!("{} WHERE order_id = ?1 ORDER BY rowid ASC", SELECT_EXCEPTION);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![order_id], map_exception)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_by_category(&self, category: ExceptionCategory) -> RepositoryResult<Vec<PipelineException>> {
        let sql = format!("{} WHERE category = ?1 ORDER BY rowid ASC", SELECT_EXCEPTION);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![category], map_exception)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 未结异常 (OPEN / IN_ANALYSIS), 严重等级高者在前
    pub fn list_open(&self) -> RepositoryResult<Vec<PipelineException>> {
        let sql = format!(
            r#"{} WHERE status IN (?1, ?2)
            ORDER BY CASE severity
                WHEN 'CRITICAL' THEN 0 WHEN 'HIGH' THEN 1 WHEN 'MEDIUM' THEN 2 ELSE 3 END,
                occurred_at ASC"#,
            SELECT_EXCEPTION
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![ExceptionStatus::Open, ExceptionStatus::InAnalysis],
            map_exception,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_by_category(&self, category: ExceptionCategory) -> RepositoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pipeline_exception WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 按分类汇总数量与损失金额 (可选仅统计未结)
    pub fn summary_by_category(&self, open_only: bool) -> RepositoryResult<Vec<CategorySummary>> {
        let sql = if open_only {
            r#"
            SELECT category, COUNT(*), COALESCE(SUM(financial_impact), 0)
            FROM pipeline_exception WHERE status IN ('OPEN', 'IN_ANALYSIS')
            GROUP BY category ORDER BY category
            "#
        } else {
            r#"
            SELECT category, COUNT(*), COALESCE(SUM(financial_impact), 0)
            FROM pipeline_exception
            GROUP BY category ORDER BY category
            "#
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(CategorySummary {
                category: row.get(0)?,
                count: row.get(1)?,
                total_financial_impact: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 审计历史 (按 seq 升序)
    pub fn history(&self, exception_id: &str) -> RepositoryResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT exception_id, seq, recorded_at, action, actor, field, old_value, new_value
            FROM exception_history WHERE exception_id = ?1 ORDER BY seq ASC
            "#,
        )?;
        let rows = stmt.query_map(params![exception_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, DateTime<Utc>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Actor>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (exception_id, seq, recorded_at, action, actor, field, old_value, new_value) = row?;
            let action: AuditAction = action.parse().map_err(|e| RepositoryError::FieldValueError {
                field: "action".to_string(),
                message: format!("{}", e),
            })?;
            entries.push(AuditEntry {
                exception_id,
                seq,
                recorded_at,
                action,
                actor,
                field,
                old_value,
                new_value,
            });
        }
        Ok(entries)
    }
}
