// ==========================================
// 物流枢纽流转系统 - 异常登记
// ==========================================
// 登记 = 一条 OPEN 异常 + 一条 CREATED 审计历史
// 占用调用方连接 (通常是反应器所在的保存点)
// ==========================================

use chrono::Utc;
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use crate::domain::exception::{AuditAction, AuditEntry, NewException, PipelineException};
use crate::domain::types::ExceptionStatus;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::ExceptionRepository;

pub struct ExceptionRecorder;

impl ExceptionRecorder {
    /// 登记一条异常
    ///
    /// # 校验
    /// - 至少关联 Order / Transport / Intake 之一
    /// - 标题非空
    /// - 金额有限且非负
    pub fn record(conn: &Connection, new: NewException) -> EngineResult<PipelineException> {
        if !new.context.has_required_anchor() {
            return Err(EngineError::Validation(
                "异常必须关联订单 / 运输 / 收货批次之一".to_string(),
            ));
        }
        if new.title.trim().is_empty() {
            return Err(EngineError::Validation("异常标题不能为空".to_string()));
        }
        if !new.financial_impact.is_finite() || new.financial_impact < 0.0 {
            return Err(EngineError::Validation(format!(
                "异常金额无效: {}",
                new.financial_impact
            )));
        }

        let now = Utc::now();
        let exception = PipelineException {
            exception_id: Uuid::new_v4().to_string(),
            occurrence_code: occurrence_code(now),
            category: new.category,
            severity: new.severity,
            status: ExceptionStatus::Open,
            title: new.title,
            description: new.description,
            context: new.context,
            reported_by: new.actor,
            assignee: None,
            resolution_note: None,
            financial_impact: new.financial_impact,
            occurred_at: new.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };

        let repo = ExceptionRepository::new(conn);
        repo.insert(&exception)?;
        repo.append_history(&AuditEntry {
            exception_id: exception.exception_id.clone(),
            seq: 1,
            recorded_at: now,
            action: AuditAction::Created,
            actor: exception.reported_by.clone(),
            field: None,
            old_value: None,
            new_value: Some(exception.status.to_string()),
        })?;

        warn!(
            exception_id = %exception.exception_id,
            code = %exception.occurrence_code,
            category = %exception.category,
            severity = %exception.severity,
            financial_impact = exception.financial_impact,
            "登记运营异常"
        );

        Ok(exception)
    }
}

/// 事件编号: EXC-YYYYMMDD-XXXXXXXX
fn occurrence_code(at: chrono::DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("EXC-{}-{}", at.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::exception::{Actor, ExceptionContext};
    use crate::domain::intake::Intake;
    use crate::domain::types::{ExceptionCategory, Severity};
    use crate::repository::IntakeRepository;

    #[test]
    fn test_record_creates_open_exception_with_history() {
        let conn = open_in_memory().unwrap();
        IntakeRepository::new(&conn)
            .insert(&Intake::new("I1", "HUB-01", 10))
            .unwrap();

        let new = NewException::new(
            ExceptionCategory::Divergence,
            Severity::High,
            "收货数量差异",
            "预期 10 件, 实际 8 件",
            ExceptionContext::for_intake("I1"),
        )
        .with_financial_impact(200.0);

        let recorded = ExceptionRecorder::record(&conn, new).unwrap();
        assert_eq!(recorded.status, ExceptionStatus::Open);
        assert_eq!(recorded.reported_by, Actor::System);
        assert!(recorded.occurrence_code.starts_with("EXC-"));
        assert_eq!(recorded.occurrence_code.len(), "EXC-YYYYMMDD-XXXXXXXX".len());

        let history = ExceptionRepository::new(&conn)
            .history(&recorded.exception_id)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, AuditAction::Created);
        assert_eq!(history[0].seq, 1);
    }

    #[test]
    fn test_record_rejects_missing_anchor() {
        let conn = open_in_memory().unwrap();
        let new = NewException::new(
            ExceptionCategory::Outros,
            Severity::Low,
            "无关联",
            "",
            ExceptionContext::default().with_route(Some("R1".to_string())),
        );
        let err = ExceptionRecorder::record(&conn, new).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_record_rejects_negative_impact() {
        let conn = open_in_memory().unwrap();
        let new = NewException::new(
            ExceptionCategory::Outros,
            Severity::Low,
            "负金额",
            "",
            ExceptionContext::for_order("O1"),
        )
        .with_financial_impact(-1.0);
        assert!(ExceptionRecorder::record(&conn, new).is_err());
    }
}
