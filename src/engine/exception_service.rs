// ==========================================
// 物流枢纽流转系统 - 异常处理服务
// ==========================================
// 职责: 外部对已登记异常的修改 (状态流转 / 指派 / 结论)
// 红线: 每个实际变化的字段追加一条 UPDATED 历史, 不改写已有历史
// ==========================================

use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::domain::exception::{Actor, AuditAction, AuditEntry, ExceptionPatch, PipelineException};
use crate::domain::types::ExceptionStatus;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::unit_of_work::run_in_unit_of_work;
use crate::repository::{ExceptionRepository, RepositoryError};

pub struct ExceptionService;

impl ExceptionService {
    /// 修改异常
    ///
    /// # 返回
    /// 修改后的异常; 补丁与现值完全一致时不写历史
    pub fn update(
        conn: &Connection,
        exception_id: &str,
        patch: ExceptionPatch,
        actor: Actor,
    ) -> EngineResult<PipelineException> {
        run_in_unit_of_work(conn, |conn| {
            let repo = ExceptionRepository::new(conn);
            let current = repo
                .find_by_id(exception_id)?
                .ok_or_else(|| RepositoryError::not_found("pipeline_exception", exception_id))?;

            let now = Utc::now();
            let mut next = current.clone();
            let mut changes: Vec<(&'static str, Option<String>, Option<String>)> = Vec::new();

            if let Some(status) = patch.status {
                if status != current.status {
                    if !current.status.can_transition_to(status) {
                        return Err(EngineError::InvalidTransition {
                            entity: "pipeline_exception",
                            from: current.status.to_string(),
                            to: status.to_string(),
                        });
                    }
                    next.status = status;
                    next.resolved_at = match status {
                        ExceptionStatus::Resolved => Some(now),
                        ExceptionStatus::Closed => current.resolved_at,
                        _ => None,
                    };
                    changes.push((
                        "status",
                        Some(current.status.to_string()),
                        Some(status.to_string()),
                    ));
                }
            }

            if let Some(severity) = patch.severity {
                if severity != current.severity {
                    next.severity = severity;
                    changes.push((
                        "severity",
                        Some(current.severity.to_string()),
                        Some(severity.to_string()),
                    ));
                }
            }

            if let Some(description) = patch.description {
                if description != current.description {
                    changes.push((
                        "description",
                        Some(current.description.clone()),
                        Some(description.clone()),
                    ));
                    next.description = description;
                }
            }

            if let Some(assignee) = patch.assignee {
                if current.assignee.as_deref() != Some(assignee.as_str()) {
                    changes.push(("assignee", current.assignee.clone(), Some(assignee.clone())));
                    next.assignee = Some(assignee);
                }
            }

            if let Some(note) = patch.resolution_note {
                if current.resolution_note.as_deref() != Some(note.as_str()) {
                    changes.push((
                        "resolution_note",
                        current.resolution_note.clone(),
                        Some(note.clone()),
                    ));
                    next.resolution_note = Some(note);
                }
            }

            if let Some(amount) = patch.financial_impact {
                if !amount.is_finite() || amount < 0.0 {
                    return Err(EngineError::Validation(format!("异常金额无效: {}", amount)));
                }
                if amount != current.financial_impact {
                    changes.push((
                        "financial_impact",
                        Some(current.financial_impact.to_string()),
                        Some(amount.to_string()),
                    ));
                    next.financial_impact = amount;
                }
            }

            if changes.is_empty() {
                return Ok(current);
            }

            next.updated_at = now;
            repo.update_mutable_fields(&next)?;

            for (field, old_value, new_value) in changes {
                repo.append_history(&AuditEntry {
                    exception_id: next.exception_id.clone(),
                    seq: 0,
                    recorded_at: now,
                    action: AuditAction::Updated,
                    actor: actor.clone(),
                    field: Some(field.to_string()),
                    old_value,
                    new_value,
                })?;
            }

            info!(
                exception_id = %next.exception_id,
                status = %next.status,
                actor = %actor,
                "异常已更新"
            );
            Ok(next)
        })
    }
}
