// ==========================================
// 物流枢纽流转系统 - 运营异常领域模型
// ==========================================
// 红线: 每次检出的异常只登记一次
// 红线: 审计历史只追加, 不改写
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::types::{ExceptionCategory, ExceptionStatus, ParseEnumError, Severity};

// ==========================================
// Actor - 操作人
// ==========================================
// 自动登记统一使用 System, 人工操作携带用户ID
// 存储格式: "system" / "user:<id>"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    System,
    User(String),
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Actor::User(id.into())
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::System => f.write_str("system"),
            Actor::User(id) => write!(f, "user:{}", id),
        }
    }
}

impl FromStr for Actor {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "system" {
            return Ok(Actor::System);
        }
        match s.strip_prefix("user:") {
            Some(id) if !id.is_empty() => Ok(Actor::User(id.to_string())),
            _ => Err(ParseEnumError {
                kind: "操作人",
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for Actor {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Actor {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
    }
}

// ==========================================
// ExceptionContext - 关联实体
// ==========================================
// 至少关联 Order / Transport / Intake 之一
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionContext {
    pub order_id: Option<String>,
    pub transport_id: Option<String>,
    pub intake_id: Option<String>,
    pub route_id: Option<String>,
    pub conference_id: Option<String>,
}

impl ExceptionContext {
    pub fn for_order(order_id: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            ..Self::default()
        }
    }

    pub fn for_transport(transport_id: impl Into<String>) -> Self {
        Self {
            transport_id: Some(transport_id.into()),
            ..Self::default()
        }
    }

    pub fn for_intake(intake_id: impl Into<String>) -> Self {
        Self {
            intake_id: Some(intake_id.into()),
            ..Self::default()
        }
    }

    pub fn with_transport(mut self, transport_id: Option<String>) -> Self {
        if transport_id.is_some() {
            self.transport_id = transport_id;
        }
        self
    }

    pub fn with_route(mut self, route_id: Option<String>) -> Self {
        if route_id.is_some() {
            self.route_id = route_id;
        }
        self
    }

    pub fn with_conference(mut self, conference_id: Option<String>) -> Self {
        if conference_id.is_some() {
            self.conference_id = conference_id;
        }
        self
    }

    /// 是否满足最小关联要求
    pub fn has_required_anchor(&self) -> bool {
        self.order_id.is_some() || self.transport_id.is_some() || self.intake_id.is_some()
    }
}

// ==========================================
// NewException - 待登记异常
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NewException {
    pub category: ExceptionCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub context: ExceptionContext,
    pub actor: Actor,
    pub occurred_at: Option<DateTime<Utc>>, // 缺省为登记时刻
    pub financial_impact: f64,
}

impl NewException {
    pub fn new(
        category: ExceptionCategory,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        context: ExceptionContext,
    ) -> Self {
        Self {
            category,
            severity,
            title: title.into(),
            description: description.into(),
            context,
            actor: Actor::System,
            occurred_at: None,
            financial_impact: 0.0,
        }
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_financial_impact(mut self, amount: f64) -> Self {
        self.financial_impact = amount;
        self
    }

    pub fn with_occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }
}

// ==========================================
// PipelineException - 已登记异常
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineException {
    pub exception_id: String,
    pub occurrence_code: String, // EXC-YYYYMMDD-XXXXXXXX
    pub category: ExceptionCategory,
    pub severity: Severity,
    pub status: ExceptionStatus,
    pub title: String,
    pub description: String,
    pub context: ExceptionContext,
    pub reported_by: Actor,
    pub assignee: Option<String>,
    pub resolution_note: Option<String>,
    pub financial_impact: f64,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

// ==========================================
// AuditEntry - 审计历史
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Created,
    Updated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "CREATED",
            AuditAction::Updated => "UPDATED",
        }
    }
}

impl FromStr for AuditAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "CREATED" => Ok(AuditAction::Created),
            "UPDATED" => Ok(AuditAction::Updated),
            other => Err(ParseEnumError {
                kind: "审计动作",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub exception_id: String,
    pub seq: i64,
    pub recorded_at: DateTime<Utc>,
    pub action: AuditAction,
    pub actor: Actor,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

// ==========================================
// ExceptionPatch - 外部修改
// ==========================================
// 每个实际变化的字段追加一条历史
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionPatch {
    pub status: Option<ExceptionStatus>,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub resolution_note: Option<String>,
    pub financial_impact: Option<f64>,
}

impl ExceptionPatch {
    pub fn status(status: ExceptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_storage_format() {
        assert_eq!(Actor::System.to_string(), "system");
        assert_eq!(Actor::user("u42").to_string(), "user:u42");
        assert_eq!("user:u42".parse::<Actor>().unwrap(), Actor::user("u42"));
        assert_eq!("system".parse::<Actor>().unwrap(), Actor::System);
        assert!("user:".parse::<Actor>().is_err());
        assert!("robot".parse::<Actor>().is_err());
    }

    #[test]
    fn test_context_anchor() {
        assert!(!ExceptionContext::default().has_required_anchor());
        let ctx = ExceptionContext::default().with_route(Some("R1".to_string()));
        assert!(!ctx.has_required_anchor());
        assert!(ExceptionContext::for_transport("T1").has_required_anchor());
    }

    #[test]
    fn test_empty_patch() {
        assert!(ExceptionPatch::default().is_empty());
        assert!(!ExceptionPatch::status(ExceptionStatus::Closed).is_empty());
    }
}
