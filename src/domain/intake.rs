// ==========================================
// 物流枢纽流转系统 - 收货批次领域模型
// ==========================================
// 红线: completion_time 只在 DONE 时写入一次
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::IntakeStatus;

/// 到达枢纽的一批货物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    pub intake_id: String,
    pub location: String,                       // 收货枢纽
    pub expected_count: i64,                    // 预报件数
    pub status: IntakeStatus,
    pub completion_time: Option<DateTime<Utc>>, // 收货完成时间 (由引擎写入)
    pub created_at: DateTime<Utc>,
}

impl Intake {
    pub fn new(intake_id: impl Into<String>, location: impl Into<String>, expected_count: i64) -> Self {
        Self {
            intake_id: intake_id.into(),
            location: location.into(),
            expected_count,
            status: IntakeStatus::Pending,
            completion_time: None,
            created_at: Utc::now(),
        }
    }

    /// 是否已完成收货结算
    pub fn is_completed(&self) -> bool {
        self.completion_time.is_some()
    }
}
