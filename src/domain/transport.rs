// ==========================================
// 物流枢纽流转系统 - 运输与核对领域模型
// ==========================================
// Transport: 一段实物运输 (入库 / 出库)
// Conference: 针对一段运输的数量核对
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ConferenceStatus, Direction, TransportStatus};

// ==========================================
// Transport - 运输段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub transport_id: String,
    pub direction: Direction,
    pub total_count: i64,
    pub status: TransportStatus,
    pub driver_id: Option<String>,     // 出库运输必须指派司机
    pub intake_id: Option<String>,     // 入库运输来源批次
    pub conference_id: Option<String>, // 关联核对
    pub route_id: Option<String>,      // 关联配送线路
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transport {
    pub fn new(transport_id: impl Into<String>, direction: Direction, total_count: i64) -> Self {
        Self {
            transport_id: transport_id.into(),
            direction,
            total_count,
            status: TransportStatus::Created,
            driver_id: None,
            intake_id: None,
            conference_id: None,
            route_id: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_driver(mut self, driver_id: impl Into<String>) -> Self {
        self.driver_id = Some(driver_id.into());
        self
    }

    /// 是否已指派司机 (空白字符串视为未指派)
    pub fn has_driver(&self) -> bool {
        self.driver_id
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }
}

// ==========================================
// Conference - 数量核对
// ==========================================
// 红线: counted_count 只在 DONE 时有意义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub conference_id: String,
    pub transport_id: Option<String>,
    pub direction: Direction,
    pub expected_count: i64,
    pub counted_count: Option<i64>,
    pub status: ConferenceStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conference {
    pub fn new(
        conference_id: impl Into<String>,
        transport_id: Option<String>,
        direction: Direction,
        expected_count: i64,
    ) -> Self {
        Self {
            conference_id: conference_id.into(),
            transport_id,
            direction,
            expected_count,
            counted_count: None,
            status: ConferenceStatus::Pending,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// 核对记录的最终件数
    ///
    /// DONE 时取实点数; 实点数缺失则回退到预期件数
    pub fn recorded_final_count(&self) -> i64 {
        match (self.status, self.counted_count) {
            (ConferenceStatus::Done, Some(counted)) => counted,
            _ => self.expected_count,
        }
    }
}
