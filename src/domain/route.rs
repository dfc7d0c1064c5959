// ==========================================
// 物流枢纽流转系统 - 配送线路领域模型
// ==========================================
// 红线: stop_count 必须等于该线路的站点数, sequence_number 连续无空洞
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{RouteStatus, StopStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub driver_id: Option<String>,
    pub stop_count: i64,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Route {
    pub fn new(route_id: impl Into<String>, driver_id: Option<String>) -> Self {
        Self {
            route_id: route_id.into(),
            driver_id,
            stop_count: 0,
            status: RouteStatus::Created,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// 线路上一个订单的投递位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    pub route_id: String,
    pub order_id: String,
    pub sequence_number: i64, // 1..N
    pub status: StopStatus,
    pub delivered_at: Option<DateTime<Utc>>,
}
