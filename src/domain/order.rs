// ==========================================
// 物流枢纽流转系统 - 订单及其附属记录
// ==========================================
// Order: 一个可发运单元
// StockEntry / Separation / Collection / Shipment / TrackingEvent
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CollectionStatus, OrderStatus, SeparationStatus};

// ==========================================
// Order - 订单
// ==========================================
// 关联字段随流转重新指派
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub reference: String, // 外部单号
    pub status: OrderStatus,
    pub intake_id: Option<String>,
    pub transport_id: Option<String>,
    pub conference_id: Option<String>,
    pub route_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_id: impl Into<String>, reference: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            order_id: order_id.into(),
            reference: reference.into(),
            status: OrderStatus::Pending,
            intake_id: None,
            transport_id: None,
            conference_id: None,
            route_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn in_intake(mut self, intake_id: impl Into<String>) -> Self {
        self.intake_id = Some(intake_id.into());
        self
    }

    pub fn on_transport(mut self, transport_id: impl Into<String>) -> Self {
        self.transport_id = Some(transport_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }
}

/// 库位记录 (每个订单入库一次)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub stock_entry_id: String,
    pub order_id: String,
    pub quantity: i64,
    pub location: String,
    pub entry_time: DateTime<Utc>,
}

/// 拣货任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Separation {
    pub separation_id: String,
    pub order_id: String,
    pub status: SeparationStatus,
    pub separated_at: Option<DateTime<Utc>>,
}

impl Separation {
    pub fn new(separation_id: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            separation_id: separation_id.into(),
            order_id: order_id.into(),
            status: SeparationStatus::Pending,
            separated_at: None,
        }
    }
}

/// 揽收任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub collection_id: String,
    pub order_id: String,
    pub status: CollectionStatus,
    pub scheduled_at: DateTime<Utc>,         // 约定揽收时间
    pub completed_at: Option<DateTime<Utc>>, // 实际揽收时间
}

impl Collection {
    pub fn new(
        collection_id: impl Into<String>,
        order_id: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            collection_id: collection_id.into(),
            order_id: order_id.into(),
            status: CollectionStatus::Pending,
            scheduled_at,
            completed_at: None,
        }
    }
}

/// 发运记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub order_id: String,
    pub transport_id: Option<String>,
    pub carrier_note: String,
    pub tracking_code: String,
    pub dispatched_at: DateTime<Utc>,
}

/// 物流轨迹 (只追加)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub event_id: String,
    pub order_id: String,
    pub status_label: String,
    pub location: String,
    pub occurred_at: DateTime<Utc>,
}

/// 轨迹节点标签
pub mod tracking_labels {
    pub const RECEIVED: &str = "RECEIVED";
    pub const STOCKED: &str = "STOCKED";
    pub const READY_FOR_SHIPPING: &str = "READY_FOR_SHIPPING";
    pub const EN_ROUTE: &str = "EN_ROUTE";
    pub const IN_TRANSIT_TO_HUB: &str = "IN_TRANSIT_TO_HUB";
    pub const DELIVERED: &str = "DELIVERED";
}
