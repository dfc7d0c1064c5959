// ==========================================
// 物流枢纽流转系统 - 跨越检测
// ==========================================
// 纯函数: 一次实体变更最多对应一个阶段跨越
// 只在 "前像未满足 且 后像满足" 时判定跨越, 重复保存同一终态不触发
// ==========================================

use crate::domain::types::{
    CollectionStatus, ConferenceStatus, Direction, IntakeStatus, OrderStatus, RouteStatus,
    SeparationStatus, TransportStatus,
};
use crate::engine::events::EntityMutation;
use crate::engine::stage_graph::StageTransition;

/// 检测变更是否跨越某个阶段
pub fn detect_crossing(mutation: &EntityMutation) -> Option<StageTransition> {
    match mutation {
        EntityMutation::Intake { before, after } => {
            // 以完成时间为界: 写过完成时间的批次不再触发
            let stamped = before.as_ref().map(|i| i.is_completed()).unwrap_or(false);
            (!stamped && after.status == IntakeStatus::Done && !after.is_completed())
                .then_some(StageTransition::IntakeCompleted)
        }
        EntityMutation::Conference { before, after } => {
            let was = before
                .as_ref()
                .map(|c| c.status == ConferenceStatus::Done)
                .unwrap_or(false);
            if was || after.status != ConferenceStatus::Done || after.transport_id.is_none() {
                return None;
            }
            match after.direction {
                Direction::In => Some(StageTransition::InboundConferenceCompleted),
                Direction::Out => Some(StageTransition::OutboundConferenceCompleted),
            }
        }
        EntityMutation::Separation { before, after } => {
            let was = before
                .as_ref()
                .map(|s| s.status == SeparationStatus::Separated)
                .unwrap_or(false);
            (!was && after.status == SeparationStatus::Separated)
                .then_some(StageTransition::SeparationCompleted)
        }
        EntityMutation::Collection { before, after } => {
            let was = before
                .as_ref()
                .map(|c| c.status == CollectionStatus::Realized)
                .unwrap_or(false);
            (!was && after.status == CollectionStatus::Realized)
                .then_some(StageTransition::CollectionRealized)
        }
        EntityMutation::Route { before, after } => {
            let was = before
                .as_ref()
                .map(|r| r.status == RouteStatus::Finished)
                .unwrap_or(false);
            (!was && after.status == RouteStatus::Finished).then_some(StageTransition::RouteFinished)
        }
        EntityMutation::Order {
            before,
            after,
            origin,
        } => {
            let was = before
                .as_ref()
                .map(|o| o.status == OrderStatus::Exception)
                .unwrap_or(false);
            (origin.is_external() && !was && after.status == OrderStatus::Exception)
                .then_some(StageTransition::OrderMarkedException)
        }
        EntityMutation::Transport {
            before,
            after,
            origin,
        } => {
            let was = before
                .as_ref()
                .map(|t| t.status == TransportStatus::Cancelled)
                .unwrap_or(false);
            (origin.is_external() && !was && after.status == TransportStatus::Cancelled)
                .then_some(StageTransition::TransportCancelled)
        }
    }
}
