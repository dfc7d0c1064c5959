// ==========================================
// 揽收完成 → 在途回枢纽
// ==========================================

use tracing::info;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::domain::order::tracking_labels;
use crate::domain::types::OrderStatus;
use crate::engine::detectors;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{CollectionRepository, OrderRepository, TrackingEventRepository};

pub fn react(ctx: &ReactorContext<'_>, collection_id: &str) -> EngineResult<ReactorOutcome> {
    let collections = CollectionRepository::new(ctx.conn);
    let collection = collections
        .find_by_id(collection_id)?
        .ok_or_else(|| EngineError::missing("collection", collection_id))?;
    let order = OrderRepository::new(ctx.conn)
        .find_by_id(&collection.order_id)?
        .ok_or_else(|| EngineError::missing("order", &collection.order_id))?;

    let mut outcome = ReactorOutcome::default();

    let completed_at = match collection.completed_at {
        Some(at) => at,
        None => {
            collections.update_status(collection_id, collection.status, Some(ctx.now))?;
            ctx.now
        }
    };

    if let Some(finding) = detectors::pickup_delay(
        &order.order_id,
        collection.scheduled_at,
        completed_at,
        ctx.config.pickup_delay_threshold_minutes,
    ) {
        outcome.record_at(
            ctx,
            finding,
            ExceptionContext::for_order(order.order_id.clone()),
            Actor::System,
            completed_at,
        )?;
    }

    if outcome.advance_order(ctx, &order, OrderStatus::InTransit)? {
        TrackingEventRepository::new(ctx.conn).append(
            &order.order_id,
            tracking_labels::IN_TRANSIT_TO_HUB,
            &ctx.config.hub_location,
            ctx.now,
        )?;
    }

    info!(
        collection_id = %collection_id,
        order_id = %order.order_id,
        delayed = !outcome.exceptions.is_empty(),
        "揽收完成"
    );
    Ok(outcome)
}
