// ==========================================
// 拣货完成 → 待发运
// ==========================================

use tracing::info;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::domain::order::tracking_labels;
use crate::domain::types::OrderStatus;
use crate::engine::detectors;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{
    OrderRepository, SeparationRepository, StockEntryRepository, TrackingEventRepository,
};

pub fn react(ctx: &ReactorContext<'_>, separation_id: &str) -> EngineResult<ReactorOutcome> {
    let separations = SeparationRepository::new(ctx.conn);
    let separation = separations
        .find_by_id(separation_id)?
        .ok_or_else(|| EngineError::missing("separation", separation_id))?;
    let order = OrderRepository::new(ctx.conn)
        .find_by_id(&separation.order_id)?
        .ok_or_else(|| EngineError::missing("order", &separation.order_id))?;

    let mut outcome = ReactorOutcome::default();
    separations.stamp_separated(separation_id, ctx.now)?;

    // 无库存只登记, 不阻断
    let has_stock = StockEntryRepository::new(ctx.conn).has_positive_stock(&order.order_id)?;
    if let Some(finding) = detectors::missing_stock(&order.order_id, has_stock, ctx.order_value(&order)) {
        let context = ExceptionContext::for_order(order.order_id.clone())
            .with_transport(order.transport_id.clone());
        outcome.record(ctx, finding, context, Actor::System)?;
    }

    if outcome.advance_order(ctx, &order, OrderStatus::AwaitingShipment)? {
        TrackingEventRepository::new(ctx.conn).append(
            &order.order_id,
            tracking_labels::READY_FOR_SHIPPING,
            &ctx.config.hub_location,
            ctx.now,
        )?;
    }

    info!(
        separation_id = %separation_id,
        order_id = %order.order_id,
        has_stock = has_stock,
        "拣货完成"
    );
    Ok(outcome)
}
