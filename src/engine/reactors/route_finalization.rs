// ==========================================
// 线路结束 → 投递完成
// ==========================================

use tracing::info;
use uuid::Uuid;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::domain::order::{tracking_labels, Shipment};
use crate::domain::types::{OrderStatus, TransportStatus};
use crate::engine::detectors;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{EntityMutation, MutationOrigin};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{
    OrderRepository, RouteRepository, ShipmentRepository, StopRepository,
    TrackingEventRepository, TransportRepository,
};

pub fn react(ctx: &ReactorContext<'_>, route_id: &str) -> EngineResult<ReactorOutcome> {
    let routes = RouteRepository::new(ctx.conn);
    routes
        .find_by_id(route_id)?
        .ok_or_else(|| EngineError::missing("route", route_id))?;

    let transports = TransportRepository::new(ctx.conn);
    let transport = transports
        .find_by_route(route_id)?
        .ok_or_else(|| EngineError::missing("transport", route_id))?;
    let transport_id = transport.transport_id.clone();

    let mut outcome = ReactorOutcome::default();
    let stops = StopRepository::new(ctx.conn);

    // 先统计未投递站点, 再整体投递
    let pending = stops.count_pending(route_id)?;
    if let Some(finding) = detectors::pending_stops(route_id, pending, ctx.config.per_stop_penalty) {
        let context = ExceptionContext::for_transport(transport_id.clone())
            .with_route(Some(route_id.to_string()));
        outcome.record(ctx, finding, context, Actor::System)?;
    }

    if transport.status != TransportStatus::Delivered {
        if !transport.status.can_transition_to(TransportStatus::Delivered) {
            return Err(EngineError::InvalidTransition {
                entity: "transport",
                from: transport.status.to_string(),
                to: TransportStatus::Delivered.to_string(),
            });
        }
        transports.update_status(&transport_id, TransportStatus::Delivered, Some(ctx.now))?;
        if let Some(after) = transports.find_by_id(&transport_id)? {
            outcome.emitted.push(EntityMutation::transport(
                Some(transport.clone()),
                after,
                MutationOrigin::Engine,
            ));
        }
    }

    let shipments = ShipmentRepository::new(ctx.conn);
    let tracking = TrackingEventRepository::new(ctx.conn);
    let mut delivered = 0usize;

    for order in OrderRepository::new(ctx.conn).list_by_transport(&transport_id)? {
        if !outcome.advance_order(ctx, &order, OrderStatus::Delivered)? {
            continue;
        }
        shipments.insert(&Shipment {
            shipment_id: Uuid::new_v4().to_string(),
            order_id: order.order_id.clone(),
            transport_id: Some(transport_id.clone()),
            carrier_note: ctx.config.carrier_note.clone(),
            tracking_code: tracking_code(),
            dispatched_at: ctx.now,
        })?;
        tracking.append(&order.order_id, tracking_labels::DELIVERED, &ctx.config.hub_location, ctx.now)?;
        stops.mark_delivered(route_id, &order.order_id, ctx.now)?;
        delivered += 1;
    }

    routes.stamp_finished(route_id, ctx.now)?;

    info!(
        route_id = %route_id,
        transport_id = %transport_id,
        pending_stops = pending,
        delivered = delivered,
        "线路结束, 投递完成"
    );
    Ok(outcome)
}

fn tracking_code() -> String {
    format!("TRK-{}", Uuid::new_v4().simple().to_string()[..12].to_uppercase())
}
