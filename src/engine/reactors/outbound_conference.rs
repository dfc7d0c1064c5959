// ==========================================
// 出库核对完成 → 生成配送线路
// ==========================================
// 无司机: 登记 NOSHOW 并停止, 不生成线路
// 站点序号按装车顺序从 1 连续编号, 跳过的订单不占序号
// ==========================================

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::domain::order::tracking_labels;
use crate::domain::route::{Route, Stop};
use crate::domain::types::{OrderStatus, StopStatus, TransportStatus};
use crate::engine::detectors;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{EntityMutation, MutationOrigin};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{
    ConferenceRepository, OrderRepository, RouteRepository, StopRepository,
    TrackingEventRepository, TransportRepository,
};

pub fn react(ctx: &ReactorContext<'_>, conference_id: &str) -> EngineResult<ReactorOutcome> {
    let conferences = ConferenceRepository::new(ctx.conn);
    let conference = conferences
        .find_by_id(conference_id)?
        .ok_or_else(|| EngineError::missing("conference", conference_id))?;
    let transport_id = conference
        .transport_id
        .clone()
        .ok_or_else(|| EngineError::missing("transport", conference_id))?;

    let transports = TransportRepository::new(ctx.conn);
    let transport = transports
        .find_by_id(&transport_id)?
        .ok_or_else(|| EngineError::missing("transport", &transport_id))?;

    let mut outcome = ReactorOutcome::default();
    conferences.stamp_completed(conference_id, ctx.now)?;

    if let Some(finding) = detectors::missing_driver(
        &transport_id,
        transport.has_driver(),
        ctx.config.noshow_penalty,
    ) {
        let context = ExceptionContext::for_transport(transport_id.clone())
            .with_conference(Some(conference_id.to_string()));
        outcome.record(ctx, finding, context, Actor::System)?;
        warn!(transport_id = %transport_id, "出库运输无司机, 不生成线路");
        return Ok(outcome);
    }

    if !transport.status.can_transition_to(TransportStatus::InTransit) {
        return Err(EngineError::InvalidTransition {
            entity: "transport",
            from: transport.status.to_string(),
            to: TransportStatus::InTransit.to_string(),
        });
    }

    let routes = RouteRepository::new(ctx.conn);
    let mut route = Route::new(Uuid::new_v4().to_string(), transport.driver_id.clone());
    routes.insert(&route)?;
    transports.link_route(&transport_id, &route.route_id)?;
    transports.update_status(&transport_id, TransportStatus::InTransit, None)?;
    if let Some(after) = transports.find_by_id(&transport_id)? {
        outcome.emitted.push(EntityMutation::transport(
            Some(transport.clone()),
            after,
            MutationOrigin::Engine,
        ));
    }

    let orders_repo = OrderRepository::new(ctx.conn);
    let stops = StopRepository::new(ctx.conn);
    let tracking = TrackingEventRepository::new(ctx.conn);
    let mut sequence = 0i64;

    for order in orders_repo.list_by_transport(&transport_id)? {
        if !outcome.advance_order(ctx, &order, OrderStatus::EnRoute)? {
            continue;
        }
        sequence += 1;
        orders_repo.link_route(&order.order_id, &route.route_id)?;
        tracking.append(&order.order_id, tracking_labels::EN_ROUTE, &ctx.config.hub_location, ctx.now)?;
        stops.insert(&Stop {
            stop_id: Uuid::new_v4().to_string(),
            route_id: route.route_id.clone(),
            order_id: order.order_id.clone(),
            sequence_number: sequence,
            status: StopStatus::Pending,
            delivered_at: None,
        })?;
    }

    routes.set_stop_count(&route.route_id, sequence)?;
    route.stop_count = sequence;

    info!(
        conference_id = %conference_id,
        transport_id = %transport_id,
        route_id = %route.route_id,
        stop_count = sequence,
        "出库核对完成, 已生成配送线路"
    );

    outcome.emitted.insert(0, EntityMutation::route(None, route));
    Ok(outcome)
}
