// ==========================================
// 入库核对完成 → 入库上架
// ==========================================

use tracing::info;
use uuid::Uuid;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::domain::order::{tracking_labels, StockEntry};
use crate::domain::types::{OrderStatus, TransportStatus};
use crate::engine::detectors::{self, CountCheckpoint};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{EntityMutation, MutationOrigin};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{
    ConferenceRepository, OrderRepository, StockEntryRepository, TrackingEventRepository,
    TransportRepository,
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
    let orders_repo = OrderRepository::new(ctx.conn);
    let actual = orders_repo.count_by_transport(&transport_id)?;
    let recorded = conference.recorded_final_count();

    if let Some(finding) = detectors::count_divergence(
        CountCheckpoint::InboundConference,
        recorded,
        actual,
        ctx.config.unit_penalty,
    ) {
        let context = ExceptionContext::for_transport(transport_id.clone())
            .with_conference(Some(conference_id.to_string()));
        outcome.record(ctx, finding, context, Actor::System)?;
    }

    // 运输 → 已到达
    if transport.status != TransportStatus::Received {
        if !transport.status.can_transition_to(TransportStatus::Received) {
            return Err(EngineError::InvalidTransition {
                entity: "transport",
                from: transport.status.to_string(),
                to: TransportStatus::Received.to_string(),
            });
        }
        transports.update_status(&transport_id, TransportStatus::Received, Some(ctx.now))?;
        if let Some(after) = transports.find_by_id(&transport_id)? {
            outcome.emitted.push(EntityMutation::transport(
                Some(transport.clone()),
                after,
                MutationOrigin::Engine,
            ));
        }
    }

    let stock = StockEntryRepository::new(ctx.conn);
    let tracking = TrackingEventRepository::new(ctx.conn);
    let mut stocked = 0usize;

    for order in orders_repo.list_by_transport(&transport_id)? {
        // 货损检查覆盖运输上的全部订单, 与能否上架无关
        if let Some(finding) = detectors::damaged_order(
            &order.order_id,
            ctx.policies.inspection.is_damaged(&order),
            ctx.order_value(&order),
        ) {
            let context = ExceptionContext::for_order(order.order_id.clone())
                .with_transport(Some(transport_id.clone()))
                .with_conference(Some(conference_id.to_string()));
            outcome.record(ctx, finding, context, Actor::System)?;
        }

        if !outcome.advance_order(ctx, &order, OrderStatus::InStock)? {
            continue;
        }
        orders_repo.link_conference(&order.order_id, conference_id)?;
        stock.insert(&StockEntry {
            stock_entry_id: Uuid::new_v4().to_string(),
            order_id: order.order_id.clone(),
            quantity: 1,
            location: ctx.config.stock_location.clone(),
            entry_time: ctx.now,
        })?;
        tracking.append(&order.order_id, tracking_labels::STOCKED, &ctx.config.hub_location, ctx.now)?;
        stocked += 1;
    }

    conferences.stamp_completed(conference_id, ctx.now)?;

    info!(
        conference_id = %conference_id,
        transport_id = %transport_id,
        recorded = recorded,
        actual = actual,
        stocked = stocked,
        "入库核对完成, 订单已上架"
    );
    Ok(outcome)
}
