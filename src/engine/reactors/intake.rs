// ==========================================
// 收货完成 → 生成入库运输与入库核对
// ==========================================

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::domain::order::tracking_labels;
use crate::domain::transport::{Conference, Transport};
use crate::domain::types::{Direction, IntakeStatus, OrderStatus};
use crate::engine::detectors::{self, CountCheckpoint};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{EntityMutation, MutationOrigin};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{
    ConferenceRepository, IntakeRepository, OrderRepository, TrackingEventRepository,
    TransportRepository,
};

pub fn react(ctx: &ReactorContext<'_>, intake_id: &str) -> EngineResult<ReactorOutcome> {
    let intakes = IntakeRepository::new(ctx.conn);
    let intake = intakes
        .find_by_id(intake_id)?
        .ok_or_else(|| EngineError::missing("intake", intake_id))?;

    if intake.status != IntakeStatus::Done {
        return Err(EngineError::Validation(format!(
            "收货批次 {} 状态为 {}, 不能完成收货",
            intake_id, intake.status
        )));
    }

    // 完成时间只写一次, 写过即视为已处理
    if intakes.stamp_completion(intake_id, ctx.now)? == 0 {
        debug!(intake_id = %intake_id, "收货完成时间已存在, 跳过");
        return Ok(ReactorOutcome::duplicate());
    }

    let mut outcome = ReactorOutcome::default();
    let orders_repo = OrderRepository::new(ctx.conn);
    let orders = orders_repo.list_by_intake(intake_id)?;
    let actual = orders.len() as i64;

    if let Some(finding) = detectors::count_divergence(
        CountCheckpoint::Intake,
        intake.expected_count,
        actual,
        ctx.config.unit_penalty,
    ) {
        outcome.record(ctx, finding, ExceptionContext::for_intake(intake_id), Actor::System)?;
    }

    // 入库运输 + 入库核对
    let transports = TransportRepository::new(ctx.conn);
    let conferences = ConferenceRepository::new(ctx.conn);

    let mut transport = Transport::new(Uuid::new_v4().to_string(), Direction::In, actual);
    transport.intake_id = Some(intake_id.to_string());
    transports.insert(&transport)?;

    let conference = Conference::new(
        Uuid::new_v4().to_string(),
        Some(transport.transport_id.clone()),
        Direction::In,
        actual,
    );
    conferences.insert(&conference)?;
    transports.link_conference(&transport.transport_id, &conference.conference_id)?;
    transport.conference_id = Some(conference.conference_id.clone());

    orders_repo.assign_transport_for_intake(intake_id, &transport.transport_id)?;

    let tracking = TrackingEventRepository::new(ctx.conn);
    for order in &orders {
        let mut order = order.clone();
        order.transport_id = Some(transport.transport_id.clone());
        if outcome.advance_order(ctx, &order, OrderStatus::AwaitingConference)? {
            tracking.append(&order.order_id, tracking_labels::RECEIVED, &intake.location, ctx.now)?;
        }
    }

    info!(
        intake_id = %intake_id,
        expected = intake.expected_count,
        actual = actual,
        transport_id = %transport.transport_id,
        conference_id = %conference.conference_id,
        "收货完成, 已生成入库运输与核对"
    );

    outcome
        .emitted
        .insert(0, EntityMutation::transport(None, transport, MutationOrigin::Engine));
    outcome.emitted.insert(1, EntityMutation::conference(None, conference));
    Ok(outcome)
}
