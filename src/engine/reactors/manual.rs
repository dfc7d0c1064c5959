// ==========================================
// 人工操作响应 (软失败)
// ==========================================
// - 订单被人工标记为 EXCEPTION → OUTROS
// - 运输被取消 → EXTRAVIADO
// 两者失败只记日志, 不影响触发写入
// ==========================================

use tracing::info;

use crate::domain::exception::{Actor, ExceptionContext};
use crate::engine::detectors;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::reactors::{ReactorContext, ReactorOutcome};
use crate::repository::{OrderRepository, TransportRepository};

pub fn order_marked_exception(
    ctx: &ReactorContext<'_>,
    order_id: &str,
    actor: Actor,
) -> EngineResult<ReactorOutcome> {
    let order = OrderRepository::new(ctx.conn)
        .find_by_id(order_id)?
        .ok_or_else(|| EngineError::missing("order", order_id))?;

    let mut outcome = ReactorOutcome::default();
    let finding = detectors::manual_order_exception(order_id, ctx.order_value(&order));
    let context = ExceptionContext::for_order(order_id.to_string())
        .with_transport(order.transport_id.clone())
        .with_route(order.route_id.clone());
    outcome.record(ctx, finding, context, actor)?;

    info!(order_id = %order_id, "订单人工标记异常已登记");
    Ok(outcome)
}

pub fn transport_cancelled(
    ctx: &ReactorContext<'_>,
    transport_id: &str,
    actor: Actor,
) -> EngineResult<ReactorOutcome> {
    let transport = TransportRepository::new(ctx.conn)
        .find_by_id(transport_id)?
        .ok_or_else(|| EngineError::missing("transport", transport_id))?;
    let order_count = OrderRepository::new(ctx.conn).count_by_transport(transport_id)?;

    let mut outcome = ReactorOutcome::default();
    let finding = detectors::cancelled_transport(transport_id, order_count, ctx.config.per_order_penalty);
    let context = ExceptionContext::for_transport(transport_id.to_string())
        .with_route(transport.route_id.clone());
    outcome.record(ctx, finding, context, actor)?;

    info!(
        transport_id = %transport_id,
        order_count = order_count,
        "运输取消已登记"
    );
    Ok(outcome)
}
