// ==========================================
// 物流枢纽流转系统 - 阶段反应器
// ==========================================
// 每个反应器对应阶段图的一条边
// 反应器内只做存储写入, 级联变更以 EntityMutation 交回分发循环
// ==========================================

pub mod collection;
pub mod inbound_conference;
pub mod intake;
pub mod manual;
pub mod outbound_conference;
pub mod route_finalization;
pub mod separation;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::domain::exception::{Actor, ExceptionContext, PipelineException};
use crate::domain::order::Order;
use crate::domain::types::OrderStatus;
use crate::engine::detectors::Finding;
use crate::engine::error::EngineResult;
use crate::engine::estimators;
use crate::engine::events::{EntityMutation, MutationOrigin};
use crate::engine::policy::PolicyHooks;
use crate::engine::recorder::ExceptionRecorder;
use crate::repository::OrderRepository;

/// 反应器运行上下文
pub struct ReactorContext<'a> {
    pub conn: &'a Connection,
    pub config: &'a PipelineConfig,
    pub policies: &'a PolicyHooks,
    pub now: DateTime<Utc>,
}

impl<'a> ReactorContext<'a> {
    pub fn order_value(&self, order: &Order) -> f64 {
        estimators::order_value_impact(self.policies.valuation.as_ref(), order)
    }
}

/// 反应器产出
#[derive(Debug, Default)]
pub struct ReactorOutcome {
    pub exceptions: Vec<PipelineException>,
    pub emitted: Vec<EntityMutation>,
    /// 存储层判定该跨越已处理过
    pub duplicate: bool,
    pub skipped_orders: Vec<String>,
}

impl ReactorOutcome {
    pub fn duplicate() -> Self {
        Self {
            duplicate: true,
            ..Self::default()
        }
    }

    /// 登记检出的异常 (发生时刻取反应器时钟)
    pub fn record(
        &mut self,
        ctx: &ReactorContext<'_>,
        finding: Finding,
        context: ExceptionContext,
        actor: Actor,
    ) -> EngineResult<()> {
        self.record_at(ctx, finding, context, actor, ctx.now)
    }

    /// 登记检出的异常, 指定发生时刻
    pub fn record_at(
        &mut self,
        ctx: &ReactorContext<'_>,
        finding: Finding,
        context: ExceptionContext,
        actor: Actor,
        occurred_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        let new = finding
            .into_new_exception(context, actor)
            .with_occurred_at(occurred_at);
        let exception = ExceptionRecorder::record(ctx.conn, new)?;
        self.exceptions.push(exception);
        Ok(())
    }

    /// 推进订单状态
    ///
    /// 状态不允许前进 (已越过目标 / 已取消 / 已异常) 时跳过并返回 false
    pub fn advance_order(
        &mut self,
        ctx: &ReactorContext<'_>,
        order: &Order,
        next: OrderStatus,
    ) -> EngineResult<bool> {
        if !order.status.can_advance_to(next) {
            warn!(
                order_id = %order.order_id,
                from = %order.status,
                to = %next,
                "订单状态不可推进, 跳过"
            );
            self.skipped_orders.push(order.order_id.clone());
            return Ok(false);
        }
        if order.status == next {
            return Ok(true);
        }

        let orders = OrderRepository::new(ctx.conn);
        orders.update_status(&order.order_id, next)?;
        if let Some(after) = orders.find_by_id(&order.order_id)? {
            self.emitted.push(EntityMutation::order(
                Some(order.clone()),
                after,
                MutationOrigin::Engine,
            ));
        }
        Ok(true)
    }
}
