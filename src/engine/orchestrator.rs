// ==========================================
// 物流枢纽流转系统 - 流转编排器
// ==========================================
// 职责: 接收实体变更, 检测阶段跨越, 按阶段图驱动反应器
// 流程:
//   1. 外层工作单元 (加入调用方事务或自开事务)
//   2. 检测跨越 → 认领跨越台账 → 反应器 (独立保存点)
//   3. 反应器产出的级联变更入队, 深度受 MAX_CASCADE_DEPTH 约束
// 失败语义:
//   - Hard: 错误上抛, 外层工作单元整体回滚
//   - Soft: 仅回滚该反应器的保存点, 记日志后继续
// ==========================================

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, error, info};

use crate::config::PipelineConfig;
use crate::engine::dispatch::detect_crossing;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::EntityMutation;
use crate::engine::policy::PolicyHooks;
use crate::engine::reactors::{self, ReactorContext, ReactorOutcome};
use crate::engine::stage_graph::{FailureMode, StageTransition, MAX_CASCADE_DEPTH};
use crate::engine::unit_of_work::run_in_unit_of_work;
use crate::repository::StageCrossingRepository;

// ==========================================
// DispatchReport - 一次分发的结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// 实际执行的跨越 (按执行顺序)
    pub fired: Vec<StageTransition>,
    /// 被跨越台账拒绝的重复跨越
    pub duplicates: Vec<StageTransition>,
    /// 本次登记的异常ID
    pub exception_ids: Vec<String>,
    /// 被吞掉的软失败错误
    pub swallowed_errors: Vec<String>,
    /// 因状态不可推进而跳过的订单
    pub skipped_orders: Vec<String>,
    /// 处理过的变更数 (含级联)
    pub mutations_seen: usize,
}

impl DispatchReport {
    pub fn fired(&self, transition: StageTransition) -> bool {
        self.fired.contains(&transition)
    }

    fn absorb(&mut self, transition: StageTransition, outcome: &ReactorOutcome) {
        if outcome.duplicate {
            self.duplicates.push(transition);
            return;
        }
        self.fired.push(transition);
        self.exception_ids
            .extend(outcome.exceptions.iter().map(|e| e.exception_id.clone()));
        self.skipped_orders.extend(outcome.skipped_orders.iter().cloned());
    }
}

// ==========================================
// PipelineEngine - 流转引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct PipelineEngine {
    config: PipelineConfig,
    policies: PolicyHooks,
}

impl PipelineEngine {
    pub fn new(config: PipelineConfig, policies: PolicyHooks) -> Self {
        Self { config, policies }
    }

    /// 使用占位策略 (固定货值 + 随机抽检)
    pub fn with_placeholder_policies(config: PipelineConfig) -> Self {
        let policies = PolicyHooks::placeholder(&config);
        Self::new(config, policies)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 处理一次实体变更
    ///
    /// # 参数
    /// - `conn`: 调用方连接; 若已在事务中, 引擎以保存点加入该事务
    /// - `mutation`: 调用方已持久化的变更 (前像 + 后像)
    ///
    /// # 返回
    /// - `Ok(DispatchReport)`: 全部硬失败反应器成功
    /// - `Err`: 任一硬失败反应器出错, 引擎写入全部回滚
    pub fn handle(&self, conn: &Connection, mutation: EntityMutation) -> EngineResult<DispatchReport> {
        run_in_unit_of_work(conn, |conn| self.drive(conn, mutation, 0))
    }

    /// 驱动循环; `start_depth` 为入口变更所处的级联深度
    fn drive(
        &self,
        conn: &Connection,
        mutation: EntityMutation,
        start_depth: usize,
    ) -> EngineResult<DispatchReport> {
        let mut report = DispatchReport::default();
        let mut queue: VecDeque<(EntityMutation, usize)> = VecDeque::new();
        queue.push_back((mutation, start_depth));

        while let Some((mutation, depth)) = queue.pop_front() {
            report.mutations_seen += 1;

            let Some(transition) = detect_crossing(&mutation) else {
                continue;
            };
            if depth > MAX_CASCADE_DEPTH {
                return Err(EngineError::CascadeDepthExceeded {
                    depth,
                    transition: transition.to_string(),
                });
            }

            debug!(
                transition = %transition,
                entity = mutation.kind().as_str(),
                entity_id = %mutation.entity_id(),
                depth = depth,
                "检测到阶段跨越"
            );

            let result = run_in_unit_of_work(conn, |conn| self.run_reactor(conn, transition, &mutation));

            let outcome = match (result, transition.failure_mode()) {
                (Ok(outcome), _) => outcome,
                (Err(err), FailureMode::Hard) => {
                    error!(
                        transition = %transition,
                        entity_id = %mutation.entity_id(),
                        error = %err,
                        "反应器失败, 整体回滚"
                    );
                    return Err(err);
                }
                (Err(err), FailureMode::Soft) => {
                    error!(
                        transition = %transition,
                        entity_id = %mutation.entity_id(),
                        error = %err,
                        "软失败反应器出错, 已忽略"
                    );
                    report
                        .swallowed_errors
                        .push(format!("{}({}): {}", transition, mutation.entity_id(), err));
                    continue;
                }
            };

            report.absorb(transition, &outcome);
            if outcome.duplicate {
                debug!(transition = %transition, entity_id = %mutation.entity_id(), "重复跨越, 跳过");
                continue;
            }

            info!(
                transition = %transition,
                entity_id = %mutation.entity_id(),
                exceptions = outcome.exceptions.len(),
                cascaded = outcome.emitted.len(),
                "反应器执行完成"
            );

            for emitted in outcome.emitted {
                queue.push_back((emitted, depth + 1));
            }
        }

        Ok(report)
    }

    fn run_reactor(
        &self,
        conn: &Connection,
        transition: StageTransition,
        mutation: &EntityMutation,
    ) -> EngineResult<ReactorOutcome> {
        let entity_id = mutation.entity_id();
        if !StageCrossingRepository::new(conn).claim(transition.as_str(), entity_id)? {
            return Ok(ReactorOutcome::duplicate());
        }

        let ctx = ReactorContext {
            conn,
            config: &self.config,
            policies: &self.policies,
            now: Utc::now(),
        };

        match transition {
            StageTransition::IntakeCompleted => reactors::intake::react(&ctx, entity_id),
            StageTransition::InboundConferenceCompleted => {
                reactors::inbound_conference::react(&ctx, entity_id)
            }
            StageTransition::SeparationCompleted => reactors::separation::react(&ctx, entity_id),
            StageTransition::OutboundConferenceCompleted => {
                reactors::outbound_conference::react(&ctx, entity_id)
            }
            StageTransition::CollectionRealized => reactors::collection::react(&ctx, entity_id),
            StageTransition::RouteFinished => reactors::route_finalization::react(&ctx, entity_id),
            StageTransition::OrderMarkedException => {
                reactors::manual::order_marked_exception(&ctx, entity_id, mutation.actor())
            }
            StageTransition::TransportCancelled => {
                reactors::manual::transport_cancelled(&ctx, entity_id, mutation.actor())
            }
        }
    }
}
