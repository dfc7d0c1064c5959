// ==========================================
// 物流枢纽流转系统 - 实体变更事件
// ==========================================
// 职责: 描述一次实体写入 (前像 + 后像), 作为阶段分发的输入
// 说明: 前像为 None 表示新建; 引擎自身写入标记为 Engine 来源
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::exception::Actor;
use crate::domain::intake::Intake;
use crate::domain::order::{Collection, Order, Separation};
use crate::domain::route::Route;
use crate::domain::transport::{Conference, Transport};

// ==========================================
// 实体种类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Intake,
    Transport,
    Conference,
    Order,
    Separation,
    Collection,
    Route,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Intake => "Intake",
            EntityKind::Transport => "Transport",
            EntityKind::Conference => "Conference",
            EntityKind::Order => "Order",
            EntityKind::Separation => "Separation",
            EntityKind::Collection => "Collection",
            EntityKind::Route => "Route",
        }
    }
}

/// 变更来源
///
/// 手工异常标记只响应外部来源, 引擎级联写入不会再次触发
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationOrigin {
    External(Actor),
    Engine,
}

impl MutationOrigin {
    pub fn user(id: impl Into<String>) -> Self {
        MutationOrigin::External(Actor::user(id))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, MutationOrigin::External(_))
    }

    /// 外部来源取其操作人, 引擎来源为 System
    pub fn actor(&self) -> Actor {
        match self {
            MutationOrigin::External(actor) => actor.clone(),
            MutationOrigin::Engine => Actor::System,
        }
    }
}

// ==========================================
// 实体变更
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum EntityMutation {
    Intake {
        before: Option<Intake>,
        after: Intake,
    },
    Transport {
        before: Option<Transport>,
        after: Transport,
        origin: MutationOrigin,
    },
    Conference {
        before: Option<Conference>,
        after: Conference,
    },
    Order {
        before: Option<Order>,
        after: Order,
        origin: MutationOrigin,
    },
    Separation {
        before: Option<Separation>,
        after: Separation,
    },
    Collection {
        before: Option<Collection>,
        after: Collection,
    },
    Route {
        before: Option<Route>,
        after: Route,
    },
}

impl EntityMutation {
    pub fn intake(before: Option<Intake>, after: Intake) -> Self {
        EntityMutation::Intake { before, after }
    }

    pub fn transport(before: Option<Transport>, after: Transport, origin: MutationOrigin) -> Self {
        EntityMutation::Transport {
            before,
            after,
            origin,
        }
    }

    pub fn conference(before: Option<Conference>, after: Conference) -> Self {
        EntityMutation::Conference { before, after }
    }

    pub fn order(before: Option<Order>, after: Order, origin: MutationOrigin) -> Self {
        EntityMutation::Order {
            before,
            after,
            origin,
        }
    }

    pub fn separation(before: Option<Separation>, after: Separation) -> Self {
        EntityMutation::Separation { before, after }
    }

    pub fn collection(before: Option<Collection>, after: Collection) -> Self {
        EntityMutation::Collection { before, after }
    }

    pub fn route(before: Option<Route>, after: Route) -> Self {
        EntityMutation::Route { before, after }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityMutation::Intake { .. } => EntityKind::Intake,
            EntityMutation::Transport { .. } => EntityKind::Transport,
            EntityMutation::Conference { .. } => EntityKind::Conference,
            EntityMutation::Order { .. } => EntityKind::Order,
            EntityMutation::Separation { .. } => EntityKind::Separation,
            EntityMutation::Collection { .. } => EntityKind::Collection,
            EntityMutation::Route { .. } => EntityKind::Route,
        }
    }

    /// 后像实体ID
    pub fn entity_id(&self) -> &str {
        match self {
            EntityMutation::Intake { after, .. } => &after.intake_id,
            EntityMutation::Transport { after, .. } => &after.transport_id,
            EntityMutation::Conference { after, .. } => &after.conference_id,
            EntityMutation::Order { after, .. } => &after.order_id,
            EntityMutation::Separation { after, .. } => &after.separation_id,
            EntityMutation::Collection { after, .. } => &after.collection_id,
            EntityMutation::Route { after, .. } => &after.route_id,
        }
    }

    /// 变更操作人 (无来源信息的实体视为 System)
    pub fn actor(&self) -> Actor {
        match self {
            EntityMutation::Order { origin, .. } | EntityMutation::Transport { origin, .. } => {
                origin.actor()
            }
            _ => Actor::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_actor() {
        assert_eq!(MutationOrigin::Engine.actor(), Actor::System);
        assert_eq!(MutationOrigin::user("u1").actor(), Actor::user("u1"));
        assert!(!MutationOrigin::Engine.is_external());
    }

    #[test]
    fn test_mutation_identity() {
        let order = Order::new("O1", "REF-1");
        let m = EntityMutation::order(None, order, MutationOrigin::Engine);
        assert_eq!(m.kind(), EntityKind::Order);
        assert_eq!(m.entity_id(), "O1");
        assert_eq!(m.actor(), Actor::System);
    }
}
