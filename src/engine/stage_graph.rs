// ==========================================
// 物流枢纽流转系统 - 阶段图
// ==========================================
// 每条边: 触发实体 + 跨越条件 → 反应器 → 级联写入的实体
// 阶段图无环, 级联深度以边数为上限
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::events::EntityKind;

/// 级联深度上限 (阶段图中最长链不超过边数)
pub const MAX_CASCADE_DEPTH: usize = 7;

/// 反应器失败语义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureMode {
    /// 失败即回滚触发写入, 错误上抛
    Hard,
    /// 失败记录日志后吞掉, 触发写入照常提交
    Soft,
}

/// 阶段跨越
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageTransition {
    IntakeCompleted,
    InboundConferenceCompleted,
    SeparationCompleted,
    OutboundConferenceCompleted,
    CollectionRealized,
    RouteFinished,
    OrderMarkedException,
    TransportCancelled,
}

impl StageTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageTransition::IntakeCompleted => "INTAKE_COMPLETED",
            StageTransition::InboundConferenceCompleted => "INBOUND_CONFERENCE_COMPLETED",
            StageTransition::SeparationCompleted => "SEPARATION_COMPLETED",
            StageTransition::OutboundConferenceCompleted => "OUTBOUND_CONFERENCE_COMPLETED",
            StageTransition::CollectionRealized => "COLLECTION_REALIZED",
            StageTransition::RouteFinished => "ROUTE_FINISHED",
            StageTransition::OrderMarkedException => "ORDER_MARKED_EXCEPTION",
            StageTransition::TransportCancelled => "TRANSPORT_CANCELLED",
        }
    }

    pub fn failure_mode(&self) -> FailureMode {
        match self {
            StageTransition::OrderMarkedException | StageTransition::TransportCancelled => {
                FailureMode::Soft
            }
            _ => FailureMode::Hard,
        }
    }

    pub fn edge(&self) -> &'static StageEdge {
        // STAGE_GRAPH 覆盖全部枚举值
        match self {
            StageTransition::IntakeCompleted => &STAGE_GRAPH[0],
            StageTransition::InboundConferenceCompleted => &STAGE_GRAPH[1],
            StageTransition::SeparationCompleted => &STAGE_GRAPH[2],
            StageTransition::OutboundConferenceCompleted => &STAGE_GRAPH[3],
            StageTransition::CollectionRealized => &STAGE_GRAPH[4],
            StageTransition::RouteFinished => &STAGE_GRAPH[5],
            StageTransition::OrderMarkedException => &STAGE_GRAPH[6],
            StageTransition::TransportCancelled => &STAGE_GRAPH[7],
        }
    }
}

impl fmt::Display for StageTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 阶段图中的一条边
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageEdge {
    pub transition: StageTransition,
    pub source: EntityKind,
    pub writes: &'static [EntityKind],
}

pub static STAGE_GRAPH: [StageEdge; 8] = [
    StageEdge {
        transition: StageTransition::IntakeCompleted,
        source: EntityKind::Intake,
        writes: &[EntityKind::Intake, EntityKind::Transport, EntityKind::Conference, EntityKind::Order],
    },
    StageEdge {
        transition: StageTransition::InboundConferenceCompleted,
        source: EntityKind::Conference,
        writes: &[EntityKind::Conference, EntityKind::Transport, EntityKind::Order],
    },
    StageEdge {
        transition: StageTransition::SeparationCompleted,
        source: EntityKind::Separation,
        writes: &[EntityKind::Separation, EntityKind::Order],
    },
    StageEdge {
        transition: StageTransition::OutboundConferenceCompleted,
        source: EntityKind::Conference,
        writes: &[EntityKind::Conference, EntityKind::Route, EntityKind::Transport, EntityKind::Order],
    },
    StageEdge {
        transition: StageTransition::CollectionRealized,
        source: EntityKind::Collection,
        writes: &[EntityKind::Collection, EntityKind::Order],
    },
    StageEdge {
        transition: StageTransition::RouteFinished,
        source: EntityKind::Route,
        writes: &[EntityKind::Route, EntityKind::Transport, EntityKind::Order],
    },
    StageEdge {
        transition: StageTransition::OrderMarkedException,
        source: EntityKind::Order,
        writes: &[],
    },
    StageEdge {
        transition: StageTransition::TransportCancelled,
        source: EntityKind::Transport,
        writes: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_edge_lookup_matches_transition() {
        for edge in STAGE_GRAPH.iter() {
            assert_eq!(edge.transition.edge(), edge);
        }
        let unique: HashSet<_> = STAGE_GRAPH.iter().map(|e| e.transition).collect();
        assert_eq!(unique.len(), STAGE_GRAPH.len());
    }

    #[test]
    fn test_only_manual_edges_are_soft() {
        let soft: Vec<_> = STAGE_GRAPH
            .iter()
            .filter(|e| e.transition.failure_mode() == FailureMode::Soft)
            .map(|e| e.transition)
            .collect();
        assert_eq!(
            soft,
            vec![StageTransition::OrderMarkedException, StageTransition::TransportCancelled]
        );
    }

    #[test]
    fn test_cascade_bound_covers_graph() {
        assert!(MAX_CASCADE_DEPTH >= STAGE_GRAPH.len() - 1);
    }
}
