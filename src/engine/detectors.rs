// ==========================================
// 物流枢纽流转系统 - 异常检出规则
// ==========================================
// 纯函数: 输入已读取的事实, 输出 Finding (或 None)
// 登记由 recorder 负责, 这里不访问存储
// ==========================================

use chrono::{DateTime, Utc};

use crate::domain::exception::{Actor, ExceptionContext, NewException};
use crate::domain::types::{ExceptionCategory, Severity};
use crate::engine::estimators;

/// 检出结果
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub category: ExceptionCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub financial_impact: f64,
}

impl Finding {
    pub fn into_new_exception(self, context: ExceptionContext, actor: Actor) -> NewException {
        NewException::new(
            self.category,
            self.severity,
            self.title,
            self.description,
            context,
        )
        .with_actor(actor)
        .with_financial_impact(self.financial_impact)
    }
}

/// 数量核对发生的环节
///
/// 收货环节差异记 HIGH, 入库核对环节差异记 MEDIUM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountCheckpoint {
    Intake,
    InboundConference,
}

pub fn count_divergence(
    checkpoint: CountCheckpoint,
    expected: i64,
    actual: i64,
    unit_penalty: f64,
) -> Option<Finding> {
    if expected == actual {
        return None;
    }
    let (severity, title) = match checkpoint {
        CountCheckpoint::Intake => (Severity::High, "收货数量差异"),
        CountCheckpoint::InboundConference => (Severity::Medium, "入库核对数量差异"),
    };
    Some(Finding {
        category: ExceptionCategory::Divergence,
        severity,
        title: title.to_string(),
        description: format!("预期 {} 件, 实际 {} 件", expected, actual),
        financial_impact: estimators::divergence_impact(expected, actual, unit_penalty),
    })
}

pub fn damaged_order(order_id: &str, damaged: bool, order_value: f64) -> Option<Finding> {
    damaged.then(|| Finding {
        category: ExceptionCategory::Avaria,
        severity: Severity::High,
        title: "入库检查发现货损".to_string(),
        description: format!("订单 {} 入库检查判定为货损", order_id),
        financial_impact: order_value,
    })
}

pub fn missing_stock(order_id: &str, has_positive_stock: bool, order_value: f64) -> Option<Finding> {
    (!has_positive_stock).then(|| Finding {
        category: ExceptionCategory::Backlog,
        severity: Severity::High,
        title: "拣货时无可用库存".to_string(),
        description: format!("订单 {} 拣货完成但无正数库存记录", order_id),
        financial_impact: order_value,
    })
}

pub fn missing_driver(transport_id: &str, has_driver: bool, noshow_penalty: f64) -> Option<Finding> {
    (!has_driver).then(|| Finding {
        category: ExceptionCategory::Noshow,
        severity: Severity::High,
        title: "出库运输未指派司机".to_string(),
        description: format!("运输 {} 出库核对完成但无司机, 未生成配送线路", transport_id),
        financial_impact: noshow_penalty,
    })
}

/// 揽收延迟: 实际 - 约定 超过阈值 (分钟) 才算延迟
///
/// 延迟异常不估算金额
pub fn pickup_delay(
    order_id: &str,
    scheduled_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    threshold_minutes: i64,
) -> Option<Finding> {
    let elapsed = (completed_at - scheduled_at).num_minutes();
    (elapsed > threshold_minutes).then(|| Finding {
        category: ExceptionCategory::Atraso,
        severity: Severity::Medium,
        title: "揽收延迟".to_string(),
        description: format!(
            "订单 {} 揽收延迟 {} 分钟 (阈值 {} 分钟)",
            order_id, elapsed, threshold_minutes
        ),
        financial_impact: 0.0,
    })
}

pub fn pending_stops(route_id: &str, pending_count: i64, per_stop_penalty: f64) -> Option<Finding> {
    (pending_count > 0).then(|| Finding {
        category: ExceptionCategory::Parcel,
        severity: Severity::High,
        title: "线路结束仍有未投递站点".to_string(),
        description: format!("线路 {} 结束时 {} 个站点未投递", route_id, pending_count),
        financial_impact: estimators::pending_stops_impact(pending_count, per_stop_penalty),
    })
}

pub fn manual_order_exception(order_id: &str, order_value: f64) -> Finding {
    Finding {
        category: ExceptionCategory::Outros,
        severity: Severity::Medium,
        title: "订单被标记为异常".to_string(),
        description: format!("订单 {} 被人工标记为异常", order_id),
        financial_impact: order_value,
    }
}

pub fn cancelled_transport(transport_id: &str, order_count: i64, per_order_penalty: f64) -> Finding {
    Finding {
        category: ExceptionCategory::Extraviado,
        severity: Severity::Critical,
        title: "运输被取消".to_string(),
        description: format!("运输 {} 被取消, 涉及 {} 个订单", transport_id, order_count),
        financial_impact: estimators::lost_orders_impact(order_count, per_order_penalty),
    }
}
