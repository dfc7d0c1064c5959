// ==========================================
// 物流枢纽流转系统 - 损失估算
// ==========================================
// 纯函数: 异常参数 → 金额, 无副作用
// ==========================================

use crate::domain::order::Order;
use crate::engine::policy::ValuationPolicy;

/// 数量差异损失 = |预期 - 实际| × 单件罚金
pub fn divergence_impact(expected: i64, actual: i64, unit_penalty: f64) -> f64 {
    (expected - actual).abs() as f64 * unit_penalty
}

/// 未投递站点损失 = 未投递数 × 每站罚金
pub fn pending_stops_impact(pending_count: i64, per_stop_penalty: f64) -> f64 {
    pending_count.max(0) as f64 * per_stop_penalty
}

/// 运输取消损失 = 运输上订单数 × 每单罚金
pub fn lost_orders_impact(order_count: i64, per_order_penalty: f64) -> f64 {
    order_count.max(0) as f64 * per_order_penalty
}

/// 单票货值 (策略返回负数或非有限值时按 0 计)
pub fn order_value_impact(policy: &dyn ValuationPolicy, order: &Order) -> f64 {
    let value = policy.order_value(order);
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::policy::FixedValuation;

    #[test]
    fn test_divergence_is_symmetric() {
        assert_eq!(divergence_impact(10, 8, 100.0), 200.0);
        assert_eq!(divergence_impact(8, 10, 100.0), 200.0);
        assert_eq!(divergence_impact(5, 5, 100.0), 0.0);
    }

    #[test]
    fn test_pending_stops() {
        assert_eq!(pending_stops_impact(3, 50.0), 150.0);
        assert_eq!(pending_stops_impact(-1, 50.0), 0.0);
    }

    #[test]
    fn test_lost_orders() {
        assert_eq!(lost_orders_impact(4, 150.0), 600.0);
    }

    #[test]
    fn test_order_value_clamps_invalid() {
        let order = Order::new("O1", "REF-1");
        assert_eq!(order_value_impact(&FixedValuation::new(250.0), &order), 250.0);
        assert_eq!(order_value_impact(&FixedValuation::new(-5.0), &order), 0.0);
        assert_eq!(order_value_impact(&FixedValuation::new(f64::NAN), &order), 0.0);
    }
}
