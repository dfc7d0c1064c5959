// ==========================================
// 物流枢纽流转系统 - 策略钩子
// ==========================================
// 估值 / 货损检查均为可替换策略, 只约定形状 (返回金额 / 布尔)
// 占位实现: 固定货值 + 按比例随机抽检
// ==========================================

use std::collections::HashSet;
use rand::Rng;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::domain::order::Order;

/// 估值策略: 订单货值
pub trait ValuationPolicy: Send + Sync {
    fn order_value(&self, order: &Order) -> f64;
}

/// 货损检查策略
pub trait InspectionPolicy: Send + Sync {
    fn is_damaged(&self, order: &Order) -> bool;
}

/// 固定货值
#[derive(Debug, Clone, Copy)]
pub struct FixedValuation {
    value: f64,
}

impl FixedValuation {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl ValuationPolicy for FixedValuation {
    fn order_value(&self, _order: &Order) -> f64 {
        self.value
    }
}

/// 按比例随机抽检
#[derive(Debug, Clone, Copy)]
pub struct SampledInspection {
    rate: f64,
}

impl SampledInspection {
    /// 比例截断到 [0, 1], 非法值视为 0
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl InspectionPolicy for SampledInspection {
    fn is_damaged(&self, _order: &Order) -> bool {
        rand::thread_rng().gen_bool(self.rate)
    }
}

/// 从不判定货损
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDamaged;

impl InspectionPolicy for NeverDamaged {
    fn is_damaged(&self, _order: &Order) -> bool {
        false
    }
}

/// 指定订单判定为货损 (确定性替身)
#[derive(Debug, Clone, Default)]
pub struct DamagedOrders {
    order_ids: HashSet<String>,
}

impl DamagedOrders {
    pub fn new<I, S>(order_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order_ids: order_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl InspectionPolicy for DamagedOrders {
    fn is_damaged(&self, order: &Order) -> bool {
        self.order_ids.contains(&order.order_id)
    }
}

// ==========================================
// PolicyHooks - 策略集合
// ==========================================
#[derive(Clone)]
pub struct PolicyHooks {
    pub valuation: Arc<dyn ValuationPolicy>,
    pub inspection: Arc<dyn InspectionPolicy>,
}

impl PolicyHooks {
    pub fn new(valuation: Arc<dyn ValuationPolicy>, inspection: Arc<dyn InspectionPolicy>) -> Self {
        Self {
            valuation,
            inspection,
        }
    }

    /// 占位策略 (生产默认)
    pub fn placeholder(config: &PipelineConfig) -> Self {
        Self::new(
            Arc::new(FixedValuation::new(config.default_order_value)),
            Arc::new(SampledInspection::new(config.damage_rate)),
        )
    }

    /// 确定性策略: 固定货值, 无货损
    pub fn deterministic(order_value: f64) -> Self {
        Self::new(Arc::new(FixedValuation::new(order_value)), Arc::new(NeverDamaged))
    }

    pub fn with_inspection(mut self, inspection: Arc<dyn InspectionPolicy>) -> Self {
        self.inspection = inspection;
        self
    }
}

impl std::fmt::Debug for PolicyHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyHooks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_inspection_bounds() {
        let order = Order::new("O1", "REF-1");
        let never = SampledInspection::new(0.0);
        let always = SampledInspection::new(1.0);
        for _ in 0..100 {
            assert!(!never.is_damaged(&order));
            assert!(always.is_damaged(&order));
        }
    }

    #[test]
    fn test_sampled_inspection_clamps_rate() {
        assert_eq!(SampledInspection::new(-0.5).rate(), 0.0);
        assert_eq!(SampledInspection::new(3.0).rate(), 1.0);
        assert_eq!(SampledInspection::new(f64::NAN).rate(), 0.0);

        // 非法比例不得让抽检 panic
        let order = Order::new("O1", "REF-1");
        assert!(!SampledInspection::new(f64::NAN).is_damaged(&order));
    }

    #[test]
    fn test_damaged_orders_double() {
        let policy = DamagedOrders::new(["O2"]);
        assert!(!policy.is_damaged(&Order::new("O1", "A")));
        assert!(policy.is_damaged(&Order::new("O2", "B")));
    }
}
