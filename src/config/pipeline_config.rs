// ==========================================
// 物流枢纽流转系统 - 流转引擎配置
// ==========================================
// 存储: config_kv 表 (scope_id = 'global')
// 规则: 缺失键取默认值, 非法取值报错
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;

use crate::config::config_keys;

/// 流转引擎参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 收货数量差异: 每件罚金
    pub unit_penalty: f64,
    /// 线路未投递站点: 每站罚金
    pub per_stop_penalty: f64,
    /// 司机缺席: 固定罚金
    pub noshow_penalty: f64,
    /// 运输取消: 每单罚金
    pub per_order_penalty: f64,
    /// 揽收延误阈值 (分钟)
    pub pickup_delay_threshold_minutes: i64,
    /// 占位估值: 单票货值
    pub default_order_value: f64,
    /// 占位抽检: 货损概率 [0, 1]
    pub damage_rate: f64,
    /// 枢纽轨迹地点
    pub hub_location: String,
    /// 入库默认库位
    pub stock_location: String,
    /// 发运备注
    pub carrier_note: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unit_penalty: 100.0,
            per_stop_penalty: 50.0,
            noshow_penalty: 300.0,
            per_order_penalty: 150.0,
            pickup_delay_threshold_minutes: 120,
            default_order_value: 250.0,
            damage_rate: 0.05,
            hub_location: "HUB-01".to_string(),
            stock_location: "DOCK-IN".to_string(),
            carrier_note: "自有车队配送".to_string(),
        }
    }
}

impl PipelineConfig {
    /// 由键值对构建配置 (未出现的键取默认值)
    pub fn from_kv(values: &HashMap<String, String>) -> Result<Self, Box<dyn Error>> {
        let mut config = Self::default();

        if let Some(v) = values.get(config_keys::UNIT_PENALTY) {
            config.unit_penalty = parse_amount(config_keys::UNIT_PENALTY, v)?;
        }
        if let Some(v) = values.get(config_keys::PER_STOP_PENALTY) {
            config.per_stop_penalty = parse_amount(config_keys::PER_STOP_PENALTY, v)?;
        }
        if let Some(v) = values.get(config_keys::NOSHOW_PENALTY) {
            config.noshow_penalty = parse_amount(config_keys::NOSHOW_PENALTY, v)?;
        }
        if let Some(v) = values.get(config_keys::PER_ORDER_PENALTY) {
            config.per_order_penalty = parse_amount(config_keys::PER_ORDER_PENALTY, v)?;
        }
        if let Some(v) = values.get(config_keys::DEFAULT_ORDER_VALUE) {
            config.default_order_value = parse_amount(config_keys::DEFAULT_ORDER_VALUE, v)?;
        }
        if let Some(v) = values.get(config_keys::PICKUP_DELAY_THRESHOLD_MINUTES) {
            let minutes: i64 = v.trim().parse().map_err(|e| {
                format!("配置 {} 取值非法 ({}): {}", config_keys::PICKUP_DELAY_THRESHOLD_MINUTES, v, e)
            })?;
            if minutes <= 0 {
                return Err(format!(
                    "配置 {} 必须为正数: {}",
                    config_keys::PICKUP_DELAY_THRESHOLD_MINUTES,
                    minutes
                )
                .into());
            }
            config.pickup_delay_threshold_minutes = minutes;
        }
        if let Some(v) = values.get(config_keys::DAMAGE_RATE) {
            let rate: f64 = v
                .trim()
                .parse()
                .map_err(|e| format!("配置 {} 取值非法 ({}): {}", config_keys::DAMAGE_RATE, v, e))?;
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("配置 {} 超出 [0, 1]: {}", config_keys::DAMAGE_RATE, rate).into());
            }
            config.damage_rate = rate;
        }
        if let Some(v) = non_blank(values.get(config_keys::HUB_LOCATION)) {
            config.hub_location = v;
        }
        if let Some(v) = non_blank(values.get(config_keys::STOCK_LOCATION)) {
            config.stock_location = v;
        }
        if let Some(v) = non_blank(values.get(config_keys::CARRIER_NOTE)) {
            config.carrier_note = v;
        }

        Ok(config)
    }
}

fn parse_amount(key: &str, raw: &str) -> Result<f64, Box<dyn Error>> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("配置 {} 取值非法 ({}): {}", key, raw, e))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("配置 {} 必须为非负金额: {}", key, raw).into());
    }
    Ok(amount)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
