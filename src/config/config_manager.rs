// ==========================================
// 物流枢纽流转系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pipeline_config::PipelineConfig;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值 (覆盖)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 加载流转引擎配置
    pub fn load_pipeline_config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        load_pipeline_config(&conn)
    }
}

/// 从连接直接加载流转引擎配置 (调用方已持有连接 / 事务时使用)
pub fn load_pipeline_config(conn: &Connection) -> Result<PipelineConfig, Box<dyn Error>> {
    let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut values = HashMap::new();
    for row in rows {
        let (key, value) = row?;
        values.insert(key, value);
    }

    PipelineConfig::from_kv(&values)
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 罚金
    pub const UNIT_PENALTY: &str = "unit_penalty";
    pub const PER_STOP_PENALTY: &str = "per_stop_penalty";
    pub const NOSHOW_PENALTY: &str = "noshow_penalty";
    pub const PER_ORDER_PENALTY: &str = "per_order_penalty";

    // 揽收
    pub const PICKUP_DELAY_THRESHOLD_MINUTES: &str = "pickup_delay_threshold_minutes";

    // 占位策略
    pub const DEFAULT_ORDER_VALUE: &str = "default_order_value";
    pub const DAMAGE_RATE: &str = "damage_rate";

    // 地点与文案
    pub const HUB_LOCATION: &str = "hub_location";
    pub const STOCK_LOCATION: &str = "stock_location";
    pub const CARRIER_NOTE: &str = "carrier_note";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_set_and_load() {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let manager = ConfigManager::from_connection(conn).unwrap();

        assert_eq!(manager.get_global_config_value(config_keys::UNIT_PENALTY).unwrap(), None);

        manager.set_global_config_value(config_keys::UNIT_PENALTY, "120").unwrap();
        manager.set_global_config_value(config_keys::UNIT_PENALTY, "130").unwrap();
        assert_eq!(
            manager.get_global_config_value(config_keys::UNIT_PENALTY).unwrap(),
            Some("130".to_string())
        );

        let config = manager.load_pipeline_config().unwrap();
        assert_eq!(config.unit_penalty, 130.0);
        assert_eq!(config.per_stop_penalty, 50.0);
    }
}
