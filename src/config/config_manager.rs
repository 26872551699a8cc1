// ==========================================
// MRP 固定批量拆分 - 配置管理器
// ==========================================
// 职责: 批量规则加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::split_rule::{
    SplitRule, SplitRuleReader, SplitRuleTable, DEFAULT_FIXED_QTY_PER_BATCH,
};
use crate::db::open_sqlite_connection;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 批量规则列表 (JSON 数组)
    pub const SPLIT_RULES: &str = "batch_split/rules";
    /// 未匹配产品的默认每批数量
    pub const DEFAULT_FIXED_QTY: &str = "batch_split/default_fixed_qty";
}

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
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        debug!(key, "配置已写入");
        Ok(())
    }

    // ===== 批量规则配置 =====

    /// 获取默认每批数量
    ///
    /// # 默认值
    /// - 41.0
    pub fn get_default_fixed_qty(&self) -> ConfigResult<f64> {
        let key = config_keys::DEFAULT_FIXED_QTY;
        match self.get_global_config_value(key)? {
            Some(raw) => raw.trim().parse::<f64>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(DEFAULT_FIXED_QTY_PER_BATCH),
        }
    }

    /// 获取已配置的批量规则
    ///
    /// # 返回
    /// - Some(rules): 已配置
    /// - None: 未配置 (调用方应使用内置规则表)
    pub fn get_split_rules(&self) -> ConfigResult<Option<Vec<SplitRule>>> {
        let key = config_keys::SPLIT_RULES;
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let rules: Vec<SplitRule> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
                key: key.to_string(),
                source,
            })?;
        Ok(Some(rules))
    }

    /// 保存批量规则 (整体覆盖)
    ///
    /// 写入前按规则表校验，非法规则不落库。
    pub fn save_split_rules(&self, rules: &[SplitRule]) -> ConfigResult<usize> {
        SplitRuleTable::from_rules(rules.to_vec(), self.get_default_fixed_qty()?)?;

        let raw = serde_json::to_string(rules).map_err(|source| ConfigError::Malformed {
            key: config_keys::SPLIT_RULES.to_string(),
            source,
        })?;
        self.set_global_config_value(config_keys::SPLIT_RULES, &raw)?;

        info!(count = rules.len(), "批量规则已保存");
        Ok(rules.len())
    }

    /// 设置默认每批数量
    pub fn set_default_fixed_qty(&self, qty: f64) -> ConfigResult<()> {
        if !qty.is_finite() || qty <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: config_keys::DEFAULT_FIXED_QTY.to_string(),
                message: format!("必须为正数: {}", qty),
            });
        }
        self.set_global_config_value(config_keys::DEFAULT_FIXED_QTY, &qty.to_string())
    }
}

impl SplitRuleReader for ConfigManager {
    fn load_rule_table(&self) -> ConfigResult<SplitRuleTable> {
        let default_fixed_qty = self.get_default_fixed_qty()?;
        match self.get_split_rules()? {
            Some(rules) => SplitRuleTable::from_rules(rules, default_fixed_qty),
            None => {
                debug!("未配置批量规则，使用内置规则表");
                let builtin = SplitRuleTable::builtin();
                SplitRuleTable::from_rules(builtin.rules().cloned().collect(), default_fixed_qty)
            }
        }
    }
}
