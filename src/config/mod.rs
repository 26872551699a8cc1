// ==========================================
// MRP 固定批量拆分 - 配置层
// ==========================================
// 职责: 批量规则 (产品模板 → 固定批量) 的加载与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod rule_import;
pub mod split_rule;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use split_rule::{SplitRule, SplitRuleReader, SplitRuleTable, DEFAULT_FIXED_QTY_PER_BATCH};
