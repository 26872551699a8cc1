// ==========================================
// MRP 固定批量拆分 - 批量规则
// ==========================================
// 职责: 产品模板 → 固定批量 的映射表
// 存储: config_kv 表 batch_split/rules (JSON)
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::error::{ConfigError, ConfigResult};

/// 未匹配产品时的默认每批数量
pub const DEFAULT_FIXED_QTY_PER_BATCH: f64 = 41.0;

// ==========================================
// SplitRule - 单个产品的批量规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRule {
    pub product_tmpl_id: i64,     // 产品模板ID
    pub fixed_qty_per_batch: f64, // 每批固定数量
    #[serde(default = "default_min_batches")]
    pub min_batches: u32,         // 最少批数 (记录但不参与计算)
    #[serde(default)]
    pub label: Option<String>,    // 产品名称 (仅用于展示)
}

fn default_min_batches() -> u32 {
    1
}

impl SplitRule {
    pub fn new(product_tmpl_id: i64, fixed_qty_per_batch: f64, label: Option<&str>) -> Self {
        Self {
            product_tmpl_id,
            fixed_qty_per_batch,
            min_batches: 1,
            label: label.map(|s| s.to_string()),
        }
    }

    /// 校验规则合法性
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.fixed_qty_per_batch.is_finite() || self.fixed_qty_per_batch <= 0.0 {
            return Err(ConfigError::InvalidRule {
                product_tmpl_id: self.product_tmpl_id,
                message: format!("fixed_qty_per_batch 必须为正数: {}", self.fixed_qty_per_batch),
            });
        }
        if self.min_batches < 1 {
            return Err(ConfigError::InvalidRule {
                product_tmpl_id: self.product_tmpl_id,
                message: "min_batches 至少为 1".to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// SplitRuleTable - 批量规则表
// ==========================================
// 表内的产品模板即"特殊产品"允许列表
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRuleTable {
    rules: BTreeMap<i64, SplitRule>,
    default_fixed_qty: f64,
}

impl SplitRuleTable {
    /// 从规则列表构建 (校验 + 去重检查)
    pub fn from_rules(rules: Vec<SplitRule>, default_fixed_qty: f64) -> ConfigResult<Self> {
        if !default_fixed_qty.is_finite() || default_fixed_qty <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "default_fixed_qty".to_string(),
                message: format!("必须为正数: {}", default_fixed_qty),
            });
        }

        let mut map = BTreeMap::new();
        for rule in rules {
            rule.validate()?;
            let id = rule.product_tmpl_id;
            if map.insert(id, rule).is_some() {
                return Err(ConfigError::DuplicateRule(id));
            }
        }

        Ok(Self {
            rules: map,
            default_fixed_qty,
        })
    }

    /// 内置默认规则表
    pub fn builtin() -> Self {
        let rules = [
            (4247, "Tortas Pollo Life Style"),
            (4248, "Bites Pollo Life Style"),
            (4263, "Tortas Res Life Style"),
            (4264, "Bites Res Life Style"),
            (4265, "Tortas Pavo Life Style"),
            (4268, "Bites Pavo Life Style"),
            (123, "Fit Sin Granos Mediana"),
            (119, "Baby KANI Mediana"),
        ]
        .into_iter()
        .map(|(id, label)| (id, SplitRule::new(id, DEFAULT_FIXED_QTY_PER_BATCH, Some(label))))
        .collect();

        Self {
            rules,
            default_fixed_qty: DEFAULT_FIXED_QTY_PER_BATCH,
        }
    }

    /// 产品模板是否在允许列表中
    pub fn is_special_product(&self, product_tmpl_id: i64) -> bool {
        self.rules.contains_key(&product_tmpl_id)
    }

    /// 获取产品模板的规则
    pub fn rule_for(&self, product_tmpl_id: i64) -> Option<&SplitRule> {
        self.rules.get(&product_tmpl_id)
    }

    /// 每批固定数量 (未匹配时使用默认值)
    pub fn fixed_qty_per_batch(&self, product_tmpl_id: i64) -> f64 {
        self.rule_for(product_tmpl_id)
            .map(|r| r.fixed_qty_per_batch)
            .unwrap_or(self.default_fixed_qty)
    }

    pub fn default_fixed_qty(&self) -> f64 {
        self.default_fixed_qty
    }

    pub fn rules(&self) -> impl Iterator<Item = &SplitRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for SplitRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ==========================================
// SplitRuleReader Trait
// ==========================================
// 用途: 拆分规划器所需的规则读取接口
// 实现者: ConfigManager (config_kv 表) / SplitRuleTable (内存)
pub trait SplitRuleReader: Send + Sync {
    /// 加载当前生效的规则表
    fn load_rule_table(&self) -> ConfigResult<SplitRuleTable>;
}

impl SplitRuleReader for SplitRuleTable {
    fn load_rule_table(&self) -> ConfigResult<SplitRuleTable> {
        Ok(self.clone())
    }
}
