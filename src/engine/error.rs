// ==========================================
// MRP 固定批量拆分 - 引擎层错误类型
// ==========================================

use thiserror::Error;

use crate::config::ConfigError;

/// 拆分引擎错误类型
#[derive(Error, Debug)]
pub enum SplitError {
    /// 产品不在固定批量拆分允许列表中
    #[error("产品不在批量拆分允许列表中: production_id={production_id}, product_tmpl_id={product_tmpl_id}")]
    NotSpecialProduct {
        production_id: i64,
        product_tmpl_id: i64,
    },

    #[error("订单数量必须为正数: production_id={production_id}, product_qty={product_qty}")]
    NonPositiveQuantity { production_id: i64, product_qty: f64 },

    #[error("每批数量必须为正数: product_tmpl_id={product_tmpl_id}, fixed_qty_per_batch={fixed_qty_per_batch}")]
    NonPositiveBatchSize {
        product_tmpl_id: i64,
        fixed_qty_per_batch: f64,
    },

    #[error("批次数超出上限: production_id={production_id}, product_qty={product_qty}, fixed_qty_per_batch={fixed_qty_per_batch}, max={max}")]
    TooManyBatches {
        production_id: i64,
        product_qty: f64,
        fixed_qty_per_batch: f64,
        max: usize,
    },

    #[error("拆分数量列表为空: production_id={0}")]
    EmptySplit(i64),

    #[error("批次数量无效: batch={batch}, qty={qty}")]
    InvalidBatchQuantity { batch: usize, qty: f64 },

    /// 确认记录的原始数量与订单当前数量不一致
    #[error("确认记录已过期: confirmation_id={confirmation_id}, original_qty={original_qty}, current_qty={current_qty}")]
    StaleConfirmation {
        confirmation_id: String,
        original_qty: f64,
        current_qty: f64,
    },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition { from: String, to: String },

    #[error("批量规则加载失败: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type SplitResult<T> = Result<T, SplitError>;
