// ==========================================
// MRP 固定批量拆分 - 拆分规划器
// ==========================================
// 职责: 计算批次数与各批数量，决定直接执行还是等待确认
// 输入: 生产订单 + 批量规则表
// 输出: SplitDecision
// 规则: 向上取整，宁可超产不可欠产；不产生不足一批的尾批
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::{SplitRuleReader, SplitRuleTable};
use crate::domain::production::ProductionOrder;
use crate::engine::error::{SplitError, SplitResult};

// ==========================================
// SplitPlan - 拆分方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub production_id: i64,
    pub product_tmpl_id: i64,
    pub original_qty: f64,         // 原始目标数量
    pub fixed_qty_per_batch: f64,  // 每批固定数量
    pub required_batches: usize,   // ceil(original_qty / fixed_qty_per_batch)
    pub split_quantities: Vec<f64>, // [fixed_qty_per_batch; required_batches]
    pub total_to_produce: f64,     // sum(split_quantities)
}

impl SplitPlan {
    /// 是否超产
    pub fn is_overproduction(&self) -> bool {
        self.total_to_produce > self.original_qty
    }

    /// 超产数量
    pub fn overproduction_qty(&self) -> f64 {
        (self.total_to_produce - self.original_qty).max(0.0)
    }
}

// ==========================================
// SplitDecision - 规划结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum SplitDecision {
    /// 总产量等于目标，直接执行
    Direct(SplitPlan),
    /// 超产，需要人工确认
    NeedsConfirmation(SplitPlan),
}

impl SplitDecision {
    pub fn plan(&self) -> &SplitPlan {
        match self {
            SplitDecision::Direct(plan) | SplitDecision::NeedsConfirmation(plan) => plan,
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, SplitDecision::NeedsConfirmation(_))
    }
}

// ==========================================
// SplitPlanner - 拆分规划器
// ==========================================
// 无副作用: 不写库，只计算
pub struct SplitPlanner<C>
where
    C: SplitRuleReader,
{
    config: Arc<C>,
}

impl<C> SplitPlanner<C>
where
    C: SplitRuleReader,
{
    /// 创建新的 SplitPlanner 实例
    ///
    /// # 参数
    /// - config: 批量规则读取器
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }

    /// 加载当前生效的规则表
    pub fn load_rules(&self) -> SplitResult<SplitRuleTable> {
        Ok(self.config.load_rule_table()?)
    }

    /// 规划单个订单的拆分
    pub fn plan(&self, order: &ProductionOrder) -> SplitResult<SplitDecision> {
        let rules = self.load_rules()?;
        plan_split(&rules, order)
    }
}

/// 回填派生字段 is_special_product
pub fn refresh_special_flag(rules: &SplitRuleTable, order: &mut ProductionOrder) {
    order.is_special_product = rules.is_special_product(order.product_tmpl_id);
}

/// 单个订单允许拆出的最大批次数
pub const MAX_BATCHES: usize = 10_000;

/// 计算所需批次数
///
/// # 规则
/// required_batches = ceil(product_qty / fixed_qty_per_batch)
///
/// # 返回
/// - Some(n): 1 <= n <= MAX_BATCHES
/// - None: 超出 MAX_BATCHES
pub fn required_batches(product_qty: f64, fixed_qty_per_batch: f64) -> Option<usize> {
    let batches = (product_qty / fixed_qty_per_batch).ceil();
    if batches > MAX_BATCHES as f64 {
        return None;
    }
    Some(batches as usize)
}

/// 按规则表规划拆分
///
/// # 返回
/// - Ok(SplitDecision::Direct): sum == product_qty
/// - Ok(SplitDecision::NeedsConfirmation): sum > product_qty
/// - Err(SplitError::NotSpecialProduct): 产品不在允许列表
#[instrument(skip(rules, order), fields(production_id = order.production_id))]
pub fn plan_split(rules: &SplitRuleTable, order: &ProductionOrder) -> SplitResult<SplitDecision> {
    if !rules.is_special_product(order.product_tmpl_id) {
        return Err(SplitError::NotSpecialProduct {
            production_id: order.production_id,
            product_tmpl_id: order.product_tmpl_id,
        });
    }

    if !order.product_qty.is_finite() || order.product_qty <= 0.0 {
        return Err(SplitError::NonPositiveQuantity {
            production_id: order.production_id,
            product_qty: order.product_qty,
        });
    }

    let fixed_qty_per_batch = rules.fixed_qty_per_batch(order.product_tmpl_id);
    if !fixed_qty_per_batch.is_finite() || fixed_qty_per_batch <= 0.0 {
        return Err(SplitError::NonPositiveBatchSize {
            product_tmpl_id: order.product_tmpl_id,
            fixed_qty_per_batch,
        });
    }

    // min_batches 仅随规则保存，不参与计算
    let batches = required_batches(order.product_qty, fixed_qty_per_batch).ok_or(
        SplitError::TooManyBatches {
            production_id: order.production_id,
            product_qty: order.product_qty,
            fixed_qty_per_batch,
            max: MAX_BATCHES,
        },
    )?;
    let split_quantities = vec![fixed_qty_per_batch; batches];
    let total_to_produce: f64 = split_quantities.iter().sum();

    let plan = SplitPlan {
        production_id: order.production_id,
        product_tmpl_id: order.product_tmpl_id,
        original_qty: order.product_qty,
        fixed_qty_per_batch,
        required_batches: batches,
        split_quantities,
        total_to_produce,
    };

    debug!(
        required_batches = plan.required_batches,
        fixed_qty_per_batch,
        total_to_produce,
        "拆分方案计算完成"
    );

    if plan.is_overproduction() {
        info!(
            original_qty = plan.original_qty,
            future_qty = plan.total_to_produce,
            "拆分将超产，需要人工确认"
        );
        Ok(SplitDecision::NeedsConfirmation(plan))
    } else {
        Ok(SplitDecision::Direct(plan))
    }
}
