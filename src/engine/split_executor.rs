// ==========================================
// MRP 固定批量拆分 - 拆分执行器 (批次落地)
// ==========================================
// 职责: 将批次数量列表落地为 N 个订单草稿
// 输入: 锚点订单 (原订单) + 不可变批次数量列表
// 输出: SplitMaterialization (前 N-1 批为副本，原订单为第 N 批)
// 红线: 每个组件消耗 = 原消耗 × (本批数量 / 原订单数量)
// ==========================================
// 不写库: 由仓储层在同一事务内按草稿落地
// ==========================================

use tracing::{debug, instrument};

use crate::domain::production::ProductionOrder;
use crate::domain::split::{BatchDraft, MoveDraft, SplitMaterialization};
use crate::engine::error::{SplitError, SplitResult};

/// 批次编号: {原编号}-{批次号:03}
pub fn batch_name(original_name: &str, seq: usize) -> String {
    format!("{}-{:03}", original_name, seq)
}

/// 拆分执行器
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitExecutor;

impl SplitExecutor {
    pub fn new() -> Self {
        Self
    }

    /// 计算批次落地方案
    ///
    /// # 参数
    /// - `anchor`: 原订单 (组件消耗为拆分前的原始值)
    /// - `quantities`: 各批数量，按批次顺序
    ///
    /// # 返回
    /// - Ok(SplitMaterialization): copies.len() == quantities.len() - 1
    /// - Err(SplitError::EmptySplit): 数量列表为空
    /// - Err(SplitError::NonPositiveQuantity): 原订单数量非正 (无法计算比例)
    #[instrument(skip(self, anchor), fields(production_id = anchor.production_id))]
    pub fn materialize(
        &self,
        anchor: &ProductionOrder,
        quantities: &[f64],
    ) -> SplitResult<SplitMaterialization> {
        let (last_qty, leading) = quantities
            .split_last()
            .ok_or(SplitError::EmptySplit(anchor.production_id))?;

        let original_qty = anchor.product_qty;
        if !original_qty.is_finite() || original_qty <= 0.0 {
            return Err(SplitError::NonPositiveQuantity {
                production_id: anchor.production_id,
                product_qty: original_qty,
            });
        }

        for (idx, qty) in quantities.iter().enumerate() {
            if !qty.is_finite() || *qty <= 0.0 {
                return Err(SplitError::InvalidBatchQuantity {
                    batch: idx + 1,
                    qty: *qty,
                });
            }
        }

        let copies: Vec<BatchDraft> = leading
            .iter()
            .enumerate()
            .map(|(idx, qty)| Self::draft(anchor, idx + 1, *qty))
            .collect();
        let anchor_draft = Self::draft(anchor, quantities.len(), *last_qty);

        debug!(
            batch_count = quantities.len(),
            anchor_name = %anchor_draft.name,
            "批次落地方案计算完成"
        );

        Ok(SplitMaterialization {
            anchor_id: anchor.production_id,
            original_name: anchor.name.clone(),
            original_qty,
            copies,
            anchor: anchor_draft,
        })
    }

    fn draft(anchor: &ProductionOrder, seq: usize, qty: f64) -> BatchDraft {
        let ratio = qty / anchor.product_qty;
        BatchDraft {
            seq,
            name: batch_name(&anchor.name, seq),
            product_id: anchor.product_id,
            product_tmpl_id: anchor.product_tmpl_id,
            product_qty: qty,
            ratio,
            moves: anchor
                .move_raw_ids
                .iter()
                .map(|m| MoveDraft {
                    source_move_id: m.move_id,
                    component_product_id: m.component_product_id,
                    product_uom_qty: m.product_uom_qty * ratio,
                    sequence: m.sequence,
                })
                .collect(),
        }
    }
}
