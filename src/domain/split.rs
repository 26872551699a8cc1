// ==========================================
// MRP 固定批量拆分 - 拆分确认领域模型
// ==========================================
// 对齐: split_confirmation 表
// 用途: 超产时暂存拆分方案，等待人工确认
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::ConfirmationState;

// ==========================================
// SplitConfirmation - 拆分确认 (临时记录)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfirmation {
    pub confirmation_id: String,          // 确认ID (UUID)
    pub production_id: i64,               // 待拆分的生产订单
    pub original_qty: f64,                // 原始目标数量
    pub future_qty: f64,                  // 拆分后总产量
    pub split_quantities: Vec<f64>,       // 各批数量 (存储为 JSON 文本)
    pub state: ConfirmationState,         // 状态
    pub created_at: NaiveDateTime,        // 创建时间
    pub decided_at: Option<NaiveDateTime>, // 确认/取消时间
}

impl SplitConfirmation {
    /// 超产数量
    pub fn overproduction_qty(&self) -> f64 {
        self.future_qty - self.original_qty
    }
}

// ==========================================
// SplitMaterialization - 批次落地方案
// ==========================================
// 由拆分执行器计算，仓储层按此写库
// 顺序: copies 按批次号递增，锚点订单 (原订单) 固定为最后一批
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMaterialization {
    pub anchor_id: i64,         // 原订单ID
    pub original_name: String,  // 原订单编号
    pub original_qty: f64,      // 原订单数量
    pub copies: Vec<BatchDraft>, // 新建副本 (前 N-1 批)
    pub anchor: BatchDraft,     // 原订单改写为最后一批
}

impl SplitMaterialization {
    /// 批次总数 N
    pub fn batch_count(&self) -> usize {
        self.copies.len() + 1
    }

    /// 按批次顺序遍历全部批次
    pub fn batches(&self) -> impl Iterator<Item = &BatchDraft> {
        self.copies.iter().chain(std::iter::once(&self.anchor))
    }

    /// 拆分后总产量
    pub fn total_qty(&self) -> f64 {
        self.batches().map(|b| b.product_qty).sum()
    }
}

/// 单个批次草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDraft {
    pub seq: usize,            // 批次号 (从1开始)
    pub name: String,          // {原编号}-{seq:03}
    pub product_id: i64,
    pub product_tmpl_id: i64,
    pub product_qty: f64,      // 本批数量
    pub ratio: f64,            // 本批数量 / 原订单数量
    pub moves: Vec<MoveDraft>, // 缩放后的组件消耗
}

/// 组件消耗草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDraft {
    pub source_move_id: i64, // 原订单上的消耗记录
    pub component_product_id: i64,
    pub product_uom_qty: f64,
    pub sequence: i32,
}

// ==========================================
// split_quantities 文本编码
// ==========================================
// 要求: 往返保持 f64 精确值与顺序

/// 编码拆分数量列表
pub fn encode_split_quantities(quantities: &[f64]) -> serde_json::Result<String> {
    serde_json::to_string(quantities)
}

/// 解码拆分数量列表
pub fn decode_split_quantities(raw: &str) -> serde_json::Result<Vec<f64>> {
    serde_json::from_str(raw)
}
