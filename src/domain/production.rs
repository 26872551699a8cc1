// ==========================================
// MRP 固定批量拆分 - 生产订单领域模型
// ==========================================
// 对齐: production_order / stock_move_raw 表
// 红线: 组件消耗与订单数量严格线性缩放
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionOrder - 生产订单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub production_id: i64,               // 订单ID
    pub name: String,                     // 订单编号 (人工可读)
    pub product_id: i64,                  // 产品ID
    pub product_tmpl_id: i64,             // 产品模板ID (批量规则的键)
    pub product_qty: f64,                 // 目标数量
    pub is_special_product: bool,         // 是否为需固定批量拆分的特殊产品 (派生字段)
    pub move_raw_ids: Vec<ComponentMove>, // 组件消耗 (按 sequence 有序)
    pub created_at: NaiveDateTime,        // 创建时间
    pub updated_at: NaiveDateTime,        // 更新时间
}

impl ProductionOrder {
    /// 组件消耗总量
    pub fn total_component_qty(&self) -> f64 {
        self.move_raw_ids.iter().map(|m| m.product_uom_qty).sum()
    }

    /// 查找指定组件的消耗记录
    pub fn find_move(&self, component_product_id: i64) -> Option<&ComponentMove> {
        self.move_raw_ids
            .iter()
            .find(|m| m.component_product_id == component_product_id)
    }
}

// ==========================================
// ComponentMove - 组件消耗 (move_raw)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMove {
    pub move_id: i64,              // 消耗记录ID
    pub production_id: i64,        // 所属生产订单
    pub component_product_id: i64, // 原料产品ID
    pub product_uom_qty: f64,      // 需求数量
    pub sequence: i32,             // 顺序号
}

// ==========================================
// NewProductionOrder - 待创建的生产订单
// ==========================================
// 用途: 仓储层插入参数 (ID 由数据库分配)
#[derive(Debug, Clone)]
pub struct NewProductionOrder {
    pub name: String,
    pub product_id: i64,
    pub product_tmpl_id: i64,
    pub product_qty: f64,
    pub moves: Vec<NewComponentMove>,
}

#[derive(Debug, Clone)]
pub struct NewComponentMove {
    pub component_product_id: i64,
    pub product_uom_qty: f64,
    pub sequence: i32,
}
