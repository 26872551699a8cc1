// ==========================================
// MRP 固定批量拆分 - 动作描述符
// ==========================================
// 用途: API 返回给界面分发器的动作 (打开列表 / 弹出确认框 / 关闭窗口)
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::types::ActionTarget;

/// 生产订单模型名
pub const PRODUCTION_MODEL: &str = "mrp.production";

/// 拆分确认模型名
pub const SPLIT_CONFIRM_MODEL: &str = "mrp.auto.split.confirm";

// ==========================================
// ActionDescriptor - 动作描述符
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionDescriptor {
    /// 在模型上打开窗口 (按 ID 过滤)
    Window {
        name: String,
        res_model: String,
        view_mode: String,
        domain_ids: Vec<i64>,
        target: ActionTarget,
    },
    /// 弹出对话框
    Dialog {
        name: String,
        res_model: String,
        res_id: String,
        view_mode: String,
        target: ActionTarget,
        context: JsonValue,
    },
    /// 关闭当前对话框
    CloseWindow,
}

impl ActionDescriptor {
    /// 生产订单列表窗口
    pub fn production_window(name: impl Into<String>, ids: Vec<i64>) -> Self {
        ActionDescriptor::Window {
            name: name.into(),
            res_model: PRODUCTION_MODEL.to_string(),
            view_mode: "tree,form".to_string(),
            domain_ids: ids,
            target: ActionTarget::Current,
        }
    }

    /// 拆分确认对话框
    pub fn confirmation_dialog(
        name: impl Into<String>,
        confirmation_id: impl Into<String>,
        context: JsonValue,
    ) -> Self {
        ActionDescriptor::Dialog {
            name: name.into(),
            res_model: SPLIT_CONFIRM_MODEL.to_string(),
            res_id: confirmation_id.into(),
            view_mode: "form".to_string(),
            target: ActionTarget::New,
            context,
        }
    }

    /// 动作引用的记录ID (仅 Window)
    pub fn domain_ids(&self) -> &[i64] {
        match self {
            ActionDescriptor::Window { domain_ids, .. } => domain_ids,
            _ => &[],
        }
    }
}
