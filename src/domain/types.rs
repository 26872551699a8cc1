// ==========================================
// MRP 固定批量拆分 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 拆分确认状态 (Confirmation State)
// ==========================================
// 状态机: PENDING → CONFIRMED | CANCELLED，终态不可再变
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationState {
    Pending,   // 待确认
    Confirmed, // 已确认 (已执行拆分)
    Cancelled, // 已取消
}

impl ConfirmationState {
    /// 从数据库字符串解析
    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "PENDING" => Some(ConfirmationState::Pending),
            "CONFIRMED" => Some(ConfirmationState::Confirmed),
            "CANCELLED" => Some(ConfirmationState::Cancelled),
            _ => None,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConfirmationState::Pending)
    }
}

impl fmt::Display for ConfirmationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationState::Pending => write!(f, "PENDING"),
            ConfirmationState::Confirmed => write!(f, "CONFIRMED"),
            ConfirmationState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 动作打开方式 (Action Target)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTarget {
    Current, // 当前窗口
    New,     // 弹出对话框
}
