// ==========================================
// MRP 固定批量拆分 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 对齐: action_log 表
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID
    pub production_id: i64,              // 关联生产订单
    pub action_type: String,             // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,        // 操作时间戳
    pub actor: String,                   // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

impl ActionLog {
    /// 以当前时间创建日志
    pub fn new(
        production_id: i64,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            production_id,
            action_type: action_type.to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    SplitRequested, // 超产，已创建待确认记录
    SplitExecuted,  // 拆分已执行
    SplitCancelled, // 拆分已取消
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::SplitRequested => write!(f, "SPLIT_REQUESTED"),
            ActionType::SplitExecuted => write!(f, "SPLIT_EXECUTED"),
            ActionType::SplitCancelled => write!(f, "SPLIT_CANCELLED"),
        }
    }
}
