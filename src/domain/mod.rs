// ==========================================
// MRP 固定批量拆分 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action;
pub mod action_log;
pub mod production;
pub mod split;
pub mod types;

// 重导出核心类型
pub use action::ActionDescriptor;
pub use action_log::{ActionLog, ActionType};
pub use production::{ComponentMove, NewComponentMove, NewProductionOrder, ProductionOrder};
pub use split::{BatchDraft, MoveDraft, SplitConfirmation, SplitMaterialization};
pub use types::{ActionTarget, ConfirmationState};
