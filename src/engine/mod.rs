// ==========================================
// MRP 固定批量拆分 - 引擎层
// ==========================================
// 职责: 拆分规划、批次落地、确认状态机
// 红线: Engine 不拼 SQL, 只计算和返回结果
// ==========================================

pub mod error;
pub mod split_confirmation;
pub mod split_executor;
pub mod split_planner;

// 重导出核心引擎
pub use error::{SplitError, SplitResult};
pub use split_confirmation::ConfirmationEvent;
pub use split_executor::{batch_name, SplitExecutor};
pub use split_planner::{plan_split, refresh_special_flag, SplitDecision, SplitPlan, SplitPlanner};
