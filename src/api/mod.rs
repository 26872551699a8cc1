// ==========================================
// MRP 固定批量拆分 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI / 界面分发器调用
// ==========================================

pub mod error;
pub mod split_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use split_api::ProductionSplitApi;
