// ==========================================
// MRP 固定批量拆分 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化; 事务内方法以 _tx 结尾，由调用方持有事务
// ==========================================

pub mod action_log_repo;
pub mod confirmation_repo;
pub mod error;
pub mod production_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use confirmation_repo::SplitConfirmationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use production_repo::ProductionOrderRepository;
