// ==========================================
// MRP 固定批量拆分 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 将特殊产品的生产订单按固定批量拆分为多张订单
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 拆分规则
pub mod engine;

// 配置层 - 批量规则
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ActionTarget, ConfirmationState};

// 领域实体
pub use domain::{
    ActionDescriptor, ActionLog, ActionType, ComponentMove, NewComponentMove, NewProductionOrder,
    ProductionOrder, SplitConfirmation,
};

// 配置
pub use config::{ConfigManager, SplitRule, SplitRuleReader, SplitRuleTable};

// 引擎
pub use engine::{SplitDecision, SplitExecutor, SplitPlan, SplitPlanner};

// API
pub use api::{ApiError, ApiResult, ProductionSplitApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "MRP 固定批量拆分";
