// ==========================================
// MRP 固定批量拆分 - 拆分 API
// ==========================================
// 职责: 生产订单上的拆分动作 + 确认框上的确认/取消动作
// 事务: 每个动作一个事务；复制、改写、确认状态、操作日志同进同退
// 返回: ActionDescriptor，交由界面分发器处理
// ==========================================

use rusqlite::{Connection, Transaction};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{SplitRuleReader, SplitRuleTable};
use crate::domain::action::ActionDescriptor;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::production::ProductionOrder;
use crate::domain::split::SplitConfirmation;
use crate::engine::split_confirmation::{self, ConfirmationEvent};
use crate::engine::split_executor::SplitExecutor;
use crate::engine::split_planner::{plan_split, refresh_special_flag, SplitDecision, SplitPlanner};
use crate::i18n::{t, t_with_args};
use crate::repository::{
    ActionLogRepository, ProductionOrderRepository, SplitConfirmationRepository,
};

// ==========================================
// ProductionSplitApi - 拆分 API
// ==========================================

/// 拆分API
///
/// 职责：
/// 1. 规划拆分 (直接执行 / 创建待确认记录)
/// 2. 按给定批次数量执行拆分
/// 3. 确认 / 取消超产拆分
/// 4. ActionLog记录
pub struct ProductionSplitApi<C>
where
    C: SplitRuleReader,
{
    conn: Arc<Mutex<Connection>>,
    production_repo: Arc<ProductionOrderRepository>,
    confirmation_repo: Arc<SplitConfirmationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    planner: SplitPlanner<C>,
    executor: SplitExecutor,
    actor: String,
}

impl<C> ProductionSplitApi<C>
where
    C: SplitRuleReader,
{
    /// 创建新的 ProductionSplitApi 实例
    ///
    /// # 参数
    /// - conn: 共享数据库连接 (与各仓储同一连接)
    /// - rules: 批量规则读取器
    /// - actor: 操作人 (写入操作日志)
    pub fn new(conn: Arc<Mutex<Connection>>, rules: Arc<C>, actor: impl Into<String>) -> Self {
        Self {
            production_repo: Arc::new(ProductionOrderRepository::new(conn.clone())),
            confirmation_repo: Arc::new(SplitConfirmationRepository::new(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::new(conn.clone())),
            conn,
            planner: SplitPlanner::new(rules),
            executor: SplitExecutor::new(),
            actor: actor.into(),
        }
    }

    fn get_conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))
    }

    // ==========================================
    // 生产订单动作
    // ==========================================

    /// 自动按固定批量拆分
    ///
    /// # 参数
    /// - production_ids: 选中的生产订单 (必须恰好一条)
    ///
    /// # 返回
    /// - Ok(ActionDescriptor::Dialog): 超产，已创建待确认记录
    /// - Ok(ActionDescriptor::Window): 已直接拆分，打开全部结果订单
    /// - Err(ApiError::NotSpecialProduct): 产品不在允许列表 (无变更)
    /// - Err(ApiError::SingleRecordExpected): 非单条调用 (无变更)
    #[instrument(skip(self))]
    pub fn action_auto_split_fixed_batches(&self, production_ids: &[i64]) -> ApiResult<ActionDescriptor> {
        let production_id = ensure_one(production_ids)?;

        // 规则先于加锁读取 (ConfigManager 共用同一连接)
        let rules = self.planner.load_rules()?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let order = load_order_tx(&tx, production_id, &rules)?;
        let decision = plan_split(&rules, &order).map_err(|e| {
            warn!(production_id, error = %e, "拆分被拒绝");
            ApiError::from(e)
        })?;

        let action = match decision {
            SplitDecision::NeedsConfirmation(plan) => {
                let confirmation = split_confirmation::new_pending(&plan);
                SplitConfirmationRepository::insert_tx(&tx, &confirmation)?;
                ActionLogRepository::insert_tx(
                    &tx,
                    &ActionLog::new(
                        production_id,
                        ActionType::SplitRequested,
                        &self.actor,
                        Some(json!({
                            "confirmation_id": confirmation.confirmation_id,
                            "original_qty": confirmation.original_qty,
                            "future_qty": confirmation.future_qty,
                            "split_quantities": confirmation.split_quantities,
                        })),
                        Some(order.name.clone()),
                    ),
                )?;

                let context = split_confirmation::dialog_context(&confirmation)
                    .map_err(|e| ApiError::InternalError(e.to_string()))?;
                ActionDescriptor::confirmation_dialog(
                    t("split.overproduction_warning"),
                    confirmation.confirmation_id,
                    context,
                )
            }
            SplitDecision::Direct(plan) => {
                let ids = self.execute_split_tx(&tx, &order, &plan.split_quantities)?;
                ActionDescriptor::production_window(t("split.window_split_productions"), ids)
            }
        };

        tx.commit()?;
        Ok(action)
    }

    /// 按给定批次数量拆分
    ///
    /// # 参数
    /// - production_ids: 选中的生产订单 (必须恰好一条)
    /// - split_quantities: 各批数量，按批次顺序
    #[instrument(skip(self))]
    pub fn perform_fixed_split(
        &self,
        production_ids: &[i64],
        split_quantities: &[f64],
    ) -> ApiResult<ActionDescriptor> {
        let production_id = ensure_one(production_ids)?;
        let rules = self.planner.load_rules()?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let order = load_order_tx(&tx, production_id, &rules)?;
        let ids = self.execute_split_tx(&tx, &order, split_quantities)?;

        tx.commit()?;
        Ok(ActionDescriptor::production_window(
            t("split.window_split_productions"),
            ids,
        ))
    }

    // ==========================================
    // 确认框动作
    // ==========================================

    /// 确认超产拆分
    #[instrument(skip(self))]
    pub fn action_confirm_split(&self, confirmation_id: &str) -> ApiResult<ActionDescriptor> {
        let rules = self.planner.load_rules()?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let confirmation = load_confirmation_tx(&tx, confirmation_id)?;
        let to = split_confirmation::transition(confirmation.state, ConfirmationEvent::Confirm)?;

        let order = load_order_tx(&tx, confirmation.production_id, &rules)?;
        split_confirmation::ensure_current(&confirmation, &order).map_err(|e| {
            warn!(confirmation_id, error = %e, "确认记录与订单现状不一致");
            ApiError::from(e)
        })?;

        SplitConfirmationRepository::mark_decided_tx(&tx, confirmation_id, to)?;
        let ids = self.execute_split_tx(&tx, &order, &confirmation.split_quantities)?;

        tx.commit()?;
        info!(confirmation_id, production_id = confirmation.production_id, "超产拆分已确认");
        Ok(ActionDescriptor::production_window(
            t("split.window_split_productions"),
            ids,
        ))
    }

    /// 取消超产拆分 (不改动任何生产订单)
    #[instrument(skip(self))]
    pub fn action_cancel(&self, confirmation_id: &str) -> ApiResult<ActionDescriptor> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let confirmation = load_confirmation_tx(&tx, confirmation_id)?;
        let to = split_confirmation::transition(confirmation.state, ConfirmationEvent::Cancel)?;
        SplitConfirmationRepository::mark_decided_tx(&tx, confirmation_id, to)?;
        ActionLogRepository::insert_tx(
            &tx,
            &ActionLog::new(
                confirmation.production_id,
                ActionType::SplitCancelled,
                &self.actor,
                Some(json!({ "confirmation_id": confirmation_id })),
                None,
            ),
        )?;

        tx.commit()?;
        info!(confirmation_id, "超产拆分已取消");
        Ok(ActionDescriptor::CloseWindow)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询生产订单 (回填 is_special_product)
    pub fn get_production(&self, production_id: i64) -> ApiResult<Option<ProductionOrder>> {
        let rules = self.planner.load_rules()?;
        let order = self.production_repo.find_by_id(production_id)?;
        Ok(order.map(|mut o| {
            refresh_special_flag(&rules, &mut o);
            o
        }))
    }

    /// 查询动作描述符引用的订单
    pub fn list_productions(&self, ids: &[i64]) -> ApiResult<Vec<ProductionOrder>> {
        Ok(self.production_repo.find_by_ids(ids)?)
    }

    /// 查询拆分确认记录
    pub fn get_confirmation(&self, confirmation_id: &str) -> ApiResult<Option<SplitConfirmation>> {
        Ok(self.confirmation_repo.find_by_id(confirmation_id)?)
    }

    /// 查询订单的操作日志
    pub fn list_action_logs(&self, production_id: i64) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_production_id(production_id)?)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 在事务中执行拆分并记录日志
    fn execute_split_tx(
        &self,
        tx: &Transaction,
        order: &ProductionOrder,
        split_quantities: &[f64],
    ) -> ApiResult<Vec<i64>> {
        let materialization = self.executor.materialize(order, split_quantities)?;
        let ids = ProductionOrderRepository::apply_materialization_tx(tx, &materialization)?;
        // 拆分后订单数量已变，其余待确认记录作废
        let superseded =
            SplitConfirmationRepository::cancel_pending_for_production_tx(tx, order.production_id)?;

        ActionLogRepository::insert_tx(
            tx,
            &ActionLog::new(
                order.production_id,
                ActionType::SplitExecuted,
                &self.actor,
                Some(json!({
                    "original_qty": materialization.original_qty,
                    "split_quantities": split_quantities,
                    "production_ids": ids,
                    "superseded_confirmations": superseded,
                })),
                Some(materialization.original_name.clone()),
            ),
        )?;

        info!(
            production_id = order.production_id,
            batch_count = ids.len(),
            total_qty = materialization.total_qty(),
            superseded,
            "生产订单拆分完成"
        );
        Ok(ids)
    }
}

/// 单条记录前置条件
fn ensure_one(ids: &[i64]) -> ApiResult<i64> {
    match ids {
        [id] => Ok(*id),
        _ => Err(ApiError::single_record_expected(ids.len())),
    }
}

fn load_order_tx(tx: &Transaction, production_id: i64, rules: &SplitRuleTable) -> ApiResult<ProductionOrder> {
    let mut order = ProductionOrderRepository::find_by_id_tx(tx, production_id)?.ok_or_else(|| {
        ApiError::NotFound(t_with_args(
            "split.production_not_found",
            &[("id", &production_id.to_string())],
        ))
    })?;
    refresh_special_flag(rules, &mut order);
    Ok(order)
}

fn load_confirmation_tx(tx: &Transaction, confirmation_id: &str) -> ApiResult<SplitConfirmation> {
    SplitConfirmationRepository::find_by_id_tx(tx, confirmation_id)?.ok_or_else(|| {
        ApiError::NotFound(t_with_args(
            "split.confirmation_not_found",
            &[("id", confirmation_id)],
        ))
    })
}
