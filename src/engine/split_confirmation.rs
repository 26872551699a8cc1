// ==========================================
// MRP 固定批量拆分 - 拆分确认状态机
// ==========================================
// 状态: PENDING → CONFIRMED (执行拆分) | CANCELLED (不做任何变更)
// 终态不可再转换，确认记录不复用
// ==========================================

use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use crate::domain::production::ProductionOrder;
use crate::domain::split::{encode_split_quantities, SplitConfirmation};
use crate::domain::types::ConfirmationState;
use crate::engine::error::{SplitError, SplitResult};
use crate::engine::split_planner::SplitPlan;

/// 确认框上的用户决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationEvent {
    Confirm,
    Cancel,
}

impl ConfirmationEvent {
    fn target(&self) -> ConfirmationState {
        match self {
            ConfirmationEvent::Confirm => ConfirmationState::Confirmed,
            ConfirmationEvent::Cancel => ConfirmationState::Cancelled,
        }
    }
}

/// 状态转换
///
/// # 规则
/// - Pending + Confirm → Confirmed
/// - Pending + Cancel → Cancelled
/// - 其它 → InvalidTransition
pub fn transition(from: ConfirmationState, event: ConfirmationEvent) -> SplitResult<ConfirmationState> {
    let to = event.target();
    match from {
        ConfirmationState::Pending => Ok(to),
        _ => Err(SplitError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

/// 校验确认记录仍描述订单现状 (订单数量未被改动)
pub fn ensure_current(confirmation: &SplitConfirmation, order: &ProductionOrder) -> SplitResult<()> {
    if confirmation.original_qty != order.product_qty {
        return Err(SplitError::StaleConfirmation {
            confirmation_id: confirmation.confirmation_id.clone(),
            original_qty: confirmation.original_qty,
            current_qty: order.product_qty,
        });
    }
    Ok(())
}

/// 由超产方案创建待确认记录
pub fn new_pending(plan: &SplitPlan) -> SplitConfirmation {
    SplitConfirmation {
        confirmation_id: uuid::Uuid::new_v4().to_string(),
        production_id: plan.production_id,
        original_qty: plan.original_qty,
        future_qty: plan.total_to_produce,
        split_quantities: plan.split_quantities.clone(),
        state: ConfirmationState::Pending,
        created_at: Utc::now().naive_utc(),
        decided_at: None,
    }
}

/// 确认框默认值上下文
pub fn dialog_context(confirmation: &SplitConfirmation) -> serde_json::Result<JsonValue> {
    Ok(json!({
        "default_production_id": confirmation.production_id,
        "default_original_qty": confirmation.original_qty,
        "default_future_qty": confirmation.future_qty,
        "default_split_quantities": encode_split_quantities(&confirmation.split_quantities)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> SplitPlan {
        SplitPlan {
            production_id: 5,
            product_tmpl_id: 4247,
            original_qty: 100.0,
            fixed_qty_per_batch: 41.0,
            required_batches: 3,
            split_quantities: vec![41.0, 41.0, 41.0],
            total_to_produce: 123.0,
        }
    }

    #[test]
    fn test_pending_transitions() {
        assert_eq!(
            transition(ConfirmationState::Pending, ConfirmationEvent::Confirm).unwrap(),
            ConfirmationState::Confirmed
        );
        assert_eq!(
            transition(ConfirmationState::Pending, ConfirmationEvent::Cancel).unwrap(),
            ConfirmationState::Cancelled
        );
    }

    #[test]
    fn test_terminal_states_reject_events() {
        for from in [ConfirmationState::Confirmed, ConfirmationState::Cancelled] {
            for event in [ConfirmationEvent::Confirm, ConfirmationEvent::Cancel] {
                assert!(matches!(
                    transition(from, event),
                    Err(SplitError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_new_pending_carries_plan() {
        let c = new_pending(&plan());
        assert_eq!(c.production_id, 5);
        assert_eq!(c.original_qty, 100.0);
        assert_eq!(c.future_qty, 123.0);
        assert_eq!(c.split_quantities, vec![41.0, 41.0, 41.0]);
        assert_eq!(c.state, ConfirmationState::Pending);
        assert_eq!(c.overproduction_qty(), 23.0);
    }

    #[test]
    fn test_ensure_current() {
        let c = new_pending(&plan());
        let now = Utc::now().naive_utc();
        let mut order = ProductionOrder {
            production_id: 5,
            name: "MO".to_string(),
            product_id: 1,
            product_tmpl_id: 4247,
            product_qty: 100.0,
            is_special_product: true,
            move_raw_ids: vec![],
            created_at: now,
            updated_at: now,
        };
        assert!(ensure_current(&c, &order).is_ok());

        order.product_qty = 41.0;
        match ensure_current(&c, &order) {
            Err(SplitError::StaleConfirmation {
                original_qty,
                current_qty,
                ..
            }) => {
                assert_eq!(original_qty, 100.0);
                assert_eq!(current_qty, 41.0);
            }
            other => panic!("Expected StaleConfirmation, got {:?}", other),
        }
    }

    #[test]
    fn test_dialog_context() {
        let ctx = dialog_context(&new_pending(&plan())).unwrap();
        assert_eq!(ctx["default_production_id"], 5);
        assert_eq!(ctx["default_future_qty"], 123.0);
        assert_eq!(ctx["default_split_quantities"], "[41.0,41.0,41.0]");
    }
}
