// ==========================================
// MRP 固定批量拆分 - 拆分确认数据仓储
// ==========================================
// 对齐: split_confirmation 表
// 状态变更仅允许从 PENDING 出发 (条件更新防止重复决策)
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::split::{decode_split_quantities, encode_split_quantities, SplitConfirmation};
use crate::domain::types::ConfirmationState;
use crate::repository::error::{RepositoryError, RepositoryResult};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub struct SplitConfirmationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SplitConfirmationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中插入待确认记录
    pub fn insert_tx(tx: &Transaction, confirmation: &SplitConfirmation) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO split_confirmation (
                confirmation_id, production_id, original_qty, future_qty,
                split_quantities, state, created_at, decided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                confirmation.confirmation_id,
                confirmation.production_id,
                confirmation.original_qty,
                confirmation.future_qty,
                encode_split_quantities(&confirmation.split_quantities)?,
                confirmation.state.to_string(),
                confirmation.created_at.format(TS_FORMAT).to_string(),
                confirmation.decided_at.map(|t| t.format(TS_FORMAT).to_string()),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, confirmation_id: &str) -> RepositoryResult<Option<SplitConfirmation>> {
        let conn = self.get_conn()?;
        Self::find_with(&conn, confirmation_id)
    }

    /// 在事务中按ID查询
    pub fn find_by_id_tx(tx: &Transaction, confirmation_id: &str) -> RepositoryResult<Option<SplitConfirmation>> {
        Self::find_with(tx, confirmation_id)
    }

    /// 查询订单的待确认记录
    pub fn find_pending_by_production(&self, production_id: i64) -> RepositoryResult<Vec<SplitConfirmation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT confirmation_id, production_id, original_qty, future_qty,
                   split_quantities, state, created_at, decided_at
            FROM split_confirmation
            WHERE production_id = ?1 AND state = 'PENDING'
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![production_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 在事务中将待确认记录推进到终态
    ///
    /// 条件更新 `state = 'PENDING'`，已决策的记录返回 InvalidStateTransition。
    pub fn mark_decided_tx(
        tx: &Transaction,
        confirmation_id: &str,
        to: ConfirmationState,
    ) -> RepositoryResult<NaiveDateTime> {
        let decided_at = Utc::now().naive_utc();
        let rows = tx.execute(
            r#"
            UPDATE split_confirmation
            SET state = ?1, decided_at = ?2
            WHERE confirmation_id = ?3 AND state = 'PENDING'
            "#,
            params![
                to.to_string(),
                decided_at.format(TS_FORMAT).to_string(),
                confirmation_id
            ],
        )?;

        if rows == 0 {
            let current = Self::find_with(tx, confirmation_id)?.ok_or_else(|| {
                RepositoryError::NotFound {
                    entity: "SplitConfirmation".to_string(),
                    id: confirmation_id.to_string(),
                }
            })?;
            return Err(RepositoryError::InvalidStateTransition {
                from: current.state.to_string(),
                to: to.to_string(),
            });
        }

        Ok(decided_at)
    }

    /// 在事务中作废订单其余的待确认记录
    ///
    /// 订单拆分后，旧的待确认记录不再描述订单现状，统一置为 CANCELLED。
    ///
    /// # 返回
    /// 被作废的记录数
    pub fn cancel_pending_for_production_tx(
        tx: &Transaction,
        production_id: i64,
    ) -> RepositoryResult<usize> {
        let rows = tx.execute(
            r#"
            UPDATE split_confirmation
            SET state = ?1, decided_at = ?2
            WHERE production_id = ?3 AND state = 'PENDING'
            "#,
            params![
                ConfirmationState::Cancelled.to_string(),
                Utc::now().naive_utc().format(TS_FORMAT).to_string(),
                production_id
            ],
        )?;
        Ok(rows)
    }

    fn find_with(conn: &Connection, confirmation_id: &str) -> RepositoryResult<Option<SplitConfirmation>> {
        let row = conn
            .query_row(
                r#"
                SELECT confirmation_id, production_id, original_qty, future_qty,
                       split_quantities, state, created_at, decided_at
                FROM split_confirmation
                WHERE confirmation_id = ?1
                "#,
                params![confirmation_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_ts(raw: &str, idx: usize) -> SqliteResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| conversion_error(idx, e))
}

fn map_row(row: &Row) -> SqliteResult<SplitConfirmation> {
    let quantities_raw: String = row.get(4)?;
    let split_quantities = decode_split_quantities(&quantities_raw).map_err(|e| conversion_error(4, e))?;

    let state_raw: String = row.get(5)?;
    let state = ConfirmationState::from_db_str(&state_raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(5, format!("state={}", state_raw), rusqlite::types::Type::Text)
    })?;

    let created_raw: String = row.get(6)?;
    let decided_raw: Option<String> = row.get(7)?;

    Ok(SplitConfirmation {
        confirmation_id: row.get(0)?,
        production_id: row.get(1)?,
        original_qty: row.get(2)?,
        future_qty: row.get(3)?,
        split_quantities,
        state,
        created_at: parse_ts(&created_raw, 6)?,
        decided_at: decided_raw.as_deref().map(|s| parse_ts(s, 7)).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::NewProductionOrder;
    use crate::repository::production_repo::ProductionOrderRepository;

    fn setup() -> (Arc<Mutex<Connection>>, i64) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let production_id = ProductionOrderRepository::new(conn.clone())
            .insert(&NewProductionOrder {
                name: "MO/0009".to_string(),
                product_id: 1,
                product_tmpl_id: 4247,
                product_qty: 100.0,
                moves: vec![],
            })
            .unwrap();
        (conn, production_id)
    }

    fn pending(production_id: i64) -> SplitConfirmation {
        SplitConfirmation {
            confirmation_id: uuid::Uuid::new_v4().to_string(),
            production_id,
            original_qty: 100.0,
            future_qty: 123.0,
            split_quantities: vec![41.0, 41.0, 41.0],
            state: ConfirmationState::Pending,
            created_at: Utc::now().naive_utc(),
            decided_at: None,
        }
    }

    fn insert(conn: &Arc<Mutex<Connection>>, c: &SplitConfirmation) {
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        SplitConfirmationRepository::insert_tx(&tx, c).unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn test_insert_and_find() {
        let (conn, production_id) = setup();
        let repo = SplitConfirmationRepository::new(conn.clone());
        let c = pending(production_id);
        insert(&conn, &c);

        let found = repo.find_by_id(&c.confirmation_id).unwrap().unwrap();
        assert_eq!(found.split_quantities, vec![41.0, 41.0, 41.0]);
        assert_eq!(found.future_qty, 123.0);
        assert_eq!(found.state, ConfirmationState::Pending);
        assert!(found.decided_at.is_none());

        assert_eq!(repo.find_pending_by_production(production_id).unwrap().len(), 1);
    }

    #[test]
    fn test_mark_decided_only_once() {
        let (conn, production_id) = setup();
        let repo = SplitConfirmationRepository::new(conn.clone());
        let c = pending(production_id);
        insert(&conn, &c);

        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            SplitConfirmationRepository::mark_decided_tx(&tx, &c.confirmation_id, ConfirmationState::Cancelled)
                .unwrap();
            tx.commit().unwrap();
        }

        let found = repo.find_by_id(&c.confirmation_id).unwrap().unwrap();
        assert_eq!(found.state, ConfirmationState::Cancelled);
        assert!(found.decided_at.is_some());
        assert!(repo.find_pending_by_production(production_id).unwrap().is_empty());

        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        let result =
            SplitConfirmationRepository::mark_decided_tx(&tx, &c.confirmation_id, ConfirmationState::Confirmed);
        match result {
            Err(RepositoryError::InvalidStateTransition { from, to }) => {
                assert_eq!(from, "CANCELLED");
                assert_eq!(to, "CONFIRMED");
            }
            other => panic!("Expected InvalidStateTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_pending_for_production() {
        let (conn, production_id) = setup();
        let repo = SplitConfirmationRepository::new(conn.clone());
        let a = pending(production_id);
        let b = pending(production_id);
        let decided = pending(production_id);
        insert(&conn, &a);
        insert(&conn, &b);
        insert(&conn, &decided);

        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            SplitConfirmationRepository::mark_decided_tx(&tx, &decided.confirmation_id, ConfirmationState::Confirmed)
                .unwrap();
            let n = SplitConfirmationRepository::cancel_pending_for_production_tx(&tx, production_id).unwrap();
            assert_eq!(n, 2);
            tx.commit().unwrap();
        }

        assert!(repo.find_pending_by_production(production_id).unwrap().is_empty());
        for id in [&a.confirmation_id, &b.confirmation_id] {
            let c = repo.find_by_id(id).unwrap().unwrap();
            assert_eq!(c.state, ConfirmationState::Cancelled);
            assert!(c.decided_at.is_some());
        }
        let c = repo.find_by_id(&decided.confirmation_id).unwrap().unwrap();
        assert_eq!(c.state, ConfirmationState::Confirmed);
    }

    #[test]
    fn test_mark_missing_is_not_found() {
        let (conn, _) = setup();
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        let result = SplitConfirmationRepository::mark_decided_tx(&tx, "missing", ConfirmationState::Confirmed);
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }
}
