// ==========================================
// MRP 固定批量拆分 - 生产订单数据仓储
// ==========================================
// 对齐: production_order / stock_move_raw 表
// 红线: Repository 不含业务逻辑,只按批次落地方案写库
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::domain::production::{ComponentMove, NewComponentMove, NewProductionOrder, ProductionOrder};
use crate::domain::split::{BatchDraft, SplitMaterialization};
use crate::repository::error::{RepositoryError, RepositoryResult};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ==========================================
// ProductionOrderRepository - 生产订单仓储
// ==========================================
pub struct ProductionOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionOrderRepository {
    /// 创建新的生产订单仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入生产订单 (含组件消耗)
    ///
    /// # 返回
    /// - `Ok(production_id)`: 新订单ID
    pub fn insert(&self, order: &NewProductionOrder) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let id = Self::insert_tx(&tx, order)?;
        tx.commit()?;
        Ok(id)
    }

    /// 在事务中插入生产订单 (含组件消耗)
    pub fn insert_tx(tx: &Transaction, order: &NewProductionOrder) -> RepositoryResult<i64> {
        let now = now_str();
        tx.execute(
            r#"
            INSERT INTO production_order (
                name, product_id, product_tmpl_id, product_qty, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![
                order.name,
                order.product_id,
                order.product_tmpl_id,
                order.product_qty,
                now,
            ],
        )?;
        let production_id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO stock_move_raw (
                production_id, component_product_id, product_uom_qty, sequence
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;
        for mv in &order.moves {
            stmt.execute(params![
                production_id,
                mv.component_product_id,
                mv.product_uom_qty,
                mv.sequence,
            ])?;
        }

        Ok(production_id)
    }

    /// 在事务中按批次落地方案写库
    ///
    /// 1. 前 N-1 批: 复制为新订单 (含缩放后的组件消耗)
    /// 2. 最后一批: 原订单就地改写编号、数量与组件消耗
    ///
    /// # 返回
    /// 全部 N 个订单ID，按批次顺序，原订单在最后
    pub fn apply_materialization_tx(
        tx: &Transaction,
        plan: &SplitMaterialization,
    ) -> RepositoryResult<Vec<i64>> {
        let mut ids = Vec::with_capacity(plan.batch_count());

        for draft in &plan.copies {
            let id = Self::insert_copy_tx(tx, draft)?;
            debug!(production_id = id, name = %draft.name, qty = draft.product_qty, "副本订单已创建");
            ids.push(id);
        }

        Self::rewrite_anchor_tx(tx, plan.anchor_id, &plan.anchor)?;
        ids.push(plan.anchor_id);

        Ok(ids)
    }

    fn insert_copy_tx(tx: &Transaction, draft: &BatchDraft) -> RepositoryResult<i64> {
        let order = NewProductionOrder {
            name: draft.name.clone(),
            product_id: draft.product_id,
            product_tmpl_id: draft.product_tmpl_id,
            product_qty: draft.product_qty,
            moves: draft
                .moves
                .iter()
                .map(|m| NewComponentMove {
                    component_product_id: m.component_product_id,
                    product_uom_qty: m.product_uom_qty,
                    sequence: m.sequence,
                })
                .collect(),
        };
        Self::insert_tx(tx, &order)
    }

    fn rewrite_anchor_tx(tx: &Transaction, anchor_id: i64, draft: &BatchDraft) -> RepositoryResult<()> {
        let rows = tx.execute(
            "UPDATE production_order SET name = ?1, product_qty = ?2, updated_at = ?3 WHERE production_id = ?4",
            params![draft.name, draft.product_qty, now_str(), anchor_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionOrder".to_string(),
                id: anchor_id.to_string(),
            });
        }

        let mut stmt = tx.prepare(
            "UPDATE stock_move_raw SET product_uom_qty = ?1 WHERE move_id = ?2 AND production_id = ?3",
        )?;
        for mv in &draft.moves {
            let rows = stmt.execute(params![mv.product_uom_qty, mv.source_move_id, anchor_id])?;
            if rows == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "ComponentMove".to_string(),
                    id: mv.source_move_id.to_string(),
                });
            }
        }

        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询生产订单 (含组件消耗)
    pub fn find_by_id(&self, production_id: i64) -> RepositoryResult<Option<ProductionOrder>> {
        let conn = self.get_conn()?;
        Self::find_with(&conn, production_id)
    }

    /// 在事务中按ID查询生产订单
    pub fn find_by_id_tx(tx: &Transaction, production_id: i64) -> RepositoryResult<Option<ProductionOrder>> {
        Self::find_with(tx, production_id)
    }

    /// 按ID列表查询 (保持入参顺序，跳过不存在的ID)
    pub fn find_by_ids(&self, ids: &[i64]) -> RepositoryResult<Vec<ProductionOrder>> {
        let conn = self.get_conn()?;
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = Self::find_with(&conn, *id)? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    /// 订单总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM production_order", [], |row| row.get(0))?;
        Ok(n)
    }

    fn find_with(conn: &Connection, production_id: i64) -> RepositoryResult<Option<ProductionOrder>> {
        let order = conn
            .query_row(
                r#"
                SELECT production_id, name, product_id, product_tmpl_id, product_qty,
                       created_at, updated_at
                FROM production_order
                WHERE production_id = ?1
                "#,
                params![production_id],
                map_order_row,
            )
            .optional()?;

        let mut order = match order {
            Some(o) => o,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT move_id, production_id, component_product_id, product_uom_qty, sequence
            FROM stock_move_raw
            WHERE production_id = ?1
            ORDER BY sequence ASC, move_id ASC
            "#,
        )?;
        order.move_raw_ids = stmt
            .query_map(params![production_id], map_move_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(Some(order))
    }
}

fn now_str() -> String {
    Utc::now().naive_utc().format(TS_FORMAT).to_string()
}

fn parse_ts(row: &Row, idx: usize) -> SqliteResult<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 映射数据库行到 ProductionOrder (组件消耗另行加载)
fn map_order_row(row: &Row) -> SqliteResult<ProductionOrder> {
    Ok(ProductionOrder {
        production_id: row.get(0)?,
        name: row.get(1)?,
        product_id: row.get(2)?,
        product_tmpl_id: row.get(3)?,
        product_qty: row.get(4)?,
        // 派生字段，由规则表回填
        is_special_product: false,
        move_raw_ids: Vec::new(),
        created_at: parse_ts(row, 5)?,
        updated_at: parse_ts(row, 6)?,
    })
}

fn map_move_row(row: &Row) -> SqliteResult<ComponentMove> {
    Ok(ComponentMove {
        move_id: row.get(0)?,
        production_id: row.get(1)?,
        component_product_id: row.get(2)?,
        product_uom_qty: row.get(3)?,
        sequence: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::split::MoveDraft;

    fn setup() -> (Arc<Mutex<Connection>>, ProductionOrderRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), ProductionOrderRepository::new(conn))
    }

    fn sample_order() -> NewProductionOrder {
        NewProductionOrder {
            name: "MO/0001".to_string(),
            product_id: 10,
            product_tmpl_id: 4247,
            product_qty: 82.0,
            moves: vec![
                NewComponentMove {
                    component_product_id: 501,
                    product_uom_qty: 20.0,
                    sequence: 1,
                },
                NewComponentMove {
                    component_product_id: 502,
                    product_uom_qty: 8.0,
                    sequence: 2,
                },
            ],
        }
    }

    #[test]
    fn test_insert_and_find() {
        let (_conn, repo) = setup();
        let id = repo.insert(&sample_order()).unwrap();

        let order = repo.find_by_id(id).unwrap().expect("order should exist");
        assert_eq!(order.name, "MO/0001");
        assert_eq!(order.product_qty, 82.0);
        assert_eq!(order.move_raw_ids.len(), 2);
        assert_eq!(order.move_raw_ids[0].component_product_id, 501);
        assert_eq!(order.move_raw_ids[1].product_uom_qty, 8.0);

        assert!(repo.find_by_id(id + 100).unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_apply_materialization() {
        let (conn, repo) = setup();
        let id = repo.insert(&sample_order()).unwrap();
        let original = repo.find_by_id(id).unwrap().unwrap();

        let draft = |seq: usize| BatchDraft {
            seq,
            name: format!("MO/0001-{:03}", seq),
            product_id: 10,
            product_tmpl_id: 4247,
            product_qty: 41.0,
            ratio: 0.5,
            moves: original
                .move_raw_ids
                .iter()
                .map(|m| MoveDraft {
                    source_move_id: m.move_id,
                    component_product_id: m.component_product_id,
                    product_uom_qty: m.product_uom_qty * 0.5,
                    sequence: m.sequence,
                })
                .collect(),
        };
        let plan = SplitMaterialization {
            anchor_id: id,
            original_name: "MO/0001".to_string(),
            original_qty: 82.0,
            copies: vec![draft(1)],
            anchor: draft(2),
        };

        let ids = {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            let ids = ProductionOrderRepository::apply_materialization_tx(&tx, &plan).unwrap();
            tx.commit().unwrap();
            ids
        };

        assert_eq!(ids.len(), 2);
        assert_eq!(*ids.last().unwrap(), id);

        let orders = repo.find_by_ids(&ids).unwrap();
        assert_eq!(orders[0].name, "MO/0001-001");
        assert_eq!(orders[1].name, "MO/0001-002");
        for order in &orders {
            assert_eq!(order.product_qty, 41.0);
            assert_eq!(order.move_raw_ids[0].product_uom_qty, 10.0);
            assert_eq!(order.move_raw_ids[1].product_uom_qty, 4.0);
        }
    }

    #[test]
    fn test_rollback_leaves_store_unchanged() {
        let (conn, repo) = setup();
        let id = repo.insert(&sample_order()).unwrap();

        let bad_anchor = BatchDraft {
            seq: 2,
            name: "X-002".to_string(),
            product_id: 10,
            product_tmpl_id: 4247,
            product_qty: 41.0,
            ratio: 0.5,
            moves: vec![MoveDraft {
                source_move_id: 9999,
                component_product_id: 501,
                product_uom_qty: 1.0,
                sequence: 1,
            }],
        };
        let mut copy = bad_anchor.clone();
        copy.seq = 1;
        copy.name = "X-001".to_string();
        let plan = SplitMaterialization {
            anchor_id: id,
            original_name: "X".to_string(),
            original_qty: 82.0,
            copies: vec![copy],
            anchor: bad_anchor,
        };

        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            let result = ProductionOrderRepository::apply_materialization_tx(&tx, &plan);
            assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
            // tx drop → 回滚
        }

        assert_eq!(repo.count().unwrap(), 1);
        let order = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(order.name, "MO/0001");
        assert_eq!(order.product_qty, 82.0);
    }
}
