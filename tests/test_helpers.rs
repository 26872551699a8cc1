// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use mrp_batch_split::db::{init_schema, open_sqlite_connection};
use mrp_batch_split::domain::{NewComponentMove, NewProductionOrder};
use mrp_batch_split::repository::ProductionOrderRepository;
use mrp_batch_split::{ConfigManager, ProductionSplitApi};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 完整测试环境: 临时库 + 共享连接 + 配置 + API
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub config: Arc<ConfigManager>,
    pub api: ProductionSplitApi<ConfigManager>,
    pub production_repo: ProductionOrderRepository,
}

impl TestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let (temp_file, db_path) = create_test_db()?;
        let conn = open_shared_connection(&db_path)?;
        let config = Arc::new(ConfigManager::from_connection(conn.clone()));
        let api = ProductionSplitApi::new(conn.clone(), config.clone(), "tester");
        let production_repo = ProductionOrderRepository::new(conn.clone());

        Ok(Self {
            _temp_file: temp_file,
            db_path,
            conn,
            config,
            api,
            production_repo,
        })
    }

    /// 插入一张生产订单，组件消耗为 (原料产品ID, 数量)
    pub fn seed_order(
        &self,
        name: &str,
        product_tmpl_id: i64,
        product_qty: f64,
        moves: &[(i64, f64)],
    ) -> Result<i64, Box<dyn Error>> {
        let order = NewProductionOrder {
            name: name.to_string(),
            product_id: product_tmpl_id * 10,
            product_tmpl_id,
            product_qty,
            moves: moves
                .iter()
                .enumerate()
                .map(|(idx, (component_product_id, qty))| NewComponentMove {
                    component_product_id: *component_product_id,
                    product_uom_qty: *qty,
                    sequence: idx as i32 + 1,
                })
                .collect(),
        };
        Ok(self.production_repo.insert(&order)?)
    }

    /// 指定表的记录数
    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = self.conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }
}

/// 浮点近似比较
pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} ≈ {}",
        actual,
        expected
    );
}
