// ==========================================
// MRP 固定批量拆分 - 命令行入口
// ==========================================
// 用法:
//   mrp-batch-split split <production_id>
//   mrp-batch-split split-fixed <production_id> <qty,qty,...>
//   mrp-batch-split confirm <confirmation_id>
//   mrp-batch-split cancel <confirmation_id>
//   mrp-batch-split import-rules <csv_path>
//
// 动作描述符以 JSON 输出到 stdout，日志输出到 stderr
// 提示语言: MRP_BATCH_SPLIT_LOCALE=zh-CN|en
// ==========================================

use anyhow::{anyhow, bail, Context};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mrp_batch_split::config::rule_import;
use mrp_batch_split::db::{init_schema, open_sqlite_connection};
use mrp_batch_split::{i18n, logging, ConfigManager, ProductionSplitApi};

const USAGE: &str = "用法: mrp-batch-split <split|split-fixed|confirm|cancel|import-rules> <参数...>";

/// 获取默认数据库路径
///
/// 优先级: MRP_BATCH_SPLIT_DB_PATH > 用户数据目录 > ./mrp_batch_split.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("MRP_BATCH_SPLIT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mrp_batch_split.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("mrp-batch-split");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("mrp_batch_split.db");
        }
    }

    path.to_string_lossy().to_string()
}

fn parse_quantities(raw: &str) -> anyhow::Result<Vec<f64>> {
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("无效的批次数量: {}", s))
        })
        .collect()
}

fn parse_production_id(raw: &str) -> anyhow::Result<i64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("无效的生产订单ID: {}", raw))
}

fn main() -> anyhow::Result<()> {
    logging::init();
    i18n::init_from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!(USAGE))?;

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, version = mrp_batch_split::VERSION, "使用数据库");

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));
    let config = Arc::new(ConfigManager::from_connection(conn.clone()));

    if command == "import-rules" {
        let path = rest.first().ok_or_else(|| anyhow!(USAGE))?;
        let rules = rule_import::read_rules_from_path(Path::new(path))?;
        let saved = config.save_split_rules(&rules)?;
        println!("{}", serde_json::json!({ "imported": saved }));
        return Ok(());
    }

    let api = ProductionSplitApi::new(conn, config, "cli");
    let action = match (command.as_str(), rest) {
        ("split", [id]) => api.action_auto_split_fixed_batches(&[parse_production_id(id)?])?,
        ("split-fixed", [id, quantities]) => {
            api.perform_fixed_split(&[parse_production_id(id)?], &parse_quantities(quantities)?)?
        }
        ("confirm", [confirmation_id]) => api.action_confirm_split(confirmation_id)?,
        ("cancel", [confirmation_id]) => api.action_cancel(confirmation_id)?,
        _ => bail!(USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&action)?);
    Ok(())
}
