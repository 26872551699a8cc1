// ==========================================
// MRP 固定批量拆分 - 批量规则 CSV 导入
// ==========================================
// 文件格式 (含表头):
//   product_tmpl_id,fixed_qty_per_batch,min_batches,label
// min_batches / label 可留空
// ==========================================

use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::split_rule::{SplitRule, SplitRuleTable, DEFAULT_FIXED_QTY_PER_BATCH};

/// 从 CSV 文件读取批量规则
#[instrument]
pub fn read_rules_from_path(path: &Path) -> ConfigResult<Vec<SplitRule>> {
    if !path.exists() {
        return Err(ConfigError::FileRead(format!("文件不存在: {}", path.display())));
    }

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let rules = parse_records(reader)?;

    info!(count = rules.len(), "批量规则 CSV 读取完成");
    Ok(rules)
}

/// 从任意输入读取批量规则
pub fn read_rules<R: Read>(input: R) -> ConfigResult<Vec<SplitRule>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    parse_records(reader)
}

fn parse_records<R: Read>(mut reader: csv::Reader<R>) -> ConfigResult<Vec<SplitRule>> {
    let mut rules = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_idx + 2; // 行号从1开始,且跳过header

        let product_tmpl_id = get_field(&record, 0)
            .ok_or_else(|| missing(row, "product_tmpl_id"))?
            .parse::<i64>()
            .map_err(|e| invalid(row, "product_tmpl_id", e))?;

        let fixed_qty_per_batch = get_field(&record, 1)
            .ok_or_else(|| missing(row, "fixed_qty_per_batch"))?
            .parse::<f64>()
            .map_err(|e| invalid(row, "fixed_qty_per_batch", e))?;

        let min_batches = match get_field(&record, 2) {
            Some(raw) => raw.parse::<u32>().map_err(|e| invalid(row, "min_batches", e))?,
            None => 1,
        };

        let rule = SplitRule {
            product_tmpl_id,
            fixed_qty_per_batch,
            min_batches,
            label: get_field(&record, 3).map(|s| s.to_string()),
        };
        rule.validate()?;
        rules.push(rule);
    }

    // 重复检查与整体校验
    SplitRuleTable::from_rules(rules.clone(), DEFAULT_FIXED_QTY_PER_BATCH)?;
    Ok(rules)
}

fn get_field(record: &csv::StringRecord, index: usize) -> Option<&str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

fn missing(row: usize, field: &str) -> ConfigError {
    ConfigError::CsvParse {
        row,
        message: format!("缺少字段 {}", field),
    }
}

fn invalid(row: usize, field: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::CsvParse {
        row,
        message: format!("字段 {} 格式错误: {}", field, err),
    }
}
