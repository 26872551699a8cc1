// ==========================================
// MRP 固定批量拆分 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("锁获取失败: {0}")]
    LockError(String),

    #[error("配置格式错误 (key={key}): {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置值无效 (key={key}): {message}")]
    InvalidValue { key: String, message: String },

    #[error("批量规则无效 (product_tmpl_id={product_tmpl_id}): {message}")]
    InvalidRule { product_tmpl_id: i64, message: String },

    #[error("批量规则重复: product_tmpl_id={0}")]
    DuplicateRule(i64),

    #[error("CSV 解析失败 (行{row}): {message}")]
    CsvParse { row: usize, message: String },

    #[error("文件读取失败: {0}")]
    FileRead(String),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ConfigError {
    fn from(err: csv::Error) -> Self {
        let row = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        ConfigError::CsvParse {
            row,
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
