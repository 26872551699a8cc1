// ==========================================
// MRP 固定批量拆分 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换 Repository / Engine 错误为用户可读的错误消息
// ==========================================

use crate::config::ConfigError;
use crate::engine::error::SplitError;
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 前置条件错误 (阻断，不做任何变更)
    // ==========================================
    /// 产品不在批量拆分允许列表中
    #[error("{message}")]
    NotSpecialProduct {
        production_id: i64,
        product_tmpl_id: i64,
        message: String,
    },

    /// 动作只能作用于单条记录
    #[error("{message}")]
    SingleRecordExpected { count: usize, message: String },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    /// 拆分计算失败 (数量非正 / 列表为空等)
    #[error("拆分失败: {0}")]
    Split(String),

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 非单条记录调用
    pub fn single_record_expected(count: usize) -> Self {
        ApiError::SingleRecordExpected {
            count,
            message: t_with_args("split.expected_single_record", &[("count", &count.to_string())]),
        }
    }

    /// 是否为阻断型的前置条件错误
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ApiError::NotSpecialProduct { .. } | ApiError::SingleRecordExpected { .. }
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 SplitError 转换
// ==========================================
impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        match err {
            SplitError::NotSpecialProduct {
                production_id,
                product_tmpl_id,
            } => ApiError::NotSpecialProduct {
                production_id,
                product_tmpl_id,
                message: t("split.not_special_product"),
            },
            SplitError::InvalidTransition { from, to } => ApiError::InvalidStateTransition { from, to },
            SplitError::Config(e) => ApiError::Config(e),
            other => ApiError::Split(other.to_string()),
        }
    }
}

// 事务提交/开启失败
impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::DatabaseTransactionError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ProductionOrder".to_string(),
            id: "17".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ProductionOrder"));
                assert!(msg.contains("17"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::InvalidStateTransition {
            from: "CANCELLED".to_string(),
            to: "CONFIRMED".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_split_error_conversion() {
        let api_err: ApiError = SplitError::NotSpecialProduct {
            production_id: 3,
            product_tmpl_id: 99,
        }
        .into();
        assert!(api_err.is_precondition());
        match api_err {
            ApiError::NotSpecialProduct {
                production_id,
                product_tmpl_id,
                message,
            } => {
                assert_eq!(production_id, 3);
                assert_eq!(product_tmpl_id, 99);
                assert!(!message.is_empty());
            }
            _ => panic!("Expected NotSpecialProduct"),
        }

        let api_err: ApiError = SplitError::EmptySplit(3).into();
        assert!(matches!(api_err, ApiError::Split(_)));
        assert!(!api_err.is_precondition());
    }

    #[test]
    fn test_single_record_expected() {
        let err = ApiError::single_record_expected(2);
        assert!(err.is_precondition());
        assert!(err.to_string().contains('2'));
    }
}
