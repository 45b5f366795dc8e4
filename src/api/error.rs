// ==========================================
// 建材物料管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为业务错误
// 约定: 变更类错误携带出错的 id 与数量，便于定位
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入/权限错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("无权限: user={user}, action={action}")]
    Forbidden { user: String, action: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 台账业务错误
    // ==========================================
    #[error("库存不足: material_id={material_id}, requested={requested}, available={available}")]
    InsufficientStock {
        material_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("未占用或释放数量超出占用: project_id={project_id}, material_id={material_id}, requested={requested}, allocated={allocated}")]
    NotAllocated {
        project_id: i64,
        material_id: i64,
        requested: i64,
        allocated: i64,
    },

    #[error("补货单已收货: order_id={order_id}")]
    AlreadyReceived { order_id: i64 },

    #[error("工程无缺口，无需补货: project_id={project_id}")]
    NoShortfall { project_id: i64 },

    #[error("冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
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
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::Conflict(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::ValidationError(format!("检查约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl ApiError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{}(id={})不存在", entity, id))
    }

    /// 稳定的错误代码（供前端/调用方分支判断）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::NotAllocated { .. } => "NOT_ALLOCATED",
            ApiError::AlreadyReceived { .. } => "ALREADY_RECEIVED",
            ApiError::NoShortfall { .. } => "NO_SHORTFALL",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::DatabaseError(_) => "DATABASE",
            ApiError::Other(_) => "INTERNAL",
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::not_found("Material", 42).into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Material"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError =
            RepositoryError::UniqueConstraintViolation("material.code".to_string()).into();
        assert_eq!(api_err.code(), "CONFLICT");

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(api_err.code(), "DATABASE");

        let api_err: ApiError =
            RepositoryError::ValidationError("库存超出上限: material_id=3".to_string()).into();
        assert_eq!(api_err.code(), "VALIDATION");
    }

    #[test]
    fn test_error_messages_carry_ids() {
        let err = ApiError::InsufficientStock {
            material_id: 7,
            requested: 15,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("material_id=7"));
        assert!(msg.contains("requested=15"));
        assert!(msg.contains("available=3"));
    }
}
