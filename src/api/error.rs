// ==========================================
// 印版排版系统 - API 层错误类型
// ==========================================
// 职责: 定义 API 层错误类型,转换 Repository 错误为用户友好的错误消息
// 红线: 拒绝的提交不得留下任何部分变更
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
/// 所有错误信息必须包含显式原因（可解释性）
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("无效的印版状态: {0}")]
    InvalidState(String),

    #[error("版材不兼容: 作业要求 {job_material}/{job_thickness}mm, 印版为 {plate_material}/{plate_thickness}mm")]
    IncompatibleMaterial {
        job_material: String,
        job_thickness: f64,
        plate_material: String,
        plate_thickness: f64,
    },

    #[error("无可用落位: 请求 {width_cm}x{height_cm}cm 在该印版上不存在合法位置")]
    DoesNotFit { width_cm: f64, height_cm: f64 },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                plate_id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "印版{}已被其他提交修改（期望revision={}，实际revision={}）",
                plate_id, expected, actual
            )),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
