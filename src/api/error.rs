// ==========================================
// 高校考试排考系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换Repository错误为用户友好的错误消息
// 红线: 可解释性 - 所有错误信息必须包含显式原因
// ==========================================

use crate::config::ConfigError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 公开操作要么完整成功,要么完整失败 (方案保持调用前状态)
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 排考业务错误
    // ==========================================
    /// 构造/审计发现硬约束违规 (携带违规数,明细在报告中)
    #[error("方案校验失败: {violation_count} 条硬违规")]
    ValidationError { violation_count: usize },

    /// 调用方要求全量落位,但存在排不下的模块
    #[error("存在无法落位的模块: {module_count} 个 (首个 {first_module_id})")]
    UnplaceableModule {
        module_count: usize,
        first_module_id: String,
    },

    /// 优化器前置条件不满足 (输入方案硬无效)
    #[error("前置条件不满足: {0}")]
    PreconditionFailed(String),

    // ==========================================
    // 配置错误 (搜索开始前拒绝)
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    // ==========================================
    // 数据访问错误 (对当次运行致命,原样传递)
    // ==========================================
    #[error("数据访问错误: {0}")]
    DataAccessError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 数据访问失败对当次运行致命,消息原样上抛
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DataAccessError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigurationError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
