// ==========================================
// 医院就诊负荷预测 - API层错误类型
// ==========================================
// 职责: 定义 API 层错误类型，将模型层错误转换为调用方可读的消息
// 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::ModelError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 模型错误
    // ==========================================
    /// 要求已训练模型但当前为基线模型
    #[error("预测模型不可用: {0}")]
    ModelUnavailable(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ModelError 转换
// ==========================================
impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ArtifactNotFound(_)
            | ModelError::ArtifactIo(_)
            | ModelError::ArtifactFormat(_)
            | ModelError::SchemaVersionMismatch { .. }
            | ModelError::FeatureNamesMismatch(_) => ApiError::ModelUnavailable(err.to_string()),
            ModelError::EmptyTrainingSet | ModelError::InsufficientTrainingData { .. } => {
                ApiError::InvalidInput(err.to_string())
            }
            ModelError::InternalError(msg) => ApiError::InternalError(msg),
            ModelError::Other(e) => ApiError::Other(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 输入校验辅助函数
// ==========================================

/// 校验预测天数，None 时使用默认值
pub fn validate_forecast_days(days: Option<u32>, default: u32, max: u32) -> ApiResult<u32> {
    let days = days.unwrap_or(default);
    if days == 0 || days > max {
        return Err(ApiError::InvalidInput(format!(
            "预测天数必须在 1..={} 之间，实际 {}",
            max, days
        )));
    }
    Ok(days)
}
