// ==========================================
// 医院就诊负荷预测 - 外部协作方错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 环境数据源 / 历史数据源 / 文本生成服务错误
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("协作方不可用: {0}")]
    Unavailable(String),

    #[error("协作方调用超时: {operation} ({timeout_ms} ms)")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("历史数据不足: 需要 {required} 天，实际 {actual} 天")]
    InsufficientHistory { required: usize, actual: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ServiceResult<T> = Result<T, ServiceError>;
