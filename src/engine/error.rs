// ==========================================
// 医院就诊负荷预测 - 模型层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 模型训练 / 产物持久化错误
#[derive(Error, Debug)]
pub enum ModelError {
    // ===== 产物文件错误 =====
    #[error("模型文件不存在: {0}")]
    ArtifactNotFound(String),

    #[error("模型文件读写失败: {0}")]
    ArtifactIo(String),

    #[error("模型文件解析失败: {0}")]
    ArtifactFormat(String),

    #[error("特征 schema 不兼容: 产物版本={found}, 当前版本={expected}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    #[error("特征列表不一致: {0}")]
    FeatureNamesMismatch(String),

    // ===== 训练错误 =====
    #[error("训练样本为空")]
    EmptyTrainingSet,

    #[error("训练样本不足: 需要多于 {required} 行，实际 {actual} 行")]
    InsufficientTrainingData { required: usize, actual: usize },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::ArtifactIo(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::ArtifactFormat(err.to_string())
    }
}

/// Result 类型别名
pub type ModelResult<T> = Result<T, ModelError>;
