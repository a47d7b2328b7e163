// ==========================================
// 医院就诊负荷预测 - 领域模型层
// ==========================================
// 职责: 定义领域值对象与枚举类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod advisory;
pub mod environment;
pub mod prediction;
pub mod types;

// 重导出核心类型
pub use advisory::{Advisory, HealthRisk, HealthRiskAssessment, ShiftStaffing, StaffingPlan};
pub use environment::{EnvironmentalSnapshot, HistoricalLagContext};
pub use prediction::{
    ConfidenceInterval, FeatureVector, PredictionResult, FEATURE_COUNT, FEATURE_NAMES,
    FEATURE_SCHEMA_VERSION,
};
pub use types::{AdvisoryType, LoadLevel, ModelStatus, Severity, TrendDirection};
