// ==========================================
// 医院就诊负荷预测 - API 层
// ==========================================
// 职责: 公众建议 / 多日预测 / 健康风险 / 模型状态 / 环境因子
// ==========================================

pub mod advisory_api;
pub mod dto;
pub mod error;

// 重导出核心类型
pub use advisory_api::{AdvisoryApi, MAX_HEALTH_TIPS};
pub use dto::{
    CurrentAdvisoryResponse, HealthRisksResponse, ModelInfoResponse, PatientLoad,
    WeeklyForecastResponse,
};
pub use error::{ApiError, ApiResult};
