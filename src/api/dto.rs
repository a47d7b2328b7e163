// ==========================================
// 医院就诊负荷预测 - API 响应 DTO
// ==========================================
// 序列化: serde_json；日期为 YYYY-MM-DD，时间戳为本地时间
// ==========================================

use crate::domain::advisory::{Advisory, HealthRisk};
use crate::domain::environment::EnvironmentalSnapshot;
use crate::domain::prediction::ConfidenceInterval;
use crate::domain::types::{LoadLevel, ModelStatus, Severity};
use crate::engine::forecast::{ForecastDay, ForecastTrends};
use crate::engine::predictor::EvaluationMetrics;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// 当日负荷预测
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientLoad {
    pub prediction: f64,
    pub load_level: LoadLevel,
    pub confidence_interval: ConfidenceInterval,
    pub date: NaiveDate,
}

/// 当日公众建议
#[derive(Debug, Clone, Serialize)]
pub struct CurrentAdvisoryResponse {
    pub date: NaiveDate,
    pub patient_load: PatientLoad,
    pub environmental_factors: EnvironmentalSnapshot,
    pub advisories: Vec<Advisory>,
    pub health_tips: Vec<String>, // 最多 8 条
    pub narrative: Option<String>,
    pub last_updated: NaiveDateTime,
}

/// 多日预测
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyForecastResponse {
    pub forecast: Vec<ForecastDay>,
    pub trends: ForecastTrends,
    pub generated_at: NaiveDateTime,
}

/// 当前健康风险
#[derive(Debug, Clone, Serialize)]
pub struct HealthRisksResponse {
    pub current_risks: Vec<HealthRisk>,
    pub risk_level: Severity,
    pub recommendations: Vec<String>,
}

/// 模型状态
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfoResponse {
    pub model_loaded: bool,
    pub model_status: ModelStatus,
    pub narrative_available: bool,
    pub last_training_date: Option<NaiveDate>,
    pub feature_importance: BTreeMap<String, f64>,
    pub model_id: Option<String>,
    pub metrics: Option<EvaluationMetrics>,
    pub load_error: Option<String>,
}
