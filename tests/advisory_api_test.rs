// ==========================================
// AdvisoryApi 集成测试
// ==========================================
// 测试目标: 五个对外接口 / 协作方降级 / 叙述服务 / AppState 装配
// ==========================================

mod test_helpers;

use async_trait::async_trait;
use chrono::NaiveDate;
use hospital_advisory::api::{AdvisoryApi, ApiError, MAX_HEALTH_TIPS};
use hospital_advisory::app::AppState;
use hospital_advisory::config::{config_keys, ConfigManager};
use hospital_advisory::domain::{
    AdvisoryType, EnvironmentalSnapshot, FeatureVector, HistoricalLagContext, LoadLevel,
    ModelStatus, Severity,
};
use hospital_advisory::engine::{DecisionEngine, LoadPredictor, LoadRegressor};
use hospital_advisory::services::{
    EnvironmentSource, HistorySource, NarrativeContext, NarrativeProvider,
    OptionalNarrativeProvider, SeriesHistorySource, ServiceError, ServiceResult,
    StaticEnvironmentSource, StaticHistorySource,
};
use hospital_advisory::training::TrainingPipeline;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{build_daily_series, create_test_db, date};

// ==========================================
// 测试替身
// ==========================================

#[derive(Debug)]
struct ConstantRegressor(f64);

impl LoadRegressor for ConstantRegressor {
    fn predict(&self, _features: &FeatureVector) -> f64 {
        self.0
    }

    fn member_predictions(&self, _features: &FeatureVector) -> Option<Vec<f64>> {
        None
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

struct SlowEnvironment;

#[async_trait]
impl EnvironmentSource for SlowEnvironment {
    async fn current_snapshot(&self, _date: NaiveDate) -> ServiceResult<EnvironmentalSnapshot> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(EnvironmentalSnapshot { aqi: 999, ..EnvironmentalSnapshot::default() })
    }
}

struct BrokenHistory;

#[async_trait]
impl HistorySource for BrokenHistory {
    async fn recent_lags(&self, _target: NaiveDate) -> ServiceResult<HistoricalLagContext> {
        Err(ServiceError::Unavailable("history db offline".to_string()))
    }
}

struct ChattyNarrative;

#[async_trait]
impl NarrativeProvider for ChattyNarrative {
    async fn is_available(&self) -> bool {
        true
    }

    async fn describe(&self, ctx: &NarrativeContext) -> ServiceResult<Option<String>> {
        Ok(Some(format!("{} advisories today.", ctx.advisories.len())))
    }

    async fn health_tips(&self, _env: &EnvironmentalSnapshot) -> ServiceResult<Option<Vec<String>>> {
        Ok(Some(vec!["extra 1".to_string(), "extra 2".to_string()]))
    }
}

fn severe_env() -> EnvironmentalSnapshot {
    EnvironmentalSnapshot {
        aqi: 400,
        temp: 40.0,
        epidemic_alert_level: 3,
        ..EnvironmentalSnapshot::default()
    }
}

fn api_with(
    predictor: LoadPredictor,
    environment: Arc<dyn EnvironmentSource>,
    history: Arc<dyn HistorySource>,
    narrative: OptionalNarrativeProvider,
) -> AdvisoryApi {
    AdvisoryApi::new(
        Arc::new(predictor),
        Arc::new(DecisionEngine::default()),
        environment,
        history,
        narrative,
    )
    .with_collaborator_timeout(Duration::from_millis(50))
    .with_fixed_date(date(2024, 7, 15))
}

// ==========================================
// 当日建议
// ==========================================

#[tokio::test]
async fn test_current_advisory_severe_day() {
    let api = api_with(
        LoadPredictor::with_model(Arc::new(ConstantRegressor(700.0)), ModelStatus::Trained),
        Arc::new(StaticEnvironmentSource::new(severe_env())),
        Arc::new(StaticHistorySource::default()),
        OptionalNarrativeProvider::new(Arc::new(ChattyNarrative), Duration::from_millis(200)),
    );

    let response = api.get_current_advisory().await.unwrap();
    assert_eq!(response.date, date(2024, 7, 15));
    assert_eq!(response.patient_load.prediction, 700.0);
    assert_eq!(response.patient_load.load_level, LoadLevel::Critical);
    assert_eq!(response.patient_load.confidence_interval.lower, 560.0);
    assert_eq!(response.advisories.len(), 4);
    assert_eq!(response.advisories[0].advisory_type, AdvisoryType::CapacityWarning);
    assert_eq!(response.narrative.as_deref(), Some("4 advisories today."));

    // 规则提示已满 8 条，叙述提示被截断
    assert_eq!(response.health_tips.len(), MAX_HEALTH_TIPS);
    assert!(!response.health_tips.iter().any(|t| t.starts_with("extra")));
}

#[tokio::test]
async fn test_narrative_tips_appended_on_calm_day() {
    let api = api_with(
        LoadPredictor::untrained(),
        Arc::new(StaticEnvironmentSource::new(EnvironmentalSnapshot::default())),
        Arc::new(StaticHistorySource::default()),
        OptionalNarrativeProvider::new(Arc::new(ChattyNarrative), Duration::from_millis(200)),
    );

    let response = api.get_current_advisory().await.unwrap();
    assert_eq!(response.health_tips.len(), 4);
    assert_eq!(response.health_tips[2], "extra 1");
}

#[tokio::test]
async fn test_collaborator_failures_use_defaults() {
    hospital_advisory::logging::init_test();

    let api = api_with(
        LoadPredictor::untrained(),
        Arc::new(SlowEnvironment),
        Arc::new(BrokenHistory),
        OptionalNarrativeProvider::disabled(),
    );

    let response = api.get_current_advisory().await.unwrap();
    assert_eq!(response.environmental_factors.aqi, 220);
    assert_eq!(response.environmental_factors.temp, 28.0);
    // 默认滞后 roll7 = 318
    assert_eq!(response.patient_load.prediction, 318.0);
    assert_eq!(response.narrative, None);

    let env = api.get_environmental_factors().await.unwrap();
    assert_eq!(env.aqi, 220);
}

// ==========================================
// 多日预测
// ==========================================

#[tokio::test]
async fn test_forecast_range_validation() {
    let api = api_with(
        LoadPredictor::untrained(),
        Arc::new(StaticEnvironmentSource::default()),
        Arc::new(StaticHistorySource::default()),
        OptionalNarrativeProvider::disabled(),
    );

    assert!(matches!(api.get_forecast(Some(0)).await, Err(ApiError::InvalidInput(_))));
    assert!(matches!(api.get_forecast(Some(15)).await, Err(ApiError::InvalidInput(_))));

    let forecast = api.get_forecast(Some(14)).await.unwrap();
    assert_eq!(forecast.forecast.len(), 14);
    assert_eq!(forecast.forecast[0].date, date(2024, 7, 15));
    assert_eq!(forecast.forecast[13].date, date(2024, 7, 28));
    assert_eq!(forecast.forecast[0].aqi, 220);
    assert_eq!(forecast.forecast[1].aqi, 225);
}

#[tokio::test]
async fn test_forecast_uses_imported_history() {
    let records = build_daily_series(date(2024, 6, 1), 44);
    let api = api_with(
        LoadPredictor::untrained(),
        Arc::new(StaticEnvironmentSource::default()),
        Arc::new(SeriesHistorySource::from_records(&records)),
        OptionalNarrativeProvider::disabled(),
    );

    let forecast = api.get_forecast(Some(2)).await.unwrap();
    let window: Vec<f64> = records[records.len() - 7..].iter().map(|r| r.patients).collect();
    let roll7 = window.iter().sum::<f64>() / 7.0;

    // 基线模型: 第 0 天 = roll7；第 1 天 = (roll7*6 + roll7)/7
    assert!((forecast.forecast[0].predicted_patients - roll7).abs() < 1e-9);
    assert!((forecast.forecast[1].predicted_patients - roll7).abs() < 1e-9);
}

#[tokio::test]
async fn test_stale_history_falls_back_to_default_lags() {
    let api = api_with(
        LoadPredictor::untrained(),
        Arc::new(StaticEnvironmentSource::default()),
        Arc::new(SeriesHistorySource::from_records(&build_daily_series(date(2024, 1, 1), 30))),
        OptionalNarrativeProvider::disabled(),
    );

    let response = api.get_current_advisory().await.unwrap();
    assert_eq!(response.patient_load.prediction, 318.0);
}

// ==========================================
// 健康风险 / 模型状态
// ==========================================

#[tokio::test]
async fn test_health_risks_for_severe_day() {
    let api = api_with(
        LoadPredictor::with_model(Arc::new(ConstantRegressor(700.0)), ModelStatus::Trained),
        Arc::new(StaticEnvironmentSource::new(severe_env())),
        Arc::new(StaticHistorySource::default()),
        OptionalNarrativeProvider::disabled(),
    );

    let risks = api.get_health_risks().await.unwrap();
    assert_eq!(risks.current_risks.len(), 3);
    assert_eq!(risks.risk_level, Severity::Critical);
    assert_eq!(risks.recommendations.len(), 8);
}

#[tokio::test]
async fn test_model_info_for_baseline() {
    let api = api_with(
        LoadPredictor::untrained(),
        Arc::new(StaticEnvironmentSource::default()),
        Arc::new(StaticHistorySource::default()),
        OptionalNarrativeProvider::disabled(),
    );

    let info = api.get_model_info().await.unwrap();
    assert!(!info.model_loaded);
    assert!(!info.narrative_available);
    assert!(info.feature_importance.is_empty());
    assert_eq!(info.last_training_date, None);
}

// ==========================================
// AppState 装配
// ==========================================

#[tokio::test]
async fn test_app_state_loads_configured_model() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("patient_predictor.json");
    let report = TrainingPipeline::default()
        .run(build_daily_series(date(2024, 1, 1), 100))
        .unwrap();
    report.save(&model_path).unwrap();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager
        .set_global_config_value(config_keys::MODEL_PATH, model_path.to_str().unwrap())
        .unwrap();
    manager.set_global_config_value(config_keys::LOCALE, "zh-CN").unwrap();

    let state = AppState::new(db_path).await.unwrap();
    assert_eq!(state.decision_engine.locale(), "zh-CN");

    let info = state.advisory_api.get_model_info().await.unwrap();
    assert!(info.model_loaded);
    assert_eq!(info.model_id.as_deref(), Some(report.artifact.model_id.as_str()));
    assert_eq!(info.last_training_date, Some(date(2024, 4, 9)));
    assert_eq!(info.feature_importance.len(), 13);
    assert_eq!(info.load_error, None);
}

#[tokio::test]
async fn test_app_state_with_missing_model_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager
        .set_global_config_value(
            config_keys::MODEL_PATH,
            dir.path().join("absent.json").to_str().unwrap(),
        )
        .unwrap();

    let state = AppState::new(db_path).await.unwrap();
    let info = state.advisory_api.get_model_info().await.unwrap();
    assert!(!info.model_loaded);
    assert!(info.load_error.is_some());
}
