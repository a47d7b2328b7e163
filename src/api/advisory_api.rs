// ==========================================
// 医院就诊负荷预测 - 公众建议 API
// ==========================================
// 职责: 组合 预测器 + 决策引擎 + 外部协作方，输出公众建议
// 架构: API 层 → Engine 层 (LoadPredictor / DecisionEngine / Forecaster)
// 降级: 环境 / 历史数据源失败或超时时使用默认值；叙述服务失败时省略叙述
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::api::dto::{
    CurrentAdvisoryResponse, HealthRisksResponse, ModelInfoResponse, PatientLoad,
    WeeklyForecastResponse,
};
use crate::api::error::{validate_forecast_days, ApiError, ApiResult};
use crate::config::DEFAULT_COLLABORATOR_TIMEOUT_MS;
use crate::domain::environment::{EnvironmentalSnapshot, HistoricalLagContext};
use crate::engine::decision::DecisionEngine;
use crate::engine::forecast::{Forecaster, DEFAULT_FORECAST_DAYS, MAX_FORECAST_DAYS};
use crate::engine::predictor::LoadPredictor;
use crate::services::{
    call_with_timeout, default_current_snapshot, default_recent_lags, EnvironmentSource,
    HistorySource, NarrativeContext, OptionalNarrativeProvider,
};

/// 当日建议最多返回的健康提示条数
pub const MAX_HEALTH_TIPS: usize = 8;

// ==========================================
// AdvisoryApi - 公众建议 API
// ==========================================
pub struct AdvisoryApi {
    predictor: Arc<LoadPredictor>,
    engine: Arc<DecisionEngine>,
    environment: Arc<dyn EnvironmentSource>,
    history: Arc<dyn HistorySource>,
    narrative: OptionalNarrativeProvider,
    collaborator_timeout: Duration,
    require_trained_model: bool,
    fixed_date: Option<NaiveDate>,
}

impl AdvisoryApi {
    /// 创建新的 AdvisoryApi 实例
    ///
    /// # 参数
    /// - predictor: 负荷预测器（启动时加载，只读共享）
    /// - engine: 决策引擎
    /// - environment / history: 外部数据源
    /// - narrative: 文本生成服务（可为空实现）
    pub fn new(
        predictor: Arc<LoadPredictor>,
        engine: Arc<DecisionEngine>,
        environment: Arc<dyn EnvironmentSource>,
        history: Arc<dyn HistorySource>,
        narrative: OptionalNarrativeProvider,
    ) -> Self {
        Self {
            predictor,
            engine,
            environment,
            history,
            narrative,
            collaborator_timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            require_trained_model: false,
            fixed_date: None,
        }
    }

    /// 设置外部数据源调用超时
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    /// 未加载训练模型时拒绝预测类请求
    pub fn require_trained_model(mut self, required: bool) -> Self {
        self.require_trained_model = required;
        self
    }

    /// 固定"今天"（回放 / 测试）
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn predictor(&self) -> &LoadPredictor {
        &self.predictor
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    // ==========================================
    // 对外接口
    // ==========================================

    /// 当日公众建议
    pub async fn get_current_advisory(&self) -> ApiResult<CurrentAdvisoryResponse> {
        self.ensure_model_ready()?;

        let today = self.today();
        let env = self.environment_snapshot(today).await;
        let lags = self.recent_lags(today).await;

        let result = self.predictor.predict(today, &env, &lags);
        let load_level = self.engine.classify_load(result.prediction);
        let advisories = self.engine.generate_patient_advisory(result.prediction, &env);
        let mut health_tips = self.engine.get_health_tips(load_level, &env);

        let context = NarrativeContext {
            predicted_patients: result.prediction,
            load_level,
            env,
            advisories: advisories.clone(),
        };
        let narrative = self.narrative.describe(&context).await;
        health_tips.extend(self.narrative.health_tips(&env).await);
        health_tips.truncate(MAX_HEALTH_TIPS);

        tracing::info!(
            date = %today,
            prediction = result.prediction,
            load_level = %load_level,
            advisories = advisories.len(),
            narrative = narrative.is_some(),
            "生成当日公众建议"
        );

        Ok(CurrentAdvisoryResponse {
            date: today,
            patient_load: PatientLoad {
                prediction: result.prediction,
                load_level,
                confidence_interval: result.confidence_interval,
                date: result.date,
            },
            environmental_factors: env,
            advisories,
            health_tips,
            narrative,
            last_updated: Local::now().naive_local(),
        })
    }

    /// 多日预测
    ///
    /// # 参数
    /// - days: 预测天数（None 时为 7；有效范围 1..=14）
    pub async fn get_forecast(&self, days: Option<u32>) -> ApiResult<WeeklyForecastResponse> {
        let days = validate_forecast_days(days, DEFAULT_FORECAST_DAYS, MAX_FORECAST_DAYS)?;
        self.ensure_model_ready()?;

        let today = self.today();
        let base_env = self.environment_snapshot(today).await;
        let lags = self.recent_lags(today).await;

        let forecast = Forecaster::new(&self.predictor, &self.engine)
            .forecast(today, days, &base_env, lags)
            .ok_or_else(|| ApiError::InternalError(format!("预测结果为空: days={}", days)))?;

        tracing::info!(
            start = %today,
            days,
            peak_day = %forecast.trends.peak_day,
            "生成多日预测"
        );

        Ok(WeeklyForecastResponse {
            forecast: forecast.days,
            trends: forecast.trends,
            generated_at: Local::now().naive_local(),
        })
    }

    /// 当前健康风险
    pub async fn get_health_risks(&self) -> ApiResult<HealthRisksResponse> {
        self.ensure_model_ready()?;

        let today = self.today();
        let env = self.environment_snapshot(today).await;
        let lags = self.recent_lags(today).await;

        let result = self.predictor.predict(today, &env, &lags);
        let assessment = self.engine.assess_health_risks(result.prediction, &env);

        tracing::debug!(
            risk_level = %assessment.risk_level,
            risks = assessment.current_risks.len(),
            "健康风险评估完成"
        );

        Ok(HealthRisksResponse {
            current_risks: assessment.current_risks,
            risk_level: assessment.risk_level,
            recommendations: assessment.recommendations,
        })
    }

    /// 模型状态
    pub async fn get_model_info(&self) -> ApiResult<ModelInfoResponse> {
        let metadata = self.predictor.metadata();

        Ok(ModelInfoResponse {
            model_loaded: self.predictor.is_trained(),
            model_status: self.predictor.status(),
            narrative_available: self.narrative.is_available().await,
            last_training_date: metadata
                .map(|m| m.training_end_date.unwrap_or_else(|| m.trained_at.date())),
            feature_importance: self.predictor.feature_importance(),
            model_id: metadata.map(|m| m.model_id.clone()),
            metrics: metadata.and_then(|m| m.metrics),
            load_error: self.predictor.load_error().map(str::to_string),
        })
    }

    /// 当前环境因子
    pub async fn get_environmental_factors(&self) -> ApiResult<EnvironmentalSnapshot> {
        Ok(self.environment_snapshot(self.today()).await)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn today(&self) -> NaiveDate {
        self.fixed_date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn ensure_model_ready(&self) -> ApiResult<()> {
        if self.require_trained_model && !self.predictor.is_trained() {
            let reason = self
                .predictor
                .load_error()
                .unwrap_or("未加载训练模型")
                .to_string();
            return Err(ApiError::ModelUnavailable(reason));
        }
        Ok(())
    }

    async fn environment_snapshot(&self, date: NaiveDate) -> EnvironmentalSnapshot {
        call_with_timeout(
            "environment.current_snapshot",
            self.collaborator_timeout,
            self.environment.current_snapshot(date),
        )
        .await
        .unwrap_or_else(default_current_snapshot)
    }

    async fn recent_lags(&self, date: NaiveDate) -> HistoricalLagContext {
        call_with_timeout(
            "history.recent_lags",
            self.collaborator_timeout,
            self.history.recent_lags(date),
        )
        .await
        .unwrap_or_else(default_recent_lags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{StaticEnvironmentSource, StaticHistorySource};

    fn api() -> AdvisoryApi {
        AdvisoryApi::new(
            Arc::new(LoadPredictor::untrained()),
            Arc::new(DecisionEngine::default()),
            Arc::new(StaticEnvironmentSource::default()),
            Arc::new(StaticHistorySource::default()),
            OptionalNarrativeProvider::disabled(),
        )
        .with_fixed_date(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
    }

    #[tokio::test]
    async fn test_current_advisory_with_baseline_model() {
        let response = api().get_current_advisory().await.unwrap();

        // 基线模型返回 roll7 = 318
        assert_eq!(response.patient_load.prediction, 318.0);
        assert_eq!(response.patient_load.load_level, crate::domain::types::LoadLevel::Normal);
        assert_eq!(response.environmental_factors.aqi, 220);
        assert!(response.health_tips.len() <= MAX_HEALTH_TIPS);
        assert_eq!(response.narrative, None);
    }

    #[tokio::test]
    async fn test_forecast_days_validation() {
        let api = api();
        assert!(matches!(api.get_forecast(Some(0)).await, Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.get_forecast(Some(15)).await, Err(ApiError::InvalidInput(_))));
        assert_eq!(api.get_forecast(None).await.unwrap().forecast.len(), 7);
    }

    #[tokio::test]
    async fn test_require_trained_model() {
        let api = api().require_trained_model(true);
        assert!(matches!(
            api.get_current_advisory().await,
            Err(ApiError::ModelUnavailable(_))
        ));
        // 模型状态接口不受影响
        assert!(!api.get_model_info().await.unwrap().model_loaded);
    }
}
