// ==========================================
// 医院就诊负荷预测 - 负荷预测器
// ==========================================
// 输入: 日期 + 环境快照 + 历史滞后上下文
// 输出: PredictionResult (点估计 + 置信区间 + 特征)
// 状态: UNTRAINED (基线模型) / TRAINED (已加载森林产物)
// 红线: 产物加载失败不得中断服务，退化为基线模型并记录原因
// ==========================================

use crate::domain::environment::{EnvironmentalSnapshot, HistoricalLagContext};
use crate::domain::prediction::{
    ConfidenceInterval, FeatureVector, PredictionResult, FEATURE_NAMES, FEATURE_SCHEMA_VERSION,
};
use crate::domain::types::ModelStatus;
use crate::engine::error::{ModelError, ModelResult};
use crate::engine::features::FeatureExtractor;
use crate::engine::forest::RandomForest;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// 95% 区间对应的 z 值
pub const CONFIDENCE_Z: f64 = 1.96;

/// 无成员预测时的区间比例
pub const FALLBACK_LOWER_RATIO: f64 = 0.8;
pub const FALLBACK_UPPER_RATIO: f64 = 1.2;

// ==========================================
// Trait: LoadRegressor
// ==========================================
// 用途: 预测器持有的只读模型接口（可跨请求共享）
pub trait LoadRegressor: Send + Sync + fmt::Debug {
    /// 聚合预测
    fn predict(&self, features: &FeatureVector) -> f64;

    /// 各集成成员的预测；不支持时返回 None
    fn member_predictions(&self, features: &FeatureVector) -> Option<Vec<f64>>;

    /// 特征重要度（按 FEATURE_NAMES 顺序）；未拟合时返回 None
    fn feature_importances(&self) -> Option<Vec<f64>>;
}

impl LoadRegressor for RandomForest {
    fn predict(&self, features: &FeatureVector) -> f64 {
        RandomForest::predict(self, features)
    }

    fn member_predictions(&self, features: &FeatureVector) -> Option<Vec<f64>> {
        Some(RandomForest::member_predictions(self, features))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(RandomForest::feature_importances(self))
    }
}

// ==========================================
// BaselineModel - 未训练基线模型
// ==========================================
// 退化估计: 直接返回 7 日滚动均值
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineModel;

impl LoadRegressor for BaselineModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        features.get("patients_roll7").unwrap_or_default()
    }

    fn member_predictions(&self, _features: &FeatureVector) -> Option<Vec<f64>> {
        None
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

// ==========================================
// EvaluationMetrics - 留出集评估指标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mae: f64,          // 平均绝对误差
    pub rmse: f64,         // 均方根误差
    pub train_size: usize, // 训练样本数
    pub test_size: usize,  // 留出样本数
}

// ==========================================
// ModelArtifact - 持久化模型产物
// ==========================================
// schema_version + feature_names 与森林一并存储，加载时校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub model_id: String,
    pub trained_at: NaiveDateTime,
    pub training_end_date: Option<NaiveDate>,
    pub metrics: Option<EvaluationMetrics>,
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// 以当前特征 schema 封装训练好的森林
    pub fn new(
        forest: RandomForest,
        training_end_date: Option<NaiveDate>,
        metrics: Option<EvaluationMetrics>,
    ) -> Self {
        Self {
            schema_version: FEATURE_SCHEMA_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            model_id: Uuid::new_v4().to_string(),
            trained_at: Utc::now().naive_utc(),
            training_end_date,
            metrics,
            forest,
        }
    }

    /// 保存产物（自动创建父目录）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ModelResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;

        tracing::info!(
            model_id = %self.model_id,
            path = %path.display(),
            "模型产物已保存"
        );
        Ok(())
    }

    /// 读取并校验产物
    pub fn load<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::ArtifactNotFound(path.display().to_string()));
        }

        let reader = BufReader::new(File::open(path)?);
        let artifact: ModelArtifact = serde_json::from_reader(reader)?;
        artifact.check_compatibility()?;
        Ok(artifact)
    }

    /// 校验特征 schema 与森林结构
    pub fn check_compatibility(&self) -> ModelResult<()> {
        if self.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(ModelError::SchemaVersionMismatch {
                expected: FEATURE_SCHEMA_VERSION,
                found: self.schema_version,
            });
        }

        let matches = self.feature_names.len() == FEATURE_NAMES.len()
            && self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .all(|(a, b)| a == b);
        if !matches {
            return Err(ModelError::FeatureNamesMismatch(self.feature_names.join(",")));
        }

        self.forest.validate()
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            model_id: self.model_id.clone(),
            trained_at: self.trained_at,
            training_end_date: self.training_end_date,
            metrics: self.metrics,
        }
    }
}

/// 已加载模型的元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub trained_at: NaiveDateTime,
    pub training_end_date: Option<NaiveDate>,
    pub metrics: Option<EvaluationMetrics>,
}

// ==========================================
// LoadPredictor - 负荷预测器
// ==========================================
// 模型启动时加载一次，之后只读，可通过 Arc 跨请求共享
#[derive(Debug, Clone)]
pub struct LoadPredictor {
    extractor: FeatureExtractor,
    model: Arc<dyn LoadRegressor>,
    status: ModelStatus,
    metadata: Option<ModelMetadata>,
    load_error: Option<String>,
}

impl LoadPredictor {
    /// 未训练预测器（基线模型）
    pub fn untrained() -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            model: Arc::new(BaselineModel),
            status: ModelStatus::Untrained,
            metadata: None,
            load_error: None,
        }
    }

    /// 由产物构造已训练预测器
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        let metadata = artifact.metadata();
        Self {
            extractor: FeatureExtractor::new(),
            model: Arc::new(artifact.forest),
            status: ModelStatus::Trained,
            metadata: Some(metadata),
            load_error: None,
        }
    }

    /// 注入任意模型实现（测试 / 自定义模型）
    pub fn with_model(model: Arc<dyn LoadRegressor>, status: ModelStatus) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            model,
            status,
            metadata: None,
            load_error: None,
        }
    }

    /// 严格加载：失败时返回错误
    pub fn try_load<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        ModelArtifact::load(path).map(Self::from_artifact)
    }

    /// 加载产物；失败时退化为基线模型并保留失败原因
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(predictor) => {
                tracing::info!(
                    path = %path.display(),
                    model_id = predictor.metadata.as_ref().map(|m| m.model_id.as_str()).unwrap_or(""),
                    "模型加载成功"
                );
                predictor
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "模型加载失败，使用未训练基线模型（预测精度降级）"
                );
                let mut predictor = Self::untrained();
                predictor.load_error = Some(e.to_string());
                predictor
            }
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 预测指定日期的就诊人数
    pub fn predict(
        &self,
        date: NaiveDate,
        env: &EnvironmentalSnapshot,
        lags: &HistoricalLagContext,
    ) -> PredictionResult {
        let features = self.extractor.extract(date, env, lags);
        let (prediction, confidence_interval) = self.estimate(&features);

        tracing::debug!(
            date = %date,
            prediction,
            lower = confidence_interval.lower,
            upper = confidence_interval.upper,
            "负荷预测完成"
        );

        PredictionResult {
            prediction,
            confidence_interval,
            features,
            date,
        }
    }

    /// 点估计 + 置信区间
    ///
    /// # 规则
    /// - 有成员预测: σ 为成员预测的总体标准差，区间 = 点估计 ± 1.96σ（下界截断为 0）
    /// - 无成员预测: 区间 = [点估计×0.8, 点估计×1.2]
    fn estimate(&self, features: &FeatureVector) -> (f64, ConfidenceInterval) {
        let raw = self.model.predict(features);
        if raw < 0.0 {
            tracing::debug!(raw, "点估计为负，截断为 0");
        }
        let prediction = raw.max(0.0);

        let interval = match self.model.member_predictions(features) {
            Some(members) if !members.is_empty() => {
                let sigma = population_std_dev(&members);
                ConfidenceInterval {
                    lower: (prediction - CONFIDENCE_Z * sigma).max(0.0),
                    upper: prediction + CONFIDENCE_Z * sigma,
                }
            }
            _ => ConfidenceInterval {
                lower: (prediction * FALLBACK_LOWER_RATIO).max(0.0),
                upper: prediction * FALLBACK_UPPER_RATIO,
            },
        };

        (prediction, interval)
    }

    /// 特征重要度（特征名 -> 重要度）；未训练时为空
    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        match self.model.feature_importances() {
            Some(values) => FEATURE_NAMES
                .iter()
                .zip(values)
                .map(|(name, v)| (name.to_string(), v))
                .collect(),
            None => BTreeMap::new(),
        }
    }

    // ==========================================
    // 状态查询
    // ==========================================

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    pub fn is_trained(&self) -> bool {
        self.status == ModelStatus::Trained
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// 最近一次加载失败的原因
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }
}

impl Default for LoadPredictor {
    fn default() -> Self {
        Self::untrained()
    }
}

/// 总体标准差（ddof = 0）
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 固定成员预测的测试模型
    #[derive(Debug)]
    struct FixedMembers(Vec<f64>);

    impl LoadRegressor for FixedMembers {
        fn predict(&self, _features: &FeatureVector) -> f64 {
            self.0.iter().sum::<f64>() / self.0.len() as f64
        }

        fn member_predictions(&self, _features: &FeatureVector) -> Option<Vec<f64>> {
            Some(self.0.clone())
        }

        fn feature_importances(&self) -> Option<Vec<f64>> {
            None
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[test]
    fn test_population_std_dev() {
        assert_eq!(population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_interval_from_member_spread() {
        let model = FixedMembers(vec![300.0, 310.0, 320.0, 330.0, 340.0]);
        let predictor = LoadPredictor::with_model(Arc::new(model), ModelStatus::Trained);

        let result = predictor.predict(
            date(),
            &EnvironmentalSnapshot::default(),
            &HistoricalLagContext::default(),
        );

        let sigma = population_std_dev(&[300.0, 310.0, 320.0, 330.0, 340.0]);
        assert_eq!(result.prediction, 320.0);
        assert!((result.confidence_interval.lower - (320.0 - 1.96 * sigma)).abs() < 1e-9);
        assert!((result.confidence_interval.upper - (320.0 + 1.96 * sigma)).abs() < 1e-9);
    }

    #[test]
    fn test_interval_lower_bound_clamped_at_zero() {
        let model = FixedMembers(vec![0.0, 0.0, 0.0, 40.0]);
        let predictor = LoadPredictor::with_model(Arc::new(model), ModelStatus::Trained);

        let result = predictor.predict(
            date(),
            &EnvironmentalSnapshot::default(),
            &HistoricalLagContext::default(),
        );

        assert_eq!(result.confidence_interval.lower, 0.0);
        assert!(result.confidence_interval.contains(result.prediction));
    }

    #[test]
    fn test_untrained_predictor_uses_ratio_interval() {
        let predictor = LoadPredictor::untrained();
        let lags = HistoricalLagContext::new(320.0, 315.0, 310.0, 318.0);

        let result = predictor.predict(date(), &EnvironmentalSnapshot::default(), &lags);

        assert_eq!(result.prediction, 318.0);
        assert!((result.confidence_interval.lower - 318.0 * 0.8).abs() < 1e-9);
        assert!((result.confidence_interval.upper - 318.0 * 1.2).abs() < 1e-9);
        assert!(predictor.feature_importance().is_empty());
        assert_eq!(predictor.status(), ModelStatus::Untrained);
    }

    #[test]
    fn test_negative_estimate_is_clamped() {
        let predictor = LoadPredictor::untrained();
        let lags = HistoricalLagContext::new(-5.0, -5.0, -5.0, -5.0);

        let result = predictor.predict(date(), &EnvironmentalSnapshot::default(), &lags);
        assert_eq!(result.prediction, 0.0);
        assert_eq!(result.confidence_interval.lower, 0.0);
        assert_eq!(result.confidence_interval.upper, 0.0);
    }

    #[test]
    fn test_load_missing_artifact_falls_back() {
        let predictor = LoadPredictor::load("/nonexistent/dir/patient_predictor.json");
        assert!(!predictor.is_trained());
        assert!(predictor.load_error().unwrap().contains("模型文件不存在"));
    }
}
