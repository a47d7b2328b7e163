// ==========================================
// 医院就诊负荷预测 - 训练流水线
// ==========================================
// 流程: 排序 → 构造训练样本 → 时间序切分(留出最后 60 天) → 拟合森林
//       → 留出集评估(MAE/RMSE) → 输出特征重要度 → 封装产物
// 离线批处理，与在线服务无共享状态
// ==========================================

use crate::domain::prediction::FEATURE_NAMES;
use crate::engine::error::{ModelError, ModelResult};
use crate::engine::forest::{ForestParams, RandomForest, TrainingSample};
use crate::engine::predictor::{EvaluationMetrics, ModelArtifact};
use crate::training::dataset::{build_training_rows, DailyRecord};
use std::path::Path;
use std::time::Instant;

/// 默认留出天数
pub const DEFAULT_HOLDOUT_DAYS: usize = 60;

/// 日志输出的重要特征数
const TOP_FEATURES: usize = 5;

/// 训练结果
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub artifact: ModelArtifact,
    pub metrics: EvaluationMetrics,
    pub top_features: Vec<(String, f64)>, // 重要度降序
}

impl TrainingReport {
    /// 保存模型产物
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ModelResult<()> {
        self.artifact.save(path)
    }
}

// ==========================================
// TrainingPipeline - 训练流水线
// ==========================================
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    params: ForestParams,
    holdout_days: usize,
}

impl Default for TrainingPipeline {
    fn default() -> Self {
        Self {
            params: ForestParams::default(),
            holdout_days: DEFAULT_HOLDOUT_DAYS,
        }
    }
}

impl TrainingPipeline {
    pub fn new(params: ForestParams, holdout_days: usize) -> Self {
        Self {
            params,
            holdout_days,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// 执行训练
    ///
    /// # 返回
    /// - Err(InsufficientTrainingData): 可用样本不多于留出天数
    pub fn run(&self, mut records: Vec<DailyRecord>) -> ModelResult<TrainingReport> {
        let started = Instant::now();

        if records.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        records.sort_by_key(|r| r.date);
        let training_end_date = records.last().map(|r| r.date);

        let rows = build_training_rows(&records);
        if rows.len() <= self.holdout_days {
            return Err(ModelError::InsufficientTrainingData {
                required: self.holdout_days,
                actual: rows.len(),
            });
        }

        // 时间序切分，不打乱
        let split = rows.len() - self.holdout_days;
        let (train, test) = rows.split_at(split);

        tracing::info!(
            records = records.len(),
            train_rows = train.len(),
            test_rows = test.len(),
            n_estimators = self.params.n_estimators,
            max_depth = self.params.max_depth,
            "开始训练随机森林"
        );

        let forest = RandomForest::fit(train, self.params)?;
        let metrics = evaluate(&forest, train.len(), test);

        tracing::info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "留出集评估完成"
        );

        let top_features = ranked_importances(&forest, TOP_FEATURES);
        for (rank, (name, importance)) in top_features.iter().enumerate() {
            tracing::info!(rank = rank + 1, feature = %name, importance, "特征重要度");
        }

        let artifact = ModelArtifact::new(forest, training_end_date, Some(metrics));
        Ok(TrainingReport {
            artifact,
            metrics,
            top_features,
        })
    }
}

/// 留出集评估
fn evaluate(forest: &RandomForest, train_size: usize, test: &[TrainingSample]) -> EvaluationMetrics {
    let actual: Vec<f64> = test.iter().map(|s| s.target).collect();
    let predicted: Vec<f64> = test.iter().map(|s| forest.predict(&s.features)).collect();

    EvaluationMetrics {
        mae: mean_absolute_error(&actual, &predicted),
        rmse: root_mean_squared_error(&actual, &predicted),
        train_size,
        test_size: test.len(),
    }
}

/// 重要度降序排列，取前 n 个
fn ranked_importances(forest: &RandomForest, n: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = FEATURE_NAMES
        .iter()
        .map(|s| s.to_string())
        .zip(forest.feature_importances())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// 平均绝对误差
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

/// 均方根误差
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64;
    mse.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metrics() {
        let actual = [100.0, 200.0, 300.0];
        let predicted = [110.0, 190.0, 300.0];
        assert!((mean_absolute_error(&actual, &predicted) - 20.0 / 3.0).abs() < 1e-9);
        assert!((root_mean_squared_error(&actual, &predicted) - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_empty_records_rejected() {
        let result = TrainingPipeline::default().run(Vec::new());
        assert!(matches!(result, Err(ModelError::EmptyTrainingSet)));
    }
}
