// ==========================================
// 医院就诊负荷预测 - 引擎层
// ==========================================
// 职责: 特征抽取 / 集成回归 / 负荷预测 / 决策规则 / 多日预测
// 红线: 引擎层同步执行，不做 I/O（模型产物读写除外）
// ==========================================

pub mod decision;
pub mod error;
pub mod features;
pub mod forecast;
pub mod forest;
pub mod predictor;

// 重导出核心引擎
pub use decision::{DecisionConfig, DecisionEngine, LoadThresholds, StaffingRatios};
pub use error::{ModelError, ModelResult};
pub use features::FeatureExtractor;
pub use forecast::{Forecast, ForecastDay, ForecastTrends, Forecaster};
pub use forest::{ForestParams, RandomForest, RegressionTree, TrainingSample};
pub use predictor::{
    BaselineModel, EvaluationMetrics, LoadPredictor, LoadRegressor, ModelArtifact, ModelMetadata,
};
