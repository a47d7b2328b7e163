// ==========================================
// 医院就诊负荷预测 - 训练层
// ==========================================
// 职责: 合成数据生成 / 训练样本构造 / 离线训练与评估
// ==========================================

pub mod dataset;
pub mod pipeline;
pub mod synthetic;

pub use dataset::{
    aggregate_daily, build_training_rows, DailyRecord, Department, ExternalFactorsDay,
    HourlyVisit,
};
pub use pipeline::{TrainingPipeline, TrainingReport, DEFAULT_HOLDOUT_DAYS};
pub use synthetic::{SyntheticDataGenerator, SyntheticDataset};
