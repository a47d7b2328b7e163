// ==========================================
// 医院就诊负荷预测 - 核心库
// ==========================================
// 数据流: 环境快照 + 历史滞后 → 特征提取 → 负荷预测 → 决策引擎 → 公众建议
// 系统定位: 决策支持系统（建议仅供参考，人工最终决定）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值对象与类型
pub mod domain;

// 引擎层 - 特征 / 模型 / 决策规则
pub mod engine;

// 训练层 - 合成数据 / 训练集 / 离线训练
pub mod training;

// 导入层 - 历史就诊数据
pub mod importer;

// 外部协作方端口
pub mod services;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 依赖装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Advisory, EnvironmentalSnapshot, FeatureVector, HealthRisk, HistoricalLagContext, LoadLevel,
    ModelStatus, PredictionResult, Severity, StaffingPlan,
};

// 引擎
pub use engine::{DecisionConfig, DecisionEngine, FeatureExtractor, Forecaster, LoadPredictor};

// 训练
pub use training::{SyntheticDataGenerator, TrainingPipeline, TrainingReport};

// API
pub use api::{AdvisoryApi, ApiError, ApiResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "医院就诊负荷预测与运营建议";
