// ==========================================
// 医院就诊负荷预测 - 配置层
// ==========================================
// 职责: 决策阈值 / 排班比例 / 物资参数 / 服务装配参数
// 存储: config_kv 表
// ==========================================

pub mod advisory_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use advisory_config_trait::AdvisoryConfigReader;
pub use config_manager::{
    config_keys, default_config_db_path, default_data_dir, default_model_path, ConfigManager,
    DEFAULT_COLLABORATOR_TIMEOUT_MS,
};
