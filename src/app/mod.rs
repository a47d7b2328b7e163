// ==========================================
// 医院就诊负荷预测 - 应用层
// ==========================================
// 职责: 依赖装配（配置 → 预测器 / 决策引擎 / 协作方 → API）
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
