// ==========================================
// 医院就诊负荷预测 - 建议配置读取 Trait
// ==========================================
// 职责: 定义决策引擎 / 服务装配所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::decision::{DecisionConfig, LoadThresholds, StaffingRatios};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

// ==========================================
// AdvisoryConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）；测试中使用 Mock
#[async_trait]
pub trait AdvisoryConfigReader: Send + Sync {
    // ===== 负荷分级 =====

    /// 获取负荷分级阈值
    ///
    /// # 默认值
    /// - low=300, normal=400, high=500, critical=600
    async fn get_load_thresholds(&self) -> Result<LoadThresholds, Box<dyn Error>>;

    // ===== 排班 =====

    /// 获取每名员工对应的患者数
    ///
    /// # 默认值
    /// - doctors=50, nurses=20, support=40
    async fn get_staffing_ratios(&self) -> Result<StaffingRatios, Box<dyn Error>>;

    // ===== 物资 =====

    /// 获取物资日耗率表（JSON: {"masks": 1.5, ...}）
    async fn get_supply_rates(&self) -> Result<BTreeMap<String, f64>, Box<dyn Error>>;

    /// 获取安全库存天数
    ///
    /// # 默认值
    /// - 7
    async fn get_safety_stock_days(&self) -> Result<u32, Box<dyn Error>>;

    // ===== 服务装配 =====

    /// 获取模型产物路径
    ///
    /// # 默认值
    /// - <data_dir>/hospital-advisory/patient_predictor.json
    async fn get_model_path(&self) -> Result<PathBuf, Box<dyn Error>>;

    /// 获取外部协作方调用超时（毫秒）
    ///
    /// # 默认值
    /// - 2000
    async fn get_collaborator_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取历史就诊数据文件路径（CSV / Excel 日序列）
    ///
    /// # 默认值
    /// - None（使用静态历史数据源）
    async fn get_history_path(&self) -> Result<Option<PathBuf>, Box<dyn Error>>;

    /// 获取建议文本语言
    ///
    /// # 默认值
    /// - en
    async fn get_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 组装完整决策配置
    async fn load_decision_config(&self) -> Result<DecisionConfig, Box<dyn Error>> {
        let thresholds = self.get_load_thresholds().await?;
        let staffing_ratios = self.get_staffing_ratios().await?;
        let supply_rates = self.get_supply_rates().await?;
        let safety_stock_days = self.get_safety_stock_days().await?;

        Ok(DecisionConfig {
            thresholds,
            staffing_ratios,
            supply_rates,
            safety_stock_days,
        })
    }
}
