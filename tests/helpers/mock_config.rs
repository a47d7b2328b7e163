// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use hospital_advisory::config::AdvisoryConfigReader;
use hospital_advisory::engine::decision::{default_supply_rates, LoadThresholds, StaffingRatios};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub thresholds: LoadThresholds,
    pub staffing_ratios: StaffingRatios,
    pub supply_rates: BTreeMap<String, f64>,
    pub safety_stock_days: u32,
    pub model_path: PathBuf,
    pub timeout_ms: u64,
    pub history_path: Option<PathBuf>,
    pub locale: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            thresholds: LoadThresholds::default(),
            staffing_ratios: StaffingRatios::default(),
            supply_rates: default_supply_rates(),
            safety_stock_days: 7,
            model_path: PathBuf::from("missing_model.json"),
            timeout_ms: 2_000,
            history_path: None,
            locale: "en".to_string(),
        }
    }
}

#[async_trait]
impl AdvisoryConfigReader for MockConfig {
    async fn get_load_thresholds(&self) -> Result<LoadThresholds, Box<dyn Error>> {
        Ok(self.thresholds)
    }

    async fn get_staffing_ratios(&self) -> Result<StaffingRatios, Box<dyn Error>> {
        Ok(self.staffing_ratios)
    }

    async fn get_supply_rates(&self) -> Result<BTreeMap<String, f64>, Box<dyn Error>> {
        Ok(self.supply_rates.clone())
    }

    async fn get_safety_stock_days(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.safety_stock_days)
    }

    async fn get_model_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        Ok(self.model_path.clone())
    }

    async fn get_collaborator_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.timeout_ms)
    }

    async fn get_history_path(&self) -> Result<Option<PathBuf>, Box<dyn Error>> {
        Ok(self.history_path.clone())
    }

    async fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.locale.clone())
    }
}
