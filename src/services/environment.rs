// ==========================================
// 医院就诊负荷预测 - 环境数据源
// ==========================================
// 真实气象 / AQI 接入不在本 crate 内，默认使用静态快照
// ==========================================

use crate::domain::environment::EnvironmentalSnapshot;
use crate::services::error::ServiceResult;
use async_trait::async_trait;
use chrono::NaiveDate;

/// 无数据源时的当前 AQI
pub const FALLBACK_CURRENT_AQI: u32 = 220;

/// 无数据源时的当前气温 (°C)
pub const FALLBACK_CURRENT_TEMP_C: f64 = 28.0;

/// 当前环境的降级快照（AQI 220, 28°C, 其余为 0）
pub fn default_current_snapshot() -> EnvironmentalSnapshot {
    EnvironmentalSnapshot {
        aqi: FALLBACK_CURRENT_AQI,
        temp: FALLBACK_CURRENT_TEMP_C,
        rainfall: 0.0,
        epidemic_alert_level: 0,
        holiday_flag: 0,
        festival_flag: 0,
    }
}

#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    /// 获取指定日期的环境快照
    async fn current_snapshot(&self, date: NaiveDate) -> ServiceResult<EnvironmentalSnapshot>;
}

/// 固定快照数据源
#[derive(Debug, Clone, Copy)]
pub struct StaticEnvironmentSource {
    snapshot: EnvironmentalSnapshot,
}

impl StaticEnvironmentSource {
    pub fn new(snapshot: EnvironmentalSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Default for StaticEnvironmentSource {
    fn default() -> Self {
        Self::new(default_current_snapshot())
    }
}

#[async_trait]
impl EnvironmentSource for StaticEnvironmentSource {
    async fn current_snapshot(&self, _date: NaiveDate) -> ServiceResult<EnvironmentalSnapshot> {
        Ok(self.snapshot)
    }
}
