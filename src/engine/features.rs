// ==========================================
// 医院就诊负荷预测 - 特征抽取引擎
// ==========================================
// 输入: 日期 + 环境快照 + 历史滞后上下文
// 输出: 13 维定长特征向量（顺序见 FEATURE_NAMES）
// 红线: 训练与在线预测共用本函数，保证特征一致
// ==========================================

use crate::domain::environment::{EnvironmentalSnapshot, HistoricalLagContext};
use crate::domain::prediction::FeatureVector;
use chrono::{Datelike, NaiveDate, Weekday};

/// 高污染阈值（AQI ≥ 250 记为 1）
pub const HIGH_AQI_THRESHOLD: u32 = 250;

// ==========================================
// FeatureExtractor - 特征抽取器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 构造特征向量（纯函数，总是成功）
    ///
    /// # 参数
    /// - `date`: 预测目标日
    /// - `env`: 环境快照（缺失字段已在边界处填充默认值）
    /// - `lags`: 历史滞后上下文
    pub fn extract(
        &self,
        date: NaiveDate,
        env: &EnvironmentalSnapshot,
        lags: &HistoricalLagContext,
    ) -> FeatureVector {
        let high_aqi_flag = if env.aqi >= HIGH_AQI_THRESHOLD { 1.0 } else { 0.0 };

        FeatureVector([
            f64::from(env.holiday_flag),
            f64::from(env.festival_flag),
            f64::from(env.aqi),
            high_aqi_flag,
            env.temp,
            env.rainfall,
            f64::from(env.epidemic_alert_level),
            f64::from(date.month()),
            if is_weekend(date) { 1.0 } else { 0.0 },
            lags.lag1,
            lags.lag2,
            lags.lag7,
            lags.roll7,
        ])
    }
}

/// 周六 / 周日
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
