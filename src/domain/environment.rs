// ==========================================
// 医院就诊负荷预测 - 环境快照与历史滞后上下文
// ==========================================
// EnvironmentalSnapshot: 每次预测读取的外部环境因子（不可变）
// HistoricalLagContext: 滞后特征（多日预测时按天滚动更新）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// 默认值
// ==========================================
pub const DEFAULT_AQI: u32 = 200;
pub const DEFAULT_TEMP_C: f64 = 25.0;
pub const DEFAULT_LAG_VALUE: f64 = 300.0;

/// 滚动均值窗口（天）
pub const ROLLING_WINDOW_DAYS: usize = 7;

fn default_aqi() -> u32 {
    DEFAULT_AQI
}

fn default_temp() -> f64 {
    DEFAULT_TEMP_C
}

fn default_lag() -> f64 {
    DEFAULT_LAG_VALUE
}

// ==========================================
// EnvironmentalSnapshot - 环境快照
// ==========================================
// 字段缺失时使用默认值；未知字段在反序列化边界直接拒绝
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentalSnapshot {
    #[serde(rename = "AQI", alias = "aqi", default = "default_aqi")]
    pub aqi: u32, // 空气质量指数 (0-500)

    #[serde(default = "default_temp")]
    pub temp: f64, // 气温 (°C)

    #[serde(default)]
    pub rainfall: f64, // 降雨量 (mm)

    #[serde(default)]
    pub epidemic_alert_level: u8, // 疫情预警级别 (0-3)

    #[serde(default)]
    pub holiday_flag: u8, // 节假日 (0/1)

    #[serde(default)]
    pub festival_flag: u8, // 节庆 (0/1)
}

impl Default for EnvironmentalSnapshot {
    fn default() -> Self {
        Self {
            aqi: DEFAULT_AQI,
            temp: DEFAULT_TEMP_C,
            rainfall: 0.0,
            epidemic_alert_level: 0,
            holiday_flag: 0,
            festival_flag: 0,
        }
    }
}

impl EnvironmentalSnapshot {
    /// 从 JSON 解析环境快照（边界归一化入口）
    ///
    /// # 返回
    /// - Ok: 缺失字段已填充默认值
    /// - Err: JSON 格式错误或包含未知字段
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// 高污染标记 (AQI ≥ 250)
    pub fn is_high_aqi(&self) -> bool {
        self.aqi >= 250
    }

    /// 返回 AQI / 气温调整后的副本（多日预测的环境漂移）
    pub fn with_drift(&self, aqi: u32, temp: f64) -> Self {
        Self { aqi, temp, ..*self }
    }
}

// ==========================================
// HistoricalLagContext - 历史滞后上下文
// ==========================================
// roll7 取自预测目标日的前一天（不含目标日本身）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalLagContext {
    #[serde(default = "default_lag")]
    pub lag1: f64, // 前 1 天就诊人数

    #[serde(default = "default_lag")]
    pub lag2: f64, // 前 2 天就诊人数

    #[serde(default = "default_lag")]
    pub lag7: f64, // 前 7 天就诊人数

    #[serde(default = "default_lag")]
    pub roll7: f64, // 7 日滚动均值
}

impl Default for HistoricalLagContext {
    fn default() -> Self {
        Self {
            lag1: DEFAULT_LAG_VALUE,
            lag2: DEFAULT_LAG_VALUE,
            lag7: DEFAULT_LAG_VALUE,
            roll7: DEFAULT_LAG_VALUE,
        }
    }
}

impl HistoricalLagContext {
    pub fn new(lag1: f64, lag2: f64, lag7: f64, roll7: f64) -> Self {
        Self {
            lag1,
            lag2,
            lag7,
            roll7,
        }
    }

    /// 由按日期升序排列的就诊人数序列构造上下文
    ///
    /// 序列最后一个元素为预测目标日的前一天。
    ///
    /// # 返回
    /// - None: 序列不足 7 天
    pub fn from_recent_counts(counts: &[f64]) -> Option<Self> {
        let n = counts.len();
        if n < ROLLING_WINDOW_DAYS {
            return None;
        }

        let window = &counts[n - ROLLING_WINDOW_DAYS..];
        let roll7 = window.iter().sum::<f64>() / ROLLING_WINDOW_DAYS as f64;

        Some(Self {
            lag1: counts[n - 1],
            lag2: counts[n - 2],
            lag7: counts[n - 7],
            roll7,
        })
    }

    /// 用当天预测值推进上下文（多日预测，顺序依赖）
    ///
    /// lag7 取原 lag2（与线上行为一致，并非严格的 7 日滞后）
    pub fn advance(&mut self, prediction: f64) {
        self.lag7 = self.lag2;
        self.lag2 = self.lag1;
        self.lag1 = prediction;
        self.roll7 = (self.roll7 * 6.0 + prediction) / 7.0;
    }
}
