// ==========================================
// 医院就诊负荷预测 - 特征向量与预测结果
// ==========================================
// 特征顺序是模型的位置契约: 抽取与训练必须逐位一致
// 调整特征顺序或数量必须同时提升 FEATURE_SCHEMA_VERSION 并重新训练
// ==========================================

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// 特征数量
pub const FEATURE_COUNT: usize = 13;

/// 特征 schema 版本（随模型产物一同持久化，加载时校验）
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// 特征名称（顺序即模型输入顺序）
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "holiday_flag",
    "festival_flag",
    "AQI",
    "high_AQI_flag",
    "temp",
    "rainfall",
    "epidemic_alert_level",
    "month",
    "is_weekend",
    "patients_lag1",
    "patients_lag2",
    "patients_lag7",
    "patients_roll7",
];

// ==========================================
// FeatureVector - 定长特征向量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// 按特征名读取
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }

    /// (特征名, 值) 列表，保持 schema 顺序
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied()).collect()
    }
}

/// features_used 以有序 map 输出（名称 -> 值）
fn serialize_features_used<S>(features: &FeatureVector, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
    for (name, value) in features.named() {
        map.serialize_entry(name, &value)?;
    }
    map.end()
}

// ==========================================
// ConfidenceInterval - 置信区间
// ==========================================
// 由集成成员预测的离散度推得，并非校准后的统计区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64, // 下界 (≥ 0)
    pub upper: f64, // 上界
}

impl ConfidenceInterval {
    /// 是否包含给定值
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// 区间宽度
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

// ==========================================
// PredictionResult - 单日预测结果
// ==========================================
// 每次调用新建，不持久化
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub prediction: f64,                        // 点估计 (≥ 0)
    pub confidence_interval: ConfidenceInterval, // 置信区间
    #[serde(rename = "features_used", serialize_with = "serialize_features_used")]
    pub features: FeatureVector, // 实际使用的特征
    pub date: NaiveDate, // 预测目标日
}
