// ==========================================
// 医院就诊负荷预测 - 领域类型定义
// ==========================================
// 负荷等级 / 严重度 / 建议类型 / 趋势方向
// 序列化格式: SCREAMING_SNAKE_CASE (与前端约定一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 负荷等级 (Load Level)
// ==========================================
// 顺序: Low < Normal < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadLevel {
    Low,      // 低负荷
    Normal,   // 正常
    High,     // 高负荷
    Critical, // 危急
}

impl LoadLevel {
    /// 是否需要发出容量预警（HIGH / CRITICAL）
    pub fn is_elevated(&self) -> bool {
        matches!(self, LoadLevel::High | LoadLevel::Critical)
    }

    /// 从字符串解析负荷等级
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(LoadLevel::Low),
            "NORMAL" => Some(LoadLevel::Normal),
            "HIGH" => Some(LoadLevel::High),
            "CRITICAL" => Some(LoadLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadLevel::Low => "LOW",
            LoadLevel::Normal => "NORMAL",
            LoadLevel::High => "HIGH",
            LoadLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 严重度 (Severity)
// ==========================================
// 顺序: Low < Medium < High < Critical
// 整体风险取各项检查的最大值
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<LoadLevel> for Severity {
    /// 容量风险的严重度直接沿用负荷等级（NORMAL 视作 MEDIUM）
    fn from(level: LoadLevel) -> Self {
        match level {
            LoadLevel::Low => Severity::Low,
            LoadLevel::Normal => Severity::Medium,
            LoadLevel::High => Severity::High,
            LoadLevel::Critical => Severity::Critical,
        }
    }
}

// ==========================================
// 建议类型 (Advisory Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryType {
    CapacityWarning, // 容量预警
    AirQuality,      // 空气质量
    EpidemicAlert,   // 疫情预警
    HeatWarning,     // 高温预警
    ColdWarning,     // 低温预警
}

impl AdvisoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryType::CapacityWarning => "CAPACITY_WARNING",
            AdvisoryType::AirQuality => "AIR_QUALITY",
            AdvisoryType::EpidemicAlert => "EPIDEMIC_ALERT",
            AdvisoryType::HeatWarning => "HEAT_WARNING",
            AdvisoryType::ColdWarning => "COLD_WARNING",
        }
    }
}

impl fmt::Display for AdvisoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 趋势方向 (Trend Direction)
// ==========================================
// 仅比较首末两天: 末日 > 首日 为 increasing，否则 decreasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl TrendDirection {
    /// 根据首末值判断趋势
    pub fn between(first: f64, last: f64) -> Self {
        if last > first {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
        }
    }
}

// ==========================================
// 模型状态 (Model Status)
// ==========================================
// UNTRAINED -> TRAINED 仅在启动加载时发生一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStatus {
    Untrained, // 默认基线模型（退化预测）
    Trained,   // 已加载训练产物
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Untrained => write!(f, "UNTRAINED"),
            ModelStatus::Trained => write!(f, "TRAINED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_level_ordering() {
        assert!(LoadLevel::Low < LoadLevel::Normal);
        assert!(LoadLevel::Normal < LoadLevel::High);
        assert!(LoadLevel::High < LoadLevel::Critical);
    }

    #[test]
    fn test_load_level_serde_format() {
        let json = serde_json::to_string(&LoadLevel::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        assert_eq!(LoadLevel::from_str("normal"), Some(LoadLevel::Normal));
        assert_eq!(LoadLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_advisory_type_serde_format() {
        let json = serde_json::to_string(&AdvisoryType::CapacityWarning).unwrap();
        assert_eq!(json, "\"CAPACITY_WARNING\"");
    }

    #[test]
    fn test_trend_direction() {
        assert_eq!(TrendDirection::between(300.0, 310.0), TrendDirection::Increasing);
        // 相等视为 decreasing
        assert_eq!(TrendDirection::between(300.0, 300.0), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::Increasing.to_string(), "increasing");
    }
}
