// ==========================================
// 医院就诊负荷预测 - 决策引擎
// ==========================================
// 输入: 预测就诊人数 + 环境快照
// 输出: 负荷等级 / 排班建议 / 公众建议 / 健康提示 / 健康风险
// 规则: 静态阈值级联，纯函数，永不失败
// ==========================================

use crate::domain::advisory::{
    Advisory, HealthRisk, HealthRiskAssessment, ShiftStaffing, StaffingPlan,
};
use crate::domain::environment::EnvironmentalSnapshot;
use crate::domain::types::{AdvisoryType, LoadLevel, Severity};
use crate::i18n::{t_in, t_in_with_args, DEFAULT_LOCALE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 规则常量
// ==========================================

/// 空气质量建议阈值
pub const AQI_CRITICAL_ADVISORY: u32 = 350;
pub const AQI_HIGH_ADVISORY: u32 = 250;
pub const AQI_MODERATE_ADVISORY: u32 = 150;

/// 空气相关健康提示 / 风险阈值
pub const AQI_HEALTH_TIP: u32 = 200;
pub const AQI_CRITICAL_RISK: u32 = 300;

/// 气温预警阈值 (°C)
pub const HEAT_WARNING_TEMP: f64 = 35.0;
pub const COLD_WARNING_TEMP: f64 = 10.0;

/// 疫情严重预警级别
pub const EPIDEMIC_SEVERE_LEVEL: u8 = 2;

/// 各岗位最低配置
pub const MIN_DOCTORS: u32 = 4;
pub const MIN_NURSES: u32 = 8;
pub const MIN_SUPPORT: u32 = 4;

/// 班次分配比例（百分比，夜班吸收余数）
const MORNING_SHARE_PCT: u32 = 40;
const EVENING_SHARE_PCT: u32 = 35;

// ==========================================
// DecisionConfig - 决策配置
// ==========================================

/// 负荷分级阈值（严格小于比较）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadThresholds {
    pub low: f64,
    pub normal: f64,
    pub high: f64,
    pub critical: f64, // 保留配置项，分级规则未使用
}

impl Default for LoadThresholds {
    fn default() -> Self {
        Self {
            low: 300.0,
            normal: 400.0,
            high: 500.0,
            critical: 600.0,
        }
    }
}

/// 每名员工对应的患者数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaffingRatios {
    pub doctors: f64,
    pub nurses: f64,
    pub support: f64,
}

impl Default for StaffingRatios {
    fn default() -> Self {
        Self {
            doctors: 50.0,
            nurses: 20.0,
            support: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub thresholds: LoadThresholds,
    pub staffing_ratios: StaffingRatios,
    pub supply_rates: BTreeMap<String, f64>, // 物资日耗率（每患者每天）
    pub safety_stock_days: u32,              // 安全库存天数
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            thresholds: LoadThresholds::default(),
            staffing_ratios: StaffingRatios::default(),
            supply_rates: default_supply_rates(),
            safety_stock_days: 7,
        }
    }
}

/// 默认物资日耗率表
pub fn default_supply_rates() -> BTreeMap<String, f64> {
    [
        ("oxygen_cylinder", 0.08),
        ("nebulizer_session", 0.05),
        ("inhaler", 0.25),
        ("paracetamol_strip", 0.7),
        ("PPE_kit", 0.5),
        ("masks", 1.5),
        ("gloves", 3.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

// ==========================================
// DecisionEngine - 决策引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
    locale: String,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            config,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// 指定文案语言
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    // ==========================================
    // 负荷分级
    // ==========================================

    /// 按阈值分级（单调不减）
    pub fn classify_load(&self, predicted_patients: f64) -> LoadLevel {
        let t = &self.config.thresholds;
        if predicted_patients < t.low {
            LoadLevel::Low
        } else if predicted_patients < t.normal {
            LoadLevel::Normal
        } else if predicted_patients < t.high {
            LoadLevel::High
        } else {
            LoadLevel::Critical
        }
    }

    // ==========================================
    // 排班建议
    // ==========================================

    /// 计算各岗位需求并按 早 40% / 中 35% / 夜 余数 分配
    pub fn recommend_staffing(&self, predicted_patients: f64) -> StaffingPlan {
        let ratios = &self.config.staffing_ratios;
        let required = ShiftStaffing {
            doctors: required_staff(predicted_patients, ratios.doctors, MIN_DOCTORS),
            nurses: required_staff(predicted_patients, ratios.nurses, MIN_NURSES),
            support: required_staff(predicted_patients, ratios.support, MIN_SUPPORT),
        };

        let morning = share(&required, MORNING_SHARE_PCT);
        let evening = share(&required, EVENING_SHARE_PCT);
        let night = ShiftStaffing {
            doctors: required.doctors - morning.doctors - evening.doctors,
            nurses: required.nurses - morning.nurses - evening.nurses,
            support: required.support - morning.support - evening.support,
        };

        StaffingPlan {
            morning,
            evening,
            night,
            required,
        }
    }

    // ==========================================
    // 公众建议
    // ==========================================

    /// 生成公众建议（固定顺序: 容量 → 空气 → 疫情 → 气温）
    pub fn generate_patient_advisory(
        &self,
        predicted_patients: f64,
        env: &EnvironmentalSnapshot,
    ) -> Vec<Advisory> {
        let mut advisories = Vec::new();

        // 1. 容量
        let load_level = self.classify_load(predicted_patients);
        if load_level.is_elevated() {
            let severity = if load_level == LoadLevel::Critical {
                Severity::High
            } else {
                Severity::Medium
            };
            let patients = patient_count(predicted_patients);
            advisories.push(self.advisory(
                AdvisoryType::CapacityWarning,
                severity,
                "advisory.capacity",
                &[("patients", &patients)],
            ));
        }

        // 2. 空气质量
        let aqi = env.aqi.to_string();
        if env.aqi > AQI_HIGH_ADVISORY {
            let severity = if env.aqi > AQI_CRITICAL_ADVISORY {
                Severity::Critical
            } else {
                Severity::High
            };
            advisories.push(self.advisory(
                AdvisoryType::AirQuality,
                severity,
                "advisory.air_severe",
                &[("aqi", &aqi)],
            ));
        } else if env.aqi > AQI_MODERATE_ADVISORY {
            advisories.push(self.advisory(
                AdvisoryType::AirQuality,
                Severity::Medium,
                "advisory.air_moderate",
                &[("aqi", &aqi)],
            ));
        }

        // 3. 疫情
        let level = env.epidemic_alert_level.to_string();
        if env.epidemic_alert_level >= EPIDEMIC_SEVERE_LEVEL {
            advisories.push(self.advisory(
                AdvisoryType::EpidemicAlert,
                Severity::Critical,
                "advisory.epidemic_severe",
                &[("level", &level)],
            ));
        } else if env.epidemic_alert_level == 1 {
            advisories.push(self.advisory(
                AdvisoryType::EpidemicAlert,
                Severity::Medium,
                "advisory.epidemic_watch",
                &[("level", &level)],
            ));
        }

        // 4. 气温
        let temp = env.temp.to_string();
        if env.temp > HEAT_WARNING_TEMP {
            advisories.push(self.advisory(
                AdvisoryType::HeatWarning,
                Severity::High,
                "advisory.heat",
                &[("temp", &temp)],
            ));
        } else if env.temp < COLD_WARNING_TEMP {
            advisories.push(self.advisory(
                AdvisoryType::ColdWarning,
                Severity::Medium,
                "advisory.cold",
                &[("temp", &temp)],
            ));
        }

        tracing::debug!(
            predicted_patients,
            load_level = %load_level,
            count = advisories.len(),
            "公众建议生成完成"
        );

        advisories
    }

    /// 按 i18n 前缀组装一条建议（message / recommendation / icon）
    fn advisory(
        &self,
        advisory_type: AdvisoryType,
        severity: Severity,
        prefix: &str,
        args: &[(&str, &str)],
    ) -> Advisory {
        Advisory {
            advisory_type,
            severity,
            message: t_in_with_args(&self.locale, &format!("{}.message", prefix), args),
            recommendation: t_in(&self.locale, &format!("{}.recommendation", prefix)),
            icon: t_in(&self.locale, &format!("{}.icon", prefix)),
        }
    }

    // ==========================================
    // 健康提示
    // ==========================================

    /// 健康提示（最多 8 条，两条通用提示总在最后）
    pub fn get_health_tips(&self, load_level: LoadLevel, env: &EnvironmentalSnapshot) -> Vec<String> {
        let mut keys: Vec<&str> = Vec::with_capacity(8);

        if load_level.is_elevated() {
            keys.extend(["tips.load.telemedicine", "tips.load.records"]);
        }
        if env.aqi > AQI_HEALTH_TIP {
            keys.extend(["tips.air.windows", "tips.air.monitor"]);
        }
        if env.epidemic_alert_level > 0 {
            keys.extend(["tips.epidemic.hands", "tips.epidemic.crowds"]);
        }
        keys.extend(["tips.general.diet", "tips.general.sleep"]);

        keys.into_iter().map(|k| t_in(&self.locale, k)).collect()
    }

    // ==========================================
    // 健康风险评估
    // ==========================================

    /// 当前健康风险（容量 / 空气 / 疫情），整体风险取最高严重度
    pub fn assess_health_risks(
        &self,
        predicted_patients: f64,
        env: &EnvironmentalSnapshot,
    ) -> HealthRiskAssessment {
        let load_level = self.classify_load(predicted_patients);
        let mut risks = Vec::new();

        if load_level.is_elevated() {
            let patients = patient_count(predicted_patients);
            risks.push(self.risk(
                "risks.capacity",
                Severity::from(load_level),
                &[("patients", &patients)],
            ));
        }

        if env.aqi > AQI_HEALTH_TIP {
            let severity = if env.aqi > AQI_CRITICAL_RISK {
                Severity::Critical
            } else {
                Severity::High
            };
            risks.push(self.risk("risks.air", severity, &[("aqi", &env.aqi.to_string())]));
        }

        if env.epidemic_alert_level > 0 {
            let severity = if env.epidemic_alert_level >= EPIDEMIC_SEVERE_LEVEL {
                Severity::Critical
            } else {
                Severity::Medium
            };
            risks.push(self.risk(
                "risks.epidemic",
                severity,
                &[("level", &env.epidemic_alert_level.to_string())],
            ));
        }

        let risk_level = risks
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(Severity::Low);

        HealthRiskAssessment {
            current_risks: risks,
            risk_level,
            recommendations: self.get_health_tips(load_level, env),
        }
    }

    fn risk(&self, prefix: &str, severity: Severity, args: &[(&str, &str)]) -> HealthRisk {
        HealthRisk {
            title: t_in(&self.locale, &format!("{}.title", prefix)),
            severity,
            description: t_in_with_args(&self.locale, &format!("{}.description", prefix), args),
            icon: t_in(&self.locale, &format!("{}.icon", prefix)),
        }
    }

    // ==========================================
    // 物资需求
    // ==========================================

    /// 物资日需求量（含安全库存），按物资名排序
    pub fn supply_requirements(&self, predicted_patients: f64) -> BTreeMap<String, f64> {
        let days = f64::from(self.config.safety_stock_days);
        self.config
            .supply_rates
            .iter()
            .map(|(item, rate)| (item.clone(), (predicted_patients.max(0.0) * rate * days).ceil()))
            .collect()
    }
}

/// 岗位需求 = max(最低人数, ⌈患者数 / 比例⌉)，上限 u32::MAX
fn required_staff(predicted_patients: f64, ratio: f64, minimum: u32) -> u32 {
    if ratio <= 0.0 {
        return minimum;
    }
    let needed = (predicted_patients.max(0.0) / ratio)
        .ceil()
        .min(f64::from(u32::MAX)) as u32;
    needed.max(minimum)
}

/// 班次份额（整数向下取整，u64 中间值）
fn share(required: &ShiftStaffing, pct: u32) -> ShiftStaffing {
    ShiftStaffing {
        doctors: percent_of(required.doctors, pct),
        nurses: percent_of(required.nurses, pct),
        support: percent_of(required.support, pct),
    }
}

fn percent_of(count: u32, pct: u32) -> u32 {
    // pct ≤ 100，结果不超过 count
    (u64::from(count) * u64::from(pct) / 100) as u32
}

/// 消息中的就诊人数取整数部分
fn patient_count(predicted_patients: f64) -> String {
    (predicted_patients.max(0.0).trunc() as u64).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DecisionEngine {
        DecisionEngine::default()
    }

    #[test]
    fn test_classify_load_boundaries() {
        let e = engine();
        assert_eq!(e.classify_load(299.9), LoadLevel::Low);
        assert_eq!(e.classify_load(300.0), LoadLevel::Normal);
        assert_eq!(e.classify_load(400.0), LoadLevel::High);
        assert_eq!(e.classify_load(500.0), LoadLevel::Critical);
        assert_eq!(e.classify_load(10_000.0), LoadLevel::Critical);
    }

    #[test]
    fn test_staffing_minimums_at_low_load() {
        let plan = engine().recommend_staffing(10.0);
        assert_eq!(plan.required, ShiftStaffing { doctors: 4, nurses: 8, support: 4 });
        assert_eq!(plan.morning, ShiftStaffing { doctors: 1, nurses: 3, support: 1 });
        assert_eq!(plan.evening, ShiftStaffing { doctors: 1, nurses: 2, support: 1 });
        assert_eq!(plan.night, ShiftStaffing { doctors: 2, nurses: 3, support: 2 });
    }

    #[test]
    fn test_staffing_shifts_sum_to_required() {
        let e = engine();
        for p in [0.0, 123.4, 318.0, 451.0, 999.9] {
            let plan = e.recommend_staffing(p);
            assert_eq!(plan.morning + plan.evening + plan.night, plan.required);
        }
    }

    #[test]
    fn test_staffing_at_extreme_load() {
        let e = engine();
        let plan = e.recommend_staffing(3.0e9);
        assert_eq!(plan.required.nurses, 150_000_000);
        assert_eq!(plan.morning.nurses, 60_000_000);
        assert_eq!(plan.morning + plan.evening + plan.night, plan.required);

        let saturated = e.recommend_staffing(1.0e15);
        assert_eq!(saturated.required.doctors, u32::MAX);
        assert_eq!(saturated.morning + saturated.evening + saturated.night, saturated.required);
    }

    #[test]
    fn test_moderate_air_quality_only() {
        let env = EnvironmentalSnapshot { aqi: 151, temp: 20.0, ..Default::default() };
        let advisories = engine().generate_patient_advisory(250.0, &env);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].advisory_type, AdvisoryType::AirQuality);
        assert_eq!(advisories[0].severity, Severity::Medium);
        assert_eq!(advisories[0].icon, "🌫️");
    }

    #[test]
    fn test_no_advisories_on_calm_day() {
        let env = EnvironmentalSnapshot { aqi: 150, temp: 10.0, ..Default::default() };
        assert!(engine().generate_patient_advisory(299.0, &env).is_empty());
    }

    #[test]
    fn test_capacity_message_truncates_patients() {
        let env = EnvironmentalSnapshot { aqi: 50, temp: 20.0, ..Default::default() };
        let advisories = engine().generate_patient_advisory(450.7, &env);
        assert_eq!(advisories[0].severity, Severity::Medium);
        assert!(advisories[0].message.contains("(450 patients)"));
    }

    #[test]
    fn test_health_risks_overall_level() {
        let e = engine();
        let calm = EnvironmentalSnapshot { aqi: 100, ..Default::default() };
        let assessment = e.assess_health_risks(250.0, &calm);
        assert!(assessment.current_risks.is_empty());
        assert_eq!(assessment.risk_level, Severity::Low);
        assert_eq!(assessment.recommendations.len(), 2);

        let smoggy = EnvironmentalSnapshot { aqi: 220, epidemic_alert_level: 1, ..Default::default() };
        let assessment = e.assess_health_risks(450.0, &smoggy);
        assert_eq!(assessment.current_risks.len(), 3);
        assert_eq!(assessment.current_risks[0].severity, Severity::High);
        assert_eq!(assessment.current_risks[2].severity, Severity::Medium);
        assert_eq!(assessment.risk_level, Severity::High);
    }

    #[test]
    fn test_supply_requirements_include_safety_stock() {
        let req = engine().supply_requirements(100.0);
        assert_eq!(req["masks"], 1050.0);
        assert_eq!(req["gloves"], 2100.0);
        assert_eq!(req.len(), 7);
    }

    #[test]
    fn test_chinese_locale_messages() {
        let e = DecisionEngine::default().with_locale("zh-CN");
        let env = EnvironmentalSnapshot { aqi: 300, ..Default::default() };
        let advisories = e.generate_patient_advisory(200.0, &env);
        assert!(advisories[0].message.contains("AQI: 300"));
        assert!(advisories[0].message.contains("空气质量"));
    }
}
