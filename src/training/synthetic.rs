// ==========================================
// 医院就诊负荷预测 - 合成训练数据生成器
// ==========================================
// 外部因子: 节庆 / 月度 AQI 基线 / 月度气温基线 / 降雨 / 疫情波次
// 就诊量: 按小时 × 科室生成，叠加时段/周末/节假日/污染/疫情效应
// 固定种子可复现
// ==========================================

use crate::engine::error::{ModelError, ModelResult};
use crate::engine::features::is_weekend;
use crate::training::dataset::{
    aggregate_daily, DailyRecord, Department, ExternalFactorsDay, HourlyVisit,
};
use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Gamma, StandardNormal};

/// 默认随机种子
pub const DEFAULT_SEED: u64 = 42;

/// 疫情波次形态（按天循环）
const EPIDEMIC_WAVE_PATTERN: [u8; 6] = [0, 1, 2, 3, 2, 1];

/// 节庆（日期, 名称）
const FESTIVALS: [((i32, u32, u32), &str); 5] = [
    ((2024, 1, 26), "Republic_Day"),
    ((2024, 3, 25), "Holi"),
    ((2024, 8, 15), "Independence_Day"),
    ((2024, 11, 1), "Diwali"),
    ((2024, 12, 25), "Christmas"),
];

/// 固定疫情波次（起始日, 持续天数）
const EPIDEMIC_WAVES: [((i32, u32, u32), usize); 3] = [
    ((2024, 1, 5), 10),
    ((2024, 7, 10), 14),
    ((2024, 12, 10), 12),
];

/// 随机波次持续天数
const RANDOM_WAVE_LENGTH: usize = 10;

/// 随机波次起始日距首尾的最小间隔
const RANDOM_WAVE_MARGIN: usize = 30;

/// Diwali 污染加成及持续天数
const DIWALI_AQI_BOOST: f64 = 80.0;
const DIWALI_BOOST_DAYS: usize = 3;

const AQI_MIN: f64 = 50.0;
const AQI_MAX: f64 = 500.0;
const AQI_NOISE_STD: f64 = 25.0;
const TEMP_NOISE_STD: f64 = 2.0;
const VISIT_NOISE_STD: f64 = 2.0;

/// 月度 AQI 基线
fn month_base_aqi(month: u32) -> f64 {
    match month {
        1 => 260.0,
        2 => 220.0,
        3 => 200.0,
        4 => 180.0,
        5 => 170.0,
        6 => 150.0,
        7 => 140.0,
        8 => 145.0,
        9 => 160.0,
        10 => 200.0,
        11 => 260.0,
        _ => 270.0,
    }
}

/// 月度气温基线 (°C)
fn month_base_temp(month: u32) -> f64 {
    match month {
        1 => 15.0,
        2 => 18.0,
        3 => 24.0,
        4 => 30.0,
        5 => 34.0,
        6 => 32.0,
        7 => 30.0,
        8 => 30.0,
        9 => 29.0,
        10 => 26.0,
        11 => 20.0,
        _ => 16.0,
    }
}

fn is_monsoon(month: u32) -> bool {
    (6..=9).contains(&month)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn ymd((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// 合成数据集
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub external: Vec<ExternalFactorsDay>,
    pub visits: Vec<HourlyVisit>,
}

impl SyntheticDataset {
    /// 汇总为日度记录
    pub fn daily_records(&self) -> Vec<DailyRecord> {
        aggregate_daily(&self.external, &self.visits)
    }
}

// ==========================================
// SyntheticDataGenerator - 合成数据生成器
// ==========================================
#[derive(Debug, Clone)]
pub struct SyntheticDataGenerator {
    start: NaiveDate,
    end: NaiveDate,
    seed: u64,
}

impl SyntheticDataGenerator {
    /// 创建生成器（闭区间 [start, end]）
    pub fn new(start: NaiveDate, end: NaiveDate, seed: u64) -> ModelResult<Self> {
        if end < start {
            return Err(ModelError::InternalError(format!(
                "合成数据日期范围无效: {} > {}",
                start, end
            )));
        }
        Ok(Self { start, end, seed })
    }

    /// 2024 全年，种子 42
    pub fn default_year() -> ModelResult<Self> {
        let start = ymd((2024, 1, 1))
            .ok_or_else(|| ModelError::InternalError("无效起始日期".to_string()))?;
        let end = ymd((2024, 12, 31))
            .ok_or_else(|| ModelError::InternalError("无效结束日期".to_string()))?;
        Self::new(start, end, DEFAULT_SEED)
    }

    fn dates(&self) -> Vec<NaiveDate> {
        let days = (self.end - self.start).num_days();
        (0..=days).map(|d| self.start + Duration::days(d)).collect()
    }

    /// 生成外部因子与小时级就诊记录
    pub fn generate(&self) -> ModelResult<SyntheticDataset> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let external = self.generate_external_factors(&mut rng)?;
        let visits = generate_patient_visits(&external, &mut rng);

        tracing::info!(
            days = external.len(),
            visit_rows = visits.len(),
            seed = self.seed,
            "合成数据生成完成"
        );

        Ok(SyntheticDataset { external, visits })
    }

    fn generate_external_factors(&self, rng: &mut ChaCha8Rng) -> ModelResult<Vec<ExternalFactorsDay>> {
        let dates = self.dates();
        let n = dates.len();

        // 节庆
        let festival_names: Vec<String> = dates
            .iter()
            .map(|date| {
                FESTIVALS
                    .iter()
                    .find(|(d, _)| ymd(*d) == Some(*date))
                    .map(|(_, name)| name.to_string())
                    .unwrap_or_default()
            })
            .collect();

        // AQI: 月度基线 + 噪声，截断后叠加 Diwali 污染，再截断取整
        let mut aqi: Vec<f64> = dates
            .iter()
            .map(|date| {
                let noise: f64 = rng.sample(StandardNormal);
                (month_base_aqi(date.month()) + AQI_NOISE_STD * noise).clamp(AQI_MIN, AQI_MAX)
            })
            .collect();
        for (idx, name) in festival_names.iter().enumerate() {
            if name == "Diwali" {
                for offset in 0..DIWALI_BOOST_DAYS {
                    if let Some(v) = aqi.get_mut(idx + offset) {
                        *v += DIWALI_AQI_BOOST;
                    }
                }
            }
        }

        // 气温
        let temps: Vec<f64> = dates
            .iter()
            .map(|date| {
                let noise: f64 = rng.sample(StandardNormal);
                round1(month_base_temp(date.month()) + TEMP_NOISE_STD * noise)
            })
            .collect();

        // 降雨: 季风月 Gamma(2.5, 6)，其余月份 30% 概率小雨 U(0.5, 5)
        let gamma = Gamma::new(2.5, 6.0).map_err(|e| ModelError::InternalError(e.to_string()))?;
        let rainfall: Vec<f64> = dates
            .iter()
            .map(|date| {
                if is_monsoon(date.month()) {
                    round1(rng.sample(&gamma))
                } else if rng.gen::<f64>() < 0.3 {
                    round1(rng.gen_range(0.5..5.0))
                } else {
                    0.0
                }
            })
            .collect();

        // 疫情波次（与已有级别取最大值）
        let mut epidemic = vec![0u8; n];
        for (start, length) in EPIDEMIC_WAVES {
            if let Some(start) = ymd(start) {
                if let Some(idx) = dates.iter().position(|d| *d == start) {
                    add_epidemic_wave(&mut epidemic, idx, length);
                }
            }
        }
        if n > 2 * RANDOM_WAVE_MARGIN {
            let idx = rng.gen_range(RANDOM_WAVE_MARGIN..n - RANDOM_WAVE_MARGIN);
            add_epidemic_wave(&mut epidemic, idx, RANDOM_WAVE_LENGTH);
        }

        Ok(dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| ExternalFactorsDay {
                date,
                holiday_flag: u8::from(!festival_names[i].is_empty()),
                festival_name: festival_names[i].clone(),
                aqi: aqi[i].clamp(AQI_MIN, AQI_MAX).round() as u32,
                temp: temps[i],
                rainfall: rainfall[i],
                epidemic_alert_level: epidemic[i],
            })
            .collect())
    }
}

/// 叠加一个疫情波次 0,1,2,3,2,1,...（超出序列尾部的部分忽略）
fn add_epidemic_wave(levels: &mut [u8], start_idx: usize, length: usize) {
    for i in 0..length {
        if let Some(level) = levels.get_mut(start_idx + i) {
            *level = (*level).max(EPIDEMIC_WAVE_PATTERN[i % EPIDEMIC_WAVE_PATTERN.len()]);
        }
    }
}

/// 单小时单科室的期望就诊数（未加噪声，可为负）
pub fn base_hourly_demand(department: Department, hour: u32, day: &ExternalFactorsDay) -> i32 {
    let mut base: i32 = match department {
        Department::Er => 6,
        Department::RespOpd => 4,
    };

    // 时段
    if (9..=12).contains(&hour) {
        base += 4;
    }
    if (18..=21).contains(&hour) {
        base += 3;
    }
    if hour <= 5 {
        base -= 2;
    }

    // 周末
    if is_weekend(day.date) {
        base += match department {
            Department::Er => 2,
            Department::RespOpd => -1,
        };
    }

    // 节假日
    if day.holiday_flag == 1 {
        base += match department {
            Department::Er => 5,
            Department::RespOpd => 3,
        };
    }

    // 污染（仅呼吸门诊）
    if department == Department::RespOpd {
        if day.aqi > 200 {
            base += 3;
        }
        if day.aqi > 300 {
            base += 5;
        }
    }

    // 疫情（逐级累加）
    let level = day.epidemic_alert_level;
    if level >= 1 {
        base += 2;
    }
    if level >= 2 {
        base += 4;
    }
    if level == 3 {
        base += 6;
    }

    base
}

fn generate_patient_visits(external: &[ExternalFactorsDay], rng: &mut ChaCha8Rng) -> Vec<HourlyVisit> {
    let mut visits = Vec::with_capacity(external.len() * 24 * Department::ALL.len());

    for day in external {
        for hour in 0..24 {
            for department in Department::ALL {
                let mean = f64::from(base_hourly_demand(department, hour, day).max(0));
                let noise: f64 = rng.sample(StandardNormal);
                let count = (mean + VISIT_NOISE_STD * noise).trunc().max(0.0) as u32;

                visits.push(HourlyVisit {
                    date: day.date,
                    hour,
                    department,
                    patient_count: count,
                });
            }
        }
    }

    visits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: NaiveDate, aqi: u32, holiday: u8, epidemic: u8) -> ExternalFactorsDay {
        ExternalFactorsDay {
            date,
            holiday_flag: holiday,
            festival_name: String::new(),
            aqi,
            temp: 25.0,
            rainfall: 0.0,
            epidemic_alert_level: epidemic,
        }
    }

    #[test]
    fn test_base_demand_effects() {
        // 2024-07-15 周一, 2024-07-13 周六
        let monday = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 7, 13).unwrap();

        let calm = day(monday, 100, 0, 0);
        assert_eq!(base_hourly_demand(Department::Er, 10, &calm), 10);
        assert_eq!(base_hourly_demand(Department::Er, 3, &calm), 4);
        assert_eq!(base_hourly_demand(Department::RespOpd, 19, &calm), 7);

        let weekend = day(saturday, 100, 0, 0);
        assert_eq!(base_hourly_demand(Department::Er, 14, &weekend), 8);
        assert_eq!(base_hourly_demand(Department::RespOpd, 14, &weekend), 3);

        let smog_wave = day(monday, 320, 1, 3);
        // 4 + 3(节假日) + 3 + 5(污染) + 2 + 4 + 6(疫情)
        assert_eq!(base_hourly_demand(Department::RespOpd, 14, &smog_wave), 27);
    }

    #[test]
    fn test_epidemic_wave_max_merge() {
        let mut levels = vec![0u8; 12];
        levels[3] = 3;
        add_epidemic_wave(&mut levels, 2, 8);
        assert_eq!(levels, vec![0, 0, 0, 3, 2, 3, 2, 1, 0, 1, 0, 0]);
    }

    #[test]
    fn test_generation_is_reproducible() {
        let gen = SyntheticDataGenerator::default_year().unwrap();
        let a = gen.generate().unwrap();
        let b = gen.generate().unwrap();

        assert_eq!(a.external.len(), 366);
        assert_eq!(a.visits.len(), 366 * 24 * 2);
        assert_eq!(a.external, b.external);
        assert_eq!(a.visits, b.visits);
    }

    #[test]
    fn test_external_factor_ranges() {
        let data = SyntheticDataGenerator::default_year().unwrap().generate().unwrap();

        for d in &data.external {
            assert!((50..=500).contains(&d.aqi));
            assert!(d.epidemic_alert_level <= 3);
            assert!(d.rainfall >= 0.0);
        }

        let holidays: Vec<_> = data.external.iter().filter(|d| d.holiday_flag == 1).collect();
        assert_eq!(holidays.len(), 5);
        assert!(holidays.iter().any(|d| d.festival_name == "Diwali"));

        // 2024-01-05 起的固定波次: 第 4 天达到 3 级
        let jan8 = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let level = data.external.iter().find(|d| d.date == jan8).unwrap().epidemic_alert_level;
        assert_eq!(level, 3);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let a = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(SyntheticDataGenerator::new(a, b, 1).is_err());
    }
}
