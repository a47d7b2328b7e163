// ==========================================
// 医院就诊负荷预测 - 训练数据集
// ==========================================
// 日度记录 → 训练样本
// 红线: 特征构造必须复用 FeatureExtractor，与在线预测逐位一致
// ==========================================

use crate::domain::environment::{EnvironmentalSnapshot, HistoricalLagContext, ROLLING_WINDOW_DAYS};
use crate::engine::features::FeatureExtractor;
use crate::engine::forest::TrainingSample;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 原始数据形态
// ==========================================

/// 科室
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "ER")]
    Er, // 急诊
    #[serde(rename = "Resp_OPD")]
    RespOpd, // 呼吸门诊
}

impl Department {
    pub const ALL: [Department; 2] = [Department::Er, Department::RespOpd];
}

/// 单日外部因子（external_factors.csv 的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFactorsDay {
    pub date: NaiveDate,
    pub holiday_flag: u8,
    #[serde(default)]
    pub festival_name: String,
    #[serde(rename = "AQI")]
    pub aqi: u32,
    pub temp: f64,
    pub rainfall: f64,
    pub epidemic_alert_level: u8,
}

/// 小时级就诊记录（patient_visits.csv 的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyVisit {
    pub date: NaiveDate,
    pub hour: u32,
    pub department: Department,
    pub patient_count: u32,
}

// ==========================================
// DailyRecord - 日度记录
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub patients: f64,                   // 当日就诊总人数
    pub snapshot: EnvironmentalSnapshot, // 当日环境
    pub festival_name: String,           // 节庆名称（无则为空）
}

impl DailyRecord {
    /// 节庆标记 = 节假日 或 有节庆名称 或 源数据已标记
    pub fn festival_flag(&self) -> u8 {
        let flagged = self.snapshot.holiday_flag == 1
            || !self.festival_name.trim().is_empty()
            || self.snapshot.festival_flag == 1;
        u8::from(flagged)
    }

    /// 训练用环境快照（festival_flag 已归一化）
    pub fn training_snapshot(&self) -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            festival_flag: self.festival_flag(),
            ..self.snapshot
        }
    }
}

/// 小时级就诊按日汇总，并与外部因子按日期关联
///
/// 没有外部因子的日期被丢弃；没有就诊记录的日期就诊数记为 0
pub fn aggregate_daily(external: &[ExternalFactorsDay], visits: &[HourlyVisit]) -> Vec<DailyRecord> {
    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for v in visits {
        *totals.entry(v.date).or_insert(0) += u64::from(v.patient_count);
    }

    let mut records: Vec<DailyRecord> = external
        .iter()
        .map(|day| DailyRecord {
            date: day.date,
            patients: totals.get(&day.date).copied().unwrap_or(0) as f64,
            snapshot: EnvironmentalSnapshot {
                aqi: day.aqi,
                temp: day.temp,
                rainfall: day.rainfall,
                epidemic_alert_level: day.epidemic_alert_level,
                holiday_flag: day.holiday_flag,
                festival_flag: 0,
            },
            festival_name: day.festival_name.clone(),
        })
        .collect();

    records.sort_by_key(|r| r.date);
    records
}

/// 构造训练样本
///
/// 要求 `records` 按日期升序；第 i 天使用
/// lag1 = p[i-1], lag2 = p[i-2], lag7 = p[i-7], roll7 = mean(p[i-7..i])，
/// 前 7 天因滞后不足被丢弃
pub fn build_training_rows(records: &[DailyRecord]) -> Vec<TrainingSample> {
    let extractor = FeatureExtractor::new();
    let patients: Vec<f64> = records.iter().map(|r| r.patients).collect();

    records
        .iter()
        .enumerate()
        .skip(ROLLING_WINDOW_DAYS)
        .filter_map(|(i, record)| {
            let lags = HistoricalLagContext::from_recent_counts(&patients[..i])?;
            let features = extractor.extract(record.date, &record.training_snapshot(), &lags);
            Some(TrainingSample {
                features,
                target: record.patients,
            })
        })
        .collect()
}
