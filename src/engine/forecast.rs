// ==========================================
// 医院就诊负荷预测 - 多日预测
// ==========================================
// 逐日预测: 第 d 天的滞后特征依赖第 d-1 天的预测值，严格顺序执行
// 环境漂移: AQI + (d*5)%100, 气温 + (d%3) - 1（无天气预报接入时的模拟）
// ==========================================

use crate::domain::environment::{EnvironmentalSnapshot, HistoricalLagContext};
use crate::domain::types::{LoadLevel, TrendDirection};
use crate::engine::decision::DecisionEngine;
use crate::engine::predictor::LoadPredictor;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// 默认预测天数
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// 最大预测天数
pub const MAX_FORECAST_DAYS: u32 = 14;

/// 单日预测
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub predicted_patients: f64,
    pub load_level: LoadLevel,
    pub aqi: u32,
    pub temp: f64,
    pub epidemic_alert: u8,
    pub key_advisory: Option<String>, // 当日第一条建议的消息
}

/// 趋势摘要（仅比较首末两天）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTrends {
    pub patient_load_trend: TrendDirection,
    pub aqi_trend: TrendDirection,
    pub peak_day: NaiveDate,   // 峰值日（并列取最早）
    pub lowest_day: NaiveDate, // 低谷日（并列取最早）
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub days: Vec<ForecastDay>,
    pub trends: ForecastTrends,
}

/// 第 d 天的模拟环境
pub fn drifted_environment(base: &EnvironmentalSnapshot, day_offset: u32) -> EnvironmentalSnapshot {
    let aqi = base.aqi + (day_offset * 5) % 100;
    let temp = base.temp + f64::from(day_offset % 3) - 1.0;
    base.with_drift(aqi, temp)
}

// ==========================================
// Forecaster - 多日预测器
// ==========================================
pub struct Forecaster<'a> {
    predictor: &'a LoadPredictor,
    engine: &'a DecisionEngine,
}

impl<'a> Forecaster<'a> {
    pub fn new(predictor: &'a LoadPredictor, engine: &'a DecisionEngine) -> Self {
        Self { predictor, engine }
    }

    /// 生成多日预测
    ///
    /// # 参数
    /// - `start`: 第 0 天日期
    /// - `days`: 天数（调用方负责范围校验）
    /// - `base_env`: 基准环境快照
    /// - `lags`: 第 0 天的滞后上下文（按值传入，逐日推进）
    ///
    /// # 返回
    /// - None: days == 0
    pub fn forecast(
        &self,
        start: NaiveDate,
        days: u32,
        base_env: &EnvironmentalSnapshot,
        mut lags: HistoricalLagContext,
    ) -> Option<Forecast> {
        let mut forecast_days = Vec::with_capacity(days as usize);

        for offset in 0..days {
            let date = start + Duration::days(i64::from(offset));
            let env = drifted_environment(base_env, offset);

            let result = self.predictor.predict(date, &env, &lags);
            let load_level = self.engine.classify_load(result.prediction);
            let key_advisory = self
                .engine
                .generate_patient_advisory(result.prediction, &env)
                .into_iter()
                .next()
                .map(|a| a.message);

            forecast_days.push(ForecastDay {
                date,
                predicted_patients: result.prediction,
                load_level,
                aqi: env.aqi,
                temp: env.temp,
                epidemic_alert: env.epidemic_alert_level,
                key_advisory,
            });

            lags.advance(result.prediction);
        }

        let trends = summarize_trends(&forecast_days)?;
        tracing::debug!(
            days,
            peak_day = %trends.peak_day,
            trend = ?trends.patient_load_trend,
            "多日预测完成"
        );

        Some(Forecast {
            days: forecast_days,
            trends,
        })
    }
}

/// 计算趋势摘要；空序列返回 None
pub fn summarize_trends(days: &[ForecastDay]) -> Option<ForecastTrends> {
    let first = days.first()?;
    let last = days.last()?;

    let mut peak = first;
    let mut lowest = first;
    for day in days.iter().skip(1) {
        if day.predicted_patients > peak.predicted_patients {
            peak = day;
        }
        if day.predicted_patients < lowest.predicted_patients {
            lowest = day;
        }
    }

    Some(ForecastTrends {
        patient_load_trend: TrendDirection::between(
            first.predicted_patients,
            last.predicted_patients,
        ),
        aqi_trend: TrendDirection::between(f64::from(first.aqi), f64::from(last.aqi)),
        peak_day: peak.date,
        lowest_day: lowest.date,
    })
}
