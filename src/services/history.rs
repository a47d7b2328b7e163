// ==========================================
// 医院就诊负荷预测 - 历史就诊数据源
// ==========================================
// 为预测目标日提供滞后上下文 (lag1 / lag2 / lag7 / roll7)
// ==========================================

use crate::domain::environment::{HistoricalLagContext, ROLLING_WINDOW_DAYS};
use crate::services::error::{ServiceError, ServiceResult};
use crate::training::dataset::DailyRecord;
use async_trait::async_trait;
use chrono::NaiveDate;

/// 无历史数据时的滞后上下文 (320 / 315 / 310 / 318)
pub fn default_recent_lags() -> HistoricalLagContext {
    HistoricalLagContext::new(320.0, 315.0, 310.0, 318.0)
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// 获取目标日的滞后上下文（只使用目标日之前的数据）
    async fn recent_lags(&self, target: NaiveDate) -> ServiceResult<HistoricalLagContext>;
}

/// 固定上下文数据源
#[derive(Debug, Clone, Copy)]
pub struct StaticHistorySource {
    lags: HistoricalLagContext,
}

impl StaticHistorySource {
    pub fn new(lags: HistoricalLagContext) -> Self {
        Self { lags }
    }
}

impl Default for StaticHistorySource {
    fn default() -> Self {
        Self::new(default_recent_lags())
    }
}

#[async_trait]
impl HistorySource for StaticHistorySource {
    async fn recent_lags(&self, _target: NaiveDate) -> ServiceResult<HistoricalLagContext> {
        Ok(self.lags)
    }
}

/// 基于已导入日序列的数据源
#[derive(Debug, Clone, Default)]
pub struct SeriesHistorySource {
    series: Vec<(NaiveDate, f64)>, // 按日期升序
}

impl SeriesHistorySource {
    pub fn from_records(records: &[DailyRecord]) -> Self {
        let mut series: Vec<(NaiveDate, f64)> =
            records.iter().map(|r| (r.date, r.patients)).collect();
        series.sort_by_key(|(date, _)| *date);
        Self { series }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[async_trait]
impl HistorySource for SeriesHistorySource {
    /// 窗口须为目标日前连续 7 天（最后一天 = 目标日前一天）
    async fn recent_lags(&self, target: NaiveDate) -> ServiceResult<HistoricalLagContext> {
        let mut window: Vec<f64> = Vec::with_capacity(ROLLING_WINDOW_DAYS);
        let mut expected = target.pred_opt();

        for (date, patients) in self.series.iter().rev().skip_while(|(date, _)| *date >= target) {
            if Some(*date) != expected || window.len() == ROLLING_WINDOW_DAYS {
                break;
            }
            window.push(*patients);
            expected = date.pred_opt();
        }
        window.reverse();

        HistoricalLagContext::from_recent_counts(&window).ok_or_else(|| {
            tracing::debug!(
                date = %target,
                consecutive_days = window.len(),
                "目标日前连续历史不足"
            );
            ServiceError::InsufficientHistory {
                required: ROLLING_WINDOW_DAYS,
                actual: window.len(),
            }
        })
    }
}
