// ==========================================
// 医院就诊负荷预测 - 历史就诊数据导入 / 导出
// ==========================================
// 导入: 日度序列文件 (CSV / Excel) → DailyRecord
//       外部因子 CSV + 小时级就诊 CSV → DailyRecord（按日汇总）
// 导出: 日度序列 / 外部因子 / 小时级就诊 CSV
// 字段名大小写不敏感；环境字段缺失时取默认值
// ==========================================

use crate::domain::environment::{EnvironmentalSnapshot, DEFAULT_AQI, DEFAULT_TEMP_C};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use crate::training::dataset::{aggregate_daily, DailyRecord, ExternalFactorsDay, HourlyVisit};
use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// 日度序列文件的列名（小写）
pub mod columns {
    pub const DATE: &str = "date";
    pub const PATIENTS: &str = "patients";
    pub const PATIENTS_ALIASES: [&str; 2] = ["patient_count", "total_patients"];
    pub const AQI: &str = "aqi";
    pub const TEMP: &str = "temp";
    pub const RAINFALL: &str = "rainfall";
    pub const EPIDEMIC: &str = "epidemic_alert_level";
    pub const HOLIDAY: &str = "holiday_flag";
    pub const FESTIVAL_FLAG: &str = "festival_flag";
    pub const FESTIVAL_NAME: &str = "festival_name";
}

const MAX_AQI: f64 = 500.0;
const MAX_EPIDEMIC_LEVEL: f64 = 3.0;

/// Excel 日期序列号的零点
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

// ==========================================
// HistoryImporter
// ==========================================
#[derive(Default)]
pub struct HistoryImporter {
    parser: UniversalFileParser,
}

impl HistoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 导入日度序列文件
    ///
    /// # 返回
    /// - Ok: 按日期升序的记录
    /// - Err: 文件错误 / 字段缺失 / 类型或范围错误 / 日期重复
    pub fn import_daily_series<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<DailyRecord>> {
        let path = path.as_ref();
        let rows = self.parser.parse(path)?;
        let records = map_rows(&rows)?;

        tracing::info!(
            path = %path.display(),
            rows = records.len(),
            first = ?records.first().map(|r| r.date),
            last = ?records.last().map(|r| r.date),
            "历史就诊数据导入完成"
        );
        Ok(records)
    }

    /// 导入外部因子 + 小时级就诊两份 CSV，并按日汇总
    pub fn import_split_sources<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        external_path: P,
        visits_path: Q,
    ) -> ImportResult<Vec<DailyRecord>> {
        let external: Vec<ExternalFactorsDay> = read_csv_rows(external_path.as_ref())?;
        let visits: Vec<HourlyVisit> = read_csv_rows(visits_path.as_ref())?;
        if external.is_empty() {
            return Err(ImportError::EmptyDataset);
        }

        let records = aggregate_daily(&external, &visits);
        tracing::info!(
            external_rows = external.len(),
            visit_rows = visits.len(),
            days = records.len(),
            "外部因子与就诊记录汇总完成"
        );
        Ok(records)
    }
}

/// 原始行 → 日度记录（按日期升序）
pub fn map_rows(rows: &[RawRow]) -> ImportResult<Vec<DailyRecord>> {
    if rows.is_empty() {
        return Err(ImportError::EmptyDataset);
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 1;
        let record = map_row(row_no, row)?;
        if !seen.insert(record.date) {
            return Err(ImportError::DuplicateDate(record.date.to_string()));
        }
        records.push(record);
    }

    records.sort_by_key(|r| r.date);
    Ok(records)
}

fn map_row(row_no: usize, row: &RawRow) -> ImportResult<DailyRecord> {
    let date_raw = required(row_no, row, columns::DATE)?;
    let date = parse_date(row_no, columns::DATE, date_raw)?;

    let patients_raw = std::iter::once(columns::PATIENTS)
        .chain(columns::PATIENTS_ALIASES)
        .find_map(|key| value(row, key))
        .ok_or_else(|| ImportError::MissingField {
            row: row_no,
            field: columns::PATIENTS.to_string(),
        })?;
    let patients = parse_number(row_no, columns::PATIENTS, patients_raw)?;
    check_range(row_no, columns::PATIENTS, patients, 0.0, f64::MAX)?;

    let aqi = optional_number(row_no, row, columns::AQI, f64::from(DEFAULT_AQI))?;
    check_range(row_no, columns::AQI, aqi, 0.0, MAX_AQI)?;

    let temp = optional_number(row_no, row, columns::TEMP, DEFAULT_TEMP_C)?;
    let rainfall = optional_number(row_no, row, columns::RAINFALL, 0.0)?;
    check_range(row_no, columns::RAINFALL, rainfall, 0.0, f64::MAX)?;

    let epidemic = optional_number(row_no, row, columns::EPIDEMIC, 0.0)?;
    check_range(row_no, columns::EPIDEMIC, epidemic, 0.0, MAX_EPIDEMIC_LEVEL)?;

    let holiday_flag = optional_flag(row_no, row, columns::HOLIDAY)?;
    let festival_flag = optional_flag(row_no, row, columns::FESTIVAL_FLAG)?;
    let festival_name = value(row, columns::FESTIVAL_NAME).unwrap_or("").to_string();

    Ok(DailyRecord {
        date,
        patients,
        snapshot: EnvironmentalSnapshot {
            aqi: aqi.round() as u32,
            temp,
            rainfall,
            epidemic_alert_level: epidemic.round() as u8,
            holiday_flag,
            festival_flag,
        },
        festival_name,
    })
}

// ==========================================
// 字段读取与转换
// ==========================================

/// 非空字段值
fn value<'a>(row: &'a RawRow, key: &str) -> Option<&'a str> {
    row.get(key).map(|v| v.as_str()).filter(|v| !v.is_empty())
}

fn required<'a>(row_no: usize, row: &'a RawRow, key: &str) -> ImportResult<&'a str> {
    value(row, key).ok_or_else(|| ImportError::MissingField {
        row: row_no,
        field: key.to_string(),
    })
}

fn parse_number(row_no: usize, field: &str, raw: &str) -> ImportResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ImportError::TypeConversionError {
            row: row_no,
            field: field.to_string(),
            message: format!("无法解析为数值: {}", raw),
        })
}

fn optional_number(row_no: usize, row: &RawRow, key: &str, default: f64) -> ImportResult<f64> {
    match value(row, key) {
        Some(raw) => parse_number(row_no, key, raw),
        None => Ok(default),
    }
}

fn optional_flag(row_no: usize, row: &RawRow, key: &str) -> ImportResult<u8> {
    let Some(raw) = value(row, key) else {
        return Ok(0);
    };
    match raw.to_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" => Ok(1),
        "0" | "0.0" | "false" | "no" | "n" => Ok(0),
        other => Err(ImportError::TypeConversionError {
            row: row_no,
            field: key.to_string(),
            message: format!("无法解析为标记 (0/1): {}", other),
        }),
    }
}

fn check_range(row_no: usize, field: &str, v: f64, min: f64, max: f64) -> ImportResult<()> {
    if v < min || v > max {
        return Err(ImportError::ValueRangeError {
            row: row_no,
            field: field.to_string(),
            value: v,
            min,
            max,
        });
    }
    Ok(())
}

/// 日期解析: YYYY-MM-DD / YYYY/MM/DD / YYYYMMDD / 带时间后缀 / Excel 序列号
pub fn parse_date(row_no: usize, field: &str, raw: &str) -> ImportResult<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, fmt) {
            return Ok(date);
        }
    }

    if let Ok(serial) = trimmed.parse::<f64>() {
        if (1.0..100_000.0).contains(&serial) {
            if let Some(date) = excel_epoch().map(|e| e + Duration::days(serial.trunc() as i64)) {
                return Ok(date);
            }
        }
    }

    Err(ImportError::DateFormatError {
        row: row_no,
        field: field.to_string(),
        value: raw.to_string(),
    })
}

// ==========================================
// CSV 读写
// ==========================================

fn read_csv_rows<T: DeserializeOwned>(path: &Path) -> ImportResult<Vec<T>> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let row: T = result.map_err(|e| ImportError::TypeConversionError {
            row: idx + 1,
            field: "*".to_string(),
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn write_csv_rows<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> ImportResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        }
    }

    let mut writer =
        csv::Writer::from_path(path).map_err(|e| ImportError::FileWriteError(e.to_string()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| ImportError::FileWriteError(e.to_string()))?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "CSV 导出完成");
    Ok(())
}

/// 日度序列导出行
#[derive(Serialize)]
struct DailySeriesRow<'a> {
    date: NaiveDate,
    patients: f64,
    #[serde(rename = "AQI")]
    aqi: u32,
    temp: f64,
    rainfall: f64,
    epidemic_alert_level: u8,
    holiday_flag: u8,
    festival_flag: u8,
    festival_name: &'a str,
}

/// 导出日度序列（可被 import_daily_series 读回）
pub fn export_daily_series<P: AsRef<Path>>(path: P, records: &[DailyRecord]) -> ImportResult<()> {
    let rows: Vec<DailySeriesRow<'_>> = records
        .iter()
        .map(|r| DailySeriesRow {
            date: r.date,
            patients: r.patients,
            aqi: r.snapshot.aqi,
            temp: r.snapshot.temp,
            rainfall: r.snapshot.rainfall,
            epidemic_alert_level: r.snapshot.epidemic_alert_level,
            holiday_flag: r.snapshot.holiday_flag,
            festival_flag: r.festival_flag(),
            festival_name: &r.festival_name,
        })
        .collect();
    write_csv_rows(path, &rows)
}

/// 导出外部因子
pub fn export_external_factors<P: AsRef<Path>>(path: P, days: &[ExternalFactorsDay]) -> ImportResult<()> {
    write_csv_rows(path, days)
}

/// 导出小时级就诊记录
pub fn export_hourly_visits<P: AsRef<Path>>(path: P, visits: &[HourlyVisit]) -> ImportResult<()> {
    write_csv_rows(path, visits)
}
