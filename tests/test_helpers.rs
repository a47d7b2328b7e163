// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的配置库初始化、训练数据构造等功能
// ==========================================

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use hospital_advisory::db::{ensure_config_schema, open_sqlite_connection};
use hospital_advisory::domain::EnvironmentalSnapshot;
use hospital_advisory::training::DailyRecord;
use rusqlite::{params, Connection};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时配置库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_config_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 写入一组非默认配置
pub fn insert_test_config(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let configs = [
        ("load_threshold_low", "250"),
        ("load_threshold_normal", "350"),
        ("load_threshold_high", "450"),
        ("load_threshold_critical", "550"),
        ("staffing_ratio_doctors", "40"),
        ("staffing_ratio_nurses", "15"),
        ("staffing_ratio_support", "30"),
        ("supply_rates", r#"{"masks": 2.0, "gloves": 4.0}"#),
        ("safety_stock_days", "5"),
        ("collaborator_timeout_ms", "500"),
    ];

    for (key, value) in configs {
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
    }
    Ok(())
}

/// 构造有明显周内规律的日序列（AQI 与就诊人数正相关）
pub fn build_daily_series(start: NaiveDate, days: usize) -> Vec<DailyRecord> {
    (0..days)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            let aqi = 120 + ((i * 37) % 200) as u32;
            let weekday_bump = if i % 7 >= 5 { -40.0 } else { 0.0 };
            let patients = 200.0 + f64::from(aqi) * 0.6 + weekday_bump;

            DailyRecord {
                date,
                patients,
                snapshot: EnvironmentalSnapshot {
                    aqi,
                    temp: 20.0 + (i % 10) as f64,
                    ..EnvironmentalSnapshot::default()
                },
                festival_name: String::new(),
            }
        })
        .collect()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
