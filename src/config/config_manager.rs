// ==========================================
// 医院就诊负荷预测 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 缺失或格式错误的配置项一律回落到默认值
// ==========================================

use crate::config::advisory_config_trait::AdvisoryConfigReader;
use crate::db::{ensure_config_schema, open_sqlite_connection};
use crate::engine::decision::{default_supply_rates, LoadThresholds, StaffingRatios};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 默认数据目录名
pub const APP_DATA_DIR: &str = "hospital-advisory";

/// 默认模型文件名
pub const DEFAULT_MODEL_FILE: &str = "patient_predictor.json";

/// 默认配置库文件名
pub const DEFAULT_CONFIG_DB_FILE: &str = "advisory_config.db";

/// 默认外部协作方超时（毫秒）
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 2_000;

/// 默认安全库存天数
pub const DEFAULT_SAFETY_STOCK_DAYS: u32 = 7;

/// 应用数据目录（平台数据目录不可用时退回当前目录下的 data/）
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DATA_DIR))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// 默认模型产物路径
pub fn default_model_path() -> PathBuf {
    default_data_dir().join(DEFAULT_MODEL_FILE)
}

/// 默认配置库路径
pub fn default_config_db_path() -> PathBuf {
    default_data_dir().join(DEFAULT_CONFIG_DB_FILE)
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（必要时建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA 并建表（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_config_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取数值配置，解析失败时告警并返回默认值
    fn get_f64_or_default(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let value = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ => {
                tracing::warn!(config_key = key, raw_value = %value, "数值配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// AdvisoryConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AdvisoryConfigReader for ConfigManager {
    async fn get_load_thresholds(&self) -> Result<LoadThresholds, Box<dyn Error>> {
        let defaults = LoadThresholds::default();
        let thresholds = LoadThresholds {
            low: self.get_f64_or_default(config_keys::LOAD_THRESHOLD_LOW, defaults.low)?,
            normal: self.get_f64_or_default(config_keys::LOAD_THRESHOLD_NORMAL, defaults.normal)?,
            high: self.get_f64_or_default(config_keys::LOAD_THRESHOLD_HIGH, defaults.high)?,
            critical: self
                .get_f64_or_default(config_keys::LOAD_THRESHOLD_CRITICAL, defaults.critical)?,
        };

        // 阈值必须严格递增，否则整体回落默认
        if thresholds.low < thresholds.normal && thresholds.normal < thresholds.high {
            Ok(thresholds)
        } else {
            tracing::warn!(
                low = thresholds.low,
                normal = thresholds.normal,
                high = thresholds.high,
                "负荷阈值未严格递增，使用默认阈值"
            );
            Ok(defaults)
        }
    }

    async fn get_staffing_ratios(&self) -> Result<StaffingRatios, Box<dyn Error>> {
        let defaults = StaffingRatios::default();
        let ratio = |key: &str, default: f64| -> Result<f64, Box<dyn Error>> {
            let value = self.get_f64_or_default(key, default)?;
            Ok(if value > 0.0 { value } else { default })
        };

        Ok(StaffingRatios {
            doctors: ratio(config_keys::STAFFING_RATIO_DOCTORS, defaults.doctors)?,
            nurses: ratio(config_keys::STAFFING_RATIO_NURSES, defaults.nurses)?,
            support: ratio(config_keys::STAFFING_RATIO_SUPPORT, defaults.support)?,
        })
    }

    async fn get_supply_rates(&self) -> Result<BTreeMap<String, f64>, Box<dyn Error>> {
        let value = match self.get_config_value(config_keys::SUPPLY_RATES)? {
            Some(v) => v,
            None => return Ok(default_supply_rates()),
        };

        let rates: BTreeMap<String, f64> = serde_json::from_str(&value).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::SUPPLY_RATES,
                raw_value = %value,
                "物资日耗率配置格式错误，使用默认配置"
            );
            default_supply_rates()
        });
        Ok(rates)
    }

    async fn get_safety_stock_days(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::SAFETY_STOCK_DAYS,
            &DEFAULT_SAFETY_STOCK_DAYS.to_string(),
        )?;
        Ok(value.trim().parse::<u32>().unwrap_or(DEFAULT_SAFETY_STOCK_DAYS))
    }

    async fn get_model_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        Ok(match self.get_config_value(config_keys::MODEL_PATH)? {
            Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
            _ => default_model_path(),
        })
    }

    async fn get_collaborator_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::COLLABORATOR_TIMEOUT_MS,
            &DEFAULT_COLLABORATOR_TIMEOUT_MS.to_string(),
        )?;
        Ok(match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => DEFAULT_COLLABORATOR_TIMEOUT_MS,
        })
    }

    async fn get_history_path(&self) -> Result<Option<PathBuf>, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::HISTORY_PATH)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from))
    }

    async fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOCALE, crate::i18n::DEFAULT_LOCALE)?;
        let locale = value.trim();
        if crate::i18n::available_locales().iter().any(|l| l == locale) {
            Ok(locale.to_string())
        } else {
            tracing::warn!(config_key = config_keys::LOCALE, raw_value = %value, "不支持的语言，使用默认语言");
            Ok(crate::i18n::DEFAULT_LOCALE.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 负荷分级
    pub const LOAD_THRESHOLD_LOW: &str = "load_threshold_low";
    pub const LOAD_THRESHOLD_NORMAL: &str = "load_threshold_normal";
    pub const LOAD_THRESHOLD_HIGH: &str = "load_threshold_high";
    pub const LOAD_THRESHOLD_CRITICAL: &str = "load_threshold_critical";

    // 排班
    pub const STAFFING_RATIO_DOCTORS: &str = "staffing_ratio_doctors";
    pub const STAFFING_RATIO_NURSES: &str = "staffing_ratio_nurses";
    pub const STAFFING_RATIO_SUPPORT: &str = "staffing_ratio_support";

    // 物资
    pub const SUPPLY_RATES: &str = "supply_rates";
    pub const SAFETY_STOCK_DAYS: &str = "safety_stock_days";

    // 服务装配
    pub const MODEL_PATH: &str = "model_path";
    pub const COLLABORATOR_TIMEOUT_MS: &str = "collaborator_timeout_ms";
    pub const HISTORY_PATH: &str = "history_path";
    pub const LOCALE: &str = "locale";
}
