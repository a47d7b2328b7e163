// ==========================================
// 医院就诊负荷预测 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 无全局单例: 预测器 / 决策引擎 / 协作方均在此构造并注入 API
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::AdvisoryApi;
use crate::config::{default_config_db_path, AdvisoryConfigReader, ConfigManager};
use crate::engine::decision::{DecisionConfig, DecisionEngine};
use crate::engine::predictor::LoadPredictor;
use crate::importer::HistoryImporter;
use crate::services::{
    EnvironmentSource, HistorySource, OptionalNarrativeProvider, SeriesHistorySource,
    StaticEnvironmentSource, StaticHistorySource,
};

/// 应用状态
pub struct AppState {
    /// 配置库路径（None 表示使用内置默认配置）
    pub db_path: Option<String>,

    /// 模型产物路径
    pub model_path: PathBuf,

    /// 负荷预测器（只读共享）
    pub predictor: Arc<LoadPredictor>,

    /// 决策引擎
    pub decision_engine: Arc<DecisionEngine>,

    /// 公众建议API
    pub advisory_api: Arc<AdvisoryApi>,
}

impl AppState {
    /// 从配置库创建AppState实例
    ///
    /// # 参数
    /// - db_path: 配置库文件路径（不存在时自动建表）
    ///
    /// # 说明
    /// 1. 读取决策配置 / 模型路径 / 超时 / 语言 / 历史数据路径
    /// 2. 加载模型（失败时退化为基线模型）
    /// 3. 装配协作方与 API
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，配置库路径: {}", db_path);

        if let Some(parent) = Path::new(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("无法创建配置库目录: {}", e))?;
            }
        }

        let config_manager =
            ConfigManager::new(&db_path).map_err(|e| format!("无法创建ConfigManager: {}", e))?;

        let decision_config = config_manager
            .load_decision_config()
            .await
            .map_err(|e| format!("无法读取决策配置: {}", e))?;
        let model_path = config_manager
            .get_model_path()
            .await
            .map_err(|e| format!("无法读取模型路径: {}", e))?;
        let timeout_ms = config_manager
            .get_collaborator_timeout_ms()
            .await
            .map_err(|e| format!("无法读取超时配置: {}", e))?;
        let locale = config_manager
            .get_locale()
            .await
            .map_err(|e| format!("无法读取语言配置: {}", e))?;
        let history_path = config_manager
            .get_history_path()
            .await
            .map_err(|e| format!("无法读取历史数据路径: {}", e))?;

        let history = build_history_source(history_path.as_deref());

        Ok(Self::assemble(
            Some(db_path),
            model_path,
            decision_config,
            &locale,
            Duration::from_millis(timeout_ms),
            history,
        ))
    }

    /// 不依赖配置库的默认装配
    pub fn with_defaults(model_path: PathBuf) -> Self {
        Self::assemble(
            None,
            model_path,
            DecisionConfig::default(),
            crate::i18n::DEFAULT_LOCALE,
            Duration::from_millis(crate::config::DEFAULT_COLLABORATOR_TIMEOUT_MS),
            Arc::new(StaticHistorySource::default()),
        )
    }

    fn assemble(
        db_path: Option<String>,
        model_path: PathBuf,
        decision_config: DecisionConfig,
        locale: &str,
        timeout: Duration,
        history: Arc<dyn HistorySource>,
    ) -> Self {
        let predictor = Arc::new(LoadPredictor::load(&model_path));
        let decision_engine = Arc::new(DecisionEngine::new(decision_config).with_locale(locale));
        let environment: Arc<dyn EnvironmentSource> = Arc::new(StaticEnvironmentSource::default());

        let advisory_api = Arc::new(
            AdvisoryApi::new(
                predictor.clone(),
                decision_engine.clone(),
                environment,
                history,
                OptionalNarrativeProvider::disabled(),
            )
            .with_collaborator_timeout(timeout),
        );

        tracing::info!(
            model_path = %model_path.display(),
            model_status = %predictor.status(),
            locale,
            timeout_ms = timeout.as_millis() as u64,
            "AppState初始化完成"
        );

        Self {
            db_path,
            model_path,
            predictor,
            decision_engine,
            advisory_api,
        }
    }
}

/// 历史数据源：配置了可导入的日序列时使用，否则退回静态数据源
fn build_history_source(history_path: Option<&Path>) -> Arc<dyn HistorySource> {
    let Some(path) = history_path else {
        return Arc::new(StaticHistorySource::default());
    };

    match HistoryImporter::new().import_daily_series(path) {
        Ok(records) => {
            tracing::info!(path = %path.display(), days = records.len(), "历史就诊数据已加载");
            Arc::new(SeriesHistorySource::from_records(&records))
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "历史就诊数据加载失败，使用静态数据源");
            Arc::new(StaticHistorySource::default())
        }
    }
}

/// 获取默认配置库路径
///
/// 优先使用环境变量 HOSPITAL_ADVISORY_DB_PATH
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("HOSPITAL_ADVISORY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    default_config_db_path().to_string_lossy().to_string()
}
