// ==========================================
// 医院就诊负荷预测 - 文本生成服务端口
// ==========================================
// 职责: 定义叙述性建议 / 健康提示的生成接口与提示词构造
// 说明: 服务本身不在本 crate 内；未配置时使用 NoOp 实现
// 失败语义: 任何失败或超时都视为"无叙述"，不影响主流程
// ==========================================

use crate::domain::advisory::Advisory;
use crate::domain::environment::EnvironmentalSnapshot;
use crate::domain::types::LoadLevel;
use crate::services::error::ServiceResult;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// 系统提示词
pub const NARRATIVE_SYSTEM_PROMPT: &str = "You are an autonomous healthcare operations AI assistant. \
Provide concise, actionable insights for public health advisories. \
Focus on practical recommendations that help people make informed decisions about their health and hospital visits.";

/// 生成提示最多保留条数
pub const MAX_GENERATED_TIPS: usize = 5;

/// 叙述生成上下文
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeContext {
    pub predicted_patients: f64,
    pub load_level: LoadLevel,
    pub env: EnvironmentalSnapshot,
    pub advisories: Vec<Advisory>,
}

/// 构造建议叙述的用户提示词
pub fn build_advisory_prompt(ctx: &NarrativeContext) -> String {
    let mut prompt = String::from(
        "Analyze the following healthcare situation and provide a brief public health advisory (2-3 sentences):\n\n",
    );

    let _ = writeln!(prompt, "HOSPITAL CAPACITY:");
    let _ = writeln!(
        prompt,
        "- Expected patient load: {} patients",
        ctx.predicted_patients.max(0.0).trunc() as u64
    );
    let _ = writeln!(prompt, "- Load classification: {}\n", ctx.load_level);

    let _ = writeln!(prompt, "ENVIRONMENTAL FACTORS:");
    let _ = writeln!(prompt, "- Air Quality Index (AQI): {}", ctx.env.aqi);
    let _ = writeln!(prompt, "- Temperature: {}°C", ctx.env.temp);
    let _ = writeln!(prompt, "- Epidemic alert level: {}\n", ctx.env.epidemic_alert_level);

    let _ = writeln!(prompt, "CURRENT ADVISORIES:");
    if ctx.advisories.is_empty() {
        let _ = writeln!(prompt, "- No special advisories");
    } else {
        for advisory in &ctx.advisories {
            let _ = writeln!(prompt, "- [{}] {}", advisory.severity, advisory.message);
        }
    }

    prompt.push_str(
        "\nProvide:\n\
         1. A brief risk assessment for the public\n\
         2. Key recommendations for staying healthy\n\
         3. Guidance on when to seek medical care\n\n\
         Keep your response concise and actionable for the general public.",
    );
    prompt
}

/// 构造健康提示的用户提示词
pub fn build_health_tips_prompt(env: &EnvironmentalSnapshot) -> String {
    format!(
        "Based on current environmental conditions, provide 3 specific health tips:\n\n\
         - Air Quality Index: {}\n\
         - Temperature: {}°C\n\
         - Epidemic alert level: {}\n\n\
         Format as a simple list of actionable tips.",
        env.aqi, env.temp, env.epidemic_alert_level
    )
}

/// 从生成文本中提取 "- " 开头的列表项（最多 5 条）
pub fn parse_tip_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(|line| line.trim_start_matches(|c| c == '-' || c == ' ').trim().to_string())
        .filter(|tip| !tip.is_empty())
        .take(MAX_GENERATED_TIPS)
        .collect()
}

// ==========================================
// NarrativeProvider Trait
// ==========================================
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// 服务是否可用
    async fn is_available(&self) -> bool;

    /// 生成叙述性建议；None 表示无内容
    async fn describe(&self, ctx: &NarrativeContext) -> ServiceResult<Option<String>>;

    /// 生成健康提示；None 表示无内容
    async fn health_tips(&self, env: &EnvironmentalSnapshot) -> ServiceResult<Option<Vec<String>>>;
}

/// 空实现：始终不可用
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNarrativeProvider;

#[async_trait]
impl NarrativeProvider for NoOpNarrativeProvider {
    async fn is_available(&self) -> bool {
        false
    }

    async fn describe(&self, _ctx: &NarrativeContext) -> ServiceResult<Option<String>> {
        Ok(None)
    }

    async fn health_tips(&self, _env: &EnvironmentalSnapshot) -> ServiceResult<Option<Vec<String>>> {
        Ok(None)
    }
}

// ==========================================
// OptionalNarrativeProvider - 超时 + 降级包装
// ==========================================
#[derive(Clone)]
pub struct OptionalNarrativeProvider {
    inner: Arc<dyn NarrativeProvider>,
    timeout: Duration,
}

impl OptionalNarrativeProvider {
    pub fn new(inner: Arc<dyn NarrativeProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// 未配置服务
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoOpNarrativeProvider), Duration::from_millis(1))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn is_available(&self) -> bool {
        tokio::time::timeout(self.timeout, self.inner.is_available())
            .await
            .unwrap_or(false)
    }

    /// 生成叙述；不可用 / 失败 / 超时均返回 None
    pub async fn describe(&self, ctx: &NarrativeContext) -> Option<String> {
        if !self.is_available().await {
            return None;
        }
        let text = crate::services::call_with_timeout(
            "narrative.describe",
            self.timeout,
            self.inner.describe(ctx),
        )
        .await
        .flatten()?;

        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// 生成健康提示；不可用 / 失败 / 超时均返回空列表
    pub async fn health_tips(&self, env: &EnvironmentalSnapshot) -> Vec<String> {
        if !self.is_available().await {
            return Vec::new();
        }
        crate::services::call_with_timeout(
            "narrative.health_tips",
            self.timeout,
            self.inner.health_tips(env),
        )
        .await
        .flatten()
        .unwrap_or_default()
    }
}

impl Default for OptionalNarrativeProvider {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for OptionalNarrativeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalNarrativeProvider")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
