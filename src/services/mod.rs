// ==========================================
// 医院就诊负荷预测 - 外部协作方端口
// ==========================================
// 职责: 环境数据源 / 历史数据源 / 文本生成服务的 trait 定义与默认实现
// 红线: 不包含真实 HTTP 客户端
// ==========================================

pub mod environment;
pub mod error;
pub mod history;
pub mod narrative;

pub use environment::{default_current_snapshot, EnvironmentSource, StaticEnvironmentSource};
pub use error::{ServiceError, ServiceResult};
pub use history::{default_recent_lags, HistorySource, SeriesHistorySource, StaticHistorySource};
pub use narrative::{
    NarrativeContext, NarrativeProvider, NoOpNarrativeProvider, OptionalNarrativeProvider,
};

use std::future::Future;
use std::time::Duration;

/// 带超时调用协作方
///
/// 超时或失败时记录 warn 并返回 None，由调用方决定降级值
pub async fn call_with_timeout<T, F>(operation: &str, timeout: Duration, fut: F) -> Option<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(operation, error = %e, "协作方调用失败，使用降级值");
            None
        }
        Err(_) => {
            let e = ServiceError::Timeout {
                operation: operation.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            };
            tracing::warn!(operation, error = %e, "协作方调用超时，使用降级值");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_with_timeout_returns_value() {
        let value = call_with_timeout("ok", Duration::from_millis(100), async {
            Ok::<_, ServiceError>(7)
        })
        .await;
        assert_eq!(value, Some(7));
    }

    #[tokio::test]
    async fn test_call_with_timeout_on_error() {
        let value: Option<u32> = call_with_timeout("err", Duration::from_millis(100), async {
            Err(ServiceError::Unavailable("down".to_string()))
        })
        .await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_call_with_timeout_on_slow_future() {
        let value = call_with_timeout("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ServiceError>(1)
        })
        .await;
        assert_eq!(value, None);
    }
}
