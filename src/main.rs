// ==========================================
// 医院就诊负荷预测 - 命令行入口
// ==========================================
// 用法: hospital-advisory [current|forecast [days]|risks|model|env]
// 输出: stdout 打印 JSON；日志写 stderr
// ==========================================

use hospital_advisory::app::{get_default_db_path, AppState};
use hospital_advisory::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", hospital_advisory::APP_NAME);
    tracing::info!("系统版本: {}", hospital_advisory::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("current");

    let db_path = get_default_db_path();
    let state = AppState::new(db_path).await?;
    let api = &state.advisory_api;

    let output = match command {
        "current" => serde_json::to_string_pretty(&api.get_current_advisory().await?)?,
        "forecast" => {
            let days = match args.get(1) {
                Some(raw) => Some(
                    raw.parse::<u32>()
                        .map_err(|e| format!("无效的天数 '{}': {}", raw, e))?,
                ),
                None => None,
            };
            serde_json::to_string_pretty(&api.get_forecast(days).await?)?
        }
        "risks" => serde_json::to_string_pretty(&api.get_health_risks().await?)?,
        "model" => serde_json::to_string_pretty(&api.get_model_info().await?)?,
        "env" => serde_json::to_string_pretty(&api.get_environmental_factors().await?)?,
        other => {
            return Err(format!(
                "未知命令 '{}'（可用: current, forecast [days], risks, model, env）",
                other
            )
            .into())
        }
    };

    println!("{}", output);
    Ok(())
}
