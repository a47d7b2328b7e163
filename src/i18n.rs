// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 建议文案按引擎实例持有的 locale 显式翻译，不依赖全局 locale
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "en";

/// 已加载的语言列表
pub fn available_locales() -> Vec<String> {
    rust_i18n::available_locales!()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// 翻译消息（指定语言，无参数）
///
/// # 示例
/// ```no_run
/// use hospital_advisory::i18n::t_in;
/// let tip = t_in("en", "tips.general.diet");
/// ```
pub fn t_in(locale: &str, key: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 翻译消息（指定语言，带参数）
///
/// 占位符格式: `%{name}`
///
/// # 示例
/// ```no_run
/// use hospital_advisory::i18n::t_in_with_args;
/// let msg = t_in_with_args("en", "risks.air.description", &[("aqi", "320")]);
/// ```
pub fn t_in_with_args(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let mut result = t_in(locale, key);
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locales_loaded() {
        let locales = available_locales();
        assert!(locales.iter().any(|l| l == "en"));
        assert!(locales.iter().any(|l| l == "zh-CN"));
    }

    #[test]
    fn test_translate_in_locale() {
        assert_eq!(
            t_in("en", "tips.general.diet"),
            "Maintain a healthy diet and regular exercise routine"
        );
        assert!(t_in("zh-CN", "tips.general.diet").contains("饮食"));
    }

    #[test]
    fn test_translate_with_args() {
        let msg = t_in_with_args("en", "risks.air.description", &[("aqi", "320")]);
        assert_eq!(msg, "AQI at 320. Respiratory issues may increase.");

        let msg = t_in_with_args("zh-CN", "risks.air.description", &[("aqi", "320")]);
        assert!(msg.contains("320"));
    }

    #[test]
    fn test_unknown_locale_falls_back_to_english() {
        assert_eq!(
            t_in("fr", "tips.general.sleep"),
            "Ensure adequate sleep and stress management"
        );
    }
}
