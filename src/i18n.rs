// ==========================================
// MRP 固定批量拆分 - 用户提示消息
// ==========================================
// 语言包: locales/zh-CN.yml (默认), locales/en.yml
// rust_i18n::i18n! 已在 lib.rs 中初始化
// ==========================================

/// 语言选择环境变量
pub const LOCALE_ENV: &str = "MRP_BATCH_SPLIT_LOCALE";

/// 已提供语言包的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

/// 切换语言，不支持的语言保持当前设置
///
/// # 返回
/// 是否已切换
pub fn set_locale(locale: &str) -> bool {
    match SUPPORTED_LOCALES.iter().find(|l| l.eq_ignore_ascii_case(locale.trim())) {
        Some(l) => {
            rust_i18n::set_locale(l);
            true
        }
        None => false,
    }
}

/// 按 MRP_BATCH_SPLIT_LOCALE 选择语言
pub fn init_from_env() {
    if let Ok(locale) = std::env::var(LOCALE_ENV) {
        if !set_locale(&locale) {
            tracing::warn!(locale = %locale, "不支持的语言，使用默认语言");
        }
    }
}

/// 翻译消息
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息并替换 `%{name}` 占位符
///
/// ```no_run
/// use mrp_batch_split::i18n::t_with_args;
/// let msg = t_with_args("split.expected_single_record", &[("count", "2")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |msg, (name, value)| {
        msg.replace(&format!("%{{{}}}", name), value)
    })
}
