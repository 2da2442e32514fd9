// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// 规则消息参数为位置参数: %{0}, %{1}, ...
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::engine::result::RuleResultMessage;

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use curricular_engine::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 按指定语言翻译 (不修改全局语言)
pub fn t_in(key: &str, locale: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 渲染规则结果消息 (当前语言)
///
/// # 规则
/// - to_translate = false: 键即展示文本
/// - 未收录的键: 原样输出键与参数, 不丢失信息
pub fn render(message: &RuleResultMessage) -> String {
    render_template(message, t(&message.key))
}

/// 渲染规则结果消息 (指定语言)
pub fn render_in(message: &RuleResultMessage, locale: &str) -> String {
    render_template(message, t_in(&message.key, locale))
}

/// 渲染多条消息
pub fn render_all(messages: &[RuleResultMessage]) -> Vec<String> {
    messages.iter().map(render).collect()
}

fn render_template(message: &RuleResultMessage, template: String) -> String {
    if !message.to_translate {
        return message.key.clone();
    }
    // rust-i18n 对缺失的键返回 "键" 或 "语言.键"
    if template == message.key || template.ends_with(&format!(".{}", message.key)) {
        if message.args.is_empty() {
            return message.key.clone();
        }
        return format!("{} [{}]", message.key, message.args.join(", "));
    }
    message
        .args
        .iter()
        .enumerate()
        .fold(template, |text, (index, arg)| {
            text.replace(&format!("%{{{}}}", index), arg)
        })
}
