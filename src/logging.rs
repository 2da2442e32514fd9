// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 引擎日志: 选课批次 info, 规则逐条评估 debug
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// RUST_LOG 未设置时的默认过滤器
pub const DEFAULT_FILTER: &str = "warn,curricular_engine=info";

/// 规则逐条评估日志 (debug) 所在的 target
pub const RULE_TRACE_FILTER: &str = "warn,curricular_engine::engine=debug";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: DEFAULT_FILTER）
///   例如: RUST_LOG=curricular_engine::engine::enrolment=debug
///
/// # 示例
/// ```no_run
/// use curricular_engine::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化 JSON 格式日志 (batch_id / student 等字段可直接检索)
///
/// 重复调用时保留已安装的订阅者
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_current_span(true)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 输出引擎 debug 日志, 便于定位规则判定
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter(RULE_TRACE_FILTER))
        .with_test_writer()
        .try_init();
}
