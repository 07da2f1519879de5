// ==========================================
// 旅游批发后台 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时使用的过滤器
pub const DEFAULT_FILTER: &str = "info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=tour_allocation::engine=trace
///
/// # 示例
/// ```no_run
/// use tour_allocation::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// 初始化日志系统，RUST_LOG 缺失时使用指定的默认过滤器
///
/// 重复初始化不会 panic（命令行工具与测试可能多次调用）
pub fn init_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // 日志写到 stderr，stdout 留给 JSON 输出
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
