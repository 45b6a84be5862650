// src/logging.rs — tracing 日志输出到 stderr

use tracing_subscriber::EnvFilter;

/// 优先 `RUST_LOG`；否则 0 = warn, 1 = debug, 2+ = trace
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wifi2qr={level}")));

    // 重复初始化（测试中）直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
