//! 可观测性：tracing 订阅器（RUST_LOG 覆盖默认 info 级别）

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// 测试中可重复调用；已初始化时忽略
pub fn try_init_for_tests() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
