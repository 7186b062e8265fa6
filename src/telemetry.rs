//! 日志与追踪初始化

use crate::config::LoggingConfig;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// `RUST_LOG` 优先，否则使用配置中的级别
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// 初始化全局 subscriber；重复初始化（如测试中）只记录告警
pub fn init_telemetry(config: &LoggingConfig) {
    let log_layer = match config.format.to_lowercase().as_str() {
        // 生产环境：JSON，每个请求 span 结束时输出耗时
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    let result = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(log_layer)
        .try_init();

    match result {
        Ok(()) => tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            level = %config.level,
            format = %config.format,
            "Telemetry initialized"
        ),
        Err(e) => tracing::warn!(error = %e, "Telemetry already initialized"),
    }
}
