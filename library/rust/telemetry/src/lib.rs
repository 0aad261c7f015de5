pub mod logger;


use tracing_subscriber::{
    fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// TelemetryConfig は telemetry ライブラリの初期化設定を保持する。
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub version: String,
    pub environment: String,
    pub log_level: String,
    /// ログ出力フォーマット。"text" の場合はプレーンテキスト、それ以外は JSON。
    pub log_format: String,
}

/// init_telemetry は tracing-subscriber をグローバルに初期化する。
///
/// `RUST_LOG` が設定されていればそれを優先し、なければ `log_level` をフィルタに使う。
/// 2 回目以降の呼び出しはエラーを返す。
pub fn init_telemetry(cfg: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logger::parse_log_level(&cfg.log_level).as_str()))?;
    let registry = tracing_subscriber::registry().with(filter);

    if logger::is_text_format(&cfg.log_format) {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    }

    tracing::info!(
        service = %cfg.service_name,
        version = %cfg.version,
        environment = %cfg.environment,
        "telemetry initialized"
    );

    Ok(())
}
