//! 構造化ログユーティリティ。
//! tracing クレートを使用し、JSON またはテキスト形式の構造化ログを出力する。
//!
//! # 使用例
//!
//! ```ignore
//! use tracing::{info, warn, error};
//!
//! info!(openid_count = 2, "prepare to send wechat message");
//! warn!(user = %user_id, "could not find the user's openid");
//! error!(error = %e, "failed to deliver template message");
//! ```

/// parse_log_level はログレベル文字列を tracing の Level に変換する。
/// 不明な値は INFO とみなす。
pub fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// "text" 以外はすべて JSON 出力とする。
pub fn is_text_format(format: &str) -> bool {
    format.eq_ignore_ascii_case("text")
}
