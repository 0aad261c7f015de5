//! トークン取得エラー定義。

/// ServiceAuthError はクライアントクレデンシャルトークンの取得で発生するエラーを表す。
#[derive(thiserror::Error, Debug)]
pub enum ServiceAuthError {
    /// 認可サーバーへのリクエスト、またはレスポンスの解析に失敗した。
    #[error("トークン取得失敗: {0}")]
    TokenAcquisitionFailed(String),

    /// 設定値が不正で HTTP クライアントを構築できない。
    #[error("設定エラー: {0}")]
    Configuration(String),
}
