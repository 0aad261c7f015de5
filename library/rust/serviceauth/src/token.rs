//! クライアントクレデンシャルトークン。

use chrono::{DateTime, Utc};

/// 下流サービス呼び出し用アクセストークン。
///
/// Client Credentials フローで取得したトークン情報を保持し、
/// 有効期限チェックとリフレッシュタイミングの判定を提供する。
#[derive(Debug, Clone)]
pub struct ClientCredentialToken {
    /// トークン種別（通常は "Bearer"）。
    pub token_type: String,

    /// アクセストークン文字列。
    pub access_token: String,

    /// トークンの有効期限（秒）。
    pub expires_in: u64,

    /// 延長有効期限（秒）。認可サーバーが返さない場合は None。
    pub ext_expires_in: Option<u64>,

    /// トークンを取得した時刻（UTC）。
    pub acquired_at: DateTime<Utc>,
}

impl ClientCredentialToken {
    /// 新しい ClientCredentialToken を生成する。取得時刻は現在時刻。
    pub fn new(
        token_type: String,
        access_token: String,
        expires_in: u64,
        ext_expires_in: Option<u64>,
    ) -> Self {
        Self {
            token_type,
            access_token,
            expires_in,
            ext_expires_in,
            acquired_at: Utc::now(),
        }
    }

    fn elapsed_secs(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.acquired_at)
            .num_seconds()
    }

    /// トークンが有効期限切れかどうかを返す。
    pub fn is_expired(&self) -> bool {
        let elapsed = self.elapsed_secs();
        elapsed < 0 || elapsed.unsigned_abs() >= self.expires_in
    }

    /// 指定秒数前にリフレッシュすべきかどうかを返す。
    ///
    /// `refresh_before_secs` 秒以内に有効期限が切れる場合は `true` を返す。
    pub fn should_refresh(&self, refresh_before_secs: u64) -> bool {
        let elapsed = self.elapsed_secs();
        if elapsed < 0 {
            return true;
        }
        elapsed.unsigned_abs().saturating_add(refresh_before_secs) >= self.expires_in
    }

    /// Authorization ヘッダー値 `"{token_type} {access_token}"` を返す。
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token_with_acquired_at(
        expires_in: u64,
        acquired_at: DateTime<Utc>,
    ) -> ClientCredentialToken {
        ClientCredentialToken {
            token_type: "Bearer".to_string(),
            access_token: "test-token".to_string(),
            expires_in,
            ext_expires_in: Some(expires_in),
            acquired_at,
        }
    }

    #[test]
    fn test_is_expired_not_yet_expired() {
        let token = ClientCredentialToken::new("Bearer".into(), "tok".into(), 3599, Some(3599));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_is_expired_just_expired() {
        let acquired_at = Utc::now() - chrono::Duration::seconds(3600);
        let token = make_token_with_acquired_at(3599, acquired_at);
        assert!(token.is_expired());
    }

    #[test]
    fn test_is_expired_future_acquired_at() {
        // 時計が巻き戻った場合は安全側に倒して期限切れとみなす
        let acquired_at = Utc::now() + chrono::Duration::seconds(60);
        let token = make_token_with_acquired_at(3599, acquired_at);
        assert!(token.is_expired());
    }

    #[test]
    fn test_should_refresh_far_from_expiry() {
        let token = ClientCredentialToken::new("Bearer".into(), "tok".into(), 3599, None);
        assert!(!token.should_refresh(120));
    }

    #[test]
    fn test_should_refresh_within_refresh_window() {
        // 経過 3500 秒、有効期限 3599 秒、閾値 120 秒: 3500 + 120 >= 3599
        let acquired_at = Utc::now() - chrono::Duration::seconds(3500);
        let token = make_token_with_acquired_at(3599, acquired_at);
        assert!(token.should_refresh(120));
    }

    #[test]
    fn test_should_refresh_just_before_boundary() {
        // 3400 + 120 = 3520 < 3599 → リフレッシュ不要
        let acquired_at = Utc::now() - chrono::Duration::seconds(3400);
        let token = make_token_with_acquired_at(3599, acquired_at);
        assert!(!token.should_refresh(120));
    }

    #[test]
    fn test_should_refresh_huge_window_does_not_overflow() {
        let token = ClientCredentialToken::new("Bearer".into(), "tok".into(), 3599, None);
        assert!(token.should_refresh(u64::MAX));
    }

    #[test]
    fn test_authorization_header_uses_token_type() {
        let token = ClientCredentialToken::new("Bearer".into(), "ey.abc.def".into(), 3599, None);
        assert_eq!(token.authorization_header(), "Bearer ey.abc.def");
    }
}
