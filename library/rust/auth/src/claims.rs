//! アプリケーショントークンの Claims 構造体。

use serde::Deserialize;

/// Claims はクライアントクレデンシャルフローで発行されたアプリケーショントークンの Claims。
///
/// 検証はアプリケーション単位で行うため、ユーザー固有の Claim は持たない。
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// トークン発行者
    #[serde(default)]
    pub iss: Option<String>,

    /// トークンの対象オーディエンス
    #[serde(default)]
    pub aud: Audience,

    /// トークンの有効期限（Unix タイムスタンプ）
    pub exp: u64,

    /// トークンの発行時刻（Unix タイムスタンプ）
    #[serde(default)]
    pub iat: Option<u64>,

    /// サブジェクト（サービスプリンシパルのオブジェクト ID）
    #[serde(default)]
    pub sub: Option<String>,

    /// 呼び出し元アプリケーションのクライアント ID
    #[serde(default)]
    pub appid: Option<String>,

    /// Authorized party
    #[serde(default)]
    pub azp: Option<String>,
}

/// Audience は JWT の aud Claim を表す。
/// 文字列または文字列配列のどちらも受け付ける。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Audience(pub Vec<String>);

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct AudienceVisitor;

        impl<'de> de::Visitor<'de> for AudienceVisitor {
            type Value = Audience;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Audience(vec![v.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(v) = seq.next_element::<String>()? {
                    values.push(v);
                }
                Ok(Audience(values))
            }
        }

        deserializer.deserialize_any(AudienceVisitor)
    }
}

impl Claims {
    /// 最初のオーディエンスを返す。
    pub fn audience(&self) -> Option<&str> {
        self.aud.0.first().map(String::as_str)
    }

    /// 呼び出し元アプリケーションを識別する ID を返す（appid → azp の順に参照する）。
    pub fn caller_id(&self) -> Option<&str> {
        self.appid.as_deref().or(self.azp.as_deref())
    }
}

impl std::fmt::Display for Claims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Claims{{iss={:?}, aud={:?}, caller={:?}, exp={}}}",
            self.iss,
            self.audience(),
            self.caller_id(),
            self.exp,
        )
    }
}
