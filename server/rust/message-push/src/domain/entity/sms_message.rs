use serde::Serialize;
use serde_json::{Map, Value};

/// SMS ゲートウェイに登録済みのテンプレートで送る 1 回分の送信内容。
#[derive(Debug, Clone, PartialEq)]
pub struct SmsMessage {
    /// ゲートウェイ側で審査済みのテンプレート名。
    pub template_name: String,
    /// 送信先電話番号。
    pub to_users: Vec<String>,
    /// テンプレート変数。
    pub template_params: Map<String, Value>,
}

/// ゲートウェイへ送る JSON ボディ。
#[derive(Debug, Serialize)]
pub struct SmsRequestBody<'a> {
    pub extend: &'static str,
    #[serde(rename = "messageBody")]
    pub message_body: SmsMessageBody<'a>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct SmsMessageBody<'a> {
    #[serde(rename = "templateParam")]
    pub template_param: &'a Map<String, Value>,
    #[serde(rename = "templateName")]
    pub template_name: &'a str,
}

impl SmsMessage {
    pub fn request_body(&self) -> SmsRequestBody<'_> {
        SmsRequestBody {
            extend: "10",
            message_body: SmsMessageBody {
                template_param: &self.template_params,
                template_name: &self.template_name,
            },
            phone_number: &self.to_users,
        }
    }
}
