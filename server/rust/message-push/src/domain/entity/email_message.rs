/// 描画済みの HTML メール。
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub to_users: Vec<String>,
    pub cc_users: Vec<String>,
    pub html_body: String,
}
