use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// テンプレートの 1 項目。`value` は文字列または数値。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TemplateField {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/// テンプレートメッセージから開く小程序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Miniprogram {
    pub appid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagepath: Option<String>,
}

/// 公众号テンプレートメッセージ。全受信者で共有し、送信タスクごとにコピーして使う。
#[derive(Debug, Clone, PartialEq)]
pub struct WechatTemplate {
    pub template_id: String,
    pub data: BTreeMap<String, TemplateField>,
    pub miniprogram: Option<Miniprogram>,
}

/// `message/template/send` の JSON ボディ。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMessagePayload {
    pub touser: String,
    pub template_id: String,
    pub data: BTreeMap<String, TemplateField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniprogram: Option<Miniprogram>,
}

impl WechatTemplate {
    pub fn new(template_id: impl Into<String>, data: BTreeMap<String, TemplateField>) -> Self {
        Self {
            template_id: template_id.into(),
            data,
            miniprogram: None,
        }
    }

    #[must_use]
    pub fn with_miniprogram(mut self, miniprogram: Miniprogram) -> Self {
        self.miniprogram = Some(miniprogram);
        self
    }

    /// color 未指定の項目に `default_color` を設定したコピーを返す。
    /// 元のテンプレートは変更しない。
    #[must_use]
    pub fn with_default_colors(&self, default_color: &str) -> Self {
        let mut copy = self.clone();
        for field in copy.data.values_mut() {
            if field.color.is_none() {
                field.color = Some(default_color.to_string());
            }
        }
        copy
    }

    /// 指定 openid 宛ての送信ペイロードに変換する。
    pub fn to_payload(self, openid: &str) -> TemplateMessagePayload {
        TemplateMessagePayload {
            touser: openid.to_string(),
            template_id: self.template_id,
            data: self.data,
            miniprogram: self.miniprogram,
        }
    }
}
