use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::domain::entity::WechatTemplate;
use crate::domain::service::{DeliveryError, IdentityResolver, TemplateMessageClient};

/// 1 回のファンアウトの集計。ログとテストでのみ参照する。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    /// 送信タスクを起動した受信者数。
    pub dispatched: usize,
    pub delivered: usize,
    pub failed: usize,
    /// openid を解決できずスキップした内部ユーザー ID。
    pub skipped: Vec<String>,
}

/// 受信者ごとに 1 タスクを起動し、全タスクの完了を待つ送信器。
///
/// 同時実行数に上限はない。受信者数がそのまま並列度になる。
pub struct FanOutSender {
    resolver: Arc<dyn IdentityResolver>,
    client: Arc<dyn TemplateMessageClient>,
    default_color: String,
}

impl FanOutSender {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        client: Arc<dyn TemplateMessageClient>,
        default_color: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            client,
            default_color: default_color.into(),
        }
    }

    pub async fn send(
        &self,
        to_users: &[String],
        template: WechatTemplate,
        access_token: &str,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();
        let template = Arc::new(template);
        let access_token: Arc<str> = Arc::from(access_token);
        let mut tasks = JoinSet::new();

        for user_id in to_users {
            let openid = match self.resolver.resolve(user_id).await {
                Ok(openid) => openid,
                Err(DeliveryError::IdentityResolutionMiss(_)) => {
                    warn!(user = %user_id, "could not find the user's openid");
                    report.skipped.push(user_id.clone());
                    continue;
                }
                Err(e) => {
                    error!(user = %user_id, error = %e, "identity lookup failed");
                    report.skipped.push(user_id.clone());
                    continue;
                }
            };

            let client = self.client.clone();
            let template = template.clone();
            let access_token = access_token.clone();
            let default_color = self.default_color.clone();
            tasks.spawn(async move {
                let payload = template
                    .with_default_colors(&default_color)
                    .to_payload(&openid);
                let result = client.send(&access_token, &payload).await;
                (openid, result)
            });
            report.dispatched += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.delivered += 1,
                Ok((openid, Err(e))) => {
                    error!(openid = %openid, error = %e, "failed to deliver template message");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "template message task aborted");
                    report.failed += 1;
                }
            }
        }

        info!(
            dispatched = report.dispatched,
            delivered = report.delivered,
            failed = report.failed,
            skipped = report.skipped.len(),
            "wechat fan-out finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::TemplateField;
    use crate::domain::service::{MockIdentityResolver, MockTemplateMessageClient};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn template() -> WechatTemplate {
        let mut data = BTreeMap::new();
        data.insert("keyword1".to_string(), TemplateField::new("Company"));
        data.insert(
            "keyword4".to_string(),
            TemplateField::new("alarm").with_color("#ff0000"),
        );
        WechatTemplate::new("tmpl-1", data)
    }

    fn users(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    fn resolver_u1_u3() -> MockIdentityResolver {
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve().returning(|user| match user {
            "u1" => Ok("oA1".to_string()),
            "u3" => Ok("oA3".to_string()),
            other => Err(DeliveryError::IdentityResolutionMiss(other.to_string())),
        });
        resolver
    }

    #[tokio::test]
    async fn test_unresolved_recipient_is_skipped() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sent_clone = sent.clone();

        let mut client = MockTemplateMessageClient::new();
        client
            .expect_send()
            .withf(|token, _| token == "wx-token")
            .times(2)
            .returning(move |_, payload| {
                sent_clone.lock().unwrap().push(payload.touser.clone());
                Ok(())
            });

        let sender = FanOutSender::new(Arc::new(resolver_u1_u3()), Arc::new(client), "#0c74da");
        let report = sender
            .send(&users(&["u1", "u2", "u3"]), template(), "wx-token")
            .await;

        let mut sent = sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["oA1".to_string(), "oA3".to_string()]);
        assert_eq!(report.dispatched, 2);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_each_task_gets_default_colors() {
        let mut client = MockTemplateMessageClient::new();
        client
            .expect_send()
            .withf(|_, payload| {
                payload.data["keyword1"].color.as_deref() == Some("#0c74da")
                    && payload.data["keyword4"].color.as_deref() == Some("#ff0000")
            })
            .times(2)
            .returning(|_, _| Ok(()));

        let sender = FanOutSender::new(Arc::new(resolver_u1_u3()), Arc::new(client), "#0c74da");
        let report = sender.send(&users(&["u1", "u3"]), template(), "wx-token").await;
        assert_eq!(report.delivered, 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_others() {
        let mut client = MockTemplateMessageClient::new();
        client.expect_send().times(2).returning(|_, payload| {
            if payload.touser == "oA1" {
                Err(DeliveryError::Rejected("errcode 43004".to_string()))
            } else {
                Ok(())
            }
        });

        let sender = FanOutSender::new(Arc::new(resolver_u1_u3()), Arc::new(client), "#0c74da");
        let report = sender.send(&users(&["u1", "u3"]), template(), "wx-token").await;

        assert_eq!(report.dispatched, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_lookup_error_skips_recipient() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(DeliveryError::ConnectionFailed("redis down".to_string())));
        let mut client = MockTemplateMessageClient::new();
        client.expect_send().never();

        let sender = FanOutSender::new(Arc::new(resolver), Arc::new(client), "#0c74da");
        let report = sender.send(&users(&["u1", "u2"]), template(), "wx-token").await;

        assert_eq!(report.dispatched, 0);
        assert_eq!(report.skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_recipient_list() {
        let resolver = MockIdentityResolver::new();
        let client = MockTemplateMessageClient::new();

        let sender = FanOutSender::new(Arc::new(resolver), Arc::new(client), "#0c74da");
        let report = sender.send(&[], template(), "wx-token").await;
        assert_eq!(report, FanOutReport::default());
    }
}
