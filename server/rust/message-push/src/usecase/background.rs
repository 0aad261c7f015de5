use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::usecase::DispatchError;

/// 送信処理をバックグラウンドタスクとして起動する。
///
/// 呼び出し元へ結果を返す経路はなく、失敗はログにのみ残る。
pub fn spawn_background<F, T>(channel: &'static str, work: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, DispatchError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(async move {
        match work.await {
            Ok(_) => info!(channel, "background dispatch finished"),
            Err(e) => error!(channel, error = %e, "background dispatch failed"),
        }
    })
}
