pub mod health;
pub mod message_handler;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use msgpush_auth::{auth_middleware, AuthState};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::usecase::{SendEmailMessageUseCase, SendSmsMessageUseCase, SendWechatMessageUseCase};

/// リクエストボディの上限（1 MiB）。
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub send_sms_uc: Arc<SendSmsMessageUseCase>,
    pub send_email_uc: Arc<SendEmailMessageUseCase>,
    pub send_wechat_uc: Arc<SendWechatMessageUseCase>,
    pub auth_state: AuthState,
}

/// Build the REST API router.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz));

    let api_routes = Router::new()
        .route(
            "/api/v1/services/sms/messages",
            post(message_handler::push_sms_message),
        )
        .route(
            "/api/v1/services/email/messages",
            post(message_handler::push_email_message),
        )
        .route(
            "/api/v1/services/wechat/messages",
            post(message_handler::push_wechat_message),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.auth_state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
