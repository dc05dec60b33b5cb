use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::mpsc;
use tower::limit::ConcurrencyLimitLayer;
use tracing::Instrument;

use crate::github::webhook::{GitHubWebhook, WebhookSecret};
use crate::github::GithubRepoName;
use crate::sync::event::SyncEvent;
use crate::sync::{handle_sync_event, RepositoryClient, SyncContext};
use crate::utils::logging::LogError;

/// Shared server state for all axum handlers.
pub struct ServerState {
    sync_queue: mpsc::Sender<SyncEvent>,
    webhook_secret: WebhookSecret,
    metadata_repo: GithubRepoName,
}

impl ServerState {
    pub fn new(
        sync_queue: mpsc::Sender<SyncEvent>,
        webhook_secret: WebhookSecret,
        metadata_repo: GithubRepoName,
    ) -> Self {
        Self {
            sync_queue,
            webhook_secret,
            metadata_repo,
        }
    }

    pub fn get_webhook_secret(&self) -> &WebhookSecret {
        &self.webhook_secret
    }

    /// Pushes to the default branch of this repository trigger a resync of all repositories.
    pub fn get_metadata_repo(&self) -> &GithubRepoName {
        &self.metadata_repo
    }
}

pub type ServerStateRef = Arc<ServerState>;

pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .route("/github", post(github_webhook_handler))
        .route("/health", get(health_handler))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "")
}

/// Axum handler that receives a webhook and sends it to the sync queue.
pub async fn github_webhook_handler(
    State(state): State<ServerStateRef>,
    GitHubWebhook(event): GitHubWebhook,
) -> impl IntoResponse {
    match state.sync_queue.send(event).await {
        Ok(_) => (StatusCode::OK, ""),
        Err(err) => {
            tracing::error!("Could not send webhook event: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

/// Creates a future with a sync process that continuously receives webhook events and reacts to
/// them, one at a time.
pub fn create_sync_process<Client: RepositoryClient + 'static>(
    ctx: SyncContext<Client>,
) -> (mpsc::Sender<SyncEvent>, impl Future<Output = ()>) {
    let (tx, mut rx) = mpsc::channel::<SyncEvent>(1024);

    let service = async move {
        let ctx = Arc::new(ctx);
        while let Some(event) = rx.recv().await {
            let span = tracing::info_span!("SyncEvent");
            tracing::debug!("Received sync event: {event:?}");
            if let Err(error) = handle_sync_event(event, Arc::clone(&ctx))
                .instrument(span.clone())
                .await
            {
                span.log_error(error);
            }
        }
    };
    (tx, service)
}
