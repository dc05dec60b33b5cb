use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::github::server::ServerStateRef;
use crate::github::GithubRepoName;
use crate::sync::event::{RepositoryChanged, SyncEvent, SyncTrigger};

/// Maximum accepted size of a webhook body.
const MAX_BODY_SIZE: usize = 25 * 1024 * 1024;

#[derive(serde::Deserialize, Debug)]
struct WebhookUser {
    login: String,
}

/// Repository as it appears in webhook payloads.
/// Only the fields that are shared by all event kinds are parsed.
#[derive(serde::Deserialize, Debug)]
struct WebhookRepository {
    name: String,
    owner: WebhookUser,
    #[serde(default)]
    default_branch: Option<String>,
}

impl WebhookRepository {
    fn repo_name(&self) -> GithubRepoName {
        GithubRepoName::new(&self.owner.login, &self.name)
    }
}

#[derive(serde::Deserialize, Debug)]
struct WebhookRepositoryEvent<'a> {
    action: &'a str,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookLabelEvent<'a> {
    action: &'a str,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPushEvent {
    #[serde(rename = "ref")]
    git_ref: String,
    repository: WebhookRepository,
}

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub SyncEvent);

/// Extracts a webhook event from a HTTP request.
#[async_trait]
impl FromRequest<ServerStateRef> for GitHubWebhook {
    type Rejection = StatusCode;

    async fn from_request(
        request: Request,
        state: &ServerStateRef,
    ) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_BODY_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Verify that the request is valid
        if !verify_gh_signature(&parts.headers, &body, state.get_webhook_secret()) {
            tracing::error!("Webhook request failed, could not authenticate webhook");
            return Err(StatusCode::BAD_REQUEST);
        }

        // Parse webhook content
        match parse_webhook_event(parts, &body, state.get_metadata_repo()) {
            Ok(Some(event)) => {
                tracing::trace!("Parsed webhook event {event:?}");
                Ok(GitHubWebhook(event))
            }
            Ok(None) => Err(StatusCode::OK),
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error:?}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

fn parse_webhook_event(
    request: Parts,
    body: &[u8],
    metadata_repo: &GithubRepoName,
) -> anyhow::Result<Option<SyncEvent>> {
    let Some(event_type) = request.headers.get("x-github-event") else {
        return Err(anyhow::anyhow!("x-github-event header not found"));
    };

    match event_type.as_bytes() {
        b"repository" => {
            let payload: WebhookRepositoryEvent = serde_json::from_slice(body)?;
            let trigger = match payload.action {
                "created" => SyncTrigger::RepositoryCreated,
                "transferred" => SyncTrigger::RepositoryTransferred,
                _ => return Ok(None),
            };
            Ok(Some(SyncEvent::RepositoryChanged(RepositoryChanged {
                repository: payload.repository.repo_name(),
                trigger,
            })))
        }
        b"label" => {
            let payload: WebhookLabelEvent = serde_json::from_slice(body)?;
            let trigger = match payload.action {
                "edited" => SyncTrigger::LabelEdited,
                "deleted" => SyncTrigger::LabelDeleted,
                _ => return Ok(None),
            };
            Ok(Some(SyncEvent::RepositoryChanged(RepositoryChanged {
                repository: payload.repository.repo_name(),
                trigger,
            })))
        }
        b"push" => {
            let payload: WebhookPushEvent = serde_json::from_slice(body)?;
            let repository = payload.repository.repo_name();
            if &repository != metadata_repo {
                return Ok(None);
            }
            let Some(default_branch) = payload.repository.default_branch else {
                return Err(anyhow::anyhow!(
                    "Push event of {repository} is missing the default branch"
                ));
            };
            if payload.git_ref != format!("refs/heads/{default_branch}") {
                tracing::debug!("Ignoring push to {} of {repository}", payload.git_ref);
                return Ok(None);
            }
            Ok(Some(SyncEvent::MetadataChanged))
        }
        _ => {
            tracing::debug!("Ignoring unknown event type {:?}", event_type.to_str());
            Ok(None)
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies that the request is properly signed by GitHub with SHA-256 and the passed `secret`.
fn verify_gh_signature(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
    secret: &WebhookSecret,
) -> bool {
    let Some(signature) = headers.get("x-hub-signature-256").map(|v| v.as_bytes()) else {
        return false;
    };
    let Some(signature) = signature
        .get(b"sha256=".len()..)
        .and_then(|v| hex::decode(v).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Wrapper for a secret which is zeroed on drop and can be exposed only through the [`WebhookSecret::expose`] method.
pub struct WebhookSecret(SecretString);

impl WebhookSecret {
    pub fn new(secret: String) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}
