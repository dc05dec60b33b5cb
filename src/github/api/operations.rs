use http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::github::api::client::GithubRepositoryClient;
use crate::github::{GithubRepoName, Label};

/// Maximum page size supported by the GitHub REST API.
pub const LABEL_PAGE_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum LabelError {
    /// The label was created by someone else in the meantime.
    #[error("Label already exists")]
    AlreadyExists,
    #[error("Label or repository not found")]
    NotFound,
    #[error("Unknown error ({status}): {text}")]
    Unknown { status: StatusCode, text: String },
    #[error("Network error: {0}")]
    NetworkError(#[from] octocrab::Error),
}

#[derive(serde::Serialize)]
struct CreateLabelRequest<'a> {
    name: &'a str,
    color: &'a str,
    description: &'a str,
}

#[derive(serde::Serialize)]
struct UpdateLabelRequest<'a> {
    color: &'a str,
    description: &'a str,
}

/// Body of a `422 Unprocessable Entity` response.
#[derive(serde::Deserialize)]
struct ValidationFailed {
    #[serde(default)]
    errors: Vec<ValidationErrorItem>,
}

#[derive(serde::Deserialize)]
struct ValidationErrorItem {
    code: Option<String>,
}

/// Creates a new label in the given repository.
///
/// Documentation: https://docs.github.com/en/rest/issues/labels?apiVersion=2022-11-28#create-a-label
pub async fn create_label(repo: &GithubRepositoryClient, label: &Label) -> Result<(), LabelError> {
    let client = repo.client();
    let request = CreateLabelRequest {
        name: &label.name,
        color: &label.color,
        description: &label.description,
    };
    let response = client
        ._post(labels_route(repo.name(), None), Some(&request))
        .await?;

    let status = response.status();
    let text = client.body_to_string(response).await.unwrap_or_default();
    tracing::trace!(
        "Response from creating label `{}` in `{}`: {status} ({text})",
        label.name,
        repo.name()
    );

    match status {
        StatusCode::CREATED => Ok(()),
        StatusCode::NOT_FOUND => Err(LabelError::NotFound),
        StatusCode::UNPROCESSABLE_ENTITY if is_already_exists(&text) => {
            Err(LabelError::AlreadyExists)
        }
        _ => Err(LabelError::Unknown { status, text }),
    }
}

/// Updates the color and description of the label called `current_name`.
/// The name of the label is left untouched.
///
/// Documentation: https://docs.github.com/en/rest/issues/labels?apiVersion=2022-11-28#update-a-label
pub async fn update_label(
    repo: &GithubRepositoryClient,
    current_name: &str,
    label: &Label,
) -> Result<(), LabelError> {
    let client = repo.client();
    let request = UpdateLabelRequest {
        color: &label.color,
        description: &label.description,
    };
    let response = client
        ._patch(labels_route(repo.name(), Some(current_name)), Some(&request))
        .await?;

    let status = response.status();
    let text = client.body_to_string(response).await.unwrap_or_default();
    tracing::trace!(
        "Response from updating label `{current_name}` in `{}`: {status} ({text})",
        repo.name()
    );

    match status {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(LabelError::NotFound),
        _ => Err(LabelError::Unknown { status, text }),
    }
}

/// Deletes the label called `name`.
///
/// Documentation: https://docs.github.com/en/rest/issues/labels?apiVersion=2022-11-28#delete-a-label
pub async fn delete_label(repo: &GithubRepositoryClient, name: &str) -> Result<(), LabelError> {
    let client = repo.client();
    let response = client
        ._delete(labels_route(repo.name(), Some(name)), None::<&()>)
        .await?;

    let status = response.status();
    match status {
        StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(LabelError::NotFound),
        _ => {
            let text = client.body_to_string(response).await.unwrap_or_default();
            Err(LabelError::Unknown { status, text })
        }
    }
}

fn is_already_exists(body: &str) -> bool {
    serde_json::from_str::<ValidationFailed>(body)
        .map(|response| {
            response
                .errors
                .iter()
                .any(|error| error.code.as_deref() == Some("already_exists"))
        })
        .unwrap_or(false)
}

/// Returns `/repos/{owner}/{repo}/labels[/{name}]`, with the label name
/// percent-encoded as a path segment.
pub(super) fn labels_route(repo: &GithubRepoName, name: Option<&str>) -> String {
    let mut url = Url::parse("http://localhost/").expect("Static URL is valid");
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["repos", repo.owner(), repo.name(), "labels"]);
        if let Some(name) = name {
            segments.push(name);
        }
    }
    url.path().to_string()
}
