//! External documents describing which labels should exist in which repository.
use axum::async_trait;
use thiserror::Error;

use crate::github::{GithubRepoName, Label};

mod client;

pub use client::MetadataClient;

/// Failure to retrieve or decode one of the external metadata documents.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Cannot download {document} from {url}: {source}")]
    Http {
        document: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[error("Cannot load {document} from GitHub: {source}")]
    GitHub {
        document: &'static str,
        source: octocrab::Error,
    },
    /// GitHub returned no inline content, e.g. because the path is a directory or
    /// a file larger than 1 MB.
    #[error("Cannot load {document} from GitHub: `{path}` has no file content")]
    MissingContent {
        document: &'static str,
        path: String,
    },
    #[error("{document} has an unexpected shape: {source}")]
    Malformed {
        document: &'static str,
        source: serde_json::Error,
    },
}

/// Description of a single product (API) that has its own label.
#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ApiDescriptor {
    pub display_name: String,
    pub github_label: String,
    pub api_shortname: String,
}

/// Entry of the public repository registry.
///
/// A repository with a non-empty `github_label` belongs to a single product.
#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct RepoRegistryEntry {
    pub repo: String,
    #[serde(default)]
    pub github_label: Option<String>,
}

/// Base labels that every repository receives.
#[derive(serde::Deserialize, Debug)]
pub struct BaseLabelsDocument {
    pub labels: Vec<Label>,
}

#[derive(serde::Deserialize, Debug)]
pub struct RepoRegistryDocument {
    pub repos: Vec<RepoRegistryEntry>,
}

#[derive(serde::Deserialize, Debug)]
pub struct ApiCatalogDocument {
    pub apis: Vec<ApiDescriptor>,
}

#[derive(serde::Deserialize, Debug)]
pub struct TrackedRepository {
    pub repo: String,
}

/// Flat list of repositories that are resynchronized when the metadata changes.
#[derive(serde::Deserialize, Debug)]
pub struct TrackedRepositoriesDocument {
    pub repos: Vec<TrackedRepository>,
}

/// Provides access to the metadata documents.
/// It is behind a trait to allow easier mocking in tests.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Load the static base labels.
    async fn load_base_labels(&self) -> Result<Vec<Label>, RetrievalError>;

    /// Load the registry mapping repositories to products.
    async fn load_repo_registry(&self) -> Result<Vec<RepoRegistryEntry>, RetrievalError>;

    /// Load all known products.
    async fn load_api_catalog(&self) -> Result<Vec<ApiDescriptor>, RetrievalError>;

    /// Load the repositories that should be resynchronized after a metadata change.
    /// Entries that are not valid repository names are skipped.
    async fn load_tracked_repositories(&self) -> Result<Vec<GithubRepoName>, RetrievalError>;
}

pub(crate) fn parse_document<T: serde::de::DeserializeOwned>(
    document: &'static str,
    content: &[u8],
) -> Result<T, RetrievalError> {
    serde_json::from_slice(content).map_err(|source| RetrievalError::Malformed { document, source })
}

pub(crate) fn parse_tracked_repositories(
    document: TrackedRepositoriesDocument,
) -> Vec<GithubRepoName> {
    document
        .repos
        .into_iter()
        .filter_map(|entry| match entry.repo.parse::<GithubRepoName>() {
            Ok(name) => Some(name),
            Err(error) => {
                tracing::warn!("Skipping tracked repository: {error:?}");
                None
            }
        })
        .collect()
}
