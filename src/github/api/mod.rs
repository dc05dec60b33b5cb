use anyhow::Context;
use axum::async_trait;
use octocrab::models::{AppId, InstallationId};
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretVec};

use client::GithubRepositoryClient;

use crate::github::GithubRepoName;
use crate::sync::RepositoryLoader;

pub mod client;
pub(crate) mod operations;

#[derive(serde::Deserialize)]
struct RepositoryInstallation {
    id: u64,
}

/// Creates a client authenticated as the GitHub App with the given ID.
pub fn create_github_client(
    app_id: AppId,
    github_url: String,
    private_key: SecretVec<u8>,
) -> anyhow::Result<Octocrab> {
    let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key.expose_secret().as_ref())
        .context("Could not encode private key")?;

    Octocrab::builder()
        .base_uri(github_url)
        .context("Invalid GitHub base URL")?
        .app(app_id, key)
        .build()
        .context("Could not create octocrab builder")
}

/// Provides access to repositories on which the app is installed.
#[derive(Clone)]
pub struct GithubAppClient {
    client: Octocrab,
}

impl GithubAppClient {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Returns a client authenticated as the app installation that covers `repo`.
    pub async fn installation_client(&self, repo: &GithubRepoName) -> octocrab::Result<Octocrab> {
        // https://docs.github.com/en/rest/apps/apps?apiVersion=2022-11-28#get-a-repository-installation-for-the-authenticated-app
        let installation: RepositoryInstallation = self
            .client
            .get(
                format!("/repos/{}/{}/installation", repo.owner(), repo.name()),
                None::<&()>,
            )
            .await?;
        tracing::debug!(
            "Resolved installation {} for repository {repo}",
            installation.id
        );
        Ok(self
            .client
            .installation(InstallationId::from(installation.id)))
    }

    /// Loads the content of a file stored on the default branch of `repo`.
    ///
    /// Returns `None` if GitHub does not inline the content, which happens for directories
    /// and for files larger than 1 MB.
    pub async fn load_file(
        &self,
        repo: &GithubRepoName,
        path: &str,
    ) -> octocrab::Result<Option<String>> {
        let client = self.installation_client(repo).await?;
        let mut content = client
            .repos(repo.owner(), repo.name())
            .get_content()
            .path(path)
            .send()
            .await?;
        Ok(content
            .take_items()
            .into_iter()
            .next()
            .and_then(|item| match item.encoding.as_deref() {
                Some("none") => None,
                _ => item.decoded_content(),
            }))
    }
}

#[async_trait]
impl RepositoryLoader<GithubRepositoryClient> for GithubAppClient {
    async fn load_repository(
        &self,
        repo: &GithubRepoName,
    ) -> anyhow::Result<GithubRepositoryClient> {
        let client = self
            .installation_client(repo)
            .await
            .with_context(|| format!("The app is not installed on {repo}"))?;
        Ok(GithubRepositoryClient {
            client,
            repo_name: repo.clone(),
        })
    }
}
