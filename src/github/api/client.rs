use anyhow::Context;
use axum::async_trait;
use octocrab::Octocrab;

use crate::github::api::operations::{
    create_label, delete_label, labels_route, update_label, LabelError, LABEL_PAGE_SIZE,
};
use crate::github::{GithubRepoName, Label};
use crate::sync::RepositoryClient;

/// Provides access to a single app installation (repository) using the GitHub API.
pub struct GithubRepositoryClient {
    /// The client caches the access token for this given repository and refreshes it once it
    /// expires.
    pub client: Octocrab,
    pub repo_name: GithubRepoName,
}

impl GithubRepositoryClient {
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    pub fn name(&self) -> &GithubRepoName {
        &self.repo_name
    }
}

#[async_trait]
impl RepositoryClient for GithubRepositoryClient {
    fn repository(&self) -> &GithubRepoName {
        self.name()
    }

    /// Only the first page of labels is loaded.
    async fn get_labels(&self) -> anyhow::Result<Vec<Label>> {
        // https://docs.github.com/en/rest/issues/labels?apiVersion=2022-11-28#list-labels-for-a-repository
        let labels: Vec<Label> = self
            .client
            .get(
                labels_route(self.name(), None),
                Some(&[("per_page", LABEL_PAGE_SIZE)]),
            )
            .await
            .with_context(|| format!("Cannot load labels of {}", self.name()))?;
        if labels.len() >= LABEL_PAGE_SIZE {
            tracing::warn!(
                "Repository {} has at least {LABEL_PAGE_SIZE} labels, labels beyond the first page are ignored",
                self.name()
            );
        }
        Ok(labels)
    }

    async fn create_label(&self, label: &Label) -> Result<(), LabelError> {
        create_label(self, label).await
    }

    async fn update_label(&self, current_name: &str, label: &Label) -> Result<(), LabelError> {
        update_label(self, current_name, label).await
    }

    async fn delete_label(&self, name: &str) -> Result<(), LabelError> {
        delete_label(self, name).await
    }
}
