use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::async_trait;

use crate::github::{GithubRepoName, Label, LabelError};
use crate::sync::{RepositoryClient, RepositoryLoader};

/// A label operation performed on a repository, identified by the label name it was
/// called with.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LabelOperation {
    Create(String),
    Update(String),
    Delete(String),
}

#[derive(Default)]
struct RepoState {
    labels: Vec<Label>,
    operations: Vec<LabelOperation>,
    /// One-shot failures of label creation, by label name.
    create_failures: HashMap<String, LabelError>,
    fail_labels: bool,
}

/// In-memory repositories that apply label operations to their label list.
#[derive(Clone, Default)]
pub struct FakeRepositories {
    repos: Arc<Mutex<HashMap<GithubRepoName, RepoState>>>,
}

impl FakeRepositories {
    pub fn client(&self, repo: &GithubRepoName) -> FakeRepositoryClient {
        FakeRepositoryClient {
            repo: repo.clone(),
            repos: self.clone(),
        }
    }

    pub fn set_labels(&self, repo: &GithubRepoName, labels: Vec<Label>) {
        self.with_repo(repo, |state| state.labels = labels);
    }

    /// Loading labels of `repo` will fail.
    pub fn fail_labels(&self, repo: &GithubRepoName) {
        self.with_repo(repo, |state| state.fail_labels = true);
    }

    pub fn operations(&self, repo: &GithubRepoName) -> Vec<LabelOperation> {
        self.with_repo(repo, |state| state.operations.clone())
    }

    pub fn clear_operations(&self, repo: &GithubRepoName) {
        self.with_repo(repo, |state| state.operations.clear());
    }

    fn with_repo<T>(&self, repo: &GithubRepoName, f: impl FnOnce(&mut RepoState) -> T) -> T {
        let mut repos = self.repos.lock().unwrap();
        f(repos.entry(repo.clone()).or_default())
    }
}

#[async_trait]
impl RepositoryLoader<FakeRepositoryClient> for FakeRepositories {
    async fn load_repository(&self, repo: &GithubRepoName) -> anyhow::Result<FakeRepositoryClient> {
        Ok(self.client(repo))
    }
}

pub struct FakeRepositoryClient {
    repo: GithubRepoName,
    repos: FakeRepositories,
}

impl FakeRepositoryClient {
    pub fn fail_create(&self, name: &str, error: LabelError) {
        self.repos.with_repo(&self.repo, |state| {
            state.create_failures.insert(name.to_string(), error);
        });
    }

    pub fn operations(&self) -> Vec<LabelOperation> {
        self.repos.operations(&self.repo)
    }
}

#[async_trait]
impl RepositoryClient for FakeRepositoryClient {
    fn repository(&self) -> &GithubRepoName {
        &self.repo
    }

    async fn get_labels(&self) -> anyhow::Result<Vec<Label>> {
        self.repos.with_repo(&self.repo, |state| {
            if state.fail_labels {
                Err(anyhow::anyhow!("Cannot load labels"))
            } else {
                Ok(state.labels.clone())
            }
        })
    }

    async fn create_label(&self, label: &Label) -> Result<(), LabelError> {
        self.repos.with_repo(&self.repo, |state| {
            state
                .operations
                .push(LabelOperation::Create(label.name.clone()));
            if let Some(error) = state.create_failures.remove(&label.name) {
                return Err(error);
            }
            state.labels.push(label.clone());
            Ok(())
        })
    }

    async fn update_label(&self, current_name: &str, label: &Label) -> Result<(), LabelError> {
        self.repos.with_repo(&self.repo, |state| {
            state
                .operations
                .push(LabelOperation::Update(current_name.to_string()));
            let existing = state
                .labels
                .iter_mut()
                .find(|existing| existing.name == current_name)
                .ok_or(LabelError::NotFound)?;
            existing.color = label.color.clone();
            existing.description = label.description.clone();
            Ok(())
        })
    }

    async fn delete_label(&self, name: &str) -> Result<(), LabelError> {
        self.repos.with_repo(&self.repo, |state| {
            state
                .operations
                .push(LabelOperation::Delete(name.to_string()));
            let count = state.labels.len();
            state.labels.retain(|label| label.name != name);
            if state.labels.len() == count {
                return Err(LabelError::NotFound);
            }
            Ok(())
        })
    }
}
