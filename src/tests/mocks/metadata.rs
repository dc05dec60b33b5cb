use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::async_trait;

use crate::github::{GithubRepoName, Label};
use crate::metadata::{ApiDescriptor, MetadataSource, RepoRegistryEntry, RetrievalError};

pub fn base_label(name: &str) -> Label {
    Label::new(name, &format!("Base label {name}"), "ededed")
}

/// Descriptor of an API whose label is `api: <shortname>`.
pub fn api(shortname: &str) -> ApiDescriptor {
    ApiDescriptor {
        display_name: format!("Cloud {shortname}"),
        github_label: format!("api: {shortname}"),
        api_shortname: shortname.to_string(),
    }
}

pub fn registry_entry(repo: &str, github_label: &str) -> RepoRegistryEntry {
    RepoRegistryEntry {
        repo: repo.to_string(),
        github_label: Some(github_label.to_string()),
    }
}

/// In-memory metadata. Clones share their state, so a test can keep a handle to
/// metadata that was moved into a context.
#[derive(Clone, Default)]
pub struct FakeMetadata {
    base_labels: Arc<Mutex<Vec<Label>>>,
    registry: Vec<RepoRegistryEntry>,
    catalog: Vec<ApiDescriptor>,
    tracked: Vec<GithubRepoName>,
    fail_base_labels: bool,
    fail_catalog: bool,
    fail_tracked: bool,
    pub base_label_loads: Arc<AtomicUsize>,
    pub catalog_loads: Arc<AtomicUsize>,
}

impl FakeMetadata {
    pub fn base_labels(self, labels: Vec<Label>) -> Self {
        self.set_base_labels(labels);
        self
    }

    pub fn registry(self, registry: Vec<RepoRegistryEntry>) -> Self {
        Self { registry, ..self }
    }

    pub fn catalog(self, catalog: Vec<ApiDescriptor>) -> Self {
        Self { catalog, ..self }
    }

    pub fn tracked(self, tracked: Vec<GithubRepoName>) -> Self {
        Self { tracked, ..self }
    }

    pub fn fail_base_labels(self) -> Self {
        Self {
            fail_base_labels: true,
            ..self
        }
    }

    pub fn fail_catalog(self) -> Self {
        Self {
            fail_catalog: true,
            ..self
        }
    }

    pub fn fail_tracked(self) -> Self {
        Self {
            fail_tracked: true,
            ..self
        }
    }

    /// Change the base labels, e.g. to simulate a push to the metadata repository.
    pub fn set_base_labels(&self, labels: Vec<Label>) {
        *self.base_labels.lock().unwrap() = labels;
    }
}

fn failure(document: &'static str) -> RetrievalError {
    RetrievalError::Malformed {
        document,
        source: serde_json::from_str::<()>("").unwrap_err(),
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn load_base_labels(&self) -> Result<Vec<Label>, RetrievalError> {
        self.base_label_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_base_labels {
            return Err(failure("base labels"));
        }
        Ok(self.base_labels.lock().unwrap().clone())
    }

    async fn load_repo_registry(&self) -> Result<Vec<RepoRegistryEntry>, RetrievalError> {
        Ok(self.registry.clone())
    }

    async fn load_api_catalog(&self) -> Result<Vec<ApiDescriptor>, RetrievalError> {
        self.catalog_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalog {
            return Err(failure("API catalog"));
        }
        Ok(self.catalog.clone())
    }

    async fn load_tracked_repositories(&self) -> Result<Vec<GithubRepoName>, RetrievalError> {
        if self.fail_tracked {
            return Err(failure("tracked repositories"));
        }
        Ok(self.tracked.clone())
    }
}
