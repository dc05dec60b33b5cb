use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::github::{GithubRepoName, Label};
use crate::metadata::{ApiDescriptor, MetadataSource, RetrievalError};

/// Builds the set of labels that should exist in a repository.
///
/// The base labels are cached for the lifetime of the process. The cache is
/// populated on first use and replaced as a whole by [`LabelSetBuilder::refresh`],
/// so concurrent readers may observe a stale snapshot for one cycle, but never a
/// partially updated one.
#[derive(Default)]
pub struct LabelSetBuilder {
    base_labels: ArcSwapOption<Vec<Label>>,
}

impl LabelSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached base labels, loading them if the cache is empty.
    pub async fn base_labels(
        &self,
        source: &dyn MetadataSource,
    ) -> Result<Arc<Vec<Label>>, RetrievalError> {
        match self.base_labels.load_full() {
            Some(labels) => Ok(labels),
            None => self.refresh(source).await,
        }
    }

    /// Reloads the base labels and replaces the cached value.
    pub async fn refresh(
        &self,
        source: &dyn MetadataSource,
    ) -> Result<Arc<Vec<Label>>, RetrievalError> {
        let labels = Arc::new(source.load_base_labels().await?);
        tracing::info!("Loaded {} base label(s)", labels.len());
        self.base_labels.store(Some(Arc::clone(&labels)));
        Ok(labels)
    }

    pub fn invalidate(&self) {
        self.base_labels.store(None);
    }

    /// Returns the desired labels of `repo`: the base labels followed by the labels of the
    /// APIs that belong to the repository.
    pub async fn build(
        &self,
        repo: &GithubRepoName,
        source: &dyn MetadataSource,
    ) -> Result<Vec<Label>, RetrievalError> {
        let mut labels: Vec<Label> = self.base_labels(source).await?.as_ref().clone();

        let apis = resolve_apis(repo, source).await?;
        tracing::debug!("Repository {repo} has {} API label(s)", apis.len());
        for api in &apis {
            let label = api_label(api);
            if labels.iter().any(|existing| existing.has_name(&label.name)) {
                tracing::debug!("Skipping duplicate label {}", label.name);
                continue;
            }
            labels.push(label);
        }
        Ok(labels)
    }
}

/// Finds the APIs whose labels should exist in `repo`.
///
/// A repository mapped to a label in the public repository registry belongs to a single
/// API. Any other repository receives the labels of all known APIs.
async fn resolve_apis(
    repo: &GithubRepoName,
    source: &dyn MetadataSource,
) -> Result<Vec<ApiDescriptor>, RetrievalError> {
    let registry = source.load_repo_registry().await?;
    let github_label = registry
        .into_iter()
        .filter(|entry| entry.repo.to_lowercase() == repo.to_string())
        .find_map(|entry| entry.github_label.filter(|label| !label.is_empty()));

    match github_label {
        Some(label) => Ok(vec![ApiDescriptor {
            display_name: label.clone(),
            api_shortname: label.trim_start_matches("api: ").to_string(),
            github_label: label,
        }]),
        None => source.load_api_catalog().await,
    }
}

pub fn api_label(api: &ApiDescriptor) -> Label {
    Label::new(
        &api.github_label,
        &format!("Issues related to the {} API.", api.display_name),
        &label_color(&api.api_shortname),
    )
}

/// Derives a label color from the first six hex digits of the MD5 digest of `api_shortname`.
pub fn label_color(api_shortname: &str) -> String {
    let digest = format!("{:x}", md5::compute(api_shortname.as_bytes()));
    digest[..6].to_string()
}
