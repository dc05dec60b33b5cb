use axum::async_trait;

use crate::config::BotConfig;
use crate::github::{GithubRepoName, Label, LabelError};
use crate::metadata::MetadataSource;

pub mod event;
mod handlers;
mod labels;
mod reconcile;

pub use handlers::handle_sync_event;
pub use labels::{api_label, label_color, LabelSetBuilder};
pub use reconcile::{
    apply_label_changes, plan_label_changes, reconcile_repository, LabelChange, ReconcileReport,
};

/// Provides functionality for working with the labels of a remote repository.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    fn repository(&self) -> &GithubRepoName;

    /// Return the labels that currently exist in the repository.
    async fn get_labels(&self) -> anyhow::Result<Vec<Label>>;

    /// Create a new label.
    async fn create_label(&self, label: &Label) -> Result<(), LabelError>;

    /// Set the color and description of the label called `current_name`.
    async fn update_label(&self, current_name: &str, label: &Label) -> Result<(), LabelError>;

    /// Delete the label called `name`.
    async fn delete_label(&self, name: &str) -> Result<(), LabelError>;
}

/// Creates clients for repositories on which the bot is installed.
#[async_trait]
pub trait RepositoryLoader<Client: RepositoryClient>: Send + Sync {
    async fn load_repository(&self, repo: &GithubRepoName) -> anyhow::Result<Client>;
}

/// Everything needed to handle a single sync event.
pub struct SyncContext<Client: RepositoryClient> {
    pub loader: Box<dyn RepositoryLoader<Client>>,
    pub metadata: Box<dyn MetadataSource>,
    /// Process-wide cache of the base labels.
    pub labels: LabelSetBuilder,
    pub config: BotConfig,
}

impl<Client: RepositoryClient> SyncContext<Client> {
    pub fn new(
        loader: Box<dyn RepositoryLoader<Client>>,
        metadata: Box<dyn MetadataSource>,
        config: BotConfig,
    ) -> Self {
        Self {
            loader,
            metadata,
            labels: LabelSetBuilder::new(),
            config,
        }
    }
}
