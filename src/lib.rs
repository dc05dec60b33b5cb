//! This is the library of the label-sync bot.
//!
//! The bot keeps the labels of GitHub repositories in sync with a set of labels derived from
//! external metadata: a static set of base labels shared by every repository, and one label per
//! API (product) that the repository belongs to.
pub mod config;
pub mod github;
pub mod metadata;
pub mod sync;
pub mod utils;

pub use config::{load_config, BotConfig, CONFIG_FILE_PATH};
pub use github::api::create_github_client;
pub use github::server::{create_app, create_sync_process, ServerState};
pub use github::{GithubAppClient, GithubRepoName, WebhookSecret};
pub use metadata::MetadataClient;
pub use sync::{reconcile_repository, SyncContext};
