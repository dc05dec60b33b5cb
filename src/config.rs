use std::path::Path;

use anyhow::Context;
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::github::GithubRepoName;

pub const CONFIG_FILE_PATH: &str = "label-sync.toml";

/// Labels that are removed from every repository, even if they are desired.
pub const DEFAULT_DELETED_LABELS: [&str; 6] = [
    "bug",
    "enhancement",
    "kokoro:force-run",
    "kokoro: force-run",
    "kokoro: run",
    "question",
];

/// Configuration of the bot loaded from a `label-sync.toml` file.
/// Every field is optional.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Repository holding the base labels, whose default branch pushes
    /// trigger a resync of all tracked repositories.
    #[serde(
        default = "default_metadata_repo",
        deserialize_with = "deserialize_repo_name"
    )]
    pub metadata_repo: GithubRepoName,
    /// Path of the base labels file inside `metadata_repo`.
    #[serde(default = "default_base_labels_path")]
    pub base_labels_path: String,
    #[serde(default = "default_storage_url")]
    pub storage_url: Url,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_public_repos_object")]
    pub public_repos_object: String,
    #[serde(default = "default_apis_object")]
    pub apis_object: String,
    /// Registry of repositories that are resynchronized after a metadata change.
    #[serde(default = "default_repos_url")]
    pub repos_url: Url,
    #[serde(default = "default_deleted_labels")]
    pub deleted_labels: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            metadata_repo: default_metadata_repo(),
            base_labels_path: default_base_labels_path(),
            storage_url: default_storage_url(),
            bucket: default_bucket(),
            public_repos_object: default_public_repos_object(),
            apis_object: default_apis_object(),
            repos_url: default_repos_url(),
            deleted_labels: default_deleted_labels(),
        }
    }
}

/// Loads the configuration from `path`. A missing file results in the default configuration.
pub fn load_config(path: &Path) -> anyhow::Result<BotConfig> {
    if !path.is_file() {
        tracing::info!(
            "Configuration file {} not found, using defaults",
            path.display()
        );
        return Ok(BotConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Cannot parse configuration file {}", path.display()))
}

fn default_metadata_repo() -> GithubRepoName {
    GithubRepoName::new("googleapis", "sloth")
}

fn default_base_labels_path() -> String {
    "labels.json".to_string()
}

fn default_storage_url() -> Url {
    Url::parse("https://storage.googleapis.com").expect("Static URL is valid")
}

fn default_bucket() -> String {
    "devrel-prod-settings".to_string()
}

fn default_public_repos_object() -> String {
    "public_repos.json".to_string()
}

fn default_apis_object() -> String {
    "apis.json".to_string()
}

fn default_repos_url() -> Url {
    Url::parse("https://raw.githubusercontent.com/googleapis/sloth/main/repos.json")
        .expect("Static URL is valid")
}

fn default_deleted_labels() -> Vec<String> {
    DEFAULT_DELETED_LABELS
        .iter()
        .map(|label| label.to_string())
        .collect()
}

fn deserialize_repo_name<'de, D>(deserializer: D) -> Result<GithubRepoName, D::Error>
where
    D: Deserializer<'de>,
{
    let value: String = Deserialize::deserialize(deserializer)?;
    value.parse().map_err(|error| D::Error::custom(format!("{error}")))
}
