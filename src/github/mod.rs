//! Contains definitions of common types (repository name, label) needed
//! for working with (GitHub) repositories.
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

pub mod api;
pub mod server;
mod webhook;

pub use api::operations::LabelError;
pub use api::GithubAppClient;
pub use webhook::WebhookSecret;

/// Unique identifier of a GitHub repository
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct GithubRepoName {
    owner: String,
    name: String,
}

impl GithubRepoName {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_lowercase(),
            name: name.to_lowercase(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for GithubRepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}/{}", self.owner, self.name))
    }
}

impl FromStr for GithubRepoName {
    type Err = anyhow::Error;

    /// Parses a repository in the `<owner>/<name>` format.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(anyhow::anyhow!(
                "Repository `{value}` is not in the <owner>/<name> format"
            )),
        }
    }
}

/// A label of a GitHub repository.
///
/// Colors are stored as six lowercase hex digits without the leading `#`,
/// which is the format returned by the GitHub API. A missing description is
/// represented by an empty string.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: String,
    #[serde(deserialize_with = "deserialize_color")]
    pub color: String,
}

impl Label {
    pub fn new(name: &str, description: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            color: normalize_color(color),
        }
    }

    /// Labels are matched by name, ignoring case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

fn normalize_color(color: &str) -> String {
    color.trim_start_matches('#').to_lowercase()
}

fn deserialize_description<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let description: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(description.unwrap_or_default())
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let color: String = serde::Deserialize::deserialize(deserializer)?;
    let color = normalize_color(&color);
    if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(serde::de::Error::custom(format!(
            "`{color}` is not a six digit hex color"
        )));
    }
    Ok(color)
}
