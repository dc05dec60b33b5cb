use anyhow::Context;

use crate::github::{GithubRepoName, Label, LabelError};
use crate::sync::{RepositoryClient, SyncContext};

/// A single modification of the labels of a repository.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LabelChange {
    Create(Label),
    /// Set color and description of the label called `current_name`.
    Update { current_name: String, label: Label },
    Delete(String),
}

/// Number of label operations performed during a reconciliation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Computes the changes needed to turn `current` labels into `desired` labels.
///
/// Labels are matched by name, ignoring case. A matched label is updated only when its
/// color or description differs, and its name is kept as is. Labels listed in `deleted`
/// are removed whether or not they are desired.
pub fn plan_label_changes(
    desired: &[Label],
    current: &[Label],
    deleted: &[String],
) -> Vec<LabelChange> {
    let mut changes = Vec::new();
    for label in desired {
        if deleted.contains(&label.name) {
            tracing::warn!(
                "Desired label `{}` is on the deleted label list, it will be recreated and deleted on alternating runs",
                label.name
            );
        }
        match current.iter().find(|c| c.has_name(&label.name)) {
            Some(existing) => {
                if existing.color != label.color || existing.description != label.description {
                    changes.push(LabelChange::Update {
                        current_name: existing.name.clone(),
                        label: label.clone(),
                    });
                }
            }
            None => changes.push(LabelChange::Create(label.clone())),
        }
    }
    changes.extend(
        current
            .iter()
            .filter(|label| deleted.contains(&label.name))
            .map(|label| LabelChange::Delete(label.name.clone())),
    );
    changes
}

/// Applies `changes` one by one. A failed change is logged and does not stop the
/// remaining changes.
pub async fn apply_label_changes<Client: RepositoryClient>(
    client: &Client,
    changes: Vec<LabelChange>,
) -> ReconcileReport {
    let repo = client.repository();
    let mut report = ReconcileReport::default();
    for change in changes {
        match change {
            LabelChange::Create(label) => {
                tracing::info!("Creating label `{}` in {repo}", label.name);
                match client.create_label(&label).await {
                    Ok(()) => report.created += 1,
                    Err(LabelError::AlreadyExists) => {
                        tracing::debug!(
                            "Label `{}` was created concurrently in {repo}",
                            label.name
                        );
                    }
                    Err(error) => {
                        tracing::error!("Cannot create label `{}` in {repo}: {error:?}", label.name);
                        report.failed += 1;
                    }
                }
            }
            LabelChange::Update {
                current_name,
                label,
            } => {
                tracing::info!(
                    "Updating label `{current_name}` in {repo} (color={}, description={:?})",
                    label.color,
                    label.description
                );
                match client.update_label(&current_name, &label).await {
                    Ok(()) => report.updated += 1,
                    Err(error) => {
                        tracing::error!("Cannot update label `{current_name}` in {repo}: {error:?}");
                        report.failed += 1;
                    }
                }
            }
            LabelChange::Delete(name) => {
                tracing::info!("Deleting label `{name}` from {repo}");
                match client.delete_label(&name).await {
                    Ok(()) => report.deleted += 1,
                    Err(error) => {
                        tracing::error!("Cannot delete label `{name}` from {repo}: {error:?}");
                        report.failed += 1;
                    }
                }
            }
        }
    }
    report
}

/// Brings the labels of `repo` in line with its desired label set.
///
/// Fails only if the desired or current labels cannot be loaded; individual label
/// operations are best effort.
pub async fn reconcile_repository<Client: RepositoryClient>(
    ctx: &SyncContext<Client>,
    repo: &GithubRepoName,
) -> anyhow::Result<ReconcileReport> {
    let desired = ctx
        .labels
        .build(repo, ctx.metadata.as_ref())
        .await
        .with_context(|| format!("Cannot build desired labels of {repo}"))?;
    let client = ctx.loader.load_repository(repo).await?;
    let current = client.get_labels().await?;

    let changes = plan_label_changes(&desired, &current, &ctx.config.deleted_labels);
    tracing::debug!(
        "Reconciling {repo}: {} desired, {} current, {} change(s)",
        desired.len(),
        current.len(),
        changes.len()
    );
    let report = apply_label_changes(&client, changes).await;
    if report.is_noop() {
        tracing::info!("Labels of {repo} are up to date");
    } else {
        tracing::info!("Reconciled labels of {repo}: {report:?}");
    }
    Ok(report)
}
