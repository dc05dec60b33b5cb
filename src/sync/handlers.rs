use std::sync::Arc;

use anyhow::Context;
use tracing::Instrument;

use crate::sync::event::{RepositoryChanged, SyncEvent};
use crate::sync::{reconcile_repository, RepositoryClient, SyncContext};
use crate::utils::logging::LogError;

/// This function executes a single sync event
pub async fn handle_sync_event<Client: RepositoryClient>(
    event: SyncEvent,
    ctx: Arc<SyncContext<Client>>,
) -> anyhow::Result<()> {
    match event {
        SyncEvent::RepositoryChanged(RepositoryChanged {
            repository,
            trigger,
        }) => {
            let span = tracing::info_span!(
                "Repository changed",
                repo = repository.to_string(),
                trigger = ?trigger
            );
            reconcile_repository(&*ctx, &repository)
                .instrument(span)
                .await?;
        }
        SyncEvent::MetadataChanged => {
            let span = tracing::info_span!("Metadata changed");
            resync_tracked_repositories(&*ctx).instrument(span).await?;
        }
    }
    Ok(())
}

/// Reloads the base labels and reconciles every tracked repository, one at a time.
/// A repository that fails to reconcile does not stop the others.
async fn resync_tracked_repositories<Client: RepositoryClient>(
    ctx: &SyncContext<Client>,
) -> anyhow::Result<()> {
    ctx.labels.invalidate();
    ctx.labels
        .refresh(ctx.metadata.as_ref())
        .await
        .context("Cannot refresh base labels")?;

    let repos = ctx
        .metadata
        .load_tracked_repositories()
        .await
        .context("Cannot load tracked repositories")?;
    tracing::info!("Resynchronizing {} repositories", repos.len());

    let mut failed = 0;
    for repo in repos {
        let span = tracing::info_span!("Repo", repo = repo.to_string());
        if let Err(error) = reconcile_repository(ctx, &repo)
            .instrument(span.clone())
            .await
        {
            span.log_error(error);
            failed += 1;
        }
    }
    if failed > 0 {
        tracing::warn!("{failed} repositories could not be reconciled");
    }
    Ok(())
}
