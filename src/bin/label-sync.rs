use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use label_sync::{
    create_app, create_github_client, create_sync_process, load_config, reconcile_repository,
    GithubAppClient, GithubRepoName, MetadataClient, ServerState, SyncContext, WebhookSecret,
    CONFIG_FILE_PATH,
};

#[derive(clap::Parser)]
struct Opts {
    /// Github App ID.
    #[arg(long, env = "APP_ID")]
    app_id: u64,

    /// Private key used to authenticate as a Github App.
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_URL", default_value = "https://api.github.com")]
    github_url: String,

    /// Token used to download metadata from object storage.
    #[arg(long, env = "STORAGE_TOKEN")]
    storage_token: Option<String>,

    /// Path to the bot configuration file.
    #[arg(long, env = "LABEL_SYNC_CONFIG", default_value = CONFIG_FILE_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Receive GitHub webhooks and synchronize labels of repositories as they change.
    Serve {
        /// Secret used to authenticate webhooks.
        #[arg(long, env = "WEBHOOK_SECRET")]
        webhook_secret: String,

        /// Port on which the webhook server listens.
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Synchronize the labels of a single repository and exit.
    Reconcile {
        /// Repository in the `<owner>/<name>` format.
        repository: GithubRepoName,
    },
}

async fn server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let config = load_config(&opts.config)?;
    let client = runtime.block_on(async {
        create_github_client(
            opts.app_id.into(),
            opts.github_url,
            opts.private_key.into_bytes().into(),
        )
    })?;
    let app = GithubAppClient::new(client);
    let metadata = MetadataClient::new(
        app.clone(),
        config.clone(),
        opts.storage_token.map(|token| token.into()),
    );
    let metadata_repo = config.metadata_repo.clone();
    let ctx = SyncContext::new(Box::new(app), Box::new(metadata), config);

    match opts.command {
        Command::Serve {
            webhook_secret,
            port,
        } => {
            let (tx, sync_process) = create_sync_process(ctx);
            let state = ServerState::new(tx, WebhookSecret::new(webhook_secret), metadata_repo);
            let server_process = server(state, port);

            runtime.block_on(async move {
                tokio::select! {
                    () = sync_process => {
                        tracing::warn!("Sync process has ended");
                        Ok(())
                    },
                    res = server_process => {
                        tracing::warn!("Server has ended: {res:?}");
                        res
                    }
                }
            })?;
        }
        Command::Reconcile { repository } => {
            let report = runtime.block_on(reconcile_repository(&ctx, &repository))?;
            if report.failed > 0 {
                return Err(anyhow::anyhow!(
                    "{} label operation(s) failed in {repository}",
                    report.failed
                ));
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
