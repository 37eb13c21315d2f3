use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use repo_gallery::cache::ProjectCache;
use repo_gallery::config::Config;
use repo_gallery::fetch::Loader;
use repo_gallery::github::rest::GithubClient;
use repo_gallery::github::ProjectSource;
use repo_gallery::tui::{self, state::AppState, TuiCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file; stdout belongs to the TUI.
    let log_file = std::fs::File::create("repo-gallery.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("repo_gallery=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load(Path::new("config.toml"))?;
    let username = config.resolve_username(std::env::args().nth(1))?;
    info!(username = %username, "starting");

    let client = GithubClient::new(
        &username,
        &config.github.api_base,
        Duration::from_secs(config.github.request_timeout_s),
    );
    let cache = ProjectCache::new(config.cache.resolve_dir());
    debug!(dir = %cache.dir().display(), "cache directory");

    let (state_tx, state_rx) = watch::channel(AppState::new(&username, config.gallery.stagger_ms));
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TuiCommand>(16);

    let ttl = chrono::Duration::minutes(config.gallery.cache_ttl_mins as i64);
    let limit = config.gallery.repo_limit;
    let enrich = config.gallery.enrich;

    tokio::spawn(async move {
        let loader = Loader::new(&client, &cache, username, limit, ttl, enrich);
        run_load(&loader, &state_tx, false).await;

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                TuiCommand::Refresh { force } => {
                    state_tx.send_modify(|s| s.begin_sync());
                    run_load(&loader, &state_tx, force).await;
                }
                TuiCommand::FetchDoc { id } => {
                    fetch_doc(&client, &state_tx, id).await;
                }
                TuiCommand::Quit => break,
            }
        }
    });

    tui::run_tui(state_rx, cmd_tx).await?;
    info!("shut down");
    Ok(())
}

/// Runs one listing load and publishes the result, success or not.
async fn run_load(loader: &Loader<'_>, state_tx: &watch::Sender<AppState>, force: bool) {
    match loader.load(force).await {
        Ok(outcome) => {
            state_tx.send_modify(|s| s.apply_outcome(outcome));
        }
        Err(e) => {
            let message = format!("{:#}", e);
            error!(error = %message, "listing load failed");
            state_tx.send_modify(|s| s.apply_failure(message));
        }
    }
}

/// Fetches one README on demand for the preview modal and folds it
/// into the published state, where the TUI picks it up.
async fn fetch_doc(client: &GithubClient, state_tx: &watch::Sender<AppState>, id: u64) {
    let name = state_tx.borrow().project_by_id(id).map(|p| p.name.clone());
    let Some(name) = name else {
        return;
    };
    match client.fetch_readme(&name).await {
        Ok(Some(text)) => {
            state_tx.send_modify(|s| {
                if let Some(project) = s.projects.iter_mut().find(|p| p.id == id) {
                    project.readme = Some(text);
                }
            });
        }
        Ok(None) => debug!(repo = %name, "no readme to show"),
        Err(e) => warn!(repo = %name, error = %e, "readme fetch for preview failed"),
    }
}
