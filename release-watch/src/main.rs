use std::process;

use clap::Parser;
use github_releases::GithubClient;
use release_watch::config::{AppConfig, Args};
use release_watch::logging;
use release_watch::monitor::ReleaseMonitor;
use release_watch::notification::Dispatcher;
use release_watch::state::StateStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let _log_guard = match logging::init_logging(&args.logging_options()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let config = match AppConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let client = GithubClient::with_endpoint(config.token.clone(), config.github_endpoint.clone())?;
    let store = StateStore::new(config.releases_file.clone());

    // The monitor also waits for each release to be accepted before recording it.
    let (tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();

    let monitor = ReleaseMonitor::new(config.monitor.clone(), client, store, tx);
    let dispatcher = Dispatcher::from_configs(&config.channels, config.ignore_nonstable);

    info!(
        repositories = config.monitor.repositories.len(),
        channels = dispatcher.channel_count(),
        ignore_nonstable = config.ignore_nonstable,
        "release-watch starting"
    );

    let mut monitor_task = tokio::spawn(monitor.run(cancel.clone()));
    let dispatcher_task = tokio::spawn(dispatcher.run(rx, cancel.clone()));

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown requested");
            cancel.cancel();
            if let Err(e) = monitor_task.await {
                warn!(error = %e, "Release monitor task failed");
            }
        }
        result = &mut monitor_task => {
            if let Err(e) = result {
                warn!(error = %e, "Release monitor task failed");
            }
            cancel.cancel();
        }
    }

    if let Err(e) = dispatcher_task.await {
        warn!(error = %e, "Dispatcher task failed");
    }

    info!("release-watch stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
