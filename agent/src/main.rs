//! dockhand - Entry Point
//!
//! Listens for registry pushes, asks for approval over Telegram and redeploys the
//! application container through the local Docker Engine.

use std::env;

use dockhand::app::options::AppOptions;
use dockhand::app::run::run;
use dockhand::app::settings::Settings;
use dockhand::logs::{init_logging, LogOptions};
use dockhand::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Print version and exit
    if env::args().skip(1).any(|arg| arg == "--version" || arg == "-V") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version: {e}"),
        }
        return;
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        json_format: settings.log_json,
    };
    let log_guard = match init_logging(log_options) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::from_settings(&settings);
    info!(
        "Running dockhand {} for '{}' (approver: {})",
        version_info().version,
        options.app_name,
        options.telegram.approver
    );

    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("dockhand stopped with an error: {e}");
        drop(log_guard);
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Ctrl+C received, shutting down...");
    }
}
