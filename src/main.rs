//! Committee node: registry entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Start the node connection service
//!   6. Build the committee registry and spawn its worker (bootstrap)
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Wait for shutdown, then grant committee dismissal a grace period

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use committee_registry::bootup::JsonBootupStore;
use committee_registry::committee::LocalCommitteeFactory;
use committee_registry::nodeconn::NodeConnService;
use committee_registry::{Collaborators, CommitteeRegistry, config, error, logger};

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();
    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some(), config.log_file.as_deref())?;

    info!(
        node_name = %config.node_name,
        work_dir = %config.work_dir.display(),
        own_node = %config.own_node,
        bootup_file = %config.registry.bootup_file.display(),
        disabled = config.registry.disabled_addresses.len(),
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    // Shared shutdown token. Ctrl-C cancels it and every task watches it.
    let shutdown = CancellationToken::new();

    let (nodeconn, binding) = NodeConnService::new();
    let nodeconn_task = tokio::spawn(nodeconn.run(shutdown.clone()));

    let registry = Arc::new(CommitteeRegistry::new(Collaborators {
        source: Arc::new(JsonBootupStore::new(&config.registry.bootup_file)),
        filter: Arc::new(config.registry.disabled_addresses.clone()),
        factory: Arc::new(LocalCommitteeFactory::new(&config.own_node)),
        network: Arc::new(binding.clone()),
    }));

    let worker = registry.clone().spawn_worker(shutdown.clone());

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    tokio::select! {
        _ = registry.wait_initial_load() => {
            info!(
                committees = registry.len(),
                subscribed = binding.subscribed().len(),
                "node ready"
            );
        }
        _ = shutdown.cancelled() => {}
    }

    // The worker resolves once shutdown is signalled, handing back the
    // dismissal task.
    match worker.await {
        Ok(dismissal) => {
            if tokio::time::timeout(config.shutdown_grace, dismissal).await.is_err() {
                warn!(
                    grace = ?config.shutdown_grace,
                    "committee dismissal still running at end of grace period"
                );
            }
        }
        Err(e) => warn!("registry worker panicked: {e}"),
    }

    nodeconn_task.await.ok();
    info!("bye");
    Ok(())
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: committee-node [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    CliArgs {
        log_level: logger::level_for_verbosity(verbosity),
        config_path,
    }
}
