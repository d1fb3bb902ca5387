//! `judi` entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags
//!   3. Load config, apply flag overrides
//!   4. Init logger once
//!   5. Open storage (file, or memory for `--offline`)
//!   6. Spawn Ctrl-C → shutdown watcher
//!   7. Run the console until quit

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use judi_chat::app::App;
use judi_chat::error::AppError;
use judi_chat::storage::{FileStorage, MemoryStorage, Storage};
use judi_chat::{config, console, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;
    if let Some(url) = args.backend_url {
        config.backend.base_url = url.trim_end_matches('/').to_string();
    }
    if args.offline {
        config.backend.provider = "offline".to_string();
    }

    let effective_log_level = args.log_level.unwrap_or(config.client.log_level.as_str());
    let log_target = logger::target(
        config.client.log_file.as_deref(),
        &config.client.work_dir,
        std::io::stdout().is_terminal(),
    );
    logger::init(effective_log_level, args.log_level.is_some(), &log_target)?;

    info!(
        work_dir = %config.client.work_dir.display(),
        provider = %config.backend.provider,
        base_url = %config.backend.base_url,
        effective_log_level,
        log_target = %log_target,
        "config loaded"
    );

    let storage: Arc<dyn Storage> = if args.offline {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(FileStorage::new(config.storage_path()))
    };
    let app = App::new(&config, storage)?;

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    console::run(app, shutdown).await
}

struct CliArgs {
    config_path: Option<PathBuf>,
    backend_url: Option<String>,
    offline: bool,
    log_level: Option<&'static str>,
}

fn parse_cli_args() -> CliArgs {
    let mut config_path = None;
    let mut backend_url = None;
    let mut offline = false;
    let mut verbosity = 0u8;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: judi [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help              Print help");
                println!("  -f, --config <PATH>     Configuration file (default: config/default.toml)");
                println!("  -b, --backend <URL>     Classification service base URL");
                println!("      --offline           No network, consultations not saved (dry run)");
                println!("  -v, -vv, -vvv, -vvvv    Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("error: --config requires a path argument");
                    std::process::exit(1);
                }
            },
            "-b" | "--backend" => match iter.next() {
                Some(url) => backend_url = Some(url),
                None => {
                    eprintln!("error: --backend requires a URL argument");
                    std::process::exit(1);
                }
            },
            "--offline" => offline = true,
            "--verbose" => verbosity = verbosity.saturating_add(1),
            other => match verbosity_flag(other) {
                Some(n) => verbosity = verbosity.saturating_add(n),
                None => eprintln!("warning: ignoring unknown argument '{other}'"),
            },
        }
    }

    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { config_path, backend_url, offline, log_level }
}

/// `-v` → 1, `-vvv` → 3. Saturates instead of wrapping on absurd input.
fn verbosity_flag(arg: &str) -> Option<u8> {
    let vs = arg.strip_prefix('-')?;
    if vs.is_empty() || !vs.chars().all(|c| c == 'v') {
        return None;
    }
    Some(u8::try_from(vs.len()).unwrap_or(u8::MAX))
}
