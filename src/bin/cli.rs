//! restock CLI
//!
//! Single-pass entry point meant to be invoked by a scheduler (cron, systemd
//! timer). Exits non-zero only on configuration errors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use restock::{
    config::{load_all, load_config},
    error::Result,
    models::{Config, KeywordDefaults, Product},
    pipeline::{self, MonitorOptions},
    services::{Fetcher, LogNotifier, Notifier, TelegramNotifier},
    storage::{LocalStateStore, StateStore},
};

/// restock - product availability monitor
#[derive(Parser, Debug)]
#[command(
    name = "restock",
    version,
    about = "Notifies when watched products come back in stock"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Override the state file location from config
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check all products once and notify on new availability (default)
    Run {
        /// Log notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch one URL and print the availability verdict
    Check {
        url: String,

        /// Available keyword (repeatable; defaults apply when omitted)
        #[arg(long = "available")]
        available: Vec<String>,

        /// Soldout keyword (repeatable; defaults apply when omitted)
        #[arg(long = "soldout")]
        soldout: Vec<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show persisted availability state
    Status,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => run(&cli.config, cli.state, dry_run).await,
        Command::Check {
            url,
            available,
            soldout,
        } => check(&cli.config, url, available, soldout).await,
        Command::Validate => pipeline::run_validate(&cli.config).map(|_| ()),
        Command::Status => status(&cli.config, cli.state).await,
    }
}

async fn run(config_path: &Path, state: Option<PathBuf>, dry_run: bool) -> Result<()> {
    log::info!("restock starting...");

    // Credentials are checked even for dry runs so a broken setup fails early.
    let (config, credentials) = load_all(config_path)?;
    log::info!("Loaded configuration from {}", config_path.display());

    let fetcher = Fetcher::from_config(&config.fetch)?;
    let state_path = state.unwrap_or_else(|| config.monitor.state_file.clone().into());
    let store = LocalStateStore::new(state_path);
    let notifier: Box<dyn Notifier> = if dry_run {
        Box::new(LogNotifier)
    } else {
        Box::new(TelegramNotifier::new(&config.telegram, &credentials)?)
    };

    // Dry runs read the real state but never write it, so the next real run
    // still sees the rising edge.
    let options = MonitorOptions {
        persist_state: !dry_run,
        ..MonitorOptions::from(&config)
    };

    let summary = pipeline::run_monitor(
        &config.products(),
        &fetcher,
        &store,
        notifier.as_ref(),
        &options,
    )
    .await;

    if !summary.state_saved() {
        log::warn!("State was not saved to {}", store.location());
    }
    log::info!("Done!");
    Ok(())
}

/// Config used by `check`: the file when present, built-in defaults otherwise.
fn check_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        log::info!("Using settings from {}", config_path.display());
        Config::load(config_path)
    } else {
        log::info!(
            "{} not found; using built-in settings",
            config_path.display()
        );
        Ok(Config::default())
    }
}

/// Ad-hoc product for `check`. Empty keyword lists fall back to `defaults`.
fn check_product(
    url: String,
    available: Vec<String>,
    soldout: Vec<String>,
    defaults: &KeywordDefaults,
) -> Product {
    let pick = |given: Vec<String>, fallback: &[String]| -> Vec<String> {
        let words = if given.is_empty() {
            fallback.to_vec()
        } else {
            given
        };
        words.into_iter().map(|w| w.to_lowercase()).collect()
    };
    Product {
        name: url.clone(),
        url,
        available_keywords: pick(available, &defaults.available_keywords),
        soldout_keywords: pick(soldout, &defaults.soldout_keywords),
        category_tag: None,
    }
}

async fn check(
    config_path: &Path,
    url: String,
    available: Vec<String>,
    soldout: Vec<String>,
) -> Result<()> {
    let config = check_config(config_path)?;
    let product = check_product(url, available, soldout, &config.defaults);

    let fetcher = Fetcher::from_config(&config.fetch)?;
    let timeout = Duration::from_secs(config.fetch.timeout_secs);
    let report = pipeline::run_check(&product, &fetcher, timeout).await?;

    println!("status:    {}", report.page.status_code);
    println!("available: {}", report.available);
    println!("matched available keywords: {:?}", report.matched_available);
    println!("matched soldout keywords:   {:?}", report.matched_soldout);
    Ok(())
}

async fn status(config_path: &Path, state: Option<PathBuf>) -> Result<()> {
    let path = match state {
        Some(path) => path,
        None => load_config(config_path)?.monitor.state_file.into(),
    };
    let store = LocalStateStore::new(path);
    let state = store.load().await;

    if state.is_empty() {
        log::info!("No state recorded at {}", store.location());
        return Ok(());
    }

    for (url, record) in &state {
        let stamp = if record.available {
            record.last_seen_available_at
        } else {
            record.last_seen_unavailable_at
        };
        let when = stamp
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<11} {:<24} {}",
            if record.available { "AVAILABLE" } else { "unavailable" },
            when,
            url
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_is_default_command() {
        let cli = Cli::parse_from(["restock", "-c", "x.toml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn parses_check_keywords() {
        let cli = Cli::parse_from([
            "restock",
            "check",
            "https://shop.example/p",
            "--available",
            "Comprar",
            "--available",
            "En stock",
            "--soldout",
            "Agotado",
        ]);
        match cli.command {
            Some(Command::Check {
                available, soldout, ..
            }) => {
                assert_eq!(available, vec!["Comprar", "En stock"]);
                assert_eq!(soldout, vec!["Agotado"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_uses_config_file_settings() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[fetch]
timeout_secs = 7

[defaults]
available_keywords = ["Reservar"]
soldout_keywords = ["Sin cupo"]

[[products]]
name = "Consola"
url = "https://shop.example/consola"
"#,
        )
        .unwrap();

        let config = check_config(&path).unwrap();
        assert_eq!(config.fetch.timeout_secs, 7);

        let product = check_product("https://x.example".into(), vec![], vec![], &config.defaults);
        assert_eq!(product.available_keywords, vec!["reservar"]);
        assert_eq!(product.soldout_keywords, vec!["sin cupo"]);
    }

    #[test]
    fn check_falls_back_to_builtin_settings() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = check_config(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(config.fetch.timeout_secs, 40);

        let product = check_product(
            "https://x.example".into(),
            vec!["Comprar".into()],
            vec![],
            &config.defaults,
        );
        assert_eq!(product.available_keywords, vec!["comprar"]);
        assert_eq!(product.soldout_keywords, KeywordDefaults::default().soldout_keywords);
    }
}
