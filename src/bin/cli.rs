//! comicwatch CLI
//!
//! Runs the HTTP server, a single cron pass, or one-off checks.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use comicwatch::{
    error::{AppError, Result},
    models::{ComicSource, Config},
    pipeline,
    services::{HttpFetcher, Notifier, ProviderRegistry, TemplateService, TtlCache},
    storage,
    utils::http,
    web::{self, AppState},
};

/// comicwatch - Webcomic update watcher
#[derive(Parser, Debug)]
#[command(
    name = "comicwatch",
    version,
    about = "Watches webcomic sites and mails when a new strip appears"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen address (default: server.addr from config)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Run one cron pass and print its trace
    Cron,

    /// Print the latest strip of one source
    Check {
        /// Source name (xkcd, smbc, jl8)
        source: ComicSource,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Wire every service from `config`.
fn build_state(config: &Config) -> Result<AppState> {
    let client = http::create_async_client(&config.fetcher)?;
    let fetcher = Arc::new(HttpFetcher::with_client(client.clone()));
    let cache = Arc::new(TtlCache::new());
    let registry = ProviderRegistry::from_config(config, fetcher, cache);

    let templates = Arc::new(TemplateService::from_config(&config.templates)?);
    let mailer = Notifier::mailer_from_config(&config.mail, client);
    let notifier = Arc::new(Notifier::new(Arc::clone(&templates), mailer, &config.mail));

    Ok(AppState {
        registry,
        store: storage::open(&config.storage),
        notifier,
        templates,
        fetch_limit: config.storage.fetch_limit,
    })
}

/// Main entry point for the CLI application.
#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env_overrides();
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Serve { addr } => {
            config.validate()?;
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let state = build_state(&config)?;
            log::info!("Watching {} sources", state.registry.len());
            web::serve(&addr, state).await?;
        }

        Command::Cron => {
            config.validate()?;
            let state = build_state(&config)?;
            let report = pipeline::run_cron(
                &state.registry,
                Arc::clone(&state.store),
                &state.notifier,
                state.fetch_limit,
            )
            .await?;

            println!("{}", report.render());
            if report.has_write_failures() {
                return Err(AppError::storage(format!(
                    "{} record writes failed",
                    report.write_failures.len()
                )));
            }
        }

        Command::Check { source } => {
            let state = build_state(&config)?;
            let provider = state.registry.get(source).ok_or_else(|| {
                AppError::config(format!("Source {source} is disabled in the configuration"))
            })?;

            match provider.latest().await? {
                Some(identifier) => println!("{source}: {identifier}"),
                None => println!("{source}: not found"),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            TemplateService::from_config(&config.templates)?;
            log::info!(
                "Config OK ({} sources enabled)",
                config.sources.enabled().len()
            );
        }
    }

    Ok(())
}
