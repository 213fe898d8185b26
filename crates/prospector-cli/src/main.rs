mod commands;
mod summary;

use clap::{Parser, Subcommand, ValueEnum};
use prospector_core::{AppConfig, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "prospector")]
#[command(about = "Discover, score and contact businesses with outdated websites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Workflow {
    #[value(name = "website_prospector")]
    WebsiteProspector,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute a workflow once and print its summary
    Run {
        workflow: Workflow,
        /// Audience profile (defaults to DEFAULT_AUDIENCE)
        #[arg(long)]
        audience: Option<String>,
        /// Location substituted into search patterns (defaults to DEFAULT_LOCATION)
        #[arg(long)]
        location: Option<String>,
        /// Maximum prospects to collect (defaults to MAX_PROSPECTS)
        #[arg(long, value_parser = max_prospects_parser())]
        max: Option<usize>,
        /// Use deterministic stub collaborators instead of Browserless and OpenAI
        #[arg(long)]
        offline: bool,
    },
    /// Consume queued jobs until interrupted
    Worker {
        #[arg(long)]
        offline: bool,
    },
    /// Create a pending run and queue a job for the worker
    Enqueue {
        #[arg(long)]
        audience: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = max_prospects_parser())]
        max: Option<usize>,
    },
    /// List the configured audience profiles
    Audiences,
    /// List recent workflow runs
    Runs {
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

fn max_prospects_parser() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Needs neither configuration nor a database.
    if matches!(cli.command, Commands::Audiences) {
        return commands::list_audiences();
    }

    let config = prospector_core::load_app_config()?;
    init_tracing(&config)?;

    let pool_config = prospector_db::PoolConfig::from_app_config(&config);
    let pool = prospector_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Run {
            workflow: Workflow::WebsiteProspector,
            audience,
            location,
            max,
            offline,
        } => {
            let request = commands::run_request(&config, audience, location, max);
            commands::run_workflow(&config, &pool, &request, offline).await
        }
        Commands::Worker { offline } => {
            commands::run_worker(&config, &pool, offline, shutdown_signal()).await
        }
        Commands::Enqueue {
            audience,
            location,
            max,
        } => {
            let request = commands::run_request(&config, audience, location, max);
            commands::enqueue(&config, &pool, &request).await
        }
        Commands::Runs { limit } => commands::list_runs(&pool, limit).await,
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            prospector_db::ping(&pool).await?;
            println!("database ok");
            Ok(())
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = prospector_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Commands::Audiences => commands::list_audiences(),
    }
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests;
