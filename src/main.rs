use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use snippets_bot::application::errors::BotError;
use snippets_bot::application::services::Host;
use snippets_bot::domain::traits::GroupClient;
use snippets_bot::infrastructure::adapters::ConsoleAdapter;
use snippets_bot::infrastructure::config::Config;
use snippets_bot::modules::{self, LifecycleCoordinator};

#[derive(Parser)]
#[command(name = "snippets-bot")]
#[command(about = "A group chat bot host with pluggable modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Database DSN (overrides config)
    #[arg(long)]
    dsn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_bot(cli.config, cli.dsn),
        Commands::Version => {
            println!("snippets-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(),
    }
}

fn run_bot(config_path: String, dsn_override: Option<String>) -> ExitCode {
    let mut config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dsn) = dsn_override {
        config.database.dsn = dsn;
    }

    tracing::info!("Starting {}", config.bot.name);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(serve(config));
    // Console input sits in a blocking read that never returns on its own
    rt.shutdown_timeout(Duration::from_secs(1));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str) -> Result<Config, BotError> {
    if Path::new(path).exists() {
        Ok(Config::load(path)?)
    } else {
        tracing::warn!("Config file {} not found, using defaults", path);
        Ok(Config::load_env()?)
    }
}

async fn serve(config: Config) -> Result<(), BotError> {
    if !config.adapters.console.enabled {
        return Err(BotError::Network("no network client is enabled".to_string()));
    }

    let registry = modules::builtin_registry()?;
    let stop_timeout = config.lifecycle.stop_timeout();
    let client: Arc<dyn GroupClient> = Arc::new(ConsoleAdapter::new(&config.adapters.console));
    let host = Host::new(client, config);
    let lifecycle = LifecycleCoordinator::new(registry).with_stop_timeout(stop_timeout);

    if let Err(e) = lifecycle.startup(&host).await {
        tracing::error!("Startup aborted: {}", e);
        if let Err(e) = lifecycle.shutdown(&host).await {
            tracing::warn!("{}", e);
        }
        return Err(e.into());
    }

    let mut listener = host.listen();
    tokio::select! {
        _ = shutdown_signal() => tracing::info!("Shutdown signal received"),
        _ = listener.closed() => {
            // The console client ends at stdin EOF, e.g. when started with </dev/null
            tracing::warn!("Network client disconnected (console input closed?), shutting down");
        }
    }
    listener.abort();

    lifecycle.shutdown(&host).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

fn init_config() -> ExitCode {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to render default config: {}", e);
            ExitCode::FAILURE
        }
    }
}
