//! `paygate` CLI: boot the server, run migrations, and drive the
//! handful of administrative operations exposed over HTTP (scheduler
//! trigger, rule reload/list) from the command line instead.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use paygate_core::{Config, Result};

#[derive(Parser)]
#[command(name = "paygate")]
#[command(about = "Payment orchestration platform: server, migrations, and admin operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to `PAYGATE_CONFIG`, then the
    /// built-in search paths in `Config::from_env`).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `RUST_LOG` for this invocation.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base URL of a running `paygate-api` instance, used by the
    /// `scheduler` and `rules` admin subcommands.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations then start the HTTP server.
    Serve,

    /// Run database migrations and exit.
    Migrate,

    /// Scheduler admin operations.
    Scheduler {
        #[command(subcommand)]
        command: SchedulerCommands,
    },

    /// Rule engine admin operations.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
}

#[derive(Subcommand)]
enum SchedulerCommands {
    /// Run one billing + retry tick out of band.
    Trigger,
}

#[derive(Subcommand)]
enum RulesCommands {
    /// Hot-reload the routing rule set from its config file.
    Reload,
    /// List the routing rules currently in effect.
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = run(cli).await;
    if let Err(e) = result {
        tracing::error!(error = %e, "paygate exited with an error");
        std::process::exit(1);
    }
}

fn init_logging(log_level: Option<&str>) {
    let filter = log_level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            info!("starting paygate server");
            paygate_api::run(config).await
        }
        Commands::Migrate => migrate(&config).await,
        Commands::Scheduler { command } => scheduler_command(&cli.api_url, command).await,
        Commands::Rules { command } => rules_command(&cli.api_url, command).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path.to_string_lossy()),
        None => Config::from_env(),
    }
}

async fn migrate(config: &Config) -> Result<()> {
    let pool = paygate_core::repository::create_pool(&config.database.url, config.database.max_connections).await?;
    paygate_core::db::Migrator::new(&pool).run().await?;
    info!("migrations applied");
    Ok(())
}

async fn scheduler_command(api_url: &str, command: SchedulerCommands) -> Result<()> {
    match command {
        SchedulerCommands::Trigger => {
            let client = reqwest::Client::new();
            let response = client
                .post(format!("{}/scheduler/trigger", api_url))
                .send()
                .await
                .map_err(|e| paygate_core::Error::network(format!("scheduler trigger request failed: {}", e)))?;
            print_response(response).await
        }
    }
}

async fn rules_command(api_url: &str, command: RulesCommands) -> Result<()> {
    let client = reqwest::Client::new();
    match command {
        RulesCommands::Reload => {
            let response = client
                .post(format!("{}/bpas/reload", api_url))
                .send()
                .await
                .map_err(|e| paygate_core::Error::network(format!("rule reload request failed: {}", e)))?;
            print_response(response).await
        }
        RulesCommands::List => {
            let response = client
                .get(format!("{}/bpas/rules", api_url))
                .send()
                .await
                .map_err(|e| paygate_core::Error::network(format!("rule list request failed: {}", e)))?;
            print_response(response).await
        }
    }
}

async fn print_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| paygate_core::Error::network(format!("failed to read response body: {}", e)))?;

    if !status.is_success() {
        return Err(paygate_core::Error::network(format!("request failed ({}): {}", status, body)));
    }

    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap_or(body)),
        Err(_) => println!("{}", body),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve() {
        let cli = Cli::parse_from(["paygate", "serve"]);
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn parses_migrate() {
        let cli = Cli::parse_from(["paygate", "migrate"]);
        assert!(matches!(cli.command, Commands::Migrate));
    }

    #[test]
    fn parses_scheduler_trigger() {
        let cli = Cli::parse_from(["paygate", "scheduler", "trigger"]);
        assert!(matches!(cli.command, Commands::Scheduler { command: SchedulerCommands::Trigger }));
    }

    #[test]
    fn parses_rules_reload() {
        let cli = Cli::parse_from(["paygate", "rules", "reload"]);
        assert!(matches!(cli.command, Commands::Rules { command: RulesCommands::Reload }));
    }

    #[test]
    fn parses_global_flags() {
        let cli = Cli::parse_from(["paygate", "--api-url", "http://example.com", "--log-level", "debug", "serve"]);
        assert_eq!(cli.api_url, "http://example.com");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
