use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use intake::config::load_or_default;
use intake::db::stats_repo;
use intake::email::{DeviceFlowAuth, EmailError, GMAIL_READONLY_SCOPE};
use intake::secrets::resolve_ref;
use intake::{logging, Config, Database, IntakeError, LogFormat};
use intake_web::{router, AppState};
use secrecy::ExposeSecret;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "intake", author, version, about)]
struct Cli {
    /// Config file (defaults to ~/.contact-intake/config.json when present)
    #[arg(long, global = true, env = "INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, global = true, env = "INTAKE_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web dashboard (default)
    Serve {
        /// Overrides `bind_address` from the config file
        #[arg(long)]
        bind: Option<String>,

        /// Start background polling immediately
        #[arg(long)]
        poll: bool,
    },
    /// Import once and exit
    Import {
        /// Scan the whole mailbox instead of the polling window
        #[arg(long)]
        all: bool,
    },
    /// Print contact counts
    Stats,
    /// Obtain a Gmail refresh token via the device flow
    Authorize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), IntakeError> {
    let config = load_or_default(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        bind: None,
        poll: false,
    }) {
        Command::Serve { bind, poll } => serve(&config, bind, poll).await,
        Command::Import { all } => import(&config, all).await,
        Command::Stats => print_stats(&config),
        Command::Authorize => authorize(&config).await,
    }
}

async fn serve(config: &Config, bind: Option<String>, poll: bool) -> Result<(), IntakeError> {
    let state = AppState::from_config(config)?;
    if poll {
        state.poller.start();
    }

    let poller = state.poller.clone();
    let address = bind.unwrap_or_else(|| config.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Contact intake v{} listening on http://{}", env!("CARGO_PKG_VERSION"), address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            poller.shutdown().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}

async fn import(config: &Config, all: bool) -> Result<(), IntakeError> {
    let state = AppState::from_config(config)?;
    let importer = state.poller.importer();

    let summary = if all {
        importer.import_all().await?
    } else {
        importer.import_recent().await?
    };

    println!(
        "Imported {} new contacts ({} found)",
        summary.processed, summary.total_found
    );
    print_stats_for(&state.db)
}

fn print_stats(config: &Config) -> Result<(), IntakeError> {
    let db = Database::open(&config.database_path)?;
    print_stats_for(&db)
}

fn print_stats_for(db: &Database) -> Result<(), IntakeError> {
    let stats = stats_repo::stats(db)?;
    println!("Total contacts:     {}", stats.total_contacts);
    println!("Added today:        {}", stats.today_contacts);
    println!("Added this week:    {}", stats.week_contacts);
    Ok(())
}

async fn authorize(config: &Config) -> Result<(), IntakeError> {
    let client_id = resolve_ref(&config.gmail.client_id).map_err(EmailError::from)?;
    let client_secret = resolve_ref(&config.gmail.client_secret).map_err(EmailError::from)?;

    let auth = DeviceFlowAuth::gmail()?;
    let device_code = auth
        .request_device_code(client_id.expose_secret(), &[GMAIL_READONLY_SCOPE])
        .await?;

    println!(
        "Open {} and enter the code {}",
        device_code.verification_uri, device_code.user_code
    );

    let token = auth
        .poll_for_token(&device_code, client_id.expose_secret(), &client_secret)
        .await?;

    match token.refresh_token {
        Some(refresh_token) => {
            println!("Authorized. Store this refresh token as GMAIL_REFRESH_TOKEN or in the");
            println!("file referenced by gmail.refresh_token in the config:");
            println!();
            println!("{}", refresh_token);
            Ok(())
        }
        None => Err(EmailError::OAuth2Error(
            "Authorization succeeded but no refresh token was returned".to_string(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["intake"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_import_all_flag() {
        let cli = Cli::try_parse_from(["intake", "--log-format", "json", "import", "--all"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Some(Command::Import { all: true })));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["intake", "stats", "--config", "/tmp/intake.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/intake.json")));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["intake", "--log-format", "xml"]).is_err());
    }
}
