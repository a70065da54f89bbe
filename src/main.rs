//! PPLX - command-line client for the Perplexity Sonar API
//!
#![doc = "PPLX - command-line client for the Perplexity Sonar API"]
#![doc = "Main entry point for the pplx application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pplx::cli::{Action, Cli};
use pplx::commands;
use pplx::config::Config;
use pplx::display;
use pplx::error::is_not_found;
use pplx::storage::SessionStore;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        display::print_error(&e);
        if is_not_found(&e) {
            eprintln!("Run 'pplx session list' to see available sessions");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let action = cli.action()?;

    // Load and validate configuration
    let config = Config::load(&cli)?;
    config.validate()?;

    match action {
        Action::Interactive => commands::chat::run_chat(config).await,
        Action::Run(query) => commands::run::run_query(config, query).await,
        Action::List(limit) => {
            let limit = commands::session::effective_limit(limit, config.session.list_limit);
            commands::session::list_sessions(&read_store(&config), limit)
        }
        Action::Show(id) => commands::session::show_session(&read_store(&config), &id),
        Action::Search(query) => commands::session::search_sessions(&read_store(&config), &query),
        Action::Continue(id) => commands::session::continue_session(&config, &id).await,
        Action::Delete(id) => {
            commands::session::delete_session(&read_store(&config), &id)?;
            Ok(())
        }
    }
}

/// Store for commands that only read or delete; never creates the directory
fn read_store(config: &Config) -> SessionStore {
    SessionStore::new(config.session.directory.clone())
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` or a set `DEBUG` variable enables
/// debug output. Logs go to stderr so they never mix with responses.
fn init_tracing(verbose: bool) {
    let default_level = if verbose || std::env::var_os("DEBUG").is_some() {
        "pplx=debug"
    } else {
        "pplx=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
