//! Session management commands
//!
//! `pplx session list|show|search|continue|delete` and the root shortcuts
//! that map onto them. Ids are resolved by short id first, then full id.

use super::{complete_turn, save_or_warn};
use crate::citations::ParsedResponse;
use crate::config::Config;
use crate::context::ContextWindower;
use crate::display::{self, Spinner};
use crate::error::Result;
use crate::providers::{PerplexityProvider, Provider};
use crate::storage::{Conversation, SessionStore};
use colored::{Color, Colorize};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const NO_SESSIONS_HINT: &str =
    "No sessions found.\nStart a conversation with 'pplx' or run a query with 'pplx run \"<query>\"'";

/// Number of sessions to list for a `-l` value
///
/// No value falls back to `configured`; zero means no limit.
pub fn effective_limit(requested: Option<usize>, configured: usize) -> Option<usize> {
    match requested {
        None => Some(configured),
        Some(0) => None,
        Some(n) => Some(n),
    }
}

/// List the most recent sessions
///
/// # Arguments
///
/// * `store` - Session store
/// * `limit` - Number to show; `None` shows everything
pub fn list_sessions(store: &SessionStore, limit: Option<usize>) -> Result<()> {
    let mut sessions = store.list()?;
    let total = sessions.len();
    if let Some(n) = limit {
        sessions.truncate(n);
    }

    let heading = format!(
        "Recent sessions (showing {} of {} total):",
        sessions.len(),
        total
    );
    display::print_session_list(&heading, &sessions, NO_SESSIONS_HINT);
    Ok(())
}

/// Search sessions and list the matches
pub fn search_sessions(store: &SessionStore, query: &str) -> Result<()> {
    let results = store.search(query)?;
    let heading = format!(
        "Found {} session(s) matching '{}':",
        results.len(),
        query
    );
    display::print_session_list(&heading, &results, "No sessions found matching your query.");
    Ok(())
}

/// Print a full conversation
pub fn show_session(store: &SessionStore, id: &str) -> Result<()> {
    let conversation = store.resolve(id)?;
    display::print_conversation(&conversation);
    Ok(())
}

/// Delete a session by short id or full id
pub fn delete_session(store: &SessionStore, id: &str) -> Result<Conversation> {
    let conversation = store.resolve(id)?;
    store.delete(&conversation.id)?;
    tracing::info!("Deleted session {}", conversation.id);
    println!(
        "{}",
        format!(
            "Deleted session [{}] {}",
            conversation.short_id,
            display::truncate_query(&conversation.metadata.initial_query, display::QUERY_COLUMN_WIDTH)
        )
        .green()
    );
    Ok(conversation)
}

/// Run one more turn of a stored conversation and save it
///
/// Uses the model the conversation was started with. A failed save is
/// reported as a warning and does not fail the turn.
///
/// # Returns
///
/// The updated conversation and the parsed response
pub async fn continue_with_input(
    provider: &dyn Provider,
    config: &Config,
    store: &SessionStore,
    id: &str,
    input: &str,
) -> Result<(Conversation, ParsedResponse)> {
    let mut conversation = store.resolve(id)?;
    let windower = ContextWindower::from_config(config);

    let parsed = complete_turn(provider, config, &windower, &mut conversation, input).await?;
    save_or_warn(store, &conversation);
    Ok((conversation, parsed))
}

/// Display a session, read one message, and send it
///
/// # Arguments
///
/// * `config` - Loaded configuration; an API key is required
/// * `id` - Short id or full id
pub async fn continue_session(config: &Config, id: &str) -> Result<()> {
    let store = SessionStore::from_config(config)?;
    let conversation = store.resolve(id)?;
    let provider = PerplexityProvider::from_config(config)?;

    display::print_conversation(&conversation);
    println!();
    display::print_separator(Color::Cyan);

    let mut rl = DefaultEditor::new()?;
    let input = match rl.readline(&format!("{} ", display::user_label())) {
        Ok(line) => line.trim().to_string(),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
        Err(e) => return Err(e.into()),
    };
    if input.is_empty() {
        println!("No message provided. Exiting.");
        return Ok(());
    }

    let spinner = Spinner::start("Thinking...");
    let result = continue_with_input(&provider, config, &store, &conversation.id, &input).await;
    spinner.stop().await;

    let (conversation, parsed) = result?;
    display::print_response(&parsed.formatted());
    tracing::debug!("Session updated: {}", conversation.id);
    Ok(())
}
