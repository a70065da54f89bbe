/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive conversation mode
- `run`: One-shot query
- `session`: Listing, search, display, continuation and deletion of stored sessions

Every handler that talks to the API goes through [`complete_turn`], which
builds the outgoing context, calls the provider, and appends the user turn
and the clean assistant turn to the conversation. Persisting is left to the
caller.
*/

use crate::citations::{parse_response, ParsedResponse};
use crate::config::Config;
use crate::context::ContextWindower;
use crate::display::{self, Spinner};
use crate::error::Result;
use crate::providers::{build_request, Provider};
use crate::storage::{Conversation, Role, SessionStore};

pub mod session;

/// Run one request/response round-trip for `conversation`
///
/// Sends the trailing context window plus `input` using the conversation's
/// own model. On success appends the user turn and the assistant turn with
/// any reference block removed. On failure the conversation is untouched.
///
/// # Arguments
///
/// * `provider` - Remote completion collaborator
/// * `config` - Sampling and search parameters
/// * `windower` - Context window policy
/// * `conversation` - Conversation to extend
/// * `input` - New user turn
///
/// # Returns
///
/// Returns the parsed response, for display with references
///
/// # Errors
///
/// Returns the provider's error unchanged
pub async fn complete_turn(
    provider: &dyn Provider,
    config: &Config,
    windower: &ContextWindower,
    conversation: &mut Conversation,
    input: &str,
) -> Result<ParsedResponse> {
    let messages = windower.build(Some(conversation), input);
    let request = build_request(config, &conversation.metadata.model, messages);

    let response = provider.complete(&request).await?;
    let parsed = parse_response(&response);

    conversation.add_message(Role::User, input);
    conversation.add_message(Role::Assistant, parsed.clean());

    Ok(parsed)
}

/// Persist `conversation`, reporting failure as a warning
///
/// Empty conversations are not written. Returns whether a write succeeded.
pub fn save_or_warn(store: &SessionStore, conversation: &Conversation) -> bool {
    if conversation.messages.is_empty() {
        return false;
    }
    match store.save(conversation) {
        Ok(()) => {
            tracing::debug!("Session auto-saved: {}", conversation.id);
            true
        }
        Err(e) => {
            display::print_warning(format!("failed to save session: {}", e));
            false
        }
    }
}

// Interactive chat handler
pub mod chat {
    //! Interactive conversation mode.
    //!
    //! A readline loop that creates the conversation lazily on the first
    //! message and saves it after every turn. SIGINT or SIGTERM while a
    //! request is in flight abandons the request, saves, and exits. A signal
    //! task only raises a flag on a watch channel; the loop owns all state.

    use super::*;
    use colored::{Color, Colorize};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Inputs that end the session
    pub const EXIT_COMMANDS: [&str; 2] = ["/q", "/quit"];

    /// How long the signal task waits for the loop to stop on its own
    const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

    /// Whether `input` is an exit command
    pub fn is_exit_command(input: &str) -> bool {
        EXIT_COMMANDS.contains(&input)
    }

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration; an API key is required
    ///
    /// # Errors
    ///
    /// Returns error if the provider, store, or line editor cannot be created
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let provider = crate::providers::PerplexityProvider::from_config(&config)?;
        let store = SessionStore::from_config(&config)?;
        let windower = ContextWindower::from_config(&config);
        let mut rl = DefaultEditor::new()?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let signal_task = tokio::spawn(watch_for_shutdown(shutdown_tx));

        println!("{}", "Welcome to PPLX Interactive Mode!".bold());
        println!(
            "Model: {} | Type '{}' or press Ctrl+C to exit\n",
            config.model.cyan(),
            EXIT_COMMANDS[0]
        );

        let mut conversation: Option<Conversation> = None;
        let prompt = format!("{} ", display::user_label());

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            if conversation.as_ref().is_some_and(|c| !c.messages.is_empty()) {
                display::print_separator(Color::Cyan);
            }

            let line = match rl.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            };

            let input = line.trim();
            if is_exit_command(input) {
                break;
            }
            if input.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(input);

            let conv =
                conversation.get_or_insert_with(|| Conversation::new(config.model.as_str(), input));

            let spinner = Spinner::start("Thinking...");
            let outcome = tokio::select! {
                result = complete_turn(&provider, &config, &windower, conv, input) => Some(result),
                Ok(()) = shutdown_rx.changed() => None,
            };
            spinner.stop().await;

            match outcome {
                Some(Ok(parsed)) => {
                    display::print_response(&parsed.formatted());
                    save_or_warn(&store, conv);
                }
                Some(Err(e)) => display::print_error(format!("API request failed: {}", e)),
                None => {
                    println!("\nReceived interrupt signal. Saving session...");
                    break;
                }
            }
        }

        if let Some(conv) = &conversation {
            if save_or_warn(&store, conv) {
                println!("Session saved: [{}]", conv.short_id.cyan());
            }
        }
        signal_task.abort();
        println!("Goodbye!");
        Ok(())
    }

    /// Raise the shutdown flag on SIGINT or SIGTERM
    ///
    /// If the loop is blocked at the prompt it cannot observe the flag, so
    /// after a grace period the process exits. Every completed turn has
    /// already been saved by then.
    async fn watch_for_shutdown(shutdown: watch::Sender<bool>) {
        wait_for_signal().await;
        tracing::debug!("Shutdown signal received");
        let _ = shutdown.send(true);
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        std::process::exit(130);
    }

    /// Resolves on SIGINT or SIGTERM; never resolves if no handler can be installed
    #[cfg(unix)]
    async fn wait_for_signal() {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    Ok(()) = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                wait_for_ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait_for_signal() {
        wait_for_ctrl_c().await;
    }

    #[cfg_attr(unix, allow(dead_code))]
    async fn wait_for_ctrl_c() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }

}

// One-shot query handler
pub mod r#run {
    //! One-shot query mode.
    //!
    //! Sends a single message with no history and prints the response with
    //! its reference block. Nothing is persisted.

    use super::*;
    use crate::error::PplxError;
    use crate::providers::Message;
    use std::io::{IsTerminal, Read};

    /// The query from the argument, or from piped stdin
    ///
    /// # Errors
    ///
    /// Returns `PplxError::Validation` if no query is available
    pub fn resolve_query(query: Option<String>) -> Result<String> {
        let query = match query {
            Some(q) => q,
            None if !std::io::stdin().is_terminal() => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| PplxError::Validation(format!("failed to read stdin: {}", e)))?;
                buf
            }
            None => String::new(),
        };

        let query = query.trim();
        if query.is_empty() {
            return Err(PplxError::Validation(
                "query is required\n\nUsage: pplx run \"<query>\"\n   or: echo \"<query>\" | pplx run"
                    .to_string(),
            )
            .into());
        }
        Ok(query.to_string())
    }

    /// Send `query` and return the response formatted with references
    pub async fn ask(provider: &dyn Provider, config: &Config, query: &str) -> Result<String> {
        let request = build_request(config, &config.model, vec![Message::user(query)]);
        let response = provider.complete(&request).await?;
        Ok(parse_response(&response).formatted())
    }

    /// Execute a one-shot query
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration; an API key is required
    /// * `query` - Query text, or `None` to read piped stdin
    pub async fn run_query(config: Config, query: Option<String>) -> Result<()> {
        let query = resolve_query(query)?;
        let provider = crate::providers::PerplexityProvider::from_config(&config)?;
        tracing::info!("Running one-shot query with model {}", config.model);

        let spinner = Spinner::start("Thinking...");
        let result = ask(&provider, &config, &query).await;
        spinner.stop().await;

        println!("{}", result?);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::providers::SearchResult;
        use crate::test_utils::{response_with, MockProvider};

        #[test]
        fn test_resolve_query_trims_argument() {
            assert_eq!(
                resolve_query(Some("  What is 2+2?\n".to_string())).unwrap(),
                "What is 2+2?"
            );
        }

        #[test]
        fn test_resolve_query_rejects_blank_argument() {
            assert!(resolve_query(Some("   ".to_string())).is_err());
        }

        #[tokio::test]
        async fn test_ask_sends_single_message_and_formats_references() {
            let provider = MockProvider::new().respond(response_with(
                "Paris [1]",
                vec![SearchResult::new("Wikipedia", "https://wikipedia.org/Paris")],
            ));
            let config = Config::default();

            let out = ask(&provider, &config, "Capital of France?").await.unwrap();
            assert_eq!(
                out,
                "Paris [1]\n\n## References:\n[1] Wikipedia - https://wikipedia.org/Paris\n"
            );

            let requests = provider.requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].model, "sonar");
            assert_eq!(requests[0].messages, vec![Message::user("Capital of France?")]);
        }
    }
}
