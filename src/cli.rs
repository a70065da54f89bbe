//! Command-line interface definition for PPLX
//!
//! This module defines the CLI structure using clap's derive API,
//! providing one-shot queries, interactive mode, and session management.

use crate::error::{PplxError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PPLX - command-line client for the Perplexity Sonar API
///
/// Run without a subcommand to start an interactive conversation.
///
/// Shortcuts: `pplx -c ID` continues a session, `pplx -l N` lists recent
/// sessions, `pplx -s QUERY` searches sessions. Shortcuts cannot be combined
/// with subcommands.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pplx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ~/.pplx/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model to use (sonar, sonar-pro, sonar-reasoning, ...)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Override the sessions directory
    #[arg(long, global = true, value_name = "DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Continue a session (same as: pplx session continue ID)
    #[arg(short = 'c', long = "continue", value_name = "ID")]
    pub continue_id: Option<String>,

    /// List recent sessions (same as: pplx session list -l N)
    #[arg(short = 'l', long = "list", value_name = "N")]
    pub list_limit: Option<usize>,

    /// Search sessions (same as: pplx session search QUERY)
    #[arg(short = 's', long = "search", value_name = "QUERY")]
    pub search_query: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for PPLX
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Send a one-shot query (reads stdin when QUERY is omitted)
    Run {
        /// Query text
        query: Option<String>,
    },

    /// Manage conversation sessions
    Session {
        /// Number of sessions to list when no subcommand is given
        #[arg(short = 'l', long = "limit")]
        limit: Option<usize>,

        /// Session subcommand
        #[command(subcommand)]
        command: Option<SessionCommand>,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List recent sessions, newest first
    List {
        /// Number of sessions to display
        #[arg(short = 'l', long = "limit")]
        limit: Option<usize>,
    },

    /// Show a full conversation
    Show {
        /// Short id or full id
        id: String,
    },

    /// Search sessions by short id, first query, or message content
    Search {
        /// Text to search for (case-insensitive)
        query: String,
    },

    /// Display a session and send one more message
    Continue {
        /// Short id or full id
        id: String,
    },

    /// Delete a session
    Delete {
        /// Short id or full id
        id: String,
    },
}

/// What a parsed command line asks for, with shortcuts resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Interactive conversation
    Interactive,
    /// One-shot query
    Run(Option<String>),
    /// List recent sessions with the `-l` value as given
    ///
    /// `None` uses the configured limit; `Some(0)` lists everything.
    List(Option<usize>),
    /// Show a session
    Show(String),
    /// Search sessions
    Search(String),
    /// Continue a session
    Continue(String),
    /// Delete a session
    Delete(String),
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    fn has_shortcut(&self) -> bool {
        self.continue_id.is_some() || self.list_limit.is_some() || self.search_query.is_some()
    }

    /// Resolve shortcuts and subcommands to a single action
    ///
    /// Shortcuts take precedence in the order continue, list, search.
    ///
    /// # Errors
    ///
    /// Returns `PplxError::Validation` if a shortcut is combined with a subcommand
    pub fn action(&self) -> Result<Action> {
        if self.has_shortcut() && self.command.is_some() {
            return Err(PplxError::Validation(
                "cannot use session shortcuts (-c, -l, -s) together with subcommands; \
                 use either 'pplx -c ID' or 'pplx session continue ID'"
                    .to_string(),
            )
            .into());
        }

        if let Some(id) = &self.continue_id {
            return Ok(Action::Continue(id.clone()));
        }
        if let Some(limit) = self.list_limit {
            return Ok(Action::List(Some(limit)));
        }
        if let Some(query) = &self.search_query {
            return Ok(Action::Search(query.clone()));
        }

        Ok(match &self.command {
            None => Action::Interactive,
            Some(Commands::Run { query }) => Action::Run(query.clone()),
            Some(Commands::Session { limit, command }) => match command {
                None => Action::List(*limit),
                Some(SessionCommand::List { limit }) => Action::List(*limit),
                Some(SessionCommand::Show { id }) => Action::Show(id.clone()),
                Some(SessionCommand::Search { query }) => Action::Search(query.clone()),
                Some(SessionCommand::Continue { id }) => Action::Continue(id.clone()),
                Some(SessionCommand::Delete { id }) => Action::Delete(id.clone()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_of(args: &[&str]) -> Action {
        Cli::try_parse_from(args)
            .expect("parse failed")
            .action()
            .expect("action failed")
    }

    #[test]
    fn test_cli_default_is_interactive() {
        let cli = Cli::default();
        assert!(!cli.verbose);
        assert_eq!(cli.action().unwrap(), Action::Interactive);
    }

    #[test]
    fn test_no_args_is_interactive() {
        assert_eq!(action_of(&["pplx"]), Action::Interactive);
    }

    #[test]
    fn test_parse_run_with_query() {
        assert_eq!(
            action_of(&["pplx", "run", "What is the capital of France?"]),
            Action::Run(Some("What is the capital of France?".to_string()))
        );
        assert_eq!(action_of(&["pplx", "run"]), Action::Run(None));
    }

    #[test]
    fn test_parse_run_with_global_model() {
        let cli = Cli::try_parse_from(["pplx", "run", "hi", "--model", "sonar-pro"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("sonar-pro"));
    }

    #[test]
    fn test_parse_session_subcommands() {
        assert_eq!(
            action_of(&["pplx", "session", "list", "-l", "5"]),
            Action::List(Some(5))
        );
        assert_eq!(action_of(&["pplx", "session", "list"]), Action::List(None));
        assert_eq!(action_of(&["pplx", "session", "-l", "20"]), Action::List(Some(20)));
        assert_eq!(action_of(&["pplx", "session"]), Action::List(None));
        assert_eq!(
            action_of(&["pplx", "session", "show", "a8x9k2"]),
            Action::Show("a8x9k2".to_string())
        );
        assert_eq!(
            action_of(&["pplx", "session", "search", "France"]),
            Action::Search("France".to_string())
        );
        assert_eq!(
            action_of(&["pplx", "session", "continue", "20240115-103045.123"]),
            Action::Continue("20240115-103045.123".to_string())
        );
        assert_eq!(
            action_of(&["pplx", "session", "delete", "a8x9k2"]),
            Action::Delete("a8x9k2".to_string())
        );
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(
            action_of(&["pplx", "-c", "a8x9k2"]),
            Action::Continue("a8x9k2".to_string())
        );
        assert_eq!(action_of(&["pplx", "-l", "3"]), Action::List(Some(3)));
        assert_eq!(action_of(&["pplx", "-l", "0"]), Action::List(Some(0)));
        assert_eq!(
            action_of(&["pplx", "-s", "France"]),
            Action::Search("France".to_string())
        );
    }

    #[test]
    fn test_shortcut_precedence() {
        assert_eq!(
            action_of(&["pplx", "-s", "France", "-c", "abc"]),
            Action::Continue("abc".to_string())
        );
    }

    #[test]
    fn test_shortcut_with_session_command_is_rejected() {
        let cli = Cli::try_parse_from(["pplx", "-c", "abc", "session", "list"]).unwrap();
        let err = cli.action().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PplxError>(),
            Some(PplxError::Validation(_))
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pplx",
            "session",
            "list",
            "--sessions-dir",
            "/tmp/s",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.sessions_dir, Some(PathBuf::from("/tmp/s")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_show_requires_id() {
        assert!(Cli::try_parse_from(["pplx", "session", "show"]).is_err());
    }
}
