//! PPLX - command-line client library for the Perplexity Sonar API
//!
//! This library provides the pieces behind the `pplx` binary: the API
//! provider, citation handling, context windowing, and file-backed session
//! storage with short ids, search, and schema migration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: Completion provider abstraction and the Perplexity client
//! - `citations`: `[N]` marker extraction and reference block rendering
//! - `context`: Outgoing message window for multi-turn requests
//! - `storage`: Session records, short ids, migration, and the file store
//! - `commands`: Interactive, one-shot, and session command handlers
//! - `display`: Tables, transcripts, and the progress spinner
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use pplx::{Config, SessionStore};
//! use pplx::cli::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(&Cli::default())?;
//!     config.validate()?;
//!
//!     let store = SessionStore::from_config(&config)?;
//!     for session in store.list_recent(5)? {
//!         println!("[{}] {}", session.short_id, session.initial_query);
//!     }
//!     Ok(())
//! }
//! ```

pub mod citations;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use citations::{parse_response, ParsedResponse};
pub use config::Config;
pub use error::{PplxError, Result};
pub use storage::{Conversation, SessionStore};

#[cfg(test)]
pub mod test_utils;
