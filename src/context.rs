//! Outgoing context selection
//!
//! Chooses which stored turns accompany a new user message, and makes sure
//! no rendered reference block is ever sent back to the model.

use crate::citations::strip_references;
use crate::config::Config;
use crate::providers::Message;
use crate::storage::{Conversation, Role};

/// Stored turns sent with each request unless configured otherwise
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;

/// Builds request message lists from a bounded trailing window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindower {
    window_size: usize,
}

impl ContextWindower {
    /// Create a windower keeping at most `window_size` stored turns
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Create a windower from `session.context_window`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session.context_window)
    }

    /// Maximum stored turns per request
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// See [`build_outgoing`]
    pub fn build(&self, conversation: Option<&Conversation>, new_input: &str) -> Vec<Message> {
        build_outgoing(conversation, new_input, self.window_size)
    }
}

impl Default for ContextWindower {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

/// Messages to send for `new_input`, given the stored conversation
///
/// Takes the last `window_size` stored turns in order, strips any reference
/// block from assistant turns, and appends `new_input` as a user message
/// unless the last selected turn already has exactly that content.
///
/// # Examples
///
/// ```
/// use pplx::context::build_outgoing;
///
/// let messages = build_outgoing(None, "What is the capital of France?", 20);
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].role, "user");
/// ```
pub fn build_outgoing(
    conversation: Option<&Conversation>,
    new_input: &str,
    window_size: usize,
) -> Vec<Message> {
    let history = conversation
        .map(|c| c.last_messages(window_size))
        .unwrap_or_default();

    let mut messages: Vec<Message> = history
        .iter()
        .map(|m| match m.role {
            Role::Assistant => Message::new(m.role.as_str(), strip_references(&m.content)),
            Role::User => Message::new(m.role.as_str(), m.content.clone()),
        })
        .collect();

    let duplicate = history
        .last()
        .map(|last| last.content == new_input)
        .unwrap_or(false);
    if !duplicate {
        messages.push(Message::user(new_input));
    }

    messages
}
