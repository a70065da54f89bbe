//! Terminal presentation
//!
//! Session listings, conversation transcripts, response framing and the
//! progress spinner. Rendering functions return strings so they can be
//! tested; the `print_*` wrappers write them to stdout.

use crate::storage::{Conversation, Role, SessionSummary};
use chrono::{DateTime, Local, Utc};
use colored::{Color, Colorize};
use prettytable::{format, Table};
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const SEPARATOR_WIDTH: usize = 60;

/// Width of the initial-query column in listings
pub const QUERY_COLUMN_WIDTH: usize = 60;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A horizontal rule in the given color
pub fn separator(color: Color) -> String {
    "─".repeat(SEPARATOR_WIDTH).color(color).to_string()
}

/// Print a horizontal rule in the given color
pub fn print_separator(color: Color) {
    println!("{}", separator(color));
}

/// Label printed before user input
pub fn user_label() -> String {
    "You:".cyan().bold().to_string()
}

/// Label printed before a model response
pub fn assistant_label() -> String {
    "PPLX:".magenta().bold().to_string()
}

/// Format an instant as local time, e.g. `Jan 15, 2024 10:30:45`
pub fn format_session_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%b %d, %Y %H:%M:%S")
        .to_string()
}

/// Shorten `query` to at most `max_chars` characters, ending in `...` when cut
///
/// # Examples
///
/// ```
/// use pplx::display::truncate_query;
///
/// assert_eq!(truncate_query("short", 10), "short");
/// assert_eq!(truncate_query("What is the capital of France?", 10), "What is...");
/// ```
pub fn truncate_query(query: &str, max_chars: usize) -> String {
    if query.chars().count() <= max_chars {
        return query.to_string();
    }
    if max_chars <= 3 {
        return query.chars().take(max_chars).collect();
    }
    let mut out: String = query.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Table of session summaries
pub fn sessions_table(sessions: &[SessionSummary]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "#".bold(),
        "ID".bold(),
        "Created".bold(),
        "Query".bold(),
        "Messages".bold()
    ]);

    for (i, session) in sessions.iter().enumerate() {
        table.add_row(prettytable::row![
            i + 1,
            session.short_id.cyan(),
            format_session_time(session.created_at),
            truncate_query(&session.initial_query, QUERY_COLUMN_WIDTH),
            session.message_count
        ]);
    }

    table
}

/// Print a listing with a heading, or a hint when there is nothing to show
pub fn print_session_list(heading: &str, sessions: &[SessionSummary], empty_hint: &str) {
    if sessions.is_empty() {
        println!("{}", empty_hint.yellow());
        return;
    }

    println!("\n{}", heading);
    sessions_table(sessions).printstd();
    println!();
    println!(
        "Use {} to continue a session.",
        "pplx -c <ID>".cyan()
    );
    println!();
}

/// Full transcript of a stored conversation
///
/// Assistant turns are shown as stored. Search results are not persisted,
/// so inline `[N]` markers stay unresolved.
pub fn render_conversation(conversation: &Conversation) -> String {
    let header_rule = separator(Color::White);
    let mut out = String::new();

    out.push('\n');
    out.push_str(&header_rule);
    out.push('\n');
    out.push_str(&format!(
        "{} [{}] {}\n",
        "Session:".bold(),
        conversation.short_id.cyan(),
        format_session_time(conversation.metadata.created_at)
    ));
    out.push_str(&format!("{} {}\n", "Model:".bold(), conversation.metadata.model));
    out.push_str(&format!(
        "{} {}\n",
        "Messages:".bold(),
        conversation.messages.len()
    ));
    out.push_str(&header_rule);
    out.push_str("\n\n");

    for (i, message) in conversation.messages.iter().enumerate() {
        match message.role {
            Role::User => {
                if i > 0 {
                    out.push_str(&separator(Color::Cyan));
                    out.push('\n');
                }
                out.push_str(&format!("{} {}\n", user_label(), message.content));
            }
            Role::Assistant => {
                out.push('\n');
                out.push_str(&separator(Color::Magenta));
                out.push('\n');
                out.push_str(&format!("{} {}\n\n", assistant_label(), message.content));
            }
        }
    }

    out
}

/// Print a full transcript
pub fn print_conversation(conversation: &Conversation) {
    print!("{}", render_conversation(conversation));
}

/// Print a model response framed by a separator
pub fn print_response(formatted: &str) {
    println!();
    print_separator(Color::Magenta);
    println!("{} {}", assistant_label(), formatted);
    println!();
}

/// Print an error in red on stderr
pub fn print_error(message: impl std::fmt::Display) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Print a warning in yellow on stderr
pub fn print_warning(message: impl std::fmt::Display) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// Animated progress indicator on stderr
///
/// Runs as a tokio task that only touches the terminal. Nothing is drawn
/// when stderr is not a terminal.
pub struct Spinner {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning with `text` beside the frame
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(text: impl Into<String>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        if !std::io::stderr().is_terminal() {
            return Self { stop, handle: None };
        }

        let text = text.into();
        let stop_tick = Arc::clone(&stop);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(100));
            let mut frame = 0;
            loop {
                interval.tick().await;
                if stop_tick.load(Ordering::Relaxed) {
                    break;
                }
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "\r{} {}", SPINNER_FRAMES[frame].cyan(), text);
                let _ = stderr.flush();
                frame = (frame + 1) % SPINNER_FRAMES.len();
            }
            let width = text.chars().count() + 2;
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r{}\r", " ".repeat(width));
            let _ = stderr.flush();
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the animation and clear its line
    pub async fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
