//! Conversation storage
//!
//! One JSON file per conversation, named `{id}.json`, inside a single
//! directory. Writes go to a sibling temporary file that is renamed over the
//! final path, so a record on disk is always a complete old or new version.
//! Every read runs the migration table and re-persists upgraded records.
//!
//! The directory is assumed to have a single writer. There is no locking;
//! concurrent writers to the same id lose updates to whichever rename lands
//! last.

use crate::config::Config;
use crate::error::{Result, PplxError};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub mod migration;
pub mod short_id;
pub mod types;

pub use migration::{migrate, Migration, CURRENT_VERSION, LEGACY_VERSION};
pub use types::{
    generate_session_id, Conversation, Role, SessionMessage, SessionMetadata, SessionSummary,
};

const RECORD_EXTENSION: &str = ".json";
const TEMP_SUFFIX: &str = ".tmp";

/// Aggregate figures over all stored conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of readable conversations
    pub total: usize,
    /// Creation instant of the oldest conversation
    pub oldest: Option<DateTime<Utc>>,
    /// Creation instant of the newest conversation
    pub newest: Option<DateTime<Utc>>,
}

/// File-backed conversation store
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `sessions_dir`
    ///
    /// The directory is not touched until the first save.
    ///
    /// # Examples
    ///
    /// ```
    /// use pplx::storage::SessionStore;
    ///
    /// let store = SessionStore::new("/tmp/pplx-sessions");
    /// assert!(store.path_for("20240115-103045.123").ends_with("20240115-103045.123.json"));
    /// ```
    pub fn new<P: Into<PathBuf>>(sessions_dir: P) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    /// Create a store for the configured sessions directory, creating it if needed
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Self::new(config.session.directory.clone());
        store.ensure_dir()?;
        Ok(store)
    }

    /// Directory holding the session files
    pub fn storage_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Canonical path of the record with the given id
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.sessions_dir.join(format!("{}{}", id, RECORD_EXTENSION))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.sessions_dir).map_err(|e| {
            PplxError::io("creating sessions directory", &self.sessions_dir, e)
        })?;
        Ok(())
    }

    /// Start a new conversation without persisting it
    pub fn create(&self, model: &str, initial_query: &str) -> Conversation {
        Conversation::new(model, initial_query)
    }

    /// Start a new conversation and persist it immediately
    pub fn create_and_save(&self, model: &str, initial_query: &str) -> Result<Conversation> {
        let conversation = self.create(model, initial_query);
        self.save(&conversation)?;
        Ok(conversation)
    }

    /// Atomically persist `conversation` to `{dir}/{id}.json`
    ///
    /// # Errors
    ///
    /// Returns `PplxError::Io` if the directory cannot be created or the
    /// write or rename fails. The temporary file is removed on failure.
    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        validate_id(&conversation.id)?;
        self.ensure_dir()?;

        let path = self.path_for(&conversation.id);
        let tmp_path = temp_path_for(&path);
        let data = serde_json::to_vec_pretty(conversation)?;

        if let Err(e) = write_synced(&tmp_path, &data) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PplxError::io("writing temporary session file", &tmp_path, e).into());
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PplxError::io("renaming session file into", &path, e).into());
        }

        tracing::debug!("Saved session: {}", path.display());
        Ok(())
    }

    /// Load a conversation by canonical id
    ///
    /// # Errors
    ///
    /// `PplxError::NotFound` if no such record exists, `PplxError::Parse` if
    /// it is not a valid session, `PplxError::Io` for other read failures.
    pub fn load(&self, id: &str) -> Result<Conversation> {
        validate_id(id)?;
        let path = self.path_for(id);
        match fs::metadata(&path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PplxError::NotFound(id.to_string()).into())
            }
            _ => self.load_from_file(&path),
        }
    }

    /// Load a conversation by short id
    ///
    /// Scans every record in the directory. Unreadable or corrupt files are
    /// logged and skipped. If two records share a short id the first in
    /// directory order wins.
    pub fn load_by_short_id(&self, short_id: &str) -> Result<Conversation> {
        for path in self.record_paths()? {
            match self.load_from_file(&path) {
                Ok(conversation) if conversation.short_id == short_id => return Ok(conversation),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping session file {}: {}", path.display(), e),
            }
        }
        Err(PplxError::NotFound(short_id.to_string()).into())
    }

    /// Load by short id, falling back to canonical id
    pub fn resolve(&self, id: &str) -> Result<Conversation> {
        match self.load_by_short_id(id) {
            Ok(conversation) => Ok(conversation),
            Err(e) if crate::error::is_not_found(&e) => self.load(id),
            Err(e) => Err(e),
        }
    }

    /// Read, parse, and migrate a single record file
    pub fn load_from_file(&self, path: &Path) -> Result<Conversation> {
        let data = fs::read_to_string(path)
            .map_err(|e| PplxError::io("reading session file", path, e))?;
        let mut conversation: Conversation =
            serde_json::from_str(&data).map_err(|e| PplxError::parse(path, e))?;

        match migrate(&mut conversation) {
            Migration::Unchanged => {}
            Migration::Unsupported { found } => {
                return Err(PplxError::parse(
                    path,
                    format!(
                        "unsupported session version {}; this build reads up to {}",
                        found, CURRENT_VERSION
                    ),
                )
                .into());
            }
            Migration::Upgraded { from } => match self.save(&conversation) {
                Ok(()) => tracing::debug!(
                    "Migrated session {} from version {} (short id {})",
                    conversation.id,
                    from,
                    conversation.short_id
                ),
                Err(e) => tracing::warn!(
                    "Failed to save migrated session {}: {}",
                    conversation.id,
                    e
                ),
            },
        }

        Ok(conversation)
    }

    /// Record files in the directory, sorted by file name
    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.sessions_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(
                    PplxError::io("reading sessions directory", &self.sessions_dir, e).into(),
                )
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
                continue;
            }
            let name = entry.file_name();
            if is_valid_session_file(&name.to_string_lossy()) {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every readable conversation, newest first
    fn load_all(&self) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::new();
        for path in self.record_paths()? {
            match self.load_from_file(&path) {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => tracing::warn!("Skipping session file {}: {}", path.display(), e),
            }
        }
        // Stable sort: ties keep file-name order.
        conversations.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        Ok(conversations)
    }

    /// Summaries of all conversations, newest first
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        Ok(self
            .load_all()?
            .iter()
            .map(Conversation::to_summary)
            .collect())
    }

    /// The `n` most recent summaries
    pub fn list_recent(&self, n: usize) -> Result<Vec<SessionSummary>> {
        let mut sessions = self.list()?;
        sessions.truncate(n);
        Ok(sessions)
    }

    /// Case-insensitive search over short id, initial query, and message content
    ///
    /// A record matches when its short id equals `query`, or its initial
    /// query or any message contains `query`. Results are newest first.
    ///
    /// # Errors
    ///
    /// `PplxError::Validation` if `query` is empty or whitespace.
    pub fn search(&self, query: &str) -> Result<Vec<SessionSummary>> {
        if query.trim().is_empty() {
            return Err(PplxError::Validation("search query cannot be empty".to_string()).into());
        }

        let needle = query.to_lowercase();
        Ok(self
            .load_all()?
            .iter()
            .filter(|c| matches_query(c, &needle))
            .map(Conversation::to_summary)
            .collect())
    }

    /// Remove a conversation file
    pub fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        let path = self.path_for(id);
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PplxError::NotFound(id.to_string()),
            _ => PplxError::io("deleting session file", &path, e),
        })?;
        tracing::debug!("Deleted session: {}", path.display());
        Ok(())
    }

    /// Whether a record with this canonical id exists
    pub fn exists(&self, id: &str) -> bool {
        validate_id(id).is_ok() && self.path_for(id).is_file()
    }

    /// The most recently created conversation
    pub fn latest(&self) -> Result<Conversation> {
        self.load_all()?
            .into_iter()
            .next()
            .ok_or_else(|| PplxError::NotFound("no sessions found".to_string()).into())
    }

    /// Load `id`, append one turn, and persist
    pub fn append(&self, id: &str, role: Role, content: &str) -> Result<Conversation> {
        let mut conversation = self.load(id)?;
        conversation.add_message(role, content);
        self.save(&conversation)?;
        Ok(conversation)
    }

    /// Count and creation range of stored conversations
    pub fn stats(&self) -> Result<SessionStats> {
        let sessions = self.list()?;
        Ok(SessionStats {
            total: sessions.len(),
            newest: sessions.first().map(|s| s.created_at),
            oldest: sessions.last().map(|s| s.created_at),
        })
    }
}

fn matches_query(conversation: &Conversation, needle: &str) -> bool {
    conversation.short_id.to_lowercase() == needle
        || conversation
            .metadata
            .initial_query
            .to_lowercase()
            .contains(needle)
        || conversation
            .messages
            .iter()
            .any(|m| m.content.to_lowercase().contains(needle))
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Ids become file names, so they must not contain path separators
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(PplxError::Validation(format!("invalid session id: {:?}", id)).into());
    }
    Ok(())
}

/// Whether a file name looks like a session record (`<stem>.json`)
pub fn is_valid_session_file(filename: &str) -> bool {
    let base = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.len() > RECORD_EXTENSION.len() && base.ends_with(RECORD_EXTENSION)
}

/// Strip the directory and `.json` extension from a record file name
pub fn parse_session_id(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match base.strip_suffix(RECORD_EXTENSION) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => base,
    }
}
