//! Conversation sessions
//!
//! A session is the ordered list of (query, response) turns for one
//! conversation. Turns are folded back into later prompts verbatim.
//! Named sessions (--session) persist as JSON files under the user data
//! directory so a later invocation can pick the conversation back up.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_DIR: &str = "grassai/sessions";

/// Sentinel inputs that close the interactive loop
const CLOSE_COMMANDS: &[&str] = &["close", "quit", "exit", "q", "grassai close"];

/// One question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub response: String,
    pub at: DateTime<Utc>,
}

/// An ordered conversation, optionally persisted by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

impl Session {
    /// Create a fresh session; a missing id gets a generated UUID.
    pub fn new(id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
        }
    }

    pub fn push_turn(&mut self, query: &str, response: &str) {
        self.turns.push(Turn {
            query: query.to_string(),
            response: response.to_string(),
            at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Render all prior turns, oldest first, for prompt folding.
    /// No summarization or truncation.
    pub fn context_block(&self) -> String {
        let mut block = String::new();
        for turn in &self.turns {
            block.push_str(&format!("User: {}\n", turn.query));
            block.push_str(&format!("Assistant: {}\n", turn.response));
        }
        block
    }
}

/// Does this input close the interactive loop?
pub fn is_close_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    CLOSE_COMMANDS.contains(&normalized.as_str())
}

/// JSON-file session storage
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store under the platform data directory
    pub fn open_default() -> Option<Self> {
        dirs::data_dir().map(|d| Self::with_dir(d.join(SESSION_DIR)))
    }

    /// Store under an explicit directory (used by tests)
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Session ids become file names; keep them path-safe
        let safe: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Load a stored session, or None when the id is unknown.
    pub fn load(&self, id: &str) -> Result<Option<Session>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let session = serde_json::from_str(&contents)?;
        Ok(Some(session))
    }

    /// Persist a session, creating the store directory as needed.
    pub fn save(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&session.id);
        let contents = serde_json::to_string_pretty(session)?;
        fs::write(&path, contents)?;
        tracing::debug!("Saved session {} ({} turns)", session.id, session.turns.len());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_commands() {
        assert!(is_close_command("close"));
        assert!(is_close_command("quit"));
        assert!(is_close_command("exit"));
        assert!(is_close_command("q"));
        assert!(is_close_command("grassai close"));
        assert!(is_close_command("  QUIT  "));

        assert!(!is_close_command("closest raster"));
        assert!(!is_close_command("how do I quit smoking maps"));
        assert!(!is_close_command(""));
    }

    #[test]
    fn test_new_session_generates_id() {
        let a = Session::new(None);
        let b = Session::new(None);
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);

        let named = Session::new(Some("watershed-study".to_string()));
        assert_eq!(named.id, "watershed-study");
    }

    #[test]
    fn test_context_block_folds_turns_verbatim() {
        let mut session = Session::new(None);
        session.push_turn("what maps do I have?", "Run g.list type=raster");
        session.push_turn("compute slope", "Use r.slope.aspect");

        let block = session.context_block();
        assert!(block.contains("User: what maps do I have?"));
        assert!(block.contains("Assistant: Run g.list type=raster"));
        let first = block.find("what maps").unwrap();
        let second = block.find("compute slope").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::with_dir(dir.path());

        let mut session = Session::new(Some("test-session".to_string()));
        session.push_turn("q1", "a1");
        store.save(&session).unwrap();

        let loaded = store.load("test-session").unwrap().unwrap();
        assert_eq!(loaded.id, "test-session");
        assert_eq!(loaded.turns.len(), 1);
        assert_eq!(loaded.turns[0].query, "q1");
        assert_eq!(loaded.turns[0].response, "a1");
    }

    #[test]
    fn test_store_unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::with_dir(dir.path());
        assert!(store.load("never-saved").unwrap().is_none());
    }

    #[test]
    fn test_store_sanitizes_id_for_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::with_dir(dir.path());

        let session = Session::new(Some("../escape/attempt".to_string()));
        store.save(&session).unwrap();

        // The file stays inside the store directory
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let loaded = store.load("../escape/attempt").unwrap();
        assert!(loaded.is_some());
    }
}
