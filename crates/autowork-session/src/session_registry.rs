use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use autowork_core::{load_json_document, save_json_document};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session_id::generate_session_id;
use crate::Session;

pub const SESSION_REGISTRY_SCHEMA_VERSION: u32 = 1;
const MAX_ID_ALLOCATION_ATTEMPTS: usize = 8;

fn legacy_schema_version() -> u32 {
    SESSION_REGISTRY_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default = "legacy_schema_version")]
    schema_version: u32,
    #[serde(default)]
    sessions: Vec<Session>,
}

impl Default for SessionDocument {
    fn default() -> Self {
        Self {
            schema_version: SESSION_REGISTRY_SCHEMA_VERSION,
            sessions: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("session id {0} is already registered")]
    DuplicateId(String),
    #[error("could not allocate an unused session id after {attempts} attempts")]
    IdSpaceExhausted { attempts: usize },
    #[error("session registry storage failed: {0}")]
    Storage(String),
}

/// Append-only list of sessions backed by `sessions.json`.
#[derive(Debug)]
pub struct SessionRegistry {
    path: PathBuf,
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn load(path: PathBuf) -> Result<Self> {
        let sessions = read_document(&path)?.sessions;
        Ok(Self { path, sessions })
    }

    /// Sessions in creation order.
    pub fn list(&self) -> &[Session] {
        &self.sessions
    }

    pub fn find(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == id)
    }

    /// Generates a session id not yet present in the registry.
    pub fn allocate_id(&self) -> Result<String, RegistryError> {
        self.allocate_id_with(generate_session_id)
    }

    pub fn allocate_id_with<F>(&self, mut generate: F) -> Result<String, RegistryError>
    where
        F: FnMut() -> String,
    {
        for _ in 0..MAX_ID_ALLOCATION_ATTEMPTS {
            let candidate = generate();
            if self.find(&candidate).is_none() {
                return Ok(candidate);
            }
            tracing::warn!(session_id = %candidate, "session id collision, regenerating");
        }
        Err(RegistryError::IdSpaceExhausted {
            attempts: MAX_ID_ALLOCATION_ATTEMPTS,
        })
    }

    /// Appends `session` and rewrites the whole document.
    ///
    /// The document is re-read from disk first so sessions appended by another
    /// invocation since `load` are preserved. A duplicate id leaves the file and
    /// the in-memory list untouched.
    pub fn append(&mut self, session: Session) -> Result<(), RegistryError> {
        let mut document =
            read_document(&self.path).map_err(|error| RegistryError::Storage(format!("{error:#}")))?;
        if document
            .sessions
            .iter()
            .any(|existing| existing.id == session.id)
        {
            return Err(RegistryError::DuplicateId(session.id));
        }

        document.schema_version = SESSION_REGISTRY_SCHEMA_VERSION;
        document.sessions.push(session);
        save_json_document(&self.path, &document)
            .map_err(|error| RegistryError::Storage(format!("{error:#}")))?;
        tracing::debug!(
            registry = %self.path.display(),
            sessions = document.sessions.len(),
            "session appended"
        );
        self.sessions = document.sessions;
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<SessionDocument> {
    let document = load_json_document::<SessionDocument>(path)
        .with_context(|| format!("failed to load session registry {}", path.display()))?
        .unwrap_or_default();
    if document.schema_version > SESSION_REGISTRY_SCHEMA_VERSION {
        bail!(
            "unsupported session registry schema in {}: expected {}, found {}",
            path.display(),
            SESSION_REGISTRY_SCHEMA_VERSION,
            document.schema_version
        );
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::{RegistryError, SessionRegistry};
    use crate::Session;

    fn session(id: &str, branch: &str) -> Session {
        Session {
            id: id.to_string(),
            repo: "foo".to_string(),
            branch: branch.to_string(),
            summary: "fix bug".to_string(),
            repo_path: PathBuf::from("/repos/foo"),
            created_at: Utc
                .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
                .single()
                .expect("valid instant"),
            originating_message: "please fix the bug".to_string(),
        }
    }

    #[test]
    fn functional_append_preserves_creation_order_and_persists() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("sessions.json");
        let mut registry = SessionRegistry::load(path.clone()).expect("load");
        assert!(registry.list().is_empty());

        registry.append(session("aaaa0001", "one")).expect("first");
        registry.append(session("aaaa0002", "two")).expect("second");

        let reloaded = SessionRegistry::load(path).expect("reload");
        let ids = reloaded
            .list()
            .iter()
            .map(|session| session.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["aaaa0001", "aaaa0002"]);
        assert_eq!(
            reloaded.find("aaaa0002").map(|session| session.branch.as_str()),
            Some("two")
        );
        assert!(reloaded.find("missing").is_none());
    }

    #[test]
    fn regression_append_rejects_duplicate_id_without_touching_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("sessions.json");
        let mut registry = SessionRegistry::load(path.clone()).expect("load");
        registry.append(session("deadbeef", "one")).expect("first");
        let before = std::fs::read_to_string(&path).expect("read");

        let error = registry
            .append(session("deadbeef", "two"))
            .expect_err("duplicate");
        assert!(matches!(error, RegistryError::DuplicateId(ref id) if id == "deadbeef"));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), before);
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn functional_append_merges_sessions_written_by_another_invocation() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("sessions.json");
        let mut first = SessionRegistry::load(path.clone()).expect("load first");
        let mut second = SessionRegistry::load(path.clone()).expect("load second");

        first.append(session("00000001", "a")).expect("append a");
        second.append(session("00000002", "b")).expect("append b");

        let reloaded = SessionRegistry::load(path).expect("reload");
        assert_eq!(reloaded.list().len(), 2);
        assert_eq!(second.list().len(), 2);
    }

    #[test]
    fn unit_allocate_id_regenerates_on_collision() {
        let temp = tempdir().expect("tempdir");
        let mut registry =
            SessionRegistry::load(temp.path().join("sessions.json")).expect("load");
        registry.append(session("taken000", "one")).expect("append");

        let mut candidates = vec!["fresh000".to_string(), "taken000".to_string()];
        let id = registry
            .allocate_id_with(|| candidates.pop().unwrap_or_default())
            .expect("allocate");
        assert_eq!(id, "fresh000");

        let exhausted = registry
            .allocate_id_with(|| "taken000".to_string())
            .expect_err("exhausted");
        assert!(matches!(exhausted, RegistryError::IdSpaceExhausted { .. }));
    }

    #[test]
    fn regression_load_accepts_legacy_documents_with_slack_msg_key() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("sessions.json");
        std::fs::write(
            &path,
            r#"{
  "sessions": [
    {
      "id": "a1b2c3d4",
      "repo": "foo",
      "branch": "fix-bug-123",
      "summary": "fix bug",
      "repo_path": "/repos/foo",
      "created_at": "2025-01-02T03:04:05.123456789-05:00",
      "slack_msg": "the login page is broken"
    }
  ]
}
"#,
        )
        .expect("write legacy");

        let registry = SessionRegistry::load(path).expect("load");
        let session = registry.find("a1b2c3d4").expect("session");
        assert_eq!(session.originating_message, "the login page is broken");
        assert_eq!(session.branch, "fix-bug-123");
    }
}
