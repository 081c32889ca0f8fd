//! Durable session records for spawned coding-agent engagements.
//!
//! The registry is append-only: sessions are created once, kept in creation
//! order, and never updated or removed by Autowork itself.

mod session_id;
mod session_registry;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use session_id::{generate_session_id, SESSION_ID_BYTES};
pub use session_registry::{RegistryError, SessionRegistry, SESSION_REGISTRY_SCHEMA_VERSION};

/// One spawned agent engagement bound to a repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub repo: String,
    pub branch: String,
    pub summary: String,
    pub repo_path: PathBuf,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "slack_msg", default)]
    pub originating_message: String,
}
