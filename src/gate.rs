use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::config::StoreConfig;
use crate::db;
use crate::store::StoreError;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "1234";

/// Fixed-credential login check against the `admin` table.
///
/// Passwords are stored and compared as plaintext.
#[derive(Debug, Clone)]
pub struct CredentialGate {
    config: StoreConfig,
}

impl CredentialGate {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = db::connect(&self.config)?;
        db::ensure_schema(&conn)?;
        Ok(conn)
    }

    /// Inserts `admin`/`1234` unless that username is already present.
    /// A repeat call is a no-op.
    pub fn seed_default(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT INTO admin(username, password) VALUES(?, ?)
             ON CONFLICT(username) DO NOTHING",
            (DEFAULT_USERNAME, DEFAULT_PASSWORD),
        )?;
        if inserted > 0 {
            debug!(username = DEFAULT_USERNAME, "seeded default credential");
        }
        Ok(())
    }

    /// Exact match on both fields. No trimming or case folding.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let hit: Option<i64> = conn
            .query_row(
                "SELECT id FROM admin WHERE username = ? AND password = ?",
                (username, password),
                |r| r.get(0),
            )
            .optional()?;
        debug!(username, accepted = hit.is_some(), "credential check");
        Ok(hit.is_some())
    }
}
