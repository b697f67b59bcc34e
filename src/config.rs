use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::db;

pub const ENV_PREFIX: &str = "ROLLBOOKD_";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Workspace opened at startup, as if `workspace.select` had been sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub busy_timeout_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            log_level: "info".to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DaemonConfig {
    /// Defaults overlaid with `ROLLBOOKD_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::figment().extract().map_err(anyhow::Error::from)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(DaemonConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn store_config(&self, workspace: &Path) -> StoreConfig {
        StoreConfig {
            path: db::db_path(workspace),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

/// Where the database file lives and how long to wait on a locked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn for_workspace(workspace: &Path) -> Self {
        Self::new(db::db_path(workspace))
    }
}
