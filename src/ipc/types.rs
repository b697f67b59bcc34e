use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DaemonConfig;
use crate::gate::CredentialGate;
use crate::session::Session;
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// An opened workspace: its directory plus the two handles over its db file.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub path: PathBuf,
    pub store: RecordStore,
    pub gate: CredentialGate,
}

pub struct AppState {
    pub config: DaemonConfig,
    pub workspace: Option<Workspace>,
    pub session: Session,
}

impl AppState {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config,
            workspace: None,
            session: Session::LoggedOut,
        }
    }

    /// Initializes schema and seed credential in `path`, then makes it the
    /// active workspace. Any existing session ends.
    pub fn select_workspace(&mut self, path: &Path) -> Result<(), StoreError> {
        std::fs::create_dir_all(path)?;
        let store_config = self.config.store_config(path);
        let store = RecordStore::new(store_config.clone());
        let gate = CredentialGate::new(store_config);
        store.initialize()?;
        gate.seed_default()?;

        self.session.logout();
        self.workspace = Some(Workspace {
            path: path.to_path_buf(),
            store,
            gate,
        });
        info!(workspace = %path.display(), "workspace selected");
        Ok(())
    }
}
