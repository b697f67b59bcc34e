use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gate::CredentialGate;
use crate::store::StoreError;

/// Login state of the single front-end session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn {
        session_id: Uuid,
        username: String,
        since: DateTime<Utc>,
    },
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::LoggedIn { .. })
    }

    /// Moves to `LoggedIn` when the gate accepts the pair and returns the new
    /// session id. A rejected attempt leaves the current state alone.
    pub fn login(
        &mut self,
        gate: &CredentialGate,
        username: &str,
        password: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        if !gate.verify(username, password)? {
            return Ok(None);
        }
        let session_id = Uuid::new_v4();
        *self = Session::LoggedIn {
            session_id,
            username: username.to_string(),
            since: Utc::now(),
        };
        Ok(Some(session_id))
    }

    /// Returns whether there was a session to end.
    pub fn logout(&mut self) -> bool {
        let was = self.is_logged_in();
        *self = Session::LoggedOut;
        was
    }
}
