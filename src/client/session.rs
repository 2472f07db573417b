// Explicit session lifecycle for the dashboard client.
//
// Three states instead of a nullable token: Absent (never signed in or
// signed out), Valid (token plus the identity it belongs to), Expired
// (server rejected the token; the UI should route to the login screen).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sled::Tree;

use crate::models::auth::PublicUser;

const SESSION_TREE: &str = "client_session";
const SESSION_SLOT: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionState {
    Absent,
    Valid { token: String, user: PublicUser },
    Expired,
}

pub struct SessionContext {
    tree: Tree,
    state: SessionState,
}

impl SessionContext {
    /// Load the persisted session. A fresh store starts Absent; an
    /// unreadable slot is treated the same.
    pub fn load(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(SESSION_TREE)?;
        let state = tree
            .get(SESSION_SLOT)?
            .and_then(|data| serde_json::from_slice(&data).ok())
            .unwrap_or(SessionState::Absent);
        Ok(Self { tree, state })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Valid { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&PublicUser> {
        match &self.state {
            SessionState::Valid { user, .. } => Some(user),
            _ => None,
        }
    }

    /// True after the server has rejected the stored token.
    pub fn needs_login(&self) -> bool {
        matches!(self.state, SessionState::Expired)
    }

    pub fn establish(&mut self, token: String, user: PublicUser) -> Result<()> {
        self.set_state(SessionState::Valid { token, user })
    }

    /// Server said 401: drop the token and remember why.
    pub fn invalidate(&mut self) -> Result<()> {
        self.set_state(SessionState::Expired)
    }

    /// Deliberate sign-out.
    pub fn clear(&mut self) -> Result<()> {
        self.set_state(SessionState::Absent)
    }

    fn set_state(&mut self, state: SessionState) -> Result<()> {
        let serialized = serde_json::to_vec(&state)?;
        self.tree.insert(SESSION_SLOT, serialized)?;
        self.tree.flush()?;
        self.state = state;
        Ok(())
    }
}
