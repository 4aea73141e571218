//! session manager: establishes and restores the user identity that gates
//! the chat view.
//!
//! state machine: `LoggedOut -> LoggingIn -> LoggedIn | LoggedOut`, with
//! `LoggedIn` also reachable straight from page load via
//! [`SessionManager::restore_session`].

use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::{ApiResponse, LoginReply, LoginRequest, Transport, to_body};
use crate::config::{ClientConfig, StorageKeys};
use crate::error::{LoginError, StorageError, TransportError};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub id_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    /// `previous` is what a failed login falls back to.
    LoggingIn { previous: Option<Identity> },
    LoggedIn(Identity),
}

/// a validated login request, ready to send.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    url: String,
    body: Value,
}

impl PendingLogin {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub async fn send<T: Transport + ?Sized>(&self, transport: &T) -> Result<ApiResponse, TransportError> {
        transport.post_json(&self.url, &self.body).await
    }
}

/// sole writer of the persisted identity.
pub struct SessionManager<S> {
    store: S,
    keys: StorageKeys,
    login_url: String,
    state: SessionState,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S, keys: StorageKeys, login_url: impl Into<String>) -> Self {
        Self {
            store,
            keys,
            login_url: login_url.into(),
            state: SessionState::LoggedOut,
        }
    }

    pub fn from_config(config: &ClientConfig, store: S) -> Self {
        Self::new(store, config.storage.clone(), config.login_url())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// the active identity, only while logged in.
    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::LoggedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// reads the persisted identity; both fields must be present.
    /// no network call and no storage write. a pending login owns the state,
    /// so nothing is restored while one is in flight.
    pub fn restore_session(&mut self) -> Option<Identity> {
        if matches!(self.state, SessionState::LoggingIn { .. }) {
            return None;
        }
        let read = |key: &str| self.store.get(key).filter(|v| !v.trim().is_empty());
        let identity = Identity {
            display_name: read(&self.keys.display_name)?,
            id_number: read(&self.keys.id_number)?,
        };
        self.state = SessionState::LoggedIn(identity.clone());
        info!(target: "lenny_web", "session restored for id={}", identity.id_number);
        Some(identity)
    }

    /// validates locally and enters `LoggingIn`. blank fields never reach
    /// the network.
    pub fn begin_login(&mut self, display_name: &str, id_number: &str) -> Result<PendingLogin, LoginError> {
        if matches!(self.state, SessionState::LoggingIn { .. }) {
            return Err(LoginError::InProgress);
        }
        let display_name = display_name.trim();
        let id_number = id_number.trim();
        if display_name.is_empty() {
            return Err(LoginError::Validation("nombre"));
        }
        if id_number.is_empty() {
            return Err(LoginError::Validation("cedula"));
        }

        let previous = self.identity().cloned();
        self.state = SessionState::LoggingIn { previous };
        info!(target: "lenny_web", "login: id={} -> {}", id_number, self.login_url);

        Ok(PendingLogin {
            url: self.login_url.clone(),
            body: to_body(&LoginRequest {
                nombre: display_name.to_string(),
                cedula: id_number.to_string(),
            }),
        })
    }

    /// applies the outcome of a [`PendingLogin`]. persists only on success.
    pub fn complete_login(&mut self, outcome: Result<ApiResponse, TransportError>) -> Result<Identity, LoginError> {
        let previous = match std::mem::replace(&mut self.state, SessionState::LoggedOut) {
            SessionState::LoggingIn { previous } => previous,
            SessionState::LoggedIn(identity) => Some(identity),
            SessionState::LoggedOut => None,
        };

        match self.apply_login(outcome) {
            Ok(identity) => {
                info!(target: "lenny_web", "login ok: id={}", identity.id_number);
                self.state = SessionState::LoggedIn(identity.clone());
                Ok(identity)
            }
            Err(err) => {
                warn!(target: "lenny_web", "login failed: {}", err);
                self.state = previous.map_or(SessionState::LoggedOut, SessionState::LoggedIn);
                Err(err)
            }
        }
    }

    pub async fn login<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        display_name: &str,
        id_number: &str,
    ) -> Result<Identity, LoginError> {
        let pending = self.begin_login(display_name, id_number)?;
        let outcome = pending.send(transport).await;
        self.complete_login(outcome)
    }

    fn apply_login(&mut self, outcome: Result<ApiResponse, TransportError>) -> Result<Identity, LoginError> {
        let response = outcome.inspect_err(|e| {
            error!(target: "lenny_web", "login transport error: {}", e);
        })?;
        if !response.is_success() {
            return Err(LoginError::Server(response.error_message()));
        }

        let reply: LoginReply = response
            .decode()
            .map_err(|e| LoginError::Connectivity(format!("invalid login reply: {e}")))?;
        if reply.user.nombre.trim().is_empty() || reply.user.cedula.trim().is_empty() {
            return Err(LoginError::Connectivity("login reply has an empty user".into()));
        }

        let identity = Identity {
            display_name: reply.user.nombre,
            id_number: reply.user.cedula,
        };
        self.persist(&identity)?;
        Ok(identity)
    }

    /// writes both keys or neither: a failed second write puts the first
    /// key back the way it was.
    fn persist(&mut self, identity: &Identity) -> Result<(), StorageError> {
        let prior_name = self.store.get(&self.keys.display_name);
        self.store.set(&self.keys.display_name, &identity.display_name)?;
        if let Err(err) = self.store.set(&self.keys.id_number, &identity.id_number) {
            let rollback = match prior_name {
                Some(prior) => self.store.set(&self.keys.display_name, &prior),
                None => self.store.remove(&self.keys.display_name),
            };
            if let Err(rollback_err) = rollback {
                error!(target: "lenny_web", "session rollback failed: {}", rollback_err);
            }
            return Err(err);
        }
        Ok(())
    }
}
