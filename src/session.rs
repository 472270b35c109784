//! The session gate.
//!
//! [`SessionStore`] is the single source of truth for whether the operator is
//! allowed past the PIN gate. It owns the in-memory [`Session`] and is the only
//! writer of the persisted `isAuth` flag in [`LocalStorage`]. The store is an
//! explicit context object: create it with [`SessionStore::init`], hand it to
//! the views that need it, and end it with [`SessionStore::close`].

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::{LocalStorage, StorageError};

/// Local storage key holding the persisted authentication flag.
pub const AUTH_KEY: &str = "isAuth";

/// Message surfaced when a PIN does not match.
pub const WRONG_PIN_MESSAGE: &str = "Pin is wrong";

pub const PIN_LENGTH: usize = 4;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Pin is wrong")]
    InvalidCredential,

    #[error("Local storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// In-memory session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub authenticated: bool,
    pub last_error: Option<String>,
    pub pending: bool,
}

/// The shared access PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Accepts exactly [`PIN_LENGTH`] ASCII digits.
    pub fn parse(pin: &str) -> Result<Self, ConfigError> {
        if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(pin.to_string()))
        } else {
            Err(ConfigError::InvalidPin)
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// How a persisted login is treated when the store starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// A persisted `true` flag authenticates the session without asking for
    /// the PIN again. Trust lasts until logout or until storage is cleared.
    #[default]
    TrustPersistedFlag,
    /// Every start begins unauthenticated.
    RequireLogin,
}

impl RestorePolicy {
    pub fn restore(self, persisted: bool) -> bool {
        match self {
            Self::TrustPersistedFlag => persisted,
            Self::RequireLogin => false,
        }
    }
}

pub struct SessionStore {
    storage: LocalStorage,
    secret: Credential,
    session: Session,
    generation: u64,
}

impl SessionStore {
    /// Build the store from persisted state.
    pub fn init(
        storage: LocalStorage,
        secret: Credential,
        policy: RestorePolicy,
    ) -> Result<Self, SessionError> {
        let persisted = read_flag(&storage)?;
        let authenticated = policy.restore(persisted);
        if persisted && !authenticated {
            tracing::info!("Ignoring persisted login, restore policy requires a fresh PIN");
        } else if authenticated {
            tracing::debug!("Restored authenticated session from local storage");
        }

        Ok(Self {
            storage,
            secret,
            session: Session {
                authenticated,
                ..Session::default()
            },
            generation: 0,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    /// Changes on every login or logout. A login attempt that started under an
    /// older generation is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check `candidate` against the configured PIN.
    ///
    /// On success the session becomes authenticated and the flag is persisted.
    /// On failure the session becomes unauthenticated, the persisted flag is
    /// removed, `last_error` is set and [`SessionError::InvalidCredential`] is
    /// returned; callers must not navigate in that case.
    pub async fn login(&mut self, candidate: &str) -> Result<(), SessionError> {
        self.session.pending = true;
        self.session.last_error = None;

        let accepted = self.secret.matches(candidate);
        let result = if accepted {
            self.accept()
        } else {
            self.reject()
        };

        self.session.pending = false;
        self.generation += 1;
        result
    }

    fn accept(&mut self) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(&true).unwrap_or_else(|_| "true".to_string());
        self.storage.set_item(AUTH_KEY, &encoded)?;
        self.session.authenticated = true;
        tracing::info!("Login accepted");
        Ok(())
    }

    fn reject(&mut self) -> Result<(), SessionError> {
        self.session.authenticated = false;
        self.session.last_error = Some(WRONG_PIN_MESSAGE.to_string());
        tracing::warn!("Login rejected: wrong PIN");
        self.storage.remove_item(AUTH_KEY)?;
        Err(SessionError::InvalidCredential)
    }

    /// End the session. Calling it on a logged-out session changes nothing.
    ///
    /// The in-memory session is always logged out; a storage failure is
    /// reported afterwards.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let was_authenticated = self.session.authenticated;
        self.session.authenticated = false;
        self.session.pending = false;
        if was_authenticated {
            self.generation += 1;
            tracing::info!("Logged out");
        }
        self.storage.remove_item(AUTH_KEY)?;
        Ok(())
    }

    /// Release the store, returning the storage handle. The persisted flag is
    /// left as it is.
    pub fn close(self) -> LocalStorage {
        tracing::debug!(
            authenticated = self.session.authenticated,
            "Closing session store"
        );
        self.storage
    }
}

/// Read the persisted flag. Anything other than a JSON `true` counts as
/// logged out.
fn read_flag(storage: &LocalStorage) -> Result<bool, StorageError> {
    let Some(raw) = storage.get_item(AUTH_KEY)? else {
        return Ok(false);
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Bool(flag)) => Ok(flag),
        Ok(_) => Ok(false),
        Err(e) => {
            tracing::warn!("Ignoring unparsable {} value {:?}: {}", AUTH_KEY, raw, e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> LocalStorage {
        let storage = LocalStorage::open_memory().unwrap();
        storage.migrate().unwrap();
        storage
    }

    #[test]
    fn credential_accepts_only_four_digits() {
        assert!(Credential::parse("5434").is_ok());
        assert!(Credential::parse("543").is_err());
        assert!(Credential::parse("54345").is_err());
        assert!(Credential::parse("54a4").is_err());
        assert!(Credential::parse("٥٤٣٤").is_err());
    }

    #[test]
    fn credential_debug_hides_the_pin() {
        let credential = Credential::parse("5434").unwrap();
        assert!(!format!("{credential:?}").contains("5434"));
    }

    #[test]
    fn restore_policy_decides_persisted_trust() {
        assert!(RestorePolicy::TrustPersistedFlag.restore(true));
        assert!(!RestorePolicy::TrustPersistedFlag.restore(false));
        assert!(!RestorePolicy::RequireLogin.restore(true));
    }

    #[test]
    fn read_flag_accepts_only_json_true() {
        let storage = storage();
        for (raw, expected) in [
            ("true", true),
            ("false", false),
            ("1", false),
            ("\"true\"", false),
            ("not json", false),
        ] {
            storage.set_item(AUTH_KEY, raw).unwrap();
            assert_eq!(read_flag(&storage).unwrap(), expected, "{raw}");
        }
    }

    #[tokio::test]
    async fn generation_advances_on_transitions() {
        let mut store = SessionStore::init(
            storage(),
            Credential::parse("5434").unwrap(),
            RestorePolicy::default(),
        )
        .unwrap();
        assert_eq!(store.generation(), 0);

        store.login("5434").await.unwrap();
        assert_eq!(store.generation(), 1);

        store.logout().unwrap();
        assert_eq!(store.generation(), 2);

        store.logout().unwrap();
        assert_eq!(store.generation(), 2);
    }
}
