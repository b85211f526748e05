//! Session store: persisted token and user record
//!
//! The session lives under two storage keys. Either both are present and
//! well-formed, or the session is absent; a half-written or corrupt record is
//! wiped on load.

use tracing::{debug, warn};

use shared::UserProfile;

use crate::error::CollectorResult;
use crate::traits::SessionStorage;
use crate::types::Session;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

pub struct SessionStore<S: SessionStorage> {
    storage: S,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the persisted session.
    ///
    /// Returns `None` when nothing is stored. A record with only one key, an
    /// empty token or a user that doesn't parse is cleared and also yields
    /// `None`.
    pub fn load(&self) -> CollectorResult<Option<Session>> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => match serde_json::from_str::<UserProfile>(&user) {
                Ok(user) if !token.trim().is_empty() => Ok(Some(Session {
                    token: token.trim().to_string(),
                    user,
                })),
                Ok(_) => {
                    warn!("Stored session has an empty token, clearing it");
                    self.clear()?;
                    Ok(None)
                }
                Err(e) => {
                    warn!(error = %e, "Stored user record is malformed, clearing session");
                    self.clear()?;
                    Ok(None)
                }
            },
            _ => {
                warn!("Stored session is incomplete, clearing it");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Persist both keys
    pub fn save(&self, session: &Session) -> CollectorResult<()> {
        let user = serde_json::to_string(&session.user)?;
        self.storage.set(TOKEN_KEY, &session.token)?;
        self.storage.set(USER_KEY, &user)?;
        debug!(user = %session.user.username, role = %session.user.role, "Session saved");
        Ok(())
    }

    /// Replace the stored user record, keeping the token
    pub fn update_user(&self, user: &UserProfile) -> CollectorResult<()> {
        self.storage.set(USER_KEY, &serde_json::to_string(user)?)
    }

    pub fn clear(&self) -> CollectorResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        debug!("Session cleared");
        Ok(())
    }

    pub fn token(&self) -> CollectorResult<Option<String>> {
        Ok(self.load()?.map(|session| session.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemorySessionStorage;
    use crate::traits::MockSessionStorage;
    use shared::Role;

    fn owner() -> UserProfile {
        UserProfile {
            id: 1,
            username: "mama-joe".into(),
            email: "owner@farm.test".into(),
            role: Role::Owner,
        }
    }

    #[test]
    fn test_save_then_load() {
        let store = SessionStore::new(MemorySessionStorage::new());
        let session = Session {
            token: "abc".into(),
            user: owner(),
        };

        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));
        assert_eq!(store.token().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_corrupted_user_clears_both_keys() {
        let store = SessionStore::new(MemorySessionStorage::with_values([("token", "abc"), ("user", "{not json")]));

        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.storage().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_partial_record_is_cleared() {
        let store = SessionStore::new(MemorySessionStorage::with_values([("token", "abc")]));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);

        let user = serde_json::to_string(&owner()).unwrap();
        let store = SessionStore::new(MemorySessionStorage::with_values([("user", user.as_str())]));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.storage().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_update_user_keeps_token() {
        let store = SessionStore::new(MemorySessionStorage::new());
        store
            .save(&Session {
                token: "abc".into(),
                user: owner(),
            })
            .unwrap();

        let mut renamed = owner();
        renamed.username = "joe".into();
        store.update_user(&renamed).unwrap();

        let session = store.load().unwrap().unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user.username, "joe");
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let mut storage = MockSessionStorage::new();
        storage
            .expect_remove()
            .withf(|key| key == TOKEN_KEY)
            .times(1)
            .returning(|_| Ok(()));
        storage
            .expect_remove()
            .withf(|key| key == USER_KEY)
            .times(1)
            .returning(|_| Ok(()));

        SessionStore::new(storage).clear().unwrap();
    }
}
