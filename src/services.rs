//! Collaborators shared by every request descriptor.
//!
//! warden defines only the narrow contracts descriptors program against.
//! Token verification, user storage and persistence live in the
//! application; [`memory`] has in-process stand-ins for demos and tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::failure::BoxError;

/// Decoded token payload.
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// Verifies and decodes access tokens.
#[async_trait]
pub trait TokenManager: Send + Sync {
    async fn decode(&self, token: &str) -> Result<Claims, BoxError>;
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub identifier: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Looks users up by the identifier a token names.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, BoxError>;
}

/// Read access to persisted entities.
#[async_trait]
pub trait Session: Send + Sync {
    async fn find(&self, entity: &str, id: &str) -> Result<Option<serde_json::Value>, BoxError>;
}

/// The application-lifetime collaborators, shared across requests.
#[derive(Clone)]
pub struct Services {
    pub tokens: Arc<dyn TokenManager>,
    pub users: Arc<dyn UserLookup>,
    pub session: Arc<dyn Session>,
}

impl Services {
    pub fn new(
        tokens: impl TokenManager + 'static,
        users: impl UserLookup + 'static,
        session: impl Session + 'static,
    ) -> Self {
        Self { tokens: Arc::new(tokens), users: Arc::new(users), session: Arc::new(session) }
    }
}

pub mod memory {
    //! In-memory collaborators.

    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::{Claims, Session, TokenManager, User, UserLookup};
    use crate::failure::BoxError;

    /// Accepts a fixed set of opaque tokens.
    #[derive(Debug, Default)]
    pub struct StaticTokens(HashMap<String, Claims>);

    impl StaticTokens {
        /// Registers `token` as valid, decoding to `{"sub": subject}`.
        pub fn with(mut self, token: &str, subject: &str) -> Self {
            let mut claims = Claims::new();
            claims.insert("sub".to_owned(), subject.into());
            self.0.insert(token.to_owned(), claims);
            self
        }
    }

    #[async_trait]
    impl TokenManager for StaticTokens {
        async fn decode(&self, token: &str) -> Result<Claims, BoxError> {
            self.0.get(token).cloned().ok_or_else(|| "unknown token".into())
        }
    }

    #[derive(Debug, Default)]
    pub struct MemoryUsers(HashMap<String, User>);

    impl MemoryUsers {
        pub fn with(mut self, user: User) -> Self {
            self.0.insert(user.identifier.clone(), user);
            self
        }
    }

    #[async_trait]
    impl UserLookup for MemoryUsers {
        async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, BoxError> {
            Ok(self.0.get(identifier).cloned())
        }
    }

    /// Entities keyed by `(entity, id)`.
    #[derive(Debug, Default)]
    pub struct MemorySession(HashMap<(String, String), serde_json::Value>);

    impl MemorySession {
        pub fn with(mut self, entity: &str, id: &str, value: serde_json::Value) -> Self {
            self.0.insert((entity.to_owned(), id.to_owned()), value);
            self
        }
    }

    #[async_trait]
    impl Session for MemorySession {
        async fn find(&self, entity: &str, id: &str) -> Result<Option<serde_json::Value>, BoxError> {
            Ok(self.0.get(&(entity.to_owned(), id.to_owned())).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::memory::*;
    use super::*;

    #[tokio::test]
    async fn memory_collaborators() {
        let tokens = StaticTokens::default().with("t-1", "alice");
        assert_eq!(tokens.decode("t-1").await.unwrap()["sub"], "alice");
        assert!(tokens.decode("t-2").await.is_err());

        let alice = User { id: "1".into(), identifier: "alice".into(), roles: vec!["admin".into()] };
        let users = MemoryUsers::default().with(alice.clone());
        assert_eq!(users.find_by_identifier("alice").await.unwrap(), Some(alice));
        assert_eq!(users.find_by_identifier("bob").await.unwrap(), None);

        let session = MemorySession::default().with("widget", "42", json!({"name": "sprocket"}));
        assert!(session.find("widget", "42").await.unwrap().is_some());
        assert!(session.find("widget", "43").await.unwrap().is_none());
    }
}
