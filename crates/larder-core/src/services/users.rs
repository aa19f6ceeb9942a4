//! User service.
//!
//! Maps caller identities onto local user records.

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{self, CreateUser, DbPool, User};
use crate::error::{Error, Result};
use crate::middleware::Identity;

/// Service for resolving and registering users.
#[derive(Clone)]
pub struct UserService {
    db: DbPool,
}

impl UserService {
    /// Create a new user service.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// The local user for an identity.
    ///
    /// Returns `None` for anonymous callers and for identities that have not
    /// been stored yet.
    pub async fn get_user_from_identity(&self, identity: Option<&Identity>) -> Result<Option<User>> {
        let Some(identity) = identity else {
            return Ok(None);
        };

        let user = db::get_user_by_token(&self.db, &identity.token_identifier).await?;
        if user.is_none() {
            debug!(token_identifier = %identity.token_identifier, "No user for identity");
        }

        Ok(user)
    }

    /// Return the caller's user, creating it on first call.
    pub async fn store_user(&self, identity: Option<&Identity>) -> Result<User> {
        let identity = identity.ok_or(Error::Unauthenticated)?;

        if let Some(user) = db::get_user_by_token(&self.db, &identity.token_identifier).await? {
            return Ok(user);
        }

        let name = identity
            .name
            .clone()
            .or_else(|| identity.email.clone())
            .unwrap_or_else(|| "Anonymous".to_string());

        let user = db::get_or_create_user(
            &self.db,
            CreateUser {
                id: Uuid::new_v4().to_string(),
                name,
                token_identifier: identity.token_identifier.clone(),
            },
        )
        .await?;

        info!(id = %user.id, name = %user.name, "Stored user");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> UserService {
        let pool = db::init_pool(":memory:").await.unwrap();
        db::initialize_schema(&pool).await.unwrap();
        UserService::new(pool)
    }

    fn identity(name: Option<&str>, email: Option<&str>) -> Identity {
        Identity {
            token_identifier: "https://auth.example.com|user_1".to_string(),
            name: name.map(String::from),
            email: email.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_anonymous_has_no_user() {
        let users = service().await;
        assert!(users.get_user_from_identity(None).await.unwrap().is_none());
        assert!(matches!(
            users.store_user(None).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_store_then_resolve() {
        let users = service().await;
        let id = identity(Some("Ada"), Some("ada@example.com"));

        assert!(users.get_user_from_identity(Some(&id)).await.unwrap().is_none());

        let stored = users.store_user(Some(&id)).await.unwrap();
        assert_eq!(stored.name, "Ada");

        let again = users.store_user(Some(&id)).await.unwrap();
        assert_eq!(again.id, stored.id);

        let resolved = users.get_user_from_identity(Some(&id)).await.unwrap().unwrap();
        assert_eq!(resolved.id, stored.id);
    }

    #[tokio::test]
    async fn test_name_fallbacks() {
        let users = service().await;
        let stored = users
            .store_user(Some(&identity(None, Some("ada@example.com"))))
            .await
            .unwrap();
        assert_eq!(stored.name, "ada@example.com");

        let users = service().await;
        let stored = users.store_user(Some(&identity(None, None))).await.unwrap();
        assert_eq!(stored.name, "Anonymous");
    }
}
