//! Access/refresh token pair issuance and persistence

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error};

use super::codec::{ClaimsCodec, TokenError};
use super::models::{Claims, Subject, TokenPair};
use crate::store::{IdentityField, IdentityStore, StoreError, TokenUpdate};

pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 365;

/// Mints token pairs and records the latest pair on the identity.
///
/// Issuing and persisting are separate steps. Tokens handed out before a
/// newer pair was persisted stay valid until their own `exp`.
#[derive(Clone)]
pub struct TokenPairManager {
    codec: Arc<ClaimsCodec>,
    store: Arc<dyn IdentityStore>,
}

impl TokenPairManager {
    pub fn new(codec: Arc<ClaimsCodec>, store: Arc<dyn IdentityStore>) -> Self {
        Self { codec, store }
    }

    pub fn issue_pair(&self, subject: &Subject) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(subject, Utc::now())
    }

    pub fn issue_pair_at(
        &self,
        subject: &Subject,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let access = Claims {
            uid: subject.id.clone(),
            email: subject.email.clone(),
            first_name: subject.first_name.clone(),
            role: Some(subject.role),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ACCESS_TOKEN_TTL_HOURS)).timestamp(),
        };

        let refresh = Claims {
            uid: String::new(),
            email: String::new(),
            first_name: String::new(),
            role: None,
            iat: now.timestamp(),
            exp: (now + Duration::days(REFRESH_TOKEN_TTL_DAYS)).timestamp(),
        };

        let pair = TokenPair {
            access_token: self.codec.sign(&access)?,
            refresh_token: self.codec.sign(&refresh)?,
        };

        debug!(user_id = %subject.id, role = %subject.role, "Issued token pair");
        Ok(pair)
    }

    pub async fn persist_pair(&self, identity_id: &str, pair: &TokenPair) -> Result<(), StoreError> {
        let update = TokenUpdate {
            token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            updated_at: Utc::now(),
        };

        self.store
            .upsert_by_field(IdentityField::IdentityId, identity_id, &update)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %identity_id, "Failed to persist token pair");
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::store::sqlite::tests::{identity, memory_store};

    fn subject() -> Subject {
        Subject {
            id: "U_1".to_string(),
            email: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            role: Role::Admin,
        }
    }

    async fn manager() -> (TokenPairManager, Arc<ClaimsCodec>, Arc<dyn IdentityStore>) {
        let codec = Arc::new(ClaimsCodec::from_secret(b"pair_secret"));
        let store: Arc<dyn IdentityStore> = Arc::new(memory_store().await);
        (
            TokenPairManager::new(codec.clone(), store.clone()),
            codec,
            store,
        )
    }

    #[tokio::test]
    async fn test_access_token_carries_subject() {
        let (manager, codec, _) = manager().await;
        let now = Utc::now();
        let pair = manager.issue_pair_at(&subject(), now).unwrap();

        let claims = codec.parse_and_verify(&pair.access_token).unwrap();
        assert_eq!(claims.uid, "U_1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.first_name, "Ada");
        assert_eq!(claims.role, Some(Role::Admin));
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_HOURS * 3600);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_refresh_token_has_empty_subject() {
        let (manager, codec, _) = manager().await;
        let pair = manager.issue_pair_at(&subject(), Utc::now()).unwrap();

        let claims = codec.parse_and_verify(&pair.refresh_token).unwrap();
        assert!(claims.uid.is_empty());
        assert!(claims.email.is_empty());
        assert!(claims.first_name.is_empty());
        assert_eq!(claims.role, None);
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_DAYS * 86_400);
    }

    #[tokio::test]
    async fn test_persist_pair_overwrites_previous_tokens() {
        let (manager, _, store) = manager().await;
        store
            .insert(&identity("U_1", "a@x.com", "5550001"))
            .await
            .unwrap();

        let first = manager.issue_pair_at(&subject(), Utc::now()).unwrap();
        manager.persist_pair("U_1", &first).await.unwrap();

        let second = manager
            .issue_pair_at(&subject(), Utc::now() + Duration::seconds(1))
            .unwrap();
        assert_ne!(first, second);
        manager.persist_pair("U_1", &second).await.unwrap();

        let stored = store
            .find_one_by_field(IdentityField::IdentityId, "U_1")
            .await
            .unwrap();
        assert_eq!(stored.token.as_deref(), Some(second.access_token.as_str()));
        assert_eq!(
            stored.refresh_token.as_deref(),
            Some(second.refresh_token.as_str())
        );
    }

    #[tokio::test]
    async fn test_older_pair_stays_valid_after_overwrite() {
        let (manager, codec, _) = manager().await;
        let old = manager.issue_pair_at(&subject(), Utc::now()).unwrap();
        let _new = manager
            .issue_pair_at(&subject(), Utc::now() + Duration::seconds(1))
            .unwrap();

        // No revocation: the earlier access token still verifies
        assert!(codec.parse_and_verify(&old.access_token).is_ok());
    }
}
