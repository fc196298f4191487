//! Signup and login orchestration

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::codec::TokenError;
use super::models::{Identity, LoginRequest, SignupRequest, Subject};
use super::password::{CredentialHasher, HashError};
use super::tokens::TokenPairManager;
use crate::common::{generate_identity_id, safe_email_log};
use crate::store::{IdentityField, IdentityStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Email already in use. Please enter a different email or login using the already signed email.")]
    DuplicateEmail,

    #[error("Phone already in use. Please enter a different phone number.")]
    DuplicatePhone,

    #[error("Email or password is incorrect.")]
    InvalidCredentials,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(IdentityField::Email) => AccountError::DuplicateEmail,
            StoreError::Duplicate(IdentityField::Phone) => AccountError::DuplicatePhone,
            other => AccountError::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn IdentityStore>,
    hasher: CredentialHasher,
    tokens: TokenPairManager,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: CredentialHasher,
        tokens: TokenPairManager,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a new identity and return its id.
    ///
    /// The initial token pair is written with the record in a single insert.
    pub async fn signup(&self, request: SignupRequest) -> Result<String, AccountError> {
        if self
            .store
            .count_by_field(IdentityField::Email, &request.email)
            .await?
            != 0
        {
            warn!(email = %safe_email_log(&request.email), "Signup rejected: email already in use");
            return Err(AccountError::DuplicateEmail);
        }

        if self
            .store
            .count_by_field(IdentityField::Phone, &request.phone)
            .await?
            != 0
        {
            warn!(email = %safe_email_log(&request.email), "Signup rejected: phone already in use");
            return Err(AccountError::DuplicatePhone);
        }

        let password_hash = self.hash_secret(request.password).await?;

        let now = Utc::now();
        let user_id = generate_identity_id();
        let subject = Subject {
            id: user_id.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            role: request.role,
        };
        let pair = self.tokens.issue_pair_at(&subject, now)?;

        let identity = Identity {
            user_id,
            email: request.email,
            phone: request.phone,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.role,
            token: Some(pair.access_token),
            refresh_token: Some(pair.refresh_token),
            created_at: now,
            updated_at: now,
        };

        let id = self.store.insert(&identity).await?;
        info!(
            user_id = %id,
            email = %safe_email_log(&identity.email),
            role = %identity.role,
            "New identity registered"
        );
        Ok(id)
    }

    /// Verify credentials, then issue and persist a fresh token pair.
    ///
    /// If the pair cannot be persisted the request fails and the minted
    /// tokens are dropped without reaching the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<Identity, AccountError> {
        let identity = match self
            .store
            .find_one_by_field(IdentityField::Email, &request.email)
            .await
        {
            Ok(identity) => identity,
            Err(StoreError::NotFound) => {
                warn!(email = %safe_email_log(&request.email), "Login rejected: unknown email");
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !self
            .verify_secret(request.password, identity.password_hash.clone())
            .await?
        {
            warn!(user_id = %identity.user_id, "Login rejected: credential mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        let pair = self.tokens.issue_pair(&Subject::from(&identity))?;
        self.tokens.persist_pair(&identity.user_id, &pair).await?;

        let refreshed = self
            .store
            .find_one_by_field(IdentityField::IdentityId, &identity.user_id)
            .await?;

        info!(
            user_id = %refreshed.user_id,
            email = %safe_email_log(&refreshed.email),
            "Login successful, token pair rotated"
        );
        Ok(refreshed)
    }

    async fn hash_secret(&self, secret: String) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| {
                error!(error = %e, "Credential hashing task failed");
                AccountError::Task(e.to_string())
            })??;
        Ok(hashed)
    }

    async fn verify_secret(&self, candidate: String, hashed: String) -> Result<bool, AccountError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&candidate, &hashed))
            .await
            .map_err(|e| {
                error!(error = %e, "Credential verification task failed");
                AccountError::Task(e.to_string())
            })
    }
}
