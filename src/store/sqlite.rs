//! SQLite-backed identity store

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::future::Future;
use std::time::Duration;
use tracing::error;

use super::{IdentityField, IdentityStore, StoreError, TokenUpdate};
use crate::auth::models::Identity;
use crate::common::generate_identity_id;

/// Only rows written by signup carry a credential; bare token rows are skipped.
const MATERIALIZED: &str = "password_hash IS NOT NULL";

#[derive(Clone)]
pub struct SqliteIdentityStore {
    db: SqlitePool,
    timeout: Duration,
}

impl SqliteIdentityStore {
    pub fn new(db: SqlitePool, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(operation = op, timeout = ?self.timeout, "Identity store operation timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            let field = if message.contains("users.phone") {
                IdentityField::Phone
            } else if message.contains("users.email") {
                IdentityField::Email
            } else {
                IdentityField::IdentityId
            };
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn count_by_field(&self, field: IdentityField, value: &str) -> Result<i64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM users WHERE {} = ? AND {}",
            field.column(),
            MATERIALIZED
        );
        self.bounded("count_by_field", async {
            let count = sqlx::query_scalar::<_, i64>(&sql)
                .bind(value)
                .fetch_one(&self.db)
                .await?;
            Ok::<_, StoreError>(count)
        })
        .await
    }

    async fn find_one_by_field(
        &self,
        field: IdentityField,
        value: &str,
    ) -> Result<Identity, StoreError> {
        let sql = format!(
            "SELECT * FROM users WHERE {} = ? AND {} LIMIT 1",
            field.column(),
            MATERIALIZED
        );
        self.bounded("find_one_by_field", async {
            sqlx::query_as::<_, Identity>(&sql)
                .bind(value)
                .fetch_optional(&self.db)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn upsert_by_field(
        &self,
        field: IdentityField,
        value: &str,
        update: &TokenUpdate,
    ) -> Result<(), StoreError> {
        let (user_id, email, phone) = match field {
            IdentityField::IdentityId => (value.to_string(), None, None),
            IdentityField::Email => (generate_identity_id(), Some(value), None),
            IdentityField::Phone => (generate_identity_id(), None, Some(value)),
        };

        let sql = format!(
            "INSERT INTO users (user_id, email, phone, token, refresh_token, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT({}) DO UPDATE SET \
                 token = excluded.token, \
                 refresh_token = excluded.refresh_token, \
                 updated_at = excluded.updated_at",
            field.column()
        );

        self.bounded("upsert_by_field", async {
            sqlx::query(&sql)
                .bind(&user_id)
                .bind(email)
                .bind(phone)
                .bind(&update.token)
                .bind(&update.refresh_token)
                .bind(update.updated_at)
                .bind(update.updated_at)
                .execute(&self.db)
                .await
                .map_err(map_write_error)?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn insert(&self, identity: &Identity) -> Result<String, StoreError> {
        self.bounded("insert", async {
            sqlx::query(
                "INSERT INTO users (user_id, email, phone, password_hash, first_name, last_name, role, token, refresh_token, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&identity.user_id)
            .bind(&identity.email)
            .bind(&identity.phone)
            .bind(&identity.password_hash)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(identity.role)
            .bind(&identity.token)
            .bind(&identity.refresh_token)
            .bind(identity.created_at)
            .bind(identity.updated_at)
            .execute(&self.db)
            .await
            .map_err(map_write_error)?;
            Ok::<_, StoreError>(identity.user_id.clone())
        })
        .await
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Identity>, StoreError> {
        let sql = format!(
            "SELECT * FROM users WHERE {} ORDER BY created_at ASC, user_id ASC LIMIT ? OFFSET ?",
            MATERIALIZED
        );
        self.bounded("list", async {
            let rows = sqlx::query_as::<_, Identity>(&sql)
                .bind(limit)
                .bind(skip)
                .fetch_all(&self.db)
                .await?;
            Ok::<_, StoreError>(rows)
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::common::migrations::run_migrations;
    use chrono::{Duration as ChronoDuration, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        run_migrations(&pool, false).await.expect("migrations");
        pool
    }

    pub(crate) async fn memory_store() -> SqliteIdentityStore {
        SqliteIdentityStore::new(memory_pool().await, Duration::from_secs(5))
    }

    pub(crate) fn identity(id: &str, email: &str, phone: &str) -> Identity {
        let now = Utc::now();
        Identity {
            user_id: id.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::User,
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_then_find_by_each_field() {
        let store = memory_store().await;
        let id = store
            .insert(&identity("U_1", "a@x.com", "5550001"))
            .await
            .unwrap();
        assert_eq!(id, "U_1");

        for (field, value) in [
            (IdentityField::IdentityId, "U_1"),
            (IdentityField::Email, "a@x.com"),
            (IdentityField::Phone, "5550001"),
        ] {
            let found = store.find_one_by_field(field, value).await.unwrap();
            assert_eq!(found.user_id, "U_1");
            assert_eq!(found.role, Role::User);
        }
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let store = memory_store().await;
        let err = store
            .find_one_by_field(IdentityField::Email, "nobody@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_count_by_field() {
        let store = memory_store().await;
        assert_eq!(
            store.count_by_field(IdentityField::Email, "a@x.com").await.unwrap(),
            0
        );
        store
            .insert(&identity("U_1", "a@x.com", "5550001"))
            .await
            .unwrap();
        assert_eq!(
            store.count_by_field(IdentityField::Email, "a@x.com").await.unwrap(),
            1
        );
        assert_eq!(
            store.count_by_field(IdentityField::Phone, "5550002").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_unique_constraints_report_field() {
        let store = memory_store().await;
        store
            .insert(&identity("U_1", "a@x.com", "5550001"))
            .await
            .unwrap();

        let err = store
            .insert(&identity("U_2", "a@x.com", "5550002"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(IdentityField::Email)));

        let err = store
            .insert(&identity("U_3", "b@x.com", "5550001"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(IdentityField::Phone)));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_token_fields() {
        let store = memory_store().await;
        store
            .insert(&identity("U_1", "a@x.com", "5550001"))
            .await
            .unwrap();

        let later = Utc::now() + ChronoDuration::seconds(5);
        let update = TokenUpdate {
            token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            updated_at: later,
        };
        store
            .upsert_by_field(IdentityField::IdentityId, "U_1", &update)
            .await
            .unwrap();

        let found = store
            .find_one_by_field(IdentityField::IdentityId, "U_1")
            .await
            .unwrap();
        assert_eq!(found.token.as_deref(), Some("access"));
        assert_eq!(found.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(found.updated_at.timestamp(), later.timestamp());
        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_upsert_tolerates_missing_record() {
        let store = memory_store().await;
        let update = TokenUpdate {
            token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            updated_at: Utc::now(),
        };
        store
            .upsert_by_field(IdentityField::IdentityId, "U_GHOST", &update)
            .await
            .unwrap();

        // The bare row is neither counted nor found
        assert_eq!(
            store
                .count_by_field(IdentityField::IdentityId, "U_GHOST")
                .await
                .unwrap(),
            0
        );
        assert!(matches!(
            store
                .find_one_by_field(IdentityField::IdentityId, "U_GHOST")
                .await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_bare_email_row_counts_and_finds_consistently() {
        let store = memory_store().await;
        let update = TokenUpdate {
            token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            updated_at: Utc::now(),
        };
        store
            .upsert_by_field(IdentityField::Email, "g@x.com", &update)
            .await
            .unwrap();

        assert_eq!(
            store.count_by_field(IdentityField::Email, "g@x.com").await.unwrap(),
            0
        );
        assert!(matches!(
            store.find_one_by_field(IdentityField::Email, "g@x.com").await,
            Err(StoreError::NotFound)
        ));

        // The unique index still guards the address
        let err = store
            .insert(&identity("U_1", "g@x.com", "5550001"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(IdentityField::Email)));
    }

    #[tokio::test]
    async fn test_list_paginates_in_creation_order() {
        let store = memory_store().await;
        let base = Utc::now();
        for i in 0..5 {
            let mut record = identity(
                &format!("U_{}", i),
                &format!("{}@x.com", i),
                &format!("555000{}", i),
            );
            record.created_at = base + ChronoDuration::seconds(i);
            store.insert(&record).await.unwrap();
        }

        let first = store.list(0, 2).await.unwrap();
        let ids: Vec<_> = first.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["U_0", "U_1"]);

        let last = store.list(4, 2).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].user_id, "U_4");
    }

    #[tokio::test]
    async fn test_slow_operation_times_out() {
        let store = SqliteIdentityStore::new(memory_pool().await, Duration::from_millis(10));
        let result: Result<(), StoreError> = store
            .bounded("sleep", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }
}
