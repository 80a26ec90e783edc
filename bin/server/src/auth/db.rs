//! Database repositories for identities and sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grace_pharmacy_access::{
    ExternalId, IdentityStore, InsertOutcome, LocalUser, Session, SessionId, SessionStore,
    SessionToken,
};
use grace_pharmacy_core::{IdentityId, Result, StoreError};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use crate::db::{corrupt, unavailable};

/// Row type for identity queries.
#[derive(FromRow)]
struct IdentityRow {
    id: String,
    external_id: String,
    display_name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl IdentityRow {
    fn try_into_user(self) -> Result<LocalUser, StoreError> {
        let id = IdentityId::from_str(&self.id)
            .map_err(|e| corrupt(format!("invalid identity id '{}': {e}", self.id)))?;
        Ok(LocalUser::with_all_fields(
            id,
            ExternalId::new(self.external_id),
            self.display_name,
            self.email,
            self.created_at,
        ))
    }
}

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session::with_all_fields(
            SessionId::new(row.id),
            SessionToken::new(ExternalId::new(row.token)),
            row.created_at,
            row.expires_at,
        )
    }
}

/// Repository for local users created from GitHub logins.
pub struct IdentityRepository {
    pool: PgPool,
}

impl IdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for IdentityRepository {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<LocalUser>, StoreError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, display_name, email, created_at
            FROM identities
            WHERE external_id = $1
            "#,
        )
        .bind(external_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    /// Inserts a user; the unique index on `external_id` turns a concurrent
    /// duplicate into a no-op reported as `Conflict`.
    async fn insert(&self, user: &LocalUser) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO identities (id, external_id, display_name, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.external_id().as_str())
        .bind(user.display_name())
        .bind(user.email())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Conflict)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}

/// Repository for session operations.
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, token, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.token().as_str())
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, token, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(Session::from))
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}
