//! Database repository for medical profiles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grace_pharmacy_core::{ProfileId, Result, StoreError};
use grace_pharmacy_records::{Profile, ProfileChanges, ProfileStore};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::{corrupt, unavailable};

#[derive(FromRow)]
struct ProfileRow {
    id: String,
    chronic_medication: String,
    allergies: String,
    next_of_kin: String,
    phone_number: String,
    created_at: DateTime<Utc>,
}

impl ProfileRow {
    fn try_into_profile(self) -> Result<Profile, StoreError> {
        let id = ProfileId::from_str(&self.id)
            .map_err(|e| corrupt(format!("invalid profile id '{}': {e}", self.id)))?;
        Ok(Profile {
            id,
            chronic_medication: self.chronic_medication,
            allergies: self.allergies,
            next_of_kin: self.next_of_kin,
            phone_number: self.phone_number,
            created_at: self.created_at,
        })
    }
}

/// Repository for medical profiles.
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn list(&self) -> Result<Vec<Profile>, StoreError> {
        let rows: Vec<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, chronic_medication, allergies, next_of_kin, phone_number, created_at
            FROM profiles
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(ProfileRow::try_into_profile).collect()
    }

    async fn find_by_id(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, chronic_medication, allergies, next_of_kin, phone_number, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(ProfileRow::try_into_profile).transpose()
    }

    async fn insert(&self, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, chronic_medication, allergies, next_of_kin, phone_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.chronic_medication)
        .bind(&profile.allergies)
        .bind(&profile.next_of_kin)
        .bind(&profile.phone_number)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn update(&self, id: ProfileId, changes: &ProfileChanges) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET chronic_medication = COALESCE($2, chronic_medication),
                allergies = COALESCE($3, allergies),
                next_of_kin = COALESCE($4, next_of_kin),
                phone_number = COALESCE($5, phone_number)
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(changes.chronic_medication.as_deref())
        .bind(changes.allergies.as_deref())
        .bind(changes.next_of_kin.as_deref())
        .bind(changes.phone_number.as_deref())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ProfileId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }
}
