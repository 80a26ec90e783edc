//! Database repository for patient users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grace_pharmacy_core::{Result, StoreError, UserId};
use grace_pharmacy_records::{AgeGroup, Gender, Patient, PatientChanges, PatientStore};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::{corrupt, unavailable};

/// Row type for patient queries.
#[derive(FromRow)]
struct PatientRow {
    id: String,
    patient_name: String,
    company: String,
    position: String,
    gender: String,
    age_group: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl PatientRow {
    fn try_into_patient(self) -> Result<Patient, StoreError> {
        let id = UserId::from_str(&self.id)
            .map_err(|e| corrupt(format!("invalid user id '{}': {e}", self.id)))?;
        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(|_| corrupt(format!("user '{}' has gender '{}'", self.id, self.gender)))?;
        let age_group = self.age_group.parse::<AgeGroup>().map_err(|_| {
            corrupt(format!(
                "user '{}' has age group '{}'",
                self.id, self.age_group
            ))
        })?;

        Ok(Patient {
            id,
            patient_name: self.patient_name,
            company: self.company,
            position: self.position,
            gender,
            age_group,
            email: self.email,
            created_at: self.created_at,
        })
    }
}

/// Repository for patient users.
pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientStore for PatientRepository {
    async fn list(&self) -> Result<Vec<Patient>, StoreError> {
        let rows: Vec<PatientRow> = sqlx::query_as(
            r#"
            SELECT id, patient_name, company, position, gender, age_group, email, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(PatientRow::try_into_patient).collect()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Patient>, StoreError> {
        let row: Option<PatientRow> = sqlx::query_as(
            r#"
            SELECT id, patient_name, company, position, gender, age_group, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(PatientRow::try_into_patient).transpose()
    }

    async fn email_taken(
        &self,
        email: &str,
        excluding: Option<UserId>,
    ) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::TEXT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(excluding.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(taken)
    }

    async fn insert(&self, patient: &Patient) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, patient_name, company, position, gender, age_group, email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(patient.id.to_string())
        .bind(&patient.patient_name)
        .bind(&patient.company)
        .bind(&patient.position)
        .bind(patient.gender.as_str())
        .bind(patient.age_group.as_str())
        .bind(&patient.email)
        .bind(patient.created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn update(&self, id: UserId, changes: &PatientChanges) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET patient_name = COALESCE($2, patient_name),
                company = COALESCE($3, company),
                position = COALESCE($4, position),
                gender = COALESCE($5, gender),
                age_group = COALESCE($6, age_group),
                email = COALESCE($7, email)
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(changes.patient_name.as_deref())
        .bind(changes.company.as_deref())
        .bind(changes.position.as_deref())
        .bind(changes.gender.map(|g| g.as_str()))
        .bind(changes.age_group.map(|a| a.as_str()))
        .bind(changes.email.as_deref())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() > 0)
    }
}
