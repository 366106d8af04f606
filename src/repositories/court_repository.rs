//! Postgres-backed court lookup.

use async_trait::async_trait;
use uuid::Uuid;

use super::CourtLookup;
use crate::{db::DbPool, error::AppError, models::court::Court};

#[derive(Debug, Clone)]
pub struct CourtRepository {
    pool: DbPool,
}

impl CourtRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourtLookup for CourtRepository {
    async fn get(&self, court_id: Uuid) -> Result<Option<Court>, AppError> {
        let court = sqlx::query_as::<_, Court>(
            r#"
            SELECT id, name, primary_sport, hourly_rate,
                   opening_hour, closing_hour, image_url, created_at
            FROM courts
            WHERE id = $1
            "#,
        )
        .bind(court_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(court)
    }

    async fn list(&self) -> Result<Vec<Court>, AppError> {
        let courts = sqlx::query_as::<_, Court>(
            r#"
            SELECT id, name, primary_sport, hourly_rate,
                   opening_hour, closing_hour, image_url, created_at
            FROM courts
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(courts)
    }
}
