//! Postgres-backed renter lookup.

use async_trait::async_trait;
use uuid::Uuid;

use super::RenterLookup;
use crate::{db::DbPool, error::AppError, models::renter::Renter};

#[derive(Debug, Clone)]
pub struct RenterRepository {
    pool: DbPool,
}

impl RenterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RenterLookup for RenterRepository {
    async fn get(&self, renter_id: Uuid) -> Result<Option<Renter>, AppError> {
        let renter = sqlx::query_as::<_, Renter>(
            "SELECT id, name, last_name, email, role FROM users WHERE id = $1",
        )
        .bind(renter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(renter)
    }
}
