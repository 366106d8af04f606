//! Renter (platform user) model.
//!
//! Registration and login live in the user-management service. Here a
//! renter is only read to fill in PIX payer data, to label reservation
//! views, and to recognise administrators.

use uuid::Uuid;

/// Role stored in the `users.role` column.
pub const ADMIN_ROLE: &str = "admin";

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. The password hash column is never selected.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Renter {
    pub id: Uuid,
    pub name: String,
    pub last_name: String,
    pub email: String,

    /// Either `customer` or `admin`
    pub role: String,
}

impl Renter {
    /// Whether this user may list every reservation.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}
