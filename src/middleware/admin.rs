//! Administrator check middleware.
//!
//! Identity is owned by the user-management service; callers identify
//! themselves with the `X-Admin-Id` header and the renter lookup decides
//! whether that user holds the admin role.

use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the caller's user id.
pub const ADMIN_HEADER: &str = "X-Admin-Id";

/// Context attached to requests that passed the admin check.
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// User id of the administrator making the request
    pub renter_id: Uuid,
}

/// Reject the request unless `X-Admin-Id` names an administrator.
///
/// # Flow
///
/// 1. Read and parse the `X-Admin-Id` header as a UUID
/// 2. Look the user up
/// 3. If found and admin: inject `AdminContext`, call next handler
/// 4. Otherwise: return 401 Unauthorized
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let renter_id = request
        .headers()
        .get(ADMIN_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or(AppError::AdminRequired)?;

    let renter = state
        .booking
        .renters
        .get(renter_id)
        .await?
        .filter(|renter| renter.is_admin())
        .ok_or_else(|| {
            tracing::warn!(%renter_id, "non-admin caller refused");
            AppError::AdminRequired
        })?;

    request.extensions_mut().insert(AdminContext {
        renter_id: renter.id,
    });

    Ok(next.run(request).await)
}
