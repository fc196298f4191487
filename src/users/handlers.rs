// src/users/handlers.rs

use axum::extract::{Extension, Json, Path, Query};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::access::{require_owner_or_admin, require_role};
use crate::auth::models::{Identity, Role};
use crate::auth::AuthContext;
use crate::common::{ApiError, AppState};
use crate::store::IdentityField;

pub const DEFAULT_RECORDS_PER_PAGE: i64 = 10;

/// Raw paging parameters; anything unparsable or below 1 falls back to the default
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(rename = "recordPerPage")]
    pub record_per_page: Option<String>,
    pub page: Option<String>,
}

impl PageQuery {
    /// Returns `(skip, limit)`
    pub fn window(&self) -> (i64, i64) {
        let limit = parse_positive(self.record_per_page.as_deref())
            .unwrap_or(DEFAULT_RECORDS_PER_PAGE);
        let page = parse_positive(self.page.as_deref()).unwrap_or(1);
        ((page - 1).saturating_mul(limit), limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
}

/// GET /users - Paginated identity list (ADMIN only)
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Identity>>, ApiError> {
    if let Err(denied) = require_role(&ctx, Role::Admin).ensure() {
        warn!(
            user_id = %ctx.subject_id,
            role = ?ctx.role,
            "User list access denied: admin role required"
        );
        return Err(denied.into());
    }

    let (skip, limit) = query.window();
    let users = state.store.list(skip, limit).await?;

    info!(
        admin_user_id = %ctx.subject_id,
        skip = skip,
        limit = limit,
        returned = users.len(),
        "User list fetched"
    );

    Ok(Json(users))
}

/// GET /users/:user_id - Single identity (owner or ADMIN)
pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    ctx: AuthContext,
    Path(user_id): Path<String>,
) -> Result<Json<Identity>, ApiError> {
    if let Err(denied) = require_owner_or_admin(&ctx, &user_id).ensure() {
        warn!(
            user_id = %ctx.subject_id,
            target_user_id = %user_id,
            "User access denied: not the owner"
        );
        return Err(denied.into());
    }

    let user = state
        .store
        .find_one_by_field(IdentityField::IdentityId, &user_id)
        .await?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(per_page: Option<&str>, page: Option<&str>) -> PageQuery {
        PageQuery {
            record_per_page: per_page.map(str::to_string),
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn test_window_defaults() {
        assert_eq!(query(None, None).window(), (0, 10));
    }

    #[test]
    fn test_window_explicit_values() {
        assert_eq!(query(Some("5"), Some("3")).window(), (10, 5));
    }

    #[test]
    fn test_window_invalid_values_fall_back() {
        assert_eq!(query(Some("0"), Some("-2")).window(), (0, 10));
        assert_eq!(query(Some("lots"), Some("two")).window(), (0, 10));
    }
}
