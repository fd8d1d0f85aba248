//! Route guards.

use crate::prelude::*;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::ctx::Ctx;

/// Rejects the request unless a valid [`Ctx`] was resolved.
///
/// ```rust,no_run
/// use axum::{Router, routing::post};
/// use coach_web::mw_auth::mw_require_auth;
///
/// let app: Router<()> = Router::new()
///     .route("/tasks-api/evidence/upload", post(upload))
///     .layer(axum::middleware::from_fn(mw_require_auth));
///
/// async fn upload() -> &'static str {
///     "stored"
/// }
/// ```
pub async fn mw_require_auth(ctx: Result<Ctx>, req: Request, next: Next) -> Result<Response> {
    ctx?;
    Ok(next.run(req).await)
}

/// Rejects the request with 403 unless the caller holds `permission`.
pub async fn mw_require_permission(
    State(permission): State<&'static str>,
    ctx: Ctx,
    req: Request,
    next: Next,
) -> Result<Response> {
    if !ctx.permissions.contains(permission) {
        return Err(Error::ApiForbidden);
    }
    Ok(next.run(req).await)
}

/// Layer requiring a permission, see [`mw_require_permission`].
///
/// ```rust
/// use axum::{Router, routing::get};
/// use coach_web::require_permission;
///
/// let app: Router<()> = Router::new()
///     .route("/api/accounts/student-components", get(lookup))
///     .layer(require_permission!(coach_web::ctx::PERM_EVIDENCE));
///
/// async fn lookup() -> &'static str {
///     "components"
/// }
/// ```
#[macro_export]
macro_rules! require_permission {
    ($permission:expr) => {{
        use $crate::mw_auth::mw_require_permission;
        axum::middleware::from_fn_with_state($permission, mw_require_permission)
    }};
}
