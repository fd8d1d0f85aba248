//! Turning the request's credential into a [`Ctx`].

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use coach_auth::{AUTH_HEADER, AUTH_HEADER_PREFIX};
use coach_models::db::connection::DbConnection;
use tower_cookies::{Cookie, Cookies};
use tracing::info;

use crate::{
    account::{LoginRequest, LoginResponse},
    auth_token::{AuthToken, authenticate, decode_token},
    ctx::{
        Ctx,
        ctx_user::{CtxUser, generate_token},
    },
};
use crate::prelude::*;

/// The name of the cookie used to store authentication tokens.
pub const AUTH_TOKEN_COOKIE: &str = "auth-token";

fn resolve_token(cookies: &Cookies, headers: &HeaderMap) -> core::result::Result<AuthToken, coach_auth::error::Error> {
    let token = cookies
        .get(AUTH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            headers
                .get(AUTH_HEADER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix(AUTH_HEADER_PREFIX))
                .map(|s| s.to_string())
        })
        .ok_or(coach_auth::error::Error::TokenMissing)?;

    let token = decode_token(&token).map_err(|err| match err {
        Error::Auth(err) => err,
        _ => coach_auth::error::Error::InvalidToken,
    })?;
    if token.exp < chrono::Utc::now().timestamp() {
        return Err(coach_auth::error::Error::TokenExpired);
    }
    Ok(token)
}

/// Resolves the caller from the `auth-token` cookie or the bearer header.
///
/// The outcome, success or not, is stored in the request extensions for the
/// [`Ctx`] extractor. An unusable cookie is cleared.
///
/// ```rust
/// use axum::Router;
/// use coach_web::ctx::resolver::mw_ctx_resolver;
///
/// let app: Router<()> = Router::new()
///     .layer(axum::middleware::from_fn(mw_ctx_resolver));
/// ```
pub async fn mw_ctx_resolver(
    cookies: Cookies,
    headers: HeaderMap,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let ctx = resolve_token(&cookies, &headers).map(|token| {
        Ctx::new(
            CtxUser {
                id: token.sub,
                username: token.username,
            },
            token.role,
            token.coach_id,
            token.permissions,
        )
    });

    if ctx.is_err() {
        cookies.remove(Cookie::from(AUTH_TOKEN_COOKIE));
    }
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

/// Authenticates `auth`, sets the session cookie and returns the session details.
pub fn login(
    auth: &LoginRequest,
    connection: &DbConnection,
    cookies: &Cookies,
) -> Result<LoginResponse> {
    let (user, role) = authenticate(auth, connection)?;
    let token = generate_token(&user, role)?;
    let mut cookie = Cookie::new(AUTH_TOKEN_COOKIE, token.access_token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.add(cookie);
    info!("{} '{}' logged in", role, user.username);

    Ok(LoginResponse {
        access_token: token.access_token,
        token_type: token.token_type,
        role,
        coach_id: user.coach_id,
        username: user.username,
    })
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Ok(parts
            .extensions
            .get::<core::result::Result<Ctx, coach_auth::error::Error>>()
            .ok_or(Error::CtxMissing)?
            .clone()?)
    }
}
