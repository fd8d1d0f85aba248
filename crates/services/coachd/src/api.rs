use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    routing::{MethodRouter, get, patch, post},
};
use coach_models::db::connection::DbConnection;
use coach_sheets::{broker::MarkingSubmission, desk::EvidenceDesk};
use coach_web::{
    account::{LoginRequest, LoginResponse},
    ctx::{
        Ctx, PERM_EVIDENCE, PERM_TASKS,
        resolver::{login as login_user, mw_ctx_resolver},
    },
    evidence::{self, Envelope, StudentComponentsParams},
    mw_auth::mw_require_auth,
    require_permission,
    tasks::{self, TaskPatch, TaskPost},
    upload::{MediaStore, UploadResponse},
};
use serde_json::Value;
use tokio::task::JoinHandle;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use crate::prelude::*;
use coach_web::error::Error as WebError;
use coach_web::prelude::Result as WebResult;

const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Everything the handlers need, split out per handler through [`FromRef`].
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: DbConnection,
    pub desk: EvidenceDesk,
    pub media: MediaStore,
}

/// Mounts `method` at `path` and at `path/`; clients use both spellings.
fn slashed<S>(router: Router<S>, path: &str, method: MethodRouter<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route(path, method.clone())
        .route(&format!("{path}/"), method)
}

pub fn account_routes<S>() -> Router<S>
where
    DbConnection: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    let router = slashed(Router::new(), "/auth/login", post(login));
    slashed(router, "/api/accounts/login", post(login))
}

pub fn evidence_routes<S>() -> Router<S>
where
    EvidenceDesk: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    let router = slashed(
        Router::new(),
        "/api/accounts/student-components",
        get(student_components),
    );
    slashed(router, "/api/accounts/mark-evidence", post(mark_evidence))
        .route_layer(require_permission!(PERM_EVIDENCE))
        .route_layer(middleware::from_fn(mw_require_auth))
}

pub fn task_routes<S>() -> Router<S>
where
    DbConnection: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    let router = slashed(
        Router::new(),
        "/tasks-api/coaches/{coach_id}/tasks",
        get(list_tasks).post(create_task),
    );
    slashed(
        router,
        "/tasks-api/coaches/{coach_id}/tasks/{task_id}",
        patch(update_task).delete(delete_task),
    )
    .route_layer(require_permission!(PERM_TASKS))
    .route_layer(middleware::from_fn(mw_require_auth))
}

pub fn upload_routes<S>() -> Router<S>
where
    MediaStore: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    slashed(
        Router::new(),
        "/tasks-api/evidence/upload",
        post(upload_evidence),
    )
    .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
    .route_layer(middleware::from_fn(mw_require_auth))
}

/// Serves stored uploads under the media URL.
pub fn media_routes<S>(media: &MediaStore) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let files = ServeDir::new(media.root());
    match media.url().trim_end_matches('/') {
        "" => Router::new().fallback_service(files),
        prefix => Router::new().nest_service(prefix, files),
    }
}

/// Adds the shared layers and binds the state.
pub fn finish<S>(router: Router<S>, state: S) -> Router
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(mw_ctx_resolver))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .merge(account_routes())
        .merge(evidence_routes())
        .merge(task_routes())
        .merge(upload_routes())
        .merge(media_routes(&state.media));
    finish(router, state)
}

pub async fn setup_api(
    bind: std::net::SocketAddr,
    state: AppState,
) -> Result<JoinHandle<Result<()>>> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::debug!("listening on {}", listener.local_addr()?);
    let app = app(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok(handle)
}

async fn login(
    State(db): State<DbConnection>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> WebResult<Json<LoginResponse>> {
    Ok(Json(login_user(&payload, &db, &cookies)?))
}

async fn student_components(
    State(desk): State<EvidenceDesk>,
    ctx: Ctx,
    Query(params): Query<StudentComponentsParams>,
) -> WebResult<Json<Envelope>> {
    info!("{} looks up student {:?}", ctx.user.username, params);
    Ok(Json(evidence::student_components(&desk, &params).await?))
}

async fn mark_evidence(
    State(desk): State<EvidenceDesk>,
    ctx: Ctx,
    Json(submission): Json<MarkingSubmission>,
) -> WebResult<Json<Envelope>> {
    info!(
        "{} submits evidence {:?} for marking",
        ctx.user.username, submission.evidence_id
    );
    Ok(Json(evidence::mark_evidence(&desk, &submission).await?))
}

async fn list_tasks(
    State(db): State<DbConnection>,
    ctx: Ctx,
    Path(coach_id): Path<String>,
) -> WebResult<Json<Vec<Value>>> {
    Ok(Json(tasks::list_tasks(&ctx, &coach_id, &db)?))
}

async fn create_task(
    State(db): State<DbConnection>,
    ctx: Ctx,
    Path(coach_id): Path<String>,
    Json(payload): Json<TaskPost>,
) -> WebResult<(StatusCode, Json<Value>)> {
    let task = tasks::create_task(&ctx, &coach_id, payload, &db)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(db): State<DbConnection>,
    ctx: Ctx,
    Path((coach_id, task_id)): Path<(String, String)>,
    Json(patch): Json<TaskPatch>,
) -> WebResult<Json<Value>> {
    Ok(Json(tasks::update_task(&ctx, &coach_id, &task_id, patch, &db)?))
}

async fn delete_task(
    State(db): State<DbConnection>,
    ctx: Ctx,
    Path((coach_id, task_id)): Path<(String, String)>,
) -> WebResult<StatusCode> {
    tasks::delete_task(&ctx, &coach_id, &task_id, &db)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `scheme://host` the client used, for absolute upload URLs.
fn request_origin(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

async fn upload_evidence(
    State(media): State<MediaStore>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> WebResult<(StatusCode, Json<UploadResponse>)> {
    let bad_body = |err: axum::extract::multipart::MultipartError| {
        WebError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    };
    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await.map_err(bad_body)?;
        let saved = media
            .save_image(
                file_name.as_deref(),
                content_type.as_deref(),
                &bytes,
                &request_origin(&headers),
            )
            .await?;
        return Ok((StatusCode::CREATED, Json(saved)));
    }
    Err(WebError::BadRequest(String::from("file is required")))
}
