use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use server_api::{
    create_segment, create_story, delete_segment, delete_story, list_segments, list_stories,
    ApiContext,
};
use shared::{
    domain::{CreateSegmentRequest, CreateSegmentResponse, CreateStoryRequest, SegmentId, StoryId},
    error::{ApiError, ErrorCode},
};
use storage::Storage;
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/stories", get(http_list_stories))
        .route("/stories", post(http_create_story))
        .route("/stories/:story_id", delete(http_delete_story))
        .route("/stories/:story_id/segments", get(http_list_segments))
        .route("/stories/:story_id/segments", post(http_create_segment))
        .route(
            "/stories/:story_id/segments/:segment_id",
            delete(http_delete_segment),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_stories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let stories = list_stories(&state.api).await.map_err(reject)?;
    Ok(Json(stories))
}

async fn http_create_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let story = create_story(&state.api, &req.title).await.map_err(reject)?;
    info!(story_id = %story.id, "story created");
    Ok((StatusCode::CREATED, Json(story)))
}

async fn http_delete_story(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    delete_story(&state.api, StoryId(story_id))
        .await
        .map_err(reject)?;
    info!(%story_id, "story deleted");
    Ok(Json(serde_json::json!({
        "message": "story and segments deleted"
    })))
}

async fn http_list_segments(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let segments = list_segments(&state.api, StoryId(story_id))
        .await
        .map_err(reject)?;
    Ok(Json(segments))
}

async fn http_create_segment(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<i64>,
    Json(req): Json<CreateSegmentRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let segment_id = create_segment(&state.api, StoryId(story_id), &req.text)
        .await
        .map_err(reject)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSegmentResponse { segment_id }),
    ))
}

async fn http_delete_segment(
    State(state): State<Arc<AppState>>,
    Path((story_id, segment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    delete_segment(&state.api, StoryId(story_id), SegmentId(segment_id))
        .await
        .map_err(reject)?;
    Ok(Json(serde_json::json!({ "message": "segment deleted" })))
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}
