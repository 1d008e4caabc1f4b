use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::error::{ApiError, ErrorCode};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<CreateSegmentRequest>>>>,
}

fn sample_story(id: i64, title: &str) -> Story {
    Story {
        id: StoryId(id),
        title: title.to_string(),
        created_at: Utc::now(),
    }
}

async fn handle_list_stories() -> Json<Vec<Story>> {
    Json(vec![sample_story(2, "Second"), sample_story(1, "First")])
}

async fn handle_create_story(
    Json(req): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<Story>), (StatusCode, Json<ApiError>)> {
    if req.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                ErrorCode::Validation,
                "missing or empty title field",
            )),
        ));
    }
    Ok((StatusCode::CREATED, Json(sample_story(9, &req.title))))
}

async fn handle_create_segment(
    State(state): State<ServerState>,
    Path(_story_id): Path<i64>,
    Json(req): Json<CreateSegmentRequest>,
) -> (StatusCode, Json<CreateSegmentResponse>) {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(req);
    }
    (
        StatusCode::CREATED,
        Json(CreateSegmentResponse {
            segment_id: SegmentId(31),
        }),
    )
}

async fn handle_plain_failure() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "everything is on fire")
}

async fn spawn_story_server() -> (String, oneshot::Receiver<CreateSegmentRequest>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/stories", get(handle_list_stories))
        .route("/stories", post(handle_create_story))
        .route("/stories/:story_id/segments", post(handle_create_segment))
        .route("/stories/:story_id/segments", get(handle_plain_failure))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), rx)
}

#[tokio::test]
async fn list_stories_parses_the_payload_in_order() {
    let (server_url, _rx) = spawn_story_server().await;
    let service = HttpStoryService::new(server_url).expect("service");

    let stories = service.list_stories().await.expect("list");
    let titles: Vec<&str> = stories.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn create_segment_sends_the_text_and_returns_the_id() {
    let (server_url, rx) = spawn_story_server().await;
    let service = HttpStoryService::new(server_url).expect("service");

    let segment_id = service
        .create_segment(StoryId(7), "The end")
        .await
        .expect("create");
    assert_eq!(segment_id, SegmentId(31));

    let captured = rx.await.expect("request captured");
    assert_eq!(captured.text, "The end");
}

#[tokio::test]
async fn service_error_message_is_extracted_from_the_envelope() {
    let (server_url, _rx) = spawn_story_server().await;
    let service = HttpStoryService::new(server_url).expect("service");

    let err = service.create_story("   ").await.expect_err("should fail");
    match err {
        ClientError::Service { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "missing or empty title field");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_envelope_error_body_falls_back_to_a_generic_message() {
    let (server_url, _rx) = spawn_story_server().await;
    let service = HttpStoryService::new(server_url).expect("service");

    let err = service
        .list_segments(StoryId(7))
        .await
        .expect_err("should fail");
    match err {
        ClientError::Service { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("500"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Reserve a port, then drop the listener so nothing answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let service = HttpStoryService::new(format!("http://{addr}")).expect("service");
    let err = service.list_stories().await.expect_err("should fail");
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn invalid_server_url_is_rejected_up_front() {
    let err = HttpStoryService::new("not a url").expect_err("should fail");
    assert!(matches!(err, ClientError::Transport(_)));
}
