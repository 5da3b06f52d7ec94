use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use silentproof_monitor::classroom_store::{ClassroomStore, JsonFileClassroomStore, StoreError};
use silentproof_monitor::constants::TIMELINE_DISPLAY_LIMIT;
use silentproof_monitor::engine::SimulationEngine;
use silentproof_monitor::playback::PlaybackDriver;
use silentproof_monitor::server_protocol::{parse_control_command, ControlCommand};
use silentproof_monitor::server_utils::{
    normalize_grid, normalize_seed, parse_alert_limit, parse_limit, sanitize_classroom_name,
};
use silentproof_monitor::types::{ClassroomConfig, SeatEvent, SeatTemplate};
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};

type SharedState = Arc<AppState>;

struct AppState {
    driver: PlaybackDriver,
    store: Mutex<JsonFileClassroomStore>,
    default_seed: u32,
}

#[derive(Debug, Deserialize)]
struct SnapshotQuery {
    alerts: Option<String>,
    timeline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewClassroomRequest {
    name: Option<String>,
    rows: Option<i64>,
    cols: Option<i64>,
    seats: Option<Vec<SeatTemplate>>,
    events: Option<Vec<SeatEvent>>,
    #[serde(rename = "createdBy")]
    created_by: Option<String>,
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let store_path = std::env::var("CLASSROOM_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/classrooms.json"));

    let default_seed = std::env::var("SIM_SEED")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .map(normalize_seed)
        .unwrap_or_else(rand::random::<u32>);

    let store = JsonFileClassroomStore::new(store_path);
    println!(
        "[server] classroom store: {} ({} saved)",
        store.file_path().display(),
        store.list().len()
    );

    let state = Arc::new(AppState {
        driver: PlaybackDriver::new(SimulationEngine::demo(default_seed)),
        store: Mutex::new(store),
        default_seed,
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/session", get(session_handler))
        .route("/api/session/control", post(control_handler))
        .route("/api/session/seats/{id}", get(seat_handler))
        .route(
            "/api/classrooms",
            get(list_classrooms_handler).post(create_classroom_handler),
        )
        .route(
            "/api/classrooms/{id}",
            get(get_classroom_handler).delete(delete_classroom_handler),
        )
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)))
    } else {
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            eprintln!("[server] failed to bind {bind_addr}: {error}");
            std::process::exit(1);
        }
    };
    println!("[server] listening on :{port} (seed {default_seed})");
    if let Err(error) = axum::serve(listener, app).await {
        eprintln!("[server] stopped: {error}");
        std::process::exit(1);
    }
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn session_handler(
    State(state): State<SharedState>,
    Query(query): Query<SnapshotQuery>,
) -> impl IntoResponse {
    let alert_limit = parse_alert_limit(query.alerts.as_deref());
    let timeline_limit = parse_limit(query.timeline.as_deref(), TIMELINE_DISPLAY_LIMIT);
    Json(state.driver.snapshot(alert_limit, timeline_limit).await)
}

async fn seat_handler(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.driver.seat(&id).await {
        Some(seat) => Json(seat).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &format!("unknown seat {id}")),
    }
}

async fn control_handler(State(state): State<SharedState>, body: String) -> Response {
    let Some(command) = parse_control_command(&body) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid control command");
    };
    let label = command.name();
    let changed = match command {
        ControlCommand::Start => state.driver.start().await,
        ControlCommand::Pause => state.driver.pause().await,
        ControlCommand::Reset => {
            state.driver.reset().await;
            true
        }
        ControlCommand::Load { classroom_id, seed } => {
            let seed = seed.map(normalize_seed).unwrap_or(state.default_seed);
            let engine = match classroom_id {
                None => SimulationEngine::demo(seed),
                Some(id) => {
                    let Some(config) = state.store.lock().await.get(&id) else {
                        return error_response(
                            StatusCode::NOT_FOUND,
                            &format!("unknown classroom {id}"),
                        );
                    };
                    println!("[server] loading classroom {} ({})", config.name, config.id);
                    SimulationEngine::from_classroom(&config, seed)
                }
            };
            state.driver.replace(engine).await;
            true
        }
    };
    println!("[server] control {label} (changed: {changed})");
    let snapshot = state.driver.subscribe().borrow().clone();
    Json(json!({ "command": label, "changed": changed, "snapshot": snapshot })).into_response()
}

async fn list_classrooms_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.store.lock().await.list())
}

async fn get_classroom_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.lock().await.get(&id) {
        Some(config) => Json(config).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &format!("unknown classroom {id}")),
    }
}

async fn create_classroom_handler(
    State(state): State<SharedState>,
    Json(request): Json<NewClassroomRequest>,
) -> Response {
    let config = build_classroom(request);
    let mut store = state.store.lock().await;
    match store.put(config.clone()) {
        Ok(()) => {
            println!("[server] saved classroom {} ({})", config.name, config.id);
            (StatusCode::CREATED, Json(config)).into_response()
        }
        Err(error) => store_error_response(error),
    }
}

async fn delete_classroom_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.lock().await.delete(&id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, &format!("unknown classroom {id}")),
        Err(error) => store_error_response(error),
    }
}

fn build_classroom(request: NewClassroomRequest) -> ClassroomConfig {
    let name = sanitize_classroom_name(request.name.as_deref().unwrap_or_default());
    let (rows, cols) = normalize_grid(request.rows, request.cols);
    let mut config = ClassroomConfig::blank(
        &name,
        rows,
        cols,
        request.created_by.as_deref().unwrap_or_default(),
    );
    if let Some(seats) = request.seats {
        config.seats = seats;
    }
    if let Some(events) = request.events {
        config.events = events;
    }
    config
}

fn store_error_response(error: StoreError) -> Response {
    match error {
        StoreError::Invalid(reason) => error_response(StatusCode::BAD_REQUEST, &reason.to_string()),
        other => {
            eprintln!("[server] classroom store failure: {other}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "classroom store failure")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn resolve_static_dir() -> Option<PathBuf> {
    let dir = PathBuf::from(std::env::var("STATIC_DIR").ok()?);
    if dir.join("index.html").is_file() {
        Some(dir)
    } else {
        eprintln!(
            "[server] STATIC_DIR {} has no index.html; serving API only",
            dir.display()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silentproof_monitor::types::{EventType, TemplateStatus};

    fn request(rows: Option<i64>, cols: Option<i64>) -> NewClassroomRequest {
        NewClassroomRequest {
            name: Some("  Exam Hall  ".to_string()),
            rows,
            cols,
            seats: None,
            events: None,
            created_by: Some("admin".to_string()),
        }
    }

    #[test]
    fn build_classroom_fills_a_valid_grid() {
        let config = build_classroom(request(Some(3), Some(4)));
        assert_eq!(config.name, "Exam Hall");
        assert_eq!((config.rows, config.cols), (3, 4));
        assert_eq!(config.seats.len(), 12);
        assert!(config
            .seats
            .iter()
            .all(|seat| seat.status == TemplateStatus::Active));
        assert_eq!(config.created_by, "admin");
    }

    #[test]
    fn build_classroom_clamps_and_defaults() {
        let config = build_classroom(NewClassroomRequest {
            name: None,
            rows: Some(100),
            cols: None,
            seats: None,
            events: None,
            created_by: None,
        });
        assert_eq!(config.name, "Untitled Classroom");
        assert_eq!((config.rows, config.cols), (12, 8));
        assert_eq!(config.created_by, "unknown");
    }

    #[test]
    fn build_classroom_keeps_supplied_events() {
        let mut req = request(Some(2), Some(2));
        req.events = Some(vec![SeatEvent::at(1, 1, EventType::PaperRustle, 12)]);
        let config = build_classroom(req);
        assert_eq!(config.events.len(), 1);
        assert_eq!(config.events[0].trigger_time, 12);
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let mut config = build_classroom(request(Some(2), Some(2)));
        config.seats.pop();
        let error = silentproof_monitor::classroom_store::validate_classroom(&config)
            .expect_err("short seat list is invalid");
        let response = store_error_response(StoreError::Invalid(error));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
