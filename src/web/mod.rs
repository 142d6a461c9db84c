use crate::config::AppConfig;
use crate::db::Database;
use axum::{
    Router,
    extract::Path as AxumPath,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_embed::Embed;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod api;
mod errors;
mod pages;
mod session;

pub use errors::AppError;
pub use session::{CurrentUser, SESSION_COOKIE};

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub session_hours: i64,
}

impl AppState {
    pub fn new(db: Database, session_hours: i64) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
            session_hours,
        }
    }
}

/// Run `f` against the locked database, mapping domain errors to HTTP ones.
pub(crate) fn with_db<T>(
    state: &AppState,
    f: impl FnOnce(&Database) -> crate::error::Result<T>,
) -> Result<T, AppError> {
    // A panic mid-request leaves SQLite consistent, so a poisoned lock is
    // still usable.
    let db = state.db.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&db)?)
}

/// Embedded static assets (stylesheet, login script) compiled into the binary.
#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

/// Serve embedded static files at /static/{path}.
async fn static_handler(AxumPath(path): AxumPath<String>) -> Response {
    match StaticAssets::get(&path) {
        Some(content) => {
            let mime = if path.ends_with(".js") {
                "application/javascript"
            } else if path.ends_with(".css") {
                "text/css"
            } else {
                "application/octet-stream"
            };
            ([(header::CONTENT_TYPE, mime)], content.data).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Build the axum router with all routes. Everything except the index page,
/// static assets and login sits behind a session check.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/logout", post(api::logout))
        .route("/api/me", get(api::me))
        .route("/api/programs", get(api::list_programs).post(api::create_program))
        .route("/api/programs/{id}/active", put(api::set_program_active))
        .route("/api/rooms", get(api::list_rooms).post(api::create_room))
        .route("/api/rooms/{id}/active", put(api::set_room_active))
        .route(
            "/api/reservations",
            get(api::list_reservations).post(api::create_reservation),
        )
        .route(
            "/api/reservations/{id}",
            get(api::get_reservation)
                .put(api::update_reservation)
                .delete(api::delete_reservation),
        )
        .route("/api/reservations/{id}/participants", put(api::put_participants))
        .route("/api/reservations/{id}/programs", put(api::put_programs))
        .route("/api/reservations/{id}/lodging", put(api::put_lodging))
        .route("/api/reservations/{id}/cost", get(api::get_cost))
        .route("/api/reservations/{id}/confirm", post(api::confirm))
        .route("/api/reservations/{id}/status", post(api::set_status))
        .route("/api/reservations/{id}/schedule", get(api::schedule))
        .route("/api/reservations/{id}/rooms", get(api::rooms))
        .route("/api/reservations/{id}/plan", get(api::plan))
        .route("/api/reservations/{id}/usage", get(api::usage))
        .route("/api/reservations/{id}/surveys", post(api::post_survey))
        .route("/api/reservations/{id}/hrv", post(api::post_hrv))
        .route("/api/reservations/{id}/plan.csv", get(api::export_plan))
        .route("/api/reports/year-month", get(api::year_month))
        .route("/api/reports/programs", get(api::programs_report))
        .route("/api/export/reservations.csv", get(api::export_reservations))
        .route("/api/export/year-month.csv", get(api::export_year_month))
        .route("/api/export/programs.csv", get(api::export_programs))
        .route("/reports/year-month", get(pages::year_month))
        .route("/reservations/{id}/plan", get(pages::plan))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .route("/", get(pages::index))
        .route("/static/{*path}", get(static_handler))
        .route("/api/login", post(api::login))
        .merge(protected)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database and serve until the process is stopped.
pub async fn serve(config: &AppConfig) -> Result<(), String> {
    let db = Database::open(&config.db_path).map_err(|e| e.to_string())?;
    db.migrate().map_err(|e| e.to_string())?;
    let app = create_router(AppState::new(db, config.session_hours));

    let addr = config.server.socket_addr().map_err(|e| e.to_string())?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind to {addr}: {e}"))?;
    info!(%addr, db = %config.db_path.display(), "retreat desk listening");
    println!("Retreat desk: http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
