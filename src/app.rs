use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/streaks/:domain/mark", post(handlers::mark_streak))
        .route("/api/streaks/:domain/status", get(handlers::get_status))
        .route("/api/streaks/:domain/prompt", get(handlers::get_prompt))
        .route("/api/streaks/:domain", get(handlers::get_record))
        .route("/api/sites", get(handlers::list_sites))
        .route("/api/sites/:domain", put(handlers::set_site_enabled))
        .route("/api/aggregate", get(handlers::get_aggregate))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .route("/api/sync/push", post(handlers::push_sync))
        .route("/api/sync/pull", post(handlers::pull_sync))
        .route("/api/reset", post(handlers::reset_all))
        .with_state(state)
}
