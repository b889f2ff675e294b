use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/subjects", post(handlers::submit_new_form))
        .route("/subjects/:name", post(handlers::submit_edit_form))
        .route("/subjects/:name/edit", post(handlers::begin_edit))
        .route("/subjects/:name/attended", post(handlers::mark_attended))
        .route("/subjects/:name/skipped", post(handlers::mark_skipped))
        .route("/subjects/:name/delete", post(handlers::delete_form))
        .route("/edit/cancel", post(handlers::cancel_edit))
        .route(
            "/api/subjects",
            get(handlers::list_subjects).post(handlers::create_subject),
        )
        .route(
            "/api/subjects/:name",
            axum::routing::put(handlers::update_subject).delete(handlers::delete_subject),
        )
        .route("/api/subjects/:name/increment", post(handlers::increment_subject))
        .with_state(state)
}
