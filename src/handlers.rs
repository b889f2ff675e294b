use crate::errors::{AppError, TrackerError};
use crate::models::{IncrementRequest, SubjectForm, SubjectRecord};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.snapshot().await;
    Html(render_index(&view, None, None))
}

pub async fn submit_new_form(
    State(state): State<AppState>,
    Form(form): Form<SubjectForm>,
) -> Result<Response, AppError> {
    match state.submit_new(&form).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(TrackerError::Validation(errors)) => {
            let mut view = state.snapshot().await;
            view.editing = None;
            let page = render_index(&view, Some(&form), Some(&errors));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn submit_edit_form(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Form(form): Form<SubjectForm>,
) -> Result<Response, AppError> {
    match state.submit_edit(&name, &form).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(TrackerError::Validation(errors)) => {
            let mut view = state.snapshot().await;
            view.editing = Some(name);
            let page = render_index(&view, Some(&form), Some(&errors));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn begin_edit(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    state.begin_edit(&name).await?;
    Ok(Redirect::to("/"))
}

pub async fn cancel_edit(State(state): State<AppState>) -> Redirect {
    state.cancel_edit().await;
    Redirect::to("/")
}

pub async fn mark_attended(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    state.increment_attendance(&name, true).await?;
    Ok(Redirect::to("/"))
}

pub async fn mark_skipped(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    state.increment_attendance(&name, false).await?;
    Ok(Redirect::to("/"))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    state.delete_subject(&name).await?;
    Ok(Redirect::to("/"))
}

pub async fn list_subjects(State(state): State<AppState>) -> Json<Vec<SubjectRecord>> {
    Json(state.subjects().await)
}

pub async fn create_subject(
    State(state): State<AppState>,
    Json(form): Json<SubjectForm>,
) -> Result<(StatusCode, Json<SubjectRecord>), AppError> {
    let record = state.submit_new(&form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_subject(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(form): Json<SubjectForm>,
) -> Result<Json<SubjectRecord>, AppError> {
    let record = state.submit_edit(&name, &form).await?;
    Ok(Json(record))
}

pub async fn increment_subject(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<IncrementRequest>,
) -> Result<Json<SubjectRecord>, AppError> {
    let record = state.increment_attendance(&name, payload.attended).await?;
    Ok(Json(record))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.delete_subject(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
