use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::{http::StatusCode, Json};
use tracing::{debug, info};

use crate::db::{create_todo, get_todo, list_todos, soft_delete_todo, update_todo};
use crate::error::AppError;
use crate::extract::{JsonPayload, TodoId};
use crate::models::{AckResponse, DataResponse, Todo, TodoFilter};
use crate::validation::validate_todo;
use crate::AppState;

pub async fn list_all_todos(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DataResponse<Vec<Todo>>>, AppError> {
    let filter = TodoFilter::from_param(params.get("filter").map(String::as_str));
    let todos = list_todos(&state.db, filter)?;
    debug!(%filter, count = todos.len(), "Listed todos");
    Ok(Json(DataResponse { data: todos }))
}

pub async fn create_new_todo(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload,
) -> Result<(StatusCode, Json<DataResponse<Todo>>), AppError> {
    let input = validate_todo(&payload.input).map_err(AppError::Validation)?;

    let todo = create_todo(&state.db, &input)?;
    info!(id = todo.id, title = %todo.title, due_date = %todo.due_date, "Created todo");
    Ok((StatusCode::CREATED, Json(DataResponse { data: todo })))
}

pub async fn get_single_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Json<DataResponse<Todo>>, AppError> {
    match get_todo(&state.db, id)? {
        Some(todo) => Ok(Json(DataResponse { data: todo })),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_existing_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
    JsonPayload(payload): JsonPayload,
) -> Result<Json<DataResponse<Todo>>, AppError> {
    // An unknown id wins over field errors.
    if get_todo(&state.db, id)?.is_none() {
        return Err(AppError::NotFound);
    }

    let input = validate_todo(&payload.input).map_err(AppError::Validation)?;

    match update_todo(&state.db, id, &input, payload.completion)? {
        Some(todo) => {
            info!(id = todo.id, completed = todo.is_completed(), "Updated todo");
            Ok(Json(DataResponse { data: todo }))
        }
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_existing_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Json<AckResponse>, AppError> {
    if soft_delete_todo(&state.db, id)? {
        info!(id, "Deleted todo");
        Ok(Json(AckResponse { ok: true }))
    } else {
        Err(AppError::NotFound)
    }
}
