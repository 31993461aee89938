use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::assets::{static_asset, Asset, INDEX_HTML};
use crate::AppState;

/// Application shell for every path the API does not claim.
pub async fn index(State(state): State<AppState>) -> Response {
    serve(&INDEX_HTML, &state).await
}

/// Known frontend files; any other path under `/static/` gets the shell.
pub async fn static_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    serve(static_asset(&path).unwrap_or(&INDEX_HTML), &state).await
}

async fn serve(asset: &Asset, state: &AppState) -> Response {
    let body = asset.contents(state.frontend_dir.as_deref()).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, asset.content_type)],
        body.into_owned(),
    )
        .into_response()
}
