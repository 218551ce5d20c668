/*
 * Responsibility
 * - /films 系 handler (list / create / delete)
 * - owner は AuthCtx の subject。client の入力からは決めない
 * - delete の認可 (admin role) は route 側の middleware で済んでいる前提
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::{
        dto::films::{CreateFilmRequest, FilmResponse},
        extractors::{AuthCtxExtractor, extract_json},
    },
    error::AppError,
    state::AppState,
};

pub async fn list_films(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<FilmResponse>>, AppError> {
    let films = state.films.list_by_owner(ctx.subject()).await?;

    Ok(Json(films.into_iter().map(FilmResponse::from).collect()))
}

pub async fn create_film(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    body: Result<Json<CreateFilmRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FilmResponse>), AppError> {
    let req = extract_json(body)?;
    let title = req
        .validate()
        .map_err(|detail| AppError::validation(vec![detail]))?;

    let film = state.films.create(ctx.subject(), title).await?;
    tracing::info!(sub = %ctx.subject(), film_id = %film.id, "film created");

    Ok((StatusCode::CREATED, Json(film.into())))
}

/// Always 204: deleting an id that does not exist is not an error.
pub async fn delete_film(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = state.films.delete_by_id(&id).await?;
    tracing::info!(
        sub = %ctx.subject(),
        username = ctx.claims().username.as_deref().unwrap_or("-"),
        film_id = %id,
        removed,
        "film delete"
    );

    Ok(StatusCode::NO_CONTENT)
}
