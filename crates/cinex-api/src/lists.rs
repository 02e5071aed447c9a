use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use cinex_db::models::{ListedMovieRow, parse_sqlite_datetime};
use cinex_types::api::{
    Claims, CreateCustomListRequest, CustomListSummary, ListContentsResponse, ListedMovie,
    MyListsResponse, PredefinedListSummary,
};
use cinex_types::models::{ListKind, ListSelector};

use crate::auth::AppStateInner;
use crate::error::ApiError;

fn listed_movie(row: ListedMovieRow) -> ListedMovie {
    ListedMovie {
        movie: row.movie.into_movie(),
        list_added_at: parse_sqlite_datetime(&row.added_at),
    }
}

fn parse_kind(token: &str) -> Result<ListKind, ApiError> {
    ListKind::parse(token)
        .ok_or_else(|| ApiError::validation(format!("unknown list kind '{}'", token)))
}

/// Add a movie to a predefined list. The kind token is parsed once and
/// dispatched on: to_watch and favorites are plain inserts, watched is the
/// compound mark-watched transition.
pub async fn add_to_list(
    State(state): State<Arc<AppStateInner>>,
    Path((kind_token, movie_id)): Path<(String, i64)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind_token)?;

    let movie = state
        .db
        .get_movie(movie_id)?
        .ok_or_else(|| ApiError::not_found("movie not found"))?;

    match kind {
        ListKind::Watched => {
            if !state.db.mark_watched(claims.sub, movie_id)? {
                return Err(ApiError::conflict("movie is already marked as watched"));
            }
            Ok((
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": "movie marked as watched",
                    "movie": movie.into_movie(),
                })),
            ))
        }
        ListKind::ToWatch | ListKind::Favorites => {
            if !state.db.add_list_entry(claims.sub, movie_id, kind)? {
                return Err(ApiError::conflict(format!(
                    "movie is already in your {} list",
                    kind.display_name()
                )));
            }
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "message": format!("movie added to {}", kind.display_name()),
                    "movie": movie.into_movie(),
                })),
            ))
        }
    }
}

/// Remove a movie from to_watch or favorites. Absence is an error, not a
/// no-op; and watched entries have no free removal.
pub async fn remove_from_list(
    State(state): State<Arc<AppStateInner>>,
    Path((kind_token, movie_id)): Path<(String, i64)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind_token)?;

    if kind == ListKind::Watched {
        return Err(ApiError::validation(
            "watched entries are managed through the mark-watched flow",
        ));
    }

    if !state.db.remove_list_entry(claims.sub, movie_id, kind)? {
        return Err(ApiError::not_found(format!(
            "movie is not in your {} list",
            kind.display_name()
        )));
    }

    Ok(Json(serde_json::json!({
        "message": format!("movie removed from {}", kind.display_name()),
    })))
}

/// Predefined and custom lists with live counts.
pub async fn my_lists(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub;

    let (predefined, custom) = tokio::task::spawn_blocking(move || {
        let mut predefined = Vec::with_capacity(ListKind::ALL.len());
        for kind in ListKind::ALL {
            predefined.push(PredefinedListSummary {
                kind,
                display_name: kind.display_name(),
                count: db.db.count_list_entries(user_id, kind)?,
            });
        }

        let custom: Vec<CustomListSummary> = db
            .db
            .custom_lists_with_counts(user_id)?
            .into_iter()
            .map(|row| CustomListSummary {
                list: row.list.into_custom_list(),
                item_count: row.item_count,
            })
            .collect();

        Ok::<_, anyhow::Error>((predefined, custom))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Store(anyhow::anyhow!(e))
    })??;

    Ok(Json(MyListsResponse { predefined, custom }))
}

/// Contents of one list. The URL identifier is parsed exactly once into a
/// predefined kind or a custom-list id; anything else is an input error.
pub async fn list_contents(
    State(state): State<Arc<AppStateInner>>,
    Path(selector): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let selector = ListSelector::parse(&selector)
        .ok_or_else(|| ApiError::validation(format!("unknown list identifier '{}'", selector)))?;

    let db = state.clone();
    let user_id = claims.sub;

    match selector {
        ListSelector::Predefined(kind) => {
            let rows = tokio::task::spawn_blocking(move || db.db.list_kind_movies(user_id, kind))
                .await
                .map_err(|e| {
                    error!("spawn_blocking join error: {}", e);
                    ApiError::Store(anyhow::anyhow!(e))
                })??;

            Ok(Json(ListContentsResponse::Predefined {
                kind,
                movies: rows.into_iter().map(listed_movie).collect(),
            }))
        }
        ListSelector::Custom(list_id) => {
            let found = tokio::task::spawn_blocking(move || {
                let Some(list) = db.db.get_custom_list(user_id, list_id)? else {
                    return Ok::<_, anyhow::Error>(None);
                };
                let rows = db.db.custom_list_movies(list_id)?;
                Ok(Some((list, rows)))
            })
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Store(anyhow::anyhow!(e))
            })??;

            let (list, rows) = found.ok_or_else(|| ApiError::not_found("list not found"))?;

            Ok(Json(ListContentsResponse::Custom {
                list: list.into_custom_list(),
                movies: rows.into_iter().map(listed_movie).collect(),
            }))
        }
    }
}

pub async fn create_custom_list(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCustomListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("list name is required"));
    }

    let list = state
        .db
        .create_custom_list(claims.sub, name, req.description.as_deref(), req.private)?
        .ok_or_else(|| ApiError::conflict("you already have a list with that name"))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "list created",
            "list": list.into_custom_list(),
        })),
    ))
}

pub async fn add_to_custom_list(
    State(state): State<Arc<AppStateInner>>,
    Path((list_id, movie_id)): Path<(i64, i64)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Owner-filtered lookup: someone else's list is indistinguishable from a
    // missing one.
    let list = state
        .db
        .get_custom_list(claims.sub, list_id)?
        .ok_or_else(|| ApiError::not_found("list not found"))?;

    state
        .db
        .get_movie(movie_id)?
        .ok_or_else(|| ApiError::not_found("movie not found"))?;

    if !state.db.add_custom_list_item(list.id, movie_id)? {
        return Err(ApiError::conflict("movie is already in this list"));
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "movie added to list" })),
    ))
}

pub async fn delete_custom_list(
    State(state): State<Arc<AppStateInner>>,
    Path(list_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.delete_custom_list(claims.sub, list_id)? {
        return Err(ApiError::not_found("list not found"));
    }

    Ok(Json(serde_json::json!({ "message": "list deleted" })))
}
