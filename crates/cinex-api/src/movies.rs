use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use cinex_db::models::MovieStatsRow;
use cinex_types::api::{
    CandidateListResponse, Claims, MovieListResponse, MovieWithStats, SaveMovieRequest,
};

use crate::auth::AppStateInner;
use crate::error::ApiError;
use crate::ratings::round2;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top_limit")]
    pub limit: u32,
}

fn default_top_limit() -> u32 {
    10
}

/// Caller-supplied limits above the cap are clamped, not rejected.
const TOP_LIMIT_CAP: u32 = 50;

fn clamp_top_limit(limit: u32) -> u32 {
    limit.min(TOP_LIMIT_CAP)
}

fn with_stats(row: MovieStatsRow) -> MovieWithStats {
    MovieWithStats {
        movie: row.movie.into_movie(),
        average: round2(row.average),
        rating_count: row.rating_count,
    }
}

/// TMDB proxy search. Public; results are candidates, not local movies.
pub async fn search(
    State(state): State<Arc<AppStateInner>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::validation("search parameter 'q' is required"))?;

    let data = state.tmdb.search(&q).await?;

    Ok(Json(CandidateListResponse {
        source: "tmdb_api",
        query: Some(q),
        count: data.len(),
        data,
    }))
}

pub async fn popular(
    State(state): State<Arc<AppStateInner>>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.tmdb.popular().await?;

    Ok(Json(CandidateListResponse {
        source: "tmdb_api",
        query: None,
        count: data.len(),
        data,
    }))
}

/// Most-rated local movies, stats computed live.
pub async fn top(
    State(state): State<Arc<AppStateInner>>,
    Query(query): Query<TopQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let limit = clamp_top_limit(query.limit);

    let rows = tokio::task::spawn_blocking(move || db.db.top_movies(limit))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow::anyhow!(e))
        })??;

    let data: Vec<MovieWithStats> = rows.into_iter().map(with_stats).collect();

    Ok(Json(MovieListResponse {
        source: "cinex_db",
        count: data.len(),
        data,
    }))
}

pub async fn by_genre(
    State(state): State<Arc<AppStateInner>>,
    Path(genre): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.movies_by_genre(&genre))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow::anyhow!(e))
        })??;

    let data: Vec<MovieWithStats> = rows.into_iter().map(with_stats).collect();

    Ok(Json(MovieListResponse {
        source: "cinex_db",
        count: data.len(),
        data,
    }))
}

pub async fn detail(
    State(state): State<Arc<AppStateInner>>,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_movie_with_stats(movie_id)?
        .ok_or_else(|| ApiError::not_found("movie not found"))?;

    Ok(Json(with_stats(row)))
}

/// Save (or refresh) a catalog candidate locally: upsert by tmdb_id.
pub async fn save_from_catalog(
    State(state): State<Arc<AppStateInner>>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<SaveMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_save(&req)?;

    let (movie, created) = state.db.upsert_movie(
        req.tmdb_id,
        req.title.trim(),
        req.year,
        req.genre.as_deref(),
        req.director.as_deref(),
        req.synopsis.as_deref(),
        req.poster_url.as_deref(),
    )?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(serde_json::json!({
            "message": if created { "movie created" } else { "movie updated" },
            "movie": movie.into_movie(),
        })),
    ))
}

fn validate_save(req: &SaveMovieRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if req.tmdb_id <= 0 {
        return Err(ApiError::validation("tmdb_id must be a positive integer"));
    }
    if let Some(year) = req.year {
        if !(1800..=2100).contains(&year) {
            return Err(ApiError::validation("year must be between 1800 and 2100"));
        }
    }
    if let Some(genre) = &req.genre {
        if genre.is_empty() || genre.len() > 100 {
            return Err(ApiError::validation("genre must be 1-100 characters"));
        }
    }
    if let Some(director) = &req.director {
        if director.is_empty() || director.len() > 255 {
            return Err(ApiError::validation("director must be 1-255 characters"));
        }
    }
    if let Some(synopsis) = &req.synopsis {
        if synopsis.len() > 5000 {
            return Err(ApiError::validation("synopsis must be at most 5000 characters"));
        }
    }
    if let Some(url) = &req.poster_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::validation("poster_url must be an http(s) URL"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> SaveMovieRequest {
        SaveMovieRequest {
            title: "Dune".to_string(),
            tmdb_id: 438631,
            year: Some(2021),
            genre: Some("Sci-Fi".to_string()),
            director: Some("Denis Villeneuve".to_string()),
            synopsis: None,
            poster_url: Some("https://image.tmdb.org/t/p/w500/dune.jpg".to_string()),
        }
    }

    #[test]
    fn top_limit_is_clamped_not_rejected() {
        assert_eq!(clamp_top_limit(10), 10);
        assert_eq!(clamp_top_limit(50), 50);
        assert_eq!(clamp_top_limit(51), 50);
        assert_eq!(clamp_top_limit(u32::MAX), 50);
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_save(&base_request()).is_ok());
    }

    #[test]
    fn title_and_tmdb_id_are_required() {
        let mut req = base_request();
        req.title = "   ".to_string();
        assert!(validate_save(&req).is_err());

        let mut req = base_request();
        req.tmdb_id = 0;
        assert!(validate_save(&req).is_err());

        let mut req = base_request();
        req.tmdb_id = -5;
        assert!(validate_save(&req).is_err());
    }

    #[test]
    fn optional_fields_are_bounded() {
        let mut req = base_request();
        req.year = Some(1700);
        assert!(validate_save(&req).is_err());

        let mut req = base_request();
        req.genre = Some("g".repeat(101));
        assert!(validate_save(&req).is_err());

        let mut req = base_request();
        req.synopsis = Some("s".repeat(5001));
        assert!(validate_save(&req).is_err());

        let mut req = base_request();
        req.poster_url = Some("ftp://posters.example/dune.jpg".to_string());
        assert!(validate_save(&req).is_err());
    }
}
