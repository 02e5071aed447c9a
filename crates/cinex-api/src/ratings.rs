use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use cinex_db::models::{RatingRow, parse_sqlite_datetime};
use cinex_types::api::{
    Claims, MovieRatingsResponse, MyRatingResponse, RateMovieRequest, RaterInfo, RatingResponse,
    RatingStats, UpdateRatingRequest,
};

use crate::auth::AppStateInner;
use crate::error::ApiError;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn rating_response(row: RatingRow) -> RatingResponse {
    RatingResponse {
        id: row.id,
        movie_id: row.movie_id,
        score: row.score,
        comment: row.comment,
        created_at: parse_sqlite_datetime(&row.created_at),
        updated_at: parse_sqlite_datetime(&row.updated_at),
        user: RaterInfo {
            id: row.user_id,
            username: row.username,
        },
    }
}

/// Count, mean and per-score buckets, recomputed from the full rating set.
/// All five buckets are always present, zero-filled.
fn build_stats(rows: &[RatingRow]) -> RatingStats {
    let mut distribution: BTreeMap<u8, i64> = (1..=5).map(|score| (score, 0)).collect();
    for row in rows {
        if let Some(bucket) = distribution.get_mut(&(row.score as u8)) {
            *bucket += 1;
        }
    }

    let count = rows.len() as i64;
    let average = if count == 0 {
        0.0
    } else {
        round2(rows.iter().map(|r| r.score as f64).sum::<f64>() / count as f64)
    };

    RatingStats {
        count,
        average,
        distribution,
    }
}

fn validate_score(score: i32) -> Result<(), ApiError> {
    if !(1..=5).contains(&score) {
        return Err(ApiError::validation("score must be an integer between 1 and 5"));
    }
    Ok(())
}

/// Public aggregation: no auth, stats recomputed on every call.
pub async fn movie_ratings(
    State(state): State<Arc<AppStateInner>>,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.ratings_for_movie(movie_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow::anyhow!(e))
        })??;

    let stats = build_stats(&rows);
    let ratings = rows.into_iter().map(rating_response).collect();

    Ok(Json(MovieRatingsResponse {
        movie_id,
        stats,
        ratings,
    }))
}

pub async fn my_rating(
    State(state): State<Arc<AppStateInner>>,
    Path(movie_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = state
        .db
        .get_user_rating(claims.sub, movie_id)?
        .map(rating_response);

    Ok(Json(MyRatingResponse { movie_id, rating }))
}

pub async fn rate_movie(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RateMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_score(req.score)?;

    // Movie existence first: NotFound outranks Conflict here.
    state
        .db
        .get_movie(req.movie_id)?
        .ok_or_else(|| ApiError::not_found("movie not found"))?;

    let rating = state
        .db
        .insert_rating(claims.sub, req.movie_id, req.score, req.comment.as_deref())?
        .ok_or_else(|| {
            ApiError::conflict("you have already rated this movie; update it instead")
        })?;

    Ok((StatusCode::CREATED, Json(rating_response(rating))))
}

pub async fn update_rating(
    State(state): State<Arc<AppStateInner>>,
    Path(rating_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.score.is_none() && req.comment.is_none() {
        return Err(ApiError::validation("provide a score or a comment to update"));
    }
    if let Some(score) = req.score {
        validate_score(score)?;
    }

    let rating = state
        .db
        .update_rating(claims.sub, rating_id, req.score, req.comment.as_deref())?
        .ok_or_else(|| ApiError::not_found("rating not found"))?;

    Ok(Json(rating_response(rating)))
}

pub async fn delete_rating(
    State(state): State<Arc<AppStateInner>>,
    Path(rating_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.delete_rating(claims.sub, rating_id)? {
        return Err(ApiError::not_found("rating not found"));
    }

    Ok(Json(serde_json::json!({ "message": "rating deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(score: i32) -> RatingRow {
        RatingRow {
            id: 1,
            user_id: 1,
            movie_id: 1,
            score,
            comment: None,
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
            username: "ana".to_string(),
        }
    }

    #[test]
    fn empty_stats_are_zero_filled() {
        let stats = build_stats(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.distribution.len(), 5);
        assert!(stats.distribution.values().all(|&n| n == 0));
    }

    #[test]
    fn distribution_buckets_sum_to_count() {
        let rows: Vec<_> = [5, 5, 4, 2, 2, 2, 1].into_iter().map(row).collect();
        let stats = build_stats(&rows);

        assert_eq!(stats.count, 7);
        assert_eq!(stats.distribution.values().sum::<i64>(), stats.count);
        assert_eq!(stats.distribution[&2], 3);
        assert_eq!(stats.distribution[&3], 0);
        assert_eq!(stats.distribution[&5], 2);
    }

    #[test]
    fn average_is_rounded_to_two_decimals() {
        // 5 + 4 + 4 = 13 / 3 = 4.333...
        let rows: Vec<_> = [5, 4, 4].into_iter().map(row).collect();
        let stats = build_stats(&rows);
        assert_eq!(stats.average, 4.33);

        // 5 + 5 + 4 = 14 / 3 = 4.666... rounds up.
        let rows: Vec<_> = [5, 5, 4].into_iter().map(row).collect();
        assert_eq!(build_stats(&rows).average, 4.67);
    }

    #[test]
    fn score_bounds_are_enforced() {
        assert!(validate_score(0).is_err());
        assert!(validate_score(6).is_err());
        assert!(validate_score(1).is_ok());
        assert!(validate_score(5).is_ok());
    }
}
