use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CustomList, ListKind, Movie, User};

// -- JWT Claims --

/// JWT claims shared between token minting (auth handlers) and token
/// verification (REST middleware). Canonical definition lives here in
/// cinex-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Catalog --

/// A search/popular result from the catalog collaborator. Not yet a local
/// movie: it becomes one when saved through `POST /movies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieCandidate {
    pub tmdb_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub count: usize,
    pub data: Vec<MovieCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveMovieRequest {
    pub title: String,
    pub tmdb_id: i64,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
}

// -- Movies --

#[derive(Debug, Serialize)]
pub struct MovieWithStats {
    #[serde(flatten)]
    pub movie: Movie,
    pub average: f64,
    pub rating_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub source: &'static str,
    pub count: usize,
    pub data: Vec<MovieWithStats>,
}

// -- Ratings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateMovieRequest {
    pub movie_id: i64,
    pub score: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRatingRequest {
    pub score: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RaterInfo {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub id: i64,
    pub movie_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: RaterInfo,
}

/// Aggregates are recomputed from the full rating set on every read; the
/// distribution always carries all five buckets, zero-filled.
#[derive(Debug, Serialize)]
pub struct RatingStats {
    pub count: i64,
    pub average: f64,
    pub distribution: BTreeMap<u8, i64>,
}

#[derive(Debug, Serialize)]
pub struct MovieRatingsResponse {
    pub movie_id: i64,
    pub stats: RatingStats,
    pub ratings: Vec<RatingResponse>,
}

#[derive(Debug, Serialize)]
pub struct MyRatingResponse {
    pub movie_id: i64,
    pub rating: Option<RatingResponse>,
}

// -- Lists --

#[derive(Debug, Serialize)]
pub struct PredefinedListSummary {
    pub kind: ListKind,
    pub display_name: &'static str,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CustomListSummary {
    #[serde(flatten)]
    pub list: CustomList,
    pub item_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MyListsResponse {
    pub predefined: Vec<PredefinedListSummary>,
    pub custom: Vec<CustomListSummary>,
}

/// A movie inside a list, annotated with when it was added to that list.
#[derive(Debug, Serialize)]
pub struct ListedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub list_added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListContentsResponse {
    Predefined {
        kind: ListKind,
        movies: Vec<ListedMovie>,
    },
    Custom {
        #[serde(flatten)]
        list: CustomList,
        movies: Vec<ListedMovie>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomListRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}
