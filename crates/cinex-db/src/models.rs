//! Database row types — these map directly to SQLite rows.
//! Distinct from cinex-types API models to keep the DB layer independent;
//! timestamps stay as the TEXT SQLite hands back and are parsed on the way
//! out via `parse_sqlite_datetime`.

use chrono::{DateTime, Utc};

use cinex_types::models::{CustomList, Movie, User};

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct MovieRow {
    pub id: i64,
    pub tmdb_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub added_at: String,
}

pub struct RatingRow {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Joined from users for response shaping.
    pub username: String,
}

pub struct MovieStatsRow {
    pub movie: MovieRow,
    pub average: f64,
    pub rating_count: i64,
}

pub struct ListedMovieRow {
    pub movie: MovieRow,
    /// When the movie was added to the list, not to the catalog.
    pub added_at: String,
}

pub struct CustomListRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
    pub created_at: String,
}

pub struct CustomListSummaryRow {
    pub list: CustomListRow,
    pub item_count: i64,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; fall back through RFC 3339 first in case
/// a value was written with an explicit offset.
pub fn parse_sqlite_datetime(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl UserRow {
    /// Public model; the credential hash never leaves the db layer.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            username: self.username,
            created_at: parse_sqlite_datetime(&self.created_at),
        }
    }
}

impl MovieRow {
    pub fn into_movie(self) -> Movie {
        Movie {
            id: self.id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            year: self.year,
            genre: self.genre,
            director: self.director,
            synopsis: self.synopsis,
            poster_url: self.poster_url,
            added_at: parse_sqlite_datetime(&self.added_at),
        }
    }
}

impl CustomListRow {
    pub fn into_custom_list(self) -> CustomList {
        CustomList {
            id: self.id,
            name: self.name,
            description: self.description,
            private: self.private,
            created_at: parse_sqlite_datetime(&self.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_naive_timestamps() {
        let dt = parse_sqlite_datetime("2026-08-31 12:30:05");
        assert_eq!(dt.to_rfc3339(), "2026-08-31T12:30:05+00:00");
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let dt = parse_sqlite_datetime("2026-08-31T12:30:05Z");
        assert_eq!(dt.to_rfc3339(), "2026-08-31T12:30:05+00:00");
    }
}
