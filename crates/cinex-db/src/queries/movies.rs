use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::Database;
use crate::models::{MovieRow, MovieStatsRow};

pub(crate) const MOVIE_COLS: &str =
    "m.id, m.tmdb_id, m.title, m.year, m.genre, m.director, m.synopsis, m.poster_url, m.added_at";

/// Map the nine movie columns starting at `offset` within the row.
pub(crate) fn movie_from_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<MovieRow> {
    Ok(MovieRow {
        id: row.get(offset)?,
        tmdb_id: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        year: row.get(offset + 3)?,
        genre: row.get(offset + 4)?,
        director: row.get(offset + 5)?,
        synopsis: row.get(offset + 6)?,
        poster_url: row.get(offset + 7)?,
        added_at: row.get(offset + 8)?,
    })
}

impl Database {
    pub fn get_movie(&self, id: i64) -> Result<Option<MovieRow>> {
        self.with_conn(|conn| query_movie_by_id(conn, id))
    }

    /// Upsert-by-tmdb_id. Returns the stored row and whether it was created
    /// (as opposed to updated in place).
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_movie(
        &self,
        tmdb_id: i64,
        title: &str,
        year: Option<i32>,
        genre: Option<&str>,
        director: Option<&str>,
        synopsis: Option<&str>,
        poster_url: Option<&str>,
    ) -> Result<(MovieRow, bool)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM movies WHERE tmdb_id = ?1",
                    [tmdb_id],
                    |row| row.get(0),
                )
                .optional()?;

            let (id, created) = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE movies
                         SET title = ?1, year = ?2, genre = ?3, director = ?4,
                             synopsis = ?5, poster_url = ?6
                         WHERE id = ?7",
                        rusqlite::params![title, year, genre, director, synopsis, poster_url, id],
                    )?;
                    (id, false)
                }
                None => {
                    tx.execute(
                        "INSERT INTO movies (tmdb_id, title, year, genre, director, synopsis, poster_url)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        rusqlite::params![tmdb_id, title, year, genre, director, synopsis, poster_url],
                    )?;
                    (tx.last_insert_rowid(), true)
                }
            };

            let movie = query_movie_by_id(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("movie {} vanished after upsert", id))?;
            tx.commit()?;

            Ok((movie, created))
        })
    }

    pub fn get_movie_with_stats(&self, id: i64) -> Result<Option<MovieStatsRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MOVIE_COLS}, COALESCE(AVG(r.score), 0.0), COUNT(r.id)
                 FROM movies m
                 LEFT JOIN ratings r ON r.movie_id = m.id
                 WHERE m.id = ?1
                 GROUP BY m.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_stats_row).optional()?;
            Ok(row)
        })
    }

    /// Most-rated movies first; catalog recency breaks ties.
    pub fn top_movies(&self, limit: u32) -> Result<Vec<MovieStatsRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MOVIE_COLS}, COALESCE(AVG(r.score), 0.0), COUNT(r.id)
                 FROM movies m
                 LEFT JOIN ratings r ON r.movie_id = m.id
                 GROUP BY m.id
                 ORDER BY COUNT(r.id) DESC, m.added_at DESC, m.id DESC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], map_stats_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Case-insensitive exact genre match, newest catalog entries first.
    pub fn movies_by_genre(&self, genre: &str) -> Result<Vec<MovieStatsRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MOVIE_COLS}, COALESCE(AVG(r.score), 0.0), COUNT(r.id)
                 FROM movies m
                 LEFT JOIN ratings r ON r.movie_id = m.id
                 WHERE m.genre = ?1 COLLATE NOCASE
                 GROUP BY m.id
                 ORDER BY m.added_at DESC, m.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([genre], map_stats_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_stats_row(row: &rusqlite::Row) -> rusqlite::Result<MovieStatsRow> {
    Ok(MovieStatsRow {
        movie: movie_from_row(row, 0)?,
        average: row.get(9)?,
        rating_count: row.get(10)?,
    })
}

fn query_movie_by_id(conn: &Connection, id: i64) -> Result<Option<MovieRow>> {
    let sql = format!("SELECT {MOVIE_COLS} FROM movies m WHERE m.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt
        .query_row([id], |row| movie_from_row(row, 0))
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_movie, seed_user, test_db};

    #[test]
    fn upsert_creates_then_updates_in_place() {
        let db = test_db();

        let (first, created) = db
            .upsert_movie(438631, "Dune", Some(2021), None, None, None, None)
            .unwrap();
        assert!(created);

        let (second, created) = db
            .upsert_movie(
                438631,
                "Dune: Part One",
                Some(2021),
                Some("Sci-Fi"),
                Some("Denis Villeneuve"),
                None,
                None,
            )
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Dune: Part One");

        // Exactly one row for that tmdb_id.
        let stats = db.top_movies(100).unwrap();
        assert_eq!(
            stats.iter().filter(|s| s.movie.tmdb_id == 438631).count(),
            1
        );
    }

    #[test]
    fn stats_reflect_ratings_live() {
        let db = test_db();
        let user = seed_user(&db, "ana@example.com", "ana");
        let other = seed_user(&db, "bob@example.com", "bob");
        let movie = seed_movie(&db, 278, "The Shawshank Redemption");

        db.insert_rating(user.id, movie.id, 5, None).unwrap();
        db.insert_rating(other.id, movie.id, 4, None).unwrap();

        let stats = db.get_movie_with_stats(movie.id).unwrap().unwrap();
        assert_eq!(stats.rating_count, 2);
        assert!((stats.average - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unrated_movie_has_zero_stats() {
        let db = test_db();
        let movie = seed_movie(&db, 603, "The Matrix");

        let stats = db.get_movie_with_stats(movie.id).unwrap().unwrap();
        assert_eq!(stats.rating_count, 0);
        assert_eq!(stats.average, 0.0);
    }

    #[test]
    fn top_movies_orders_by_rating_count() {
        let db = test_db();
        let a = seed_user(&db, "a@example.com", "a");
        let b = seed_user(&db, "b@example.com", "b");
        let quiet = seed_movie(&db, 1, "Quiet");
        let loud = seed_movie(&db, 2, "Loud");

        db.insert_rating(a.id, loud.id, 3, None).unwrap();
        db.insert_rating(b.id, loud.id, 4, None).unwrap();
        db.insert_rating(a.id, quiet.id, 5, None).unwrap();

        let top = db.top_movies(10).unwrap();
        assert_eq!(top[0].movie.id, loud.id);
        assert_eq!(top[1].movie.id, quiet.id);
    }

    #[test]
    fn genre_match_ignores_case() {
        let db = test_db();
        let (movie, _) = db
            .upsert_movie(27205, "Inception", Some(2010), Some("Sci-Fi"), None, None, None)
            .unwrap();

        let hits = db.movies_by_genre("sci-fi").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].movie.id, movie.id);

        assert!(db.movies_by_genre("Horror").unwrap().is_empty());
    }
}
