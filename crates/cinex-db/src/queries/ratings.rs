use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::Database;
use crate::models::RatingRow;

const RATING_COLS: &str =
    "r.id, r.user_id, r.movie_id, r.score, r.comment, r.created_at, r.updated_at, u.username";

fn map_rating_row(row: &rusqlite::Row) -> rusqlite::Result<RatingRow> {
    Ok(RatingRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        movie_id: row.get(2)?,
        score: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        username: row.get(7)?,
    })
}

impl Database {
    /// All ratings for a movie, newest first. The caller aggregates; nothing
    /// is cached or denormalized.
    pub fn ratings_for_movie(&self, movie_id: i64) -> Result<Vec<RatingRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {RATING_COLS}
                 FROM ratings r
                 JOIN users u ON u.id = r.user_id
                 WHERE r.movie_id = ?1
                 ORDER BY r.created_at DESC, r.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([movie_id], map_rating_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_user_rating(&self, user_id: i64, movie_id: i64) -> Result<Option<RatingRow>> {
        self.with_conn(|conn| {
            query_rating(
                conn,
                "r.user_id = ?1 AND r.movie_id = ?2",
                &[&user_id, &movie_id],
            )
        })
    }

    /// Check-then-insert under the connection lock. Returns None if the
    /// (user, movie) pair is already rated — the caller reports Conflict and
    /// points at the update operation instead.
    pub fn insert_rating(
        &self,
        user_id: i64,
        movie_id: i64,
        score: i32,
        comment: Option<&str>,
    ) -> Result<Option<RatingRow>> {
        self.with_conn_mut(|conn| {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT id FROM ratings WHERE user_id = ?1 AND movie_id = ?2",
                    [user_id, movie_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO ratings (user_id, movie_id, score, comment) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, movie_id, score, comment],
            )?;
            let id = conn.last_insert_rowid();
            query_rating(conn, "r.id = ?1", &[&id])
        })
    }

    /// Owner-filtered update. A missing row and someone else's row are the
    /// same None — callers report both as NotFound.
    pub fn update_rating(
        &self,
        user_id: i64,
        rating_id: i64,
        score: Option<i32>,
        comment: Option<&str>,
    ) -> Result<Option<RatingRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE ratings
                 SET score = COALESCE(?1, score),
                     comment = COALESCE(?2, comment),
                     updated_at = datetime('now')
                 WHERE id = ?3 AND user_id = ?4",
                rusqlite::params![score, comment, rating_id, user_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_rating(conn, "r.id = ?1", &[&rating_id])
        })
    }

    /// Owner-filtered delete; false means no owned row existed.
    pub fn delete_rating(&self, user_id: i64, rating_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM ratings WHERE id = ?1 AND user_id = ?2",
                [rating_id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn query_rating(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<RatingRow>> {
    let sql = format!(
        "SELECT {RATING_COLS} FROM ratings r JOIN users u ON u.id = r.user_id WHERE {filter}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row(params, map_rating_row).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_movie, seed_user, test_db};

    #[test]
    fn rate_update_delete_cycle() {
        let db = test_db();
        let user = seed_user(&db, "ana@example.com", "ana");
        let movie = seed_movie(&db, 238, "The Godfather");

        let rating = db
            .insert_rating(user.id, movie.id, 5, None)
            .unwrap()
            .expect("first rating inserts");
        assert_eq!(rating.score, 5);
        assert_eq!(rating.comment, None);
        assert_eq!(rating.username, "ana");

        // Second rating for the same pair is a duplicate.
        let dup = db.insert_rating(user.id, movie.id, 4, None).unwrap();
        assert!(dup.is_none());

        // Update changes the visible score.
        let updated = db
            .update_rating(user.id, rating.id, Some(3), Some("rewatched"))
            .unwrap()
            .expect("owner update succeeds");
        assert_eq!(updated.score, 3);
        assert_eq!(updated.comment.as_deref(), Some("rewatched"));

        // Delete frees the pair for a fresh rating.
        assert!(db.delete_rating(user.id, rating.id).unwrap());
        assert!(db.get_user_rating(user.id, movie.id).unwrap().is_none());
        assert!(db.insert_rating(user.id, movie.id, 4, None).unwrap().is_some());
    }

    #[test]
    fn other_users_rows_look_absent() {
        let db = test_db();
        let owner = seed_user(&db, "ana@example.com", "ana");
        let intruder = seed_user(&db, "bob@example.com", "bob");
        let movie = seed_movie(&db, 238, "The Godfather");

        let rating = db.insert_rating(owner.id, movie.id, 5, None).unwrap().unwrap();

        assert!(db.update_rating(intruder.id, rating.id, Some(1), None).unwrap().is_none());
        assert!(!db.delete_rating(intruder.id, rating.id).unwrap());

        // Untouched for the owner.
        let mine = db.get_user_rating(owner.id, movie.id).unwrap().unwrap();
        assert_eq!(mine.score, 5);
    }

    #[test]
    fn movie_ratings_carry_rater_identity() {
        let db = test_db();
        let a = seed_user(&db, "a@example.com", "a");
        let b = seed_user(&db, "b@example.com", "b");
        let movie = seed_movie(&db, 238, "The Godfather");

        db.insert_rating(a.id, movie.id, 5, Some("classic")).unwrap();
        db.insert_rating(b.id, movie.id, 2, None).unwrap();

        let all = db.ratings_for_movie(movie.id).unwrap();
        assert_eq!(all.len(), 2);
        let mut names: Vec<_> = all.iter().map(|r| r.username.as_str()).collect();
        names.sort();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn score_check_constraint_is_the_backstop() {
        let db = test_db();
        let user = seed_user(&db, "ana@example.com", "ana");
        let movie = seed_movie(&db, 238, "The Godfather");

        assert!(db.insert_rating(user.id, movie.id, 0, None).is_err());
        assert!(db.insert_rating(user.id, movie.id, 6, None).is_err());
    }
}
