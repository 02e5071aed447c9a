use anyhow::Result;
use rusqlite::Connection;

use cinex_types::models::ListKind;

use super::OptionalExt;
use super::movies::{MOVIE_COLS, movie_from_row};
use crate::Database;
use crate::models::{CustomListRow, CustomListSummaryRow, ListedMovieRow};

fn map_listed_movie(row: &rusqlite::Row) -> rusqlite::Result<ListedMovieRow> {
    Ok(ListedMovieRow {
        movie: movie_from_row(row, 0)?,
        added_at: row.get(9)?,
    })
}

fn map_custom_list(row: &rusqlite::Row) -> rusqlite::Result<CustomListRow> {
    Ok(CustomListRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        private: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    // -- Predefined lists --

    /// Insert a (user, movie, kind) membership. Returns false if the entry
    /// already exists, leaving the store untouched.
    pub fn add_list_entry(&self, user_id: i64, movie_id: i64, kind: ListKind) -> Result<bool> {
        self.with_conn_mut(|conn| {
            if entry_exists(conn, user_id, movie_id, kind)? {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO list_entries (user_id, movie_id, kind) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, movie_id, kind.as_str()],
            )?;
            Ok(true)
        })
    }

    /// Remove a membership; false means it was not present, which callers
    /// report as NotFound rather than treating the delete as idempotent.
    pub fn remove_list_entry(&self, user_id: i64, movie_id: i64, kind: ListKind) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM list_entries WHERE user_id = ?1 AND movie_id = ?2 AND kind = ?3",
                rusqlite::params![user_id, movie_id, kind.as_str()],
            )?;
            Ok(deleted > 0)
        })
    }

    /// The compound watched transition: drop any to_watch entry, then insert
    /// the watched entry, all in one transaction. Returns false (and commits
    /// nothing) if the movie is already marked watched.
    pub fn mark_watched(&self, user_id: i64, movie_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM list_entries WHERE user_id = ?1 AND movie_id = ?2 AND kind = 'to_watch'",
                [user_id, movie_id],
            )?;

            if entry_exists(&tx, user_id, movie_id, ListKind::Watched)? {
                // Roll back the to_watch removal too.
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO list_entries (user_id, movie_id, kind) VALUES (?1, ?2, 'watched')",
                [user_id, movie_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn count_list_entries(&self, user_id: i64, kind: ListKind) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM list_entries WHERE user_id = ?1 AND kind = ?2",
                rusqlite::params![user_id, kind.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Contents of a predefined list, most recently added first.
    pub fn list_kind_movies(&self, user_id: i64, kind: ListKind) -> Result<Vec<ListedMovieRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MOVIE_COLS}, e.added_at
                 FROM list_entries e
                 JOIN movies m ON m.id = e.movie_id
                 WHERE e.user_id = ?1 AND e.kind = ?2
                 ORDER BY e.added_at DESC, e.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, kind.as_str()], map_listed_movie)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Custom lists --

    /// Returns None if the user already has a list with that name.
    pub fn create_custom_list(
        &self,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        private: bool,
    ) -> Result<Option<CustomListRow>> {
        self.with_conn_mut(|conn| {
            let taken: Option<i64> = conn
                .query_row(
                    "SELECT id FROM custom_lists WHERE user_id = ?1 AND name = ?2",
                    rusqlite::params![user_id, name],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO custom_lists (user_id, name, description, private) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, name, description, private],
            )?;
            let id = conn.last_insert_rowid();
            query_custom_list(conn, user_id, id)
        })
    }

    /// Owner-filtered lookup; other users' lists look absent.
    pub fn get_custom_list(&self, user_id: i64, list_id: i64) -> Result<Option<CustomListRow>> {
        self.with_conn(|conn| query_custom_list(conn, user_id, list_id))
    }

    pub fn custom_lists_with_counts(&self, user_id: i64) -> Result<Vec<CustomListSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.user_id, l.name, l.description, l.private, l.created_at,
                        COUNT(i.id)
                 FROM custom_lists l
                 LEFT JOIN custom_list_items i ON i.list_id = l.id
                 WHERE l.user_id = ?1
                 GROUP BY l.id
                 ORDER BY l.created_at DESC, l.id DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(CustomListSummaryRow {
                        list: map_custom_list(row)?,
                        item_count: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Contents of a custom list; ownership must already be established via
    /// `get_custom_list`.
    pub fn custom_list_movies(&self, list_id: i64) -> Result<Vec<ListedMovieRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MOVIE_COLS}, i.added_at
                 FROM custom_list_items i
                 JOIN movies m ON m.id = i.movie_id
                 WHERE i.list_id = ?1
                 ORDER BY i.added_at DESC, i.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([list_id], map_listed_movie)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false if the movie is already an item of the list.
    pub fn add_custom_list_item(&self, list_id: i64, movie_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT id FROM custom_list_items WHERE list_id = ?1 AND movie_id = ?2",
                    [list_id, movie_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO custom_list_items (list_id, movie_id) VALUES (?1, ?2)",
                [list_id, movie_id],
            )?;
            Ok(true)
        })
    }

    /// Owner-filtered delete; item rows go with the list via ON DELETE CASCADE.
    pub fn delete_custom_list(&self, user_id: i64, list_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM custom_lists WHERE id = ?1 AND user_id = ?2",
                [list_id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn entry_exists(conn: &Connection, user_id: i64, movie_id: i64, kind: ListKind) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM list_entries WHERE user_id = ?1 AND movie_id = ?2 AND kind = ?3",
            rusqlite::params![user_id, movie_id, kind.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn query_custom_list(conn: &Connection, user_id: i64, list_id: i64) -> Result<Option<CustomListRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, description, private, created_at
         FROM custom_lists WHERE id = ?1 AND user_id = ?2",
    )?;
    let row = stmt
        .query_row([list_id, user_id], map_custom_list)
        .optional()?;
    Ok(row)
}
