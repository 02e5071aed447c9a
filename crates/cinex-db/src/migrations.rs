use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            email       TEXT NOT NULL COLLATE NOCASE UNIQUE,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS movies (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            tmdb_id     INTEGER NOT NULL UNIQUE,
            title       TEXT NOT NULL,
            year        INTEGER,
            genre       TEXT,
            director    TEXT,
            synopsis    TEXT,
            poster_url  TEXT,
            added_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS ratings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            movie_id    INTEGER NOT NULL REFERENCES movies(id),
            score       INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
            comment     TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, movie_id)
        );

        CREATE INDEX IF NOT EXISTS idx_ratings_movie
            ON ratings(movie_id);

        -- One row per (user, movie, predefined list) membership.
        CREATE TABLE IF NOT EXISTS list_entries (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            movie_id    INTEGER NOT NULL REFERENCES movies(id),
            kind        TEXT NOT NULL CHECK (kind IN ('to_watch', 'watched', 'favorites')),
            added_at    TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, movie_id, kind)
        );

        CREATE INDEX IF NOT EXISTS idx_list_entries_user_kind
            ON list_entries(user_id, kind, added_at);

        CREATE TABLE IF NOT EXISTS custom_lists (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            name        TEXT NOT NULL,
            description TEXT,
            private     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, name)
        );

        CREATE TABLE IF NOT EXISTS custom_list_items (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            list_id     INTEGER NOT NULL REFERENCES custom_lists(id) ON DELETE CASCADE,
            movie_id    INTEGER NOT NULL REFERENCES movies(id),
            added_at    TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(list_id, movie_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
