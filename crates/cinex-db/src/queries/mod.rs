mod lists;
mod movies;
mod ratings;
mod users;

use anyhow::Result;

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::Database;
    use crate::models::{MovieRow, UserRow};

    pub fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory database")
    }

    pub fn seed_user(db: &Database, email: &str, username: &str) -> UserRow {
        db.create_user(email, username, "$argon2id$fake-hash")
            .expect("seed user")
    }

    pub fn seed_movie(db: &Database, tmdb_id: i64, title: &str) -> MovieRow {
        let (movie, created) = db
            .upsert_movie(tmdb_id, title, Some(2000), Some("Drama"), None, None, None)
            .expect("seed movie");
        assert!(created);
        movie
    }
}
