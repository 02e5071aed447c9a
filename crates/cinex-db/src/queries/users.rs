use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::Database;
use crate::models::UserRow;

impl Database {
    pub fn create_user(&self, email: &str, username: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, username, password) VALUES (?1, ?2, ?3)",
                (email, username, password_hash),
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, "id = ?1", &[&id])?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &[&id]))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", &[&email]))
    }

    /// Registration duplicate check: either field colliding blocks the signup.
    pub fn find_user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1 OR username = ?2", &[&email, &username]))
    }
}

fn query_user(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, username, password, created_at FROM users WHERE {}",
        filter
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row(params, |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                username: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_user, test_db};

    #[test]
    fn email_lookup_is_case_insensitive() {
        let db = test_db();
        seed_user(&db, "ana@example.com", "ana");

        let found = db.get_user_by_email("ANA@Example.COM").unwrap();
        assert_eq!(found.map(|u| u.username), Some("ana".to_string()));
    }

    #[test]
    fn duplicate_email_or_username_is_detected() {
        let db = test_db();
        seed_user(&db, "ana@example.com", "ana");

        let by_email = db
            .find_user_by_email_or_username("ana@example.com", "someone")
            .unwrap();
        assert!(by_email.is_some());

        let by_username = db
            .find_user_by_email_or_username("other@example.com", "ana")
            .unwrap();
        assert!(by_username.is_some());

        let free = db
            .find_user_by_email_or_username("other@example.com", "someone")
            .unwrap();
        assert!(free.is_none());
    }

    #[test]
    fn duplicate_insert_hits_the_unique_constraint() {
        let db = test_db();
        seed_user(&db, "ana@example.com", "ana");

        let err = db.create_user("Ana@example.com", "ana2", "hash");
        assert!(err.is_err());
    }
}
