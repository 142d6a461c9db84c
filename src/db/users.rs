use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use super::Database;
use super::catalog::unique_conflict;
use crate::error::Result;
use crate::models::{Role, Session, User};

impl Database {
    // -- Users --

    pub fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        let now = Utc::now();
        self.conn()
            .execute(
                "INSERT INTO users (username, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![username, password_hash, role, now],
            )
            .map_err(|e| unique_conflict(e, "user", username))?;
        Ok(User {
            id: self.conn().last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
        })
    }

    pub fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, username, password_hash, role, created_at FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, username, password_hash, role, created_at FROM users ORDER BY username ASC",
        )?;
        let rows = stmt.query_map([], row_to_user)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    // -- Sessions --

    pub fn insert_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id,
                session.created_at,
                session.expires_at
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let session = self
            .conn()
            .query_row(
                "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |row| {
                    Ok(Session {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Returns whether a session was removed.
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(changed > 0)
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self
            .conn()
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
        Ok(removed)
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::Duration;

    #[test]
    fn sessions_expire_and_purge() {
        let db = Database::open_in_memory().unwrap();
        let user = db.insert_user("desk", "hash", Role::Staff).unwrap();
        let now = Utc::now();
        for (token, hours) in [("old", -1), ("fresh", 2)] {
            db.insert_session(&Session {
                token: token.to_string(),
                user_id: user.id,
                created_at: now,
                expires_at: now + Duration::hours(hours),
            })
            .unwrap();
        }

        assert_eq!(db.purge_expired_sessions(now).unwrap(), 1);
        assert!(db.get_session("old").unwrap().is_none());
        assert!(db.get_session("fresh").unwrap().is_some());
        assert!(db.delete_session("fresh").unwrap());
        assert!(!db.delete_session("fresh").unwrap());
    }

    #[test]
    fn duplicate_usernames_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user("desk", "hash", Role::Admin).unwrap();
        assert!(matches!(
            db.insert_user("desk", "other", Role::Staff),
            Err(Error::Conflict(_))
        ));
        assert_eq!(db.find_user("desk").unwrap().unwrap().role, Role::Admin);
    }
}
