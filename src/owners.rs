use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension};

use crate::error::AdminError;

/// An account row. Homestay owners and superusers live in the same table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    id: i64,
    username: String,
    email: String,
    is_superuser: bool,
}

impl Owner {
    const SELECT_COLUMNS: &'static str = "SELECT id, username, email, is_superuser FROM users";

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Owner {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            is_superuser: row.get(3)?,
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Self>, AdminError> {
        let sql = format!("{} WHERE id = ?", Self::SELECT_COLUMNS);
        conn.query_row(&sql, [id], Self::from_row)
            .optional()
            .map_err(AdminError::DatabaseError)
    }

    pub fn get_by_username(conn: &Connection, username: &str) -> Result<Option<Self>, AdminError> {
        let sql = format!("{} WHERE username = ?", Self::SELECT_COLUMNS);
        conn.query_row(&sql, [username], Self::from_row)
            .optional()
            .map_err(AdminError::DatabaseError)
    }

    pub fn exists(conn: &Connection, username: &str) -> Result<bool, AdminError> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?)",
            [username],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Inserts a staff + superuser account with a bcrypt hash of `password`.
    pub fn create_superuser(
        conn: &Connection,
        username: &str,
        email: &str,
        password: &str,
        bcrypt_cost: u32,
    ) -> Result<Self, AdminError> {
        if username.trim().is_empty() {
            return Err(AdminError::user_input("The given username must be set"));
        }

        let password_hash = bcrypt::hash(password, bcrypt_cost)?;

        let id: i64 = conn.query_row(
            "INSERT INTO users (
                username, email, password_hash, is_staff, is_superuser, is_active, date_joined
            )
            VALUES (:username, :email, :password_hash, 1, 1, 1, :date_joined)
            RETURNING id",
            named_params! {
                ":username":      username,
                ":email":         email,
                ":password_hash": password_hash,
                ":date_joined":   Utc::now().timestamp(),
            },
            |row| row.get(0),
        )?;

        Ok(Owner {
            id,
            username: username.to_owned(),
            email: email.to_owned(),
            is_superuser: true,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}
