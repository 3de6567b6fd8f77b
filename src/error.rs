use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operator mistakes: unknown owner, foreign keep id, missing confirmation
    #[error("{0}")]
    UserInput(String),

    #[error("Error: {0}")]
    Error(String),
}

impl AdminError {
    pub fn user_input(msg: impl Into<String>) -> Self {
        AdminError::UserInput(msg.into())
    }
}
