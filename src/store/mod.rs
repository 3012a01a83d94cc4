//! Storage adapters behind the attendance pipeline's store traits.

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// True when the error is the database rejecting a duplicate key.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
