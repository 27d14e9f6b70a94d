//! Error types for realmkbot-store

use thiserror::Error;

/// Errors that can occur in the archive persistence layer
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Write did not produce a record
    #[error("Write failed: {0}")]
    Write(String),
}

impl From<surrealdb::Error> for ArchiveError {
    fn from(err: surrealdb::Error) -> Self {
        ArchiveError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::Serialization(err.to_string())
    }
}
