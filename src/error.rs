use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

pub const CODE_NAMESPACE_EXISTS: i32 = 48;
pub const CODE_INDEX_OPTIONS_CONFLICT: i32 = 85;
pub const CODE_INDEX_KEY_SPECS_CONFLICT: i32 = 86;
pub const CODE_DUPLICATE_KEY: i32 = 11000;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot reach database: {0}")]
    ConnectionFailure(#[source] MongoError),
    #[error("index conflict on {collection}.{index}: {reason}")]
    IndexConflict {
        collection: String,
        index: String,
        reason: String,
    },
    #[error("database error: {0}")]
    Database(#[from] MongoError),
}

impl SchemaError {
    pub fn index_conflict(
        collection: impl Into<String>,
        index: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::IndexConflict {
            collection: collection.into(),
            index: index.into(),
            reason: reason.into(),
        }
    }
}

/// Server error code carried by a command or single-write failure, if any.
pub fn server_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

pub fn is_duplicate_key(err: &MongoError) -> bool {
    if server_code(err) == Some(CODE_DUPLICATE_KEY) {
        return true;
    }
    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map(|errors| errors.iter().any(|e| e.code == CODE_DUPLICATE_KEY))
            .unwrap_or(false),
        _ => false,
    }
}

pub fn is_namespace_exists(err: &MongoError) -> bool {
    server_code(err) == Some(CODE_NAMESPACE_EXISTS)
}

pub fn is_index_conflict(err: &MongoError) -> bool {
    matches!(
        server_code(err),
        Some(CODE_INDEX_OPTIONS_CONFLICT) | Some(CODE_INDEX_KEY_SPECS_CONFLICT)
    )
}
