use std::path::PathBuf;

#[derive(Debug)]
pub enum StorageError {
    /// No remote store configured, or it could not be reached.
    Unavailable,
    Sqlx(sqlx::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidFileType(PathBuf),
    InvalidRecord(String),
    /// A blocking file task panicked or was cancelled.
    Task(tokio::task::JoinError),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StorageError::Sqlx(sqlx::Error::Migrate(Box::new(err)))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Json(err)
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Task(err)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "remote store unavailable"),
            StorageError::Sqlx(e) => write!(f, "database error: {}", e),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Json(e) => write!(f, "JSON error: {}", e),
            StorageError::InvalidFileType(p) => {
                write!(f, "unsupported file type: {}", p.display())
            }
            StorageError::InvalidRecord(msg) => write!(f, "invalid record: {}", msg),
            StorageError::Task(e) => write!(f, "background task failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}
