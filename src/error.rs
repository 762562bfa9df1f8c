use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("import format error: {0}")]
    ImportFormat(String),
    #[error("annotation file belongs to report {found}, current report is {expected}")]
    ReportMismatch { expected: String, found: String },
    #[error("storage write failed: {0}")]
    StorageWrite(String),
    #[error("config error: {0}")]
    Config(String),
}
