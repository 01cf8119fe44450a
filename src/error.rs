use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("No player identity available")]
    MissingIdentity,

    #[error("Invalid rank table: {0}")]
    InvalidRankTable(String),

    #[error("Invalid autoclicker settings: {0}")]
    InvalidAnalyzerConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        let message = match &e {
            rusqlite::Error::SqliteFailure(code, Some(msg)) => {
                format!("sqlite {:?}: {}", code.code, msg)
            }
            rusqlite::Error::SqliteFailure(code, None) => format!("sqlite {:?}", code.code),
            other => other.to_string(),
        };
        Error::Storage(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_errors_become_storage_failures() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().starts_with("Storage failure"));
    }

    #[test]
    fn invalid_state_message() {
        let err = Error::InvalidState("round already running");
        assert_eq!(err.to_string(), "Invalid state: round already running");
    }
}
