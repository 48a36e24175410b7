use thiserror::Error;
use wikihop_scanner::ScanError;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Scanner error: {0}")]
    Scanner(ScanError),
}

impl From<ScanError> for FinderError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidPage(msg) => FinderError::InvalidArgument(msg),
            other => FinderError::Scanner(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
