use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Token store I/O error: {0}")]
    Io(String),
    #[error("Token store is corrupted: {0}")]
    Corrupted(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(e: std::io::Error) -> Self {
        RepositoryError::Io(e.to_string())
    }
}
