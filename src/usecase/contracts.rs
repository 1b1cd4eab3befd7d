use crate::repository::errors::RepositoryError;

/// Durable key-value store holding the session tokens. Calls may block; the
/// session manager runs them on the blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
    fn remove(&self, key: &str) -> Result<(), RepositoryError>;
}
