use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::domain::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Session, TokenPair};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::TokenStore;

/// Owns the token pair of one client. Every mutation writes the durable store
/// while the state lock is held, so memory and store agree outside of a refresh.
/// Store I/O runs on the blocking pool.
pub struct SessionManager<S>
where
    S: TokenStore,
{
    store: Arc<S>,
    state: Mutex<Option<Session>>,
    refresh_lock: Mutex<()>,
}

impl<S> SessionManager<S>
where
    S: TokenStore,
{
    /// Restores the session persisted by a previous run. A refresh token
    /// without an access token is not a usable session and is ignored.
    pub fn load(store: S) -> Self {
        let access_token = read_or_log(&store, ACCESS_TOKEN_KEY);
        let refresh_token = read_or_log(&store, REFRESH_TOKEN_KEY);

        let state = access_token.map(|access| Session::new(access, refresh_token));
        tracing::debug!(restored = state.is_some(), "session loaded from token store");

        Self {
            store: Arc::new(store),
            state: Mutex::new(state),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.state.lock().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Replaces whatever is held with a freshly issued pair.
    pub async fn establish(&self, pair: TokenPair) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let session = Session::from(pair);
        self.persist(state.clone(), session.clone()).await?;
        *state = Some(session);
        tracing::info!("session established");
        Ok(())
    }

    /// Applies a refresh response to the held session. Returns `None` when the
    /// session was cleared while the refresh was in flight; it is not revived.
    pub async fn rotate(&self, pair: TokenPair) -> Result<Option<Session>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(current) = state.clone() else {
            tracing::warn!("session cleared during refresh, discarding new tokens");
            return Ok(None);
        };

        let mut rotated = current.clone();
        rotated.rotate(pair);
        self.persist(Some(current), rotated.clone()).await?;
        *state = Some(rotated.clone());
        Ok(Some(rotated))
    }

    /// Drops both tokens from memory and the store. Never fails; store errors are logged.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = None;
        self.erase().await;
    }

    /// Clears the session only if it still holds `sent_token`. A session that
    /// was established or rotated after the request went out is kept.
    pub async fn clear_if_current(&self, sent_token: Option<&str>) -> bool {
        let mut state = self.state.lock().await;
        match state.as_ref() {
            Some(session) if sent_token == Some(session.access_token.as_str()) => {}
            _ => return false,
        }
        *state = None;
        self.erase().await;
        true
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serializes refresh attempts across concurrent requests.
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    /// Writes `next` to the store. On failure the store is put back to
    /// `previous`, or emptied if that fails too, so it never holds a mixed pair.
    async fn persist(&self, previous: Option<Session>, next: Session) -> Result<(), RepositoryError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let Err(e) = write(store.as_ref(), &next) else {
                return Ok(());
            };

            tracing::error!(error = %e, "failed to persist session, restoring previous tokens");
            let restored = previous.is_some_and(|session| write(store.as_ref(), &session).is_ok());
            if !restored {
                erase(store.as_ref());
            }
            Err(e)
        })
        .await
        .map_err(|e| RepositoryError::Io(format!("token store task failed: {e}")))?
    }

    async fn erase(&self) {
        let store = Arc::clone(&self.store);
        if let Err(e) = tokio::task::spawn_blocking(move || erase(store.as_ref())).await {
            tracing::error!(error = %e, "token store task failed");
        }
    }
}

fn write<S: TokenStore>(store: &S, session: &Session) -> Result<(), RepositoryError> {
    store.set(ACCESS_TOKEN_KEY, &session.access_token)?;
    match &session.refresh_token {
        Some(refresh) => store.set(REFRESH_TOKEN_KEY, refresh),
        None => store.remove(REFRESH_TOKEN_KEY),
    }
}

fn erase<S: TokenStore>(store: &S) {
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
        if let Err(e) = store.remove(key) {
            tracing::error!(key, error = %e, "failed to remove token from store");
        }
    }
}

fn read_or_log<S: TokenStore>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::error!(key, error = %e, "failed to read token store");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::memory::MemoryTokenStore;
    use crate::usecase::contracts::MockTokenStore;

    fn pair(access: &str, refresh: Option<&str>) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            token_type: None,
            expires_in: None,
        }
    }

    #[tokio::test]
    async fn test_load_restores_persisted_session() {
        let store = MemoryTokenStore::with_entries([
            (ACCESS_TOKEN_KEY, "a1"),
            (REFRESH_TOKEN_KEY, "r1"),
        ]);

        let manager = SessionManager::load(store);
        let session = manager.current().await.unwrap();

        assert_eq!(session.access_token, "a1");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_load_ignores_orphan_refresh_token() {
        let store = MemoryTokenStore::with_entries([(REFRESH_TOKEN_KEY, "r1")]);
        let manager = SessionManager::load(store);
        assert!(!tokio_test::block_on(manager.is_authenticated()));
    }

    #[tokio::test]
    async fn test_load_survives_store_errors() {
        let mut store = MockTokenStore::new();
        store
            .expect_get()
            .returning(|_| Err(RepositoryError::Io("disk gone".to_string())));

        let manager = SessionManager::load(store);
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_establish_writes_both_keys() {
        let mut store = MockTokenStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .with(eq(ACCESS_TOKEN_KEY), eq("a1"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set()
            .with(eq(REFRESH_TOKEN_KEY), eq("r1"))
            .times(1)
            .returning(|_, _| Ok(()));

        let manager = SessionManager::load(store);
        manager.establish(pair("a1", Some("r1"))).await.unwrap();

        assert_eq!(manager.access_token().await.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_establish_failure_leaves_memory_untouched() {
        let mut store = MockTokenStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|_, _| Err(RepositoryError::Io("read-only".to_string())));
        store.expect_remove().times(2).returning(|_| Ok(()));

        let manager = SessionManager::load(store);
        assert!(manager.establish(pair("a1", None)).await.is_err());
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_establish_half_written_pair_is_erased() {
        let mut store = MockTokenStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .with(eq(ACCESS_TOKEN_KEY), eq("a1"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set()
            .with(eq(REFRESH_TOKEN_KEY), eq("r1"))
            .times(1)
            .returning(|_, _| Err(RepositoryError::Io("disk full".to_string())));
        store
            .expect_remove()
            .with(eq(ACCESS_TOKEN_KEY))
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_remove()
            .with(eq(REFRESH_TOKEN_KEY))
            .times(1)
            .returning(|_| Ok(()));

        let manager = SessionManager::load(store);
        assert!(manager.establish(pair("a1", Some("r1"))).await.is_err());
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_rotate_half_written_pair_restores_previous() {
        let mut store = MockTokenStore::new();
        store
            .expect_get()
            .with(eq(ACCESS_TOKEN_KEY))
            .returning(|_| Ok(Some("a1".to_string())));
        store
            .expect_get()
            .with(eq(REFRESH_TOKEN_KEY))
            .returning(|_| Ok(Some("r1".to_string())));
        store
            .expect_set()
            .with(eq(ACCESS_TOKEN_KEY), eq("a2"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set()
            .with(eq(REFRESH_TOKEN_KEY), eq("r2"))
            .times(1)
            .returning(|_, _| Err(RepositoryError::Io("disk full".to_string())));
        store
            .expect_set()
            .with(eq(ACCESS_TOKEN_KEY), eq("a1"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set()
            .with(eq(REFRESH_TOKEN_KEY), eq("r1"))
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_remove().never();

        let manager = SessionManager::load(store);
        assert!(manager.rotate(pair("a2", Some("r2"))).await.is_err());

        let session = manager.current().await.unwrap();
        assert_eq!(session.access_token, "a1");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_clear_if_current_keeps_newer_session() {
        let manager = SessionManager::load(MemoryTokenStore::new());
        manager.establish(pair("fresh", Some("r2"))).await.unwrap();

        assert!(!manager.clear_if_current(Some("expired")).await);
        assert!(!manager.clear_if_current(None).await);
        assert_eq!(manager.access_token().await.as_deref(), Some("fresh"));
        assert_eq!(
            manager.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(),
            Some("r2")
        );

        assert!(manager.clear_if_current(Some("fresh")).await);
        assert!(!manager.is_authenticated().await);
        assert_eq!(manager.store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_rotate_keeps_refresh_token_and_persists() {
        let manager = SessionManager::load(MemoryTokenStore::new());
        manager.establish(pair("a1", Some("r1"))).await.unwrap();

        let rotated = manager.rotate(pair("a2", None)).await.unwrap().unwrap();

        assert_eq!(rotated.access_token, "a2");
        assert_eq!(rotated.refresh_token.as_deref(), Some("r1"));
        assert_eq!(
            manager.store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("a2")
        );
    }

    #[tokio::test]
    async fn test_rotate_after_clear_does_not_revive() {
        let manager = SessionManager::load(MemoryTokenStore::new());
        manager.establish(pair("a1", Some("r1"))).await.unwrap();
        manager.clear().await;

        assert!(manager.rotate(pair("a2", None)).await.unwrap().is_none());
        assert!(!manager.is_authenticated().await);
        assert_eq!(manager.store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_writes_run_off_the_async_thread() {
        let caller = std::thread::current().id();
        let mut store = MockTokenStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set().times(2).returning(move |_, _| {
            assert_ne!(std::thread::current().id(), caller);
            Ok(())
        });

        let manager = SessionManager::load(store);
        manager.establish(pair("a1", Some("r1"))).await.unwrap();

        assert!(manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_clear_never_fails() {
        let mut store = MockTokenStore::new();
        store.expect_get().returning(|_| Ok(Some("x".to_string())));
        store
            .expect_remove()
            .times(2)
            .returning(|_| Err(RepositoryError::Io("locked".to_string())));

        let manager = SessionManager::load(store);
        assert!(manager.is_authenticated().await);

        manager.clear().await;
        assert!(!manager.is_authenticated().await);
    }
}
