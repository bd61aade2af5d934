//! Per-connection session state.
//!
//! Each browser gets its own [`SessionContext`], keyed by a cookie and kept
//! in the [`SessionRegistry`]. Handlers lock one context, mutate it, and
//! release it before any provider call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::accounts::AccountStore;
use crate::error::{AccessDenied, AccountError};
use crate::watchlist::Watchlist;

/// Login state of one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Error(String),
}

/// Everything the dashboard remembers about one browser.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session: Session,
    watchlist: Watchlist,
    flash: Option<Flash>,
}

impl SessionContext {
    pub fn new(watchlist: Watchlist) -> Self {
        Self {
            session: Session::default(),
            watchlist,
            flash: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create an account. Does not log in.
    pub fn register(
        &mut self,
        store: &dyn AccountStore,
        username: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        store.register(username, password)?;
        info!(username, "account registered");
        Ok(())
    }

    /// Establish the session iff the store verifies the credentials; a
    /// failed attempt leaves the current session as it was.
    pub fn login(
        &mut self,
        store: &dyn AccountStore,
        username: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        if let Err(error) = store.verify(username, password) {
            info!(username, "login rejected");
            return Err(error);
        }
        info!(username, "login succeeded");
        self.session.username = Some(username.to_owned());
        Ok(())
    }

    /// Idempotent. The watchlist survives logout.
    pub fn logout(&mut self) {
        if let Some(username) = self.session.username.take() {
            info!(username, "logged out");
        }
    }

    pub fn watchlist(&self) -> Result<&Watchlist, AccessDenied> {
        if !self.session.is_logged_in() {
            return Err(AccessDenied);
        }
        Ok(&self.watchlist)
    }

    pub fn watchlist_mut(&mut self) -> Result<&mut Watchlist, AccessDenied> {
        if !self.session.is_logged_in() {
            return Err(AccessDenied);
        }
        Ok(&mut self.watchlist)
    }

    pub fn set_flash(&mut self, flash: Flash) {
        self.flash = Some(flash);
    }

    pub fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }
}

/// Shared handle to one connection's context.
pub type SharedContext = Arc<Mutex<SessionContext>>;

pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Bounds on the registry: contexts idle longer than `idle_timeout` are
/// swept, and at `max_sessions` the least recently seen one is evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

#[derive(Debug)]
struct Entry {
    context: SharedContext,
    last_seen: Instant,
}

/// All live connection contexts, keyed by session cookie.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    contexts: RwLock<HashMap<Uuid, Entry>>,
    seed_watchlist: Vec<String>,
    limits: SessionLimits,
}

impl SessionRegistry {
    /// New contexts start with `seed_watchlist`.
    pub fn new(seed_watchlist: Vec<String>) -> Self {
        Self::with_limits(seed_watchlist, SessionLimits::default())
    }

    pub fn with_limits(seed_watchlist: Vec<String>, limits: SessionLimits) -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            seed_watchlist,
            limits: SessionLimits {
                max_sessions: limits.max_sessions.max(1),
                ..limits
            },
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Context for `id`, or a fresh one under a new id when `id` is missing,
    /// unknown or expired. The returned flag is `true` for a fresh context.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, SharedContext, bool) {
        let now = Instant::now();
        let mut contexts = self.contexts.write().await;

        if let Some(id) = id {
            if let Some(entry) = contexts.get_mut(&id) {
                if now.duration_since(entry.last_seen) < self.limits.idle_timeout {
                    entry.last_seen = now;
                    return (id, Arc::clone(&entry.context), false);
                }
                contexts.remove(&id);
                debug!(%id, "session expired");
            }
        }

        self.make_room(&mut contexts, now);

        let id = Uuid::new_v4();
        let context = Arc::new(Mutex::new(SessionContext::new(Watchlist::seeded(
            &self.seed_watchlist,
        ))));
        contexts.insert(
            id,
            Entry {
                context: Arc::clone(&context),
                last_seen: now,
            },
        );
        debug!(%id, live = contexts.len(), "session created");
        (id, context, true)
    }

    /// Sweep idle contexts, then evict least recently seen ones until a new
    /// context fits.
    fn make_room(&self, contexts: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = contexts.len();
        let idle_timeout = self.limits.idle_timeout;
        contexts.retain(|_, entry| now.duration_since(entry.last_seen) < idle_timeout);

        while contexts.len() >= self.limits.max_sessions {
            let oldest = contexts
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    contexts.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - contexts.len();
        if dropped > 0 {
            debug!(dropped, "sessions evicted");
        }
    }

    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::InMemoryAccountStore;

    #[test]
    fn protected_state_is_gated_until_login() {
        let store = InMemoryAccountStore::with_demo_accounts();
        let mut context = SessionContext::new(Watchlist::seeded(["AAPL"]));

        assert_eq!(context.watchlist().err(), Some(AccessDenied));

        context.login(&store, "admin", "1234").expect("demo login");
        assert_eq!(context.session().username(), Some("admin"));
        assert_eq!(context.watchlist().map(Watchlist::len), Ok(1));
    }

    #[test]
    fn failed_login_keeps_session_logged_out() {
        let store = InMemoryAccountStore::with_demo_accounts();
        let mut context = SessionContext::default();

        let err = context
            .login(&store, "admin", "wrongpass")
            .expect_err("must fail");

        assert_eq!(err, AccountError::Authentication);
        assert!(!context.session().is_logged_in());
        assert!(context.watchlist_mut().is_err());
    }

    #[test]
    fn register_does_not_log_in() {
        let store = InMemoryAccountStore::new();
        let mut context = SessionContext::default();

        context.register(&store, "alice", "secret").expect("registers");
        assert!(!context.session().is_logged_in());
    }

    #[test]
    fn logout_is_idempotent_and_keeps_watchlist() {
        let store = InMemoryAccountStore::with_demo_accounts();
        let mut context = SessionContext::default();
        context.login(&store, "admin", "1234").expect("login");
        context.watchlist_mut().expect("gated").add("nvda");

        context.logout();
        context.logout();
        assert!(!context.session().is_logged_in());

        context.login(&store, "admin", "1234").expect("login again");
        assert_eq!(context.watchlist().expect("gated").tickers(), ["NVDA"]);
    }

    #[test]
    fn flash_is_shown_once() {
        let mut context = SessionContext::default();
        context.set_flash(Flash::Error(String::from("nope")));

        assert_eq!(context.take_flash(), Some(Flash::Error(String::from("nope"))));
        assert_eq!(context.take_flash(), None);
    }

    #[tokio::test]
    async fn registry_reuses_known_ids_and_replaces_unknown_ones() {
        let registry = SessionRegistry::new(vec![String::from("aapl")]);

        let (id, _, created) = registry.resolve(None).await;
        assert!(created);

        let (same, _, created) = registry.resolve(Some(id)).await;
        assert_eq!(same, id);
        assert!(!created);

        let (other, context, created) = registry.resolve(Some(Uuid::new_v4())).await;
        assert_ne!(other, id);
        assert!(created);
        assert_eq!(registry.len().await, 2);

        let mut context = context.lock().await;
        assert!(context.watchlist_mut().is_err());
    }

    #[tokio::test]
    async fn registry_stays_within_max_sessions() {
        let registry = SessionRegistry::with_limits(
            vec![String::from("aapl")],
            SessionLimits {
                max_sessions: 3,
                ..SessionLimits::default()
            },
        );

        for _ in 0..100 {
            registry.resolve(None).await;
        }

        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let registry = SessionRegistry::with_limits(
            Vec::new(),
            SessionLimits {
                max_sessions: 10,
                idle_timeout: Duration::ZERO,
            },
        );

        let (first, _, _) = registry.resolve(None).await;
        registry.resolve(None).await;
        let (replacement, _, created) = registry.resolve(Some(first)).await;

        assert!(created);
        assert_ne!(replacement, first);
        assert_eq!(registry.len().await, 1);
    }
}
