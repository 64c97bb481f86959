use std::collections::HashMap;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::pkce;
use crate::error::AuthError;

/// Server-side half of an in-flight login attempt.
#[derive(Debug, Clone)]
pub struct AuthorizationSession {
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
}

/// What the caller needs to build the redirect; the verifier stays in the store.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub state: String,
    pub code_challenge: String,
}

/// Maps opaque state tokens to their PKCE verifier until the callback redeems them.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, AuthorizationSession>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// `ttl_seconds == 0` keeps unredeemed entries for the life of the process.
    pub fn new(ttl_seconds: u64) -> Self {
        let ttl = (ttl_seconds > 0).then(|| Duration::seconds(ttl_seconds as i64));
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn begin(&self) -> PendingAuthorization {
        let state = pkce::generate_state();
        let pair = pkce::generate_verifier_and_challenge();

        let mut sessions = self.sessions.lock().await;
        if let Some(ttl) = self.ttl {
            let cutoff = Utc::now() - ttl;
            Self::retain_newer_than(&mut sessions, cutoff);
        }
        sessions.insert(
            state.clone(),
            AuthorizationSession {
                code_verifier: pair.verifier,
                created_at: Utc::now(),
            },
        );

        PendingAuthorization {
            state,
            code_challenge: pair.challenge,
        }
    }

    /// Removes and returns the verifier for `state`. A state redeems at most once.
    pub async fn redeem(&self, state: &str) -> Result<String, AuthError> {
        self.sessions
            .lock()
            .await
            .remove(state)
            .map(|session| session.code_verifier)
            .ok_or(AuthError::InvalidState)
    }

    /// Drops every entry created before `cutoff`, returning how many were removed.
    #[cfg(test)]
    pub(crate) async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        Self::retain_newer_than(&mut sessions, cutoff)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn retain_newer_than(
        sessions: &mut HashMap<String, AuthorizationSession>,
        cutoff: DateTime<Utc>,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| session.created_at >= cutoff);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!("Purged {} abandoned authorization sessions", purged);
        }
        purged
    }
}
