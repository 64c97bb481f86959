//! Spotify login via Authorization Code + PKCE.
//!
//! `SessionStore` correlates the redirect callback with the request that
//! issued the login URL; `OAuthService` builds that URL and performs the
//! code and refresh-token exchanges.

pub mod handlers;
pub mod pkce;
mod service;
mod session;

pub use service::{OAuthService, TokenSet};
pub use session::{AuthorizationSession, PendingAuthorization, SessionStore};
