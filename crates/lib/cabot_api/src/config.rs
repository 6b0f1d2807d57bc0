//! API server configuration.

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::warn;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:5000").
    pub bind_addr: String,
    /// Secret the session cookie signing key is derived from.
    pub session_secret: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("session_secret", &"<redacted>")
            .finish()
    }
}

/// Resolve the session signing secret.
///
/// Uses `SECRET_KEY` when set. Otherwise a random secret is generated for
/// this process only, so sessions do not survive a restart.
pub fn resolve_session_secret() -> String {
    match std::env::var("SECRET_KEY") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            warn!("SECRET_KEY not set, generating an ephemeral session secret");
            generate_secret()
        }
    }
}

fn generate_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_long_and_distinct() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_secret() {
        let config = ApiConfig {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            session_secret: "hunter2".into(),
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
