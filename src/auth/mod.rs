pub mod middleware;
pub mod password;

pub use middleware::{MaybeUser, RequireUser, SESSION_COOKIE};
pub use password::{hash_password, validate_password_strength, verify_password};

use std::time::Duration;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::db::Database;

/// Generate a cryptographically secure random session token.
pub fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Session duration in seconds.
pub enum SessionDuration {
    /// 1 hour for non-remember-me sessions
    Short,
    /// 30 days for remember-me sessions
    Long,
}

impl SessionDuration {
    #[must_use]
    pub const fn as_seconds(&self) -> i64 {
        match self {
            Self::Short => 3600,     // 1 hour
            Self::Long => 2_592_000, // 30 days
        }
    }
}

/// Periodically delete expired sessions. Runs forever.
pub async fn session_cleanup_loop(db: Database) {
    let interval = Duration::from_secs(3600);

    loop {
        match crate::db::delete_expired_sessions(db.pool()).await {
            Ok(count) => {
                if count > 0 {
                    tracing::info!(expired_sessions = count, "Cleaned up expired sessions");
                }
            }
            Err(e) => {
                tracing::error!("Failed to delete expired sessions: {e:#}");
            }
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();

        assert_eq!(token1.len(), 64);
        assert_eq!(token2.len(), 64);
        assert_ne!(token1, token2); // Should be unique
        assert!(token1.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_session_duration() {
        assert_eq!(SessionDuration::Short.as_seconds(), 3600);
        assert_eq!(SessionDuration::Long.as_seconds(), 2_592_000);
    }
}
