//! Admin sessions
//!
//! The write path only needs a yes/no answer for a presented credential,
//! expressed by [`SessionVerifier`]. [`JwtSessions`] answers it with HS256
//! tokens carried in the admin cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Decides whether an opaque credential belongs to an authenticated admin
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> bool;
}

/// Token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies signed, time-limited admin tokens
pub struct JwtSessions {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_hours: i64,
}

impl JwtSessions {
    pub fn new(secret: &str, session_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_hours,
        }
    }

    /// Lifetime of issued tokens
    pub fn session_hours(&self) -> i64 {
        self.session_hours
    }

    /// Sign a fresh admin token
    pub fn issue(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            admin: true,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.session_hours)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

impl SessionVerifier for JwtSessions {
    fn verify(&self, credential: &str) -> bool {
        match self.decode(credential) {
            Ok(claims) => claims.admin,
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                false
            }
        }
    }
}

/// Compare a login attempt with the configured admin password.
/// No configured password means nobody can log in.
pub fn check_password(configured: Option<&str>, attempt: &str) -> bool {
    match configured {
        Some(expected) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(attempt.as_bytes()).into()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let sessions = JwtSessions::new("secret", 24);
        let token = sessions.issue().unwrap();
        assert!(sessions.verify(&token));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtSessions::new("secret", 24).issue().unwrap();
        assert!(!JwtSessions::new("other", 24).verify(&token));
    }

    #[test]
    fn test_garbage_rejected() {
        let sessions = JwtSessions::new("secret", 24);
        assert!(!sessions.verify(""));
        assert!(!sessions.verify("not-a-token"));
    }

    #[test]
    fn test_expired_rejected() {
        let sessions = JwtSessions::new("secret", 24);
        let now = Utc::now().timestamp();
        let claims = Claims {
            admin: true,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(!sessions.verify(&token));
    }

    #[test]
    fn test_non_admin_rejected() {
        let sessions = JwtSessions::new("secret", 24);
        let now = Utc::now().timestamp();
        let claims = Claims {
            admin: false,
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(!sessions.verify(&token));
    }

    #[test]
    fn test_check_password() {
        assert!(check_password(Some("hunter2"), "hunter2"));
        assert!(!check_password(Some("hunter2"), "hunter3"));
        assert!(!check_password(Some("hunter2"), ""));
        assert!(!check_password(None, "anything"));
        assert!(!check_password(Some(""), ""));
    }
}
