use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Identity claim carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Longest accepted session lifetime, in hours (one year).
pub const MAX_TTL_HOURS: i64 = 24 * 365;

impl Claims {
    pub fn new(user_id: i64, email: &str, role: &str, ttl: Duration) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).ok_or_else(|| {
            TokenError::Configuration("token lifetime overflows the clock".to_string())
        })?;
        Ok(Self {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No usable signing key.
    Configuration(String),
    Invalid(String),
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Configuration(msg) => write!(f, "token configuration error: {msg}"),
            TokenError::Invalid(msg) => write!(f, "invalid token: {msg}"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies HS256 session tokens with a process-wide key.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::Configuration(
                "signing secret is not configured".to_string(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(TokenError::Configuration(
                "token lifetime must be positive".to_string(),
            ));
        }
        if ttl > Duration::hours(MAX_TTL_HOURS) {
            return Err(TokenError::Configuration(format!(
                "token lifetime exceeds {MAX_TTL_HOURS} hours"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64, email: &str, role: &str) -> Result<String, TokenError> {
        self.encode(&Claims::new(user_id, email, role, self.ttl)?)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Invalid(format!("encode failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-signing-secret", Duration::hours(48)).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_same_claims() {
        let tokens = service();
        let token = tokens.issue(7, "alice@example.com", "individual_user").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, "individual_user");
        assert_eq!(claims.exp - claims.iat, Duration::hours(48).num_seconds());
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let other = TokenService::new("another-secret", Duration::hours(1)).unwrap();
        let token = other.issue(1, "a@b.co", "admin").unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let tokens = service();
        let mut token = tokens.issue(1, "a@b.co", "admin").unwrap();
        token.push('x');
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
        assert!(matches!(tokens.verify("garbage"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "a@b.co".to_string(),
            role: "admin".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = tokens.encode(&claims).unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn missing_signing_secret_is_a_configuration_error() {
        assert!(matches!(
            TokenService::new("", Duration::hours(1)),
            Err(TokenError::Configuration(_))
        ));
        assert!(matches!(
            TokenService::new("   ", Duration::hours(1)),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn non_positive_ttl_is_a_configuration_error() {
        assert!(matches!(
            TokenService::new("secret", Duration::zero()),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn oversized_ttl_is_a_configuration_error() {
        assert!(matches!(
            TokenService::new("secret", Duration::hours(MAX_TTL_HOURS + 1)),
            Err(TokenError::Configuration(_))
        ));
        assert!(TokenService::new("secret", Duration::hours(MAX_TTL_HOURS)).is_ok());
    }

    #[test]
    fn claims_reject_a_lifetime_past_the_clock() {
        assert!(matches!(
            Claims::new(1, "a@b.co", "admin", Duration::MAX),
            Err(TokenError::Configuration(_))
        ));
    }
}
