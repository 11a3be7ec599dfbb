use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use carkeeper_core::UserId;

use crate::{JwtClaims, Role, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed or wrongly signed token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Validates a bearer token and yields its claims.
///
/// `now` is passed in so validation stays deterministic under test.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Mints bearer tokens for authenticated users.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// HMAC-SHA256 token codec with a shared secret.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run against the caller's clock in `validate_claims`.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl TokenIssuer for Hs256Jwt {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims::new(user_id, role, now, now + self.ttl);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> Hs256Jwt {
        Hs256Jwt::new(b"test-secret", Duration::hours(1))
    }

    #[test]
    fn issued_token_validates_and_round_trips_claims() {
        let jwt = codec();
        let user = UserId::new();
        let now = Utc::now();

        let token = jwt.issue(user, Role::Manager, now).unwrap();
        let claims = jwt.validate(&token, now + Duration::minutes(1)).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256Jwt::new(b"other", Duration::hours(1))
            .issue(UserId::new(), Role::Customer, now)
            .unwrap();

        assert!(matches!(codec().validate(&token, now), Err(TokenError::Decode(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = codec();
        let now = Utc::now();
        let token = jwt.issue(UserId::new(), Role::Customer, now).unwrap();

        let err = jwt.validate(&token, now + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, TokenError::Claims(TokenValidationError::Expired)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(codec().validate("not-a-jwt", Utc::now()).is_err());
    }
}
