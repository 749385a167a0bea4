//! Bearer-token decoding (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{BearerClaims, TokenValidationError, validate_claims};

/// Decodes and validates a bearer token into claims.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<BearerClaims, TokenValidationError>;
}

/// HMAC-SHA256 token validator with a shared secret.
pub struct Hs256TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run against the injected `now` in `validate_claims`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256TokenValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenValidator").finish_non_exhaustive()
    }
}

impl TokenValidator for Hs256TokenValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<BearerClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<BearerClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Actor;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(secret: &[u8], claims: &BearerClaims) -> String {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret))
            .expect("failed to encode token")
    }

    #[test]
    fn round_trips_a_signed_token() {
        let now = Utc::now();
        let actor = Actor::broker("broker@example.com");
        let token = mint(b"secret", &BearerClaims::new(&actor, now, now + Duration::minutes(5)));

        let claims = Hs256TokenValidator::new(b"secret").validate(&token, now).unwrap();
        assert_eq!(claims.into_actor(), actor);
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc::now();
        let actor = Actor::user("buyer@example.com");
        let token = mint(b"secret", &BearerClaims::new(&actor, now, now + Duration::minutes(5)));

        let err = Hs256TokenValidator::new(b"other").validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let actor = Actor::user("buyer@example.com");
        let claims = BearerClaims::new(&actor, now - Duration::hours(2), now - Duration::hours(1));
        let token = mint(b"secret", &claims);

        let err = Hs256TokenValidator::new(b"secret").validate(&token, now).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }
}
