use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, Credentials};
use crate::config::AuthConfig;

/// JWT payload: the authenticated username and an expiry in Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Body returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Checks login credentials and issues/verifies signed bearer tokens.
pub struct Authenticator {
    expected: Credentials,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_minutes: i64,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            expected: Credentials::new(config.username.clone(), config.password.clone()),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_minutes: config.token_ttl_minutes,
        }
    }

    /// Exchanges correct credentials for a bearer token.
    pub fn login(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        if !credentials.matches(&self.expected) {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue(&credentials.username)
    }

    pub fn issue(&self, subject: &str) -> Result<AccessToken, AuthError> {
        let expires_at = Duration::try_minutes(self.ttl_minutes)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or(AuthError::LifetimeOutOfRange(self.ttl_minutes))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::Issue)?;
        Ok(AccessToken {
            access_token: token,
            token_type: "bearer".to_string(),
        })
    }

    /// Validates signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, ttl_minutes: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            token_ttl_minutes: ttl_minutes,
        }
    }

    #[test]
    fn login_issues_verifiable_token() {
        let authenticator = Authenticator::new(&config("signing-key", 5));
        let token = authenticator
            .login(&Credentials::new("admin", "secret"))
            .expect("login succeeds");
        assert_eq!(token.token_type, "bearer");

        let claims = authenticator
            .verify(&token.access_token)
            .expect("token verifies");
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let authenticator = Authenticator::new(&config("signing-key", 5));
        let result = authenticator.login(&Credentials::new("admin", "guess"));
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn expired_token_fails_verification() {
        let authenticator = Authenticator::new(&config("signing-key", -10));
        let token = authenticator.issue("admin").expect("issued");
        assert!(matches!(
            authenticator.verify(&token.access_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_fails_verification() {
        let issuer = Authenticator::new(&config("first-key", 5));
        let verifier = Authenticator::new(&config("second-key", 5));
        let token = issuer.issue("admin").expect("issued");
        assert!(verifier.verify(&token.access_token).is_err());
        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        for ttl in [1_000_000_000_000, i64::MAX] {
            let authenticator = Authenticator::new(&config("signing-key", ttl));
            assert!(matches!(
                authenticator.issue("admin"),
                Err(AuthError::LifetimeOutOfRange(minutes)) if minutes == ttl
            ));
        }
    }
}
