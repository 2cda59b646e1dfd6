use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::AuthError;

/// Username/password pair presented to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses an `Authorization: Basic <base64(user:pass)>` header value.
    pub fn from_basic_header(value: &str) -> Result<Self, AuthError> {
        let encoded = strip_scheme(value, "Basic").ok_or(AuthError::MissingCredentials)?;
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| AuthError::MalformedCredentials)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or(AuthError::MalformedCredentials)?;
        Ok(Self::new(username, password))
    }

    pub fn to_basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }

    /// Compares both fields without short-circuiting on the first mismatch.
    pub(crate) fn matches(&self, expected: &Credentials) -> bool {
        let username = constant_time_eq(self.username.as_bytes(), expected.username.as_bytes());
        let password = constant_time_eq(self.password.as_bytes(), expected.password.as_bytes());
        username & password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    strip_scheme(value, "Bearer").filter(|token| !token.is_empty())
}

fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (candidate, rest) = value.trim().split_once(' ')?;
    candidate
        .eq_ignore_ascii_case(scheme)
        .then(|| rest.trim())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    let mut diff = left.len() ^ right.len();
    for (index, byte) in left.iter().enumerate() {
        let other = if right.is_empty() {
            0
        } else {
            right[index % right.len()]
        };
        diff |= usize::from(byte ^ other);
    }
    diff == 0
}
