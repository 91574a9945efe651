//! Bearer token issuing and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Identity, Role};
use crate::error::{ApiError, ApiResult, AuthError};

/// Claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Claims for `identity`, expiring `ttl_secs` from now. A negative ttl
    /// yields claims that are already expired; the expiry saturates rather
    /// than wrapping.
    pub fn new(identity: &Identity, ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            username: identity.username.clone(),
            role: identity.role,
            iat: now,
            exp: now.saturating_add(ttl_secs),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.username.clone(), self.role)
    }
}

/// Signs and checks HS256 tokens with the process-wide shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenVerifier {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Lifetime of tokens produced by [`issue`](Self::issue).
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `identity` using the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> ApiResult<String> {
        self.sign(&Claims::new(identity, self.ttl_secs))
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verify a raw `Authorization` header value.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = bearer_token(header).ok_or(AuthError::MissingCredential)?;
        self.verify(token)
    }

    /// Verify a bare token. Signature and expiry failures are reported
    /// identically.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AuthError::InvalidCredential
        })?;

        // jsonwebtoken accepts exp == now; a token is only valid strictly before exp.
        if data.claims.exp <= Utc::now().timestamp() {
            tracing::debug!(username = %data.claims.username, "Token expired");
            return Err(AuthError::InvalidCredential);
        }

        Ok(data.claims.identity())
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Extracts the token from a `Bearer <token>` header value.
fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
