//! Ordered composition of the per-route checks.

use std::net::IpAddr;
use std::sync::Arc;

use crate::auth::{authorize, Identity, Role, RoleSet, TokenVerifier};
use crate::error::AuthError;
use crate::security::rate_limit::{RateKey, RateLimiter};

/// What a route demands of its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    pub require_auth: bool,
    pub allowed_roles: Option<RoleSet>,
}

impl RoutePolicy {
    /// No credential needed; still rate limited by origin.
    pub fn public() -> Self {
        Self {
            require_auth: false,
            allowed_roles: None,
        }
    }

    /// Any valid credential.
    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            allowed_roles: None,
        }
    }

    /// A valid credential carrying one of `roles`.
    pub fn roles(roles: &[Role]) -> Self {
        Self {
            require_auth: true,
            allowed_roles: Some(RoleSet::of(roles)),
        }
    }
}

/// Token verification, then role gate, then rate limiting.
///
/// The first failing stage decides the outcome and later stages do not run,
/// so a rejected credential never consumes rate budget.
#[derive(Debug, Clone)]
pub struct Pipeline {
    verifier: Arc<TokenVerifier>,
    limiter: Arc<RateLimiter>,
}

impl Pipeline {
    pub fn new(verifier: Arc<TokenVerifier>, limiter: Arc<RateLimiter>) -> Self {
        Self { verifier, limiter }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run every stage `policy` asks for.
    ///
    /// Returns the verified identity, if the route required one.
    pub fn check(
        &self,
        policy: &RoutePolicy,
        authorization: Option<&str>,
        origin: Option<IpAddr>,
    ) -> Result<Option<Identity>, AuthError> {
        let identity = if policy.require_auth {
            Some(self.verifier.verify_header(authorization)?)
        } else {
            None
        };

        if let Some(allowed) = &policy.allowed_roles {
            authorize(identity.as_ref(), allowed)?;
        }

        let key = RateKey::for_request(identity.as_ref(), origin);
        self.limiter.admit(&key).inspect_err(|_| {
            tracing::warn!(rate_key = %key, "Rate limit exceeded");
        })?;

        Ok(identity)
    }
}
