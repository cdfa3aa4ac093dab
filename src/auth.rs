//! Caller identification.
//!
//! The catalog never verifies credentials itself. It asks an
//! [`Authenticator`] to turn whatever the caller presented into a user id.
//! [`TokenAuthenticator`] is the shipped implementation: a static map of
//! bearer tokens from `[auth.tokens]`.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use catalog_core::UserId;

/// Resolves presented credentials to a user.
///
/// Returns `Ok(None)` when the credentials are not recognized.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &str) -> Result<Option<UserId>>;
}

/// Static bearer-token authenticator.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl TokenAuthenticator {
    pub fn new(tokens: HashMap<String, UserId>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, credentials: &str) -> Result<Option<UserId>> {
        Ok(self.tokens.get(credentials).cloned())
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
