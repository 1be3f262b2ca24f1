//! # Token Managers
//!
//! The token-issuing service is an external collaborator; this module only
//! defines the seam. A [`TokenManager`] hands out the current bearer token
//! value and owns its refresh policy. A [`TokenFactory`] creates managers
//! from a [`TokenRequest`], which fixes the auth server, the scope, and
//! one of two acquisition modes.
//!
//! Managers are created at most once per credential record, via
//! double-checked locking on the record's slot: a fast-path read, then a
//! process-wide setup lock shared by all clients and all records, then a
//! re-check before creation. Creation is rare and fast, so the coarse
//! lock sees no meaningful contention.

use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

use crate::configs::config_xone::{ApiConfig, XoneEnv};

/// Errors raised at the token seam.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The factory could not build a manager for the requested mode.
    #[error("token manager creation failed: {0}")]
    Create(String),

    /// The manager could not produce a current token value.
    #[error("token retrieval failed: {0}")]
    Retrieve(String),
}

/// How a token manager authenticates against the auth server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMode {
    /// Client-credentials grant; used when the credential record carries
    /// both a client id and a client secret.
    ClientCredentials {
        /// OAuth client id.
        client_id: String,
        /// OAuth client secret.
        client_secret: String,
    },
    /// Implicit flow, driven by the environment-level client id and
    /// redirect URI.
    Implicit {
        /// Environment implicit-flow client id.
        client_id: String,
        /// Environment implicit-flow redirect URI.
        redirect_uri: String,
    },
}

/// Everything a factory needs to build one token manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Auth-server identifier from the environment descriptor.
    pub server: String,
    /// OAuth scope from the credential record.
    pub scope: String,
    /// Acquisition mode.
    pub mode: TokenMode,
}

/// External collaborator that owns token acquisition and refresh. The
/// client layer only ever asks for the current value.
pub trait TokenManager: Send + Sync + fmt::Debug {
    /// Returns the current bearer token value.
    fn token_value(&self) -> Result<String, TokenError>;
}

/// Creates [`TokenManager`] instances on first use of a credential record.
pub trait TokenFactory: Send + Sync {
    /// Builds a manager for the given request.
    fn create(&self, request: &TokenRequest) -> Result<Arc<dyn TokenManager>, TokenError>;
}

/// Process-wide setup lock, shared across all clients and all credential
/// records. Guards creation only; token value reads go straight to the
/// manager.
static TOKEN_SETUP_LOCK: Mutex<()> = Mutex::new(());

/// Returns the credential record's token manager, creating and storing it
/// on first use. Subsequent callers, concurrent or not, observe the same
/// instance; the slot is never replaced.
pub fn ensure_token_manager(
    api: &ApiConfig,
    env: &XoneEnv,
    server: &str,
    factory: &dyn TokenFactory,
) -> Result<Arc<dyn TokenManager>, TokenError> {
    if let Some(mgr) = api
        .token_mgr
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .as_ref()
    {
        return Ok(Arc::clone(mgr));
    }

    let _guard = TOKEN_SETUP_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    // Re-check: another caller may have won the race while we waited.
    if let Some(mgr) = api
        .token_mgr
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .as_ref()
    {
        return Ok(Arc::clone(mgr));
    }

    debug!(scope = %api.scope, server, "setting up token manager");
    let mode = if api.has_client_credentials() {
        debug!("using client mode");
        TokenMode::ClientCredentials {
            client_id: api.client_id.clone(),
            client_secret: api.client_secret.clone(),
        }
    } else {
        debug!("using implicit mode");
        TokenMode::Implicit {
            client_id: env.implicit_client_id.clone(),
            redirect_uri: env.implicit_redirect_uri.clone(),
        }
    };

    let request = TokenRequest {
        server: server.to_string(),
        scope: api.scope.clone(),
        mode,
    };
    let mgr = factory.create(&request)?;
    *api.token_mgr.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&mgr));
    Ok(mgr)
}

/// Token manager holding a fixed token string. Useful for smoke binaries
/// and tests; real deployments plug in the external service's manager.
#[derive(Debug, Clone)]
pub struct StaticTokenManager {
    token: String,
}

impl StaticTokenManager {
    /// Wraps a fixed token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenManager for StaticTokenManager {
    fn token_value(&self) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }
}

/// Factory producing [`StaticTokenManager`] instances with a fixed token.
pub struct StaticTokenFactory {
    token: String,
}

impl StaticTokenFactory {
    /// Creates a factory that always hands out the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenFactory for StaticTokenFactory {
    fn create(&self, _request: &TokenRequest) -> Result<Arc<dyn TokenManager>, TokenError> {
        Ok(Arc::new(StaticTokenManager::new(self.token.clone())))
    }
}
