//! Token-manager seam: bearer tokens are obtained from an external token
//! service, kept behind a trait, and cached once per credential record.

/// Token-manager trait, creation modes and the guarded lazy cache.
pub mod manager;

pub use manager::{TokenError, TokenFactory, TokenManager};
