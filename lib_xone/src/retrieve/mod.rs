//! # Data Retrieval Module
//!
//! Centralized HTTP plumbing for the XOne services: URL building, header
//! construction with bearer-token injection, response classification, and
//! the retry loop every named client delegates to.
//!
//! The named clients in `apis` only differ in URL layout and credential
//! selection; everything network-shaped lives here.

/// Error taxonomy and response classification.
pub mod error;
/// The XOne request pipeline: URL building, headers, retries.
pub mod xone_http;
