//! # Logging Modules
//!
//! Message-template logging in front of `tracing`: log calls name a step
//! and a status, the wrapper renders them through per-level templates and
//! keeps the template plus the named fields attached to the record, so a
//! downstream shipper can index them. The YAML-driven configuration for
//! the log-shipping handler lives in `config`.

/// Message templates, log statuses and the `LoggerWrapper`.
pub mod template;
/// YAML-driven logging configuration and subscriber setup.
pub mod config;
