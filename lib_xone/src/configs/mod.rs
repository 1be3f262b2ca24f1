//! # Configuration Modules
//!
//! This module holds the typed XOne configuration tree and the logic for
//! locating and parsing the JSON configuration file. The tree is loaded
//! once at process start and handed by reference to every client.

/// Typed XOne configuration tree and JSON loading.
pub mod config_xone;
