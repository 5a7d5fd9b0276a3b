//! URL handling module for Price-Sweep
//!
//! This module provides canonical URL identity, host matching and query
//! parameter inspection. Canonical identity defines what the frontier treats
//! as "the same page".

mod canonical;
mod host;
mod params;

// Re-export main functions
pub use canonical::{canonicalize, canonicalize_url};
pub use host::{extract_host, is_http, is_same_authority, is_same_host, parse_root};
pub use params::{has_only_keys_from, query_keys};
