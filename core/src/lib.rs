//! # RadixCore
//!
//! Method-aware radix tree used as the dispatch primitive of `radix-router`.
//!
//! ## Features
//! - Flat table for capture-free paths, node tree for everything else
//! - Optional trailing captures and one-or-more / zero-or-more wildcards
//! - Allowed-method accumulation for 405 responses
//! - Zero-copy parameter extraction
//! - Plain-data snapshots through serde
//!
//! ## Example
//! ```rust
//! use radix_core::{Lookup, Method, RadixTree};
//!
//! let mut tree = RadixTree::new();
//! tree.add(&[Method::GET, Method::HEAD], "/users/:id", "get_user").unwrap();
//! tree.add(&[Method::POST], "/users", "create_user").unwrap();
//!
//! let Lookup::Found { handler, params, .. } = tree.lookup("GET", "/users/123") else {
//!     panic!("no match");
//! };
//! assert_eq!(handler, &"get_user");
//! assert_eq!(params.get("id"), Some("123"));
//!
//! assert_eq!(
//!     tree.lookup("DELETE", "/users"),
//!     Lookup::MethodNotAllowed { allowed: vec![Method::POST] }
//! );
//! ```

pub mod method;
pub mod params;
pub mod radix;

pub use method::Method;
pub use params::Params;
pub use radix::{Endpoint, Lookup, RadixTree};

/// Tree errors
#[derive(Debug, Clone, PartialEq)]
pub enum RouterError {
    /// Invalid template format
    InvalidPath(String),
    /// Same method bound twice at one node with different handlers
    DuplicateRoute(String),
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::InvalidPath(path) => write!(f, "Invalid path: {}", path),
            RouterError::DuplicateRoute(route) => write!(f, "Duplicate route: {}", route),
        }
    }
}

impl std::error::Error for RouterError {}
