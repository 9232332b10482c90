//! # RadixRouter
//!
//! Bidirectional HTTP routing: match a (host, method, path) triple to a named
//! route, and generate URLs for named routes from argument values.
//!
//! ## Features
//! - Two variable syntaxes, `{name:regex}` and `:name?` / `:name*` / `:name+`
//! - Nestable optional groups: `/site[/{name}[/{id}]]`
//! - Exact, parameterized (`{lang}.example.com`) and any-host routes
//! - 404 and 405 told apart, with the allowed methods for the latter
//! - Dispatch snapshot in a key-value cache or a JSON file for warm starts
//!
//! ## Quick Start
//!
//! ```no_run
//! use radix_router::{Arguments, Route, RouteRegistry, RouterConfig, UrlGenerator, UrlMatcher};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), radix_router::RouteError> {
//!     let routes = Arc::new(RouteRegistry::from_routes([
//!         Route::get("/").with_name("home"),
//!         Route::get("/post/{id:\\d+}[/{slug}]").with_name("post/view"),
//!     ])?);
//!
//!     let matcher = UrlMatcher::new(routes.clone(), None, &RouterConfig::default());
//!     let result = matcher.match_request("example.com", "GET", "/post/42/hello")?;
//!     assert_eq!(result.route().map(|m| m.name.as_str()), Some("post/view"));
//!
//!     let generator = UrlGenerator::new(routes);
//!     let url = generator.generate(
//!         "post/view",
//!         &Arguments::from([("id", "42")]),
//!         &Arguments::new(),
//!         None,
//!     )?;
//!     assert_eq!(url, "/post/42");
//!     Ok(())
//! }
//! ```

pub mod arguments;
pub mod cache;
pub mod config;
pub mod current;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod matcher;
pub mod pattern;
pub mod registrar;
pub mod route;

pub use arguments::Arguments;
pub use cache::{MemoryCache, RouteCache, SnapshotStore};
pub use config::RouterConfig;
pub use current::CurrentRoute;
pub use dispatch::DispatchTreeSet;
pub use encoding::Encoding;
pub use error::{RouteError, RouteResult};
pub use generator::UrlGenerator;
pub use matcher::{MatchResult, RouteMatch, UrlMatcher};
pub use pattern::{PatternCompiler, PatternVariant, Quantifier, Token, Variable};
pub use registrar::RouteRegistrar;
pub use route::{Route, RouteCollection, RouteRegistry};

pub use radix_core::Method;
