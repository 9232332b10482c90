//! Request matching
//!
//! [`UrlMatcher`] owns the dispatch trees for one route collection. They are
//! restored from a snapshot at construction when one is available, otherwise
//! built on the first match. Building happens once even when the first
//! requests race each other.

use crate::cache::{RouteCache, SnapshotStore};
use crate::config::RouterConfig;
use crate::current::CurrentRoute;
use crate::dispatch::DispatchTreeSet;
use crate::encoding::Encoding;
use crate::error::RouteResult;
use crate::pattern::PatternCompiler;
use crate::registrar::RouteRegistrar;
use crate::route::RouteCollection;
use ahash::AHashMap;
use http::{header, Request, Uri};
use once_cell::sync::OnceCell;
use radix_core::Method;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// A matched route with its extracted and default arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub name: String,
    pub arguments: AHashMap<String, String>,
}

/// Outcome of a match.
///
/// Neither failure is an error: `NotFound` means no tier knows the path and
/// `MethodNotAllowed` means at least one does, for other methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Success(RouteMatch),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl MatchResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success(_))
    }

    /// True when the path exists but not for the requested method
    #[inline]
    pub fn is_method_failure(&self) -> bool {
        matches!(self, MatchResult::MethodNotAllowed(_))
    }

    /// Methods to advertise in an `Allow` header.
    ///
    /// Empty on success; every known method when nothing matched the path.
    pub fn allowed_methods(&self) -> &[Method] {
        match self {
            MatchResult::Success(_) => &[],
            MatchResult::MethodNotAllowed(allowed) => allowed,
            MatchResult::NotFound => &Method::ALL,
        }
    }

    pub fn route(&self) -> Option<&RouteMatch> {
        match self {
            MatchResult::Success(matched) => Some(matched),
            _ => None,
        }
    }

    pub fn arguments(&self) -> Option<&AHashMap<String, String>> {
        self.route().map(|matched| &matched.arguments)
    }
}

/// Matches requests against a route collection
pub struct UrlMatcher {
    routes: Arc<dyn RouteCollection>,
    compiler: Arc<PatternCompiler>,
    store: Option<SnapshotStore>,
    encoding: Encoding,
    current: Option<Arc<CurrentRoute>>,
    dispatch: OnceCell<DispatchTreeSet>,
}

impl UrlMatcher {
    /// Create a matcher, restoring the dispatch trees from the configured
    /// snapshot store when it holds one
    pub fn new(
        routes: Arc<dyn RouteCollection>,
        cache: Option<Arc<dyn RouteCache>>,
        config: &RouterConfig,
    ) -> Self {
        let store = SnapshotStore::from_config(config, cache);
        let dispatch = OnceCell::new();
        if let Some(set) = store.as_ref().and_then(SnapshotStore::load) {
            let _ = dispatch.set(set);
        }

        Self {
            routes,
            compiler: Arc::new(PatternCompiler::new()),
            store,
            encoding: config.encoding(),
            current: None,
            dispatch,
        }
    }

    /// Create a matcher and build its trees immediately, surfacing any
    /// configuration error up front
    pub fn build(
        routes: Arc<dyn RouteCollection>,
        cache: Option<Arc<dyn RouteCache>>,
        config: &RouterConfig,
    ) -> RouteResult<Self> {
        let matcher = Self::new(routes, cache, config);
        matcher.dispatch()?;
        Ok(matcher)
    }

    /// Share a pattern compiler with a generator
    pub fn with_compiler(mut self, compiler: Arc<PatternCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Record successful matches from [`match_uri`](Self::match_uri) and
    /// [`match_http`](Self::match_http) into `current`
    pub fn with_current_route(mut self, current: Arc<CurrentRoute>) -> Self {
        self.current = Some(current);
        self
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether the dispatch trees exist yet
    pub fn is_built(&self) -> bool {
        self.dispatch.get().is_some()
    }

    /// Dispatch trees, built and persisted on first access
    pub fn dispatch(&self) -> RouteResult<&DispatchTreeSet> {
        self.dispatch.get_or_try_init(|| {
            let routes = self.routes.routes();
            info!(routes = routes.len(), "building dispatch trees");
            let set = RouteRegistrar::new(&self.compiler).register(routes)?;
            if let Some(store) = &self.store {
                store.save(&set);
            }
            Ok(set)
        })
    }

    /// Match a host, method and raw (still encoded) path
    pub fn match_request(&self, host: &str, method: &str, path: &str) -> RouteResult<MatchResult> {
        let dispatch = self.dispatch()?;
        let path = self.encoding.decode(path);
        let result = dispatch.lookup(host, method, &path);

        match &result {
            MatchResult::Success(matched) => {
                debug!(host, method, path = %path, route = %matched.name, "route matched")
            }
            MatchResult::MethodNotAllowed(allowed) => {
                debug!(host, method, path = %path, ?allowed, "method not allowed")
            }
            MatchResult::NotFound => debug!(host, method, path = %path, "no route"),
        }
        Ok(result)
    }

    /// Match a request URI; its host is empty when the URI has no authority
    pub fn match_uri(&self, method: &http::Method, uri: &Uri) -> RouteResult<MatchResult> {
        let result = self.match_request(uri.host().unwrap_or(""), method.as_str(), uri.path())?;
        self.remember(&result, uri);
        Ok(result)
    }

    /// Match an `http::Request`, taking the host from the URI authority or
    /// else the `Host` header
    pub fn match_http<B>(&self, request: &Request<B>) -> RouteResult<MatchResult> {
        let uri = request.uri();
        let host = match uri.host() {
            Some(host) => host,
            None => request
                .headers()
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .map(strip_port)
                .unwrap_or(""),
        };

        let result = self.match_request(host, request.method().as_str(), uri.path())?;
        self.remember(&result, uri);
        Ok(result)
    }

    fn remember(&self, result: &MatchResult, uri: &Uri) {
        if let (Some(current), MatchResult::Success(matched)) = (&self.current, result) {
            current.set_route(matched);
            current.set_uri(uri.clone());
        }
    }
}

/// `example.com:8080` to `example.com`, keeping bracketed IPv6 literals whole
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.split_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Route, RouteRegistry};

    fn matcher(routes: Vec<Route>) -> UrlMatcher {
        let registry = RouteRegistry::from_routes(routes).unwrap();
        UrlMatcher::new(Arc::new(registry), None, &RouterConfig::default())
    }

    #[test]
    fn test_allowed_methods() {
        assert!(MatchResult::Success(RouteMatch {
            name: "x".to_string(),
            arguments: AHashMap::new(),
        })
        .allowed_methods()
        .is_empty());
        assert_eq!(MatchResult::NotFound.allowed_methods(), &Method::ALL);
        assert_eq!(
            MatchResult::MethodNotAllowed(vec![Method::GET]).allowed_methods(),
            &[Method::GET]
        );
    }

    #[test]
    fn test_lazy_build() {
        let matcher = matcher(vec![Route::get("/site/index").with_name("site/index")]);
        assert!(!matcher.is_built());
        let result = matcher.match_request("", "GET", "/site/index").unwrap();
        assert_eq!(result.route().unwrap().name, "site/index");
        assert!(matcher.is_built());
    }

    #[test]
    fn test_build_surfaces_config_errors() {
        let registry = RouteRegistry::from_routes([Route::get("/site[/{name}")]).unwrap();
        let result = UrlMatcher::build(Arc::new(registry), None, &RouterConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_match_http_uses_host_header() {
        let matcher = matcher(vec![Route::get("/").with_name("home").with_host("yii.test")]);
        let request = Request::get("/")
            .header(header::HOST, "yii.test:8080")
            .body(())
            .unwrap();
        assert!(matcher.match_http(&request).unwrap().is_success());
    }

    #[test]
    fn test_match_uri_records_current_route() {
        let current = Arc::new(CurrentRoute::new());
        let matcher = matcher(vec![Route::get("/post/{id}").with_name("post/view")])
            .with_current_route(Arc::clone(&current));

        let uri: Uri = "http://example.com/post/42?page=2".parse().unwrap();
        assert!(matcher.match_uri(&http::Method::GET, &uri).unwrap().is_success());
        assert_eq!(current.name().as_deref(), Some("post/view"));
        assert_eq!(current.arguments().get("id").map(String::as_str), Some("42"));
        assert_eq!(current.uri(), Some(uri));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
    }
}
