//! Route definitions and the registry the matcher and generator read from

use crate::error::{RouteError, RouteResult};
use ahash::AHashMap;
use radix_core::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// A declared route.
///
/// Routes with `has_middleware == false` stay in the registry (they can still
/// be generated) but never take part in dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    pattern: String,
    methods: Vec<Method>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    hosts: Vec<String>,
    #[serde(default)]
    defaults: AHashMap<String, String>,
    #[serde(default = "default_has_middleware")]
    has_middleware: bool,
}

fn default_has_middleware() -> bool {
    true
}

impl Route {
    /// Route answering the given methods
    pub fn new(methods: impl IntoIterator<Item = Method>, pattern: impl Into<String>) -> Self {
        let mut unique = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        Self {
            name: None,
            pattern: pattern.into(),
            methods: unique,
            hosts: Vec::new(),
            defaults: AHashMap::new(),
            has_middleware: true,
        }
    }

    pub fn get(pattern: impl Into<String>) -> Self {
        Self::new([Method::GET], pattern)
    }

    pub fn post(pattern: impl Into<String>) -> Self {
        Self::new([Method::POST], pattern)
    }

    pub fn put(pattern: impl Into<String>) -> Self {
        Self::new([Method::PUT], pattern)
    }

    pub fn delete(pattern: impl Into<String>) -> Self {
        Self::new([Method::DELETE], pattern)
    }

    pub fn patch(pattern: impl Into<String>) -> Self {
        Self::new([Method::PATCH], pattern)
    }

    pub fn head(pattern: impl Into<String>) -> Self {
        Self::new([Method::HEAD], pattern)
    }

    pub fn options(pattern: impl Into<String>) -> Self {
        Self::new([Method::OPTIONS], pattern)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict the route to a single host template
    pub fn with_host(self, host: impl Into<String>) -> Self {
        self.with_hosts([host])
    }

    /// Restrict the route to several exact hosts; trailing slashes are dropped
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts
            .into_iter()
            .map(|host| host.into().trim_end_matches('/').to_string())
            .collect();
        self
    }

    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Mark the route as dispatchable or inert
    pub fn with_middleware(mut self, has_middleware: bool) -> Self {
        self.has_middleware = has_middleware;
        self
    }

    /// Explicit name, or `"<METHODS> <hosts><pattern>"` when none was given
    pub fn name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => {
                let methods: Vec<&str> = self.methods.iter().map(|m| m.as_str()).collect();
                Cow::Owned(format!(
                    "{} {}{}",
                    methods.join(", "),
                    self.hosts.join("|"),
                    self.pattern
                ))
            }
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// First declared host, used for absolute URLs
    pub fn host(&self) -> Option<&str> {
        self.hosts.first().map(String::as_str)
    }

    pub fn defaults(&self) -> &AHashMap<String, String> {
        &self.defaults
    }

    pub fn has_middleware(&self) -> bool {
        self.has_middleware
    }
}

/// Read access to declared routes
pub trait RouteCollection: Send + Sync {
    /// All routes in declaration order
    fn routes(&self) -> &[Route];

    /// Route by name
    fn route(&self, name: &str) -> RouteResult<&Route>;
}

/// In-memory route registry
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
    by_name: AHashMap<String, usize>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> RouteResult<Self> {
        let mut registry = Self::new();
        for route in routes {
            registry.add(route)?;
        }
        Ok(registry)
    }

    /// Load routes from a JSON array
    pub fn from_file(path: impl AsRef<Path>) -> RouteResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RouteError::Config(format!("Failed to read routes file {}: {}", path.display(), e))
        })?;
        let routes: Vec<Route> = serde_json::from_str(&content)
            .map_err(|e| RouteError::Config(format!("Failed to parse routes JSON: {}", e)))?;
        Self::from_routes(routes)
    }

    /// Add a route; names must be unique
    pub fn add(&mut self, route: Route) -> RouteResult<()> {
        if route.methods.is_empty() {
            return Err(RouteError::Config(format!(
                "Route \"{}\" declares no methods",
                route.name()
            )));
        }
        let name = route.name().into_owned();
        if self.by_name.contains_key(&name) {
            return Err(RouteError::Config(format!(
                "A route named \"{}\" already exists",
                name
            )));
        }
        self.by_name.insert(name, self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteCollection for RouteRegistry {
    fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn route(&self, name: &str) -> RouteResult<&Route> {
        self.by_name
            .get(name)
            .map(|&index| &self.routes[index])
            .ok_or_else(|| RouteError::RouteNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_name() {
        let route = Route::new([Method::GET, Method::POST], "/contact");
        assert_eq!(route.name(), "GET, POST /contact");

        let route = Route::get("/index").with_hosts(["a.test", "b.test/"]);
        assert_eq!(route.name(), "GET a.test|b.test/index");
        assert_eq!(route.host(), Some("a.test"));
    }

    #[test]
    fn test_methods_are_deduplicated() {
        let route = Route::new([Method::GET, Method::GET, Method::HEAD], "/");
        assert_eq!(route.methods(), &[Method::GET, Method::HEAD]);
    }

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let mut registry = RouteRegistry::new();
        registry.add(Route::get("/a").with_name("page")).unwrap();
        let err = registry.add(Route::get("/b").with_name("page")).unwrap_err();
        assert!(matches!(err, RouteError::Config(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = RouteRegistry::from_routes([
            Route::get("/").with_name("home"),
            Route::post("/login").with_name("login").with_middleware(false),
        ])
        .unwrap();

        assert_eq!(registry.route("home").unwrap().pattern(), "/");
        assert!(!registry.route("login").unwrap().has_middleware());
        assert!(matches!(registry.route("missing"), Err(RouteError::RouteNotFound(_))));
    }

    #[test]
    fn test_route_json() {
        let json = r#"[
            {"name": "post/view", "pattern": "/post/{id}", "methods": ["GET"],
             "hosts": ["{lang}.example.com"], "defaults": {"lang": "en"}},
            {"pattern": "/about", "methods": ["GET", "HEAD"], "has_middleware": false}
        ]"#;
        let routes: Vec<Route> = serde_json::from_str(json).unwrap();
        assert_eq!(routes[0].name(), "post/view");
        assert_eq!(routes[0].defaults().get("lang").map(String::as_str), Some("en"));
        assert!(routes[0].has_middleware());
        assert_eq!(routes[1].name(), "GET, HEAD /about");
        assert!(!routes[1].has_middleware());
    }
}
