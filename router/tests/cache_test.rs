use bytes::Bytes;
use radix_router::{
    MatchResult, MemoryCache, Route, RouteCache, RouteError, RouteRegistry, RouteResult, RouterConfig,
    UrlMatcher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn routes() -> Vec<Route> {
    vec![
        Route::get("/").with_name("site/index"),
        Route::new([radix_router::Method::GET, radix_router::Method::POST], "/contact")
            .with_name("site/contact"),
        Route::get("/post/:id").with_name("post/view"),
        Route::get("/page[/{name}]")
            .with_name("page")
            .with_defaults([("name", "index")]),
        Route::get("/index").with_host("api.example.com").with_name("api/index"),
        Route::get("/index")
            .with_host("{subdomain}.example.com")
            .with_name("subdomain/index"),
    ]
}

fn registry(routes: Vec<Route>) -> Arc<RouteRegistry> {
    Arc::new(RouteRegistry::from_routes(routes).unwrap())
}

/// Requests whose outcome must survive a snapshot round trip
const PROBES: &[(&str, &str, &str)] = &[
    ("", "GET", "/contact"),
    ("", "POST", "/contact"),
    ("", "DELETE", "/contact"),
    ("", "GET", "/post/42"),
    ("", "GET", "/page"),
    ("", "GET", "/page/about"),
    ("api.example.com", "GET", "/index"),
    ("blog.example.com", "GET", "/index"),
    ("blog.other.com", "GET", "/index"),
    ("", "GET", "/missing"),
];

fn probe(matcher: &UrlMatcher) -> Vec<MatchResult> {
    PROBES
        .iter()
        .map(|(host, method, path)| matcher.match_request(host, method, path).unwrap())
        .collect()
}

#[test]
fn test_no_cache_entry_builds_and_writes_back() {
    let cache = Arc::new(MemoryCache::new());
    let config = RouterConfig::default();
    let matcher = UrlMatcher::new(registry(routes()), Some(cache.clone()), &config);

    assert!(!matcher.is_built());
    assert!(matcher.match_request("", "GET", "/contact").unwrap().is_success());
    assert!(cache.has(&config.cache_key).unwrap());
}

#[test]
fn test_restore_from_key_value_cache_without_routes() {
    let cache = Arc::new(MemoryCache::new());
    let config = RouterConfig::default();

    let original = UrlMatcher::build(registry(routes()), Some(cache.clone()), &config).unwrap();
    let restored = UrlMatcher::new(registry(Vec::new()), Some(cache), &config);

    assert!(restored.is_built());
    assert_eq!(probe(&restored), probe(&original));

    let page = restored.match_request("", "GET", "/page").unwrap();
    assert_eq!(page.arguments().unwrap()["name"], "index");
    let host = restored.match_request("blog.example.com", "GET", "/index").unwrap();
    assert_eq!(host.arguments().unwrap()["subdomain"], "blog");
}

#[test]
fn test_disabled_cache_is_ignored() {
    let cache = Arc::new(MemoryCache::new());
    let config = RouterConfig {
        enable_cache: false,
        ..RouterConfig::default()
    };
    let matcher = UrlMatcher::build(registry(routes()), Some(cache.clone()), &config).unwrap();
    assert!(matcher.is_built());
    assert!(cache.is_empty());
}

/// Cache whose every operation fails
#[derive(Default)]
struct BrokenCache {
    calls: AtomicUsize,
}

impl RouteCache for BrokenCache {
    fn has(&self, _key: &str) -> RouteResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn get(&self, _key: &str) -> RouteResult<Option<Bytes>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RouteError::Cache("connection refused".to_string()))
    }

    fn set(&self, _key: &str, _value: Bytes) -> RouteResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RouteError::Cache("connection refused".to_string()))
    }
}

#[test]
fn test_cache_errors_fall_back_to_registration() {
    let cache = Arc::new(BrokenCache::default());
    let matcher = UrlMatcher::new(registry(routes()), Some(cache.clone()), &RouterConfig::default());

    assert!(!matcher.is_built());
    assert!(matcher.match_request("", "GET", "/contact").unwrap().is_success());
    // has + get on construction, set after the build
    assert_eq!(cache.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_garbage_cache_entry_is_a_miss() {
    let cache = Arc::new(MemoryCache::new());
    let config = RouterConfig::default();
    cache
        .set(&config.cache_key, Bytes::from_static(b"definitely not a snapshot"))
        .unwrap();

    let matcher = UrlMatcher::new(registry(routes()), Some(cache), &config);
    assert!(!matcher.is_built());
    assert!(matcher.match_request("", "GET", "/").unwrap().is_success());
}

fn file_config(path: &std::path::Path) -> RouterConfig {
    RouterConfig {
        save_to_file: true,
        cache_path: path.to_string_lossy().into_owned(),
        ..RouterConfig::default()
    }
}

#[test]
fn test_snapshot_file_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes-cache.json");
    let config = file_config(&path);

    let matcher = UrlMatcher::new(registry(routes()), None, &config);
    assert!(matcher.match_request("", "GET", "/contact").unwrap().is_success());
    assert!(path.is_file());

    let snapshot: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert!(snapshot.get("default").is_some());
    assert!(snapshot.get("hostPatterns").is_some());
    assert_eq!(
        snapshot["hostPatterns"]["subdomain/index"],
        "{subdomain}.example.com"
    );
}

#[test]
fn test_restore_from_snapshot_file_without_routes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("routes-cache.json");
    let config = file_config(&path);

    let original = UrlMatcher::build(registry(routes()), None, &config).unwrap();
    let restored = UrlMatcher::new(registry(Vec::new()), None, &config);

    assert!(restored.is_built());
    assert_eq!(probe(&restored), probe(&original));
}

#[test]
fn test_corrupt_snapshot_file_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes-cache.json");
    std::fs::write(&path, "{ not json").unwrap();
    let config = file_config(&path);

    let matcher = UrlMatcher::new(registry(routes()), None, &config);
    assert!(!matcher.is_built());
    assert!(matcher.match_request("", "GET", "/post/1").unwrap().is_success());

    let restored = UrlMatcher::new(registry(Vec::new()), None, &config);
    assert!(restored.is_built());
}

#[test]
fn test_empty_collection_without_cache() {
    let matcher = UrlMatcher::new(registry(Vec::new()), None, &RouterConfig::default());
    assert_eq!(
        matcher.match_request("", "GET", "/contact").unwrap(),
        MatchResult::NotFound
    );
}
