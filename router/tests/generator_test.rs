use radix_router::{
    Arguments, CurrentRoute, Encoding, Route, RouteError, RouteMatch, RouteRegistry, RouterConfig,
    UrlGenerator,
};
use std::sync::Arc;

fn routes() -> Arc<RouteRegistry> {
    Arc::new(
        RouteRegistry::from_routes([
            Route::get("/").with_name("home"),
            Route::get("/post/{id:\\d+}[/{slug}]").with_name("post/view"),
            Route::get("/archive[/{year}[/{month}]]").with_name("archive"),
            Route::get("/user/{name}").with_name("user"),
            Route::get("/files/{path+}").with_name("files"),
            Route::get("/api/status").with_name("api").with_host("api.test"),
            Route::get("/dashboard")
                .with_name("tenant")
                .with_host("{tenant}.app.test"),
        ])
        .unwrap(),
    )
}

fn generator() -> UrlGenerator {
    UrlGenerator::new(routes())
}

fn none() -> Arguments {
    Arguments::new()
}

#[test]
fn test_generate_root() {
    assert_eq!(generator().generate("home", &none(), &none(), None).unwrap(), "/");
}

#[test]
fn test_longest_satisfied_variant_wins() {
    let generator = generator();
    assert_eq!(
        generator
            .generate("post/view", &Arguments::from([("id", "42")]), &none(), None)
            .unwrap(),
        "/post/42"
    );
    assert_eq!(
        generator
            .generate(
                "post/view",
                &Arguments::from([("id", "42"), ("slug", "hello-world")]),
                &none(),
                None
            )
            .unwrap(),
        "/post/42/hello-world"
    );
}

#[test]
fn test_missing_arguments() {
    let err = generator().generate("post/view", &none(), &none(), None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Route `post/view` expects at least argument values for [id,slug], but received []"
    );

    let err = generator()
        .generate("post/view", &Arguments::from([("slug", "x")]), &none(), None)
        .unwrap_err();
    let RouteError::MissingArguments { missing, received, .. } = err else {
        panic!("expected missing arguments");
    };
    assert_eq!(missing, vec!["id"]);
    assert_eq!(received, vec!["slug"]);
}

#[test]
fn test_invalid_argument() {
    let err = generator()
        .generate("post/view", &Arguments::from([("id", "abc")]), &none(), None)
        .unwrap_err();
    let RouteError::InvalidArgument { name, regex, pattern } = err else {
        panic!("expected invalid argument");
    };
    assert_eq!(name, "id");
    assert_eq!(regex, "\\d+");
    assert_eq!(pattern, "/post/{id:\\d+}[/{slug}]");
}

#[test]
fn test_route_not_found() {
    let err = generator().generate("missing", &none(), &none(), None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot generate URI for route \"missing\"; route not found"
    );
}

#[test]
fn test_leftover_arguments_become_query() {
    let generator = generator();
    let arguments = Arguments::from([("id", "42"), ("page", "2")]);

    assert_eq!(
        generator.generate("post/view", &arguments, &none(), None).unwrap(),
        "/post/42?page=2"
    );
    assert_eq!(
        generator
            .generate("post/view", &arguments, &Arguments::from([("page", "1")]), None)
            .unwrap(),
        "/post/42?page=1"
    );
    assert_eq!(
        generator
            .generate("post/view", &arguments, &Arguments::from([("sort", "asc")]), None)
            .unwrap(),
        "/post/42?sort=asc&page=2"
    );
}

#[test]
fn test_null_query_values_are_skipped() {
    let query = Arguments::new().with_null("x").with("y", 1);
    assert_eq!(generator().generate("home", &none(), &query, None).unwrap(), "/?y=1");
}

#[test]
fn test_hash() {
    assert_eq!(
        generator()
            .generate("post/view", &Arguments::from([("id", "42")]), &none(), Some("comments"))
            .unwrap(),
        "/post/42#comments"
    );
}

#[test]
fn test_empty_value_is_not_substituted() {
    assert_eq!(
        generator()
            .generate("user", &Arguments::from([("name", "")]), &none(), None)
            .unwrap(),
        "/user"
    );
}

#[test]
fn test_encoding() {
    let mut generator = generator();
    let arguments = Arguments::from([("name", "john doe")]);
    assert_eq!(
        generator.generate("user", &arguments, &none(), None).unwrap(),
        "/user/john%20doe"
    );

    generator.set_encoding(Encoding::Legacy);
    assert_eq!(generator.encoding(), Encoding::Legacy);
    assert_eq!(
        generator.generate("user", &arguments, &none(), None).unwrap(),
        "/user/john+doe"
    );
}

#[test]
fn test_wildcard_keeps_separators() {
    assert_eq!(
        generator()
            .generate("files", &Arguments::from([("path", "img/my banner.jpg")]), &none(), None)
            .unwrap(),
        "/files/img/my%20banner.jpg"
    );
}

#[test]
fn test_uri_prefix() {
    let mut generator = generator();
    generator.set_uri_prefix("/en");
    assert_eq!(generator.uri_prefix(), "/en");
    assert_eq!(
        generator
            .generate("post/view", &Arguments::from([("id", "42")]), &none(), None)
            .unwrap(),
        "/en/post/42"
    );
    assert_eq!(generator.generate("home", &none(), &none(), None).unwrap(), "/en");
}

#[test]
fn test_default_arguments_and_nulls() {
    let mut generator = generator();
    generator.set_default_argument("year", 2024);

    assert_eq!(
        generator.generate("archive", &none(), &none(), None).unwrap(),
        "/archive/2024"
    );
    assert_eq!(
        generator
            .generate("archive", &Arguments::new().with_null("year"), &none(), None)
            .unwrap(),
        "/archive/2024"
    );
    assert_eq!(
        generator
            .generate("archive", &Arguments::from([("year", "2023")]), &none(), None)
            .unwrap(),
        "/archive/2023"
    );
    assert_eq!(
        generator
            .generate("archive", &Arguments::from([("month", "05")]), &none(), None)
            .unwrap(),
        "/archive/2024/05"
    );

    generator.clear_default_arguments();
    assert_eq!(generator.generate("archive", &none(), &none(), None).unwrap(), "/archive");
}

#[test]
fn test_null_argument_keeps_default() {
    let routes = Arc::new(
        RouteRegistry::from_routes([Route::get("/{lang}/about").with_name("about")]).unwrap(),
    );
    let mut generator = UrlGenerator::new(routes);
    generator.set_default_argument("lang", "en");

    assert_eq!(
        generator
            .generate("about", &Arguments::new().with_null("lang"), &none(), None)
            .unwrap(),
        "/en/about"
    );
    assert_eq!(
        generator
            .generate("about", &Arguments::from([("lang", "de")]), &none(), None)
            .unwrap(),
        "/de/about"
    );
}

#[test]
fn test_absolute_with_explicit_host() {
    let generator = generator();
    let id = Arguments::from([("id", "42")]);

    assert_eq!(
        generator
            .generate_absolute("home", &none(), &none(), None, None, Some("http://example.com"))
            .unwrap(),
        "http://example.com/"
    );
    assert_eq!(
        generator
            .generate_absolute("post/view", &id, &none(), None, None, Some("example.com"))
            .unwrap(),
        "//example.com/post/42"
    );
    assert_eq!(
        generator
            .generate_absolute("post/view", &id, &none(), None, Some("https"), Some("example.com"))
            .unwrap(),
        "https://example.com/post/42"
    );
    assert_eq!(
        generator
            .generate_absolute("home", &none(), &none(), None, Some("https"), Some("http://example.com"))
            .unwrap(),
        "https://example.com/"
    );
    assert_eq!(
        generator
            .generate_absolute("home", &none(), &none(), None, Some(""), Some("http://example.com/"))
            .unwrap(),
        "//example.com/"
    );
}

#[test]
fn test_absolute_uses_route_host() {
    let generator = generator().with_scheme("https");
    assert_eq!(
        generator
            .generate_absolute("api", &none(), &none(), None, None, None)
            .unwrap(),
        "https://api.test/api/status"
    );
}

#[test]
fn test_absolute_uses_configured_host() {
    let config = RouterConfig {
        scheme: Some("https".to_string()),
        host: Some("cfg.test".to_string()),
        ..RouterConfig::default()
    };
    let generator = UrlGenerator::from_config(routes(), &config);
    assert_eq!(
        generator
            .generate_absolute("home", &none(), &none(), None, None, None)
            .unwrap(),
        "https://cfg.test/"
    );
}

#[test]
fn test_absolute_falls_back_to_current_request() {
    let generator = generator();
    assert_eq!(
        generator
            .generate_absolute("tenant", &none(), &none(), None, None, None)
            .unwrap(),
        "/dashboard"
    );

    let current = Arc::new(CurrentRoute::new());
    current.set_uri("http://site.test:8080/x".parse().unwrap());
    let generator = generator.with_current_route(current);
    assert_eq!(
        generator
            .generate_absolute("tenant", &none(), &none(), None, None, None)
            .unwrap(),
        "http://site.test:8080/dashboard"
    );
    assert_eq!(
        generator
            .generate_absolute("tenant", &none(), &none(), None, Some("https"), None)
            .unwrap(),
        "https://site.test:8080/dashboard"
    );
}

#[test]
fn test_from_current_route() {
    let current = Arc::new(CurrentRoute::new());
    let mut arguments = ahash::AHashMap::new();
    arguments.insert("id".to_string(), "42".to_string());
    current.set_route(&RouteMatch {
        name: "post/view".to_string(),
        arguments,
    });
    current.set_uri("http://example.com/post/42?page=2&sort=asc".parse().unwrap());

    let generator = generator().with_current_route(current);
    assert_eq!(
        generator
            .generate_from_current(
                &Arguments::from([("slug", "hello")]),
                &Arguments::from([("page", "3")]),
                None,
                None
            )
            .unwrap(),
        "/post/42/hello?page=3&sort=asc"
    );
    assert_eq!(
        generator
            .generate_from_current(&none(), &Arguments::new().with_null("page"), Some("top"), None)
            .unwrap(),
        "/post/42?sort=asc#top"
    );
}

#[test]
fn test_from_current_without_route() {
    let generator = generator();
    assert!(matches!(
        generator.generate_from_current(&none(), &none(), None, None),
        Err(RouteError::NoCurrentRoute)
    ));
    assert_eq!(
        generator
            .generate_from_current(&none(), &none(), None, Some("home"))
            .unwrap(),
        "/"
    );

    let current = Arc::new(CurrentRoute::new());
    current.set_uri("http://example.com/legacy/page?x=1".parse().unwrap());
    let generator = generator.with_current_route(current);
    assert_eq!(
        generator
            .generate_from_current(&none(), &none(), Some("top"), None)
            .unwrap(),
        "/legacy/page#top"
    );
}
