//! URL generation, the inverse of matching
//!
//! A route's pattern variants are tried most-optional-content first; the
//! first variant whose variables all have values wins. Values are checked
//! against their variable regex before being encoded into the path, and any
//! argument the path does not consume becomes a query parameter.

use crate::arguments::Arguments;
use crate::config::RouterConfig;
use crate::current::CurrentRoute;
use crate::encoding::{build_query, parse_query, Encoding};
use crate::error::{RouteError, RouteResult};
use crate::pattern::{self, PatternCompiler, PatternVariant, Token, Variable};
use crate::route::RouteCollection;
use ahash::AHashMap;
use http::Uri;
use parking_lot::RwLock;
use regex_lite::Regex;
use std::sync::Arc;
use tracing::trace;

/// Builds relative and absolute URLs for named routes
pub struct UrlGenerator {
    routes: Arc<dyn RouteCollection>,
    compiler: Arc<PatternCompiler>,
    current: Option<Arc<CurrentRoute>>,
    scheme: Option<String>,
    host: Option<String>,
    default_arguments: Arguments,
    encoding: Encoding,
    uri_prefix: String,
    regexes: RwLock<AHashMap<String, Regex>>,
}

impl UrlGenerator {
    pub fn new(routes: Arc<dyn RouteCollection>) -> Self {
        Self {
            routes,
            compiler: Arc::new(PatternCompiler::new()),
            current: None,
            scheme: None,
            host: None,
            default_arguments: Arguments::new(),
            encoding: Encoding::default(),
            uri_prefix: String::new(),
            regexes: RwLock::new(AHashMap::new()),
        }
    }

    /// Generator with scheme, host and encoding taken from `config`
    pub fn from_config(routes: Arc<dyn RouteCollection>, config: &RouterConfig) -> Self {
        let mut generator = Self::new(routes);
        generator.scheme = config.scheme.clone();
        generator.host = config.host.clone();
        generator.encoding = config.encoding();
        generator
    }

    pub fn with_current_route(mut self, current: Arc<CurrentRoute>) -> Self {
        self.current = Some(current);
        self
    }

    /// Default scheme for [`generate_absolute`](Self::generate_absolute)
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Default host for [`generate_absolute`](Self::generate_absolute)
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Share a pattern compiler with a matcher
    pub fn with_compiler(mut self, compiler: Arc<PatternCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Argument applied to every generation unless the caller overrides it
    pub fn set_default_argument(&mut self, name: impl Into<String>, value: impl ToString) {
        self.default_arguments.set(name, Some(value.to_string()));
    }

    pub fn remove_default_argument(&mut self, name: &str) {
        self.default_arguments.remove(name);
    }

    pub fn clear_default_arguments(&mut self) {
        self.default_arguments = Arguments::new();
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Prefix prepended to every generated path, e.g. a locale segment
    pub fn set_uri_prefix(&mut self, prefix: impl Into<String>) {
        self.uri_prefix = prefix.into();
    }

    pub fn uri_prefix(&self) -> &str {
        &self.uri_prefix
    }

    /// Generate a path for route `name`.
    ///
    /// Caller arguments override default arguments. Null caller arguments are
    /// dropped before the overlay, so they never hide a default. Explicit
    /// `query` entries win over leftover arguments with the same name.
    pub fn generate(
        &self,
        name: &str,
        arguments: &Arguments,
        query: &Arguments,
        hash: Option<&str>,
    ) -> RouteResult<String> {
        let mut merged = self.default_arguments.clone();
        merged.merge(&arguments.without_nulls());

        let route = self.routes.route(name)?;
        let variants = self.compiler.parse(route.pattern())?;

        let Some(variant) = variants.iter().find(|variant| satisfies(variant, &merged)) else {
            let missing = variants
                .first()
                .map(|variant| {
                    variant
                        .variables()
                        .filter(|variable| !merged.contains(&variable.name))
                        .map(|variable| variable.name.clone())
                        .collect()
                })
                .unwrap_or_default();
            return Err(RouteError::MissingArguments {
                route: name.to_string(),
                missing,
                received: merged.names().map(str::to_string).collect(),
            });
        };

        let mut path = self.uri_prefix.clone();
        let mut leftover = merged.clone();
        for token in variant.tokens() {
            match token {
                Token::Literal(text) => path.push_str(text),
                Token::Variable(variable) => {
                    if let Some(value) = merged.get(&variable.name).filter(|v| !v.is_empty()) {
                        self.validate(variable, value, route.pattern())?;
                        if variable.quantifier.is_wildcard() {
                            path.push_str(&self.encoding.encode_segments(value));
                        } else {
                            path.push_str(&self.encoding.encode(value));
                        }
                    }
                    leftover.remove(&variable.name);
                }
            }
        }

        let mut query = query.without_nulls();
        for (key, value) in leftover.iter() {
            if !query.contains(key) {
                query.set(key, Some(value.to_string()));
            }
        }

        let mut url = normalize_path(&path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&build_query(query.iter()));
        }
        if let Some(hash) = hash {
            url.push('#');
            url.push_str(hash);
        }

        trace!(route = name, url = %url, "generated url");
        Ok(url)
    }

    /// Generate an absolute URL.
    ///
    /// The host is the first of: `host`, the route's own host (when it has no
    /// placeholders), the configured host. Without any of them the current
    /// request's URI supplies scheme and host; without that the relative URL
    /// is returned.
    pub fn generate_absolute(
        &self,
        name: &str,
        arguments: &Arguments,
        query: &Arguments,
        hash: Option<&str>,
        scheme: Option<&str>,
        host: Option<&str>,
    ) -> RouteResult<String> {
        let url = self.generate(name, arguments, query, hash)?;
        let route = self.routes.route(name)?;
        let uri = self.current.as_ref().and_then(|current| current.uri());

        let host = host
            .or_else(|| route.host().filter(|host| !pattern::has_variables(host)))
            .or(self.host.as_deref());

        if let Some(host) = host {
            let relative = is_relative(host);
            let scheme = match scheme {
                Some(scheme) => Some(scheme),
                None if relative => self
                    .scheme
                    .as_deref()
                    .or_else(|| uri.as_ref().and_then(Uri::scheme_str)),
                None => None,
            };

            if scheme.is_none() && !relative {
                return Ok(format!("{}{}", host.trim_end_matches('/'), url));
            }

            let host = if !host.is_empty() && relative {
                format!("//{}", host)
            } else {
                host.to_string()
            };
            return Ok(ensure_scheme(
                &format!("{}{}", host.trim_end_matches('/'), url),
                scheme,
            ));
        }

        match uri {
            Some(uri) => Ok(absolute_from_uri(&url, &uri, scheme)),
            None => Ok(url),
        }
    }

    /// Regenerate the current route's URL with some arguments replaced.
    ///
    /// The current request's query string is kept underneath `query`. With
    /// no current route the `fallback` route is generated instead, or the
    /// current path is returned as is.
    pub fn generate_from_current(
        &self,
        replaced: &Arguments,
        query: &Arguments,
        hash: Option<&str>,
        fallback: Option<&str>,
    ) -> RouteResult<String> {
        let current = self.current.as_deref();
        let Some((current, name)) = current.and_then(|c| c.name().map(|name| (c, name))) else {
            if let Some(fallback) = fallback {
                return self.generate(fallback, replaced, &Arguments::new(), hash);
            }
            if let Some(uri) = current.and_then(CurrentRoute::uri) {
                let mut url = uri.path().to_string();
                if let Some(hash) = hash {
                    url.push('#');
                    url.push_str(hash);
                }
                return Ok(url);
            }
            return Err(RouteError::NoCurrentRoute);
        };

        let mut merged_query: Arguments = current
            .uri()
            .and_then(|uri| uri.query().map(parse_query))
            .unwrap_or_default()
            .into_iter()
            .collect();
        merged_query.merge(query);

        let mut arguments = Arguments::from(&current.arguments());
        arguments.merge(replaced);

        self.generate(&name, &arguments, &merged_query, hash)
    }

    fn validate(&self, variable: &Variable, value: &str, pattern: &str) -> RouteResult<()> {
        let valid = self.value_matches(&variable.regex, value).map_err(|e| {
            RouteError::Config(format!(
                "Invalid regex `{}` in pattern `{}`: {}",
                variable.regex, pattern, e
            ))
        })?;

        if valid {
            Ok(())
        } else {
            Err(RouteError::InvalidArgument {
                name: variable.name.clone(),
                regex: variable.regex.clone(),
                pattern: pattern.to_string(),
            })
        }
    }

    fn value_matches(&self, regex: &str, value: &str) -> Result<bool, regex_lite::Error> {
        if let Some(compiled) = self.regexes.read().get(regex) {
            return Ok(compiled.is_match(value));
        }

        let compiled = Regex::new(&format!("^(?:{})$", regex))?;
        let matched = compiled.is_match(value);
        self.regexes.write().insert(regex.to_string(), compiled);
        Ok(matched)
    }
}

fn satisfies(variant: &PatternVariant, arguments: &Arguments) -> bool {
    variant
        .variables()
        .all(|variable| arguments.contains(&variable.name))
}

/// Collapse repeated slashes and drop the trailing one; empty becomes `/`
fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    while normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Neither scheme-relative (`//host`) nor carrying a scheme
fn is_relative(url: &str) -> bool {
    !url.starts_with("//") && !url.contains("://")
}

fn ensure_scheme(url: &str, scheme: Option<&str>) -> String {
    let Some(scheme) = scheme else {
        return url.to_string();
    };
    if is_relative(url) {
        return url.to_string();
    }

    if url.starts_with("//") {
        return if scheme.is_empty() {
            url.to_string()
        } else {
            format!("{}:{}", scheme, url)
        };
    }

    match url.find("://") {
        Some(pos) if scheme.is_empty() => url[pos + 1..].to_string(),
        Some(pos) => format!("{}{}", scheme, &url[pos..]),
        None => url.to_string(),
    }
}

/// Absolute URL on the host of the request being served; port 80 is implied
fn absolute_from_uri(url: &str, uri: &Uri, scheme: Option<&str>) -> String {
    let Some(host) = uri.host() else {
        return url.to_string();
    };
    let port = match uri.port_u16() {
        Some(port) if port != 80 => format!(":{}", port),
        _ => String::new(),
    };
    let scheme = scheme.or_else(|| uri.scheme_str()).unwrap_or("");
    ensure_scheme(&format!("://{}{}{}", host, port, url), Some(scheme))
}
