//! Dispatch tree set
//!
//! Three independent lookup structures, consulted in order:
//!
//! 1. one tree per exact host name
//! 2. a single tree for parameterized hosts, where the host is folded into
//!    the path (`blog.example.com` + `/index` looks up
//!    `/blog/example/com/index`)
//! 3. a tree for routes that accept any host
//!
//! The set is plain data apart from a regex memo, so it round-trips through
//! serde and is read-only once built.

use crate::matcher::{MatchResult, RouteMatch};
use crate::pattern::{self, Token, SEGMENT_REGEX};
use ahash::AHashMap;
use parking_lot::RwLock;
use radix_core::{Lookup, Method, Params, RadixTree};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Routing trees keyed by how a route constrains the host
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchTreeSet {
    hosts: AHashMap<String, RadixTree<String>>,
    parameterized: Option<RadixTree<String>>,
    #[serde(rename = "default")]
    wildcard: Option<RadixTree<String>>,
    /// Original host template per parameterized route
    host_patterns: AHashMap<String, String>,
    /// Declared defaults per route, merged under extracted parameters
    defaults: AHashMap<String, AHashMap<String, String>>,
    #[serde(skip)]
    host_regexes: HostRegexes,
}

impl DispatchTreeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn exact_tree_mut(&mut self, host: &str) -> &mut RadixTree<String> {
        self.hosts.entry(host.to_string()).or_default()
    }

    pub(crate) fn parameterized_tree_mut(&mut self) -> &mut RadixTree<String> {
        self.parameterized.get_or_insert_with(RadixTree::new)
    }

    pub(crate) fn wildcard_tree_mut(&mut self) -> &mut RadixTree<String> {
        self.wildcard.get_or_insert_with(RadixTree::new)
    }

    pub(crate) fn record_host_pattern(&mut self, route: &str, host: &str) {
        self.host_patterns.insert(route.to_string(), host.to_string());
    }

    pub(crate) fn record_defaults(&mut self, route: &str, defaults: &AHashMap<String, String>) {
        if !defaults.is_empty() {
            self.defaults.insert(route.to_string(), defaults.clone());
        }
    }

    /// Resolve an already decoded path.
    ///
    /// An exact-host tree that knows the path but not the method answers
    /// immediately; otherwise allowed methods are collected from the
    /// parameterized and any-host tiers before giving up.
    pub fn lookup(&self, host: &str, method: &str, path: &str) -> MatchResult {
        if let Some(tree) = self.hosts.get(host) {
            match tree.lookup(method, path) {
                Lookup::Found { handler, params, .. } => return self.success(handler, &params),
                Lookup::MethodNotAllowed { allowed } => return MatchResult::MethodNotAllowed(allowed),
                Lookup::NotFound => {}
            }
        }

        let mut allowed: Vec<Method> = Vec::new();

        if let Some(tree) = &self.parameterized {
            let host_path = format!("/{}{}", host.replace('.', "/"), path);
            match tree.lookup(method, &host_path) {
                Lookup::Found { handler, params, .. } => {
                    if self.host_matches(handler, host) {
                        return self.success(handler, &params);
                    }
                }
                Lookup::MethodNotAllowed { allowed: methods } => merge_methods(&mut allowed, methods),
                Lookup::NotFound => {}
            }
        }

        if let Some(tree) = &self.wildcard {
            match tree.lookup(method, path) {
                Lookup::Found { handler, params, .. } => return self.success(handler, &params),
                Lookup::MethodNotAllowed { allowed: methods } => merge_methods(&mut allowed, methods),
                Lookup::NotFound => {}
            }
        }

        if allowed.is_empty() {
            MatchResult::NotFound
        } else {
            MatchResult::MethodNotAllowed(allowed)
        }
    }

    /// Number of exact-host trees
    pub fn exact_host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn has_parameterized_hosts(&self) -> bool {
        self.parameterized.is_some()
    }

    pub fn has_any_host_routes(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Registered (template, method) endpoints across every tree
    pub fn endpoint_count(&self) -> usize {
        self.hosts.values().map(RadixTree::len).sum::<usize>()
            + self.parameterized.as_ref().map_or(0, RadixTree::len)
            + self.wildcard.as_ref().map_or(0, RadixTree::len)
    }

    fn success(&self, name: &str, params: &Params<'_>) -> MatchResult {
        let mut arguments = self.defaults.get(name).cloned().unwrap_or_default();
        for (key, value) in params.iter() {
            arguments.insert(key.to_string(), value.to_string());
        }
        MatchResult::Success(RouteMatch {
            name: name.to_string(),
            arguments,
        })
    }

    fn host_matches(&self, route: &str, host: &str) -> bool {
        match self.host_patterns.get(route) {
            Some(template) => self.host_regexes.is_match(template, host),
            None => true,
        }
    }
}

fn merge_methods(allowed: &mut Vec<Method>, methods: Vec<Method>) {
    for method in methods {
        if !allowed.contains(&method) {
            allowed.push(method);
        }
    }
}

/// Compile a host template into an anchored regex.
///
/// Literals match verbatim; a variable matches its own regex, or a single
/// DNS label when it declares none.
pub fn host_regex(template: &str) -> Result<Regex, regex_lite::Error> {
    let mut source = String::with_capacity(template.len() * 2);
    source.push('^');
    for token in pattern::tokenize(template) {
        match token {
            Token::Literal(text) => source.push_str(&regex_lite::escape(&text)),
            Token::Variable(variable) => {
                source.push_str("(?:");
                if variable.regex == SEGMENT_REGEX {
                    source.push_str("[^.]+");
                } else {
                    source.push_str(&variable.regex);
                }
                source.push(')');
            }
        }
    }
    source.push('$');
    Regex::new(&source)
}

/// Host regexes compiled on first use
#[derive(Debug, Default)]
struct HostRegexes {
    compiled: RwLock<AHashMap<String, Option<Regex>>>,
}

impl HostRegexes {
    fn is_match(&self, template: &str, host: &str) -> bool {
        if let Some(regex) = self.compiled.read().get(template) {
            return regex.as_ref().is_some_and(|re| re.is_match(host));
        }

        let regex = match host_regex(template) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(template, error = %err, "host pattern does not compile; it will never match");
                None
            }
        };
        let matched = regex.as_ref().is_some_and(|re| re.is_match(host));
        self.compiled.write().insert(template.to_string(), regex);
        matched
    }
}
