//! Method-aware radix tree for route matching
//!
//! Templates use colon captures: `:name` (one segment), `:name?` (optional
//! trailing segment), `:name*` (zero or more trailing segments) and `:name+`
//! (one or more trailing segments). Templates without captures are kept in a
//! flat static table; everything else lives in the node tree. Both halves are
//! plain data and round-trip through serde, which is what the dispatch cache
//! persists.

use crate::method::Method;
use crate::params::Params;
use crate::RouterError;
use ahash::AHashMap;
use memchr::memchr;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// High-performance radix tree for route matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadixTree<T> {
    /// Dynamic routes
    tree: Node<T>,
    /// Capture-free routes keyed by normalized path
    #[serde(rename = "static")]
    static_routes: AHashMap<String, Vec<Endpoint<T>>>,
    size: usize,
}

/// Tree node optimized for routing
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node<T> {
    /// Path segment for this node
    segment: String,
    /// Handlers registered at this node, one per method
    endpoints: Vec<Endpoint<T>>,
    /// Static children (fastest lookup)
    children: Vec<Node<T>>,
    /// Parameter child (:param)
    param_child: Option<Box<Node<T>>>,
    /// Wildcard child (:param+ / :param*)
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: String) -> Self {
        Self {
            segment,
            endpoints: Vec::new(),
            children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }
}

/// A handler bound to one method at one node.
///
/// Capture names live here rather than on the nodes, so two templates may
/// share a parameter position under different names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint<T> {
    method: Method,
    handler: T,
    params: Vec<String>,
    pattern: String,
}

/// Outcome of [`RadixTree::lookup`]
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a, T> {
    /// Path and method matched
    Found {
        handler: &'a T,
        params: Params<'a>,
        pattern: &'a str,
    },
    /// Path matched, but not for this method
    MethodNotAllowed { allowed: Vec<Method> },
    /// No route for this path
    NotFound,
}

impl<'a, T> Lookup<'a, T> {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }
}

impl<T: Clone + PartialEq> RadixTree<T> {
    /// Create new radix tree
    pub fn new() -> Self {
        Self {
            tree: Node::new(String::new()),
            static_routes: AHashMap::new(),
            size: 0,
        }
    }

    /// Register `handler` for every method in `methods` under `template`.
    ///
    /// Re-registering an identical handler is a no-op; a different handler
    /// for an already bound method fails with [`RouterError::DuplicateRoute`].
    pub fn add(&mut self, methods: &[Method], template: &str, handler: T) -> Result<(), RouterError> {
        if methods.is_empty() {
            return Err(RouterError::InvalidPath(format!("{} (no methods)", template)));
        }

        let segments = parse_template(template)?;
        for variant in expand_template(&segments) {
            let pattern = render_template(&variant);
            let params: Vec<String> = variant
                .iter()
                .filter_map(|segment| match segment {
                    Segment::Param(name) | Segment::Wildcard(name) => Some((*name).to_string()),
                    _ => None,
                })
                .collect();

            for &method in methods {
                let endpoint = Endpoint {
                    method,
                    handler: handler.clone(),
                    params: params.clone(),
                    pattern: pattern.clone(),
                };
                let endpoints = if params.is_empty() {
                    self.static_routes.entry(pattern.clone()).or_default()
                } else {
                    &mut Self::node_for(&mut self.tree, &variant).endpoints
                };
                if Self::bind(endpoints, endpoint)? {
                    self.size += 1;
                }
            }
        }
        Ok(())
    }

    /// Find the handler for `method` and `path`, extracting parameters.
    pub fn lookup<'a>(&'a self, method: &str, path: &'a str) -> Lookup<'a, T> {
        let method = Method::from_bytes(method.as_bytes());
        let segments = split_path(path);
        let mut allowed: Vec<Method> = Vec::new();

        if let Some(endpoints) = self.static_routes.get(normalize_path(path, &segments).as_ref()) {
            if let Some(endpoint) = endpoints.iter().find(|e| Some(e.method) == method) {
                return Lookup::Found {
                    handler: &endpoint.handler,
                    params: Params::new(),
                    pattern: &endpoint.pattern,
                };
            }
            merge_methods(&mut allowed, endpoints);
        }

        let mut found: Option<(&'a Endpoint<T>, Vec<&'a str>)> = None;
        let mut captures = Vec::new();
        Self::walk(path, &self.tree, &segments, &mut captures, &mut |node, values| {
            if let Some(endpoint) = node.endpoints.iter().find(|e| Some(e.method) == method) {
                found = Some((endpoint, values.to_vec()));
                return true;
            }
            merge_methods(&mut allowed, &node.endpoints);
            false
        });

        if let Some((endpoint, values)) = found {
            let mut params = Params::with_capacity(values.len());
            for (name, value) in endpoint.params.iter().zip(values) {
                params.insert(name, value);
            }
            return Lookup::Found {
                handler: &endpoint.handler,
                params,
                pattern: &endpoint.pattern,
            };
        }

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::MethodNotAllowed { allowed }
        }
    }

    /// Get number of registered (template, method) endpoints
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn bind(endpoints: &mut Vec<Endpoint<T>>, endpoint: Endpoint<T>) -> Result<bool, RouterError> {
        match endpoints.iter().find(|e| e.method == endpoint.method) {
            Some(existing) if existing.handler == endpoint.handler => Ok(false),
            Some(existing) => Err(RouterError::DuplicateRoute(format!(
                "{} {} (already bound at {})",
                endpoint.method, endpoint.pattern, existing.pattern
            ))),
            None => {
                endpoints.push(endpoint);
                Ok(true)
            }
        }
    }

    fn node_for<'n>(mut node: &'n mut Node<T>, segments: &[Segment<'_>]) -> &'n mut Node<T> {
        for segment in segments {
            node = match segment {
                Segment::Static(s) => {
                    match node.children.iter().position(|c| c.segment == *s) {
                        Some(pos) => &mut node.children[pos],
                        None => {
                            node.children.push(Node::new((*s).to_string()));
                            let last = node.children.len() - 1;
                            &mut node.children[last]
                        }
                    }
                }
                Segment::Param(_) | Segment::Optional(_) => {
                    &mut **node
                        .param_child
                        .get_or_insert_with(|| Box::new(Node::new(":".to_string())))
                }
                Segment::Wildcard(_) | Segment::ZeroOrMore(_) => {
                    &mut **node
                        .wildcard_child
                        .get_or_insert_with(|| Box::new(Node::new("*".to_string())))
                }
            };
        }
        node
    }

    /// Depth-first walk in priority order: static, parameter, wildcard.
    /// `visit` is offered every terminal node that consumes the whole path and
    /// stops the walk by returning `true`.
    fn walk<'a, F>(
        path: &'a str,
        node: &'a Node<T>,
        segments: &[(usize, &'a str)],
        captures: &mut Vec<&'a str>,
        visit: &mut F,
    ) -> bool
    where
        F: FnMut(&'a Node<T>, &[&'a str]) -> bool,
    {
        let Some(&(offset, segment)) = segments.first() else {
            return !node.endpoints.is_empty() && visit(node, captures);
        };
        let remaining = &segments[1..];

        if let Some(child) = node.children.iter().find(|c| c.segment == segment) {
            if Self::walk(path, child, remaining, captures, visit) {
                return true;
            }
        }

        if let Some(child) = &node.param_child {
            captures.push(segment);
            if Self::walk(path, child, remaining, captures, visit) {
                return true;
            }
            captures.pop();
        }

        if let Some(child) = &node.wildcard_child {
            if !child.endpoints.is_empty() {
                let (last_offset, last) = segments[segments.len() - 1];
                captures.push(&path[offset..last_offset + last.len()]);
                if visit(child, captures) {
                    return true;
                }
                captures.pop();
            }
        }

        false
    }
}

impl<T: Clone + PartialEq> Default for RadixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_methods<T>(allowed: &mut Vec<Method>, endpoints: &[Endpoint<T>]) {
    for endpoint in endpoints {
        if !allowed.contains(&endpoint.method) {
            allowed.push(endpoint.method);
        }
    }
}

/// Template segment types
#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment<'p> {
    Static(&'p str),
    Param(&'p str),
    Optional(&'p str),
    /// `:name+`
    Wildcard(&'p str),
    /// `:name*`
    ZeroOrMore(&'p str),
}

/// Parse template into segments
fn parse_template(template: &str) -> Result<Vec<Segment<'_>>, RouterError> {
    let segments: Vec<Segment<'_>> = template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            let Some(capture) = segment
                .strip_prefix(':')
                .filter(|c| c.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '_'))
            else {
                return Ok(Segment::Static(segment));
            };
            let parsed = if let Some(name) = capture.strip_suffix('?') {
                Segment::Optional(name)
            } else if let Some(name) = capture.strip_suffix('*') {
                Segment::ZeroOrMore(name)
            } else if let Some(name) = capture.strip_suffix('+') {
                Segment::Wildcard(name)
            } else {
                Segment::Param(capture)
            };
            match parsed {
                Segment::Optional("") | Segment::ZeroOrMore("") | Segment::Wildcard("") => {
                    Err(RouterError::InvalidPath(template.to_string()))
                }
                other => Ok(other),
            }
        })
        .collect::<Result<_, _>>()?;

    let mut seen_optional = false;
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Wildcard(_) | Segment::ZeroOrMore(_) if i + 1 != segments.len() => {
                return Err(RouterError::InvalidPath(format!(
                    "{} (wildcard must be the last segment)",
                    template
                )));
            }
            Segment::Optional(_) => seen_optional = true,
            _ if seen_optional => {
                return Err(RouterError::InvalidPath(format!(
                    "{} (optional parameters must be trailing)",
                    template
                )));
            }
            _ => {}
        }
    }

    Ok(segments)
}

/// Expand optional and zero-or-more captures into concrete templates.
fn expand_template<'p>(segments: &[Segment<'p>]) -> Vec<Vec<Segment<'p>>> {
    let resolved: Vec<Segment<'p>> = segments
        .iter()
        .map(|segment| match *segment {
            Segment::Optional(name) => Segment::Param(name),
            Segment::ZeroOrMore(name) => Segment::Wildcard(name),
            other => other,
        })
        .collect();

    let first_optional = segments
        .iter()
        .position(|s| matches!(s, Segment::Optional(_) | Segment::ZeroOrMore(_)));

    match first_optional {
        Some(start) => (start..=resolved.len())
            .map(|end| resolved[..end].to_vec())
            .collect(),
        None => vec![resolved],
    }
}

fn render_template(segments: &[Segment<'_>]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Static(s) => out.push_str(s),
            Segment::Param(name) | Segment::Optional(name) => {
                out.push(':');
                out.push_str(name);
            }
            Segment::Wildcard(name) | Segment::ZeroOrMore(name) => {
                out.push(':');
                out.push_str(name);
                out.push('+');
            }
        }
    }
    out
}

/// Split a request path into non-empty segments with their byte offsets
fn split_path(path: &str) -> Vec<(usize, &str)> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    while start <= bytes.len() {
        let end = match memchr(b'/', &bytes[start..]) {
            Some(pos) => start + pos,
            None => bytes.len(),
        };
        if end > start {
            segments.push((start, &path[start..end]));
        }
        start = end + 1;
    }
    segments
}

/// Static-table key for a request path
fn normalize_path<'a>(path: &'a str, segments: &[(usize, &'a str)]) -> Cow<'a, str> {
    if segments.is_empty() {
        return Cow::Borrowed("/");
    }
    let canonical = path.starts_with('/')
        && !path.ends_with('/')
        && memchr::memmem::find(path.as_bytes(), b"//").is_none();
    if canonical {
        return Cow::Borrowed(path);
    }
    let mut key = String::with_capacity(path.len() + 1);
    for (_, segment) in segments {
        key.push('/');
        key.push_str(segment);
    }
    Cow::Owned(key)
}
