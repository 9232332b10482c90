//! Route registrar: compiles declared routes into a [`DispatchTreeSet`]

use crate::dispatch::{host_regex, DispatchTreeSet};
use crate::error::{RouteError, RouteResult};
use crate::pattern::{self, PatternCompiler, PatternVariant, Quantifier, Token};
use crate::route::Route;
use radix_core::{Method, RadixTree, RouterError};
use tracing::{debug, info, warn};

/// How a route constrains the request host, resolved once per route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostBinding<'r> {
    Any,
    Exact(&'r str),
    Parameterized(&'r str),
    MultiExact(&'r [String]),
}

impl<'r> HostBinding<'r> {
    fn classify(route: &'r Route) -> RouteResult<Self> {
        match route.hosts() {
            [] => Ok(HostBinding::Any),
            [host] if pattern::has_variables(host) => {
                check_host_variables(host)?;
                Ok(HostBinding::Parameterized(host))
            }
            [host] => Ok(HostBinding::Exact(host)),
            hosts if hosts.iter().any(|host| pattern::has_variables(host)) => Err(RouteError::Config(
                "Placeholders are not allowed with multiple host names.".to_string(),
            )),
            hosts => Ok(HostBinding::MultiExact(hosts)),
        }
    }
}

/// Builds dispatch trees from routes
pub struct RouteRegistrar<'c> {
    compiler: &'c PatternCompiler,
}

impl<'c> RouteRegistrar<'c> {
    pub fn new(compiler: &'c PatternCompiler) -> Self {
        Self { compiler }
    }

    /// Register every dispatchable route.
    ///
    /// Any configuration error aborts the whole registration. A variant that
    /// collides with an earlier route for the same method is skipped with a
    /// warning; the earlier route keeps it.
    pub fn register<'r, I>(&self, routes: I) -> RouteResult<DispatchTreeSet>
    where
        I: IntoIterator<Item = &'r Route>,
    {
        let mut set = DispatchTreeSet::new();
        let mut registered = 0usize;
        let mut skipped = 0usize;

        for route in routes {
            let name = route.name();
            if !route.has_middleware() {
                debug!(route = %name, "route has no middleware, not dispatchable");
                skipped += 1;
                continue;
            }

            let methods = normalize_methods(route.methods());
            let variants = self.compiler.parse(route.pattern())?;

            match HostBinding::classify(route)? {
                HostBinding::Any => {
                    insert_variants(set.wildcard_tree_mut(), &methods, &variants, "", &name)?;
                }
                HostBinding::Exact(host) => {
                    insert_variants(set.exact_tree_mut(host), &methods, &variants, "", &name)?;
                }
                HostBinding::MultiExact(hosts) => {
                    for host in hosts {
                        insert_variants(set.exact_tree_mut(host), &methods, &variants, "", &name)?;
                    }
                }
                HostBinding::Parameterized(host) => {
                    host_regex(host).map_err(|e| {
                        RouteError::Config(format!("Invalid host pattern \"{}\": {}", host, e))
                    })?;
                    let prefix = host_path_template(host);
                    insert_variants(set.parameterized_tree_mut(), &methods, &variants, &prefix, &name)?;
                    set.record_host_pattern(&name, host);
                }
            }

            set.record_defaults(&name, route.defaults());
            registered += 1;
        }

        info!(
            registered,
            skipped,
            exact_hosts = set.exact_host_count(),
            parameterized_hosts = set.has_parameterized_hosts(),
            endpoints = set.endpoint_count(),
            "dispatch trees built"
        );
        Ok(set)
    }
}

/// Host variables always capture exactly one label
fn check_host_variables(host: &str) -> RouteResult<()> {
    for token in pattern::tokenize(host) {
        if let Token::Variable(variable) = token {
            if variable.quantifier != Quantifier::None {
                return Err(RouteError::Config(format!(
                    "Host \"{}\" cannot contain optional or wildcard variable \"{}\"",
                    host, variable.name
                )));
            }
        }
    }
    Ok(())
}

/// Any GET endpoint answers HEAD as well
fn normalize_methods(methods: &[Method]) -> Vec<Method> {
    let mut methods = methods.to_vec();
    if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
        methods.push(Method::HEAD);
    }
    methods
}

/// `{sub}.example.com` becomes `/:sub/example/com`
fn host_path_template(host: &str) -> String {
    let mut template = String::with_capacity(host.len() + 1);
    template.push('/');
    for token in pattern::tokenize(host) {
        match token {
            Token::Literal(text) => template.push_str(&text.replace('.', "/")),
            Token::Variable(variable) => {
                template.push(':');
                template.push_str(&variable.name);
            }
        }
    }
    template
}

fn insert_variants(
    tree: &mut RadixTree<String>,
    methods: &[Method],
    variants: &[PatternVariant],
    prefix: &str,
    name: &str,
) -> RouteResult<()> {
    for variant in variants {
        let template = format!("{}{}", prefix, variant.to_tree_template()?);
        debug!(route = name, template = %template, "registering variant");
        for &method in methods {
            match tree.add(&[method], &template, name.to_string()) {
                Ok(()) => {}
                Err(RouterError::DuplicateRoute(detail)) => {
                    warn!(route = name, %detail, "endpoint already taken by an earlier route");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}
