//! radix-router - inspect a JSON route file from the command line
//!
//! Lists routes, matches requests against them, generates URLs and writes
//! the dispatch snapshot ahead of deployment.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use radix_router::error::{RouteError, RouteResult};
use radix_router::{
    Arguments, MatchResult, RouteCollection, RouteRegistry, RouterConfig, SnapshotStore, UrlGenerator,
    UrlMatcher,
};

#[derive(Parser, Debug)]
#[command(name = "radix-router")]
#[command(version = "0.1.0")]
#[command(about = "Match requests and generate URLs for a JSON route file", long_about = None)]
struct Args {
    /// Path to JSON route file
    #[arg(short, long)]
    routes: PathBuf,

    /// Path to JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use legacy form encoding (`+` for spaces)
    #[arg(long)]
    legacy_encoding: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List declared routes
    Routes,

    /// Match a request against the routes
    Match {
        /// Request path, still URL-encoded
        path: String,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request host
        #[arg(long, default_value = "")]
        host: String,
    },

    /// Generate a URL for a named route
    Generate {
        /// Route name
        name: String,

        /// Route argument as name=value; repeatable
        #[arg(short = 'a', long = "arg", value_parser = parse_pair)]
        arguments: Vec<(String, String)>,

        /// Query parameter as name=value; repeatable
        #[arg(short, long, value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Fragment to append
        #[arg(long)]
        hash: Option<String>,

        /// Generate an absolute URL
        #[arg(long)]
        absolute: bool,

        /// Scheme for absolute URLs
        #[arg(long)]
        scheme: Option<String>,

        /// Host for absolute URLs
        #[arg(long)]
        host: Option<String>,
    },

    /// Build the dispatch trees and write them to a snapshot file
    Compile {
        /// Snapshot file; defaults to the configured cache path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> RouteResult<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    let mut config = match &args.config {
        Some(path) => {
            let config = RouterConfig::from_file(path)?;
            info!("Configuration loaded from {}", path.display());
            config
        }
        None => RouterConfig::default(),
    };
    if args.legacy_encoding {
        config.encode_raw = false;
    }
    config.validate()?;

    let registry = RouteRegistry::from_file(&args.routes)?;
    info!("Loaded {} routes from {}", registry.len(), args.routes.display());
    let routes: Arc<dyn RouteCollection> = Arc::new(registry);

    match args.command {
        Command::Routes => {
            for route in routes.routes() {
                let methods: Vec<&str> = route.methods().iter().map(|m| m.as_str()).collect();
                println!(
                    "{:<24} {:<16} {}{}",
                    route.name(),
                    methods.join(","),
                    route.hosts().join("|"),
                    route.pattern()
                );
            }
        }
        Command::Match { path, method, host } => {
            let matcher = UrlMatcher::new(routes, None, &config);
            let output = match matcher.match_request(&host, &method, &path)? {
                MatchResult::Success(matched) => json!({
                    "status": 200,
                    "route": matched.name,
                    "arguments": matched.arguments,
                }),
                result => json!({
                    "status": if result.is_method_failure() { 405 } else { 404 },
                    "allowed": result.allowed_methods(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Generate {
            name,
            arguments,
            query,
            hash,
            absolute,
            scheme,
            host,
        } => {
            let generator = UrlGenerator::from_config(routes, &config);
            let arguments: Arguments = arguments.into_iter().collect();
            let query: Arguments = query.into_iter().collect();
            let url = if absolute {
                generator.generate_absolute(
                    &name,
                    &arguments,
                    &query,
                    hash.as_deref(),
                    scheme.as_deref(),
                    host.as_deref(),
                )?
            } else {
                generator.generate(&name, &arguments, &query, hash.as_deref())?
            };
            println!("{}", url);
        }
        Command::Compile { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(&config.cache_path));
            // Never restore the snapshot being replaced
            config.save_to_file = false;
            let matcher = UrlMatcher::new(routes, None, &config);
            let dispatch = matcher.dispatch()?;
            SnapshotStore::File(path.clone()).try_save(dispatch)?;
            info!(
                "Wrote {} endpoints to {}",
                dispatch.endpoint_count(),
                path.display()
            );
        }
    }

    Ok(())
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

/// Initialize structured logging with configurable level
fn init_logging(level: &str) -> RouteResult<()> {
    let env_filter = level.parse::<EnvFilter>().map_err(|e| {
        RouteError::Config(format!("Invalid log level '{}': {}", level, e))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .init();

    Ok(())
}
