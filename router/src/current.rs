//! Last matched route, shared between the matching side and URL generation

use crate::matcher::RouteMatch;
use ahash::AHashMap;
use http::Uri;
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct State {
    name: Option<String>,
    arguments: AHashMap<String, String>,
    uri: Option<Uri>,
}

/// Thread-safe holder for the route matched for the current request
#[derive(Debug, Default)]
pub struct CurrentRoute {
    state: RwLock<State>,
}

impl CurrentRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful match
    pub fn set_route(&self, matched: &RouteMatch) {
        let mut state = self.state.write();
        state.name = Some(matched.name.clone());
        state.arguments = matched.arguments.clone();
    }

    pub fn set_uri(&self, uri: Uri) {
        self.state.write().uri = Some(uri);
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        *self.state.write() = State::default();
    }

    pub fn name(&self) -> Option<String> {
        self.state.read().name.clone()
    }

    pub fn arguments(&self) -> AHashMap<String, String> {
        self.state.read().arguments.clone()
    }

    pub fn uri(&self) -> Option<Uri> {
        self.state.read().uri.clone()
    }
}
