//! HTTP method enumeration used as the dispatch key inside tree endpoints

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method enumeration with optimized representation
///
/// Uses discriminant values optimized for branch prediction and comparison speed.
/// Most common methods (GET, POST) have lower discriminant values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Method {
    GET = 0,
    POST = 1,
    PUT = 2,
    DELETE = 3,
    PATCH = 4,
    HEAD = 5,
    OPTIONS = 6,
    CONNECT = 7,
    TRACE = 8,
}

impl Method {
    /// Methods reported when a path is not routed at all.
    pub const ALL: [Method; 7] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
        Method::OPTIONS,
    ];

    /// Parse method from bytes. Matching is case-sensitive, as on the wire.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"PATCH" => Some(Method::PATCH),
            b"HEAD" => Some(Method::HEAD),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"CONNECT" => Some(Method::CONNECT),
            b"TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    /// Get method as static string slice (zero allocation)
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::from_bytes(b"GET"), Some(Method::GET));
        assert_eq!(Method::from_bytes(b"POST"), Some(Method::POST));
        assert_eq!(Method::from_bytes(b"get"), None);
        assert_eq!(Method::from_bytes(b"INVALID"), None);
    }

    #[test]
    fn test_all_methods_exclude_connect_and_trace() {
        assert_eq!(Method::ALL.len(), 7);
        assert!(!Method::ALL.contains(&Method::CONNECT));
        assert!(!Method::ALL.contains(&Method::TRACE));
    }

    #[test]
    fn test_method_string() {
        assert_eq!(Method::GET.as_str(), "GET");
        assert_eq!(Method::POST.to_string(), "POST");
        assert_eq!(Method::from_bytes(Method::TRACE.as_str().as_bytes()), Some(Method::TRACE));
    }
}
