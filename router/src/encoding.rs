//! Path and query encoding strategies
//!
//! `Raw` follows RFC 3986: only unreserved characters survive encoding and
//! `+` is a literal plus. `Legacy` is the form encoding older applications
//! produced, where a space travels as `+`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Everything except RFC 3986 unreserved characters
const RAW: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URL encoding strategy shared by matching and generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Raw,
    Legacy,
}

impl Encoding {
    #[inline]
    pub fn from_raw_flag(raw: bool) -> Self {
        if raw {
            Encoding::Raw
        } else {
            Encoding::Legacy
        }
    }

    /// Decode a request path before it is looked up
    pub fn decode<'a>(self, path: &'a str) -> Cow<'a, str> {
        match self {
            Encoding::Legacy if path.contains('+') => {
                let spaced = path.replace('+', " ");
                Cow::Owned(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
            }
            _ => percent_decode_str(path).decode_utf8_lossy(),
        }
    }

    /// Encode one argument value for a path position
    pub fn encode<'a>(self, value: &'a str) -> Cow<'a, str> {
        match self {
            Encoding::Raw => utf8_percent_encode(value, RAW).into(),
            Encoding::Legacy => {
                let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
                if encoded == value {
                    Cow::Borrowed(value)
                } else {
                    Cow::Owned(encoded)
                }
            }
        }
    }

    /// Encode a wildcard value segment by segment, keeping its separators
    pub fn encode_segments(self, value: &str) -> String {
        value
            .split('/')
            .map(|segment| self.encode(segment))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Serialize query pairs as `application/x-www-form-urlencoded`
pub fn build_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Parse a query string into owned pairs, in order of appearance
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
