//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile a route pattern into literal and capture segments
//! - Match a request path segment-by-segment
//! - Extract named path parameters
//!
//! # Design Decisions
//! - Patterns are compiled once at registration, never re-parsed per request
//! - Segment counts must agree exactly (no greedy or wildcard segments)
//! - Literal matching is case-sensitive, trailing slashes are significant
//! - Each request segment is percent-decoded after splitting, so an encoded
//!   `%2F` stays inside its segment; invalid UTF-8 never matches
//! - No regex to guarantee O(n) matching

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;

/// Parameters captured from a matched path, keyed by capture name.
pub type PathParams = HashMap<String, String>;

/// A single `/`-separated piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Matches any path segment and binds it to the given name.
    Capture(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            Some(name) => Segment::Capture(name.to_string()),
            None => Segment::Literal(raw.to_string()),
        }
    }
}

/// A route pattern such as `/users/<id>`, compiled into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. Segments wrapped in angle brackets are captures.
    pub fn compile(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let segments = source.split('/').map(Segment::parse).collect();
        Self { source, segments }
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a request path, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            let part = percent_decode_str(part).decode_utf8().ok()?;
            match segment {
                Segment::Literal(literal) if *literal != part => return None,
                Segment::Literal(_) => {}
                Segment::Capture(name) => {
                    params.insert(name.clone(), part.into_owned());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_segments() {
        let pattern = PathPattern::compile("/users/<id>");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal(String::new()),
                Segment::Literal("users".into()),
                Segment::Capture("id".into()),
            ]
        );
    }

    #[test]
    fn test_capture_extraction() {
        let pattern = PathPattern::compile("/users/<id>");
        let params = pattern.matches("/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_segment_count_mismatch() {
        let pattern = PathPattern::compile("/users/<id>");
        assert!(pattern.matches("/users/42/edit").is_none());
        assert!(pattern.matches("/users").is_none());
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let pattern = PathPattern::compile("/About");
        assert!(pattern.matches("/About").is_some());
        assert!(pattern.matches("/about").is_none());
    }

    #[test]
    fn test_trailing_slash_is_significant() {
        let pattern = PathPattern::compile("/docs");
        assert!(pattern.matches("/docs/").is_none());

        let root = PathPattern::compile("/");
        assert!(root.matches("/").is_some());
        assert!(root.matches("/docs").is_none());
    }

    #[test]
    fn test_capture_matches_empty_segment() {
        let pattern = PathPattern::compile("/files/<name>");
        let params = pattern.matches("/files/").unwrap();
        assert_eq!(params["name"], "");
    }

    #[test]
    fn test_capture_is_percent_decoded() {
        let pattern = PathPattern::compile("/hello/<name>");
        let params = pattern.matches("/hello/Ada%20Lovelace").unwrap();
        assert_eq!(params["name"], "Ada Lovelace");
    }

    #[test]
    fn test_encoded_literal_matches() {
        let pattern = PathPattern::compile("/café");
        assert!(pattern.matches("/caf%C3%A9").is_some());
        assert!(pattern.matches("/café").is_some());
    }

    #[test]
    fn test_encoded_slash_stays_in_segment() {
        let pattern = PathPattern::compile("/files/<name>");
        let params = pattern.matches("/files/a%2Fb").unwrap();
        assert_eq!(params["name"], "a/b");
        assert!(PathPattern::compile("/files/a/b").matches("/files/a%2Fb").is_none());
    }

    #[test]
    fn test_invalid_utf8_does_not_match() {
        let pattern = PathPattern::compile("/files/<name>");
        assert!(pattern.matches("/files/%FF").is_none());
    }
}
