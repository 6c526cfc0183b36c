//! DID and DID URL parsing.
//!
//! Grammar: `did:<method>:<method-specific-id>` optionally followed by
//! `/<path>`, `?<query>` and `#<fragment>`, in that order. Parsing is pure
//! and reports malformed input as a [`ParseError`].

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

const DID_PREFIX: &str = "did:";

/// A parsed DID, immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Did {
    method: String,
    method_specific_id: String,
}

impl Did {
    /// Parses a bare DID, rejecting DID URL components.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let url = DidUrl::parse(input)?;
        if !url.is_bare() {
            return Err(ParseError::UnexpectedUrlComponents(input.to_string()));
        }
        Ok(url.did)
    }

    /// The method name, e.g. `key` for `did:key:...`
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn method_specific_id(&self) -> &str {
        &self.method_specific_id
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", DID_PREFIX, self.method, self.method_specific_id)
    }
}

impl FromStr for Did {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A DID plus optional path, query and fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidUrl {
    did: Did,
    path: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
}

impl DidUrl {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let rest = input
            .strip_prefix(DID_PREFIX)
            .ok_or(ParseError::MissingPrefix)?;

        let (rest, fragment) = split_component(rest, '#')?;
        let (rest, query) = split_component(rest, '?')?;
        let (did_part, path) = split_component(rest, '/')?;

        let (method, method_specific_id) = did_part.split_once(':').unwrap_or((did_part, ""));
        validate_method(method)?;
        validate_method_specific_id(method_specific_id)?;

        Ok(Self {
            did: Did {
                method: method.to_string(),
                method_specific_id: method_specific_id.to_string(),
            },
            path,
            query,
            fragment,
        })
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    /// The path without its leading `/`
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// True when no path, query or fragment is present.
    pub fn is_bare(&self) -> bool {
        self.path.is_none() && self.query.is_none() && self.fragment.is_none()
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

impl FromStr for DidUrl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Splits at the first `sep`. A separator with nothing after it is an error.
fn split_component(input: &str, sep: char) -> Result<(&str, Option<String>), ParseError> {
    match input.split_once(sep) {
        Some((_, "")) => Err(ParseError::EmptyComponent(sep)),
        Some((head, tail)) => Ok((head, Some(tail.to_string()))),
        None => Ok((input, None)),
    }
}

fn validate_method(method: &str) -> Result<(), ParseError> {
    if method.is_empty() {
        return Err(ParseError::EmptyMethod);
    }
    if method.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ParseError::UppercaseMethod(method.to_string()));
    }
    if !method
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ParseError::InvalidMethod(method.to_string()));
    }
    Ok(())
}

/// Segments are `idchar`s (alphanumerics, `.`, `-`, `_`, percent escapes)
/// joined by `:`; the last segment must not be empty.
fn validate_method_specific_id(id: &str) -> Result<(), ParseError> {
    if id.is_empty() {
        return Err(ParseError::EmptyMethodSpecificId);
    }
    let invalid = || ParseError::InvalidMethodSpecificId(id.to_string());

    if id.ends_with(':') {
        return Err(invalid());
    }

    let bytes = id.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3).ok_or_else(invalid)?;
                if !escape.iter().all(u8::is_ascii_hexdigit) {
                    return Err(invalid());
                }
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b':') => i += 1,
            _ => return Err(invalid()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_url_parsing() {
        let test_cases = vec![
            (
                "did:web:example.com:user:alice/path/to/resource?versionId=1#key-1",
                ("web", "example.com:user:alice", Some("path/to/resource"), Some("versionId=1"), Some("key-1")),
            ),
            (
                "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp#key-1",
                ("key", "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp", None, None, Some("key-1")),
            ),
            (
                "did:web:localhost%3A8443",
                ("web", "localhost%3A8443", None, None, None),
            ),
            (
                "did:example:123?service=files",
                ("example", "123", None, Some("service=files"), None),
            ),
            (
                "did:example:123#frag?not-a-query",
                ("example", "123", None, None, Some("frag?not-a-query")),
            ),
        ];

        for (input, expected) in test_cases {
            let parsed = DidUrl::parse(input).unwrap();
            assert_eq!(parsed.did().method(), expected.0);
            assert_eq!(parsed.did().method_specific_id(), expected.1);
            assert_eq!(parsed.path(), expected.2);
            assert_eq!(parsed.query(), expected.3);
            assert_eq!(parsed.fragment(), expected.4);
            assert_eq!(parsed.to_string(), input);
        }
    }

    #[test]
    fn test_invalid_did_format() {
        let invalid_dids = vec![
            ("not-a-did", ParseError::MissingPrefix),
            ("DID:key:abc", ParseError::MissingPrefix),
            ("did::abc", ParseError::EmptyMethod),
            ("did:", ParseError::EmptyMethod),
            ("did:key", ParseError::EmptyMethodSpecificId),
            ("did:key:", ParseError::EmptyMethodSpecificId),
            ("did:Key:abc", ParseError::UppercaseMethod("Key".to_string())),
            ("did:ke_y:abc", ParseError::InvalidMethod("ke_y".to_string())),
            ("did:web:example.com:", ParseError::InvalidMethodSpecificId("example.com:".to_string())),
            ("did:web:exa mple.com", ParseError::InvalidMethodSpecificId("exa mple.com".to_string())),
            ("did:web:bad%2", ParseError::InvalidMethodSpecificId("bad%2".to_string())),
            ("did:web:bad%zz", ParseError::InvalidMethodSpecificId("bad%zz".to_string())),
            ("did:web:example.com#", ParseError::EmptyComponent('#')),
            ("did:web:example.com?", ParseError::EmptyComponent('?')),
            ("did:web:example.com/", ParseError::EmptyComponent('/')),
            ("did:web:example.com/?#key-1", ParseError::EmptyComponent('?')),
        ];

        for (did, expected) in invalid_dids {
            assert_eq!(DidUrl::parse(did), Err(expected), "input: {}", did);
        }
    }

    #[test]
    fn test_bare_did() {
        let did: Did = "did:web:example.com".parse().unwrap();
        assert_eq!(did.to_string(), "did:web:example.com");

        assert!(matches!(
            Did::parse("did:web:example.com#key-1"),
            Err(ParseError::UnexpectedUrlComponents(_))
        ));
        assert_eq!(
            Did::parse("did:web:example.com#"),
            Err(ParseError::EmptyComponent('#'))
        );
    }
}
