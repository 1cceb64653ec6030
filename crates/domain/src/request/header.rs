//! HTTP Header types

use serde::{Deserialize, Serialize};

/// Name of the credential header stamped on outgoing requests.
pub const AUTHORIZATION: &str = "Authorization";

/// Scheme prefix of the credential header value.
const BEARER_PREFIX: &str = "Bearer ";

/// A single HTTP header with name and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The header name (e.g., "Content-Type")
    pub name: String,
    /// The header value (e.g., "application/json")
    pub value: String,
}

impl Header {
    /// Creates a new header.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// An ordered collection of HTTP headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    items: Vec<Header>,
}

impl Headers {
    /// Creates an empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Sets a header, replacing every existing header with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let header = Header::new(name, value);
        self.items.retain(|h| !h.is_named(&header.name));
        self.items.push(header);
    }

    /// Returns the value of the first header with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|h| h.is_named(name))
            .map(|h| h.value.as_str())
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn set_bearer(&mut self, token: &str) {
        self.set(AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
    }

    /// Returns the bearer token from the `Authorization` header, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }

    /// Returns an iterator over the headers.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.items.iter()
    }

    /// Returns the number of headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
