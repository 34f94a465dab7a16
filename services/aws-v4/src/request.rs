use crate::constants::{X_AMZ_SECURITY_TOKEN, X_AMZ_SECURITY_TOKEN_QUERY};
use awssig_core::{Error, Result};
use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, Method};
use percent_encoding::percent_decode_str;

/// Payload of the request to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Body bytes, hashed into the canonical request.
    Bytes(Vec<u8>),
    /// Body is not signed, `UNSIGNED-PAYLOAD` is used instead of its hash.
    Unsigned,
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Bytes(Vec::new())
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}

/// Structured description of the request to sign.
///
/// `path` and `query` hold *decoded* values: the signer percent-encodes
/// them exactly once. Header names are case-insensitive, a name may carry
/// several values.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// URL scheme used when rendering presigned urls, `https` by default.
    pub scheme: String,
    /// `host[:port]` of the endpoint.
    pub authority: String,
    /// Decoded request path, must start with `/` unless empty.
    pub path: String,
    /// Decoded query parameters, duplicates allowed, order is irrelevant.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body or the unsigned marker.
    pub payload: Payload,
}

impl RequestDescriptor {
    /// Create a request descriptor with an empty body and no query or headers.
    pub fn new(method: Method, authority: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            scheme: "https".to_string(),
            authority: authority.into(),
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            payload: Payload::default(),
        }
    }

    /// Build a descriptor from http::request::Parts.
    ///
    /// The uri path is percent-decoded and the query parsed, so both are
    /// encoded exactly once again during canonicalization.
    pub fn from_parts(parts: &http::request::Parts, payload: Payload) -> Result<Self> {
        // Userinfo never reaches the wire `Host` header.
        let authority = match parts.uri.host() {
            Some(host) => match parts.uri.port_u16() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            None => match parts.headers.get(http::header::HOST) {
                Some(v) => v.to_str()?.to_string(),
                None => {
                    return Err(Error::request_invalid(
                        "request without authority is invalid for signing",
                    ))
                }
            },
        };

        let path = percent_decode_str(parts.uri.path()).decode_utf8()?;
        let query = parts
            .uri
            .query()
            .map(|v| {
                form_urlencoded::parse(v.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            method: parts.method.clone(),
            scheme: parts.uri.scheme_str().unwrap_or("https").to_string(),
            authority,
            path: path.into_owned(),
            query,
            headers: parts.headers.clone(),
            payload,
        })
    }

    /// Set the scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Mark the payload as unsigned.
    pub fn with_unsigned_payload(mut self) -> Self {
        self.payload = Payload::Unsigned;
        self
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Append a header value, keeping values already set for this name.
    pub fn header_append(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Builder flavour of [`RequestDescriptor::header_append`].
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.header_append(name, value)?;
        Ok(self)
    }

    /// Carry a session token as `x-amz-security-token` header.
    ///
    /// The signer never adds the token on its own, callers using temporary
    /// credentials must call this (or set the header) before signing.
    pub fn security_token_header(&mut self, token: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        self.headers.insert(X_AMZ_SECURITY_TOKEN, value);
        Ok(())
    }

    /// Carry a session token as `X-Amz-Security-Token` query parameter,
    /// used by presigned urls.
    pub fn security_token_query(&mut self, token: &str) {
        self.query.retain(|(k, _)| k != X_AMZ_SECURITY_TOKEN_QUERY);
        self.query_push(X_AMZ_SECURITY_TOKEN_QUERY, token);
    }

    /// Get header value by name, `None` if the header is absent or not
    /// visible ASCII.
    pub fn header_get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the first query value for the given key.
    pub fn query_get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
