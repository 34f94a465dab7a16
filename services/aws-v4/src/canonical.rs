// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Canonical request construction.
//!
//! ```text
//! HTTPMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! where every line of `CanonicalHeaders` is itself terminated by `\n`.

use crate::constants::{
    AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, HOST, UNSIGNED_PAYLOAD, UNSIGNED_HEADERS,
};
use crate::request::{Payload, RequestDescriptor};
use awssig_core::hash::hex_sha256;
use awssig_core::{Error, Result};
use http::Method;
use percent_encoding::utf8_percent_encode;
use std::fmt::{self, Write};

/// Where the signature will be carried.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SigningMode {
    /// Signature goes into the `Authorization` header.
    Header,
    /// Signature goes into the query of a presigned url.
    Presigned,
}

/// Canonical request of a single signing call.
///
/// Keeps the encoded parts the signer needs for rendering next to the
/// rendered string itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    rendered: String,
    uri: String,
    query: Vec<(String, String)>,
    signed_headers: Vec<String>,
}

impl CanonicalRequest {
    /// The full canonical request string.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// Percent-encoded request path.
    pub fn canonical_uri(&self) -> &str {
        &self.uri
    }

    /// Percent-encoded query pairs in canonical order.
    pub fn canonical_query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Lower-cased signed header names joined with `;`.
    pub fn signed_headers(&self) -> String {
        self.signed_headers.join(";")
    }

    /// Lower-case hex SHA256 of the canonical request.
    pub fn hash(&self) -> String {
        hex_sha256(self.rendered.as_bytes())
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Build the canonical request of `req`.
///
/// In presigned mode, the mandatory `X-Amz-*` parameters must already be
/// part of `req.query`.
pub fn canonicalize(req: &RequestDescriptor, mode: SigningMode) -> Result<CanonicalRequest> {
    let method = canonical_method(&req.method)?;
    let uri = canonical_uri(&req.path)?;
    let query = canonical_query(&req.query);
    let headers = canonical_headers(req, mode)?;
    let payload = hashed_payload(&req.payload, mode);

    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);
    writeln!(f, "{method}")?;
    writeln!(f, "{uri}")?;
    writeln!(f, "{}", join_query(&query))?;
    for (name, value) in headers.iter() {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    let signed_headers: Vec<String> = headers.into_iter().map(|(k, _)| k).collect();
    writeln!(f, "{}", signed_headers.join(";"))?;
    write!(f, "{payload}")?;

    Ok(CanonicalRequest {
        rendered: f,
        uri,
        query,
        signed_headers,
    })
}

/// Upper-case method name, restricted to the methods S3-like services accept.
pub fn canonical_method(method: &Method) -> Result<&'static str> {
    let m = match *method {
        Method::GET => "GET",
        Method::PUT => "PUT",
        Method::POST => "POST",
        Method::HEAD => "HEAD",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::OPTIONS => "OPTIONS",
        _ => {
            return Err(Error::unsupported_method(format!(
                "method {method} can't be signed"
            )))
        }
    };
    Ok(m)
}

/// Percent-encode the decoded path once, keeping `/` separators.
pub fn canonical_uri(path: &str) -> Result<String> {
    if path.is_empty() {
        return Ok("/".to_string());
    }
    if !path.starts_with('/') {
        return Err(Error::encoding(format!(
            "path {path:?} must start with '/'"
        )));
    }
    Ok(utf8_percent_encode(path, &AWS_URI_ENCODE_SET).to_string())
}

/// Encode every pair, then sort by encoded key and value.
pub fn canonical_query(query: &[(String, String)]) -> Vec<(String, String)> {
    let mut encoded: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    encoded.sort();
    encoded
}

/// Join canonical query pairs as `k=v&k=v`, empty values keep their `=`.
pub fn join_query(query: &[(String, String)]) -> String {
    let mut s = String::with_capacity(query.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (idx, (k, v)) in query.iter().enumerate() {
        if idx != 0 {
            s.push('&');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s
}

/// Select and normalize the headers to sign.
///
/// Returns `(lower-cased name, normalized value)` sorted by name. `host` is
/// always present, taken from the headers if set or from the authority.
pub fn canonical_headers(
    req: &RequestDescriptor,
    mode: SigningMode,
) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::with_capacity(req.headers.keys_len() + 1);

    for name in req.headers.keys() {
        let name = name.as_str();
        let signed = match mode {
            SigningMode::Header => !UNSIGNED_HEADERS.contains(&name),
            SigningMode::Presigned => name == HOST || name.starts_with("x-amz-"),
        };
        if !signed {
            continue;
        }

        let mut value = String::new();
        for (idx, v) in req.headers.get_all(name).iter().enumerate() {
            let v = v.to_str().map_err(|e| {
                Error::encoding(format!("value of header {name} is not visible ASCII"))
                    .with_source(e)
            })?;
            if idx != 0 {
                value.push(',');
            }
            normalize_header_value(v, &mut value);
        }
        headers.push((name.to_string(), value));
    }

    if !req.headers.contains_key(HOST) {
        if req.authority.is_empty() {
            return Err(Error::request_invalid(
                "request without authority is invalid for signing",
            ));
        }
        let mut value = String::with_capacity(req.authority.len());
        normalize_header_value(&req.authority, &mut value);
        headers.push((HOST.to_string(), value));
    }

    // Header names are unique in HeaderMap, sorting by name is enough.
    headers.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    Ok(headers)
}

/// Trim the value and collapse inner whitespace runs into a single space.
fn normalize_header_value(v: &str, out: &mut String) {
    for (idx, word) in v.split_ascii_whitespace().enumerate() {
        if idx != 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
}

/// Hex SHA256 of the payload, or `UNSIGNED-PAYLOAD`.
pub fn hashed_payload(payload: &Payload, mode: SigningMode) -> String {
    match (mode, payload) {
        (SigningMode::Header, Payload::Bytes(bs)) => hex_sha256(bs),
        _ => UNSIGNED_PAYLOAD.to_string(),
    }
}
