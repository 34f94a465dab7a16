use crate::canonical::{canonical_headers, canonicalize, hashed_payload, join_query};
use crate::canonical::{CanonicalRequest, SigningMode};
use crate::constants::*;
use crate::request::{Payload, RequestDescriptor};
use crate::scope::SigningScope;
use crate::signing_key::{generate_signing_key, SigningKey, SigningKeyCache};
use crate::string_to_sign::build_string_to_sign;
use crate::{Config, Credential};
use awssig_core::hash::hex_hmac_sha256;
use awssig_core::time::{format_iso8601, DateTime};
use awssig_core::{Error, Result};
use http::request::Parts;
use http::{header, HeaderValue};
use log::debug;
use std::sync::Arc;

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// The signer holds no per-request state and can be shared freely between
/// threads. Session tokens are never injected: callers using temporary
/// credentials add `x-amz-security-token` (header mode) or
/// `X-Amz-Security-Token` (presigned mode) themselves.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,
    max_expires_in: u64,

    key_cache: Option<Arc<SigningKeyCache>>,
}

impl RequestSigner {
    /// Create a new signer for given service and region.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            max_expires_in: DEFAULT_MAX_EXPIRES_IN,

            key_cache: None,
        }
    }

    /// Create a signer from config, region is required.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let region = cfg
            .region
            .as_deref()
            .ok_or_else(|| Error::config_invalid("region is required to sign requests"))?;
        Ok(Self::new(&cfg.service, region).with_max_expires_in(cfg.max_expires_in))
    }

    /// Set the longest expiry accepted for presigned urls, in seconds.
    pub fn with_max_expires_in(mut self, secs: u64) -> Self {
        self.max_expires_in = secs;
        self
    }

    /// Reuse derived signing keys through the given cache.
    pub fn with_key_cache(mut self, cache: Arc<SigningKeyCache>) -> Self {
        self.key_cache = Some(cache);
        self
    }

    /// Sign `req` and return the value of its `Authorization` header.
    ///
    /// All headers carried by `req` are signed, `host` is added from the
    /// authority when absent.
    pub fn sign_header(
        &self,
        req: &RequestDescriptor,
        cred: &Credential,
        now: DateTime,
    ) -> Result<String> {
        cred.check()?;
        let scope = self.scope(now)?;
        let timestamp = format_iso8601(now);
        check_header_date(req, &timestamp)?;
        check_content_sha256(req)?;
        if let Some(token) = &cred.session_token {
            if req.header_get(X_AMZ_SECURITY_TOKEN) != Some(token.as_str()) {
                return Err(Error::missing_credential(format!(
                    "session token must be carried by the {X_AMZ_SECURITY_TOKEN} header"
                )));
            }
        }

        let creq = canonicalize(req, SigningMode::Header)?;
        let signature = self.calculate_signature(cred, &scope, &timestamp, &creq)?;

        Ok(format!(
            "{ALGORITHM} Credential={}/{scope},SignedHeaders={},Signature={signature}",
            cred.access_key_id,
            creq.signed_headers(),
        ))
    }

    /// Sign `req` for query authentication and return all query parameters
    /// of the presigned url.
    ///
    /// Every pair is already percent-encoded, pairs are in canonical order
    /// followed by `X-Amz-Signature`.
    pub fn presign_query(
        &self,
        req: &RequestDescriptor,
        cred: &Credential,
        now: DateTime,
        expires_in: i64,
    ) -> Result<Vec<(String, String)>> {
        let (creq, signature) = self.presign(req, cred, now, expires_in)?;

        let mut query = creq.canonical_query().to_vec();
        query.push((X_AMZ_SIGNATURE.to_string(), signature));
        Ok(query)
    }

    /// Sign `req` for query authentication and render the presigned url.
    ///
    /// `https://<authority><path>?<canonical query>&X-Amz-Signature=<signature>`
    pub fn sign_presigned_url(
        &self,
        req: &RequestDescriptor,
        cred: &Credential,
        now: DateTime,
        expires_in: i64,
    ) -> Result<String> {
        let (creq, signature) = self.presign(req, cred, now, expires_in)?;

        Ok(format!(
            "{}://{}{}?{}&{X_AMZ_SIGNATURE}={signature}",
            req.scheme,
            req.authority,
            creq.canonical_uri(),
            join_query(creq.canonical_query()),
        ))
    }

    /// Sign http request parts in header mode and insert the
    /// `Authorization` header.
    ///
    /// Other headers are left untouched.
    pub fn sign_parts(
        &self,
        parts: &mut Parts,
        payload: Payload,
        cred: &Credential,
        now: DateTime,
    ) -> Result<()> {
        let req = RequestDescriptor::from_parts(parts, payload)?;
        let authorization = self.sign_header(&req, cred, now)?;

        let mut value = HeaderValue::from_str(&authorization)?;
        value.set_sensitive(true);
        parts.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }

    fn presign(
        &self,
        req: &RequestDescriptor,
        cred: &Credential,
        now: DateTime,
        expires_in: i64,
    ) -> Result<(CanonicalRequest, String)> {
        self.check_expires_in(expires_in)?;
        cred.check()?;
        let scope = self.scope(now)?;
        if let Some((k, _)) = req
            .query
            .iter()
            .find(|(k, _)| RESERVED_QUERY_PARAMS.contains(&k.as_str()))
        {
            return Err(Error::request_invalid(format!(
                "query parameter {k} is set by the signer"
            )));
        }
        if let Some(token) = &cred.session_token {
            if req.query_get(X_AMZ_SECURITY_TOKEN_QUERY) != Some(token.as_str()) {
                return Err(Error::missing_credential(format!(
                    "session token must be carried by the {X_AMZ_SECURITY_TOKEN_QUERY} query parameter"
                )));
            }
        }
        // The signed host must be the one the url is fetched from.
        if let Some(host) = req.header_get(HOST) {
            if host.trim() != req.authority {
                return Err(Error::request_invalid(format!(
                    "{HOST} header {host:?} doesn't match authority {}",
                    req.authority
                )));
            }
        }
        let timestamp = format_iso8601(now);

        let signed_headers = canonical_headers(req, SigningMode::Presigned)?
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>()
            .join(";");

        let mut req = req.clone();
        req.query_push(X_AMZ_ALGORITHM, ALGORITHM);
        req.query_push(
            X_AMZ_CREDENTIAL,
            format!("{}/{scope}", cred.access_key_id),
        );
        req.query_push(X_AMZ_DATE_QUERY, timestamp.as_str());
        req.query_push(X_AMZ_EXPIRES, expires_in.to_string());
        req.query_push(X_AMZ_SIGNED_HEADERS, signed_headers);

        let creq = canonicalize(&req, SigningMode::Presigned)?;
        let signature = self.calculate_signature(cred, &scope, &timestamp, &creq)?;
        Ok((creq, signature))
    }

    fn calculate_signature(
        &self,
        cred: &Credential,
        scope: &SigningScope,
        timestamp: &str,
        creq: &CanonicalRequest,
    ) -> Result<String> {
        debug!("calculated canonical request: {creq}");

        let string_to_sign = build_string_to_sign(timestamp, scope, creq.as_str())?;
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = self.signing_key(cred, scope);
        Ok(hex_hmac_sha256(
            signing_key.as_bytes(),
            string_to_sign.as_bytes(),
        ))
    }

    fn signing_key(&self, cred: &Credential, scope: &SigningScope) -> SigningKey {
        match &self.key_cache {
            Some(cache) => cache.get_or_derive(&cred.secret_access_key, scope),
            None => generate_signing_key(&cred.secret_access_key, scope),
        }
    }

    // Scope: "20220313/<region>/<service>/aws4_request"
    fn scope(&self, now: DateTime) -> Result<SigningScope> {
        let scope = SigningScope::from_time(now, &self.region, &self.service)?;
        debug!("calculated scope: {scope}");
        Ok(scope)
    }

    fn check_expires_in(&self, expires_in: i64) -> Result<()> {
        if expires_in <= 0 {
            return Err(Error::invalid_expiry(format!(
                "expires_in must be positive, got {expires_in}"
            )));
        }
        if expires_in as u64 > self.max_expires_in {
            return Err(Error::invalid_expiry(format!(
                "expires_in {expires_in} exceeds the maximum of {} seconds",
                self.max_expires_in
            )));
        }
        Ok(())
    }
}

/// Sign `req` in header mode, see [`RequestSigner::sign_header`].
pub fn sign_header(
    req: &RequestDescriptor,
    cred: &Credential,
    region: &str,
    service: &str,
    now: DateTime,
) -> Result<String> {
    RequestSigner::new(service, region).sign_header(req, cred, now)
}

/// Render a presigned url, see [`RequestSigner::sign_presigned_url`].
pub fn sign_presigned_url(
    req: &RequestDescriptor,
    cred: &Credential,
    region: &str,
    service: &str,
    now: DateTime,
    expires_in: i64,
) -> Result<String> {
    RequestSigner::new(service, region).sign_presigned_url(req, cred, now, expires_in)
}

/// The server takes the request time from `x-amz-date`, it must match the
/// signing time.
fn check_header_date(req: &RequestDescriptor, timestamp: &str) -> Result<()> {
    match req.headers.get(X_AMZ_DATE) {
        None => Ok(()),
        Some(v) if v.as_bytes() == timestamp.as_bytes() => Ok(()),
        Some(v) => Err(Error::invalid_timestamp(format!(
            "{X_AMZ_DATE} header {v:?} doesn't match signing time {timestamp}"
        ))),
    }
}

/// `x-amz-content-sha256` must announce the same payload hash that is signed.
fn check_content_sha256(req: &RequestDescriptor) -> Result<()> {
    let Some(v) = req.headers.get(X_AMZ_CONTENT_SHA_256) else {
        return Ok(());
    };
    let expected = hashed_payload(&req.payload, SigningMode::Header);
    if v.as_bytes() != expected.as_bytes() {
        return Err(Error::request_invalid(format!(
            "{X_AMZ_CONTENT_SHA_256} header {v:?} doesn't match payload hash {expected}"
        )));
    }
    Ok(())
}
