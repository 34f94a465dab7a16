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

use crate::constants::AWS4_REQUEST;
use crate::scope::SigningScope;
use awssig_core::hash::{hmac_sha256, sha256};
use awssig_core::{Error, Result};
use log::debug;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, PoisonError};

/// Key derived for exactly one (secret, date, region, service) tuple.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(***)")
    }
}

/// Derive the signing key for `yyyyMMdd` date, region and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, date)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
pub fn derive_signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<SigningKey> {
    if secret_access_key.is_empty() {
        return Err(Error::missing_credential("secret_access_key is empty"));
    }
    let scope = SigningScope::new(date, region, service)?;
    Ok(generate_signing_key(secret_access_key, &scope))
}

/// Run the HMAC chain over an already validated scope.
///
/// Intermediate keys stay raw bytes between stages.
pub(crate) fn generate_signing_key(secret: &str, scope: &SigningScope) -> SigningKey {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), scope.date().as_bytes());
    // Sign region
    let sign_region = hmac_sha256(&sign_date, scope.region().as_bytes());
    // Sign service
    let sign_service = hmac_sha256(&sign_region, scope.service().as_bytes());
    // Sign request
    SigningKey(hmac_sha256(&sign_service, AWS4_REQUEST.as_bytes()))
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    secret_digest: [u8; 32],
    scope: SigningScope,
}

/// Cache of derived signing keys, safe to share between threads.
///
/// Entries are keyed by the SHA256 of the secret together with the full
/// scope, the raw secret is never stored. Keys of dates older than the
/// newest inserted date are evicted on insert.
#[derive(Default)]
pub struct SigningKeyCache {
    entries: Mutex<HashMap<CacheKey, SigningKey>>,
}

impl SigningKeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached key for this secret and scope, deriving and
    /// caching it if absent.
    pub fn get_or_derive(&self, secret: &str, scope: &SigningScope) -> SigningKey {
        let key = CacheKey {
            secret_digest: sha256(secret.as_bytes()),
            scope: scope.clone(),
        };

        // A poisoned map still only holds fully derived keys.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(v) = entries.get(&key) {
            return *v;
        }

        let signing_key = generate_signing_key(secret, scope);
        // yyyyMMdd compares chronologically as a string.
        entries.retain(|k, _| k.scope.date() >= scope.date());
        entries.insert(key, signing_key);
        debug!(
            "cached signing key for scope {scope}, {} keys cached",
            entries.len()
        );
        signing_key
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for SigningKeyCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyCache")
            .field("len", &self.len())
            .finish()
    }
}
