use crate::constants::*;
use awssig_core::{Error, Result};
use log::debug;
use std::env;

/// Config for aws v4 signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`]
    /// - env value: [`AWS_DEFAULT_REGION`]
    pub region: Option<String>,
    /// `service` to sign for, default to `s3`.
    pub service: String,
    /// `max_expires_in` caps the expiry of presigned urls in seconds.
    ///
    /// - env value: [`AWSSIG_MAX_EXPIRES_IN`]
    /// - default to [`DEFAULT_MAX_EXPIRES_IN`] (7 days)
    pub max_expires_in: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            service: "s3".to_string(),
            max_expires_in: DEFAULT_MAX_EXPIRES_IN,
        }
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self) -> Result<Self> {
        if self.region.is_none() {
            self.region = env::var(AWS_REGION)
                .or_else(|_| env::var(AWS_DEFAULT_REGION))
                .ok()
                .filter(|v| !v.is_empty());
        }

        if let Ok(v) = env::var(AWSSIG_MAX_EXPIRES_IN) {
            self.max_expires_in = v.parse().map_err(|e| {
                Error::config_invalid(format!("{AWSSIG_MAX_EXPIRES_IN} {v:?} is not a number"))
                    .with_source(e)
            })?;
        }

        debug!("loaded config from env: {self:?}");
        Ok(self)
    }
}
