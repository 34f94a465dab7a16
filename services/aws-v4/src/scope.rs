use crate::constants::AWS4_REQUEST;
use awssig_core::time::{check_fixed_width, format_date, parse_date, DateTime};
use awssig_core::{Error, Result};
use std::fmt;

/// Credential scope: `20130524/us-east-1/s3/aws4_request`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningScope {
    date: String,
    region: String,
    service: String,
}

impl SigningScope {
    /// Build a scope from a `yyyyMMdd` date.
    pub fn new(date: &str, region: &str, service: &str) -> Result<Self> {
        parse_date(date)?;
        check_component("region", region)?;
        check_component("service", service)?;

        Ok(Self {
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
        })
    }

    /// Build a scope from the UTC date of `time`.
    pub fn from_time(time: DateTime, region: &str, service: &str) -> Result<Self> {
        check_fixed_width(time)?;
        Self::new(&format_date(time), region, service)
    }

    /// Date part of the scope, `yyyyMMdd`.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Region part of the scope.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Service part of the scope.
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for SigningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{AWS4_REQUEST}",
            self.date, self.region, self.service
        )
    }
}

/// Region and service are joined with `/`, neither may be empty or contain
/// separators or whitespace.
fn check_component(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::config_invalid(format!("{name} must not be empty")));
    }
    if value
        .bytes()
        .any(|b| b == b'/' || !b.is_ascii_graphic())
    {
        return Err(Error::config_invalid(format!(
            "{name} {value:?} contains invalid characters"
        )));
    }
    Ok(())
}
