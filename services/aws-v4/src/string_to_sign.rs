use crate::constants::ALGORITHM;
use crate::scope::SigningScope;
use awssig_core::hash::hex_sha256;
use awssig_core::time::parse_iso8601;
use awssig_core::{Error, Result};
use std::fmt::Write;

/// Build the string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20220313T072004Z
/// 20220313/<region>/<service>/aws4_request
/// <hashed_canonical_request>
/// ```
///
/// `timestamp` must be ISO8601 basic and fall on the scope's date.
pub fn build_string_to_sign(
    timestamp: &str,
    scope: &SigningScope,
    canonical_request: &str,
) -> Result<String> {
    parse_iso8601(timestamp)?;
    if &timestamp[..8] != scope.date() {
        return Err(Error::invalid_timestamp(format!(
            "timestamp {timestamp} is outside of scope date {}",
            scope.date()
        )));
    }

    let mut f = String::with_capacity(128);
    writeln!(f, "{ALGORITHM}")?;
    writeln!(f, "{timestamp}")?;
    writeln!(f, "{scope}")?;
    write!(f, "{}", hex_sha256(canonical_request.as_bytes()))?;
    Ok(f)
}
