//! Core components for AWS request signing.
//!
//! This crate holds the building blocks that are independent of any
//! particular signing algorithm version:
//!
//! - [`Error`] and [`ErrorKind`]: the error taxonomy shared by all signers
//! - [`hash`]: SHA-256 and HMAC-SHA256 helpers
//! - [`time`]: fixed-width UTC formatting and strict parsing
//! - [`utils`]: general utilities including secret redaction
//!
//! ## Example
//!
//! ```
//! use awssig_core::hash::hex_sha256;
//!
//! assert_eq!(
//!     hex_sha256(b""),
//!     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
//! );
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};
