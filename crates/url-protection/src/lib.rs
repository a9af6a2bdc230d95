#![forbid(unsafe_code)]
//! # URL Protection
//!
//! Tamper-evident and self-expiring URLs with sensible defaults.
//!
//! A salted SHA-256 digest is bound to the path and query of a URL. The
//! digest travels either as a query parameter (`?id=1&h=...`) or, together
//! with the whole path and query, base64-concealed in a single path segment
//! (`/my-page/L3Byb3RlY3...`). Scheme and host are not covered, and the path
//! mode is obfuscation, not encryption.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use url_protection::{parse_absolute_url, ProtectorConfig, Salt, UrlExpirer, UrlProtector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Protect a URL against tampering
//! let protector = UrlProtector::new(ProtectorConfig::query())?;
//! let salt = Salt::new("per-user-secret".to_string())?;
//! let url = parse_absolute_url("https://www.example.org/protect-me?id=1")?;
//!
//! let protected = protector.protect_path_and_query(&url, &salt)?;
//! assert!(protector.check_protected_path_and_query(&protected, &salt)?);
//!
//! // Or make it expire as well
//! let expirer = UrlExpirer::new(protector)?;
//! let expiring = expirer.expire_url(&url, &salt)?;
//! assert!(!expirer.has_url_expired(&expiring, &salt, Duration::from_secs(3600))?);
//! # Ok(())
//! # }
//! ```

mod config;
mod digest;
mod error;
mod expirer;
mod obfuscation;
mod protector;
mod secure;
mod url_ext;

pub use config::{ParameterLocation, ParameterName, PathTemplate, ProtectorConfig};
pub use error::{ConfigError, Error, InputError, OperationError, Result};
pub use expirer::{UrlExpirer, TIMESTAMP_FORMAT};
pub use protector::{Protector, UrlProtector};
pub use secure::{ExposeSecret, Salt};
pub use url::Url;
pub use url_ext::parse_absolute_url;
