//! Secure memory handling for the salt
//!
//! The salt is the only secret in the scheme: anyone holding it can mint
//! digests for arbitrary URLs. It is zeroed on drop and never formatted.

use crate::error::InputError;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Explicit access to secret material.
///
/// Every read of the raw salt goes through `expose_secret`.
pub trait ExposeSecret {
    fn expose_secret(&self) -> &str;
}

/// Caller-supplied secret mixed into every digest.
///
/// The same salt must be presented when a URL is protected and when it is
/// later checked. A salt can never be blank.
///
/// # Example
///
/// ```
/// use url_protection::Salt;
///
/// let salt = Salt::new("per-user-secret".to_string()).unwrap();
/// assert_eq!(format!("{:?}", salt), "Salt([REDACTED])");
/// assert!(Salt::new("   ".to_string()).is_err());
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Salt(String);

impl Salt {
    /// Wraps `salt`, rejecting empty or whitespace-only values.
    ///
    /// The rejected string is zeroed before the error is returned.
    pub fn new(mut salt: String) -> Result<Self, InputError> {
        if salt.trim().is_empty() {
            salt.zeroize();
            return Err(InputError::BlankSalt);
        }
        Ok(Self(salt))
    }

    /// Returns the length of the salt in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the salt has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ExposeSecret for Salt {
    fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Salt {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Salt {
    type Error = InputError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_owned())
    }
}

impl PartialEq for Salt {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for Salt {}

// Prevent accidental logging of the salt
impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt([REDACTED])")
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
