use crate::config::{ParameterLocation, ParameterName, PathTemplate};
use crate::error::{ConfigError, OperationError, Result};
use crate::protector::{Protector, UrlProtector};
use crate::secure::Salt;
use crate::url_ext;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;
use url::Url;

/// Fixed 14-digit UTC creation time, e.g. `20220101000000`.
///
/// Previously issued URLs carry this exact format; it must never change.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;

/// Expires URLs after a given time.
///
/// The creation time is added as a query parameter before the URL is
/// protected, so the time cannot be changed without invalidating the digest.
/// The validity window is chosen when checking, not when stamping.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use std::time::Duration;
/// use url_protection::{parse_absolute_url, Salt, UrlExpirer, UrlProtector};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let expirer = UrlExpirer::new(UrlProtector::with_defaults())?;
/// let salt = Salt::new("per-user-secret".to_string())?;
/// let created = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
///
/// let url = parse_absolute_url("https://www.example.org/protect-me?id=1")?;
/// let expiring = expirer.expire_url_at(&url, &salt, created)?;
/// assert!(expiring.as_str().contains("t=20220101000000"));
///
/// let one_day = Duration::from_secs(86_400);
/// let boundary = Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 0).unwrap();
/// assert!(!expirer.has_url_expired_at(&expiring, &salt, one_day, boundary)?);
/// let later = Utc.with_ymd_and_hms(2022, 1, 2, 0, 0, 1).unwrap();
/// assert!(expirer.has_url_expired_at(&expiring, &salt, one_day, later)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UrlExpirer<P = UrlProtector> {
    protector: P,
    time_parameter: ParameterName,
}

impl<P: Protector> UrlExpirer<P> {
    /// Uses `t` for the creation time.
    pub fn new(protector: P) -> std::result::Result<Self, ConfigError> {
        Self::with_time_parameter(protector, ParameterName::time())
    }

    pub fn with_time_parameter(
        protector: P,
        time_parameter: ParameterName,
    ) -> std::result::Result<Self, ConfigError> {
        // The hash parameter is excluded from the digest
        if protector.config().hash_parameter() == &time_parameter {
            return Err(ConfigError::ParameterClash(time_parameter.as_str().to_string()));
        }
        Ok(Self {
            protector,
            time_parameter,
        })
    }

    pub fn protector(&self) -> &P {
        &self.protector
    }

    pub fn time_parameter(&self) -> &ParameterName {
        &self.time_parameter
    }

    pub fn hash_parameter(&self) -> &ParameterName {
        self.protector.config().hash_parameter()
    }

    pub fn parameter_location(&self) -> ParameterLocation {
        *self.protector.config().parameter_location()
    }

    pub fn path_template(&self) -> Option<&PathTemplate> {
        self.protector.config().path_template().as_ref()
    }

    /// Stamps `url` with the current UTC time and protects it.
    pub fn expire_url(&self, url: &Url, salt: &Salt) -> Result<Url> {
        self.expire_url_at(url, salt, Utc::now())
    }

    /// Stamps `url` with `timestamp` and protects it.
    ///
    /// An existing time parameter is replaced. Sub-second precision is
    /// dropped.
    pub fn expire_url_at(&self, url: &Url, salt: &Salt, timestamp: DateTime<Utc>) -> Result<Url> {
        url_ext::ensure_absolute(url)?;
        let time_parameter = self.time_parameter.as_str();

        let pairs = url_ext::query_pairs(url);
        let query = url_ext::serialize_query(
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            Some(time_parameter),
        );
        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let expiring = url_ext::with_query(
            url,
            &url_ext::append_pair(query, time_parameter, &stamp),
        )?;

        self.protector.protect_path_and_query(&expiring, salt)
    }

    /// Whether `url` is older than `valid_for`, measured against the current
    /// UTC time.
    pub fn has_url_expired(&self, url: &Url, salt: &Salt, valid_for: Duration) -> Result<bool> {
        self.has_url_expired_at(url, salt, valid_for, Utc::now())
    }

    /// Whether `url` is older than `valid_for` at `now`.
    ///
    /// A URL that fails verification, or whose time parameter was removed,
    /// is always expired. A URL exactly `valid_for` old is still valid.
    /// A time parameter that passed verification but cannot be parsed is an
    /// error ([`OperationError::MalformedTimestamp`]).
    pub fn has_url_expired_at(
        &self,
        url: &Url,
        salt: &Salt,
        valid_for: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        url_ext::ensure_absolute(url)?;

        if !self.protector.check_protected_path_and_query(url, salt)? {
            tracing::debug!("URL failed verification, treating as expired");
            return Ok(true);
        }

        // Read the time from the real URL, not the obfuscated one
        let Some(url) = self.protector.extract_protected_url_from_path(url)? else {
            return Ok(true);
        };

        let time_parameter = self.time_parameter.as_str();
        let stamp = url_ext::query_pairs(&url)
            .into_iter()
            .find(|(name, _)| name == time_parameter)
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty());
        let Some(stamp) = stamp else {
            tracing::debug!(time_parameter, "time parameter missing, treating as expired");
            return Ok(true);
        };

        let created = parse_timestamp(&stamp)?;
        let expired = match now.signed_duration_since(created).to_std() {
            Ok(elapsed) => elapsed > valid_for,
            // Created after `now`
            Err(_) => false,
        };

        tracing::trace!(%created, %now, expired, "expiry checked");
        Ok(expired)
    }
}

fn parse_timestamp(stamp: &str) -> Result<DateTime<Utc>> {
    if stamp.len() != TIMESTAMP_LEN || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OperationError::MalformedTimestamp(stamp.to_string()).into());
    }
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| OperationError::MalformedTimestamp(format!("{}: {}", stamp, e)).into())
}
