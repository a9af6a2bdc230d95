use crate::config::{ParameterLocation, ProtectorConfig};
use crate::error::{ConfigError, Result};
use crate::secure::Salt;
use crate::{digest, obfuscation, url_ext};
use std::borrow::Cow;
use url::Url;

/// Tamper protection for the path and query of a URL.
///
/// [`UrlExpirer`](crate::UrlExpirer) only depends on this trait, so any
/// scheme that can sign, verify and (optionally) move the protected URL into
/// the path can stand behind it.
pub trait Protector {
    fn config(&self) -> &ProtectorConfig;

    /// Returns `url` with a digest bound to its path and query.
    fn protect_path_and_query(&self, url: &Url, salt: &Salt) -> Result<Url>;

    /// `Ok(false)` for anything tampered with or unrecognised; `Err` only
    /// for inputs the caller should never pass.
    fn check_protected_path_and_query(&self, url: &Url, salt: &Salt) -> Result<bool>;

    fn place_protected_url_in_path(&self, url: &Url) -> Result<Url>;

    /// `Ok(None)` when the path is not one this protector produced.
    fn extract_protected_url_from_path(&self, url: &Url) -> Result<Option<Url>>;
}

/// Protects URLs from being tampered with by including a salted digest of
/// the original path and query.
///
/// The configuration is immutable, so a single protector can be shared
/// across threads (e.g. behind an `Arc`) without locking.
///
/// ```
/// use url_protection::{parse_absolute_url, Salt, UrlProtector};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let protector = UrlProtector::with_defaults();
/// let salt = Salt::new("per-user-secret".to_string())?;
///
/// let url = parse_absolute_url("https://www.example.org/protect-me?id=1")?;
/// let protected = protector.protect_path_and_query(&url, &salt)?;
/// assert!(protected.as_str().contains("id=1&h="));
/// assert!(protector.check_protected_path_and_query(&protected, &salt)?);
///
/// let tampered = parse_absolute_url(&protected.as_str().replace("id=1", "id=2"))?;
/// assert!(!protector.check_protected_path_and_query(&tampered, &salt)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UrlProtector {
    config: ProtectorConfig,
}

impl UrlProtector {
    pub fn new(config: ProtectorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Query mode with the digest in `h`.
    pub fn with_defaults() -> Self {
        Self {
            config: ProtectorConfig::default(),
        }
    }

    pub fn config(&self) -> &ProtectorConfig {
        &self.config
    }

    pub fn protect_path_and_query(&self, url: &Url, salt: &Salt) -> Result<Url> {
        url_ext::ensure_absolute(url)?;
        let hash_parameter = self.config.hash_parameter().as_str();

        // A digest already present is replaced, never stacked
        let pairs = url_ext::query_pairs(url);
        let query = url_ext::serialize_query(
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            Some(hash_parameter),
        );
        let digest = digest::compute(salt, &format!("{}{}", url.path(), query));

        let protected = url_ext::with_query(
            url,
            &url_ext::append_pair(query, hash_parameter, &digest),
        )?;

        match self.config.parameter_location() {
            ParameterLocation::Query => Ok(protected),
            ParameterLocation::Path => self.place_protected_url_in_path(&protected),
        }
    }

    pub fn check_protected_path_and_query(&self, url: &Url, salt: &Salt) -> Result<bool> {
        url_ext::ensure_absolute(url)?;

        let url = match self.config.parameter_location() {
            ParameterLocation::Query => Cow::Borrowed(url),
            ParameterLocation::Path => match self.extract_protected_url_from_path(url)? {
                Some(extracted) => Cow::Owned(extracted),
                None => {
                    tracing::debug!(path = url.path(), "path is not a protected URL");
                    return Ok(false);
                }
            },
        };

        let hash_parameter = self.config.hash_parameter().as_str();
        let pairs = url_ext::query_pairs(&url);

        let mut digests = pairs
            .iter()
            .filter(|(name, _)| name == hash_parameter)
            .map(|(_, value)| value.as_str());
        let received = match (digests.next(), digests.next()) {
            (Some(value), None) if !value.is_empty() => value,
            (None, _) => {
                tracing::debug!(hash_parameter, "digest parameter missing");
                return Ok(false);
            }
            _ => {
                tracing::debug!(hash_parameter, "digest parameter empty or repeated");
                return Ok(false);
            }
        };

        let query = url_ext::serialize_query(
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            Some(hash_parameter),
        );
        let expected = digest::compute(salt, &format!("{}{}", url.path(), query));

        let valid = digest::matches(&expected, received);
        if !valid {
            tracing::debug!(path = url.path(), "digest mismatch");
        }
        Ok(valid)
    }

    /// Conceals the path and query of `url` in the configured template.
    ///
    /// Exposed so a URL already protected in query mode can be re-wrapped.
    /// Only URLs whose query is in the form `protect_path_and_query` emits
    /// extract again. Fails with [`ConfigError::MissingPathTemplate`] when
    /// no template is configured, whatever the location.
    pub fn place_protected_url_in_path(&self, url: &Url) -> Result<Url> {
        url_ext::ensure_absolute(url)?;
        let template = self
            .config
            .path_template()
            .as_ref()
            .ok_or(ConfigError::MissingPathTemplate)?;

        let obfuscated = obfuscation::obfuscate(url_ext::path_and_query(url));
        url_ext::rebuild(url, &template.render(&obfuscated))
    }

    /// Recovers the URL concealed by [`Self::place_protected_url_in_path`].
    ///
    /// In query mode the URL is returned unchanged. In path mode `None`
    /// means the path does not match the template, the segment is not
    /// valid base64/UTF-8, or the decoded content does not rebuild into a
    /// URL on the same authority exactly as it was concealed.
    pub fn extract_protected_url_from_path(&self, url: &Url) -> Result<Option<Url>> {
        url_ext::ensure_absolute(url)?;
        if *self.config.parameter_location() == ParameterLocation::Query {
            return Ok(Some(url.clone()));
        }

        let template = self
            .config
            .path_template()
            .as_ref()
            .ok_or(ConfigError::MissingPathTemplate)?;

        let Some(segment) = template.capture(url.path()) else {
            return Ok(None);
        };
        let Some(path_and_query) = obfuscation::unobfuscate(segment) else {
            tracing::trace!("obfuscated segment is not valid base64");
            return Ok(None);
        };
        // Decoded content must be a path, or it could move the URL to another host
        if !path_and_query.starts_with('/') {
            return Ok(None);
        }

        let extracted = match url_ext::rebuild(url, &path_and_query) {
            Ok(extracted) => extracted,
            Err(_) => return Ok(None),
        };
        if url_ext::authority_prefix(&extracted) != url_ext::authority_prefix(url) {
            return Ok(None);
        }
        // Anything the parser dropped or rewrote was not put there by us
        if !url_ext::is_serialized_form(&extracted, &path_and_query) {
            tracing::debug!("concealed content does not round-trip");
            return Ok(None);
        }
        Ok(Some(extracted))
    }
}

impl Protector for UrlProtector {
    fn config(&self) -> &ProtectorConfig {
        UrlProtector::config(self)
    }

    fn protect_path_and_query(&self, url: &Url, salt: &Salt) -> Result<Url> {
        UrlProtector::protect_path_and_query(self, url, salt)
    }

    fn check_protected_path_and_query(&self, url: &Url, salt: &Salt) -> Result<bool> {
        UrlProtector::check_protected_path_and_query(self, url, salt)
    }

    fn place_protected_url_in_path(&self, url: &Url) -> Result<Url> {
        UrlProtector::place_protected_url_in_path(self, url)
    }

    fn extract_protected_url_from_path(&self, url: &Url) -> Result<Option<Url>> {
        UrlProtector::extract_protected_url_from_path(self, url)
    }
}
