use crate::error::ConfigError;
use derive_getters::Getters;
use regex::Regex;
use strum::{Display, EnumString, IntoStaticStr};

const PLACEHOLDER: &str = "{0}";
/// Standard base64 alphabet plus padding. `/` is part of the alphabet, so
/// the obfuscated segment may span several path segments. `+` is accepted
/// too: standard base64 emits it whenever the concealed text holds `~` or
/// `>` at an offset of 2 mod 3, so such segments fall outside
/// `[A-Za-z0-9=/]`.
const OBFUSCATED_CAPTURE: &str = "([A-Za-z0-9+=/]+)";

/// Where the protected payload travels.
///
/// - `Query`: the digest is appended as an ordinary query parameter.
/// - `Path`: path, query and digest are concealed together as one
///   base64 segment rendered through a [`PathTemplate`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ParameterLocation {
    #[default]
    Query,
    Path,
}

/// Non-empty query parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterName(String);

impl ParameterName {
    pub fn new(name: impl Into<String>) -> std::result::Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyParameterName);
        }
        Ok(Self(name))
    }

    /// Default name of the digest parameter.
    pub fn hash() -> Self {
        Self("h".to_string())
    }

    /// Default name of the creation time parameter.
    pub fn time() -> Self {
        Self("t".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ParameterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ParameterName {
    type Error = ConfigError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Path format used in [`ParameterLocation::Path`] mode, e.g. `/my-page/{0}`.
///
/// The template must be an absolute path containing exactly one `{0}`
/// placeholder. Literal parts are matched against the serialized
/// (percent-encoded) path, so they are restricted to characters a URL path
/// keeps verbatim.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    pattern: Regex,
}

impl PathTemplate {
    pub fn new(template: impl Into<String>) -> std::result::Result<Self, ConfigError> {
        let template = template.into();
        if template.is_empty() {
            return Err(ConfigError::MissingPathTemplate);
        }
        if !template.starts_with('/') {
            return Err(ConfigError::InvalidPathTemplate(template));
        }

        let (prefix, suffix) = match template.split_once(PLACEHOLDER) {
            Some((prefix, suffix)) if !suffix.contains(PLACEHOLDER) => (prefix, suffix),
            _ => return Err(ConfigError::PathTemplatePlaceholder),
        };
        if !prefix.chars().chain(suffix.chars()).all(is_verbatim_path_char) {
            return Err(ConfigError::InvalidPathTemplate(template));
        }

        // Anchored on both ends
        let pattern = Regex::new(&format!(
            "^{}{}{}$",
            regex::escape(prefix),
            OBFUSCATED_CAPTURE,
            regex::escape(suffix)
        ))
        .map_err(|e| ConfigError::InvalidPathTemplate(e.to_string()))?;

        Ok(Self { template, pattern })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub(crate) fn render(&self, obfuscated: &str) -> String {
        self.template.replacen(PLACEHOLDER, obfuscated, 1)
    }

    /// Returns the obfuscated segment if `path` was produced by this template.
    pub(crate) fn capture<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(path)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for PathTemplate {}

fn is_verbatim_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@/%".contains(c)
}

/// Immutable protector configuration, set once by the owning service and
/// shared by every protect/verify call.
///
/// A URL only verifies under the same configuration it was protected with.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ProtectorConfig {
    hash_parameter: ParameterName,
    parameter_location: ParameterLocation,
    path_template: Option<PathTemplate>,
}

impl ProtectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest carried openly as `?h=...`.
    pub fn query() -> Self {
        Self {
            hash_parameter: ParameterName::hash(),
            parameter_location: ParameterLocation::Query,
            path_template: None,
        }
    }

    /// Whole protected path and query concealed in `template`.
    pub fn path(template: impl Into<String>) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            hash_parameter: ParameterName::hash(),
            parameter_location: ParameterLocation::Path,
            path_template: Some(PathTemplate::new(template)?),
        })
    }

    pub fn with_hash_parameter(
        mut self,
        name: impl Into<String>,
    ) -> std::result::Result<Self, ConfigError> {
        self.hash_parameter = ParameterName::new(name)?;
        Ok(self)
    }

    pub fn with_location(mut self, location: ParameterLocation) -> Self {
        self.parameter_location = location;
        self
    }

    pub fn with_path_template(
        mut self,
        template: impl Into<String>,
    ) -> std::result::Result<Self, ConfigError> {
        self.path_template = Some(PathTemplate::new(template)?);
        Ok(self)
    }

    /// Checks the combination of settings; path mode needs a template.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.parameter_location == ParameterLocation::Path && self.path_template.is_none() {
            return Err(ConfigError::MissingPathTemplate);
        }
        Ok(())
    }
}

impl Default for ProtectorConfig {
    fn default() -> Self {
        Self::query()
    }
}
