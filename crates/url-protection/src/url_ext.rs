//! Decomposition and reconstruction helpers over [`url::Url`].

use crate::error::{InputError, OperationError, Result};
use url::{form_urlencoded, Position, Url};

/// Parses `input` and rejects anything that is not an absolute URL with an
/// authority.
///
/// ```
/// use url_protection::parse_absolute_url;
///
/// assert!(parse_absolute_url("https://www.example.org/protect-me?id=1").is_ok());
/// assert!(parse_absolute_url("/protect-me?id=1").is_err());
/// assert!(parse_absolute_url("mailto:someone@example.org").is_err());
/// ```
pub fn parse_absolute_url(input: &str) -> Result<Url> {
    let url = Url::parse(input).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => InputError::NotAbsolute,
        other => InputError::InvalidUrl(other.to_string()),
    })?;
    ensure_absolute(&url)?;
    Ok(url)
}

/// `Url` is always absolute in the RFC sense; this additionally requires a
/// host so that `scheme://authority` can be rebuilt.
pub(crate) fn ensure_absolute(url: &Url) -> Result<()> {
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(InputError::NotAbsolute.into());
    }
    Ok(())
}

/// `scheme://userinfo@host:port`
pub(crate) fn authority_prefix(url: &Url) -> &str {
    &url[..Position::BeforePath]
}

/// Path plus `?query` when a query is present. Fragments are not covered.
pub(crate) fn path_and_query(url: &Url) -> &str {
    &url[Position::BeforePath..Position::AfterQuery]
}

/// Decoded query pairs in their original order.
pub(crate) fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

/// Serializes decoded query pairs in `application/x-www-form-urlencoded`
/// form, skipping every pair named `exclude`.
///
/// The digest's canonical form goes through this function on both sides,
/// so it only depends on the decoded pairs and not on how the incoming
/// query happened to be encoded.
pub(crate) fn serialize_query<'a, I>(pairs: I, exclude: Option<&str>) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        if Some(name) == exclude {
            continue;
        }
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// Appends one pair to an already serialized query.
pub(crate) fn append_pair(query: String, name: &str, value: &str) -> String {
    form_urlencoded::Serializer::for_suffix(query, 0)
        .append_pair(name, value)
        .finish()
}

/// Rebuilds `scheme://authority` + `path_and_query` as an absolute URL.
pub(crate) fn rebuild(url: &Url, path_and_query: &str) -> Result<Url> {
    Url::parse(&format!("{}{}", authority_prefix(url), path_and_query))
        .map_err(|e| OperationError::Reconstruction(e.to_string()).into())
}

/// Whether `path_and_query` is exactly how `url` serializes, with its query
/// in the form [`serialize_query`] produces and no fragment.
///
/// Parsing trims whitespace and control bytes, turns `#` into a fragment and
/// skips empty query segments; none of those survive this check.
pub(crate) fn is_serialized_form(url: &Url, path_and_query: &str) -> bool {
    if url.fragment().is_some() {
        return false;
    }
    let expected = match url.query() {
        Some(_) => {
            let pairs = query_pairs(url);
            let query =
                serialize_query(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())), None);
            format!("{}?{}", url.path(), query)
        }
        None => url.path().to_string(),
    };
    expected == path_and_query
}

/// Same URL without fragment, with `query` as its (already encoded) query.
pub(crate) fn with_query(url: &Url, query: &str) -> Result<Url> {
    rebuild(url, &format!("{}?{}", url.path(), query))
}
