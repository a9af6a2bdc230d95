//! Property-based tests for url-protection
//!
//! These tests use proptest to check protection and expiry across a wide
//! range of paths, query strings and times.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::time::Duration;
use url_protection::{ProtectorConfig, Salt, Url, UrlExpirer, UrlProtector};

fn protectors() -> Vec<UrlProtector> {
    vec![
        UrlProtector::with_defaults(),
        UrlProtector::new(ProtectorConfig::path("/my-page/{0}").unwrap()).unwrap(),
        UrlProtector::new(ProtectorConfig::path("/files/{0}/download").unwrap()).unwrap(),
    ]
}

fn build_url(segments: &[String], pairs: &[(String, String)]) -> Url {
    let mut url = Url::parse("https://www.example.org/").unwrap();
    url.set_path(&segments.join("/"));
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

/// Replaces the query of the concealed URL and wraps it again.
fn with_pairs(protector: &UrlProtector, protected: &Url, pairs: &[(String, String)]) -> Url {
    let mut inner = protector
        .extract_protected_url_from_path(protected)
        .unwrap()
        .unwrap();
    inner.query_pairs_mut().clear().extend_pairs(pairs);
    match protector.config().path_template() {
        Some(_) => protector.place_protected_url_in_path(&inner).unwrap(),
        None => inner,
    }
}

fn decoded_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

prop_compose! {
    // Dot segments and '%' are left out so paths need no normalization
    fn segments()(segments in prop::collection::vec("[A-Za-z0-9_~-]{1,12}|[a-z \u{e4}\u{e9}\u{65e5}]{1,6}", 1..4)) -> Vec<String> {
        segments
    }
}

prop_compose! {
    // Names never collide with the digest parameter `h`
    fn query()(pairs in prop::collection::vec(("[a-gi-z][a-z0-9]{0,7}", "\\PC{0,16}"), 0..5)) -> Vec<(String, String)> {
        pairs
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the path and query, a protected URL verifies under the same salt
    #[test]
    fn protected_url_verifies(segments in segments(), pairs in query(), salt in "[!-~]{1,32}") {
        let salt = Salt::new(salt).unwrap();
        let url = build_url(&segments, &pairs);

        for protector in protectors() {
            let protected = protector.protect_path_and_query(&url, &salt).unwrap();
            prop_assert!(protector.check_protected_path_and_query(&protected, &salt).unwrap());
        }
    }

    /// The concealed URL carries the original path and decoded query
    #[test]
    fn extraction_restores_original(segments in segments(), pairs in query()) {
        let salt = Salt::try_from("fixed-salt").unwrap();
        let url = build_url(&segments, &pairs);

        for protector in protectors() {
            let protected = protector.protect_path_and_query(&url, &salt).unwrap();
            let inner = protector
                .extract_protected_url_from_path(&protected)
                .unwrap()
                .unwrap();

            prop_assert_eq!(inner.path(), url.path());
            let mut restored = decoded_pairs(&inner);
            prop_assert_eq!(restored.pop().map(|(name, _)| name), Some("h".to_string()));
            prop_assert_eq!(restored, pairs.clone());
        }
    }

    /// Changing any query value breaks verification
    #[test]
    fn altered_value_is_disallowed(
        segments in segments(),
        pairs in query().prop_filter("needs a pair", |p| !p.is_empty()),
        index in any::<prop::sample::Index>(),
    ) {
        let salt = Salt::try_from("fixed-salt").unwrap();
        let url = build_url(&segments, &pairs);

        for protector in protectors() {
            let protected = protector.protect_path_and_query(&url, &salt).unwrap();

            let mut altered = decoded_pairs(
                &protector.extract_protected_url_from_path(&protected).unwrap().unwrap(),
            );
            let i = index.index(altered.len() - 1);
            altered[i].1.push('x');

            let tampered = with_pairs(&protector, &protected, &altered);
            prop_assert!(!protector.check_protected_path_and_query(&tampered, &salt).unwrap());
        }
    }

    /// Characters appended to a concealed segment never verify
    #[test]
    fn appended_suffix_is_disallowed(
        segments in segments(),
        pairs in query(),
        suffix in "[A-Za-z0-9+=/]{1,8}|([A-Za-z0-9+/]{4}){1,2}",
    ) {
        let salt = Salt::try_from("fixed-salt").unwrap();
        let url = build_url(&segments, &pairs);

        for protector in protectors() {
            let protected = protector.protect_path_and_query(&url, &salt).unwrap();
            let tampered = Url::parse(&format!("{}{}", protected, suffix)).unwrap();
            prop_assert!(!protector.check_protected_path_and_query(&tampered, &salt).unwrap());
        }
    }

    /// A different salt never verifies
    #[test]
    fn other_salt_is_disallowed(segments in segments(), pairs in query(), a in "[a-z]{8}", b in "[a-z]{8}") {
        prop_assume!(a != b);
        let url = build_url(&segments, &pairs);
        let a = Salt::new(a).unwrap();
        let b = Salt::new(b).unwrap();

        for protector in protectors() {
            let protected = protector.protect_path_and_query(&url, &a).unwrap();
            prop_assert!(!protector.check_protected_path_and_query(&protected, &b).unwrap());
        }
    }

    /// The digest only uses characters that survive any transport unencoded
    #[test]
    fn digest_is_alphanumeric(segments in segments(), pairs in query()) {
        let salt = Salt::try_from("fixed-salt").unwrap();
        let url = build_url(&segments, &pairs);
        let protected = UrlProtector::with_defaults()
            .protect_path_and_query(&url, &salt)
            .unwrap();

        let (name, digest) = decoded_pairs(&protected).pop().unwrap();
        prop_assert_eq!(name, "h");
        prop_assert!(!digest.is_empty());
        prop_assert!(digest.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    /// Exactly `valid_for` old is valid, one second more is expired
    #[test]
    fn expiry_boundary(
        created in 946_684_800i64..4_102_444_800i64,
        valid_for in 0u64..=10 * 365 * 86_400,
        segments in segments(),
    ) {
        let salt = Salt::try_from("fixed-salt").unwrap();
        let created = DateTime::<Utc>::from_timestamp(created, 0).unwrap();
        let window = Duration::from_secs(valid_for);
        let boundary = created + chrono::Duration::seconds(valid_for as i64);
        let url = build_url(&segments, &[]);

        for protector in protectors() {
            let expirer = UrlExpirer::new(protector).unwrap();
            let expiring = expirer.expire_url_at(&url, &salt, created).unwrap();

            prop_assert!(!expirer.has_url_expired_at(&expiring, &salt, window, boundary).unwrap());
            prop_assert!(expirer
                .has_url_expired_at(&expiring, &salt, window, boundary + chrono::Duration::seconds(1))
                .unwrap());
        }
    }
}
