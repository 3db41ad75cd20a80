//! Property-based tests for URL normalization.
//!
//! Verifies that already-schemed URLs pass through unchanged and that
//! scheme-less input always comes back with `https://` prefixed, for
//! arbitrary host-shaped strings.

use proptest::prelude::*;
use rstest::rstest;
use smartmark::types::bookmark::normalize_url;

/// Strategy for generating host-shaped strings with no scheme.
fn arb_bare_host() -> impl Strategy<Value = String> {
    (
        "[a-z][a-z0-9]{2,15}",
        prop_oneof![Just(".com"), Just(".org"), Just(".net"), Just(".io")],
        proptest::option::of("/[a-z0-9]{1,10}"),
    )
        .prop_map(|(host, tld, path)| format!("{}{}{}", host, tld, path.unwrap_or_default()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// *For any* scheme-less host, normalization prefixes `https://` exactly
    /// once and keeps the rest of the input intact.
    #[test]
    fn normalize_prefixes_https_for_bare_hosts(host in arb_bare_host()) {
        let normalized = normalize_url(&host);
        prop_assert_eq!(&normalized, &format!("https://{}", host));
    }

    /// *For any* already-normalized URL, a second pass is the identity.
    #[test]
    fn normalize_is_idempotent(host in arb_bare_host()) {
        let once = normalize_url(&host);
        let twice = normalize_url(&once);
        prop_assert_eq!(once, twice);
    }

    /// Surrounding whitespace never survives normalization.
    #[test]
    fn normalize_trims_whitespace(host in arb_bare_host(), pad in "[ \t]{0,4}") {
        let padded = format!("{}{}{}", pad, host, pad);
        prop_assert_eq!(normalize_url(&padded), format!("https://{}", host));
    }
}

#[rstest]
#[case("example.com", "https://example.com")]
#[case("http://x.com", "http://x.com")]
#[case("https://x.com", "https://x.com")]
#[case("  example.com  ", "https://example.com")]
#[case("", "")]
#[case("   ", "")]
fn test_normalize_known_inputs(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize_url(input), expected);
}
