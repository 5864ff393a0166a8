//! URL Normalizer (spec §4.1) — canonical form for URL-level dedup.

use url::Url;

const TRACKING_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign", "ref", "fbclid"];

/// Lowercase scheme/host, strip the fragment and trailing slash, drop
/// tracking query params while preserving the order of the rest. Parse
/// failures return the input unchanged (treated as an opaque key).
pub fn normalize(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let scheme = parsed.scheme().to_lowercase();
    if parsed.set_scheme(&scheme).is_err() {
        return url.to_string();
    }
    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        if parsed.set_host(Some(&host)).is_err() {
            return url.to_string();
        }
    }

    parsed.set_fragment(None);

    let kept_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept_pairs {
            pairs.append_pair(k, v);
        }
        drop(pairs);
    }

    let mut result = parsed.to_string();
    if result.ends_with('/') && result.len() > 1 {
        // Don't eat a '/' that's part of the scheme separator (e.g. "http://")
        if !result.ends_with("://") {
            result.pop();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        let u = "HTTPS://Example.test/Path/?b=2&a=1&utm_source=x#frag";
        let once = normalize(u);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_tracking_params_preserves_order() {
        let normalized = normalize("https://ex.test/?utm_source=x&page=2&ref=y");
        assert_eq!(normalized, "https://ex.test/?page=2");
    }

    #[test]
    fn strips_trailing_slash_and_fragment() {
        assert_eq!(normalize("https://ex.test/path/#section"), "https://ex.test/path");
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(normalize("HTTPS://EX.TEST/path"), "https://ex.test/path");
    }

    #[test]
    fn preserves_query_param_order() {
        assert_eq!(normalize("https://ex.test/?b=2&a=1"), "https://ex.test/?b=2&a=1");
    }

    #[test]
    fn parse_failure_returns_input_unchanged() {
        assert_eq!(normalize("not a url"), "not a url");
    }

    #[test]
    fn tracking_param_dedup_scenario() {
        // spec.md §8 scenario 2
        let seed1 = normalize("https://ex.test/?utm_source=x&page=2");
        let seed2 = normalize("https://ex.test/?page=2");
        assert_eq!(seed1, seed2);
    }
}
