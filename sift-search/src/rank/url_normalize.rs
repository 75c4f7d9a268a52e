//! URL normalisation for result deduplication.
//!
//! Canonicalises URLs so that equivalent pages (differing only in
//! query-parameter order, tracking parameters, fragments, default ports or
//! scheme/host capitalisation) produce the same key.

use url::Url;

/// Tracking query parameters stripped during normalisation, in addition to
/// every `utm_*` parameter.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "mc_cid",
    "mc_eid",
    "ref",
    "ref_src",
];

/// Normalise a URL into a deduplication key.
///
/// 1. Lowercase scheme and host (path is preserved as-is).
/// 2. Remove default ports (`:80` for HTTP, `:443` for HTTPS).
/// 3. Strip tracking parameters, matching names case-insensitively.
/// 4. Sort remaining query parameters by key, then value.
/// 5. Remove the fragment.
///
/// Never fails: input that does not parse as a URL is returned trimmed.
///
/// # Examples
///
/// ```
/// use sift_search::rank::url_normalize::normalize_url;
///
/// let a = normalize_url("https://Example.COM:443/path?b=2&a=1&utm_source=x#section");
/// let b = normalize_url("https://example.com/path?a=1&b=2");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    parsed.set_fragment(None);

    if is_default_port(&parsed) {
        let _ = parsed.set_port(None);
    }

    if parsed.query().is_some() {
        let mut params: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            parsed.set_query(None);
        } else {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish();
            parsed.set_query(Some(&query));
        }
    }

    // Url::parse lowercases scheme and host, so the serialised form is canonical.
    parsed.to_string()
}

/// Lowercased hostname of `raw`, or `None` when it does not parse or has no host.
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .filter(|h| !h.is_empty())
}

/// `true` if `host` equals `domain` or is a subdomain of it.
pub fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// `true` if `host` matches any entry of `domains`.
pub fn matches_any<S: AsRef<str>>(host: &str, domains: &[S]) -> bool {
    domains.iter().any(|d| domain_matches(host, d.as_ref()))
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

fn is_default_port(url: &Url) -> bool {
    matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        let result = normalize_url("HTTPS://Example.COM/Path");
        assert_eq!(result, "https://example.com/Path");
    }

    #[test]
    fn preserves_trailing_slash() {
        let result = normalize_url("https://example.com/path/");
        assert_eq!(result, "https://example.com/path/");
    }

    #[test]
    fn removes_default_ports() {
        assert_eq!(
            normalize_url("http://example.com:80/path"),
            "http://example.com/path"
        );
        assert_eq!(
            normalize_url("https://example.com:443/path"),
            "https://example.com/path"
        );
    }

    #[test]
    fn preserves_non_default_port() {
        let result = normalize_url("https://example.com:8080/path");
        assert_eq!(result, "https://example.com:8080/path");
    }

    #[test]
    fn sorts_query_params_by_key_then_value() {
        let result = normalize_url("https://example.com/search?z=1&a=2&m=3&a=1");
        assert_eq!(result, "https://example.com/search?a=1&a=2&m=3&z=1");
    }

    #[test]
    fn removes_tracking_params() {
        let result = normalize_url(
            "https://example.com/page?q=rust&utm_source=google&fbclid=abc&gclid=xyz&mc_cid=1&ref_src=t",
        );
        assert_eq!(result, "https://example.com/page?q=rust");
    }

    #[test]
    fn tracking_params_match_case_insensitively() {
        let result = normalize_url("https://example.com/page?q=test&UTM_Source=twitter&Ref=x");
        assert_eq!(result, "https://example.com/page?q=test");
    }

    #[test]
    fn strips_any_utm_prefixed_param() {
        let result = normalize_url("https://example.com/?utm_id=7&id=3");
        assert_eq!(result, "https://example.com/?id=3");
    }

    #[test]
    fn removes_fragment() {
        let result = normalize_url("https://example.com/page#section");
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn equivalent_urls_normalize_to_same_string() {
        let variants = [
            "https://example.com/search?q=fetch&utm_source=dup",
            "https://example.com:443/search?utm_source=dup2&q=fetch#top",
            "HTTPS://EXAMPLE.com/search?q=fetch",
        ];
        let keys: Vec<String> = variants.iter().map(|v| normalize_url(v)).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]), "{keys:?}");
    }

    #[test]
    fn only_tracking_params_drops_query_entirely() {
        let result = normalize_url("https://example.com/page?utm_source=a&gclid=g");
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn invalid_url_returned_trimmed() {
        assert_eq!(normalize_url("  not a url at all "), "not a url at all");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn host_of_lowercases() {
        assert_eq!(host_of("https://Docs.Python.org/3/"), Some("docs.python.org".into()));
        assert_eq!(host_of("nonsense"), None);
    }

    #[test]
    fn domain_matching_is_suffix_on_label_boundary() {
        assert!(domain_matches("github.com", "github.com"));
        assert!(domain_matches("gist.github.com", "github.com"));
        assert!(domain_matches("gist.github.com", ".github.com"));
        assert!(!domain_matches("notgithub.com", "github.com"));
        assert!(!domain_matches("github.com", ""));
        assert!(matches_any("en.wikipedia.org", &["britannica.com", "wikipedia.org"]));
    }
}
