//! URL resolution: host/path combination and query merging.

use crate::{HttpClientError, Request, Result};
use std::collections::BTreeMap;
use url::Url;

/// Join two URL fragments with exactly one `/` between them.
///
/// If either side is blank the other is returned unchanged.
pub fn combine_urls(first: &str, second: &str) -> String {
    if first.trim().is_empty() {
        return second.to_string();
    }
    if second.trim().is_empty() {
        return first.to_string();
    }

    let first = first.trim_end_matches(['/', '\\']);
    let second = second.trim_start_matches(['/', '\\']);
    format!("{first}/{second}")
}

/// Resolve the URL a request is sent to.
///
/// A non-blank `url_override` replaces host and path entirely. Explicit
/// query parameters overwrite same-named parameters already in the URL.
pub fn build_url(host: Option<&str>, request: &Request) -> Result<Url> {
    let base = match request
        .url_override
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    {
        Some(url) => url.to_string(),
        None => combine_urls(host.unwrap_or_default(), &request.path),
    };

    let mut url =
        Url::parse(&base).map_err(|e| HttpClientError::InvalidUrl(format!("{base:?}: {e}")))?;
    apply_query_parameters(&mut url, &request.query_string_parameters);
    Ok(url)
}

fn apply_query_parameters(url: &mut Url, parameters: &BTreeMap<String, String>) {
    if parameters.is_empty() {
        return;
    }

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (key, value) in parameters {
        let mut seen = false;
        pairs.retain(|(existing, _)| {
            if existing != key {
                return true;
            }
            let keep = !seen;
            seen = true;
            keep
        });

        match pairs.iter_mut().find(|(existing, _)| existing == key) {
            Some(pair) => pair.1 = value.clone(),
            None => pairs.push((key.clone(), value.clone())),
        }
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_combine_is_insensitive_to_slashes() {
        let expected = "https://postman-echo.com/get";
        for (host, path) in [
            ("https://postman-echo.com", "get"),
            ("https://postman-echo.com/", "get"),
            ("https://postman-echo.com", "/get"),
            ("https://postman-echo.com/", "/get"),
        ] {
            assert_eq!(combine_urls(host, path), expected, "{host} + {path}");
        }
    }

    #[test]
    fn test_combine_with_blank_side() {
        assert_eq!(combine_urls("", "https://h.test/get"), "https://h.test/get");
        assert_eq!(combine_urls("https://h.test/get", ""), "https://h.test/get");
        assert_eq!(combine_urls("", ""), "");
    }

    #[test]
    fn test_build_url_without_host_uses_full_path() {
        let request = Request::new("https://postman-echo.com/get");
        let url = build_url(None, &request).unwrap();
        assert_eq!(url.as_str(), "https://postman-echo.com/get");
    }

    #[test]
    fn test_url_override_wins() {
        let request = Request::new("/somepath")
            .with_url_override("https://postman-echo.com/get?param1=value1&param2=value2");
        let url = build_url(Some("http://localhost"), &request).unwrap();

        assert_eq!(url.host_str(), Some("postman-echo.com"));
        assert_eq!(url.path(), "/get");
        assert_eq!(query_value(&url, "param1").as_deref(), Some("value1"));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let request = Request::new("/get").with_url_override("  ");
        let url = build_url(Some("http://localhost"), &request).unwrap();
        assert_eq!(url.as_str(), "http://localhost/get");
    }

    #[test]
    fn test_explicit_query_overwrites_url_query() {
        let request = Request::new("/get?param1=old&param2=old").with_query("param1", "new");
        let url = build_url(Some("https://postman-echo.com"), &request).unwrap();

        assert_eq!(query_value(&url, "param1").as_deref(), Some("new"));
        assert_eq!(query_value(&url, "param2").as_deref(), Some("old"));
        assert_eq!(url.query_pairs().count(), 2);
    }

    #[test]
    fn test_duplicate_url_parameters_collapse_on_overwrite() {
        let request = Request::new("/get?a=1&a=2&b=3").with_query("a", "9");
        let url = build_url(Some("http://localhost"), &request).unwrap();
        assert_eq!(url.query(), Some("a=9&b=3"));
    }

    #[test]
    fn test_query_added_when_absent() {
        let request = Request::post("/post").with_query("param1", "value 1");
        let url = build_url(Some("http://localhost"), &request).unwrap();
        assert_eq!(url.as_str(), "http://localhost/post?param1=value+1");
    }

    #[test]
    fn test_empty_host_and_path_is_invalid() {
        let request = Request::new("");
        let result = build_url(None, &request);
        assert!(matches!(result, Err(HttpClientError::InvalidUrl(_))));
    }
}
