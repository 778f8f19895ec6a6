use url::Url;

/// Normalizes a URL string for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; if it does not parse, return the input unchanged
/// 2. Remove the fragment (everything after #)
/// 3. Remove trailing slashes from the path, except for the bare origin
///
/// Trailing slashes are trimmed from the path even when a query follows, so
/// `https://a.com/p/?q=1` becomes `https://a.com/p?q=1`; this differs from
/// trimming only when the whole href ends in `/`.
///
/// Scheme, host case and query string are left to the `url` crate's own
/// canonical serialization. The function never fails, so callers can always
/// deduplicate on its output, and it is idempotent.
///
/// # Examples
///
/// ```
/// use site_crawl::url::normalize_url;
///
/// assert_eq!(normalize_url("https://a.com/p/"), "https://a.com/p");
/// assert_eq!(normalize_url("https://a.com/p#frag"), "https://a.com/p");
/// assert_eq!(normalize_url("https://a.com"), "https://a.com/");
/// assert_eq!(normalize_url("not a url"), "not a url");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    url.set_fragment(None);

    if !url.cannot_be_a_base() {
        let trimmed = url.path().trim_end_matches('/');
        if trimmed.len() != url.path().len() {
            let path = if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            };
            url.set_path(&path);
        }
    }

    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(normalize_url("https://a.com/p/"), "https://a.com/p");
        assert_eq!(normalize_url("https://a.com/p"), "https://a.com/p");
    }

    #[test]
    fn test_trailing_slash_before_query() {
        assert_eq!(normalize_url("https://a.com/p/?q=1"), "https://a.com/p?q=1");
        assert_eq!(normalize_url("https://a.com/?q=1"), "https://a.com/?q=1");
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(normalize_url("https://a.com/p#frag"), "https://a.com/p");
        assert_eq!(normalize_url("https://a.com/p#"), "https://a.com/p");
    }

    #[test]
    fn test_keep_root_slash() {
        assert_eq!(normalize_url("https://a.com/"), "https://a.com/");
        assert_eq!(normalize_url("https://a.com"), "https://a.com/");
        assert_eq!(normalize_url("https://a.com///"), "https://a.com/");
    }

    #[test]
    fn test_multiple_trailing_slashes() {
        assert_eq!(normalize_url("https://a.com/p//"), "https://a.com/p");
    }

    #[test]
    fn test_query_is_kept() {
        assert_eq!(
            normalize_url("https://a.com/p/?b=2&a=1#top"),
            "https://a.com/p?b=2&a=1"
        );
    }

    #[test]
    fn test_host_is_lowercased() {
        assert_eq!(normalize_url("https://A.COM/Page"), "https://a.com/Page");
    }

    #[test]
    fn test_unparseable_input_is_returned_unchanged() {
        assert_eq!(normalize_url("not a url"), "not a url");
        assert_eq!(normalize_url("/relative/path/"), "/relative/path/");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_opaque_urls_only_lose_fragment() {
        assert_eq!(
            normalize_url("mailto:someone@a.com#x"),
            "mailto:someone@a.com"
        );
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "https://a.com/p/",
            "https://a.com/p//#x",
            "https://A.com",
            "http://a.com:8080/dir/?q=1",
            "https://a.com/a/../b/",
            "not a url",
            "mailto:x@a.com",
        ];

        for input in inputs {
            let once = normalize_url(input);
            let twice = normalize_url(&once);
            assert_eq!(once, twice, "normalization of {} is not idempotent", input);
        }
    }
}
