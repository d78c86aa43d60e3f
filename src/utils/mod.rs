//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Absolute and empty hrefs are returned unchanged.
pub fn resolve_url(base: &str, href: &str) -> String {
    if href.is_empty() || Url::parse(href).is_ok() {
        return href.to_string();
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Text after the final `/` of a URL, query string included.
pub fn last_path_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://xkcd.com/", "//imgs.xkcd.com/comics/a.png"),
            "https://imgs.xkcd.com/comics/a.png"
        );
        assert_eq!(
            resolve_url("http://example.com/path/", "page.png"),
            "http://example.com/path/page.png"
        );
        assert_eq!(
            resolve_url("http://example.com/path/", "/root.png"),
            "http://example.com/root.png"
        );
    }

    #[test]
    fn test_resolve_url_keeps_absolute_and_empty() {
        assert_eq!(resolve_url("https://xkcd.com/", "http://img/1.png"), "http://img/1.png");
        assert_eq!(resolve_url("https://xkcd.com/", ""), "");
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("http://limbero.org/jl8/42"), "42");
        assert_eq!(last_path_segment("http://limbero.org/jl8/"), "");
        assert_eq!(last_path_segment("no-slash"), "no-slash");
    }
}
