//! Source URL validation and default output filename derivation

use crate::error::UrlError;
use std::fmt;
use url::Url;

/// Suffix appended to every derived output filename
pub const FILENAME_SUFFIX: &str = "_content.txt";

/// Longest filename stem kept before the suffix
const MAX_STEM_LEN: usize = 100;

/// A validated `http`/`https` URL with a non-empty host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    url: Url,
}

impl SourceUrl {
    /// Parsed URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full URL string
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Host component (lower-cased by the parser)
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Scheme component, `http` or `https`
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_url(s)
    }
}

/// Validate and canonicalize user input into a [`SourceUrl`]
///
/// Input without a scheme gets `https://` prepended. Schemes other than
/// `http` and `https` are rejected.
pub fn normalize_url(input: &str) -> Result<SourceUrl, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else if let Some(scheme) = explicit_scheme(trimmed) {
        return Err(UrlError::Malformed {
            input: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        });
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Malformed {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(SourceUrl { url }),
        _ => Err(UrlError::Malformed {
            input: trimmed.to_string(),
            reason: "missing host".to_string(),
        }),
    }
}

/// Derive the default output filename for `source`
///
/// Lower-cased host and path, every character outside `[a-z0-9]` replaced by
/// `_`, runs of `_` collapsed, trimmed, capped in length and suffixed with
/// [`FILENAME_SUFFIX`].
pub fn default_filename(source: &SourceUrl) -> String {
    let raw = format!("{}{}", source.host(), source.url().path()).to_lowercase();

    let mut stem = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for c in raw.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            stem.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            stem.push('_');
            prev_underscore = true;
        }
    }

    // stem is pure ASCII here, byte truncation is safe
    stem.truncate(MAX_STEM_LEN);
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "page" } else { stem };

    format!("{}{}", stem, FILENAME_SUFFIX)
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Scheme of `s` if it starts with `<scheme>://`
fn explicit_scheme(s: &str) -> Option<&str> {
    let (scheme, _) = s.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(matches!(normalize_url(""), Err(UrlError::Empty)));
        assert!(matches!(normalize_url("   "), Err(UrlError::Empty)));
        assert!(matches!(normalize_url("\t\n"), Err(UrlError::Empty)));
    }

    #[test]
    fn test_prepends_https() {
        for input in ["example.com", "example.com/a/b", "docs.rs/url/latest", "localhost:8080/x"] {
            let url = normalize_url(input).unwrap();
            assert_eq!(url.scheme(), "https");
            let first_segment = input.split('/').next().unwrap();
            let expected_host = first_segment.split(':').next().unwrap();
            assert_eq!(url.host(), expected_host, "input {input}");
        }
    }

    #[test]
    fn test_keeps_http_schemes() {
        let url = normalize_url("http://example.com/page").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.as_str(), "http://example.com/page");

        let url = normalize_url("  HTTPS://Example.com  ").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "example.com");
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            normalize_url("https://"),
            Err(UrlError::Malformed { .. })
        ));
        assert!(matches!(
            normalize_url("exa mple.com"),
            Err(UrlError::Malformed { .. })
        ));
        assert!(matches!(
            normalize_url("http://exa<mple.com"),
            Err(UrlError::Malformed { .. })
        ));
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = normalize_url("ftp://example.com/file.txt").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
        assert!(normalize_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_embedded_scheme_is_not_a_scheme() {
        let url = normalize_url("example.com/redirect?to=http://other.org").unwrap();
        assert_eq!(url.host(), "example.com");
    }

    #[test]
    fn test_default_filename() {
        let url = normalize_url("https://example.com").unwrap();
        assert_eq!(default_filename(&url), "example_com_content.txt");

        let url = normalize_url("https://Docs.Example.com/Guide/Intro-Page.html").unwrap();
        assert_eq!(
            default_filename(&url),
            "docs_example_com_guide_intro_page_html_content.txt"
        );

        let url = normalize_url("example.com/a//b///c/").unwrap();
        assert_eq!(default_filename(&url), "example_com_a_b_c_content.txt");
    }

    #[test]
    fn test_default_filename_ignores_query_and_fragment() {
        let a = normalize_url("https://example.com/page?x=1#top").unwrap();
        let b = normalize_url("https://example.com/page").unwrap();
        assert_eq!(default_filename(&a), default_filename(&b));
    }

    #[test]
    fn test_default_filename_is_deterministic_and_safe() {
        let inputs = [
            "https://example.com/caf%C3%A9/menu",
            "http://sub.domain.example.org:8080/path/to/page?q=1",
            "example.com/über/straße",
            "https://example.com/~user/index.php",
        ];
        for input in inputs {
            let url = normalize_url(input).unwrap();
            let first = default_filename(&url);
            let second = default_filename(&url);
            assert_eq!(first, second);

            let stem = first.strip_suffix(FILENAME_SUFFIX).unwrap();
            assert!(!stem.is_empty());
            assert!(stem
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            assert!(!stem.contains("__"));
            assert!(!stem.starts_with('_') && !stem.ends_with('_'));
        }
    }

    #[test]
    fn test_default_filename_length_cap() {
        let long_path = "segment/".repeat(40);
        let url = normalize_url(&format!("https://example.com/{}", long_path)).unwrap();
        let name = default_filename(&url);
        let stem = name.strip_suffix(FILENAME_SUFFIX).unwrap();
        assert!(stem.len() <= MAX_STEM_LEN);
        assert!(!stem.ends_with('_'));
    }

    #[test]
    fn test_from_str() {
        let url: SourceUrl = "example.com".parse().unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }
}
