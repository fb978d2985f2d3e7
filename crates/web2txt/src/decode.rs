//! Character encoding resolution for fetched bodies
//!
//! Decoding never fails. The charset from the `Content-Type` header is tried
//! first; when it is missing, unknown, or rejects the bytes, the body is
//! decoded as UTF-8 and undecodable sequences become U+FFFD. That fallback is
//! lossy and is reported as [`DecodedBody::ReplacedInvalidBytes`].

use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

/// Result of decoding a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedBody {
    /// Bytes decoded cleanly
    Decoded(String),
    /// Some byte sequences were replaced with U+FFFD
    ReplacedInvalidBytes(String),
}

impl DecodedBody {
    /// Decoded text, lossy or not
    pub fn text(&self) -> &str {
        match self {
            DecodedBody::Decoded(text) | DecodedBody::ReplacedInvalidBytes(text) => text,
        }
    }

    /// Consume into the decoded text
    pub fn into_text(self) -> String {
        match self {
            DecodedBody::Decoded(text) | DecodedBody::ReplacedInvalidBytes(text) => text,
        }
    }

    /// True if replacement characters were substituted
    pub fn is_lossy(&self) -> bool {
        matches!(self, DecodedBody::ReplacedInvalidBytes(_))
    }
}

/// Extract the `charset` parameter from a Content-Type value
pub fn parse_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string())
        .filter(|value| !value.is_empty())
}

/// Decode `bytes` using the declared charset, falling back to lossy UTF-8
///
/// Returns the decoded body and the name of the encoding actually used.
pub fn decode_body(bytes: &[u8], declared_charset: Option<&str>) -> (DecodedBody, &'static str) {
    if let Some(label) = declared_charset {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes)
                {
                    return (DecodedBody::Decoded(text.into_owned()), encoding.name());
                }
                warn!(
                    charset = encoding.name(),
                    "Body does not decode with declared charset, falling back to UTF-8"
                );
            }
            None => {
                debug!(charset = label, "Unknown charset label, falling back to UTF-8");
            }
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => (DecodedBody::Decoded(text.to_string()), UTF_8.name()),
        Err(_) => {
            warn!("Body is not valid UTF-8, replacing invalid byte sequences");
            let text = String::from_utf8_lossy(bytes).into_owned();
            (DecodedBody::ReplacedInvalidBytes(text), UTF_8.name())
        }
    }
}
