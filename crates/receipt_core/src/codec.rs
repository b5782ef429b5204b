use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use url::Url;

/// Characters left as-is when encoding a token into a path segment.
/// Matches the unreserved set of `encodeURIComponent`.
const TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("uuid pattern")
});

/// A receipt token that passed UUID validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenId(String);

impl TokenId {
    /// Validates `raw` (after trimming) as a token id.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        is_uuid(trimmed).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn is_uuid(candidate: &str) -> bool {
    UUID_PATTERN.is_match(candidate)
}

/// Strips a leading `http://` / `https://` and any trailing slashes.
pub fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim();
    let without_scheme = strip_prefix_ignore_case(trimmed, "https://")
        .or_else(|| strip_prefix_ignore_case(trimmed, "http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

/// Builds `https://{domain}/r/{token}` with the token trimmed and percent-encoded.
///
/// Never fails; empty inputs yield a degenerate but well-formed string.
pub fn build_receipt_url(domain: &str, token: &str) -> String {
    let domain = normalize_domain(domain);
    let token = utf8_percent_encode(token.trim(), TOKEN_ENCODE_SET);
    format!("https://{domain}/r/{token}")
}

/// Extracts a token id from scanned text: either a bare UUID or a URL whose
/// last non-empty path segment is a UUID.
pub fn extract_token_id(scanned: &str) -> Option<TokenId> {
    let trimmed = scanned.trim();
    if let Some(token) = TokenId::parse(trimmed) {
        return Some(token);
    }

    let url = Url::parse(trimmed).ok()?;
    let segment = url
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())?;
    TokenId::parse(segment)
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &input[prefix.len()..])
}
