//! Raw-text inspection of a target's scheme and authority.
//!
//! The URL parser drops a port that equals the scheme default, and with a
//! placeholder scheme that would hide an explicit `:80`. These helpers read
//! the port straight from the text the user typed.

use super::Scheme;

/// Explicit `http://` or `https://` prefix, case-insensitive.
pub(super) fn explicit_scheme(raw: &str) -> Option<Scheme> {
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    if lower.starts_with("https://") {
        Some(Scheme::Https)
    } else if lower.starts_with("http://") {
        Some(Scheme::Http)
    } else {
        None
    }
}

/// A `name://` prefix naming some scheme other than http/https.
pub(super) fn foreign_scheme(raw: &str) -> Option<&str> {
    let (prefix, _) = raw.split_once("://")?;
    let looks_like_scheme = !prefix.is_empty()
        && prefix.starts_with(|c: char| c.is_ascii_alphabetic())
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if looks_like_scheme && explicit_scheme(raw).is_none() {
        Some(prefix)
    } else {
        None
    }
}

/// Port written in the authority section, if any.
pub(super) fn explicit_port(raw: &str) -> Option<u16> {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let authority = &rest[..end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    let port = if let Some(bracketed) = host_port.strip_prefix('[') {
        let close = bracketed.find(']')?;
        bracketed[close + 1..].strip_prefix(':')?
    } else {
        host_port.rsplit_once(':')?.1
    };
    port.parse().ok()
}
