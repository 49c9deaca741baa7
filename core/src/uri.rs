/*
 * uri.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a blocking HTTP/1.1 client transport.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! URL splitting (scheme, netloc, path, params, query, fragment) and URI component coding
//! for form data. Components are independent strings; a missing component is empty.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Component set: everything except ALPHA / DIGIT / `-` `_` `.` `~` is percent-encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Six components of `<scheme>://<netloc>/<path>;<params>?<query>#<fragment>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

/// Split `url` into its six components. `default_scheme` is used when the URL has none.
/// With `allow_fragments` false, a `#` stays part of the path or query.
/// Returns None for an empty URL or an unbalanced IPv6 literal in the netloc.
pub fn parse_url(url: &str, default_scheme: &str, allow_fragments: bool) -> Option<UrlParts> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let mut parts = UrlParts::default();
    let mut rest = url;
    if let Some((scheme, after)) = url.split_once(':') {
        if is_scheme(scheme) {
            parts.scheme = scheme.to_ascii_lowercase();
            rest = after;
        }
    }
    if parts.scheme.is_empty() {
        parts.scheme = default_scheme.to_ascii_lowercase();
    }
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find(|c: char| c == '/' || c == '?' || c == '#').unwrap_or(after.len());
        parts.netloc = after[..end].to_string();
        rest = &after[end..];
        if parts.netloc.contains('[') != parts.netloc.contains(']') {
            return None;
        }
    }
    if allow_fragments {
        if let Some((before, fragment)) = rest.split_once('#') {
            parts.fragment = fragment.to_string();
            rest = before;
        }
    }
    if let Some((before, query)) = rest.split_once('?') {
        parts.query = query.to_string();
        rest = before;
    }
    let last_segment = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
    match rest[last_segment..].find(';') {
        Some(i) => {
            parts.path = rest[..last_segment + i].to_string();
            parts.params = rest[last_segment + i + 1..].to_string();
        }
        None => parts.path = rest.to_string(),
    }
    Some(parts)
}

/// Split a netloc into host and optional port. Userinfo (`user@`) is dropped and IPv6
/// brackets are removed. Returns None when the port is not a number.
pub fn split_netloc(netloc: &str) -> Option<(String, Option<u16>)> {
    let hostport = netloc.rsplit_once('@').map(|(_, h)| h).unwrap_or(netloc);
    if let Some(v6) = hostport.strip_prefix('[') {
        let (host, after) = v6.split_once(']')?;
        let port = match after.strip_prefix(':') {
            Some(p) => Some(p.parse().ok()?),
            None if after.is_empty() => None,
            None => return None,
        };
        return Some((host.to_string(), port));
    }
    match hostport.rsplit_once(':') {
        Some((host, "")) => Some((host.to_string(), None)),
        Some((host, port)) => Some((host.to_string(), Some(port.parse().ok()?))),
        None => Some((hostport.to_string(), None)),
    }
}

/// Form-style component encoding: space becomes `+`, unreserved characters pass through,
/// every other byte of the UTF-8 encoding becomes `%XX`.
pub fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string().replace("%20", "+")
}

/// Inverse of `encode_uri_component`. Invalid escapes are kept literally; invalid UTF-8 is
/// replaced with U+FFFD.
pub fn decode_uri_component(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_decode_str(&s).decode_utf8_lossy().into_owned()
}
