/*
 * set_cookie.rs
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

//! `Set-Cookie` header parsing.

use super::date::parse_cookie_date;
use super::{Cookie, CookieOrigin};
use crate::protocol::http::error::{HttpError, Result};

/// Parse one `Set-Cookie` value received from `origin` at time `now` (epoch seconds).
///
/// The first `;`-separated segment must be `name=value`. Recognised attributes (names are
/// case-insensitive): `Domain`, `Path`, `Expires`, `Max-Age`, `Secure`, `HttpOnly`.
/// Unknown attributes are ignored, as are unparseable `Expires`/`Max-Age` values. `Max-Age`
/// wins over `Expires`. A `Domain` attribute is stored with a leading dot so the cookie
/// applies to subdomains; without one the cookie belongs to the origin host only. A `Domain`
/// the origin host does not belong to is ignored.
pub fn parse_set_cookie(origin: &CookieOrigin, header: &str, now: i64) -> Result<Cookie> {
    let mut segments = header.split(';');
    let first = segments.next().unwrap_or("");
    let (name, value) = first
        .split_once('=')
        .ok_or_else(|| HttpError::cookie(format!("no value in Set-Cookie: {:?}", header)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(HttpError::cookie(format!("empty cookie name: {:?}", header)));
    }
    let mut cookie = Cookie::new(name, value.trim(), origin.host.as_str(), origin.path.as_str());
    let mut max_age: Option<i64> = None;

    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (attr, attr_value) = match segment.split_once('=') {
            Some((a, v)) => (a.trim(), Some(v.trim())),
            None => (segment, None),
        };
        if attr.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        } else if attr.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
        } else if attr.eq_ignore_ascii_case("domain") {
            let domain = attr_value
                .unwrap_or("")
                .trim_start_matches('.')
                .to_ascii_lowercase();
            if domain.is_empty() {
                continue;
            }
            if domain_matches(&origin.host, &domain) {
                cookie.domain = format!(".{}", domain);
            } else {
                log::warn!(
                    "[cookie] {} may not set cookies for domain {}; keeping host-only",
                    origin.host,
                    domain
                );
            }
        } else if attr.eq_ignore_ascii_case("path") {
            if let Some(path) = attr_value.filter(|p| p.starts_with('/')) {
                cookie.path = path.to_string();
            }
        } else if attr.eq_ignore_ascii_case("expires") {
            match attr_value.and_then(parse_cookie_date) {
                Some(t) => cookie.expires = t,
                None => log::debug!("[cookie] ignoring unparseable Expires in {:?}", header),
            }
        } else if attr.eq_ignore_ascii_case("max-age") {
            match attr_value.and_then(|v| v.parse::<i64>().ok()) {
                Some(secs) => max_age = Some(secs),
                None => log::debug!("[cookie] ignoring unparseable Max-Age in {:?}", header),
            }
        }
    }
    if let Some(secs) = max_age {
        // Non-positive Max-Age expires the cookie immediately.
        cookie.expires = if secs <= 0 { 1 } else { now.saturating_add(secs) };
    }
    Ok(cookie)
}

/// `host` is `domain` or a subdomain of it.
fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn origin() -> CookieOrigin {
        CookieOrigin::new("example.com", "/login")
    }

    #[test]
    fn defaults_from_origin_and_flags() {
        let c = parse_set_cookie(&origin(), "sid=abc123; Path=/; HttpOnly", NOW).unwrap();
        assert_eq!(c.domain, "example.com");
        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.path, "/");
        assert!(c.http_only);
        assert!(!c.secure);
        assert_eq!(c.expires, 0);

        let c = parse_set_cookie(&origin(), "a=b", NOW).unwrap();
        assert_eq!(c.path, "/login");
    }

    #[test]
    fn domain_attribute_gets_leading_dot() {
        let c = parse_set_cookie(&origin(), "a=b; domain=Example.COM; secure", NOW).unwrap();
        assert_eq!(c.domain, ".example.com");
        assert!(c.secure);
        let c = parse_set_cookie(&origin(), "a=b; Domain=.example.com", NOW).unwrap();
        assert_eq!(c.domain, ".example.com");
        let sub = CookieOrigin::new("www.example.com", "/");
        let c = parse_set_cookie(&sub, "a=b; Domain=example.com", NOW).unwrap();
        assert_eq!(c.domain, ".example.com");
    }

    #[test]
    fn foreign_domain_attribute_is_ignored() {
        let c = parse_set_cookie(&origin(), "a=b; Domain=evil.org", NOW).unwrap();
        assert_eq!(c.domain, "example.com");
        let c = parse_set_cookie(&origin(), "a=b; Domain=ample.com", NOW).unwrap();
        assert_eq!(c.domain, "example.com");
    }

    #[test]
    fn expires_and_max_age() {
        let c = parse_set_cookie(&origin(), "a=b; Expires=Wed, 21 Oct 2015 07:28:00 GMT", NOW)
            .unwrap();
        assert_eq!(c.expires, 1445412480);
        let c = parse_set_cookie(
            &origin(),
            "a=b; Max-Age=60; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
            NOW,
        )
        .unwrap();
        assert_eq!(c.expires, NOW + 60);
        let c = parse_set_cookie(&origin(), "a=b; Max-Age=0", NOW).unwrap();
        assert!(c.is_expired(NOW));
        let c = parse_set_cookie(&origin(), "a=b; Expires=soon", NOW).unwrap();
        assert_eq!(c.expires, 0);
    }

    #[test]
    fn value_may_contain_equals() {
        let c = parse_set_cookie(&origin(), "token=a=b=c; Path=/api", NOW).unwrap();
        assert_eq!(c.value, "a=b=c");
        assert_eq!(c.path, "/api");
    }

    #[test]
    fn missing_value_is_error() {
        let err = parse_set_cookie(&origin(), "novalue; Path=/", NOW).unwrap_err();
        assert!(matches!(err, HttpError::CookieParse(_)));
        assert!(parse_set_cookie(&origin(), "=x", NOW).is_err());
    }
}
