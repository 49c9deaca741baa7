/*
 * jar.rs
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

//! In-memory cookie jar keyed by domain.

use std::collections::BTreeMap;

use super::set_cookie::parse_set_cookie;
use super::{now, Cookie, CookieOrigin, CookieStore};
use crate::protocol::http::error::Result;

/// Cookies grouped by the domain they were stored under. Within a domain, cookies keep
/// insertion order; a cookie with the same (domain, name, path) replaces the old one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, Vec<Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by (domain, name, path).
    pub fn set(&mut self, cookie: Cookie) {
        let bucket = self.cookies.entry(cookie.domain.clone()).or_default();
        match bucket.iter_mut().find(|c| c.same_identity(&cookie)) {
            Some(existing) => *existing = cookie,
            None => bucket.push(cookie),
        }
    }

    pub fn get(&self, domain: &str, name: &str, path: &str) -> Option<&Cookie> {
        self.cookies
            .get(domain)?
            .iter()
            .find(|c| c.name == name && c.path == path)
    }

    pub fn remove(&mut self, domain: &str, name: &str, path: &str) -> Option<Cookie> {
        let bucket = self.cookies.get_mut(domain)?;
        let i = bucket.iter().position(|c| c.name == name && c.path == path)?;
        let removed = bucket.remove(i);
        if bucket.is_empty() {
            self.cookies.remove(domain);
        }
        Some(removed)
    }

    /// Cookies stored under exactly `domain`.
    pub fn domain(&self, domain: &str) -> &[Cookie] {
        self.cookies.get(domain).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Every cookie, grouped by domain in sorted domain order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.cookies.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Drop cookies whose non-zero expiry is before `now`. Returns how many were removed.
    pub fn remove_expired(&mut self, now: i64) -> usize {
        let before = self.len();
        for bucket in self.cookies.values_mut() {
            bucket.retain(|c| !c.is_expired(now));
        }
        self.cookies.retain(|_, bucket| !bucket.is_empty());
        before - self.len()
    }

    /// Cookies to send to `host`/`path` at time `now`, in precedence order: exact host,
    /// then `"." + host`, then the parent domain (host from its first `.` onward).
    pub fn matching(&self, host: &str, path: &str, secure_channel: bool, now: i64) -> Vec<&Cookie> {
        let mut buckets = vec![host.to_string(), format!(".{}", host)];
        if let Some(dot) = host.find('.') {
            buckets.push(host[dot..].to_string());
        }
        buckets
            .iter()
            .flat_map(|domain| self.domain(domain))
            .filter(|c| !c.is_expired(now))
            .filter(|c| !c.secure || secure_channel)
            .filter(|c| c.path.is_empty() || path.starts_with(c.path.as_str()))
            .collect()
    }

    /// `Cookie` header value (`a=1; b=2`) for `host`/`path` at time `now`.
    pub fn cookie_header_at(
        &self,
        host: &str,
        path: &str,
        secure_channel: bool,
        now: i64,
    ) -> String {
        self.matching(host, path, secure_channel, now)
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Parse and store one `Set-Cookie` value at time `now`.
    pub fn handle_set_cookie_at(
        &mut self,
        origin: &CookieOrigin,
        header: &str,
        now: i64,
    ) -> Result<()> {
        let cookie = parse_set_cookie(origin, header, now)?;
        log::debug!(
            "[cookie] set {} for {}{} (expires {})",
            cookie.name,
            cookie.domain,
            cookie.path,
            cookie.expires
        );
        self.set(cookie);
        Ok(())
    }
}

impl CookieStore for CookieJar {
    fn cookie_header(&self, host: &str, path: &str, secure_channel: bool) -> String {
        self.cookie_header_at(host, path, secure_channel, now())
    }

    fn handle_set_cookie(&mut self, origin: &CookieOrigin, set_cookie: &str) -> Result<()> {
        self.handle_set_cookie_at(origin, set_cookie, now())
    }
}
