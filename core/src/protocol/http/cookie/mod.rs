/*
 * mod.rs
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

//! HTTP cookies: the in-memory jar, Set-Cookie parsing, cookie dates, and Netscape file
//! persistence.
//!
//! A request asks its cookie store for the `Cookie` header; a response hands every
//! `Set-Cookie` header back to the same store together with the request origin.

mod date;
mod jar;
mod netscape;
mod set_cookie;

use std::sync::{Arc, Mutex};

pub use date::parse_cookie_date;
pub use jar::CookieJar;
pub use netscape::{parse_netscape, write_netscape, NetscapeCookieJar};
pub use set_cookie::parse_set_cookie;

use crate::protocol::http::error::Result;

/// One stored cookie. `expires` is epoch seconds; 0 means a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub expires: i64,
}

impl Cookie {
    /// Session cookie with no flags.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            secure: false,
            http_only: false,
            expires: 0,
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn expires(mut self, expires: i64) -> Self {
        self.expires = expires;
        self
    }

    /// Non-zero expiry strictly before `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && self.expires < now
    }

    /// Same (domain, name, path) identity.
    pub fn same_identity(&self, other: &Cookie) -> bool {
        self.domain == other.domain && self.name == other.name && self.path == other.path
    }
}

/// Host and path of the request a response belongs to. Supplies the default Domain and Path
/// of cookies set by that response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOrigin {
    pub host: String,
    pub path: String,
}

impl CookieOrigin {
    /// Query and fragment are not part of the cookie path.
    pub fn new(host: impl Into<String>, request_path: &str) -> Self {
        let end = request_path
            .find(|c: char| c == '?' || c == '#')
            .unwrap_or(request_path.len());
        Self {
            host: host.into(),
            path: request_path[..end].to_string(),
        }
    }
}

/// Cookie storage used by requests and responses.
pub trait CookieStore {
    /// `Cookie` header value for a request, or an empty string when nothing matches.
    fn cookie_header(&self, host: &str, path: &str, secure_channel: bool) -> String;

    /// Apply one `Set-Cookie` header value received from `origin`.
    fn handle_set_cookie(&mut self, origin: &CookieOrigin, set_cookie: &str) -> Result<()>;
}

/// Cookie store shared between a client, its requests, and their responses.
pub type SharedCookieStore = Arc<Mutex<dyn CookieStore + Send>>;

/// Split a `Cookie` request header (`a=1; b=2`) into ordered name/value pairs.
/// Pairs without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Join name/value pairs into a `Cookie` request header.
pub fn format_cookie_header<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
