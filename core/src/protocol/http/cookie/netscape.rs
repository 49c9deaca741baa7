/*
 * netscape.rs
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

//! Netscape cookie file format (as read and written by curl, wget and browsers' export tools).
//!
//! One cookie per line, seven tab-separated fields:
//! `domain  include-subdomains  path  secure  expiry  name  value`.
//! HttpOnly cookies carry `#HttpOnly_` directly in front of the domain. Any other line
//! starting with `#` is a comment.

use std::fs;
use std::path::{Path, PathBuf};

use super::jar::CookieJar;
use super::{now, Cookie, CookieOrigin, CookieStore};
use crate::protocol::http::error::{HttpError, Result};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

const FILE_HEADER: &str = "# Netscape HTTP Cookie File\n\
# This file was generated by corriere. Edit at your own risk.\n\n";

fn flag(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Render the jar in Netscape format. Cookies whose non-zero expiry is before `now` are
/// left out; session cookies (expiry 0) are written.
pub fn write_netscape(jar: &CookieJar, now: i64) -> String {
    let mut out = String::from(FILE_HEADER);
    for c in jar.iter().filter(|c| !c.is_expired(now)) {
        if c.http_only {
            out.push_str(HTTP_ONLY_PREFIX);
        }
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            c.domain,
            flag(c.domain.starts_with('.')),
            c.path,
            flag(c.secure),
            c.expires,
            c.name,
            c.value
        ));
    }
    out
}

/// Parse Netscape-format text. Fails on the first record with fewer than seven fields or a
/// non-numeric expiry.
pub fn parse_netscape(text: &str) -> Result<Vec<Cookie>> {
    let mut cookies = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if !http_only && (line.starts_with('#') || line.trim().is_empty()) {
            continue;
        }
        let fields: Vec<&str> = line.splitn(7, '\t').collect();
        if fields.len() < 7 {
            return Err(HttpError::cookie(format!(
                "line {}: expected 7 tab-separated fields, found {}",
                lineno + 1,
                fields.len()
            )));
        }
        let expires = fields[4].trim().parse::<i64>().map_err(|_| {
            HttpError::cookie(format!("line {}: invalid expiry {:?}", lineno + 1, fields[4]))
        })?;
        cookies.push(Cookie {
            domain: fields[0].to_string(),
            path: fields[2].to_string(),
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            expires,
            name: fields[5].to_string(),
            value: fields[6].to_string(),
            http_only,
        });
    }
    Ok(cookies)
}

/// Cookie jar bound to a Netscape cookie file.
///
/// `load` merges the file into the jar (all or nothing). `save` rewrites the file. With
/// `save_on_drop` (the default) the jar is saved when dropped; failures are logged.
#[derive(Debug)]
pub struct NetscapeCookieJar {
    jar: CookieJar,
    path: PathBuf,
    pub save_on_drop: bool,
}

impl NetscapeCookieJar {
    /// Empty jar for `path`. Nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            jar: CookieJar::new(),
            path: path.into(),
            save_on_drop: true,
        }
    }

    /// Jar for `path`, loaded from the file when it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut jar = Self::new(path);
        if jar.path.exists() {
            jar.load()?;
        }
        Ok(jar)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn jar_mut(&mut self) -> &mut CookieJar {
        &mut self.jar
    }

    /// Read the file and merge its cookies. Returns the number of cookies read.
    ///
    /// On any error the jar is unchanged and `save_on_drop` is switched off, so the file
    /// that failed to load is not overwritten when the jar is dropped.
    pub fn load(&mut self) -> Result<usize> {
        let cookies = match fs::read_to_string(&self.path)
            .map_err(HttpError::from)
            .and_then(|text| parse_netscape(&text))
        {
            Ok(cookies) => cookies,
            Err(e) => {
                self.save_on_drop = false;
                log::warn!("[cookie] loading {} failed: {}", self.path.display(), e);
                return Err(e);
            }
        };
        let count = cookies.len();
        for cookie in cookies {
            self.jar.set(cookie);
        }
        log::info!("[cookie] loaded {} cookies from {}", count, self.path.display());
        Ok(count)
    }

    /// Write every unexpired cookie to the file, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, write_netscape(&self.jar, now()))?;
        log::info!("[cookie] saved cookies to {}", self.path.display());
        Ok(())
    }
}

impl CookieStore for NetscapeCookieJar {
    fn cookie_header(&self, host: &str, path: &str, secure_channel: bool) -> String {
        self.jar.cookie_header(host, path, secure_channel)
    }

    fn handle_set_cookie(&mut self, origin: &CookieOrigin, set_cookie: &str) -> Result<()> {
        self.jar.handle_set_cookie(origin, set_cookie)
    }
}

impl Drop for NetscapeCookieJar {
    fn drop(&mut self) {
        if self.save_on_drop {
            if let Err(e) = self.save() {
                log::warn!("[cookie] saving {} failed: {}", self.path.display(), e);
            }
        }
    }
}
