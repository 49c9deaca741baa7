/*
 * config.rs
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

//! Client configuration: per-client options and default on-disk locations
//! (`~/.corriere/cookies.txt` for the persistent cookie jar).

use std::path::PathBuf;
use std::time::Duration;

/// Default `User-Agent` sent by `HttpClient`.
pub const DEFAULT_USER_AGENT: &str = concat!("corriere/", env!("CARGO_PKG_VERSION"));

/// Options shared by every request a client builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Send `Cookie` headers from, and store `Set-Cookie` headers into, the client's jar.
    pub cookies_enabled: bool,
    pub user_agent: String,
    /// Per-address TCP connect limit. None blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,
    /// Limit on any single socket read or write. None blocks indefinitely.
    pub io_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cookies_enabled: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: None,
            io_timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn with_timeouts(mut self, connect: Duration, io: Duration) -> Self {
        self.connect_timeout = Some(connect);
        self.io_timeout = Some(io);
        self
    }
}

/// Default config directory: ~/.corriere.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|h| h.join(".corriere"))
}

/// Default Netscape cookie file: ~/.corriere/cookies.txt.
pub fn default_cookie_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("cookies.txt"))
}
