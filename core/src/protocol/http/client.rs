/*
 * client.rs
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

//! HTTP client: per-host defaults for building requests.
//!
//! The client holds no connection. Every request it builds opens its own socket when sent.

use crate::config::ClientOptions;
use crate::protocol::http::body::BodyProducer;
use crate::protocol::http::cookie::SharedCookieStore;
use crate::protocol::http::error::Result;
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::request::{host_header, Method, Request, UrlTarget};
use crate::protocol::http::response::Response;

/// Host, port and TLS flag plus the headers, options and cookie store copied into each request.
pub struct HttpClient {
    host: String,
    port: u16,
    tls: bool,
    headers: HeaderMap,
    options: ClientOptions,
    cookies: Option<SharedCookieStore>,
}

impl HttpClient {
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        Self::with_options(host, port, tls, ClientOptions::default())
    }

    pub fn with_options(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        options: ClientOptions,
    ) -> Self {
        let mut client = Self {
            host: host.into(),
            port,
            tls,
            headers: HeaderMap::new(),
            options,
            cookies: None,
        };
        client.headers.set("Host", host_header(&client.host, port, tls));
        client.headers.set("User-Agent", client.options.user_agent.as_str());
        client.headers.set("Accept", "*/*");
        client.headers.set("Connection", "close");
        client
    }

    /// Client for the host, port and scheme of an absolute URL. The URL path is ignored.
    pub fn from_url(url: &str) -> Result<Self> {
        let target = UrlTarget::parse(url)?;
        Ok(Self::new(target.host, target.port, target.tls))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ClientOptions {
        &mut self.options
    }

    /// Default headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a default header. Request-level headers still win.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Share a cookie store with every request built from now on.
    pub fn cookie_store(&mut self, store: SharedCookieStore) -> &mut Self {
        self.cookies = Some(store);
        self
    }

    pub fn cookies(&self) -> Option<&SharedCookieStore> {
        self.cookies.as_ref()
    }

    /// New request for `path` carrying the client defaults.
    pub fn request(&self, method: Method, path: &str) -> Request {
        let path = if path.is_empty() { "/" } else { path };
        let mut request = Request::new(self.host.as_str(), self.port, self.tls, method, path);
        for (name, value) in self.headers.iter() {
            request.header(name, value);
        }
        request.options = self.options.clone();
        if let Some(store) = &self.cookies {
            request.cookie_store(store.clone());
        }
        request
    }

    /// Send a GET for `path`.
    pub fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::Get, path).send()
    }

    /// Send a POST for `path` with `body`.
    pub fn post(&self, path: &str, body: impl BodyProducer + Send + 'static) -> Result<Response> {
        let mut request = self.request(Method::Post, path);
        request.body(body);
        request.send()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use crate::protocol::http::cookie::CookieJar;
    use std::sync::{Arc, Mutex};

    #[test]
    fn default_headers() {
        let client = HttpClient::new("example.com", 80, false);
        assert_eq!(client.headers().get("host"), Some("example.com"));
        assert_eq!(client.headers().get("user-agent"), Some(DEFAULT_USER_AGENT));
        assert_eq!(client.headers().get("accept"), Some("*/*"));
        let client = HttpClient::new("example.com", 8443, true);
        assert_eq!(client.headers().get("Host"), Some("example.com:8443"));
    }

    #[test]
    fn from_url_takes_scheme_and_port() {
        let client = HttpClient::from_url("https://api.example.com/ignored").unwrap();
        assert_eq!(
            (client.host(), client.port(), client.is_tls()),
            ("api.example.com", 443, true)
        );
        let client = HttpClient::from_url("http://localhost:8080").unwrap();
        assert_eq!((client.port(), client.is_tls()), (8080, false));
        assert!(HttpClient::from_url("ftp://example.com/").is_err());
    }

    #[test]
    fn request_carries_defaults_and_overrides() {
        let mut client = HttpClient::new("example.com", 80, false);
        client.header("Accept", "application/json");
        let jar: SharedCookieStore = Arc::new(Mutex::new(CookieJar::new()));
        client.cookie_store(jar);
        let mut request = client.request(Method::Get, "");
        request.header("X-Trace", "1");
        assert_eq!(request.path, "/");
        assert_eq!(request.headers.get("accept"), Some("application/json"));
        let head = String::from_utf8(request.compose_head()).unwrap();
        assert!(head.starts_with("GET / HTTP/1.1\r\n"));
        assert!(head.contains("Host: example.com\r\n"));
        assert!(head.contains("X-Trace: 1\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn options_flow_into_requests() {
        let mut client = HttpClient::new("example.com", 80, false);
        client.options_mut().cookies_enabled = false;
        let request = client.request(Method::Delete, "/x");
        assert!(!request.options.cookies_enabled);
        assert_eq!(request.method, Method::Delete);
    }
}
