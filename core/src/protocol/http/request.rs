/*
 * request.rs
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

//! HTTP request: method, path, headers, optional body producer and cookie store.
//!
//! `send` opens a new socket, writes the request head and body, and returns the response
//! bound to that socket.

use crate::config::ClientOptions;
use crate::protocol::http::body::BodyProducer;
use crate::protocol::http::cookie::{CookieOrigin, SharedCookieStore};
use crate::protocol::http::error::{HttpError, Result};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::response::Response;
use crate::protocol::http::socket::Socket;
use crate::uri::{parse_url, split_netloc};

/// Size of the pieces pulled from a body producer and written to the socket.
const BODY_PIECE_SIZE: usize = 1024;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheme default port.
pub fn default_port(tls: bool) -> u16 {
    if tls {
        443
    } else {
        80
    }
}

/// `Host` header value: host alone on the scheme default port, else `host:port`.
/// IPv6 literals are bracketed.
pub(crate) fn host_header(host: &str, port: u16, tls: bool) -> String {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    if port == default_port(tls) {
        host
    } else {
        format!("{}:{}", host, port)
    }
}

/// Host, port, TLS flag and request path derived from an absolute `http`/`https` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTarget {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    /// Path with `;params` and `?query` appended; `/` when the URL has no path.
    pub path: String,
}

impl UrlTarget {
    pub fn parse(url: &str) -> Result<Self> {
        let parts =
            parse_url(url, "http", true).ok_or_else(|| HttpError::InvalidUrl(url.to_string()))?;
        let tls = match parts.scheme.as_str() {
            "https" => true,
            "http" => false,
            _ => {
                return Err(HttpError::InvalidUrl(format!(
                    "unsupported scheme {:?} in {}",
                    parts.scheme, url
                )))
            }
        };
        let (host, port) =
            split_netloc(&parts.netloc).ok_or_else(|| HttpError::InvalidUrl(url.to_string()))?;
        if host.is_empty() {
            return Err(HttpError::InvalidUrl(format!("no host in {}", url)));
        }
        let mut path = if parts.path.is_empty() {
            "/".to_string()
        } else {
            parts.path
        };
        if !parts.params.is_empty() {
            path.push(';');
            path.push_str(&parts.params);
        }
        if !parts.query.is_empty() {
            path.push('?');
            path.push_str(&parts.query);
        }
        Ok(Self {
            host,
            port: port.unwrap_or_else(|| default_port(tls)),
            tls,
            path,
        })
    }
}

/// One HTTP/1.1 request.
pub struct Request {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub options: ClientOptions,
    body: Option<Box<dyn BodyProducer + Send>>,
    cookies: Option<SharedCookieStore>,
}

impl Request {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            path: path.into(),
            method,
            headers: HeaderMap::new(),
            options: ClientOptions::default(),
            body: None,
            cookies: None,
        }
    }

    /// Request for an absolute `http`/`https` URL.
    pub fn from_url(url: &str, method: Method) -> Result<Self> {
        let target = UrlTarget::parse(url)?;
        Ok(Self::new(target.host, target.port, target.tls, method, target.path))
    }

    /// Add or replace a header. Comparison is case-insensitive.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Attach the body, replacing any previous one.
    pub fn body(&mut self, body: impl BodyProducer + Send + 'static) -> &mut Self {
        self.body = Some(Box::new(body));
        self
    }

    pub fn set_body(&mut self, body: Option<Box<dyn BodyProducer + Send>>) {
        self.body = body;
    }

    pub fn body_producer(&self) -> Option<&(dyn BodyProducer + Send)> {
        self.body.as_deref()
    }

    pub fn cookie_store(&mut self, store: SharedCookieStore) -> &mut Self {
        self.cookies = Some(store);
        self
    }

    pub fn origin(&self) -> CookieOrigin {
        CookieOrigin::new(self.host.as_str(), &self.path)
    }

    /// `Host` header value for this request.
    pub fn host_header(&self) -> String {
        host_header(&self.host, self.port, self.tls)
    }

    fn has_pending_body(&self) -> bool {
        self.body.as_ref().map(|b| !b.is_finished()).unwrap_or(false)
    }

    /// Fill in body, cookie and host headers, then render the request head
    /// (request line, headers, blank line).
    pub fn compose_head(&mut self) -> Vec<u8> {
        if let Some(body) = self.body.as_ref().filter(|b| !b.is_finished()) {
            if let Some(content_type) = body.content_type() {
                self.headers.set("Content-Type", content_type);
            }
            if body.has_length() {
                self.headers.set("Content-Length", body.length().to_string());
            }
        }
        if self.options.cookies_enabled {
            if let Some(store) = &self.cookies {
                let header = store
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .cookie_header(&self.host, &self.path, self.tls);
                if !header.is_empty() {
                    self.headers.set("Cookie", header);
                }
            }
        }
        if !self.headers.contains("Host") {
            let host = self.host_header();
            self.headers.set("Host", host);
        }
        let mut head = format!("{} {} HTTP/1.1\r\n", self.method.as_str(), self.path);
        for (name, value) in self.headers.iter() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Connect, transmit, and return the response. Socket errors propagate unchanged.
    pub fn send(mut self) -> Result<Response> {
        let has_body = self.has_pending_body();
        let head = self.compose_head();
        log::debug!(
            "[http] {} {} -> {}:{}{}",
            self.method,
            self.path,
            self.host,
            self.port,
            if self.tls { " (tls)" } else { "" }
        );

        let mut socket = Socket::new(self.host.as_str(), self.port, self.tls);
        socket.set_connect_timeout(self.options.connect_timeout);
        socket.set_io_timeout(self.options.io_timeout);
        socket.connect()?;
        socket.send(&head)?;

        if has_body {
            if let Some(body) = self.body.as_mut() {
                let mut buf = [0u8; BODY_PIECE_SIZE];
                let mut sent = 0usize;
                while !body.is_finished() {
                    let n = body.pull_data(&mut buf);
                    if n == 0 {
                        log::warn!("[http] body producer stalled before finishing; stopping");
                        break;
                    }
                    socket.send(&buf[..n])?;
                    sent += n;
                }
                socket.send(b"\r\n")?;
                log::trace!("[http] sent {} body bytes", sent);
            }
        }

        let store = if self.options.cookies_enabled {
            self.cookies.clone()
        } else {
            None
        };
        Ok(Response::new(socket, self.origin(), self.method, store))
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .field("has_cookie_store", &self.cookies.is_some())
            .finish()
    }
}
