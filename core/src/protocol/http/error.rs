/*
 * error.rs
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

//! HTTP client errors: transport, protocol, decode, cookie.

use std::fmt;
use std::io;

/// What part of the transport failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Host name could not be resolved to any address.
    Resolve,
    /// TCP connect failed for every resolved address.
    Connect,
    /// TLS setup or handshake failed.
    Tls,
    /// Read or write on an established stream failed.
    Io,
    /// Socket was used before `connect()`.
    NotConnected,
    /// Socket was used after `close()`.
    Closed,
}

/// Socket or TLS failure. Carries the OS error code when there is one.
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    code: Option<i32>,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Wrap an `io::Error`, keeping its raw OS code.
    pub fn from_io(kind: TransportErrorKind, err: &io::Error) -> Self {
        Self {
            kind,
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            TransportErrorKind::Resolve => "address resolution failed",
            TransportErrorKind::Connect => "connect failed",
            TransportErrorKind::Tls => "TLS failure",
            TransportErrorKind::Io => "socket I/O failed",
            TransportErrorKind::NotConnected => "socket not connected",
            TransportErrorKind::Closed => "socket closed",
        };
        match self.code {
            Some(code) => write!(f, "{} (os error {}): {}", what, code, self.message),
            None => write!(f, "{}: {}", what, self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors from sending a request or reading its response.
#[derive(Debug)]
pub enum HttpError {
    /// Socket/TLS failure. Never retried.
    Transport(TransportError),
    /// Malformed or unsupported wire data.
    Protocol(String),
    /// Content decoding (gzip/deflate) failed.
    Decode(String),
    /// Malformed Set-Cookie header or cookie file record.
    CookieParse(String),
    /// Cookie file could not be read or written.
    Io(io::Error),
    /// URL could not be turned into a request target.
    InvalidUrl(String),
}

impl HttpError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn cookie(msg: impl Into<String>) -> Self {
        Self::CookieParse(msg.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, HttpError::Protocol(_))
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Transport(e) => write!(f, "{}", e),
            HttpError::Protocol(m) => write!(f, "protocol error: {}", m),
            HttpError::Decode(m) => write!(f, "decode error: {}", m),
            HttpError::CookieParse(m) => write!(f, "cookie parse error: {}", m),
            HttpError::Io(e) => write!(f, "cookie file: {}", e),
            HttpError::InvalidUrl(u) => write!(f, "invalid URL: {}", u),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Transport(e) => Some(e),
            HttpError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for HttpError {
    fn from(e: TransportError) -> Self {
        HttpError::Transport(e)
    }
}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        HttpError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_os_code() {
        let io_err = io::Error::from_raw_os_error(111);
        let e = TransportError::from_io(TransportErrorKind::Connect, &io_err);
        assert_eq!(e.kind(), TransportErrorKind::Connect);
        assert_eq!(e.code(), Some(111));
        assert!(e.to_string().contains("os error 111"));
    }

    #[test]
    fn kinds_are_distinguishable() {
        let t: HttpError = TransportError::new(TransportErrorKind::Closed, "x").into();
        assert!(t.is_transport());
        assert!(!t.is_protocol());
        let p = HttpError::protocol("bad status line");
        assert!(p.is_protocol());
        assert_eq!(p.to_string(), "protocol error: bad status line");
        assert!(matches!(HttpError::decode("x"), HttpError::Decode(_)));
    }
}
