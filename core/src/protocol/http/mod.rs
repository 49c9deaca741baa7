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

//! HTTP/1.1 client transport.
//!
//! - `Socket`: blocking TCP or TLS stream with explicit connect and close.
//! - `Request`: head composition plus a pull-based `BodyProducer`, sent on a fresh socket.
//! - `Response`: status line and headers parsed on first access, body read piece by piece
//!   with chunked framing and gzip/deflate decoding.
//! - `cookie`: jar shared between requests and responses, Netscape file persistence.

pub mod body;
pub mod client;
pub mod cookie;
pub mod decode;
pub mod error;
pub mod h1;
pub mod headers;
pub mod request;
pub mod response;
pub mod socket;

pub use body::{BodyProducer, FullBody, QueryData};
pub use client::HttpClient;
pub use cookie::{
    Cookie, CookieJar, CookieOrigin, CookieStore, NetscapeCookieJar, SharedCookieStore,
};
pub use error::{HttpError, Result, TransportError, TransportErrorKind};
pub use headers::HeaderMap;
pub use request::{Method, Request, UrlTarget};
pub use response::Response;
pub use socket::Socket;
