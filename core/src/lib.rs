/*
 * lib.rs
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

//! Corriere core: blocking HTTP/1.1 client transport.
//!
//! - `protocol::http`: socket, request, lazily parsed response, body producers, cookie jar.
//! - `net`: shared rustls client configuration (initialized once per process).
//! - `uri`: URL splitting and form/URI component coding.
//! - `config`: client options and default on-disk locations.

pub mod config;
pub mod net;
pub mod protocol;
pub mod uri;

pub use protocol::http::{HttpClient, HttpError, Request, Response};
