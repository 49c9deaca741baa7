/*
 * response.rs
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

//! HTTP/1.1 response: lazily parsed status line and headers, then a pull-based body reader.
//!
//! Nothing is read from the socket until the caller asks for the status, the headers or
//! body data. Body framing (chunked or identity) and content coding (gzip, deflate) are
//! fixed when the headers are parsed, before the first body byte is returned.

use bytes::{Buf, Bytes, BytesMut};

use crate::protocol::http::cookie::{CookieOrigin, SharedCookieStore};
use crate::protocol::http::decode::ContentDecoder;
use crate::protocol::http::error::{HttpError, Result};
use crate::protocol::http::h1::{
    find_crlf, parse_chunk_size, parse_content_encoding, parse_header_line, parse_status_line,
    parse_transfer_encoding, ContentCoding, ParseState, TransferMode,
};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::request::Method;
use crate::protocol::http::socket::Socket;

/// Block size for reads that feed the line reader.
const LINE_BLOCK_SIZE: usize = 1024;
/// Upper bound for a single read while collecting chunk data.
const DATA_BLOCK_SIZE: usize = 16 * 1024;

/// Response bound to the socket its request was sent on.
pub struct Response {
    socket: Socket,
    origin: CookieOrigin,
    method: Method,
    cookies: Option<SharedCookieStore>,

    state: ParseState,
    code: u16,
    reason: String,
    headers: HeaderMap,

    transfer: TransferMode,
    coding: ContentCoding,
    decoder: Option<ContentDecoder>,
    /// Identity body bytes still expected when Content-Length was given.
    remaining: Option<u64>,

    /// Body end-of-stream (what the caller sees).
    eof: bool,
    /// The socket returned end-of-stream.
    socket_eof: bool,
    /// Bytes received but not consumed yet.
    buf: BytesMut,
}

impl Response {
    pub fn new(
        socket: Socket,
        origin: CookieOrigin,
        method: Method,
        cookies: Option<SharedCookieStore>,
    ) -> Self {
        Self {
            socket,
            origin,
            method,
            cookies,
            state: ParseState::Unparsed,
            code: 0,
            reason: String::new(),
            headers: HeaderMap::new(),
            transfer: TransferMode::Identity,
            coding: ContentCoding::None,
            decoder: None,
            remaining: None,
            eof: false,
            socket_eof: false,
            buf: BytesMut::with_capacity(LINE_BLOCK_SIZE * 4),
        }
    }

    /// Host and path of the originating request.
    pub fn origin(&self) -> &CookieOrigin {
        &self.origin
    }

    pub fn parse_state(&self) -> ParseState {
        self.state
    }

    /// Status code; reads the status line if needed.
    pub fn status(&mut self) -> Result<u16> {
        self.parse_status()?;
        Ok(self.code)
    }

    pub fn reason(&mut self) -> Result<&str> {
        self.parse_status()?;
        Ok(&self.reason)
    }

    /// All headers; reads the head if needed.
    pub fn headers(&mut self) -> Result<&HeaderMap> {
        self.parse_headers()?;
        Ok(&self.headers)
    }

    pub fn header(&mut self, name: &str) -> Result<Option<&str>> {
        self.parse_headers()?;
        Ok(self.headers.get(name))
    }

    pub fn transfer_mode(&mut self) -> Result<TransferMode> {
        self.parse_headers()?;
        Ok(self.transfer)
    }

    pub fn content_coding(&mut self) -> Result<ContentCoding> {
        self.parse_headers()?;
        Ok(self.coding)
    }

    /// True once the body has been read to its end.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Close the underlying socket. Later reads fail with a transport error unless the body
    /// was already complete.
    pub fn close(&mut self) -> Result<()> {
        self.socket.close()?;
        Ok(())
    }

    /// Receive up to `max` bytes into the pending buffer. Returns 0 at end of stream.
    fn fill(&mut self, max: usize) -> Result<usize> {
        if self.socket_eof {
            return Ok(0);
        }
        let start = self.buf.len();
        self.buf.resize(start + max, 0);
        let n = match self.socket.recv(&mut self.buf[start..]) {
            Ok(n) => n,
            Err(e) => {
                self.buf.truncate(start);
                return Err(e.into());
            }
        };
        self.buf.truncate(start + n);
        if n == 0 {
            self.socket_eof = true;
        }
        Ok(n)
    }

    /// Next CRLF-terminated line without the CRLF. At end of stream, whatever is buffered.
    fn read_line(&mut self) -> Result<String> {
        let mut searched = 0;
        loop {
            if let Some(i) = find_crlf(&self.buf[searched..]) {
                let line = self.buf.split_to(searched + i);
                self.buf.advance(2);
                return line_to_string(line);
            }
            // A CR at the end may pair with an LF from the next block.
            searched = self.buf.len().saturating_sub(1);
            if self.fill(LINE_BLOCK_SIZE)? == 0 {
                let line = self.buf.split();
                return line_to_string(line);
            }
        }
    }

    fn parse_status(&mut self) -> Result<()> {
        if self.state >= ParseState::StatusParsed {
            return Ok(());
        }
        let line = self.read_line()?;
        let status = parse_status_line(&line)?;
        log::debug!(
            "[http] {} {}{} -> {} {}",
            self.method,
            self.origin.host,
            self.origin.path,
            status.code,
            status.reason
        );
        self.code = status.code;
        self.reason = status.reason;
        self.state = ParseState::StatusParsed;
        Ok(())
    }

    fn parse_headers(&mut self) -> Result<()> {
        if self.state >= ParseState::HeadersParsed {
            return Ok(());
        }
        self.parse_status()?;
        let mut content_length: Option<u64> = None;
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                break;
            }
            let (name, value) = parse_header_line(&line)?;
            if name.eq_ignore_ascii_case("transfer-encoding") {
                self.transfer = parse_transfer_encoding(value)?;
            } else if name.eq_ignore_ascii_case("content-encoding") {
                self.coding = parse_content_encoding(value)?;
                self.decoder = ContentDecoder::for_coding(self.coding);
            } else if name.eq_ignore_ascii_case("content-length") {
                let n = value.trim().parse::<u64>().map_err(|_| {
                    HttpError::protocol(format!("invalid content-length: {:?}", value))
                })?;
                content_length = Some(n);
            } else if name.eq_ignore_ascii_case("set-cookie") {
                self.store_cookie(value);
            }
            self.headers.set(name, value);
        }
        self.state = ParseState::HeadersParsed;

        let bodyless = self.method == Method::Head
            || (100..200).contains(&self.code)
            || self.code == 204
            || self.code == 304;
        if bodyless {
            self.eof = true;
        } else if self.transfer == TransferMode::Identity {
            self.remaining = content_length;
            if content_length == Some(0) {
                self.eof = true;
            }
        }
        Ok(())
    }

    /// Hand one Set-Cookie value to the cookie store. A malformed value only loses that cookie.
    fn store_cookie(&self, value: &str) {
        let Some(store) = &self.cookies else {
            return;
        };
        let result = store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .handle_set_cookie(&self.origin, value);
        if let Err(e) = result {
            log::warn!("[http] ignoring Set-Cookie from {}: {}", self.origin.host, e);
        }
    }

    /// Next piece of the body. An empty result together with `is_eof()` marks the end;
    /// a decoder may also legitimately produce an empty piece mid-stream.
    pub fn read(&mut self) -> Result<Bytes> {
        self.parse_headers()?;
        if self.eof {
            return Ok(Bytes::new());
        }
        let raw = match self.transfer {
            TransferMode::Chunked => self.read_chunk()?,
            TransferMode::Identity => self.read_identity()?,
        };
        log::trace!("[http] body piece of {} raw bytes", raw.len());
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(raw);
        };
        let mut decoded = if raw.is_empty() {
            Vec::new()
        } else {
            decoder.decode(&raw)?
        };
        if self.eof {
            decoded.extend(decoder.finish()?);
            self.decoder = None;
        }
        Ok(Bytes::from(decoded))
    }

    /// Read the body to its end.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let piece = self.read()?;
            out.extend_from_slice(&piece);
            if self.eof {
                return Ok(out);
            }
        }
    }

    fn read_chunk(&mut self) -> Result<Bytes> {
        let line = self.read_line()?;
        let size = parse_chunk_size(&line)?;
        if size == 0 {
            self.eof = true;
            // Trailer section ends with an empty line (or the end of the stream).
            loop {
                let trailer = self.read_line()?;
                if trailer.is_empty() {
                    break;
                }
                log::trace!("[http] ignoring trailer {:?}", trailer);
            }
            return Ok(Bytes::new());
        }
        let framed = size
            .checked_add(2)
            .ok_or_else(|| HttpError::protocol(format!("chunk size too large: {:#x}", size)))?;
        while self.buf.len() < framed {
            let want = (framed - self.buf.len()).min(DATA_BLOCK_SIZE);
            if self.fill(want)? == 0 {
                break;
            }
        }
        if self.buf.len() < size {
            return Err(HttpError::protocol("chunk size != data length"));
        }
        let data = self.buf.split_to(size).freeze();
        if !self.buf.starts_with(b"\r\n") {
            return Err(HttpError::protocol("chunk size != data length"));
        }
        self.buf.advance(2);
        Ok(data)
    }

    fn read_identity(&mut self) -> Result<Bytes> {
        if self.buf.is_empty() && self.fill(LINE_BLOCK_SIZE)? == 0 {
            if let Some(left) = self.remaining.filter(|n| *n > 0) {
                log::debug!("[http] connection closed {} bytes before Content-Length", left);
            }
            self.eof = true;
            return Ok(Bytes::new());
        }
        let take = match self.remaining {
            Some(left) => (left.min(self.buf.len() as u64)) as usize,
            None => self.buf.len(),
        };
        let data = self.buf.split_to(take).freeze();
        if let Some(left) = self.remaining.as_mut() {
            *left -= take as u64;
            if *left == 0 {
                self.eof = true;
            }
        }
        Ok(data)
    }
}

fn line_to_string(line: BytesMut) -> Result<String> {
    String::from_utf8(line.to_vec())
        .map_err(|_| HttpError::protocol("response line is not valid UTF-8"))
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("state", &self.state)
            .field("code", &self.code)
            .field("reason", &self.reason)
            .field("transfer", &self.transfer)
            .field("coding", &self.coding)
            .field("eof", &self.eof)
            .field("socket", &self.socket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::cookie::{CookieJar, CookieStore};
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;
    use std::io::Write;
    use std::net::TcpListener;
    use std::sync::{mpsc, Arc, Mutex};
    use std::thread;

    /// Serve `raw` to the first connection in `piece`-sized writes, then close.
    fn serve(raw: Vec<u8>, piece: usize) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            for part in raw.chunks(piece.max(1)) {
                if conn.write_all(part).and_then(|_| conn.flush()).is_err() {
                    return;
                }
            }
        });
        port
    }

    fn response_for(raw: &[u8], piece: usize) -> Response {
        response_with(raw, piece, Method::Get, None)
    }

    fn response_with(
        raw: &[u8],
        piece: usize,
        method: Method,
        cookies: Option<SharedCookieStore>,
    ) -> Response {
        let port = serve(raw.to_vec(), piece);
        let mut socket = Socket::new("127.0.0.1", port, false);
        socket.connect().unwrap();
        Response::new(socket, CookieOrigin::new("example.com", "/login"), method, cookies)
    }

    fn chunked(body: &[u8], sizes: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for c in body.chunks(sizes) {
            out.extend_from_slice(format!("{:x}\r\n", c.len()).as_bytes());
            out.extend_from_slice(c);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"0\r\n\r\n");
        out
    }

    #[test]
    fn chunked_hello() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n0\r\n\r\n";
        let mut r = response_for(raw, raw.len());
        assert_eq!(r.status().unwrap(), 200);
        assert_eq!(r.reason().unwrap(), "OK");
        assert_eq!(r.read_all().unwrap(), b"Hello");
        assert!(r.is_eof());
        assert_eq!(r.read().unwrap(), Bytes::new());
    }

    #[test]
    fn lazy_stages() {
        let raw = b"HTTP/1.1 404 Not Found Here\r\nX-A: 1\r\n\r\nbody";
        let mut r = response_for(raw, 3);
        assert_eq!(r.parse_state(), ParseState::Unparsed);
        assert_eq!(r.header("x-a").unwrap(), Some("1"));
        assert_eq!(r.parse_state(), ParseState::HeadersParsed);
        assert_eq!(r.status().unwrap(), 404);
        assert_eq!(r.reason().unwrap(), "Not Found Here");
        assert_eq!(r.read_all().unwrap(), b"body");
    }

    #[test]
    fn garbage_status_line() {
        let mut r = response_for(b"GARBAGE\r\n\r\n", 64);
        assert!(r.status().unwrap_err().is_protocol());
    }

    #[test]
    fn chunk_size_mismatch() {
        let raw =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\na\r\n12345678\r\n0\r\n\r\n";
        let mut r = response_for(raw, raw.len());
        match r.read_all().unwrap_err() {
            HttpError::Protocol(m) => assert_eq!(m, "chunk size != data length"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn oversized_chunk_size_is_protocol_error() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
ffffffffffffffff\r\nabc\r\n0\r\n\r\n";
        let mut r = response_for(raw, raw.len());
        let err = r.read_all().unwrap_err();
        assert!(err.is_protocol(), "{:?}", err);
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
1ffffffffffffffff\r\nabc\r\n";
        let mut r = response_for(raw, raw.len());
        assert!(r.read_all().unwrap_err().is_protocol());
    }

    #[test]
    fn truncated_chunk_is_mismatch() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n10\r\nshort";
        let mut r = response_for(raw, raw.len());
        assert!(r.read_all().unwrap_err().is_protocol());
    }

    #[test]
    fn header_errors() {
        let mut r = response_for(b"HTTP/1.1 200 OK\r\nBroken\r\n\r\n", 64);
        assert!(r.headers().unwrap_err().is_protocol());
        let mut r = response_for(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip\r\n\r\n", 64);
        let err = r.read().unwrap_err();
        assert!(err.to_string().contains("unsupported transfer-encoding"));
        let mut r = response_for(b"HTTP/1.1 200 OK\r\nContent-Encoding: br\r\n\r\n", 64);
        assert!(r.read().unwrap_err().is_protocol());
    }

    #[test]
    fn chunked_across_odd_read_sizes() {
        let body: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
        raw.extend(chunked(&body, 777));
        for piece in [1usize, 2, 5, 1023, 4096] {
            let mut r = response_for(&raw, piece);
            assert_eq!(r.read_all().unwrap(), body, "piece size {}", piece);
        }
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(24))]
        #[test]
        fn chunk_and_read_boundaries_do_not_change_body(
            body in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..3000),
            chunk_size in 1usize..700,
            piece in 1usize..400,
        ) {
            let mut raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
            raw.extend(chunked(&body, chunk_size));
            let mut r = response_for(&raw, piece);
            proptest::prop_assert_eq!(r.read_all().unwrap(), body);
        }
    }

    #[test]
    fn gzip_chunked_body() {
        let body = b"compressed hello world ".repeat(500);
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&body).unwrap();
        let gz = enc.finish().unwrap();
        let mut raw =
            b"HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nTransfer-Encoding: chunked\r\n\r\n"
                .to_vec();
        raw.extend(chunked(&gz, 100));
        let mut r = response_for(&raw, 333);
        assert_eq!(r.content_coding().unwrap(), ContentCoding::Gzip);
        assert_eq!(r.transfer_mode().unwrap(), TransferMode::Chunked);
        assert_eq!(r.read_all().unwrap(), body);
    }

    fn gzip_response(body: &[u8], damage: impl Fn(&mut Vec<u8>)) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(body).unwrap();
        let mut gz = enc.finish().unwrap();
        damage(&mut gz);
        let mut raw = format!(
            "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n\r\n",
            gz.len()
        )
        .into_bytes();
        raw.extend(gz);
        raw
    }

    #[test]
    fn damaged_gzip_body_is_decode_error() {
        let body = b"checksummed body ".repeat(10);
        let flipped_crc = gzip_response(&body, |gz| {
            let at = gz.len() - 8;
            gz[at] ^= 0x80;
        });
        let mut r = response_for(&flipped_crc, 64);
        assert!(matches!(r.read_all(), Err(HttpError::Decode(_))));

        let no_trailer = gzip_response(&body, |gz| gz.truncate(gz.len() - 8));
        let mut r = response_for(&no_trailer, 64);
        assert!(matches!(r.read_all(), Err(HttpError::Decode(_))));

        let intact = gzip_response(&body, |_| {});
        let mut r = response_for(&intact, 64);
        assert_eq!(r.read_all().unwrap(), body);
    }

    #[test]
    fn deflate_identity_body() {
        let body = b"raw deflate body ".repeat(2000);
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(&body).unwrap();
        let deflated = enc.finish().unwrap();
        let mut raw = b"HTTP/1.1 200 OK\r\nContent-Encoding: deflate\r\n\r\n".to_vec();
        raw.extend(&deflated);
        let mut r = response_for(&raw, 512);
        assert_eq!(r.read_all().unwrap(), body);
    }

    #[test]
    fn content_length_ends_body_without_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
                .unwrap();
            // Hold the connection open until the client is done.
            let _ = done_rx.recv();
        });
        let mut socket = Socket::new("127.0.0.1", port, false);
        socket.connect().unwrap();
        let mut r = Response::new(socket, CookieOrigin::new("h", "/"), Method::Get, None);
        assert_eq!(r.read_all().unwrap(), b"hello");
        done_tx.send(()).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn head_and_no_content_have_no_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n";
        let mut r = response_with(raw, 64, Method::Head, None);
        assert_eq!(r.read_all().unwrap(), b"");
        let mut r = response_for(b"HTTP/1.1 204 No Content\r\n\r\n", 64);
        assert_eq!(r.read_all().unwrap(), b"");
        assert!(r.is_eof());
    }

    #[test]
    fn set_cookie_reaches_jar_and_bad_cookie_is_skipped() {
        let jar = Arc::new(Mutex::new(CookieJar::new()));
        let raw = b"HTTP/1.1 200 OK\r\nSet-Cookie: sid=abc123; Path=/; HttpOnly\r\n\
Set-Cookie: broken\r\nSet-Cookie: theme=dark\r\nContent-Length: 0\r\n\r\n";
        let mut r = response_with(raw, 16, Method::Get, Some(jar.clone()));
        assert_eq!(r.header("set-cookie").unwrap(), Some("theme=dark"));
        let jar = jar.lock().unwrap();
        let sid = jar.get("example.com", "sid", "/").unwrap();
        assert_eq!(sid.value, "abc123");
        assert!(sid.http_only);
        assert_eq!(sid.expires, 0);
        assert!(jar.get("example.com", "theme", "/login").is_some());
        assert_eq!(jar.cookie_header("example.com", "/login", false), "sid=abc123; theme=dark");
    }

    #[test]
    fn eof_mid_line_yields_partial_line() {
        let mut r = response_for(b"HTTP/1.1 200 OK\r\nX-Last: partial", 64);
        assert_eq!(r.header("X-Last").unwrap(), Some("partial"));
        assert_eq!(r.read_all().unwrap(), b"");
    }

    #[test]
    fn closed_response_socket_refuses_reads() {
        let raw = b"HTTP/1.1 200 OK\r\n\r\n";
        let mut r = response_for(raw, 64);
        r.close().unwrap();
        assert!(r.status().unwrap_err().is_transport());
    }
}
