/*
 * socket.rs
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

//! Blocking byte-stream endpoint over plain TCP or TLS.
//!
//! A `Socket` starts unconnected. `connect` resolves, connects and (for TLS) handshakes;
//! calling it again is a no-op. `close` sends TLS close_notify then shuts the TCP stream
//! down; calling it again is a no-op. After close, `send`/`recv` fail with
//! `TransportErrorKind::Closed`. Dropping a socket closes it.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::net::{self, TlsStream};
use crate::protocol::http::error::{TransportError, TransportErrorKind};

/// Connected stream: plain TCP or TLS.
enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream>),
}

enum State {
    Unconnected,
    Connected(Stream),
    Closed,
}

/// Blocking socket to one host:port.
pub struct Socket {
    host: String,
    port: u16,
    tls: bool,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
    state: State,
}

impl Socket {
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            connect_timeout: None,
            io_timeout: None,
            state: State::Unconnected,
        }
    }

    /// Limit how long `connect` may wait per address. None blocks indefinitely.
    pub fn set_connect_timeout(&mut self, timeout: Option<Duration>) {
        self.connect_timeout = timeout;
    }

    /// Limit how long a single send or recv may block. None blocks indefinitely.
    pub fn set_io_timeout(&mut self, timeout: Option<Duration>) {
        self.io_timeout = timeout;
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

    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    pub fn connect(&mut self) -> Result<(), TransportError> {
        match self.state {
            State::Connected(_) => return Ok(()),
            State::Closed => {
                return Err(TransportError::new(
                    TransportErrorKind::Closed,
                    format!("{}:{}", self.host, self.port),
                ))
            }
            State::Unconnected => {}
        }
        let tcp = self.connect_tcp()?;
        if let Some(t) = self.io_timeout {
            tcp.set_read_timeout(Some(t))
                .and_then(|_| tcp.set_write_timeout(Some(t)))
                .map_err(|e| TransportError::from_io(TransportErrorKind::Connect, &e))?;
        }
        let stream = if self.tls {
            net::ensure_initialized();
            Stream::Tls(Box::new(net::connect_tls(&self.host, tcp)?))
        } else {
            Stream::Plain(tcp)
        };
        self.state = State::Connected(stream);
        Ok(())
    }

    fn connect_tcp(&self) -> Result<TcpStream, TransportError> {
        let addrs: Vec<_> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| TransportError::from_io(TransportErrorKind::Resolve, &e))?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::new(
                TransportErrorKind::Resolve,
                format!("no addresses for {}", self.host),
            ));
        }
        let mut last_err = None;
        for addr in &addrs {
            let attempt = match self.connect_timeout {
                Some(t) => TcpStream::connect_timeout(addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(tcp) => {
                    log::debug!("[http] connected to {}:{} ({})", self.host, self.port, addr);
                    return Ok(tcp);
                }
                Err(e) => {
                    log::debug!("[http] connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        let err = last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected));
        Err(TransportError::from_io(TransportErrorKind::Connect, &err))
    }

    fn stream(&mut self) -> Result<&mut Stream, TransportError> {
        match &mut self.state {
            State::Connected(s) => Ok(s),
            State::Unconnected => Err(TransportError::new(
                TransportErrorKind::NotConnected,
                format!("{}:{}", self.host, self.port),
            )),
            State::Closed => Err(TransportError::new(
                TransportErrorKind::Closed,
                format!("{}:{}", self.host, self.port),
            )),
        }
    }

    /// Write all of `data`. Short writes are retried; any other failure is fatal.
    pub fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let result = match self.stream()? {
            Stream::Plain(s) => s.write_all(data).and_then(|_| s.flush()),
            Stream::Tls(s) => s.write_all(data).and_then(|_| s.flush()),
        };
        result.map_err(|e| TransportError::from_io(TransportErrorKind::Io, &e))
    }

    /// Read up to `buf.len()` bytes. Returns 0 only at end of stream.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        loop {
            let result = match self.stream()? {
                Stream::Plain(s) => s.read(buf),
                Stream::Tls(s) => match s.read(buf) {
                    // Peer closed TCP without close_notify; many servers do this.
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
                    other => other,
                },
            };
            match result {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::from_io(TransportErrorKind::Io, &e)),
            }
        }
    }

    /// Read up to `max` bytes into a new vector.
    pub fn recv_vec(&mut self, max: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max];
        let n = self.recv(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// TLS shutdown (if TLS) then TCP shutdown. Idempotent.
    pub fn close(&mut self) -> Result<(), TransportError> {
        let stream = match std::mem::replace(&mut self.state, State::Closed) {
            State::Connected(s) => s,
            State::Unconnected | State::Closed => return Ok(()),
        };
        match stream {
            Stream::Tls(mut tls) => {
                tls.conn.send_close_notify();
                if let Err(e) = tls.flush() {
                    log::warn!("[http] TLS close_notify to {} failed: {}", self.host, e);
                }
                shutdown_tcp(&tls.sock)
            }
            Stream::Plain(tcp) => shutdown_tcp(&tcp),
        }
    }
}

fn shutdown_tcp(tcp: &TcpStream) -> Result<(), TransportError> {
    match tcp.shutdown(Shutdown::Both) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
        Err(e) => Err(TransportError::from_io(TransportErrorKind::Io, &e)),
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::debug!("[http] close on drop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Unconnected => "unconnected",
            State::Connected(_) => "connected",
            State::Closed => "closed",
        };
        f.debug_struct("Socket")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn echo_server() -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let n = conn.read(&mut buf).unwrap();
            conn.write_all(&buf[..n]).unwrap();
        });
        (port, handle)
    }

    #[test]
    fn send_recv_roundtrip() {
        let (port, server) = echo_server();
        let mut s = Socket::new("127.0.0.1", port, false);
        s.connect().unwrap();
        s.connect().unwrap(); // no-op
        s.send(b"ping").unwrap();
        let mut got = Vec::new();
        while got.len() < 4 {
            let chunk = s.recv_vec(16).unwrap();
            assert!(!chunk.is_empty());
            got.extend_from_slice(&chunk);
        }
        assert_eq!(got, b"ping");
        server.join().unwrap();
        assert_eq!(s.recv_vec(16).unwrap(), b"");
    }

    #[test]
    fn unconnected_socket_refuses_io() {
        let mut s = Socket::new("127.0.0.1", 9, false);
        let err = s.send(b"x").unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::NotConnected);
    }

    #[test]
    fn closed_socket_refuses_io_and_close_is_idempotent() {
        let (port, server) = echo_server();
        let mut s = Socket::new("127.0.0.1", port, false);
        s.connect().unwrap();
        s.close().unwrap();
        s.close().unwrap();
        assert!(s.is_closed());
        assert_eq!(s.send(b"x").unwrap_err().kind(), TransportErrorKind::Closed);
        let mut buf = [0u8; 4];
        assert_eq!(s.recv(&mut buf).unwrap_err().kind(), TransportErrorKind::Closed);
        assert_eq!(s.connect().unwrap_err().kind(), TransportErrorKind::Closed);
        drop(s);
        let _ = server.join();
    }

    #[test]
    fn resolution_failure_is_distinct() {
        let mut s = Socket::new("no-such-host.invalid", 80, false);
        let err = s.connect().unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Resolve);
    }

    #[test]
    fn refused_connection_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let mut s = Socket::new("127.0.0.1", port, false);
        let err = s.connect().unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Connect);
        assert!(err.code().is_some());
    }
}
