/*
 * net.rs
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

//! TLS helpers: shared rustls client configuration and the blocking client handshake.
//!
//! The configuration is built once per process by `ensure_initialized`; every TLS socket
//! shares it. Roots come from the platform store, with webpki-roots as fallback.

use std::net::TcpStream;
use std::sync::{Arc, OnceLock};

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::protocol::http::error::{TransportError, TransportErrorKind};

/// Blocking TLS stream over a TCP socket.
pub type TlsStream = StreamOwned<ClientConnection, TcpStream>;

static CLIENT_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            for cert in certs {
                let _ = root_store.add(cert);
            }
        }
        Err(e) => log::debug!("[net] native root certificates unavailable: {}", e),
    }
    if root_store.is_empty() {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    root_store
}

/// TLS client config for HTTP/1.1 (ALPN `http/1.1`, no client auth).
fn http1_client_config() -> Arc<ClientConfig> {
    let mut config = ClientConfig::builder()
        .with_root_certificates(build_root_store())
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Arc::new(config)
}

/// Process-wide one-time setup for TLS. Safe to call any number of times; only the first
/// call does work.
pub fn ensure_initialized() {
    CLIENT_CONFIG.get_or_init(|| {
        log::debug!("[net] initializing TLS client configuration");
        http1_client_config()
    });
}

/// True once `ensure_initialized` has run.
pub fn is_initialized() -> bool {
    CLIENT_CONFIG.get().is_some()
}

fn client_config() -> Arc<ClientConfig> {
    ensure_initialized();
    CLIENT_CONFIG.get_or_init(http1_client_config).clone()
}

/// Wrap a connected TCP stream in TLS and run the handshake to completion.
/// Server Name Indication is set to `host`.
pub fn connect_tls(host: &str, tcp: TcpStream) -> Result<TlsStream, TransportError> {
    let server_name = ServerName::try_from(host.to_string()).map_err(|_| {
        TransportError::new(TransportErrorKind::Tls, format!("invalid host name: {}", host))
    })?;
    let conn = ClientConnection::new(client_config(), server_name)
        .map_err(|e| TransportError::new(TransportErrorKind::Tls, e.to_string()))?;
    let mut tls = StreamOwned::new(conn, tcp);
    while tls.conn.is_handshaking() {
        tls.conn
            .complete_io(&mut tls.sock)
            .map_err(|e| TransportError::from_io(TransportErrorKind::Tls, &e))?;
    }
    log::debug!(
        "[net] TLS handshake with {} complete ({:?})",
        host,
        tls.conn.protocol_version()
    );
    Ok(tls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_is_idempotent() {
        ensure_initialized();
        assert!(is_initialized());
        let a = client_config();
        ensure_initialized();
        let b = client_config();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
