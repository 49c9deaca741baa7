/*
 * parser.rs
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

//! HTTP/1.1 response line grammar: status line, header lines, chunk-size lines, and the
//! header values that select body framing and content coding.

use crate::protocol::http::error::{HttpError, Result};

/// Progress of a response through its head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    Unparsed,
    StatusParsed,
    HeadersParsed,
}

/// Body framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Identity,
    Chunked,
}

/// Content coding applied to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    None,
    Gzip,
    Deflate,
}

/// Parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    pub reason: String,
}

/// Find CRLF in buf; return the index of the CR, or None if not found.
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// `HTTP/1.1 200 OK`. The reason may contain spaces; the version must be HTTP/1.1.
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let parts: Vec<&str> = line.splitn(3, ' ').collect();
    if parts.len() < 3 {
        return Err(HttpError::protocol(format!("invalid status line: {:?}", line)));
    }
    if !parts[0].eq_ignore_ascii_case("HTTP/1.1") {
        return Err(HttpError::protocol(format!(
            "unsupported HTTP version: {:?}",
            parts[0]
        )));
    }
    let code = parts[1]
        .parse::<u16>()
        .map_err(|_| HttpError::protocol(format!("invalid status code: {:?}", parts[1])))?;
    Ok(StatusLine {
        code,
        reason: parts[2].to_string(),
    })
}

/// `Name: value`, split at the first `": "`. Name and value are returned verbatim.
pub fn parse_header_line(line: &str) -> Result<(&str, &str)> {
    line.split_once(": ")
        .ok_or_else(|| HttpError::protocol(format!("invalid header line: {:?}", line)))
}

/// Hex chunk size, ignoring any `;ext` suffix.
pub fn parse_chunk_size(line: &str) -> Result<usize> {
    let hex_part = line.split(';').next().unwrap_or(line).trim();
    usize::from_str_radix(hex_part, 16)
        .map_err(|_| HttpError::protocol(format!("invalid chunk size: {:?}", line)))
}

/// Every comma-separated token must be `chunked`.
pub fn parse_transfer_encoding(value: &str) -> Result<TransferMode> {
    for token in value.split(',') {
        let token = token.trim();
        if !token.eq_ignore_ascii_case("chunked") {
            return Err(HttpError::protocol(format!(
                "unsupported transfer-encoding: {:?}",
                token
            )));
        }
    }
    Ok(TransferMode::Chunked)
}

pub fn parse_content_encoding(value: &str) -> Result<ContentCoding> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("gzip") {
        Ok(ContentCoding::Gzip)
    } else if value.eq_ignore_ascii_case("deflate") {
        Ok(ContentCoding::Deflate)
    } else {
        Err(HttpError::protocol(format!(
            "unsupported content-encoding: {:?}",
            value
        )))
    }
}
