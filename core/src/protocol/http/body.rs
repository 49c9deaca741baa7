/*
 * body.rs
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

//! Request body producers: pull-based sources of request body bytes.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use bytes::Bytes;

use crate::uri::{decode_uri_component, encode_uri_component};

/// Source of request body bytes, pulled by `Request::send` until finished.
///
/// When `has_length` is true, `length` must equal the total number of bytes `pull_data`
/// will ever yield; the request then carries a `Content-Length` header.
pub trait BodyProducer {
    /// Copy up to `buf.len()` bytes into `buf`; return how many were written.
    fn pull_data(&mut self, buf: &mut [u8]) -> usize;

    fn is_finished(&self) -> bool;

    fn has_length(&self) -> bool;

    fn length(&self) -> usize;

    /// Value for the `Content-Type` header, if the producer knows it.
    fn content_type(&self) -> Option<&str> {
        None
    }
}

/// Copy from `data[*pos..]` into `buf`, advancing `pos`.
fn copy_from(data: &[u8], pos: &mut usize, buf: &mut [u8]) -> usize {
    let rest = data.get(*pos..).unwrap_or_default();
    let n = buf.len().min(rest.len());
    buf[..n].copy_from_slice(&rest[..n]);
    *pos += n;
    n
}

/// In-memory body with an optional content type.
#[derive(Debug, Clone)]
pub struct FullBody {
    data: Bytes,
    pos: usize,
    content_type: Option<String>,
}

impl FullBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            content_type: None,
        }
    }

    pub fn with_content_type(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Self::new(data)
        }
    }
}

impl BodyProducer for FullBody {
    fn pull_data(&mut self, buf: &mut [u8]) -> usize {
        copy_from(&self.data, &mut self.pos, buf)
    }

    fn is_finished(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn has_length(&self) -> bool {
        true
    }

    fn length(&self) -> usize {
        self.data.len()
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// `application/x-www-form-urlencoded` body. Keys are kept sorted; a key may carry several
/// values, emitted in insertion order. The encoded form is rendered on first use.
#[derive(Debug, Clone, Default)]
pub struct QueryData {
    data: BTreeMap<String, Vec<String>>,
    rendered: OnceCell<Bytes>,
    pos: usize,
}

impl QueryData {
    pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2&a=3`. A pair without `=` gets an empty value.
    pub fn parse(query: &str) -> Self {
        let mut q = Self::new();
        for item in query.split('&').filter(|s| !s.is_empty()) {
            let (k, v) = item.split_once('=').unwrap_or((item, ""));
            q.append(decode_uri_component(k), decode_uri_component(v));
        }
        q
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.entry(key.into()).or_default().push(value.into());
        self.invalidate();
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), vec![value.into()]);
        self.invalidate();
    }

    /// Drop the rendered form; the next pull starts again from the first byte.
    fn invalidate(&mut self) {
        self.rendered = OnceCell::new();
        self.pos = 0;
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.data.get(key).map(|v| v.as_slice())
    }

    pub fn to_query(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.data {
            for value in values {
                if !out.is_empty() {
                    out.push('&');
                }
                out.push_str(&encode_uri_component(key));
                out.push('=');
                out.push_str(&encode_uri_component(value));
            }
        }
        out
    }

    fn rendered(&self) -> &Bytes {
        self.rendered.get_or_init(|| Bytes::from(self.to_query()))
    }
}

impl BodyProducer for QueryData {
    fn pull_data(&mut self, buf: &mut [u8]) -> usize {
        let data = self.rendered().clone();
        copy_from(&data, &mut self.pos, buf)
    }

    fn is_finished(&self) -> bool {
        self.pos >= self.rendered().len()
    }

    fn has_length(&self) -> bool {
        true
    }

    fn length(&self) -> usize {
        self.rendered().len()
    }

    fn content_type(&self) -> Option<&str> {
        Some(Self::CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(p: &mut dyn BodyProducer, piece: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; piece];
        while !p.is_finished() {
            let n = p.pull_data(&mut buf);
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn full_body_yields_declared_length() {
        let mut b = FullBody::with_content_type(&b"{\"a\":1}"[..], "application/json");
        assert_eq!(b.length(), 7);
        assert_eq!(b.content_type(), Some("application/json"));
        assert_eq!(drain(&mut b, 3), b"{\"a\":1}");
        assert!(b.is_finished());
    }

    #[test]
    fn empty_full_body_is_finished() {
        let b = FullBody::new(Vec::<u8>::new());
        assert!(b.is_finished());
        assert_eq!(b.content_type(), None);
    }

    #[test]
    fn query_data_encodes_sorted_multi_values() {
        let mut q = QueryData::new();
        q.append("q", "rust lang");
        q.append("a", "1");
        q.append("q", "x&y");
        assert_eq!(q.to_query(), "a=1&q=rust+lang&q=x%26y");
        q.set("q", "z");
        assert_eq!(q.to_query(), "a=1&q=z");
        assert_eq!(q.length(), "a=1&q=z".len());
        assert_eq!(drain(&mut q, 2), b"a=1&q=z");
        assert_eq!(q.content_type(), Some(QueryData::CONTENT_TYPE));
    }

    #[test]
    fn query_data_changed_mid_pull_restarts() {
        let mut q = QueryData::new();
        q.append("key", "v".repeat(64));
        let mut buf = [0u8; 16];
        assert_eq!(q.pull_data(&mut buf), 16);
        q.set("key", "x");
        assert_eq!(q.length(), 5);
        assert_eq!(drain(&mut q, 16), b"key=x");
        q.append("more", "y");
        assert_eq!(drain(&mut q, 3), b"key=x&more=y");
    }

    #[test]
    fn query_data_parse_decodes() {
        let q = QueryData::parse("name=J%C3%BCrgen+K&flag&x=1&x=2");
        assert_eq!(q.get("name").unwrap(), &["Jürgen K".to_string()]);
        assert_eq!(q.get("flag").unwrap(), &[String::new()]);
        assert_eq!(q.get("x").unwrap().len(), 2);
    }
}
