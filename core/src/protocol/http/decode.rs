/*
 * decode.rs
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

//! Incremental body decoding for `Content-Encoding: gzip` and `deflate`.
//!
//! Deflate is the raw (headerless) stream, inflated through a fixed 10 KiB output buffer.
//! Gzip is the wrapped stream: header and trailer are handled by flate2's gzip writer.

use std::io::Write;

use flate2::write::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};

use crate::protocol::http::error::{HttpError, Result};
use crate::protocol::http::h1::ContentCoding;

const OUTPUT_BUF_SIZE: usize = 10 * 1024;

pub enum ContentDecoder {
    Gzip(GzDecoder<Vec<u8>>),
    Deflate { inflater: Decompress, finished: bool },
}

impl ContentDecoder {
    /// Decoder for the coding, or None for `ContentCoding::None`.
    pub fn for_coding(coding: ContentCoding) -> Option<Self> {
        match coding {
            ContentCoding::None => None,
            ContentCoding::Gzip => Some(ContentDecoder::Gzip(GzDecoder::new(Vec::new()))),
            ContentCoding::Deflate => Some(ContentDecoder::Deflate {
                inflater: Decompress::new(false),
                finished: false,
            }),
        }
    }

    /// Feed one piece of encoded body and return whatever output it produced.
    pub fn decode(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            ContentDecoder::Gzip(gz) => {
                gz.write_all(input)
                    .and_then(|_| gz.flush())
                    .map_err(|e| HttpError::decode(format!("gzip: {}", e)))?;
                Ok(std::mem::take(gz.get_mut()))
            }
            ContentDecoder::Deflate { inflater, finished } => {
                inflate_raw(inflater, finished, input)
            }
        }
    }

    /// Called once the body has ended. For gzip this checks the CRC32/ISIZE trailer, so a
    /// truncated or corrupted stream is a decode error. Returns any output still held back.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        match self {
            ContentDecoder::Gzip(gz) => {
                gz.try_finish()
                    .map_err(|e| HttpError::decode(format!("gzip: {}", e)))?;
                Ok(std::mem::take(gz.get_mut()))
            }
            ContentDecoder::Deflate { .. } => Ok(Vec::new()),
        }
    }
}

fn inflate_raw(
    inflater: &mut Decompress,
    finished: &mut bool,
    mut input: &[u8],
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if *finished {
        return Ok(out);
    }
    let mut buf = vec![0u8; OUTPUT_BUF_SIZE];
    loop {
        let in_before = inflater.total_in();
        let out_before = inflater.total_out();
        let status = inflater
            .decompress(input, &mut buf, FlushDecompress::None)
            .map_err(|e| {
                if e.needs_dictionary().is_some() {
                    HttpError::decode("deflate: stream needs a preset dictionary")
                } else {
                    HttpError::decode(format!("deflate: {}", e))
                }
            })?;
        let consumed = (inflater.total_in() - in_before) as usize;
        let produced = (inflater.total_out() - out_before) as usize;
        input = &input[consumed..];
        out.extend_from_slice(&buf[..produced]);
        match status {
            Status::StreamEnd => {
                *finished = true;
                break;
            }
            // Output buffer not filled: nothing more pending for this input.
            _ if produced < buf.len() => break,
            Status::BufError if consumed == 0 => break,
            _ => {}
        }
    }
    Ok(out)
}

impl std::fmt::Debug for ContentDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentDecoder::Gzip(_) => f.write_str("ContentDecoder::Gzip"),
            ContentDecoder::Deflate { finished, .. } => f
                .debug_struct("ContentDecoder::Deflate")
                .field("finished", finished)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;

    fn sample() -> Vec<u8> {
        (0..50_000u32)
            .flat_map(|i| format!("line {} of the body\n", i % 97).into_bytes())
            .collect()
    }

    fn decode_in_pieces(mut d: ContentDecoder, encoded: &[u8], piece: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in encoded.chunks(piece) {
            out.extend(d.decode(chunk).unwrap());
        }
        out.extend(d.finish().unwrap());
        out
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// Feed all of `encoded` then finish, returning the first error.
    fn gzip_outcome(encoded: &[u8]) -> Result<Vec<u8>> {
        let mut d = ContentDecoder::for_coding(ContentCoding::Gzip).unwrap();
        let mut out = d.decode(encoded)?;
        out.extend(d.finish()?);
        Ok(out)
    }

    #[test]
    fn gzip_roundtrip_across_pieces() {
        let data = sample();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&data).unwrap();
        let encoded = enc.finish().unwrap();
        for piece in [1usize, 7, 1024, encoded.len()] {
            let d = ContentDecoder::for_coding(ContentCoding::Gzip).unwrap();
            assert_eq!(decode_in_pieces(d, &encoded, piece), data);
        }
    }

    #[test]
    fn raw_deflate_roundtrip_larger_than_output_buffer() {
        let data = sample();
        assert!(data.len() > OUTPUT_BUF_SIZE * 4);
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&data).unwrap();
        let encoded = enc.finish().unwrap();
        for piece in [3usize, 512, encoded.len()] {
            let d = ContentDecoder::for_coding(ContentCoding::Deflate).unwrap();
            assert_eq!(decode_in_pieces(d, &encoded, piece), data);
        }
    }

    #[test]
    fn corrupt_deflate_is_decode_error() {
        let mut d = ContentDecoder::for_coding(ContentCoding::Deflate).unwrap();
        let err = d.decode(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, HttpError::Decode(_)));
    }

    #[test]
    fn corrupt_gzip_is_decode_error() {
        let mut d = ContentDecoder::for_coding(ContentCoding::Gzip).unwrap();
        let err = d.decode(b"this is not gzip at all").unwrap_err();
        assert!(matches!(err, HttpError::Decode(_)));
    }

    #[test]
    fn gzip_checksum_mismatch_is_decode_error() {
        let mut encoded = gzip(&sample()[..4000]);
        // CRC32 is the first half of the 8-byte trailer.
        let crc_at = encoded.len() - 8;
        encoded[crc_at] ^= 0x01;
        let err = gzip_outcome(&encoded).unwrap_err();
        assert!(matches!(err, HttpError::Decode(_)), "{:?}", err);
    }

    #[test]
    fn truncated_gzip_is_decode_error() {
        let encoded = gzip(&sample()[..4000]);
        let without_trailer = &encoded[..encoded.len() - 8];
        assert!(matches!(gzip_outcome(without_trailer), Err(HttpError::Decode(_))));
        let half = &encoded[..encoded.len() / 2];
        assert!(matches!(gzip_outcome(half), Err(HttpError::Decode(_))));
        assert_eq!(gzip_outcome(&encoded).unwrap(), &sample()[..4000]);
    }

    #[test]
    fn no_decoder_for_identity() {
        assert!(ContentDecoder::for_coding(ContentCoding::None).is_none());
    }
}
