//! Incremental access to a response body.
//!
//! [`BodyReader`] hands out the body in caller-sized pieces so that only as
//! much is downloaded as the title search needs. Compressed bodies are
//! decoded from the wire bytes received so far, which lets a partial gzip
//! stream be searched before the rest arrives.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

/// Content-Encoding of a body that has to be decoded before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Deflate,
}

impl ContentEncoding {
    /// Parses a Content-Encoding header value. Unknown encodings are read as-is.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("gzip") | Some("x-gzip") => ContentEncoding::Gzip,
            Some("deflate") => ContentEncoding::Deflate,
            _ => ContentEncoding::Identity,
        }
    }

    /// Decodes as much of a possibly truncated wire buffer as is complete.
    pub fn decode_partial(&self, wire: &[u8]) -> Vec<u8> {
        let mut decoded = Vec::new();
        // A truncated stream ends in an error after everything decodable was appended.
        let result = match self {
            ContentEncoding::Identity => return wire.to_vec(),
            ContentEncoding::Gzip => GzDecoder::new(wire).read_to_end(&mut decoded),
            ContentEncoding::Deflate if looks_like_zlib(wire) => ZlibDecoder::new(wire).read_to_end(&mut decoded),
            ContentEncoding::Deflate => DeflateDecoder::new(wire).read_to_end(&mut decoded),
        };
        if let Err(e) = result {
            tracing::trace!("Decoded {} of {} wire bytes before: {}", decoded.len(), wire.len(), e);
        }
        decoded
    }
}

/// Servers disagree on whether `deflate` means zlib-wrapped or raw.
fn looks_like_zlib(wire: &[u8]) -> bool {
    match wire {
        [cmf, flg, ..] => cmf & 0x0f == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Reads a response body in pieces of requested size.
#[derive(Debug)]
pub struct BodyReader {
    response: Option<reqwest::Response>,
    pending: Vec<u8>,
    received: usize,
}

impl BodyReader {
    pub fn new(response: reqwest::Response) -> Self {
        Self { response: Some(response), pending: Vec::new(), received: 0 }
    }

    /// Reads up to `amt` bytes. Fewer are returned only at the end of the body.
    ///
    /// A stream error mid-body is logged and treated as the end of the body.
    pub async fn read(&mut self, amt: usize) -> Vec<u8> {
        while self.pending.len() < amt {
            let Some(response) = self.response.as_mut() else { break };
            match response.chunk().await {
                Ok(Some(chunk)) => self.push(&chunk),
                Ok(None) => self.response = None,
                Err(e) => {
                    tracing::warn!("Error reading response body after {} bytes: {}", self.received, e);
                    self.response = None;
                }
            }
        }

        let take = amt.min(self.pending.len());
        let rest = self.pending.split_off(take);
        std::mem::replace(&mut self.pending, rest)
    }

    /// Drops the connection without reading the rest of the body.
    pub fn close(&mut self) {
        self.response = None;
        self.pending.clear();
    }

    fn push(&mut self, chunk: &[u8]) {
        self.received += chunk.len();
        self.pending.extend_from_slice(chunk);
    }
}
