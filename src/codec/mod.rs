//! Codec engine port and the built-in LZMA engine.
//!
//! The container never interprets the compressed bitstream.  It talks to a
//! [`CodecEngine`], which supplies an opaque 5-byte property block and turns
//! raw bytes into a payload (and back).  [`LzmaEngine`] is the production
//! implementation on top of `lzma-rs`; tests plug in fakes.
//!
//! # Engine contract
//! - `properties()` is fixed for a given engine value.
//! - `encode` writes the payload only.  The container writes the header.
//! - `decode` is given the properties, the exact payload length and the
//!   declared output length.  It must not read past `compressed_size` bytes.

use std::io::{self, BufReader, Cursor, Read, Write};
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::io_stream::PrefixCapture;

/// Byte length of the coder property block.
pub const PROPERTIES_LEN: usize = 5;

// ── Coder properties ─────────────────────────────────────────────────────────

/// Engine-defined property block, copied verbatim into the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoderProperties(pub [u8; PROPERTIES_LEN]);

impl CoderProperties {
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PROPERTIES_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CoderProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ContainerError {
    /// Header is shorter than 13 bytes.  Raised before any payload work.
    #[error("Malformed container: {0}")]
    Malformed(&'static str),
    /// The engine rejected or could not complete an encode/decode.
    #[error("Codec failure: {0}")]
    CodecFailure(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Engine trait ─────────────────────────────────────────────────────────────

pub trait CodecEngine: Send + Sync {
    /// Property block this engine writes in front of every payload.
    fn properties(&self) -> Result<CoderProperties, ContainerError>;

    /// Consume all of `input` and write the compressed payload to `output`.
    fn encode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), ContainerError>;

    /// Decompress `compressed_size` bytes from `input` into `output_size`
    /// bytes on `output`.
    fn decode(
        &self,
        properties:      &CoderProperties,
        compressed_size: u64,
        output_size:     u64,
        input:           &mut dyn Read,
        output:          &mut dyn Write,
    ) -> Result<(), ContainerError>;
}

// ── LZMA engine (lzma-rs) ────────────────────────────────────────────────────

/// LZMA engine backed by `lzma-rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaEngine {
    memlimit: Option<usize>,
}

impl LzmaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the decoder's dictionary buffer at `bytes`.
    pub fn with_memlimit(mut self, bytes: usize) -> Self {
        self.memlimit = Some(bytes);
        self
    }

    pub fn memlimit(&self) -> Option<usize> {
        self.memlimit
    }

    fn compress_options() -> lzma_rs::compress::Options {
        let mut opts = lzma_rs::compress::Options::default();
        opts.unpacked_size = lzma_rs::compress::UnpackedSize::SkipWritingToHeader;
        opts
    }

    fn decompress_options(&self, output_size: u64) -> lzma_rs::decompress::Options {
        let mut opts = lzma_rs::decompress::Options::default();
        opts.unpacked_size = lzma_rs::decompress::UnpackedSize::UseProvided(Some(output_size));
        opts.memlimit = self.memlimit;
        opts
    }
}

impl CodecEngine for LzmaEngine {
    fn properties(&self) -> Result<CoderProperties, ContainerError> {
        // lzma-rs leads every stream with its property block; an empty
        // encode yields it without touching real input.
        let mut out = Vec::new();
        lzma_rs::lzma_compress_with_options(&mut io::empty(), &mut out, &Self::compress_options())?;
        let props: [u8; PROPERTIES_LEN] = out
            .get(..PROPERTIES_LEN)
            .and_then(|p| p.try_into().ok())
            .ok_or_else(|| ContainerError::CodecFailure("engine emitted no property block".into()))?;
        Ok(CoderProperties(props))
    }

    fn encode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), ContainerError> {
        let expected = self.properties()?;
        let mut reader = BufReader::new(input);
        let mut sink: PrefixCapture<_, PROPERTIES_LEN> = PrefixCapture::new(output);
        lzma_rs::lzma_compress_with_options(&mut reader, &mut sink, &Self::compress_options())?;
        match sink.prefix() {
            Some(p) if p == expected.0 => Ok(()),
            Some(p) => Err(ContainerError::CodecFailure(format!(
                "engine emitted property block {} but advertised {}",
                hex::encode(p),
                expected,
            ))),
            None => Err(ContainerError::CodecFailure("engine emitted no property block".into())),
        }
    }

    fn decode(
        &self,
        properties:      &CoderProperties,
        compressed_size: u64,
        output_size:     u64,
        input:           &mut dyn Read,
        output:          &mut dyn Write,
    ) -> Result<(), ContainerError> {
        trace!(props = %properties, compressed_size, output_size, "lzma-rs decode");
        // lzma-rs expects the property block at the head of its input.
        let stream = Cursor::new(properties.0).chain(Read::take(input, compressed_size));
        let mut reader = BufReader::new(stream);
        let mut output = output;
        lzma_rs::lzma_decompress_with_options(&mut reader, &mut output, &self.decompress_options(output_size))
            .map_err(engine_error)
    }
}

fn engine_error(e: lzma_rs::error::Error) -> ContainerError {
    match e {
        lzma_rs::error::Error::IoError(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
            ContainerError::CodecFailure(format!("payload ended before declared size: {io}"))
        }
        lzma_rs::error::Error::IoError(io) => ContainerError::Io(io),
        other => ContainerError::CodecFailure(other.to_string()),
    }
}
