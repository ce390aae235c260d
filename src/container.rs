//! LZMA container codec: frames an engine payload behind a 13-byte header.
//!
//! ```no_run
//! use lzenvelope::container::{decode_bytes, encode_bytes};
//! use lzenvelope::LzmaEngine;
//!
//! let engine = LzmaEngine::new();
//! let packed = encode_bytes(&engine, b"Hello, world!")?;
//! assert_eq!(decode_bytes(&engine, &packed)?, b"Hello, world!");
//! # Ok::<(), lzenvelope::ContainerError>(())
//! ```
//!
//! # Framing
//! The payload length is never stored.  [`decode`] takes it to be the rest of
//! a seekable stream; [`decode_bounded`] takes it from the caller for
//! streams that cannot report their length.
//!
//! # Size fidelity
//! The destination is wrapped in a [`BoundedWriter`] sized to the declared
//! uncompressed size.  An engine that writes more or fewer bytes fails the
//! call with [`ContainerError::CodecFailure`].

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

use crate::codec::{CodecEngine, ContainerError, LzmaEngine};
use crate::header::{ContainerHeader, HEADER_LEN};
use crate::io_stream::{BoundedWriter, CountingReader};

// ── ContainerInfo ─────────────────────────────────────────────────────────────

/// Header summary returned by [`inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub properties:        String,
    pub uncompressed_size: u64,
    pub payload_size:      u64,
    pub header_size:       u64,
}

// ── Encode ────────────────────────────────────────────────────────────────────

/// Encode the rest of `source` (from its current position) into `dest`.
///
/// Neither stream is closed.
pub fn encode<E, R, W>(engine: &E, source: &mut R, dest: &mut W) -> Result<(), ContainerError>
where
    E: CodecEngine + ?Sized,
    R: Read + Seek,
    W: Write,
{
    let len = remaining_len(source)?;
    encode_sized(engine, source, len, dest)
}

/// Encode exactly `len` bytes of `source` into `dest`.
///
/// For sources that cannot seek; `len` is written to the header before the
/// payload exists, so a source that runs dry early is an error.
pub fn encode_sized<E, R, W>(
    engine: &E,
    source: &mut R,
    len:    u64,
    dest:   &mut W,
) -> Result<(), ContainerError>
where
    E: CodecEngine + ?Sized,
    R: Read,
    W: Write,
{
    let header = ContainerHeader::new(engine.properties()?, len);
    header.write(&mut *dest)?;
    debug!(props = %header.properties, uncompressed_size = len, "wrote container header");

    if len == 0 {
        return Ok(());
    }

    let mut reader = CountingReader::new(source.by_ref().take(len));
    engine.encode(&mut reader, dest)?;
    if reader.bytes_read != len {
        return Err(ContainerError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("source ended after {} of {} bytes", reader.bytes_read, len),
        )));
    }
    Ok(())
}

// ── Decode ────────────────────────────────────────────────────────────────────

/// Decode a container occupying the rest of `source` into `dest`.
pub fn decode<E, R, W>(engine: &E, source: &mut R, dest: &mut W) -> Result<(), ContainerError>
where
    E: CodecEngine + ?Sized,
    R: Read + Seek,
    W: Write,
{
    let header = ContainerHeader::read(&mut *source)?;
    let compressed_size = remaining_len(source)?;
    decode_payload(engine, &header, compressed_size, source, dest)
}

/// Decode a container of `container_len` bytes (header included) from a
/// stream that cannot report its own length.
///
/// `source` is left positioned just past the container, even if the engine
/// stopped short of the payload end.  Bytes after it are left unread.
pub fn decode_bounded<E, R, W>(
    engine:        &E,
    source:        &mut R,
    container_len: u64,
    dest:          &mut W,
) -> Result<(), ContainerError>
where
    E: CodecEngine + ?Sized,
    R: Read,
    W: Write,
{
    let mut limited = source.by_ref().take(container_len);
    let header = ContainerHeader::read(&mut limited)?;
    let compressed_size = container_len - HEADER_LEN as u64;
    decode_payload(engine, &header, compressed_size, &mut limited, dest)?;
    io::copy(&mut limited, &mut io::sink())?;
    Ok(())
}

fn decode_payload<E, R, W>(
    engine:          &E,
    header:          &ContainerHeader,
    compressed_size: u64,
    source:          &mut R,
    dest:            &mut W,
) -> Result<(), ContainerError>
where
    E: CodecEngine + ?Sized,
    R: Read,
    W: Write,
{
    debug!(
        props = %header.properties,
        uncompressed_size = header.uncompressed_size,
        compressed_size,
        "read container header"
    );

    if header.uncompressed_size == 0 {
        return Ok(());
    }

    let mut sink = BoundedWriter::new(&mut *dest, header.uncompressed_size);
    let result = engine.decode(
        &header.properties,
        compressed_size,
        header.uncompressed_size,
        source,
        &mut sink,
    );
    if sink.overflowed {
        return Err(ContainerError::CodecFailure(format!(
            "engine produced more than the declared {} bytes",
            header.uncompressed_size
        )));
    }
    result?;
    if sink.bytes_written != header.uncompressed_size {
        return Err(ContainerError::CodecFailure(format!(
            "engine produced {} of the declared {} bytes",
            sink.bytes_written, header.uncompressed_size
        )));
    }
    Ok(())
}

// ── Inspect ───────────────────────────────────────────────────────────────────

/// Read only the header of the container at the current position.
///
/// `source` is left positioned just after the header.
pub fn inspect<R: Read + Seek>(source: &mut R) -> Result<ContainerInfo, ContainerError> {
    let header = ContainerHeader::read(&mut *source)?;
    Ok(ContainerInfo {
        properties:        header.properties.to_hex(),
        uncompressed_size: header.uncompressed_size,
        payload_size:      remaining_len(source)?,
        header_size:       HEADER_LEN as u64,
    })
}

// ── Byte and file helpers ─────────────────────────────────────────────────────

pub fn encode_bytes<E: CodecEngine + ?Sized>(engine: &E, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let mut out = Vec::with_capacity(HEADER_LEN + data.len() / 2);
    encode_sized(engine, &mut &data[..], data.len() as u64, &mut out)?;
    Ok(out)
}

pub fn decode_bytes<E: CodecEngine + ?Sized>(engine: &E, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let mut out = Vec::new();
    decode(engine, &mut Cursor::new(data), &mut out)?;
    Ok(out)
}

/// Compress the file at `input` into a new container file at `output`.
pub fn compress_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<(), ContainerError> {
    let mut src = File::open(input)?;
    let mut dst = BufWriter::new(File::create(output)?);
    encode(&LzmaEngine::new(), &mut src, &mut dst)?;
    dst.flush()?;
    Ok(())
}

/// Decompress the container file at `input` into `output`.
pub fn decompress_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<(), ContainerError> {
    decompress_file_with(&LzmaEngine::new(), input, output)
}

pub fn decompress_file_with<E, P, Q>(engine: &E, input: P, output: Q) -> Result<(), ContainerError>
where
    E: CodecEngine + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut src = io::BufReader::new(File::open(input)?);
    let mut dst = BufWriter::new(File::create(output)?);
    decode(engine, &mut src, &mut dst)?;
    dst.flush()?;
    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn remaining_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let pos = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(pos))?;
    Ok(end.saturating_sub(pos))
}
