//! Fixed 13-byte container header.
//!
//! ```text
//! offset  len  field
//!      0    5  coder properties (opaque, engine-defined)
//!      5    8  uncompressed size (u64 LE)
//!     13    …  payload (compressed bytes, runs to end of stream)
//! ```
//!
//! There is no payload-length field.  The payload length is whatever is left
//! of the stream (or caller-delimited range) after the header.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::codec::{CoderProperties, ContainerError, PROPERTIES_LEN};

/// Byte length of the uncompressed-size field.
pub const SIZE_FIELD_LEN: usize = 8;
/// Total header length: properties + size field.
pub const HEADER_LEN: usize = PROPERTIES_LEN + SIZE_FIELD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub properties:        CoderProperties,
    pub uncompressed_size: u64,
}

impl ContainerHeader {
    pub fn new(properties: CoderProperties, uncompressed_size: u64) -> Self {
        Self { properties, uncompressed_size }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.properties.as_bytes())?;
        writer.write_u64::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }

    /// Read the header from the current position of `reader`.
    ///
    /// A short read in either field is reported as
    /// [`ContainerError::Malformed`]; any other I/O failure passes through.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, ContainerError> {
        let mut props = [0u8; PROPERTIES_LEN];
        reader.read_exact(&mut props).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                ContainerError::Malformed("input is too short to be valid")
            }
            _ => ContainerError::Io(e),
        })?;
        let uncompressed_size = reader
            .read_u64::<LittleEndian>()
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => ContainerError::Malformed("cannot read size field"),
                _ => ContainerError::Io(e),
            })?;
        Ok(Self {
            properties: CoderProperties(props),
            uncompressed_size,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..PROPERTIES_LEN].copy_from_slice(self.properties.as_bytes());
        out[PROPERTIES_LEN..PROPERTIES_LEN + SIZE_FIELD_LEN]
            .copy_from_slice(&self.uncompressed_size.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PROPS: CoderProperties = CoderProperties([0x5d, 0x00, 0x00, 0x80, 0x00]);

    #[test]
    fn write_layout_is_props_then_le_size() {
        let mut buf = Vec::new();
        ContainerHeader::new(PROPS, 0x0102_0304_0506_0708).write(&mut buf).unwrap();
        assert_eq!(
            buf,
            [0x5d, 0x00, 0x00, 0x80, 0x00, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(buf.as_slice(), &ContainerHeader::new(PROPS, 0x0102_0304_0506_0708).to_bytes());
    }

    #[test]
    fn size_field_follows_properties() {
        let bytes = ContainerHeader::new(PROPS, u64::MAX - 1).to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(&bytes[..PROPERTIES_LEN], PROPS.as_bytes());
        assert_eq!(bytes[PROPERTIES_LEN..].len(), SIZE_FIELD_LEN);
        assert_eq!(&bytes[PROPERTIES_LEN..], &(u64::MAX - 1).to_le_bytes());
    }

    #[test]
    fn read_parses_written_header() {
        let header = ContainerHeader::new(PROPS, 42);
        let got = ContainerHeader::read(Cursor::new(header.to_bytes())).unwrap();
        assert_eq!(got, header);
    }

    #[test]
    fn short_properties_is_malformed() {
        let err = ContainerHeader::read(Cursor::new([0x5d, 0x00, 0x00])).unwrap_err();
        assert!(matches!(err, ContainerError::Malformed("input is too short to be valid")));
    }

    #[test]
    fn short_size_field_is_malformed() {
        let mut bytes = ContainerHeader::new(PROPS, 7).to_bytes().to_vec();
        bytes.truncate(HEADER_LEN - 1);
        let err = ContainerHeader::read(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ContainerError::Malformed("cannot read size field")));
    }
}
