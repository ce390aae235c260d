use lzenvelope::attributes::{ExternalAttributes, FileSystem, PosixAttributeBridge};
use lzenvelope::container::{decode_bytes, encode_bytes};
use lzenvelope::{CodecEngine, ContainerError, LzmaEngine, HEADER_LEN};
use proptest::prelude::*;
use std::io;
use std::path::Path;

/// Every path reports the same mode.
struct FixedMode(u16);

impl FileSystem for FixedMode {
    fn mode(&self, _path: &Path) -> io::Result<u16> {
        Ok(self.0)
    }

    fn set_mode(&self, _path: &Path, _mode: u16) -> io::Result<()> {
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let engine = LzmaEngine::new();
        let packed = encode_bytes(&engine, &data).unwrap();
        prop_assert_eq!(decode_bytes(&engine, &packed).unwrap(), data);
    }

    #[test]
    fn header_shape(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let engine = LzmaEngine::new();
        let packed = encode_bytes(&engine, &data).unwrap();
        let props = engine.properties().unwrap();
        prop_assert_eq!(&packed[..5], props.as_bytes());
        prop_assert_eq!(&packed[5..HEADER_LEN], &(data.len() as u64).to_le_bytes());
    }

    #[test]
    fn truncated_header_is_malformed(data in proptest::collection::vec(any::<u8>(), 0..HEADER_LEN)) {
        let err = decode_bytes(&LzmaEngine::new(), &data).unwrap_err();
        prop_assert!(matches!(err, ContainerError::Malformed(_)));
    }

    #[test]
    fn capture_is_idempotent(raw in any::<u32>(), mode in any::<u16>()) {
        let bridge = PosixAttributeBridge::with_filesystem(FixedMode(mode));
        let p = Path::new("entry");
        let once = bridge.capture_into(ExternalAttributes::from_raw(raw), p).unwrap();
        let twice = bridge.capture_into(once, p).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn capture_preserves_low_bits(raw in any::<u32>(), mode in any::<u16>()) {
        let bridge = PosixAttributeBridge::with_filesystem(FixedMode(mode));
        let merged = bridge.capture_into(ExternalAttributes::from_raw(raw), Path::new("entry")).unwrap();
        prop_assert_eq!(merged.raw() & 0xFFFF, raw & 0xFFFF);
        prop_assert_eq!(merged.posix_mode() & mode, mode);
    }
}
