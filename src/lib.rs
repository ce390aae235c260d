pub mod codec;
pub mod header;
pub mod io_stream;
pub mod container;
pub mod attributes;

pub use codec::{CodecEngine, CoderProperties, ContainerError, LzmaEngine};
pub use header::{ContainerHeader, HEADER_LEN};
pub use container::{decode, decode_bounded, encode, encode_sized, inspect, ContainerInfo};
pub use attributes::{AttributeError, ExternalAttributes, FileSystem, PosixAttributeBridge, StdFileSystem};
