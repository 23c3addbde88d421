//! The Anvil region-file container: sector-addressed header, chunk
//! envelope (length + compression tag), and the atomic on-disk write
//! discipline needed to safely rewrite a `.mca` file in place.
//!
//! This crate only understands the *container*: it hands callers the raw
//! decompressed NBT bytes for a chunk and accepts raw NBT bytes back. It
//! has no opinion about what is inside those bytes — that is the `nbt`
//! crate's job, and the biome-specific rewrite rules live in `remap`.

pub mod envelope;
pub mod files;
pub mod region;

pub use envelope::{compress, decompress, parse_envelope, CompressionScheme, Envelope};
pub use files::{read_region_file, write_region_file};
pub use region::{
    extract_blob, iter_present, parse_locations, parse_timestamps, rebuild, ChunkPointer,
    RebuiltChunk, ENTRY_COUNT, HEADER_SIZE, SECTOR_SIZE,
};

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    RegionTooShort,
    ChunkLengthMismatch,
    UnknownCompression(u8),
    ChunkTooLarge,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::RegionTooShort => write!(f, "region file is shorter than its 8KiB header"),
            Error::ChunkLengthMismatch => {
                write!(f, "chunk envelope length prefix does not fit the blob")
            }
            Error::UnknownCompression(scheme) => {
                write!(f, "compression scheme ({scheme}) was not recognised for chunk")
            }
            Error::ChunkTooLarge => write!(f, "chunk too large to store (>255 sectors)"),
        }
    }
}

impl std::error::Error for Error {}
