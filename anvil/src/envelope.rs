//! The chunk envelope: the 5-byte length+compression prefix that wraps
//! every chunk's NBT payload inside a region file, and the gzip / zlib /
//! raw (de)compression underneath it.

use byteorder::{BigEndian, ByteOrder};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{Read, Write};

use crate::{Error, Result};

/// The compression scheme byte that follows a chunk's 4-byte length
/// prefix. `Uncompressed` exists in the format but is effectively never
/// produced by the vanilla game; we still round-trip it faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionScheme {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl CompressionScheme {
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            1 => CompressionScheme::Gzip,
            2 => CompressionScheme::Zlib,
            3 => CompressionScheme::Uncompressed,
            other => return Err(Error::UnknownCompression(other)),
        })
    }
}

/// A chunk blob as extracted verbatim from the region file: the 4-byte
/// big-endian length, the compression tag, and the compressed payload.
/// `blob.len() == length + 4`.
pub struct Envelope<'a> {
    pub scheme_tag: u8,
    pub payload: &'a [u8],
}

/// Splits a raw chunk blob (as returned by [`crate::region::extract_blob`])
/// into its compression tag and payload, truncating the payload to the
/// declared length when the blob carries a few trailing bytes beyond what
/// the length field promises. Mirrors the lenient behaviour of the
/// original tool: a declared length that undershoots the available bytes
/// is accepted (and logged at debug level), a declared length that
/// overshoots is a hard error.
pub fn parse_envelope(blob: &[u8]) -> Result<Envelope<'_>> {
    if blob.len() < 5 {
        return Err(Error::ChunkLengthMismatch);
    }
    let length = BigEndian::read_u32(&blob[0..4]) as usize;
    let scheme_tag = blob[4];
    let available = &blob[5..];
    let want = length.saturating_sub(1);
    let payload = if want == available.len() {
        available
    } else if want < available.len() {
        log::debug!(
            "chunk envelope declares {} bytes but {} are present; truncating",
            want,
            available.len()
        );
        &available[..want]
    } else {
        return Err(Error::ChunkLengthMismatch);
    };
    Ok(Envelope { scheme_tag, payload })
}

/// Decompresses a chunk envelope's payload into raw NBT bytes.
pub fn decompress(envelope: &Envelope) -> Result<Vec<u8>> {
    let scheme = CompressionScheme::from_tag(envelope.scheme_tag)?;
    let mut out = Vec::new();
    match scheme {
        CompressionScheme::Gzip => {
            GzDecoder::new(envelope.payload).read_to_end(&mut out)?;
        }
        CompressionScheme::Zlib => {
            ZlibDecoder::new(envelope.payload).read_to_end(&mut out)?;
        }
        CompressionScheme::Uncompressed => out.extend_from_slice(envelope.payload),
    }
    Ok(out)
}

/// Recompresses raw NBT bytes into a full chunk blob (length prefix, tag,
/// payload), preserving the compression scheme the chunk was read with.
/// An unrecognised tag falls back to zlib, matching the original tool.
pub fn compress(scheme_tag: u8, nbt_bytes: &[u8]) -> Result<Vec<u8>> {
    let (scheme, scheme_tag) = match CompressionScheme::from_tag(scheme_tag) {
        Ok(s) => (s, scheme_tag),
        Err(_) => (CompressionScheme::Zlib, CompressionScheme::Zlib as u8),
    };
    let payload = match scheme {
        CompressionScheme::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(nbt_bytes)?;
            enc.finish()?
        }
        CompressionScheme::Zlib => {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(nbt_bytes)?;
            enc.finish()?
        }
        CompressionScheme::Uncompressed => nbt_bytes.to_vec(),
    };
    let mut blob = Vec::with_capacity(5 + payload.len());
    blob.extend_from_slice(&((payload.len() + 1) as u32).to_be_bytes());
    blob.push(scheme_tag);
    blob.extend_from_slice(&payload);
    Ok(blob)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_zlib() {
        let nbt = b"hello world this is nbt bytes".to_vec();
        let blob = compress(CompressionScheme::Zlib as u8, &nbt).unwrap();
        let env = parse_envelope(&blob).unwrap();
        assert_eq!(env.scheme_tag, CompressionScheme::Zlib as u8);
        let round = decompress(&env).unwrap();
        assert_eq!(round, nbt);
    }

    #[test]
    fn round_trip_gzip() {
        let nbt = b"another payload".to_vec();
        let blob = compress(CompressionScheme::Gzip as u8, &nbt).unwrap();
        let env = parse_envelope(&blob).unwrap();
        let round = decompress(&env).unwrap();
        assert_eq!(round, nbt);
    }

    #[test]
    fn round_trip_uncompressed() {
        let nbt = b"raw bytes".to_vec();
        let blob = compress(CompressionScheme::Uncompressed as u8, &nbt).unwrap();
        let env = parse_envelope(&blob).unwrap();
        assert_eq!(env.scheme_tag, 3);
        let round = decompress(&env).unwrap();
        assert_eq!(round, nbt);
    }

    #[test]
    fn unknown_compression_tag_rejected() {
        let mut blob = 5u32.to_be_bytes().to_vec();
        blob.push(9);
        blob.extend_from_slice(&[0, 0, 0, 0]);
        let env = parse_envelope(&blob).unwrap();
        assert!(decompress(&env).is_err());
    }

    #[test]
    fn preserves_compression_tag_on_compress_fallback() {
        let nbt = b"payload".to_vec();
        // tag 9 is unknown; compress() should fall back to zlib and report that.
        let blob = compress(9, &nbt).unwrap();
        assert_eq!(blob[4], CompressionScheme::Zlib as u8);
    }
}
