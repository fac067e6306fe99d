//! Binary object format and encoding.
//!
//! Every object file starts with a 16-byte header followed by the payload:
//!
//! ```text
//! 0x00  4   "LODE" magic
//! 0x04  1   version (u8) = 1
//! 0x05  1   type: 1=blob, 2=tree
//! 0x06  1   algo: 1=blake3-256
//! 0x07  1   compression: 0=none, 1=zstd
//! 0x08  8   payload_len (u64 LE) - compressed size if compressed
//! 0x10  ... payload
//! ```
//!
//! The content identity of an object is always the hash of the uncompressed
//! payload, so compression never changes where an object lives.

use crate::error::{Error, Result};
use crate::hash::Algorithm;

/// Magic bytes at the start of every object file.
pub const MAGIC: &[u8; 4] = b"LODE";

/// Current object format version.
pub const VERSION: u8 = 1;

/// Size of the object header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// A blob (file content).
    Blob = 1,
    /// A tree (directory structure).
    Tree = 2,
}

impl ObjectType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ObjectType::Blob),
            2 => Ok(ObjectType::Tree),
            _ => Err(Error::invalid_object(format!(
                "Unknown object type: {}",
                value
            ))),
        }
    }

    /// String name of this object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
        }
    }
}

/// Compression types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// No compression.
    None = 0,
    /// Zstandard compression.
    Zstd = 1,
}

impl CompressionType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zstd),
            _ => Err(Error::invalid_object(format!(
                "Unknown compression type: {}",
                value
            ))),
        }
    }
}

/// A decoded 16-byte object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Object format version.
    pub version: u8,
    /// Object type (blob or tree).
    pub object_type: ObjectType,
    /// Hash algorithm used.
    pub algorithm: Algorithm,
    /// Compression applied to the payload.
    pub compression: CompressionType,
    /// Length of the stored payload in bytes.
    pub payload_len: u64,
}

impl ObjectHeader {
    /// Create a new object header at the current format version.
    pub fn new(
        object_type: ObjectType,
        algorithm: Algorithm,
        compression: CompressionType,
        payload_len: u64,
    ) -> Self {
        Self {
            version: VERSION,
            object_type,
            algorithm,
            compression,
            payload_len,
        }
    }

    /// Encode the header to a 16-byte array.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version;
        buf[5] = self.object_type.to_u8();
        buf[6] = self.algorithm.id();
        buf[7] = self.compression.to_u8();
        buf[8..16].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Decode a header from a 16-byte buffer.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::invalid_object(format!(
                "Header too short: {} bytes (expected {})",
                buf.len(),
                HEADER_SIZE
            )));
        }

        if &buf[0..4] != MAGIC {
            return Err(Error::invalid_object("Bad magic bytes"));
        }

        let version = buf[4];
        if version != VERSION {
            return Err(Error::invalid_object(format!(
                "Unsupported format version: {}",
                version
            )));
        }

        let object_type = ObjectType::from_u8(buf[5])?;
        let algorithm = Algorithm::from_id(buf[6])?;
        let compression = CompressionType::from_u8(buf[7])?;

        let mut len_buf = [0u8; 8];
        len_buf.copy_from_slice(&buf[8..16]);
        let payload_len = u64::from_le_bytes(len_buf);

        Ok(Self {
            version,
            object_type,
            algorithm,
            compression,
            payload_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = ObjectHeader::new(
            ObjectType::Tree,
            Algorithm::Blake3,
            CompressionType::None,
            1234,
        );
        let encoded = header.encode();
        assert_eq!(encoded.len(), HEADER_SIZE);

        let decoded = ObjectHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_roundtrip_compressed_blob() {
        let header = ObjectHeader::new(
            ObjectType::Blob,
            Algorithm::Blake3,
            CompressionType::Zstd,
            u64::MAX,
        );
        let decoded = ObjectHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded.payload_len, u64::MAX);
        assert_eq!(decoded.compression, CompressionType::Zstd);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut buf = ObjectHeader::new(
            ObjectType::Blob,
            Algorithm::Blake3,
            CompressionType::None,
            0,
        )
        .encode();
        buf[0] = b'X';
        assert!(ObjectHeader::decode(&buf).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut buf = ObjectHeader::new(
            ObjectType::Blob,
            Algorithm::Blake3,
            CompressionType::None,
            0,
        )
        .encode();
        buf[4] = 99;
        assert!(ObjectHeader::decode(&buf).is_err());
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        assert!(ObjectHeader::decode(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_object_type_values() {
        assert_eq!(ObjectType::from_u8(1).unwrap(), ObjectType::Blob);
        assert_eq!(ObjectType::from_u8(2).unwrap(), ObjectType::Tree);
        assert!(ObjectType::from_u8(0).is_err());
        assert!(ObjectType::from_u8(3).is_err());
    }
}
