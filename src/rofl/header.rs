// Fixed 32-byte ROFL header. Only offsets and lengths are read; the payload
// itself is never decoded.

use serde::Serialize;

use crate::error::HeaderError;

pub const MAGIC: &[u8; 4] = b"ROFL";
pub const HEADER_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoflHeader {
    pub version: u32,
    pub file_length: u32,
    pub metadata_offset: u32,
    pub metadata_length: u32,
    pub payload_header_offset: u32,
    pub payload_header_length: u32,
    pub payload_offset: u32,
}

impl RoflHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < HEADER_LEN {
            return Err(HeaderError::TooShort(bytes.len()));
        }
        if &bytes[..4] != MAGIC {
            return Err(HeaderError::BadMagic);
        }
        let field = |index: usize| {
            let start = 4 + index * 4;
            u32::from_le_bytes([bytes[start], bytes[start + 1], bytes[start + 2], bytes[start + 3]])
        };
        Ok(Self {
            version: field(0),
            file_length: field(1),
            metadata_offset: field(2),
            metadata_length: field(3),
            payload_header_offset: field(4),
            payload_header_length: field(5),
            payload_offset: field(6),
        })
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata_length > 0
    }

    /// True when the declared file extends past the payload offset.
    pub fn has_payload(&self) -> bool {
        self.payload_offset > 0 && self.file_length > self.payload_offset
    }

    /// Serialize back to the on-disk layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(MAGIC);
        let fields = [
            self.version,
            self.file_length,
            self.metadata_offset,
            self.metadata_length,
            self.payload_header_offset,
            self.payload_header_length,
            self.payload_offset,
        ];
        for (i, value) in fields.iter().enumerate() {
            let start = 4 + i * 4;
            out[start..start + 4].copy_from_slice(&value.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoflHeader {
        RoflHeader {
            version: 14,
            file_length: 4096,
            metadata_offset: 32,
            metadata_length: 512,
            payload_header_offset: 544,
            payload_header_length: 34,
            payload_offset: 578,
        }
    }

    #[test]
    fn test_parse_fields() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[..4], b"ROFL");
        assert_eq!(RoflHeader::parse(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let mut bytes = sample().to_bytes().to_vec();
        bytes.extend_from_slice(&[0xAB; 100]);
        assert_eq!(RoflHeader::parse(&bytes).unwrap().payload_offset, 578);
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(RoflHeader::parse(b"ROFL"), Err(HeaderError::TooShort(4))));
        assert!(matches!(RoflHeader::parse(&[]), Err(HeaderError::TooShort(0))));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(RoflHeader::parse(&bytes), Err(HeaderError::BadMagic)));
    }

    #[test]
    fn test_section_flags() {
        let header = sample();
        assert!(header.has_metadata());
        assert!(header.has_payload());

        let empty = RoflHeader {
            metadata_length: 0,
            file_length: 100,
            ..sample()
        };
        assert!(!empty.has_metadata());
        assert!(!empty.has_payload());
    }
}
