//! Fixed-offset record layouts shared by host and guest.
//!
//! Exports that return a record write it at a guest pointer using one of the
//! layouts below; the host reads it back with the same description. Offsets
//! are in bytes from the record pointer, every field is little-endian and
//! pointer fields are 32-bit guest addresses.
//!
//! ```text
//! OpenResult (8 bytes)        PropertiesRecord (28 bytes)      ByteData (8 bytes)
//! +0  u32 handle              +0  u32 duration_ms              +0 u32 length
//! +4  u8  format              +4  u32 channels                 +4 ptr data
//!                             +8  u32 sample_rate
//!                             +12 u32 bitrate
//!                             +16 u32 bits_per_sample
//!                             +20 ptr image_descs (char**)
//!                             +24 ptr codec_name  (char*)
//! ```
//!
//! Changing any of these requires bumping [`ABI_VERSION`].

use crate::abi::{ABI_VERSION, POINTER_WIDTH};
use thiserror::Error;

/// Whether a field holds a plain value or a guest pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned little-endian integer
    Scalar,
    /// Guest address; 0 means null
    Pointer,
}

/// One field of a record: name, byte offset and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// Field name
    pub name: &'static str,
    /// Byte offset from the record pointer
    pub offset: usize,
    /// Width in bytes (1, 2, 4 or 8)
    pub width: usize,
    /// Value or pointer
    pub kind: FieldKind,
}

impl FieldLayout {
    /// A scalar field.
    pub const fn scalar(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
            kind: FieldKind::Scalar,
        }
    }

    /// A pointer field.
    pub const fn pointer(name: &'static str, offset: usize) -> Self {
        Self {
            name,
            offset,
            width: POINTER_WIDTH,
            kind: FieldKind::Pointer,
        }
    }

    fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Versioned description of a fixed-layout record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Record name, used in errors
    pub name: &'static str,
    /// ABI version this layout belongs to
    pub version: u32,
    /// Total record size in bytes
    pub size: usize,
    /// Fields in declaration order
    pub fields: &'static [FieldLayout],
}

/// Errors from encoding or decoding a record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// Fewer bytes than the record size
    #[error("{record}: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Record name
        record: &'static str,
        /// Record size
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Wrong number of field values
    #[error("{record}: expected {expected} field values, got {actual}")]
    FieldCount {
        /// Record name
        record: &'static str,
        /// Number of fields in the layout
        expected: usize,
        /// Values supplied
        actual: usize,
    },

    /// Value wider than its field
    #[error("{record}.{field}: value {value:#x} does not fit in {width} bytes")]
    Overflow {
        /// Record name
        record: &'static str,
        /// Field name
        field: &'static str,
        /// Offending value
        value: u64,
        /// Field width
        width: usize,
    },
}

impl RecordLayout {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check that every field fits in the record, has a supported width and
    /// does not overlap the previous one.
    pub fn is_well_formed(&self) -> bool {
        let mut prev_end = 0;
        for field in self.fields {
            if !matches!(field.width, 1 | 2 | 4 | 8) {
                return false;
            }
            if field.offset < prev_end || field.end() > self.size {
                return false;
            }
            prev_end = field.end();
        }
        true
    }

    /// Serialize field values (in field order) into `size` bytes.
    pub fn encode(&self, values: &[u64]) -> Result<Vec<u8>, LayoutError> {
        if values.len() != self.fields.len() {
            return Err(LayoutError::FieldCount {
                record: self.name,
                expected: self.fields.len(),
                actual: values.len(),
            });
        }

        let mut buf = vec![0u8; self.size];
        for (field, &value) in self.fields.iter().zip(values) {
            if field.width < 8 && value >> (field.width * 8) != 0 {
                return Err(LayoutError::Overflow {
                    record: self.name,
                    field: field.name,
                    value,
                    width: field.width,
                });
            }
            let bytes = value.to_le_bytes();
            buf[field.offset..field.end()].copy_from_slice(&bytes[..field.width]);
        }
        Ok(buf)
    }

    /// Read field values (in field order) from at least `size` bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u64>, LayoutError> {
        if bytes.len() < self.size {
            return Err(LayoutError::Truncated {
                record: self.name,
                expected: self.size,
                actual: bytes.len(),
            });
        }

        Ok(self
            .fields
            .iter()
            .map(|field| {
                let mut word = [0u8; 8];
                word[..field.width].copy_from_slice(&bytes[field.offset..field.end()]);
                u64::from_le_bytes(word)
            })
            .collect())
    }
}

/// Layout of the open result: `{handle: u32, format: u8}`.
pub const OPEN_RESULT: RecordLayout = RecordLayout {
    name: "OpenResult",
    version: ABI_VERSION,
    size: 8,
    fields: &[
        FieldLayout::scalar("handle", 0, 4),
        FieldLayout::scalar("format", 4, 1),
    ],
};

/// Layout of the audio properties record.
pub const PROPERTIES: RecordLayout = RecordLayout {
    name: "PropertiesRecord",
    version: ABI_VERSION,
    size: 28,
    fields: &[
        FieldLayout::scalar("duration_ms", 0, 4),
        FieldLayout::scalar("channels", 4, 4),
        FieldLayout::scalar("sample_rate", 8, 4),
        FieldLayout::scalar("bitrate", 12, 4),
        FieldLayout::scalar("bits_per_sample", 16, 4),
        FieldLayout::pointer("image_descs", 20),
        FieldLayout::pointer("codec_name", 24),
    ],
};

/// Layout of a length-prefixed byte buffer: `{length: u32, data: ptr}`.
pub const BYTE_DATA: RecordLayout = RecordLayout {
    name: "ByteData",
    version: ABI_VERSION,
    size: 8,
    fields: &[
        FieldLayout::scalar("length", 0, 4),
        FieldLayout::pointer("data", 4),
    ],
};

/// A typed view over a [`RecordLayout`].
pub trait Record: Sized {
    /// Layout used on both sides of the boundary.
    const LAYOUT: &'static RecordLayout;

    /// Field values in layout order.
    fn to_fields(&self) -> Vec<u64>;

    /// Build from field values in layout order.
    fn from_fields(fields: &[u64]) -> Self;

    /// Serialize into `LAYOUT.size` bytes.
    fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        Self::LAYOUT.encode(&self.to_fields())
    }

    /// Deserialize from at least `LAYOUT.size` bytes.
    fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        Self::LAYOUT
            .decode(bytes)
            .map(|fields| Self::from_fields(&fields))
    }
}

fn u32_at(fields: &[u64], index: usize) -> u32 {
    fields.get(index).copied().unwrap_or(0) as u32
}

/// Result of a successful open. A null pointer (not a zero handle) signals
/// an invalid file; a zero handle is treated the same way by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenResult {
    /// Opaque handle, unique within the instance
    pub handle: u32,
    /// [`Format`](crate::Format) code
    pub format: u8,
}

impl Record for OpenResult {
    const LAYOUT: &'static RecordLayout = &OPEN_RESULT;

    fn to_fields(&self) -> Vec<u64> {
        vec![self.handle as u64, self.format as u64]
    }

    fn from_fields(fields: &[u64]) -> Self {
        Self {
            handle: u32_at(fields, 0),
            format: u32_at(fields, 1) as u8,
        }
    }
}

/// Raw audio properties as written by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertiesRecord {
    /// Duration in milliseconds
    pub duration_ms: u32,
    /// Channel count
    pub channels: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bitrate in kbit/s
    pub bitrate: u32,
    /// Bit depth, 0 when the format has none
    pub bits_per_sample: u32,
    /// Pointer to a NUL-terminated array of image descriptor rows, or null
    pub image_descs: u32,
    /// Pointer to the codec name string, or null
    pub codec_name: u32,
}

impl Record for PropertiesRecord {
    const LAYOUT: &'static RecordLayout = &PROPERTIES;

    fn to_fields(&self) -> Vec<u64> {
        vec![
            self.duration_ms as u64,
            self.channels as u64,
            self.sample_rate as u64,
            self.bitrate as u64,
            self.bits_per_sample as u64,
            self.image_descs as u64,
            self.codec_name as u64,
        ]
    }

    fn from_fields(fields: &[u64]) -> Self {
        Self {
            duration_ms: u32_at(fields, 0),
            channels: u32_at(fields, 1),
            sample_rate: u32_at(fields, 2),
            bitrate: u32_at(fields, 3),
            bits_per_sample: u32_at(fields, 4),
            image_descs: u32_at(fields, 5),
            codec_name: u32_at(fields, 6),
        }
    }
}

/// Length-prefixed byte buffer in guest memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteData {
    /// Number of bytes at `data`
    pub length: u32,
    /// Pointer to the bytes; null when `length` is 0
    pub data: u32,
}

impl Record for ByteData {
    const LAYOUT: &'static RecordLayout = &BYTE_DATA;

    fn to_fields(&self) -> Vec<u64> {
        vec![self.length as u64, self.data as u64]
    }

    fn from_fields(fields: &[u64]) -> Self {
        Self {
            length: u32_at(fields, 0),
            data: u32_at(fields, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_well_formed() {
        for layout in [&OPEN_RESULT, &PROPERTIES, &BYTE_DATA] {
            assert!(layout.is_well_formed(), "{} is malformed", layout.name);
            assert_eq!(layout.version, ABI_VERSION);
        }
    }

    #[test]
    fn test_properties_offsets() {
        let expect = [
            ("duration_ms", 0),
            ("channels", 4),
            ("sample_rate", 8),
            ("bitrate", 12),
            ("bits_per_sample", 16),
            ("image_descs", 20),
            ("codec_name", 24),
        ];
        for (name, offset) in expect {
            let field = PROPERTIES.field(name).expect("missing field");
            assert_eq!(field.offset, offset, "{name}");
            assert_eq!(field.width, 4, "{name}");
        }
        assert_eq!(PROPERTIES.field("image_descs").unwrap().kind, FieldKind::Pointer);
        assert_eq!(PROPERTIES.size, 28);
    }

    #[test]
    fn test_properties_layout_round_trip() {
        let record = PropertiesRecord {
            duration_ms: 215_431,
            channels: 2,
            sample_rate: 44_100,
            bitrate: 1_411,
            bits_per_sample: 16,
            image_descs: 0x0001_2340,
            codec_name: 0,
        };
        let bytes = record.encode().unwrap();
        assert_eq!(bytes.len(), 28);
        // sample_rate at +8, little-endian
        assert_eq!(&bytes[8..12], &44_100u32.to_le_bytes());
        assert_eq!(PropertiesRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_open_result_format_is_one_byte() {
        let bytes = OpenResult { handle: 7, format: 3 }.encode().unwrap();
        assert_eq!(bytes, vec![7, 0, 0, 0, 3, 0, 0, 0]);

        // Bytes past the format byte are padding and ignored on decode.
        let mut noisy = bytes.clone();
        noisy[5] = 0xAA;
        assert_eq!(
            OpenResult::decode(&noisy).unwrap(),
            OpenResult { handle: 7, format: 3 }
        );
    }

    #[test]
    fn test_overflow_rejected() {
        let err = OPEN_RESULT.encode(&[1, 0x1FF]).unwrap_err();
        assert!(matches!(err, LayoutError::Overflow { field: "format", .. }));
    }

    #[test]
    fn test_truncated_and_field_count() {
        assert!(matches!(
            ByteData::decode(&[0u8; 7]),
            Err(LayoutError::Truncated { expected: 8, actual: 7, .. })
        ));
        assert!(matches!(
            BYTE_DATA.encode(&[1]),
            Err(LayoutError::FieldCount { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_layout_detected() {
        const OVERLAP: RecordLayout = RecordLayout {
            name: "Overlap",
            version: ABI_VERSION,
            size: 8,
            fields: &[FieldLayout::scalar("a", 0, 4), FieldLayout::scalar("b", 2, 4)],
        };
        const TOO_WIDE: RecordLayout = RecordLayout {
            name: "TooWide",
            version: ABI_VERSION,
            size: 4,
            fields: &[FieldLayout::scalar("a", 0, 8)],
        };
        assert!(!OVERLAP.is_well_formed());
        assert!(!TOO_WIDE.is_well_formed());
    }
}
