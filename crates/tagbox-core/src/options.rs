//! Open and write options passed across the boundary as plain integers.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Flags for tag and image writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WriteOptions(u8);

impl WriteOptions {
    /// Merge: keys in the new set replace existing ones, others are kept
    pub const NONE: WriteOptions = WriteOptions(0);
    /// Remove every existing entry that is not part of the new set
    pub const CLEAR: WriteOptions = WriteOptions(1 << 0);

    /// Build from raw bits, dropping unknown flags.
    pub fn from_bits(bits: u8) -> Self {
        WriteOptions(bits & Self::CLEAR.0)
    }

    /// Check if a flag is set
    pub fn contains(&self, other: WriteOptions) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Get raw flags
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for WriteOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        WriteOptions(self.0 | rhs.0)
    }
}

/// How much effort the parser spends on audio properties at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReadStyle {
    /// Read as little as possible; properties may be estimates
    Fast = 0,
    /// Balance between speed and accuracy
    #[default]
    Average = 1,
    /// Scan as much as needed for exact properties
    Accurate = 2,
}

impl ReadStyle {
    /// Decode an ABI value, falling back to [`ReadStyle::Average`].
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Fast,
            2 => Self::Accurate,
            _ => Self::Average,
        }
    }

    /// The ABI value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_option_flags() {
        let opts = WriteOptions::NONE | WriteOptions::CLEAR;
        assert!(opts.contains(WriteOptions::CLEAR));
        assert!(!WriteOptions::NONE.contains(WriteOptions::CLEAR));
        assert_eq!(opts.bits(), 1);
        assert_eq!(WriteOptions::from_bits(0xFF), WriteOptions::CLEAR);
    }

    #[test]
    fn test_read_style_codes() {
        assert_eq!(ReadStyle::default(), ReadStyle::Average);
        for style in [ReadStyle::Fast, ReadStyle::Average, ReadStyle::Accurate] {
            assert_eq!(ReadStyle::from_u8(style.as_u8()), style);
        }
        assert_eq!(ReadStyle::from_u8(9), ReadStyle::Average);
    }

    #[test]
    fn test_read_style_serde() {
        let json = serde_json::to_string(&ReadStyle::Accurate).unwrap();
        assert_eq!(json, "\"Accurate\"");
        let back: ReadStyle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReadStyle::Accurate);
    }
}
