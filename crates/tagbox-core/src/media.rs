//! Audio properties and embedded image descriptors.

use crate::layout::PropertiesRecord;
use crate::rows::KEY_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata about an embedded image, without the image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageDesc {
    /// Picture type, e.g. "Front Cover"
    pub kind: String,
    /// Free-text description
    pub description: String,
    /// MIME type, e.g. "image/jpeg"; empty when unknown
    pub mime_type: String,
}

impl ImageDesc {
    /// Parse a `type\tdescription\tmime` row. Rows with fewer fields are rejected.
    pub fn from_row(row: &str) -> Option<Self> {
        let mut parts = row.splitn(3, KEY_SEPARATOR);
        let kind = parts.next()?;
        let description = parts.next()?;
        let mime_type = parts.next()?;
        Some(Self {
            kind: kind.to_string(),
            description: description.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    /// Render as a `type\tdescription\tmime` row.
    pub fn to_row(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.kind,
            self.description,
            self.mime_type,
            sep = KEY_SEPARATOR
        )
    }
}

/// Summary audio properties of an open file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Properties {
    /// Duration of the audio
    pub length: Duration,
    /// Number of channels
    pub channels: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bitrate in kbit/s
    pub bitrate: u32,
    /// Bit depth; 0 for formats without one
    pub bits_per_sample: u32,
    /// Codec name, e.g. "FLAC" or "ALAC"; empty when unknown
    pub codec: String,
    /// Every embedded image, in index order
    pub images: Vec<ImageDesc>,
}

impl Properties {
    /// Combine a decoded record with its already-decoded nested strings.
    pub fn from_record<S: AsRef<str>>(record: &PropertiesRecord, codec: String, image_rows: &[S]) -> Self {
        Self {
            length: Duration::from_millis(record.duration_ms as u64),
            channels: record.channels,
            sample_rate: record.sample_rate,
            bitrate: record.bitrate,
            bits_per_sample: record.bits_per_sample,
            codec,
            images: image_rows
                .iter()
                .filter_map(|row| ImageDesc::from_row(row.as_ref()))
                .collect(),
        }
    }
}

/// Sniff the MIME type of image bytes from their magic number.
///
/// Recognizes ICO, BMP, GIF, PNG, JPEG and WEBP.
pub fn detect_image_mime(data: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

    if data.len() < 2 {
        return None;
    }
    if data.starts_with(b"\x00\x00\x01\x00") || data.starts_with(b"\x00\x00\x02\x00") {
        Some("image/x-icon")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.starts_with(PNG) {
        Some("image/png")
    } else if data.starts_with(b"\xFF\xD8\xFF") {
        Some("image/jpeg")
    } else if data.len() >= 14 && data.starts_with(b"RIFF") && &data[8..14] == b"WEBPVP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_desc_row() {
        let desc = ImageDesc::from_row("Front Cover\tcover art\timage/png").unwrap();
        assert_eq!(desc.kind, "Front Cover");
        assert_eq!(desc.description, "cover art");
        assert_eq!(desc.mime_type, "image/png");
        assert_eq!(desc.to_row(), "Front Cover\tcover art\timage/png");

        // Empty description is still three fields
        assert!(ImageDesc::from_row("Back Cover\t\timage/jpeg").is_some());
        assert!(ImageDesc::from_row("Front Cover\tno mime").is_none());
    }

    #[test]
    fn test_properties_from_record() {
        let record = PropertiesRecord {
            duration_ms: 1_500,
            channels: 2,
            sample_rate: 48_000,
            bitrate: 320,
            bits_per_sample: 24,
            image_descs: 0,
            codec_name: 0,
        };
        let props = Properties::from_record(&record, "FLAC".into(), &["Front Cover\t\timage/png", "broken"]);
        assert_eq!(props.length, Duration::from_millis(1_500));
        assert_eq!(props.sample_rate, 48_000);
        assert_eq!(props.bits_per_sample, 24);
        assert_eq!(props.codec, "FLAC");
        assert_eq!(props.images.len(), 1);
    }

    #[test]
    fn test_detect_image_mime() {
        assert_eq!(detect_image_mime(b"\x89PNG\r\n\x1a\n\0\0"), Some("image/png"));
        assert_eq!(detect_image_mime(b"\xFF\xD8\xFF\xE0"), Some("image/jpeg"));
        assert_eq!(detect_image_mime(b"GIF89a..."), Some("image/gif"));
        assert_eq!(detect_image_mime(b"BM\0\0"), Some("image/bmp"));
        assert_eq!(detect_image_mime(b"\x00\x00\x01\x00\x01"), Some("image/x-icon"));
        assert_eq!(detect_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(detect_image_mime(b"RIFF\0\0\0\0WAVEfmt "), None);
        assert_eq!(detect_image_mime(b"x"), None);
        assert_eq!(detect_image_mime(b"plain text"), None);
    }
}
