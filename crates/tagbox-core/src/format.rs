//! Detected container/codec family of an open file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Container/codec family, detected once at open time and cached per handle.
///
/// The discriminants are part of the ABI: the guest writes them into the
/// `format` byte of an [`OpenResult`](crate::layout::OpenResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Format {
    /// Content was opened but the family is not one of the known ones
    #[default]
    Unknown = 0,
    /// MPEG audio (MP3, MP2)
    Mpeg = 1,
    /// MPEG-4 / iTunes (M4A, M4B, MP4)
    Mp4 = 2,
    /// Native FLAC
    Flac = 3,
    /// Ogg Vorbis
    OggVorbis = 4,
    /// Ogg Opus
    OggOpus = 5,
    /// FLAC in an Ogg container
    OggFlac = 6,
    /// Ogg Speex
    OggSpeex = 7,
    /// RIFF WAVE
    Wav = 8,
    /// AIFF / AIFF-C
    Aiff = 9,
    /// Advanced Systems Format (WMA)
    Asf = 10,
    /// Monkey's Audio
    Ape = 11,
    /// WavPack
    WavPack = 12,
    /// DSD stream file
    Dsf = 13,
    /// DSD interchange file format
    Dsdiff = 14,
    /// TrueAudio
    TrueAudio = 15,
    /// Musepack
    Mpc = 16,
    /// Shorten
    Shorten = 17,
}

/// Which native tag representation backs a format's raw tags.
///
/// This is the static dispatch table used for raw tag reads and writes:
/// the format is detected once and every later call switches on this
/// value instead of probing the parsed file again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeTags {
    /// ID3v2 frames keyed by frame id (`TIT2`, `TXXX:desc`, ...)
    Id3v2,
    /// iTunes atoms keyed by atom name (`©nam`, `trkn:num`, ...)
    Mp4,
    /// ASF attributes keyed by attribute name (`WM/AlbumTitle`, ...)
    Asf,
    /// No separate native representation; raw tags equal normalized tags
    Normalized,
}

impl Format {
    /// All formats in discriminant order.
    pub const ALL: [Format; 18] = [
        Format::Unknown,
        Format::Mpeg,
        Format::Mp4,
        Format::Flac,
        Format::OggVorbis,
        Format::OggOpus,
        Format::OggFlac,
        Format::OggSpeex,
        Format::Wav,
        Format::Aiff,
        Format::Asf,
        Format::Ape,
        Format::WavPack,
        Format::Dsf,
        Format::Dsdiff,
        Format::TrueAudio,
        Format::Mpc,
        Format::Shorten,
    ];

    /// Decode a format byte. Unknown codes map to [`Format::Unknown`].
    pub fn from_u8(code: u8) -> Self {
        Self::ALL
            .get(code as usize)
            .copied()
            .unwrap_or(Format::Unknown)
    }

    /// The ABI code of this format.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Mpeg => "MPEG",
            Self::Mp4 => "MP4",
            Self::Flac => "FLAC",
            Self::OggVorbis => "Ogg Vorbis",
            Self::OggOpus => "Ogg Opus",
            Self::OggFlac => "Ogg FLAC",
            Self::OggSpeex => "Ogg Speex",
            Self::Wav => "WAV",
            Self::Aiff => "AIFF",
            Self::Asf => "ASF",
            Self::Ape => "APE",
            Self::WavPack => "WavPack",
            Self::Dsf => "DSF",
            Self::Dsdiff => "DSDIFF",
            Self::TrueAudio => "TrueAudio",
            Self::Mpc => "MPC",
            Self::Shorten => "Shorten",
        }
    }

    /// Native tag representation used for raw tag access.
    pub fn native_tags(self) -> NativeTags {
        match self {
            Self::Mpeg | Self::Wav | Self::Aiff => NativeTags::Id3v2,
            Self::Mp4 => NativeTags::Mp4,
            Self::Asf => NativeTags::Asf,
            _ => NativeTags::Normalized,
        }
    }

    /// Codec name reported when the parsed properties do not name one.
    pub fn default_codec(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Mpeg => "MP3",
            Self::Mp4 => "AAC",
            Self::Flac | Self::OggFlac => "FLAC",
            Self::OggVorbis => "Vorbis",
            Self::OggOpus => "Opus",
            Self::OggSpeex => "Speex",
            Self::Wav | Self::Aiff => "PCM",
            Self::Asf => "WMA",
            Self::Ape => "Monkey's Audio",
            Self::WavPack => "WavPack",
            Self::Dsf | Self::Dsdiff => "DSD",
            Self::TrueAudio => "TTA",
            Self::Mpc => "Musepack",
            Self::Shorten => "Shorten",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<u8> for Format {
    fn from(code: u8) -> Self {
        Self::from_u8(code)
    }
}
