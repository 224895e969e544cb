//! Open media files and the mapping between lofty and the row convention.
//!
//! Format is resolved once at open time from the parser lofty selected and
//! cached on the [`Media`] entry; raw tag access and property extraction
//! dispatch on it.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use lofty::config::{ParseOptions, ParsingMode, WriteOptions as SaveOptions};
use lofty::error::LoftyError;
use lofty::file::{AudioFile, FileType, TaggedFile, TaggedFileExt};
use lofty::id3::v2::Id3v2Tag;
use lofty::iff::wav::{WavFile, WavFormat};
use lofty::mp4::{Mp4Codec, Mp4File};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, ItemValue, Tag, TagExt, TagItem, TagType};

use tagbox_core::rows::{row, split_row};
use tagbox_core::{BufferedStream, Format, ImageDesc, NativeTags, PropertiesRecord, ReadStyle, WriteOptions};

use crate::host::HostStream;

/// Picture type names, indexed by ID3v2 APIC type code.
const PICTURE_TYPES: [&str; 21] = [
    "Other",
    "File Icon",
    "Other File Icon",
    "Front Cover",
    "Back Cover",
    "Leaflet Page",
    "Media",
    "Lead Artist",
    "Artist",
    "Conductor",
    "Band",
    "Composer",
    "Lyricist",
    "Recording Location",
    "During Recording",
    "During Performance",
    "Movie Screen Capture",
    "Coloured Fish",
    "Illustration",
    "Band Logo",
    "Publisher Logo",
];

/// Mean and prefix of iTunes freeform atoms, where MP4 keeps custom keys.
const MP4_FREEFORM: &str = "----:com.apple.iTunes:";

/// Where the bytes of an open file come from.
pub enum Origin {
    /// A file under the preopened directory; writable if the mount is
    Path(PathBuf),
    /// A host stream; read-only
    Stream(BufferedStream<HostStream>),
}

/// One open file: parsed tags and properties plus where they came from.
pub struct Media {
    file: TaggedFile,
    format: Format,
    codec: Option<String>,
    origin: Origin,
}

/// Map lofty's selected parser to a format code.
pub fn format_of(file_type: FileType) -> Format {
    match file_type {
        FileType::Mpeg | FileType::Aac => Format::Mpeg,
        FileType::Mp4 => Format::Mp4,
        FileType::Flac => Format::Flac,
        FileType::Vorbis => Format::OggVorbis,
        FileType::Opus => Format::OggOpus,
        FileType::Speex => Format::OggSpeex,
        FileType::Wav => Format::Wav,
        FileType::Aiff => Format::Aiff,
        FileType::Ape => Format::Ape,
        FileType::WavPack => Format::WavPack,
        FileType::Mpc => Format::Mpc,
        _ => Format::Unknown,
    }
}

/// Parser strictness for a read style.
pub fn parse_options(style: ReadStyle) -> ParseOptions {
    let mode = match style {
        ReadStyle::Fast => ParsingMode::Relaxed,
        ReadStyle::Average => ParsingMode::BestAttempt,
        ReadStyle::Accurate => ParsingMode::Strict,
    };
    ParseOptions::new().parsing_mode(mode).read_properties(true)
}

/// Display name of a picture type.
pub fn picture_type_name(kind: PictureType) -> &'static str {
    PICTURE_TYPES
        .get(kind.as_u8() as usize)
        .copied()
        .unwrap_or("Other")
}

/// Picture type for a display name; unknown names map to "Other".
pub fn picture_type_from_name(name: &str) -> PictureType {
    PICTURE_TYPES
        .iter()
        .position(|&n| n.eq_ignore_ascii_case(name))
        .map(|code| PictureType::from_u8(code as u8))
        .unwrap_or(PictureType::Other)
}

/// Key used in rows for an item, in the naming scheme of `naming`.
///
/// MP4 keeps number and total of `trkn`/`disk` in one atom; they are split
/// into `:num` and `:total` keys, and a total only appears when stored.
/// Normalized names drop the freeform prefix of custom MP4 keys.
pub fn row_key(key: &ItemKey, naming: TagType) -> Option<String> {
    if naming == TagType::Mp4Ilst {
        let pair = match key {
            ItemKey::TrackNumber => Some("trkn:num"),
            ItemKey::TrackTotal => Some("trkn:total"),
            ItemKey::DiscNumber => Some("disk:num"),
            ItemKey::DiscTotal => Some("disk:total"),
            _ => None,
        };
        if let Some(pair) = pair {
            return Some(pair.to_string());
        }
    }
    let mapped = key.map_key(naming, true)?;
    if naming == TagType::VorbisComments {
        let mapped = mapped.strip_prefix(MP4_FREEFORM).unwrap_or(mapped);
        return Some(mapped.to_ascii_uppercase());
    }
    Some(mapped.to_string())
}

/// Item key a row key is stored under in a tag of `tag_type`.
fn storage_key(tag_type: TagType, key: &str, naming: TagType) -> ItemKey {
    match ItemKey::from_key(naming, key) {
        ItemKey::Unknown(custom) if tag_type == TagType::Mp4Ilst && !custom.starts_with("----:") => {
            ItemKey::Unknown(format!("{MP4_FREEFORM}{custom}"))
        }
        other => other,
    }
}

/// One row per text value, in tag order. Empty values are skipped, which
/// also hides the empty encoder item lofty makes of a Vorbis vendor string.
pub fn tag_rows(tag: &Tag, naming: TagType) -> Vec<String> {
    let mut rows = Vec::new();
    for item in tag.items() {
        let Some(key) = row_key(item.key(), naming) else {
            continue;
        };
        let (ItemValue::Text(text) | ItemValue::Locator(text)) = item.value() else {
            continue;
        };
        // ID3v2.4 keeps several values in one frame, NUL-separated
        rows.extend(
            text.split('\0')
                .filter(|value| !value.is_empty())
                .map(|value| row(&key, &[value])),
        );
    }
    rows
}

/// Apply write rows to `tag`: each row replaces its key, an empty row
/// erases it, and `CLEAR` first drops every item. Pictures are kept.
pub fn apply_rows(tag: &mut Tag, rows: &[String], options: WriteOptions, naming: TagType) {
    if options.contains(WriteOptions::CLEAR) {
        let keys: Vec<ItemKey> = tag.items().map(|item| item.key().clone()).collect();
        for key in keys {
            tag.remove_key(&key);
        }
    }

    for r in rows {
        let Some((key, values)) = split_row(r) else {
            continue;
        };
        let item_key = storage_key(tag.tag_type(), key, naming);
        tag.remove_key(&item_key);
        for value in values {
            let item = TagItem::new(item_key.clone(), ItemValue::Text(value.to_string()));
            // Custom keys have no mapping to check against
            if matches!(item_key, ItemKey::Unknown(_)) {
                tag.push_unchecked(item);
            } else if !tag.push(item) {
                tracing::debug!(key, tag_type = ?tag.tag_type(), "key not representable");
            }
        }
    }
}

/// Lay a generic tag out the way ID3v2 stores it: one frame per key with
/// NUL-separated values, and custom keys as TXXX frames.
pub fn to_id3v2(tag: &Tag) -> Id3v2Tag {
    let mut frames = Tag::new(TagType::Id3v2);
    let mut grouped: Vec<(ItemKey, Vec<&str>)> = Vec::new();
    for item in tag.items() {
        match item.value() {
            ItemValue::Text(text) => match grouped.iter_mut().find(|(key, _)| key == item.key()) {
                Some((_, values)) => values.push(text.as_str()),
                None => grouped.push((item.key().clone(), vec![text.as_str()])),
            },
            _ => frames.push_unchecked(item.clone()),
        }
    }
    for picture in tag.pictures() {
        frames.push_picture(picture.clone());
    }

    let mut user_text = Vec::new();
    for (key, values) in grouped {
        let joined = values.join("\0");
        match key {
            ItemKey::Unknown(description) if !is_text_frame_id(&description) => {
                user_text.push((description, joined));
            }
            key => frames.push_unchecked(TagItem::new(key, ItemValue::Text(joined))),
        }
    }

    let mut id3v2 = Id3v2Tag::from(frames);
    for (description, content) in user_text {
        id3v2.insert_user_text(description, content);
    }
    id3v2
}

fn is_text_frame_id(key: &str) -> bool {
    key.len() == 4
        && key.starts_with('T')
        && key.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn mp4_codec_name(codec: &Mp4Codec) -> Option<String> {
    let name = match codec {
        Mp4Codec::AAC => "AAC",
        Mp4Codec::ALAC => "ALAC",
        Mp4Codec::MP3 => "MP3",
        Mp4Codec::FLAC => "FLAC",
        _ => return None,
    };
    Some(name.to_string())
}

fn wav_codec_name(format: &WavFormat) -> Option<String> {
    match format {
        WavFormat::PCM => Some("PCM".to_string()),
        WavFormat::IEEE_FLOAT => Some("IEEE Float".to_string()),
        WavFormat::Other(code) => Some(format!("WAVE format {code:#06x}")),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Detect the format and parse. Containers whose codec varies are parsed
/// through their concrete file type so the codec can be read off its
/// properties; `hint` is used only when sniffing finds nothing.
fn read_media<R: Read + Seek>(
    reader: &mut R,
    hint: Option<FileType>,
    style: ReadStyle,
) -> Result<(TaggedFile, Option<String>), LoftyError> {
    let options = parse_options(style);
    let file_type = Probe::new(&mut *reader).guess_file_type()?.file_type().or(hint);
    reader.rewind()?;

    Ok(match file_type {
        Some(FileType::Mp4) => {
            let file = Mp4File::read_from(reader, options)?;
            let codec = mp4_codec_name(file.properties().codec());
            (file.into(), codec)
        }
        Some(FileType::Wav) => {
            let file = WavFile::read_from(reader, options)?;
            let codec = wav_codec_name(file.properties().format());
            (file.into(), codec)
        }
        Some(file_type) => {
            let codec = (file_type == FileType::Aac).then(|| "AAC".to_string());
            let file = Probe::with_file_type(reader, file_type).options(options).read()?;
            (file, codec)
        }
        // Reports the unknown format
        None => (Probe::new(reader).options(options).read()?, None),
    })
}

impl Media {
    /// Parse a file under the preopened directory.
    pub fn open_path(path: &Path, style: ReadStyle) -> Option<Self> {
        let file = File::open(path)
            .map_err(|e| tracing::debug!(path = %path.display(), error = %e, "open failed"))
            .ok()?;
        let (file, codec) = read_media(&mut BufReader::new(file), None, style)
            .map_err(|e| tracing::debug!(path = %path.display(), error = %e, "parse failed"))
            .ok()?;
        Some(Self::new(file, codec, Origin::Path(path.to_path_buf())))
    }

    /// Parse a host stream. `name` is consulted only when sniffing fails.
    pub fn open_stream(stream_id: u32, name: &str, style: ReadStyle) -> Option<Self> {
        let mut stream = BufferedStream::new(HostStream::new(stream_id));
        let hint = Path::new(name).extension().and_then(FileType::from_ext);
        let (file, codec) = read_media(&mut stream, hint, style)
            .map_err(|e| tracing::debug!(stream_id, error = %e, "parse failed"))
            .ok()?;
        Some(Self::new(file, codec, Origin::Stream(stream)))
    }

    fn new(file: TaggedFile, codec: Option<String>, origin: Origin) -> Self {
        let format = format_of(file.file_type());
        Self {
            file,
            format,
            codec,
            origin,
        }
    }

    /// Format detected at open time.
    pub fn format(&self) -> Format {
        self.format
    }

    /// True for stream-backed files.
    pub fn is_stream(&self) -> bool {
        matches!(self.origin, Origin::Stream(_))
    }

    fn main_tag(&self) -> Option<&Tag> {
        self.file.primary_tag().or_else(|| self.file.first_tag())
    }

    /// Normalized rows (TITLE, ARTIST, ...).
    pub fn tag_rows(&self) -> Vec<String> {
        self.main_tag()
            .map(|tag| tag_rows(tag, TagType::VorbisComments))
            .unwrap_or_default()
    }

    /// Format-native rows, or the normalized rows for formats without a
    /// separate native representation.
    pub fn raw_rows(&self) -> Vec<String> {
        let naming = match self.format.native_tags() {
            NativeTags::Id3v2 => TagType::Id3v2,
            NativeTags::Mp4 => TagType::Mp4Ilst,
            NativeTags::Asf | NativeTags::Normalized => return self.tag_rows(),
        };
        self.file
            .tag(naming)
            .map(|tag| tag_rows(tag, naming))
            .unwrap_or_default()
    }

    /// ID3v1 fields of an MPEG file, in fixed order.
    pub fn id3v1_rows(&self) -> Vec<String> {
        let mut rows = Vec::new();
        if self.format != Format::Mpeg {
            return rows;
        }
        let Some(tag) = self.file.tag(TagType::Id3v1) else {
            return rows;
        };

        if let Some(v) = tag.title() {
            rows.push(row("TITLE", &[v]));
        }
        if let Some(v) = tag.artist() {
            rows.push(row("ARTIST", &[v]));
        }
        if let Some(v) = tag.album() {
            rows.push(row("ALBUM", &[v]));
        }
        if let Some(year) = tag.year().filter(|&y| y > 0) {
            rows.push(row("YEAR", &[year.to_string()]));
        }
        if let Some(v) = tag.comment() {
            rows.push(row("COMMENT", &[v]));
        }
        if let Some(track) = tag.track().filter(|&t| t > 0) {
            rows.push(row("TRACK", &[track.to_string()]));
        }
        if let Some(v) = tag.genre() {
            rows.push(row("GENRE", &[v]));
        }
        rows
    }

    fn pictures(&self) -> &[Picture] {
        self.main_tag().map(|tag| tag.pictures()).unwrap_or(&[])
    }

    /// Descriptor rows (`type\tdescription\tmime`) of embedded pictures.
    pub fn image_rows(&self) -> Vec<String> {
        self.pictures()
            .iter()
            .map(|p| {
                ImageDesc {
                    kind: picture_type_name(p.pic_type()).to_string(),
                    description: p.description().unwrap_or_default().to_string(),
                    mime_type: p.mime_type().map(MimeType::as_str).unwrap_or_default().to_string(),
                }
                .to_row()
            })
            .collect()
    }

    /// Bytes of the picture at `index`, if any.
    pub fn image(&self, index: usize) -> Option<&[u8]> {
        self.pictures().get(index).map(Picture::data)
    }

    /// Numeric properties; the pointer fields are left null.
    pub fn properties(&self) -> PropertiesRecord {
        let props = self.file.properties();
        PropertiesRecord {
            duration_ms: u32::try_from(props.duration().as_millis()).unwrap_or(u32::MAX),
            channels: props.channels().map(u32::from).unwrap_or(0),
            sample_rate: props.sample_rate().unwrap_or(0),
            bitrate: props.audio_bitrate().or(props.overall_bitrate()).unwrap_or(0),
            bits_per_sample: props.bit_depth().map(u32::from).unwrap_or(0),
            image_descs: 0,
            codec_name: 0,
        }
    }

    /// Codec named by the parsed properties, else the format's usual one.
    pub fn codec(&self) -> &str {
        self.codec
            .as_deref()
            .unwrap_or_else(|| self.format.default_codec())
    }

    /// Write normalized rows.
    pub fn write_tags(&mut self, rows: &[String], options: WriteOptions) -> bool {
        let tag_type = self.file.primary_tag_type();
        self.write_rows(tag_type, rows, options, TagType::VorbisComments)
    }

    /// Write ID3v2 frame rows. Only MPEG files accept this.
    pub fn write_raw_tags(&mut self, rows: &[String], options: WriteOptions) -> bool {
        if self.format != Format::Mpeg {
            return false;
        }
        self.write_rows(TagType::Id3v2, rows, options, TagType::Id3v2)
    }

    fn write_rows(&mut self, tag_type: TagType, rows: &[String], options: WriteOptions, naming: TagType) -> bool {
        if self.is_stream() {
            return false;
        }
        let Some(tag) = self.tag_mut(tag_type) else {
            return false;
        };
        apply_rows(tag, rows, options, naming);
        self.save()
    }

    /// Replace, append or (with empty `data`) remove the picture at `index`.
    pub fn write_image(&mut self, data: &[u8], index: usize, kind: &str, description: &str, mime: &str) -> bool {
        if self.is_stream() {
            return false;
        }
        let tag_type = self.file.primary_tag_type();
        let Some(tag) = self.tag_mut(tag_type) else {
            return false;
        };

        let count = tag.pictures().len();
        if data.is_empty() {
            if index < count {
                tag.remove_picture(index);
            }
        } else {
            let picture = Picture::new_unchecked(
                picture_type_from_name(kind),
                (!mime.is_empty()).then(|| MimeType::from_str(mime)),
                (!description.is_empty()).then(|| description.to_string()),
                data.to_vec(),
            );
            if index < count {
                tag.set_picture(index, picture);
            } else {
                tag.push_picture(picture);
            }
        }
        self.save()
    }

    fn tag_mut(&mut self, tag_type: TagType) -> Option<&mut Tag> {
        if self.file.tag(tag_type).is_none() {
            self.file.insert_tag(Tag::new(tag_type));
        }
        self.file.tag_mut(tag_type)
    }

    fn save(&mut self) -> bool {
        let Origin::Path(path) = &self.origin else {
            return false;
        };
        // The generic writer keeps one value per ID3v2 frame and drops
        // custom keys, so ID3v2 is written from its own layout
        let result = match self.file.tag(TagType::Id3v2) {
            Some(tag) if self.file.primary_tag_type() == TagType::Id3v2 => {
                to_id3v2(tag).save_to_path(path, SaveOptions::default())
            }
            _ => self.file.save_to_path(path, SaveOptions::default()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "save failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbox_core::rows::{decode_rows, encode_rows};
    use tagbox_core::Tags;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR fake png body";
    const JPEG: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF fake jpeg body";

    fn tags(pairs: &[(&str, &[&str])]) -> Tags {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    /// One second of 16-bit stereo FLAC at 44.1 kHz: STREAMINFO, a padding
    /// block and the start of an audio frame.
    fn flac_fixture() -> Vec<u8> {
        let mut out = b"fLaC".to_vec();
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x22]);
        out.extend_from_slice(&4096u16.to_be_bytes());
        out.extend_from_slice(&4096u16.to_be_bytes());
        out.extend_from_slice(&[0; 6]);
        let packed: u64 = (44_100u64 << 44) | (1 << 41) | (15 << 36) | 44_100;
        out.extend_from_slice(&packed.to_be_bytes());
        out.extend_from_slice(&[0; 16]);
        // Last block: 1 KiB of padding
        out.extend_from_slice(&[0x81, 0x00, 0x04, 0x00]);
        out.extend_from_slice(&[0; 1024]);
        out.extend_from_slice(&[0xff, 0xf8, 0x69, 0x08, 0x00, 0x00]);
        out.extend_from_slice(&[0; 256]);
        out
    }

    /// Twenty MPEG-1 Layer III frames, 128 kbit/s, 44.1 kHz stereo.
    fn mp3_fixture() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xff, 0xfb, 0x90, 0x00]);
        frame.repeat(20)
    }

    /// 10 ms of silent stereo WAVE with the given format tag.
    fn wav_fixture(format_tag: u16, bits: u16) -> Vec<u8> {
        let channels = 2u16;
        let rate = 44_100u32;
        let block_align = channels * bits / 8;
        let data = vec![0u8; block_align as usize * 441];

        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(4 + 8 + 16 + 8 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&format_tag.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    fn fixture_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).expect("failed to write fixture");
        path
    }

    fn open(path: &Path) -> Media {
        Media::open_path(path, ReadStyle::Average).expect("failed to open fixture")
    }

    fn write_and_read(path: &Path, written: &Tags) -> Tags {
        let mut media = open(path);
        assert!(media.write_tags(&encode_rows(written), WriteOptions::CLEAR));
        decode_rows(open(path).tag_rows())
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(format_of(FileType::Flac), Format::Flac);
        assert_eq!(format_of(FileType::Mpeg), Format::Mpeg);
        assert_eq!(format_of(FileType::Vorbis), Format::OggVorbis);
        assert_eq!(format_of(FileType::Opus), Format::OggOpus);
        assert_eq!(format_of(FileType::Mp4), Format::Mp4);
    }

    #[test]
    fn test_picture_type_names() {
        assert_eq!(picture_type_name(PictureType::CoverFront), "Front Cover");
        assert_eq!(picture_type_name(PictureType::CoverBack), "Back Cover");
        assert_eq!(picture_type_from_name("Front Cover"), PictureType::CoverFront);
        assert_eq!(picture_type_from_name("front cover"), PictureType::CoverFront);
        assert_eq!(picture_type_from_name("nonsense"), PictureType::Other);
    }

    #[test]
    fn test_mp4_number_pairs() {
        assert_eq!(row_key(&ItemKey::TrackNumber, TagType::Mp4Ilst).as_deref(), Some("trkn:num"));
        assert_eq!(row_key(&ItemKey::DiscTotal, TagType::Mp4Ilst).as_deref(), Some("disk:total"));
        assert_eq!(row_key(&ItemKey::TrackTitle, TagType::VorbisComments).as_deref(), Some("TITLE"));
    }

    #[test]
    fn test_apply_rows_replace_and_erase() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.push(TagItem::new(ItemKey::TrackTitle, ItemValue::Text("Old".into())));
        tag.push(TagItem::new(ItemKey::AlbumTitle, ItemValue::Text("Album".into())));

        let rows = vec!["TITLE\tNew".to_string(), "ALBUM\t".to_string(), "ARTIST\tA\u{0B}B".to_string()];
        apply_rows(&mut tag, &rows, WriteOptions::NONE, TagType::VorbisComments);

        let out = tag_rows(&tag, TagType::VorbisComments);
        assert!(out.contains(&"TITLE\tNew".to_string()));
        assert!(out.contains(&"ARTIST\tA".to_string()));
        assert!(out.contains(&"ARTIST\tB".to_string()));
        assert!(!out.iter().any(|r| r.starts_with("ALBUM\t")));
    }

    #[test]
    fn test_apply_rows_clear() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.push(TagItem::new(ItemKey::Genre, ItemValue::Text("Jazz".into())));

        let rows = vec!["TITLE\tOnly".to_string()];
        apply_rows(&mut tag, &rows, WriteOptions::CLEAR, TagType::VorbisComments);

        assert_eq!(tag_rows(&tag, TagType::VorbisComments), vec!["TITLE\tOnly".to_string()]);
    }

    #[test]
    fn test_custom_keys_kept_in_every_tag_type() {
        let rows = vec!["MYCUSTOM\tx\u{0B}y".to_string(), "ONE\tone".to_string(), "TITLE\tT".to_string()];
        let expected = tags(&[("MYCUSTOM", &["x", "y"]), ("ONE", &["one"]), ("TITLE", &["T"])]);

        for tag_type in [TagType::VorbisComments, TagType::Id3v2, TagType::Mp4Ilst, TagType::Ape] {
            let mut tag = Tag::new(tag_type);
            apply_rows(&mut tag, &rows, WriteOptions::CLEAR, TagType::VorbisComments);
            assert_eq!(decode_rows(tag_rows(&tag, TagType::VorbisComments)), expected, "{tag_type:?}");
        }
    }

    #[test]
    fn test_mp4_custom_keys_are_freeform() {
        let mut tag = Tag::new(TagType::Mp4Ilst);
        apply_rows(&mut tag, &["ONE\tone".to_string()], WriteOptions::NONE, TagType::VorbisComments);
        assert_eq!(
            tag_rows(&tag, TagType::Mp4Ilst),
            vec!["----:com.apple.iTunes:ONE\tone".to_string()]
        );
    }

    #[test]
    fn test_empty_and_nul_separated_values() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.push(TagItem::new(ItemKey::EncoderSoftware, ItemValue::Text(String::new())));
        tag.push_unchecked(TagItem::new(
            ItemKey::Unknown("MULTI".into()),
            ItemValue::Text("a\0b\0".into()),
        ));
        assert_eq!(
            tag_rows(&tag, TagType::VorbisComments),
            vec!["MULTI\ta".to_string(), "MULTI\tb".to_string()]
        );
    }

    #[test]
    fn test_id3v2_layout_groups_values() {
        let mut tag = Tag::new(TagType::Id3v2);
        let written = tags(&[("ARTIST", &["A", "B"]), ("FIVE", &["six", "seven"]), ("ONE", &["one"])]);
        apply_rows(&mut tag, &encode_rows(&written), WriteOptions::CLEAR, TagType::VorbisComments);

        let back = Tag::from(to_id3v2(&tag));
        assert_eq!(decode_rows(tag_rows(&back, TagType::VorbisComments)), written);
    }

    #[test]
    fn test_text_frame_ids() {
        assert!(is_text_frame_id("TPE1"));
        assert!(is_text_frame_id("TXXX"));
        assert!(!is_text_frame_id("FIVE"));
        assert!(!is_text_frame_id("ONE"));
        assert!(!is_text_frame_id("Tpe1"));
    }

    // ========================================================================
    // Files on disk
    // ========================================================================

    #[test]
    fn test_flac_clear_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = fixture_file(&dir, "a.flac", &flac_fixture());

        let custom = tags(&[
            ("ONE", &["one", "two", "three", "four"]),
            ("FIVE", &["six", "seven"]),
            ("NINE", &["nine"]),
        ]);
        assert_eq!(write_and_read(&path, &custom), custom);

        let named = tags(&[("ARTIST", &["Example A", "Hello, 世界"]), ("ALUMARTIST", &["Example"])]);
        assert_eq!(write_and_read(&path, &named), named);

        assert_eq!(write_and_read(&path, &Tags::new()), Tags::new());
    }

    #[test]
    fn test_flac_merge_write() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = fixture_file(&dir, "b.flac", &flac_fixture());
        write_and_read(&path, &tags(&[("TITLE", &["T"]), ("ALBUM", &["A"])]));

        let mut media = open(&path);
        let rows = encode_rows(&tags(&[("ALBUM", &[]), ("ONE", &["one"])]));
        assert!(media.write_tags(&rows, WriteOptions::NONE));
        assert_eq!(
            decode_rows(open(&path).tag_rows()),
            tags(&[("ONE", &["one"]), ("TITLE", &["T"])])
        );
    }

    #[test]
    fn test_mp3_multiple_values_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = fixture_file(&dir, "c.mp3", &mp3_fixture());

        let written = tags(&[
            ("ARTIST", &["A", "B"]),
            ("ALUMARTIST", &["Example"]),
            ("FIVE", &["six", "seven"]),
        ]);
        assert_eq!(write_and_read(&path, &written), written);

        let raw = open(&path).raw_rows();
        assert!(raw.contains(&"TPE1\tA".to_string()));
        assert!(raw.contains(&"TPE1\tB".to_string()));

        // A merge write keeps both values of untouched keys
        let mut media = open(&path);
        assert!(media.write_tags(&encode_rows(&tags(&[("TITLE", &["T"])])), WriteOptions::NONE));
        let read = decode_rows(open(&path).tag_rows());
        assert_eq!(read.get("ARTIST"), Some(&vec!["A".to_string(), "B".to_string()]));
        assert_eq!(read.get("FIVE"), Some(&vec!["six".to_string(), "seven".to_string()]));
        assert_eq!(read.get("TITLE"), Some(&vec!["T".to_string()]));
    }

    #[test]
    fn test_flac_image_slots() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = fixture_file(&dir, "d.flac", &flac_fixture());

        assert!(open(&path).write_image(PNG, 0, "Front Cover", "", "image/png"));
        assert!(open(&path).write_image(JPEG, 1, "Back Cover", "back", "image/jpeg"));
        let media = open(&path);
        assert_eq!(
            media.image_rows(),
            vec!["Front Cover\t\timage/png".to_string(), "Back Cover\tback\timage/jpeg".to_string()]
        );
        assert_eq!(media.image(1), Some(JPEG));

        assert!(open(&path).write_image(JPEG, 0, "Front Cover", "new front", "image/jpeg"));
        let media = open(&path);
        assert_eq!(media.image_rows()[0], "Front Cover\tnew front\timage/jpeg");
        assert_eq!(media.image_rows()[1], "Back Cover\tback\timage/jpeg");

        assert!(open(&path).write_image(&[], 1, "", "", ""));
        assert!(open(&path).write_image(&[], 0, "", "", ""));
        assert!(open(&path).image_rows().is_empty());
        assert_eq!(open(&path).image(0), None);
    }

    #[test]
    fn test_codec_from_properties() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let cases: [(&str, Vec<u8>, &str); 4] = [
            ("a.flac", flac_fixture(), "FLAC"),
            ("b.mp3", mp3_fixture(), "MP3"),
            ("c.wav", wav_fixture(1, 16), "PCM"),
            ("d.wav", wav_fixture(3, 32), "IEEE Float"),
        ];
        for (name, bytes, codec) in cases {
            let media = open(&fixture_file(&dir, name, &bytes));
            assert_eq!(media.codec(), codec, "{name}");
        }
    }

    #[test]
    fn test_non_media_file_is_rejected() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = fixture_file(&dir, "notes.flac", b"not a file");
        assert!(Media::open_path(&path, ReadStyle::Average).is_none());
    }
}
