//! Exported entry points.
//!
//! Every open file lives in a per-instance [`HandleTable`]. Failures are
//! reported only through sentinels: a null pointer for "not a media file"
//! or "no such handle", `false` for a failed write, and empty (but
//! non-null) arrays or buffers for absent data.

use std::cell::RefCell;
use std::path::Path;

use tagbox_core::{ByteData, HandleTable, OpenResult, ReadStyle, WriteOptions};

use crate::media::Media;
use crate::memory::{self, leak_bytes, write_cstring, write_record, write_rows};

thread_local! {
    static FILES: RefCell<HandleTable<Media>> = RefCell::new(HandleTable::new());
}

fn with_media<T>(handle: u32, f: impl FnOnce(&mut Media) -> T) -> Option<T> {
    FILES.with(|files| files.borrow_mut().get_mut(handle).map(f))
}

fn register(media: Media) -> u32 {
    let format = media.format().as_u8();
    let Some(handle) = FILES.with(|files| files.borrow_mut().insert(media)) else {
        tracing::error!("handle space exhausted");
        return 0;
    };
    write_record(&OpenResult { handle, format })
}

fn rows_or_null(rows: Option<Vec<String>>) -> u32 {
    rows.map(|rows| write_rows(&rows)).unwrap_or(0)
}

// =============================================================================
// Open / Close
// =============================================================================

/// Open a file under the preopened directory.
///
/// # Safety
/// `path` must be a NUL-terminated string written by the host.
#[no_mangle]
pub unsafe extern "C" fn tagbox_file_open(path: u32, read_style: u8) -> u32 {
    let Some(path) = memory::read_str(path) else {
        return 0;
    };
    match Media::open_path(Path::new(path), ReadStyle::from_u8(read_style)) {
        Some(media) => register(media),
        None => 0,
    }
}

/// Open a host-registered stream; `name` is a file name hint.
///
/// # Safety
/// `name` must be null or a NUL-terminated string written by the host.
#[no_mangle]
pub unsafe extern "C" fn tagbox_stream_open(stream_id: u32, name: u32, read_style: u8) -> u32 {
    let name = memory::read_str(name).unwrap_or_default();
    match Media::open_stream(stream_id, name, ReadStyle::from_u8(read_style)) {
        Some(media) => register(media),
        None => 0,
    }
}

/// Release a handle. Unknown or already closed handles are ignored.
#[no_mangle]
pub extern "C" fn tagbox_handle_close(handle: u32) -> bool {
    FILES.with(|files| files.borrow_mut().remove(handle).is_some())
}

// =============================================================================
// Reads
// =============================================================================

/// Normalized tag rows.
#[no_mangle]
pub extern "C" fn tagbox_handle_tags(handle: u32) -> u32 {
    rows_or_null(with_media(handle, |media| media.tag_rows()))
}

/// Format-native tag rows.
#[no_mangle]
pub extern "C" fn tagbox_handle_raw_tags(handle: u32) -> u32 {
    rows_or_null(with_media(handle, |media| media.raw_rows()))
}

/// ID3v1 rows; empty for anything but MPEG.
#[no_mangle]
pub extern "C" fn tagbox_handle_id3v1_tags(handle: u32) -> u32 {
    rows_or_null(with_media(handle, |media| media.id3v1_rows()))
}

/// Properties record with image descriptors and codec name.
#[no_mangle]
pub extern "C" fn tagbox_handle_properties(handle: u32) -> u32 {
    with_media(handle, |media| {
        let mut record = media.properties();
        record.image_descs = write_rows(&media.image_rows());
        record.codec_name = write_cstring(media.codec());
        write_record(&record)
    })
    .unwrap_or(0)
}

/// Picture bytes at `index`; a zero-length buffer when there is none.
#[no_mangle]
pub extern "C" fn tagbox_handle_image(handle: u32, index: i32) -> u32 {
    with_media(handle, |media| {
        let bytes = usize::try_from(index)
            .ok()
            .and_then(|i| media.image(i))
            .unwrap_or_default();
        let data = ByteData {
            length: bytes.len() as u32,
            data: leak_bytes(bytes.to_vec()),
        };
        write_record(&data)
    })
    .unwrap_or(0)
}

// =============================================================================
// Writes
// =============================================================================

/// Write normalized rows.
///
/// # Safety
/// `rows` must be a pointer array written by the host.
#[no_mangle]
pub unsafe extern "C" fn tagbox_handle_write_tags(handle: u32, rows: u32, options: u8) -> bool {
    let rows = memory::read_rows(rows);
    with_media(handle, |media| media.write_tags(&rows, WriteOptions::from_bits(options))).unwrap_or(false)
}

/// Write ID3v2 frame rows (MPEG only).
///
/// # Safety
/// `rows` must be a pointer array written by the host.
#[no_mangle]
pub unsafe extern "C" fn tagbox_handle_write_raw_tags(handle: u32, rows: u32, options: u8) -> bool {
    let rows = memory::read_rows(rows);
    with_media(handle, |media| media.write_raw_tags(&rows, WriteOptions::from_bits(options)))
        .unwrap_or(false)
}

/// Write, replace or remove the picture at `index`.
///
/// # Safety
/// `data` must point at `len` bytes and the three strings must be
/// NUL-terminated, all written by the host.
#[no_mangle]
pub unsafe extern "C" fn tagbox_handle_write_image(
    handle: u32,
    data: u32,
    len: u32,
    index: i32,
    kind: u32,
    description: u32,
    mime: u32,
) -> bool {
    let Ok(index) = usize::try_from(index) else {
        return false;
    };
    let data = memory::read_bytes(data, len);
    let kind = memory::read_str(kind).unwrap_or_default();
    let description = memory::read_str(description).unwrap_or_default();
    let mime = memory::read_str(mime).unwrap_or_default();
    with_media(handle, |media| media.write_image(data, index, kind, description, mime)).unwrap_or(false)
}

/// Number of open handles, for diagnostics.
#[no_mangle]
pub extern "C" fn tagbox_open_handles() -> u32 {
    FILES.with(|files| files.borrow().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_handle_is_null() {
        assert_eq!(tagbox_handle_tags(42), 0);
        assert_eq!(tagbox_handle_properties(42), 0);
        assert_eq!(tagbox_handle_image(42, 0), 0);
        assert!(!unsafe { tagbox_handle_write_tags(42, 0, 0) });
    }

    #[test]
    fn test_close_unknown_handle_is_noop() {
        assert!(!tagbox_handle_close(0));
        assert!(!tagbox_handle_close(42));
        assert_eq!(tagbox_open_handles(), 0);
    }

    #[test]
    fn test_null_path_is_invalid() {
        assert_eq!(unsafe { tagbox_file_open(0, 1) }, 0);
    }
}
