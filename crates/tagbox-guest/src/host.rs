//! Stream imports provided by the host.
//!
//! [`HostStream`] adapts them to [`StreamSource`], so the 32 KiB
//! [`BufferedStream`](tagbox_core::BufferedStream) can sit in front of every
//! boundary crossing.

use tagbox_core::{StreamSource, Whence};

// =============================================================================
// Host Function Imports
// =============================================================================
// Provided by the tagbox_io module of the host linker.

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "tagbox_io")]
extern "C" {
    /// Read up to `max_len` bytes into `dst`; returns the count, 0 at end
    fn stream_read(stream_id: i32, dst: *mut u8, max_len: i32) -> i32;

    /// Move the position; returns 0 on success
    fn stream_seek(stream_id: i32, offset: i64, whence: i32) -> i32;

    /// Current position, or -1
    fn stream_tell(stream_id: i32) -> i64;

    /// Total length, or -1
    fn stream_length(stream_id: i32) -> i64;
}

// Native builds (unit tests) have no host; every stream looks unreadable.
#[cfg(not(target_arch = "wasm32"))]
unsafe fn stream_read(_stream_id: i32, _dst: *mut u8, _max_len: i32) -> i32 {
    0
}

#[cfg(not(target_arch = "wasm32"))]
unsafe fn stream_seek(_stream_id: i32, _offset: i64, _whence: i32) -> i32 {
    -1
}

#[cfg(not(target_arch = "wasm32"))]
unsafe fn stream_tell(_stream_id: i32) -> i64 {
    -1
}

#[cfg(not(target_arch = "wasm32"))]
unsafe fn stream_length(_stream_id: i32) -> i64 {
    -1
}

/// A host-registered stream, addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostStream {
    id: u32,
}

impl HostStream {
    /// Wrap a stream id handed over by the host.
    pub fn new(id: u32) -> Self {
        Self { id }
    }

    /// Host registry id.
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl StreamSource for HostStream {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        let max_len = i32::try_from(buf.len()).unwrap_or(i32::MAX);
        let n = unsafe { stream_read(self.id as i32, buf.as_mut_ptr(), max_len) };
        usize::try_from(n).unwrap_or(0).min(buf.len())
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> bool {
        unsafe { stream_seek(self.id as i32, offset, whence as i32) == 0 }
    }

    fn tell(&mut self) -> i64 {
        unsafe { stream_tell(self.id as i32) }
    }

    fn length(&mut self) -> i64 {
        unsafe { stream_length(self.id as i32) }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::io::Read;
    use tagbox_core::BufferedStream;

    #[test]
    fn test_unhosted_stream_is_empty() {
        let mut stream = HostStream::new(7);
        assert_eq!(stream.id(), 7);
        let mut buf = [0u8; 16];
        assert_eq!(StreamSource::read(&mut stream, &mut buf), 0);
        assert!(!StreamSource::seek(&mut stream, 0, Whence::Start));
        assert_eq!(stream.length(), -1);
    }

    #[test]
    fn test_unhosted_stream_short_reads_through_window() {
        let mut buffered = BufferedStream::new(HostStream::new(1));
        let mut buf = Vec::new();
        assert_eq!(buffered.read_to_end(&mut buf).unwrap(), 0);
    }
}
