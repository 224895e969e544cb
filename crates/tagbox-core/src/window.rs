//! Guest-side buffered view over a host stream.
//!
//! Every call into the host is a boundary crossing, far more expensive than
//! a byte copy. [`BufferedStream`] keeps one window of at most
//! [`WINDOW_SIZE`] bytes of the stream and serves reads from it; a read that
//! is not fully covered by the window discards it and refills a fresh window
//! starting at the read position.
//!
//! Short reads are not errors: when the host has no more bytes (or fails),
//! the read returns fewer bytes than requested, possibly zero.

use std::io::{self, Read, Seek, SeekFrom};

/// Size of the guest-side stream window.
pub const WINDOW_SIZE: usize = 32 * 1024;

/// Origin of a seek, as passed to the host `stream_seek` import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Whence {
    /// Absolute offset from the start
    Start = 0,
    /// Relative to the current position
    Current = 1,
    /// Relative to the end
    End = 2,
}

impl Whence {
    /// Decode an ABI value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Start),
            1 => Some(Self::Current),
            2 => Some(Self::End),
            _ => None,
        }
    }
}

/// Unbuffered access to a host byte source.
///
/// In the guest this is implemented by the `tagbox_io` imports; tests
/// implement it over memory.
pub trait StreamSource {
    /// Read up to `buf.len()` bytes at the current position. Returns 0 at
    /// end of stream or on failure.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Move the current position. Returns false on failure.
    fn seek(&mut self, offset: i64, whence: Whence) -> bool;

    /// Current position, negative on failure.
    fn tell(&mut self) -> i64;

    /// Total length in bytes, negative on failure.
    fn length(&mut self) -> i64;
}

/// A [`StreamSource`] behind a single cached window.
///
/// Implements [`Read`] and [`Seek`] over a logical position, so a parser
/// sees an ordinary seekable reader. Seeking is free; the host is only
/// consulted when a read misses the window.
#[derive(Debug)]
pub struct BufferedStream<S> {
    source: S,
    window: Box<[u8]>,
    window_start: u64,
    window_len: usize,
    position: u64,
    length: Option<u64>,
}

impl<S: StreamSource> BufferedStream<S> {
    /// Wrap a source. The window starts empty.
    pub fn new(source: S) -> Self {
        Self {
            source,
            window: vec![0u8; WINDOW_SIZE].into_boxed_slice(),
            window_start: 0,
            window_len: 0,
            position: 0,
            length: None,
        }
    }

    /// Logical read position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Byte range currently cached, as `(start, len)`.
    pub fn window_range(&self) -> (u64, usize) {
        (self.window_start, self.window_len)
    }

    /// Borrow the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Total stream length, asked of the host once and then cached.
    pub fn length(&mut self) -> Option<u64> {
        if self.length.is_none() {
            let len = self.source.length();
            if len >= 0 {
                self.length = Some(len as u64);
            }
        }
        self.length
    }

    /// Read up to `dst.len()` bytes at the logical position and advance it.
    pub fn read_buffered(&mut self, dst: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < dst.len() {
            let wanted = (dst.len() - filled).min(WINDOW_SIZE);
            if !self.covers(self.position, wanted) && self.refill() == 0 {
                break;
            }

            let offset = (self.position - self.window_start) as usize;
            let available = self.window_len - offset;
            let n = (dst.len() - filled).min(available);
            dst[filled..filled + n].copy_from_slice(&self.window[offset..offset + n]);
            filled += n;
            self.position += n as u64;
        }
        filled
    }

    // A range whose end overflows is never covered; the refill then
    // short-reads because the position is past what the host can address.
    fn covers(&self, position: u64, len: usize) -> bool {
        let window_end = self.window_start + self.window_len as u64;
        position >= self.window_start
            && position
                .checked_add(len as u64)
                .is_some_and(|end| end <= window_end)
    }

    // Replace the window with bytes starting at the logical position.
    fn refill(&mut self) -> usize {
        self.window_start = self.position;
        self.window_len = 0;

        let Ok(offset) = i64::try_from(self.position) else {
            return 0;
        };
        if !self.source.seek(offset, Whence::Start) {
            tracing::trace!(offset, "stream seek failed during refill");
            return 0;
        }

        while self.window_len < WINDOW_SIZE {
            let n = self.source.read(&mut self.window[self.window_len..]);
            if n == 0 {
                break;
            }
            self.window_len += n.min(WINDOW_SIZE - self.window_len);
        }
        self.window_len
    }
}

impl<S: StreamSource> Read for BufferedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_buffered(buf))
    }
}

impl<S: StreamSource> Seek for BufferedStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(n) => {
                self.position = n;
                return Ok(n);
            }
            SeekFrom::Current(d) => (self.position, d),
            SeekFrom::End(d) => {
                let len = self.length().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "stream length unavailable")
                })?;
                (len, d)
            }
        };

        let target = base.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position")
        })?;
        self.position = target;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
