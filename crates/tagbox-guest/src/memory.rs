//! Reading host arguments and writing results into linear memory.
//!
//! Results are leaked on purpose: the host copies them out and then throws
//! the whole instance away, so nothing here is ever freed.

use std::ffi::CStr;
use std::os::raw::c_char;
use tagbox_core::Record;

/// Guest address of a pointer. Addresses are 32-bit on wasm32.
pub fn address<T>(ptr: *const T) -> u32 {
    ptr as usize as u32
}

/// Leak `bytes` and return their address; 0 for an empty buffer.
pub fn leak_bytes(bytes: Vec<u8>) -> u32 {
    if bytes.is_empty() {
        return 0;
    }
    address(Box::leak(bytes.into_boxed_slice()).as_ptr())
}

/// Write a NUL-terminated copy of `s`. Interior NULs are dropped.
pub fn write_cstring(s: &str) -> u32 {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend(s.bytes().filter(|&b| b != 0));
    bytes.push(0);
    leak_bytes(bytes)
}

/// Write a pointer array of rows, ending in a null pointer. Never null,
/// even for no rows.
pub fn write_rows<S: AsRef<str>>(rows: &[S]) -> u32 {
    let mut table: Vec<u32> = Vec::with_capacity(rows.len() + 1);
    table.extend(rows.iter().map(|r| write_cstring(r.as_ref())));
    table.push(0);
    address(Box::leak(table.into_boxed_slice()).as_ptr())
}

/// Write a fixed-layout record; 0 if it cannot be encoded.
pub fn write_record<R: Record>(record: &R) -> u32 {
    match record.encode() {
        Ok(bytes) => leak_bytes(bytes),
        Err(e) => {
            tracing::error!(error = %e, "record encoding failed");
            0
        }
    }
}

/// Borrow a NUL-terminated host string. Null or non-UTF-8 gives `None`.
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated buffer that outlives the
/// returned slice.
pub unsafe fn read_str<'a>(ptr: u32) -> Option<&'a str> {
    if ptr == 0 {
        return None;
    }
    CStr::from_ptr(ptr as usize as *const c_char).to_str().ok()
}

/// Collect a null-terminated array of host strings, skipping non-UTF-8.
///
/// # Safety
/// `ptr` must be null or point at a valid pointer array as written by the
/// host marshaling layer.
pub unsafe fn read_rows(ptr: u32) -> Vec<String> {
    let mut rows = Vec::new();
    if ptr == 0 {
        return rows;
    }
    let mut slot = ptr as usize as *const u32;
    loop {
        let item = *slot;
        if item == 0 {
            break;
        }
        if let Some(s) = read_str(item) {
            rows.push(s.to_string());
        }
        slot = slot.add(1);
    }
    rows
}

/// Borrow `len` bytes the host copied in.
///
/// # Safety
/// `ptr` must be null or point at `len` readable bytes.
pub unsafe fn read_bytes<'a>(ptr: u32, len: u32) -> &'a [u8] {
    if ptr == 0 || len == 0 {
        return &[];
    }
    std::slice::from_raw_parts(ptr as usize as *const u8, len as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_leak_as_null() {
        assert_eq!(leak_bytes(Vec::new()), 0);
    }

    #[test]
    fn test_null_arguments() {
        unsafe {
            assert_eq!(read_str(0), None);
            assert!(read_rows(0).is_empty());
            assert!(read_bytes(0, 10).is_empty());
        }
    }
}
