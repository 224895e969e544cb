//! Guest side of the tagbox boundary.
//!
//! Built as a `cdylib` for `wasm32-wasip1` and loaded by `tagbox-sandbox`,
//! one instance per open file:
//!
//! ```text
//! cargo build --release --target wasm32-wasip1
//! ```
//!
//! Every export takes and returns plain 32/64-bit words. Strings, row arrays
//! and records are written into this module's own heap and never freed; the
//! host discards the whole instance on close.

use std::alloc::{alloc as std_alloc, Layout};

pub mod exports;
pub mod host;
pub mod media;
pub mod memory;

/// Allocate memory for host to write into.
///
/// Returns 0 when the request cannot be satisfied.
#[no_mangle]
pub extern "C" fn alloc(size: i32) -> i32 {
    let Ok(size) = usize::try_from(size) else {
        return 0;
    };
    let Ok(layout) = Layout::from_size_align(size.max(1), 8) else {
        return 0;
    };
    unsafe { std_alloc(layout) as usize as i32 }
}

/// ABI revision this guest speaks.
#[no_mangle]
pub extern "C" fn tagbox_abi_version() -> u32 {
    tagbox_core::ABI_VERSION
}
