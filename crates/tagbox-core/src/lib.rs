//! # tagbox core
//!
//! The contract shared by the tagbox host (`tagbox-sandbox`) and the sandboxed
//! metadata library (`tagbox-guest`), plus the guest-side primitives that are
//! plain algorithms and can be tested natively.
//!
//! ## Boundary overview
//!
//! ```text
//! host                                   guest (wasm32-wasip1 instance)
//! ----                                   -----------------------------
//! Sandbox::open ──► tagbox_file_open ──► HandleTable::insert ──► OpenResult*
//! TagFile::tags ──► tagbox_handle_tags ─► rows "KEY\tvalue" ────► char**
//! stream registry ◄── stream_read/seek/tell/length ◄── BufferedStream (32 KiB)
//! ```
//!
//! Everything that crosses the boundary is a 64-bit word: scalars directly,
//! everything else as a pointer into the instance's linear memory. The layout
//! of records behind those pointers lives in [`layout`] and is the single
//! source of truth for both sides.

pub mod abi;
pub mod format;
pub mod handle;
pub mod layout;
pub mod media;
pub mod options;
pub mod rows;
pub mod window;

pub use abi::ABI_VERSION;
pub use format::{Format, NativeTags};
pub use handle::{Handle, HandleTable};
pub use layout::{ByteData, FieldLayout, LayoutError, OpenResult, PropertiesRecord, Record, RecordLayout};
pub use media::{detect_image_mime, ImageDesc, Properties};
pub use options::{ReadStyle, WriteOptions};
pub use rows::Tags;
pub use window::{BufferedStream, StreamSource, Whence, WINDOW_SIZE};
