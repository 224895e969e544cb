//! Names and constants of the host/guest ABI.
//!
//! The guest exports the functions in [`exports`] and imports the functions
//! in [`imports`] from the host. Both sides refer to these constants so a
//! rename cannot drift on one side only.

/// ABI version implemented by a guest module and expected by the host.
///
/// Bumped whenever an export signature or a record layout changes.
pub const ABI_VERSION: u32 = 1;

/// Width of a guest pointer in bytes (`wasm32`).
pub const POINTER_WIDTH: usize = 4;

/// Functions exported by the guest.
pub mod exports {
    /// `alloc(size) -> ptr`: guest allocator used by the host for arguments.
    pub const ALLOC: &str = "alloc";
    /// `tagbox_abi_version() -> u32`
    pub const ABI_VERSION: &str = "tagbox_abi_version";
    /// WASI reactor initialisation, called once after instantiation when present.
    pub const INITIALIZE: &str = "_initialize";
    /// Name of the exported linear memory.
    pub const MEMORY: &str = "memory";

    /// `tagbox_file_open(path, read_style) -> OpenResult*`
    pub const FILE_OPEN: &str = "tagbox_file_open";
    /// `tagbox_stream_open(stream_id, name, read_style) -> OpenResult*`
    pub const STREAM_OPEN: &str = "tagbox_stream_open";
    /// `tagbox_handle_close(handle) -> bool`
    pub const CLOSE: &str = "tagbox_handle_close";

    /// `tagbox_handle_tags(handle) -> char**`
    pub const TAGS: &str = "tagbox_handle_tags";
    /// `tagbox_handle_raw_tags(handle) -> char**`
    pub const RAW_TAGS: &str = "tagbox_handle_raw_tags";
    /// `tagbox_handle_id3v1_tags(handle) -> char**`
    pub const ID3V1_TAGS: &str = "tagbox_handle_id3v1_tags";
    /// `tagbox_handle_properties(handle) -> PropertiesRecord*`
    pub const PROPERTIES: &str = "tagbox_handle_properties";
    /// `tagbox_handle_image(handle, index) -> ByteData*`
    pub const IMAGE: &str = "tagbox_handle_image";

    /// `tagbox_handle_write_tags(handle, rows, options) -> bool`
    pub const WRITE_TAGS: &str = "tagbox_handle_write_tags";
    /// `tagbox_handle_write_raw_tags(handle, rows, options) -> bool`
    pub const WRITE_RAW_TAGS: &str = "tagbox_handle_write_raw_tags";
    /// `tagbox_handle_write_image(handle, data, length, index, type, description, mime) -> bool`
    pub const WRITE_IMAGE: &str = "tagbox_handle_write_image";
}

/// Functions the host provides to the guest.
pub mod imports {
    /// Import module namespace.
    pub const MODULE: &str = "tagbox_io";

    /// `stream_read(stream_id: i32, dst: i32, max_len: i32) -> i32` bytes read
    pub const STREAM_READ: &str = "stream_read";
    /// `stream_seek(stream_id: i32, offset: i64, whence: i32) -> i32` 0 on success
    pub const STREAM_SEEK: &str = "stream_seek";
    /// `stream_tell(stream_id: i32) -> i64` current position, -1 on failure
    pub const STREAM_TELL: &str = "stream_tell";
    /// `stream_length(stream_id: i32) -> i64` total length, -1 on failure
    pub const STREAM_LENGTH: &str = "stream_length";
}
