//! Format constants and limits applied when reading untrusted save data.

/// Magic prefix of a zstd-compressed program.
pub const MAGIC_COMPRESSED: &[u8; 4] = b"BGZ1";

/// Maximum size in bytes of an (uncompressed) program text.
pub const MAX_PROGRAM_SIZE: usize = 64 * 1024 * 1024;

/// Maximum number of block entries in one program.
pub const MAX_BLOCKS_PER_PROGRAM: usize = 1_000_000;

/// Default snapping radius for [`crate::link::LinkChecker::get_link`].
pub const DEFAULT_MAX_LINK_DISTANCE: f64 = 20.0;

/// Default zstd level for compressed saves.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// First ID handed out after a reset.
pub const FIRST_BLOCK_ID: u64 = 1;
