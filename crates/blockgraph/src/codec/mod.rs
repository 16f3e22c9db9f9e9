//! Save format.
//!
//! Blocks are saved as JSON records with fixed field names (see [`record`]).
//! A program wraps its blocks in a `BlockGraph` envelope that also carries the
//! fingerprint of the language it was saved under.
//!
//! Programs can be stored compressed: `BGZ1` magic, the uncompressed length as
//! a little-endian `u64`, then a zstd stream.

mod block;
pub mod label;
mod program;
pub mod record;

pub use block::{block_record, load_block, load_saved, save_block};
pub use label::{decode_label, encode_label};
pub use program::{
    decompress, load_program, load_program_bytes, program_record, save_program, save_program_compressed,
};
pub use record::{
    BlockRecord, ConnectorRecord, PlugRecord, ProgramFile, ProgramRecord, PropertyRecord, SavedBlock, SocketsRecord,
    StubRecord,
};
