//! Whole-program save and load, plain or zstd-compressed.

use std::io::Read;

use tracing::{debug, warn};

use crate::codec::block::{block_record, load_saved};
use crate::codec::record::{ProgramFile, ProgramRecord};
use crate::error::{GraphError, LoadError, SaveError};
use crate::limits::{MAGIC_COMPRESSED, MAX_BLOCKS_PER_PROGRAM, MAX_PROGRAM_SIZE};
use crate::model::{BlockGraph, BlockId, IdMapping};

/// Magic plus the little-endian uncompressed length.
const COMPRESSED_HEADER_LEN: usize = MAGIC_COMPRESSED.len() + 8;

/// Builds the save record of every block, in ascending ID order.
pub fn program_record(graph: &BlockGraph) -> Result<ProgramFile, GraphError> {
    let blocks = graph
        .ids()
        .into_iter()
        .map(|id| block_record(graph, id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ProgramFile {
        graph: ProgramRecord {
            language: graph.genera().fingerprint_hex(),
            blocks,
        },
    })
}

/// Saves every block as JSON.
pub fn save_program(graph: &BlockGraph) -> Result<String, SaveError> {
    let file = program_record(graph)?;
    serde_json::to_string_pretty(&file).map_err(|e| SaveError::Serialize(e.to_string()))
}

/// Saves every block as `BGZ1` + length + zstd-compressed JSON.
pub fn save_program_compressed(graph: &BlockGraph) -> Result<Vec<u8>, SaveError> {
    let text = save_program(graph)?;
    let level = graph.config().compression_level;
    let compressed =
        zstd::encode_all(text.as_bytes(), level).map_err(|e| SaveError::CompressionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(COMPRESSED_HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC_COMPRESSED);
    out.extend_from_slice(&(text.len() as u64).to_le_bytes());
    out.extend_from_slice(&compressed);
    debug!(
        uncompressed = text.len(),
        compressed = out.len(),
        "saved compressed program"
    );
    Ok(out)
}

/// Loads a JSON program. Returns the IDs of the loaded blocks in file order.
///
/// Blocks loaded before an error stay in the graph.
pub fn load_program(
    graph: &mut BlockGraph,
    text: &str,
    mut mapping: Option<&mut IdMapping>,
) -> Result<Vec<BlockId>, LoadError> {
    if text.len() > MAX_PROGRAM_SIZE {
        return Err(LoadError::TooLarge {
            len: text.len(),
            max: MAX_PROGRAM_SIZE,
        });
    }
    let file: ProgramFile = serde_json::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;
    let program = file.graph;
    if program.blocks.len() > MAX_BLOCKS_PER_PROGRAM {
        return Err(LoadError::TooManyBlocks {
            count: program.blocks.len(),
            max: MAX_BLOCKS_PER_PROGRAM,
        });
    }

    if graph.config().check_language_fingerprint {
        if let (Some(saved), Some(current)) = (&program.language, graph.genera().fingerprint_hex()) {
            if *saved != current {
                warn!(saved = %saved, current = %current, "program was saved under a different language");
            }
        }
    }

    let mut ids = Vec::with_capacity(program.blocks.len());
    for saved in &program.blocks {
        ids.push(load_saved(graph, saved, mapping.as_deref_mut())?);
    }
    debug!(blocks = ids.len(), "loaded program");
    Ok(ids)
}

/// Loads a program from bytes, compressed or not.
pub fn load_program_bytes(
    graph: &mut BlockGraph,
    bytes: &[u8],
    mapping: Option<&mut IdMapping>,
) -> Result<Vec<BlockId>, LoadError> {
    if bytes.starts_with(MAGIC_COMPRESSED) {
        let decompressed = decompress(bytes)?;
        let text = String::from_utf8(decompressed).map_err(|_| LoadError::InvalidUtf8)?;
        load_program(graph, &text, mapping)
    } else {
        let text = std::str::from_utf8(bytes).map_err(|_| LoadError::InvalidUtf8)?;
        load_program(graph, text, mapping)
    }
}

/// Unpacks a compressed program into its JSON bytes.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, LoadError> {
    if input.len() < COMPRESSED_HEADER_LEN || !input.starts_with(MAGIC_COMPRESSED) {
        return Err(LoadError::Parse("missing compressed program header".to_string()));
    }
    let mut size = [0u8; 8];
    size.copy_from_slice(&input[MAGIC_COMPRESSED.len()..COMPRESSED_HEADER_LEN]);
    let declared = u64::from_le_bytes(size);
    if declared > MAX_PROGRAM_SIZE as u64 {
        return Err(LoadError::TooLarge {
            len: declared as usize,
            max: MAX_PROGRAM_SIZE,
        });
    }
    let declared = declared as usize;

    let decoder = zstd::Decoder::new(&input[COMPRESSED_HEADER_LEN..])
        .map_err(|e| LoadError::DecompressionFailed(e.to_string()))?;
    let mut decompressed = Vec::with_capacity(declared);
    decoder
        .take(declared as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| LoadError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared {
        return Err(LoadError::UncompressedSizeMismatch {
            declared,
            actual: decompressed.len(),
        });
    }
    Ok(decompressed)
}
