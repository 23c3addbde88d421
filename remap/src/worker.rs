//! The per-region pipeline: read a `.mca` file, remap every chunk's
//! biome palettes, and — unless nothing changed or `dry_run` is set —
//! rebuild and atomically replace the file on disk.
//!
//! A worker owns nothing shared: it is handed an immutable mapping
//! table and a single path, and returns a self-contained report. The
//! job controller dispatches many of these across a rayon pool with no
//! locks or shared caches between them.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use biome_remap_anvil as anvil;
use biome_remap_anvil::RebuiltChunk;
use biome_remap_nbt::{read_root, write_root};

use crate::mapping::MappingTable;
use crate::palette::{rewrite_chunk, sample_palette_entries};

/// Per-chunk failure. Never propagated past a single chunk: the worker
/// counts it and moves on, leaving that chunk's original blob in place.
#[derive(Debug)]
enum ChunkError {
    Envelope(anvil::Error),
    Nbt(biome_remap_nbt::Error),
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Envelope(e) => write!(f, "{e}"),
            ChunkError::Nbt(e) => write!(f, "{e}"),
        }
    }
}

impl From<anvil::Error> for ChunkError {
    fn from(e: anvil::Error) -> Self {
        ChunkError::Envelope(e)
    }
}

impl From<biome_remap_nbt::Error> for ChunkError {
    fn from(e: biome_remap_nbt::Error) -> Self {
        ChunkError::Nbt(e)
    }
}

/// Options a worker needs to process one region; shared read-only
/// across every worker in a run.
pub struct WorkerOptions<'a> {
    pub mapping: &'a MappingTable,
    pub y_range: Option<(i64, i64)>,
    pub dry_run: bool,
    pub make_backup: bool,
    pub debug_sample_limit: usize,
    pub debug_errors_limit: usize,
}

/// What one region contributed to the run: counts plus any collected
/// debug samples. No per-chunk detail survives past this.
#[derive(Debug, Default, Clone)]
pub struct Report {
    pub filename: String,
    pub chunks_processed: usize,
    pub chunks_changed: usize,
    pub entries_changed: usize,
    pub parse_errors: usize,
    pub debug_samples: Vec<String>,
}

fn now_unix_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// One successfully-parsed chunk's remap result: the recompressed blob
/// if anything changed, and how many palette entries were touched.
struct Remapped {
    new_blob: Option<Vec<u8>>,
    entries_changed: usize,
}

/// Decompresses, parses, and remaps one chunk blob in a single pass.
/// Returns `Err` if any step failed — the caller counts it and leaves
/// the chunk's original blob untouched.
fn try_remap_chunk(
    blob: &[u8],
    mapping: &MappingTable,
    y_range: Option<(i64, i64)>,
    debug_samples: &mut Vec<String>,
    debug_sample_limit: usize,
) -> Result<Remapped, ChunkError> {
    let envelope = anvil::parse_envelope(blob)?;
    let scheme_tag = envelope.scheme_tag;
    let nbt_bytes = anvil::decompress(&envelope)?;
    let mut root = read_root(&nbt_bytes)?;

    if debug_sample_limit > 0 && debug_samples.len() < debug_sample_limit {
        sample_palette_entries(&mut root, y_range, debug_sample_limit, debug_samples);
    }

    let outcome = rewrite_chunk(&mut root, mapping, y_range);
    if !outcome.changed {
        return Ok(Remapped { new_blob: None, entries_changed: 0 });
    }

    let new_nbt_bytes = write_root(&root)?;
    let new_blob = anvil::compress(scheme_tag, &new_nbt_bytes)?;
    Ok(Remapped {
        new_blob: Some(new_blob),
        entries_changed: outcome.entries_changed,
    })
}

/// Processes a single region file end to end (spec.md §4.5). Returns an
/// error only for whole-region failures — a corrupt sector table, a
/// truncated file, or an IO failure — which the caller treats as one
/// failed region and otherwise continues the run. Individual chunk
/// parse errors are swallowed here and only counted.
pub fn process_region(path: &Path, opts: &WorkerOptions) -> anvil::Result<Report> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let original = anvil::read_region_file(path)?;
    let locations = anvil::parse_locations(&original)?;

    let mut report = Report {
        filename: filename.clone(),
        ..Default::default()
    };
    let mut updates: HashMap<usize, RebuiltChunk> = HashMap::new();

    for ptr in anvil::iter_present(&locations) {
        let Some(blob) = anvil::extract_blob(&original, ptr.sector_off, ptr.sector_count) else {
            continue;
        };
        report.chunks_processed += 1;

        match try_remap_chunk(
            blob,
            opts.mapping,
            opts.y_range,
            &mut report.debug_samples,
            opts.debug_sample_limit,
        ) {
            Ok(Remapped { new_blob: Some(new_blob), entries_changed }) => {
                report.chunks_changed += 1;
                report.entries_changed += entries_changed;
                updates.insert(
                    ptr.index,
                    RebuiltChunk::Updated { blob: new_blob, changed: true },
                );
            }
            Ok(Remapped { new_blob: None, .. }) => {}
            Err(e) => {
                report.parse_errors += 1;
                if opts.debug_errors_limit > 0 && report.parse_errors <= opts.debug_errors_limit {
                    log::debug!("{filename} chunk idx={}: {e}", ptr.index);
                }
            }
        }
    }

    if report.chunks_changed == 0 || opts.dry_run {
        return Ok(report);
    }

    let rebuilt = anvil::rebuild(&original, &updates, now_unix_secs())?;
    anvil::write_region_file(path, &rebuilt, opts.make_backup)?;

    Ok(report)
}
