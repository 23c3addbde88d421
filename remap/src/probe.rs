//! Read-only probe mode: scans region files for the first chunk whose
//! biome palette contains an entry starting with a given prefix, without
//! writing anything back. Used to check whether a mapping table actually
//! needs a fallback before running a real remap.

use std::path::{Path, PathBuf};

use biome_remap_anvil as anvil;
use biome_remap_nbt::read_root;

use crate::palette::find_prefix_hit;

#[derive(Debug, Clone)]
pub struct ProbeHit {
    pub region: String,
    pub chunk_idx: usize,
    pub section_y: Option<i64>,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub enum ProbeOutcome {
    Found(ProbeHit),
    NotFound {
        regions_scanned: usize,
        chunks_scanned: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub y_range: Option<(i64, i64)>,
    /// 0 means unlimited.
    pub max_regions: usize,
    /// 0 means unlimited.
    pub max_chunks: usize,
}

/// Scans `region_files` in order for the first palette entry matching
/// `prefix`, honoring the region/chunk scan budgets, and reports through
/// `on_line` in the exact wording the rest of the toolchain expects to
/// grep for.
pub fn run_probe(
    region_files: &[PathBuf],
    prefix: &str,
    opts: ProbeOptions,
    mut on_line: impl FnMut(&str),
) -> ProbeOutcome {
    let mut regions_scanned = 0usize;
    let mut chunks_scanned = 0usize;

    for path in region_files {
        if opts.max_regions > 0 && regions_scanned >= opts.max_regions {
            break;
        }
        regions_scanned += 1;

        if let Some(hit) = probe_one_region(path, prefix, opts, &mut chunks_scanned) {
            on_line(&format!(
                "FOUND in {} (chunk_idx={}, sectionY={}):",
                hit.region,
                hit.chunk_idx,
                hit.section_y.map(|y| y.to_string()).unwrap_or_else(|| "?".to_owned()),
            ));
            for v in &hit.values {
                on_line(&format!("  {v}"));
            }
            return ProbeOutcome::Found(hit);
        }

        if opts.max_chunks > 0 && chunks_scanned >= opts.max_chunks {
            break;
        }
    }

    on_line(&format!(
        "Not found. Scanned regions={}, chunks={}, prefix={:?}",
        regions_scanned, chunks_scanned, prefix,
    ));
    ProbeOutcome::NotFound {
        regions_scanned,
        chunks_scanned,
    }
}

fn probe_one_region(
    path: &Path,
    prefix: &str,
    opts: ProbeOptions,
    chunks_scanned: &mut usize,
) -> Option<ProbeHit> {
    let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let bytes = anvil::read_region_file(path).ok()?;
    let locations = anvil::parse_locations(&bytes).ok()?;

    for ptr in anvil::iter_present(&locations) {
        if opts.max_chunks > 0 && *chunks_scanned >= opts.max_chunks {
            return None;
        }
        *chunks_scanned += 1;

        let Some(blob) = anvil::extract_blob(&bytes, ptr.sector_off, ptr.sector_count) else {
            continue;
        };
        let Ok(envelope) = anvil::parse_envelope(blob) else {
            continue;
        };
        let Ok(nbt_bytes) = anvil::decompress(&envelope) else {
            continue;
        };
        let Ok(mut root) = read_root(&nbt_bytes) else {
            continue;
        };

        if let Some((section_y, values)) = find_prefix_hit(&mut root, opts.y_range, prefix) {
            return Some(ProbeHit {
                region: filename,
                chunk_idx: ptr.index,
                section_y,
                values,
            });
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use biome_remap_nbt::{write_root, Value};
    use indexmap::IndexMap;
    use std::fs;

    fn compound(entries: Vec<(&str, Value)>) -> Value {
        let mut map = IndexMap::new();
        for (k, v) in entries {
            map.insert(k.to_owned(), v);
        }
        Value::Compound(map)
    }

    fn seed_region_with_palette(ids: &[&str]) -> Vec<u8> {
        let palette = Value::List(ids.iter().map(|s| Value::String((*s).to_owned())).collect());
        let biomes = compound(vec![("palette", palette)]);
        let section = compound(vec![("Y", Value::Int(0)), ("biomes", biomes)]);
        let root = compound(vec![("sections", Value::List(vec![section]))]);
        let nbt = write_root(&root).unwrap();
        let blob = anvil::compress(2, &nbt).unwrap();

        let mut out = vec![0u8; anvil::HEADER_SIZE];
        out[0] = 0;
        out[1] = 0;
        out[2] = 2;
        out[3] = 1;
        let ts_off = anvil::SECTOR_SIZE;
        out[ts_off..ts_off + 4].copy_from_slice(&1000u32.to_be_bytes());
        out.resize(anvil::HEADER_SIZE + anvil::SECTOR_SIZE, 0);
        out[anvil::HEADER_SIZE..anvil::HEADER_SIZE + blob.len()].copy_from_slice(&blob);
        out
    }

    fn temp_region(name: &str, bytes: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("biome-remap-probe-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn finds_matching_prefix_and_reports_lines() {
        let region = seed_region_with_palette(&["terralith:yellowstone", "minecraft:plains"]);
        let path = temp_region("r.0.0.mca", &region);

        let mut lines = Vec::new();
        let outcome = run_probe(
            &[path.clone()],
            "terralith:",
            ProbeOptions { y_range: None, max_regions: 0, max_chunks: 0 },
            |l| lines.push(l.to_owned()),
        );
        match outcome {
            ProbeOutcome::Found(hit) => {
                assert_eq!(hit.chunk_idx, 0);
                assert_eq!(hit.section_y, Some(0));
                assert_eq!(hit.values, vec!["terralith:yellowstone".to_owned()]);
            }
            ProbeOutcome::NotFound { .. } => panic!("expected a hit"),
        }
        assert!(lines[0].starts_with("FOUND in r.0.0.mca"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn reports_not_found_with_scan_counts() {
        let region = seed_region_with_palette(&["minecraft:plains"]);
        let path = temp_region("r.1.0.mca", &region);

        let mut lines = Vec::new();
        let outcome = run_probe(
            &[path.clone()],
            "bluenether:",
            ProbeOptions { y_range: None, max_regions: 0, max_chunks: 0 },
            |l| lines.push(l.to_owned()),
        );
        match outcome {
            ProbeOutcome::NotFound { regions_scanned, chunks_scanned } => {
                assert_eq!(regions_scanned, 1);
                assert_eq!(chunks_scanned, 1);
            }
            ProbeOutcome::Found(_) => panic!("expected no hit"),
        }
        assert!(lines[0].starts_with("Not found."));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn respects_max_regions_budget() {
        let region = seed_region_with_palette(&["terralith:yellowstone"]);
        let path_a = temp_region("r.0.0.mca", &region);
        let path_b = temp_region("r.1.0.mca", &region);

        let outcome = run_probe(
            &[path_a.clone(), path_b.clone()],
            "terralith:",
            ProbeOptions { y_range: None, max_regions: 1, max_chunks: 0 },
            |_| {},
        );
        assert!(matches!(outcome, ProbeOutcome::Found(_)));

        let _ = fs::remove_dir_all(path_a.parent().unwrap());
    }
}
