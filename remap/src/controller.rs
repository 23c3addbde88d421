//! The job controller: resolves a world's region directory, enumerates
//! its `.mca` files, dispatches a worker per file across a rayon pool,
//! and aggregates progress and a final summary.
//!
//! Dispatch uses rayon's `for_each_with` to hand each worker thread its
//! own clone of an `mpsc::Sender`, the standard rayon-plus-channel
//! combination for streaming results back to a single collector as they
//! complete rather than waiting on the whole batch at once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use biome_remap_anvil as anvil;

use crate::error::SetupError;
use crate::mapping::MappingTable;
use crate::worker::{self, Report, WorkerOptions};

/// Maps a `--dimension` argument to the region directory it names.
/// Anything other than the three recognised aliases is treated as a
/// literal path (so power users can point directly at a custom region
/// folder).
pub fn resolve_region_dir(world: &Path, dimension: &str) -> PathBuf {
    match dimension.to_lowercase().as_str() {
        "overworld" | "world" | "0" => world.join("region"),
        "nether" | "-1" | "dim-1" => world.join("DIM-1").join("region"),
        "end" | "1" | "dim1" => world.join("DIM1").join("region"),
        _ => PathBuf::from(dimension),
    }
}

/// Lists `r.<X>.<Z>.mca` files directly inside `region_dir`, sorted so
/// repeated runs enumerate (and therefore log) in the same order.
pub fn enumerate_region_files(region_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(region_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| is_region_filename(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_region_filename(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let mut parts = name.split('.');
    if parts.next() != Some("r") {
        return false;
    }
    let (x, z, ext, rest) = (parts.next(), parts.next(), parts.next(), parts.next());
    matches!((x, z, ext, rest), (Some(x), Some(z), Some("mca"), None))
        && x.unwrap().parse::<i64>().is_ok()
        && z.unwrap().parse::<i64>().is_ok()
}

/// Validates that `region_dir` exists and contains at least one region
/// file, per spec.md §7's `SetupError` taxonomy.
pub fn discover_region_files(region_dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    if !region_dir.is_dir() {
        return Err(SetupError::RegionFolderMissing(region_dir.to_path_buf()));
    }
    let files = enumerate_region_files(region_dir)
        .map_err(|_| SetupError::RegionFolderMissing(region_dir.to_path_buf()))?;
    if files.is_empty() {
        return Err(SetupError::NoRegionFiles(region_dir.to_path_buf()));
    }
    Ok(files)
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub y_range: Option<(i64, i64)>,
    pub dry_run: bool,
    pub make_backup: bool,
    pub processes: usize,
    pub debug_sample_limit: usize,
    pub debug_errors_limit: usize,
}

/// Run totals, printed as the final summary line.
#[derive(Debug, Default)]
pub struct Summary {
    pub regions_processed: usize,
    pub regions_changed: usize,
    pub regions_failed: usize,
    pub chunks_processed: usize,
    pub chunks_changed: usize,
    pub palette_entries_changed: usize,
    pub elapsed: Duration,
    pub debug_samples: Vec<String>,
}

/// Cooperative cancellation flag: checked between regions, never
/// mid-rebuild, so an in-flight worker always finishes its current
/// region before the run winds down.
pub fn stop_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Dispatches `region_files` across a rayon pool sized to
/// `opts.processes`, remapping each with `mapping`, and streams
/// `Progress:`/summary lines through `on_line` as spec.md §6 defines
/// them. Per-region failures are logged via the `log` facade and do not
/// stop the run.
pub fn run(
    region_files: Vec<PathBuf>,
    mapping: Arc<MappingTable>,
    opts: RunOptions,
    stop: Arc<AtomicBool>,
    mut on_line: impl FnMut(&str),
) -> Summary {
    let total = region_files.len();
    let started = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.processes.max(1))
        .build()
        .expect("failed to build worker thread pool");

    let (tx, rx) = mpsc::channel::<(PathBuf, anvil::Result<Report>)>();

    let dispatch_paths = region_files.clone();
    let dispatch_mapping = Arc::clone(&mapping);
    let dispatch_stop = Arc::clone(&stop);
    let handle = std::thread::spawn(move || {
        pool.install(|| {
            dispatch_paths.par_iter().for_each_with(tx, |tx, path| {
                if dispatch_stop.load(Ordering::Relaxed) {
                    return;
                }
                let worker_opts = WorkerOptions {
                    mapping: &dispatch_mapping,
                    y_range: opts.y_range,
                    dry_run: opts.dry_run,
                    make_backup: opts.make_backup,
                    debug_sample_limit: opts.debug_sample_limit,
                    debug_errors_limit: opts.debug_errors_limit,
                };
                let result = worker::process_region(path, &worker_opts);
                let _ = tx.send((path.clone(), result));
            });
        });
    });

    let mut summary = Summary::default();
    let mut last_progress = started;

    while summary.regions_processed < total {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok((path, Ok(report))) => {
                summary.regions_processed += 1;
                summary.chunks_processed += report.chunks_processed;
                summary.chunks_changed += report.chunks_changed;
                summary.palette_entries_changed += report.entries_changed;
                if report.chunks_changed > 0 {
                    summary.regions_changed += 1;
                }
                if opts.debug_sample_limit > 0 && summary.debug_samples.len() < opts.debug_sample_limit {
                    for s in report.debug_samples {
                        if summary.debug_samples.len() >= opts.debug_sample_limit {
                            break;
                        }
                        summary.debug_samples.push(s);
                    }
                }

                let now = Instant::now();
                let should_emit = report.chunks_changed > 0
                    || now.duration_since(last_progress) >= Duration::from_secs(5)
                    || summary.regions_processed == total;
                if should_emit {
                    emit_progress(&summary, total, started, &mut on_line);
                    last_progress = now;
                }
            }
            Ok((path, Err(e))) => {
                summary.regions_processed += 1;
                summary.regions_failed += 1;
                log::error!("region failed, left untouched: {}: {e}", path.display());
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = handle.join();
    summary.elapsed = started.elapsed();
    summary
}

fn emit_progress(summary: &Summary, total: usize, started: Instant, on_line: &mut impl FnMut(&str)) {
    let elapsed = started.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        summary.regions_processed as f64 / elapsed
    } else {
        0.0
    };
    on_line(&format!(
        "Progress: regions {}/{} ({:.2} r/s), chunks {}, changed_chunks {}, palette_changes {}",
        summary.regions_processed,
        total,
        rate,
        summary.chunks_processed,
        summary.chunks_changed,
        summary.palette_entries_changed,
    ));
}

pub fn format_summary_line(summary: &Summary) -> String {
    let mm = summary.elapsed.as_secs() / 60;
    let ss = summary.elapsed.as_secs() % 60;
    format!(
        "Summary: regions {} processed, {} changed, {} failed; chunks {} processed, {} changed; palette entries changed: {}; elapsed {:02}:{:02}",
        summary.regions_processed,
        summary.regions_changed,
        summary.regions_failed,
        summary.chunks_processed,
        summary.chunks_changed,
        summary.palette_entries_changed,
        mm,
        ss,
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_dimension_aliases() {
        let world = Path::new("/tmp/world");
        assert_eq!(resolve_region_dir(world, "overworld"), world.join("region"));
        assert_eq!(resolve_region_dir(world, "nether"), world.join("DIM-1").join("region"));
        assert_eq!(resolve_region_dir(world, "end"), world.join("DIM1").join("region"));
        assert_eq!(resolve_region_dir(world, "/custom/path"), PathBuf::from("/custom/path"));
    }

    #[test]
    fn enumerate_filters_and_sorts_region_files() {
        let dir = std::env::temp_dir().join(format!("biome-remap-controller-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("r.1.0.mca"), b"").unwrap();
        fs::write(dir.join("r.0.0.mca"), b"").unwrap();
        fs::write(dir.join("notes.txt"), b"").unwrap();
        fs::write(dir.join("r.bad.mca"), b"").unwrap();

        let files = enumerate_region_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["r.0.0.mca".to_owned(), "r.1.0.mca".to_owned()]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_fails_on_missing_directory() {
        let missing = Path::new("/tmp/biome-remap-does-not-exist-xyz");
        assert!(matches!(
            discover_region_files(missing),
            Err(SetupError::RegionFolderMissing(_))
        ));
    }
}
