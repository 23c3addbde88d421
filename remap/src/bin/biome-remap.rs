use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;

use clap::{App, Arg};
use env_logger::Env;

use biome_remap::controller::{discover_region_files, format_summary_line, resolve_region_dir, stop_flag, RunOptions};
use biome_remap::mapping::{load_mapping, DEFAULT_MAPPING_INI_TEXT};
use biome_remap::probe::{run_probe, ProbeOptions, ProbeOutcome};
use biome_remap::{controller, SetupError};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let matches = App::new("biome-remap")
        .about("Remaps Minecraft biome palette strings across a world's Anvil region files")
        .arg(Arg::with_name("world").required(true).help("path to the world directory"))
        .arg(
            Arg::with_name("dimension")
                .long("dimension")
                .takes_value(true)
                .default_value("overworld")
                .help("overworld, nether, end, or a literal region-folder path"),
        )
        .arg(
            Arg::with_name("y")
                .long("y")
                .number_of_values(2)
                .value_names(&["Y_MIN", "Y_MAX"])
                .allow_hyphen_values(true)
                .help("restrict the rewrite to sections overlapping this inclusive Y range"),
        )
        .arg(
            Arg::with_name("processes")
                .long("processes")
                .takes_value(true)
                .help("worker thread count (default: logical CPU count)"),
        )
        .arg(Arg::with_name("dry-run").long("dry-run").help("skip all writes"))
        .arg(Arg::with_name("no-backup").long("no-backup").help("skip .bak snapshots"))
        .arg(
            Arg::with_name("mapping-ini")
                .long("mapping-ini")
                .takes_value(true)
                .help("custom mapping INI; if absent, the built-in default is used"),
        )
        .arg(
            Arg::with_name("export-default-mapping-ini")
                .long("export-default-mapping-ini")
                .takes_value(true)
                .help("write the built-in mapping text to PATH and exit"),
        )
        .arg(
            Arg::with_name("unmapped-terralith-to")
                .long("unmapped-terralith-to")
                .takes_value(true)
                .help("fallback target for any unmapped terralith:* id"),
        )
        .arg(
            Arg::with_name("probe-prefix")
                .long("probe-prefix")
                .takes_value(true)
                .help("read-only: report the first palette entry starting with this prefix"),
        )
        .arg(
            Arg::with_name("probe-max-regions")
                .long("probe-max-regions")
                .takes_value(true)
                .default_value("200"),
        )
        .arg(
            Arg::with_name("probe-max-chunks")
                .long("probe-max-chunks")
                .takes_value(true)
                .default_value("200000"),
        )
        .arg(
            Arg::with_name("debug-sample")
                .long("debug-sample")
                .takes_value(true)
                .default_value("0")
                .help("log up to N sampled palette entries per region"),
        )
        .arg(
            Arg::with_name("debug-errors")
                .long("debug-errors")
                .takes_value(true)
                .default_value("0")
                .help("log up to N chunk parse errors per region"),
        )
        .arg(
            Arg::with_name("debug-structure")
                .long("debug-structure")
                .takes_value(true)
                .default_value("0")
                .help("log the section-list schema variant for the first N chunks scanned"),
        )
        .get_matches();

    if let Some(export_path) = matches.value_of("export-default-mapping-ini") {
        if let Err(e) = std::fs::write(export_path, DEFAULT_MAPPING_INI_TEXT) {
            log::error!("ERROR: could not write default mapping to {export_path}: {e}");
            exit(1);
        }
        exit(0);
    }

    let world = PathBuf::from(matches.value_of("world").expect("world is required"));
    if !world.is_dir() {
        log::error!("ERROR: {}", SetupError::WorldPathMissing(world));
        exit(1);
    }

    let dimension = matches.value_of("dimension").unwrap_or("overworld");
    let region_dir = resolve_region_dir(&world, dimension);

    let region_files = match discover_region_files(&region_dir) {
        Ok(files) => files,
        Err(e) => {
            log::error!("ERROR: {e}");
            exit(1);
        }
    };

    let unmapped_terralith_to = matches.value_of("unmapped-terralith-to");
    let mapping_ini_path = matches.value_of("mapping-ini").map(Path::new);
    let (mapping, mapping_source) = match load_mapping(mapping_ini_path, unmapped_terralith_to) {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("ERROR: {e}");
            exit(1);
        }
    };
    log::info!("using mapping ({mapping_source}, {} entries)", mapping.len());

    let y_range = parse_y_range(&matches);
    let debug_sample_limit = parse_usize(&matches, "debug-sample");
    let debug_errors_limit = parse_usize(&matches, "debug-errors");
    let debug_structure_limit = parse_usize(&matches, "debug-structure");

    if debug_structure_limit > 0 {
        log_chunk_structures(&region_files, debug_structure_limit);
    }

    if let Some(prefix) = matches.value_of("probe-prefix") {
        let opts = ProbeOptions {
            y_range,
            max_regions: parse_usize(&matches, "probe-max-regions"),
            max_chunks: parse_usize(&matches, "probe-max-chunks"),
        };
        let outcome = run_probe(&region_files, prefix, opts, |line| log::info!("{line}"));
        match outcome {
            ProbeOutcome::Found(_) => exit(0),
            ProbeOutcome::NotFound { .. } => exit(2),
        }
    }

    let processes = matches
        .value_of("processes")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    let opts = RunOptions {
        y_range,
        dry_run: matches.is_present("dry-run"),
        make_backup: !matches.is_present("no-backup"),
        processes,
        debug_sample_limit,
        debug_errors_limit,
    };

    let summary = controller::run(region_files, Arc::new(mapping), opts, stop_flag(), |line| {
        log::info!("{line}")
    });

    for sample in &summary.debug_samples {
        log::debug!("sampled palette entry: {sample}");
    }

    log::info!("{}", format_summary_line(&summary));
    exit(0);
}

fn parse_y_range(matches: &clap::ArgMatches) -> Option<(i64, i64)> {
    let mut values = matches.values_of("y")?;
    let a: i64 = values.next()?.parse().ok()?;
    let b: i64 = values.next()?.parse().ok()?;
    Some(if a <= b { (a, b) } else { (b, a) })
}

fn parse_usize(matches: &clap::ArgMatches, name: &str) -> usize {
    matches.value_of(name).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Logs the section-list schema variant found for the first `limit`
/// chunks scanned across `region_files`, in enumeration order.
fn log_chunk_structures(region_files: &[PathBuf], limit: usize) {
    use biome_remap::palette::describe_chunk_structure;
    use biome_remap_anvil as anvil;
    use biome_remap_nbt::read_root;

    let mut logged = 0usize;
    for path in region_files {
        if logged >= limit {
            break;
        }
        let Ok(bytes) = anvil::read_region_file(path) else { continue };
        let Ok(locations) = anvil::parse_locations(&bytes) else { continue };
        for ptr in anvil::iter_present(&locations) {
            if logged >= limit {
                break;
            }
            let Some(blob) = anvil::extract_blob(&bytes, ptr.sector_off, ptr.sector_count) else {
                continue;
            };
            let Ok(envelope) = anvil::parse_envelope(blob) else { continue };
            let Ok(nbt_bytes) = anvil::decompress(&envelope) else { continue };
            let Ok(root) = read_root(&nbt_bytes) else { continue };
            log::debug!(
                "{}: chunk idx={} structure={}",
                path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                ptr.index,
                describe_chunk_structure(&root),
            );
            logged += 1;
        }
    }
}
