//! Rewrites Minecraft biome palette strings across a world's Anvil
//! region files, driven by an INI mapping table. The crate is split into
//! the pieces a job controller needs to drive many workers over many
//! region files: a fatal-error taxonomy, the mapping engine, the NBT
//! palette rewrite itself, a per-region worker, a job controller that
//! fans workers out across a thread pool, and a read-only probe mode.

pub mod controller;
pub mod error;
pub mod mapping;
pub mod palette;
pub mod probe;
pub mod worker;

pub use error::SetupError;
pub use mapping::{load_mapping, MappingTable};
pub use probe::{run_probe, ProbeHit, ProbeOptions, ProbeOutcome};
pub use worker::{process_region, Report, WorkerOptions};
