//! A small dynamic NBT value tree and its big-endian binary codec.
//!
//! Unlike a typed serde model, [`Value`] is a tagged-variant tree that
//! callers walk with `as_*` accessors. That is the right shape for tools
//! that only care about a handful of known fields scattered across
//! otherwise-unknown or version-varying data (a chunk's biome palette,
//! say) and would rather not describe the whole schema up front.

mod error;
mod read;
mod value;
mod write;

pub use error::{Error, Result};
pub use read::read_root;
pub use value::{Tag, Value};
pub use write::write_root;
