//! Snapshot and restore of step chooser registries.
//!
//! A registry is checkpointed whenever its element is relocated between
//! steps, then rebuilt on the destination from the bytes alone. Concrete
//! chooser types are found through a [`ChooserTypes`] table keyed by a
//! stable type tag, so the generic code never names them.
//!
//! # Format
//!
//! ```text
//! [MAGIC "TMPO"] [VERSION u8] [COUNT u32]
//! [Chooser 1] [Chooser 2] ... [Chooser N]
//! [FNV-1a checksum u64]
//! ```
//!
//! Each chooser is its type tag followed by its payload, both
//! length-prefixed, so a reader can step over a payload it cannot decode.
//! The checksum covers every byte before it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod hash;
pub mod policy;
pub mod snapshot;
pub mod types;

pub use hash::{fnv1a, HashingReader, HashingWriter};
pub use policy::{RestoreReport, UnknownTypePolicy};
pub use snapshot::{
    registry_from_bytes, registry_to_bytes, restore_chooser, restore_registry, snapshot_chooser,
    snapshot_registry,
};
pub use types::{ChooserTypes, RestoreFn};

/// Magic bytes at the start of every registry checkpoint.
pub const MAGIC: [u8; 4] = *b"TMPO";

/// Current binary format version.
///
/// History:
/// - v1: tagged, length-prefixed chooser frames with a trailing checksum
pub const FORMAT_VERSION: u8 = 1;
