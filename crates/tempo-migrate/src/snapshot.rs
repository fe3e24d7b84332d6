//! Chooser and registry snapshots.

use std::io::{Read, Write};

use tempo_chooser::{StepChooser, StepChooserRegistry};
use tempo_core::codec::{
    read_length_prefixed_bytes, read_length_prefixed_str, read_u32_le, read_u64_le, read_u8,
    write_length_prefixed_bytes, write_length_prefixed_str, write_u32_le, write_u64_le, write_u8,
};
use tempo_core::MigrateError;
use tracing::info;

use crate::hash::{HashingReader, HashingWriter};
use crate::policy::{RestoreReport, UnknownTypePolicy};
use crate::types::ChooserTypes;
use crate::{FORMAT_VERSION, MAGIC};

// ── Single chooser ─────────────────────────────────────────────────

/// Write one chooser as `[type tag][payload]`.
pub fn snapshot_chooser(w: &mut dyn Write, chooser: &dyn StepChooser) -> Result<(), MigrateError> {
    let mut payload = Vec::new();
    chooser.write_state(&mut payload)?;
    write_length_prefixed_str(w, chooser.type_tag())?;
    write_length_prefixed_bytes(w, &payload)
}

fn read_frame(r: &mut dyn Read) -> Result<(String, Vec<u8>), MigrateError> {
    let tag = read_length_prefixed_str(r)?;
    let payload = read_length_prefixed_bytes(r)?;
    Ok((tag, payload))
}

/// Read one chooser written by [`snapshot_chooser`].
///
/// Unknown type tags are always an error here; the skip policy only
/// applies to whole registries.
pub fn restore_chooser(
    r: &mut dyn Read,
    types: &ChooserTypes,
) -> Result<Box<dyn StepChooser>, MigrateError> {
    let (tag, payload) = read_frame(r)?;
    let restore = types
        .get(&tag)
        .ok_or(MigrateError::UnknownChooserType { tag })?;
    restore(&payload)
}

// ── Registry ───────────────────────────────────────────────────────

/// Write a full registry checkpoint.
pub fn snapshot_registry(
    w: &mut dyn Write,
    registry: &StepChooserRegistry,
) -> Result<(), MigrateError> {
    let count = u32::try_from(registry.len()).map_err(|_| MigrateError::Malformed {
        detail: format!("{} choosers exceed the u32 count field", registry.len()),
    })?;

    let mut hw = HashingWriter::new(w);
    hw.write_all(&MAGIC)?;
    write_u8(&mut hw, FORMAT_VERSION)?;
    write_u32_le(&mut hw, count)?;
    for chooser in registry.iter() {
        snapshot_chooser(&mut hw, chooser)?;
    }
    let checksum = hw.hash();
    drop(hw);
    write_u64_le(w, checksum)
}

/// Read a registry checkpoint written by [`snapshot_registry`].
///
/// Choosers come back in their original order, so tie-breaking is
/// unchanged after a migration.
pub fn restore_registry(
    r: &mut dyn Read,
    types: &ChooserTypes,
    policy: UnknownTypePolicy,
) -> Result<(StepChooserRegistry, RestoreReport), MigrateError> {
    let mut hr = HashingReader::new(r);

    let mut magic = [0u8; 4];
    hr.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(MigrateError::InvalidMagic);
    }
    let version = read_u8(&mut hr)?;
    if version != FORMAT_VERSION {
        return Err(MigrateError::UnsupportedVersion { found: version });
    }
    let count = read_u32_le(&mut hr)?;

    let mut registry = StepChooserRegistry::new();
    let mut report = RestoreReport::default();
    // Decode every frame before trusting any of them.
    let mut frames = Vec::new();
    for _ in 0..count {
        frames.push(read_frame(&mut hr)?);
    }
    let computed = hr.hash();
    drop(hr);
    let recorded = read_u64_le(r)?;
    if recorded != computed {
        return Err(MigrateError::ChecksumMismatch { recorded, computed });
    }

    for (position, (tag, payload)) in frames.into_iter().enumerate() {
        let Some(restore) = types.get(&tag) else {
            match policy {
                UnknownTypePolicy::Abort => return Err(MigrateError::UnknownChooserType { tag }),
                UnknownTypePolicy::SkipWithWarning => {
                    report.skip(tag, position);
                    continue;
                }
            }
        };
        let chooser = restore(&payload)?;
        registry.push(chooser).map_err(|e| MigrateError::Malformed {
            detail: format!("restored chooser '{tag}' rejected by registry: {e}"),
        })?;
        report.restored += 1;
    }

    info!(
        restored = report.restored,
        skipped = report.skipped.len(),
        "chooser registry restored"
    );
    Ok((registry, report))
}

/// Serialize a registry checkpoint into a fresh buffer.
pub fn registry_to_bytes(registry: &StepChooserRegistry) -> Result<Vec<u8>, MigrateError> {
    let mut buf = Vec::new();
    snapshot_registry(&mut buf, registry)?;
    Ok(buf)
}

/// Restore a registry from a buffer holding exactly one checkpoint.
pub fn registry_from_bytes(
    bytes: &[u8],
    types: &ChooserTypes,
    policy: UnknownTypePolicy,
) -> Result<(StepChooserRegistry, RestoreReport), MigrateError> {
    let mut rest = bytes;
    let restored = restore_registry(&mut rest, types, policy)?;
    tempo_core::codec::expect_consumed(rest, "registry checkpoint")?;
    Ok(restored)
}
