//! Little-endian encode/decode primitives for migratable state.
//!
//! All integers are little-endian. Strings and byte arrays are
//! length-prefixed with a `u32` length. `f64` values are written as their
//! IEEE-754 bit pattern, so NaN sentinels survive a round trip unchanged.

use std::io::{Read, Write};

use crate::error::MigrateError;

/// Largest length prefix a reader will honour (16 MiB).
pub const MAX_PREFIXED_LEN: usize = 16 * 1024 * 1024;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), MigrateError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), MigrateError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), MigrateError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64 (bit pattern preserved).
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), MigrateError> {
    w.write_all(&v.to_bits().to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), MigrateError> {
    write_length_prefixed_bytes(w, s.as_bytes())
}

/// Write a length-prefixed byte array (u32 length + bytes).
pub fn write_length_prefixed_bytes(w: &mut dyn Write, b: &[u8]) -> Result<(), MigrateError> {
    let len = u32::try_from(b.len()).map_err(|_| MigrateError::Malformed {
        detail: format!("{} bytes exceeds the u32 length prefix", b.len()),
    })?;
    write_u32_le(w, len)?;
    w.write_all(b)?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, MigrateError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, MigrateError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, MigrateError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, MigrateError> {
    Ok(f64::from_bits(read_u64_le(r)?))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, MigrateError> {
    let buf = read_length_prefixed_bytes(r)?;
    String::from_utf8(buf).map_err(|e| MigrateError::Malformed {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

/// Read a length-prefixed byte array.
pub fn read_length_prefixed_bytes(r: &mut dyn Read) -> Result<Vec<u8>, MigrateError> {
    let len = read_u32_le(r)? as usize;
    if len > MAX_PREFIXED_LEN {
        return Err(MigrateError::Malformed {
            detail: format!("length prefix {len} exceeds limit of {MAX_PREFIXED_LEN}"),
        });
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Fail if `rest` still holds bytes after a payload was decoded.
pub fn expect_consumed(rest: &[u8], what: &str) -> Result<(), MigrateError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(MigrateError::Malformed {
            detail: format!("{} trailing bytes after {what}", rest.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_bit_pattern_survives() {
        let quiet = f64::from_bits(0x7ff8_0000_0000_0001);
        let mut buf = Vec::new();
        write_f64_le(&mut buf, quiet).unwrap();
        let back = read_f64_le(&mut buf.as_slice()).unwrap();
        assert!(back.is_nan());
        assert_eq!(back.to_bits(), quiet.to_bits());
    }

    #[test]
    fn string_round_trip() {
        let mut buf = Vec::new();
        write_length_prefixed_str(&mut buf, "Cfl").unwrap();
        assert_eq!(buf.len(), 4 + 3);
        let s = read_length_prefixed_str(&mut buf.as_slice()).unwrap();
        assert_eq!(s, "Cfl");
    }

    #[test]
    fn truncated_read_is_io_error() {
        let buf = [1u8, 2, 3];
        let err = read_u64_le(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, MigrateError::Io(_)));
    }

    #[test]
    fn oversized_length_prefix_rejected() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, u32::MAX).unwrap();
        let err = read_length_prefixed_bytes(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, MigrateError::Malformed { .. }));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut buf = Vec::new();
        write_length_prefixed_bytes(&mut buf, &[0xff, 0xfe]).unwrap();
        let err = read_length_prefixed_str(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, MigrateError::Malformed { .. }));
    }

    #[test]
    fn trailing_bytes_detected() {
        assert!(expect_consumed(&[], "payload").is_ok());
        let err = expect_consumed(&[0, 0], "payload").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed snapshot: 2 trailing bytes after payload"
        );
    }
}
