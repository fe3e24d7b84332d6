//! Error types for step choosers and chooser migration.
//!
//! Both families are fatal to the run: there is no recovery that keeps
//! the integration numerically safe. Degenerate numeric input (zero wave
//! speed, zero grid spacing) is not an error; choosers recover from it
//! locally by returning an unconstrained goal.

use std::error::Error;
use std::fmt;
use std::io;

use crate::quantity::StepQuantity;

/// Errors raised while evaluating or aggregating choosers.
#[derive(Clone, Debug, PartialEq)]
pub enum ChooserError {
    /// A chooser parameter is unset or out of range.
    Configuration {
        /// Name of the chooser.
        chooser: String,
        /// Which parameter is wrong, and how.
        reason: String,
    },
    /// The evaluation context lacks a quantity the chooser declared.
    MissingQuantity {
        /// Name of the chooser.
        chooser: String,
        /// The unresolved quantity.
        quantity: StepQuantity,
    },
    /// A supplied quantity is outside its physical range (NaN, negative).
    InvalidQuantity {
        /// Name of the chooser.
        chooser: String,
        /// The offending quantity.
        quantity: StepQuantity,
        /// The value it carried.
        value: f64,
    },
    /// A chooser produced a NaN or infinite goal.
    InvalidGoal {
        /// Name of the chooser.
        chooser: String,
        /// The rejected goal.
        value: f64,
    },
}

impl fmt::Display for ChooserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { chooser, reason } => {
                write!(f, "chooser '{chooser}' is misconfigured: {reason}")
            }
            Self::MissingQuantity { chooser, quantity } => {
                write!(f, "chooser '{chooser}' needs {quantity}, which was not supplied")
            }
            Self::InvalidQuantity {
                chooser,
                quantity,
                value,
            } => {
                write!(f, "chooser '{chooser}' received invalid {quantity}: {value}")
            }
            Self::InvalidGoal { chooser, value } => {
                write!(
                    f,
                    "chooser '{chooser}' produced invalid step goal {value} \
                     (must be finite)"
                )
            }
        }
    }
}

impl Error for ChooserError {}

/// Errors raised while snapshotting or restoring chooser state.
#[derive(Debug)]
pub enum MigrateError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The checkpoint does not start with the expected `b"TMPO"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the checkpoint.
        found: u8,
    },
    /// The byte sequence is truncated, has trailing bytes, or is otherwise corrupt.
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A snapshot names a chooser type this build has not registered.
    UnknownChooserType {
        /// The unrecognized type tag.
        tag: String,
    },
    /// Two chooser types were registered under the same tag.
    DuplicateChooserType {
        /// The tag registered twice.
        tag: String,
    },
    /// The checkpoint checksum does not match its contents.
    ChecksumMismatch {
        /// Checksum stored in the checkpoint.
        recorded: u64,
        /// Checksum computed over the bytes read.
        computed: u64,
    },
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"TMPO\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported checkpoint format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed snapshot: {detail}"),
            Self::UnknownChooserType { tag } => {
                write!(f, "unknown chooser type '{tag}'")
            }
            Self::DuplicateChooserType { tag } => {
                write!(f, "chooser type '{tag}' registered twice")
            }
            Self::ChecksumMismatch { recorded, computed } => {
                write!(
                    f,
                    "checksum mismatch: recorded={recorded:#018x}, computed={computed:#018x}"
                )
            }
        }
    }
}

impl Error for MigrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MigrateError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
