//! Error types shared across the crate.
//!
//! Configuration problems ([`LimitError`], [`ThresholdError`]) are fatal to the
//! checker being built. Search failures ([`SearchError`]) abort one
//! time-range search and are distinct from "no intersection", which is a
//! normal `Ok(None)` result.

use std::io;
use std::path::PathBuf;

use crate::scalar::{Scalar, ScalarKind};

/// Problems with a single set of thresholds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("expected a {expected} value, got {got}")]
    KindMismatch {
        expected: ScalarKind,
        got: ScalarKind,
    },

    #[error("threshold {0} is NaN")]
    NotANumber(&'static str),

    #[error(
        "thresholds out of order: need action low {action_low} <= caution low {caution_low} \
         <= caution high {caution_high} <= action high {action_high}"
    )]
    OutOfOrder {
        caution_low: Scalar,
        caution_high: Scalar,
        action_low: Scalar,
        action_high: Scalar,
    },
}

/// Configuration errors raised while building or modifying a limit checker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LimitError {
    #[error("{param}: {source}")]
    Thresholds {
        param: String,
        #[source]
        source: ThresholdError,
    },

    #[error("{param}: {got} threshold slots given but the context schema has {expected}")]
    SlotCount {
        param: String,
        expected: usize,
        got: usize,
    },

    #[error("{param}: context {context} is outside the context schema")]
    ContextOutOfRange { param: String, context: String },

    #[error("{param}: checker uses a different context schema than its list")]
    SchemaMismatch { param: String },
}

/// A context schema the limits text format can't express.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid context axis name '{0}': must be non-empty without whitespace, '=' or '*'")]
    AxisName(String),

    #[error("context axis {0} is defined twice")]
    DuplicateAxis(String),

    #[error("context axis {axis} needs between 1 and 256 labels, got {count}")]
    LabelCount { axis: String, count: usize },

    #[error("context axis {axis} has an invalid label '{label}'")]
    Label { axis: String, label: String },
}

/// Failure parsing a scalar from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{text}' is not a valid {kind} value")]
pub struct ParseScalarError {
    pub kind: ScalarKind,
    pub text: String,
}

/// Failure parsing a time from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{0}', expected YYYY-MM-DDTHH:MM:SS[.mmm] or milliseconds since the epoch")]
pub struct ParseTimeError(pub String);

/// Errors aborting a record time search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("record size must be non-zero")]
    ZeroRecordSize,

    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to seek to offset {offset}")]
    Seek {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to read record at offset {offset}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("no time could be extracted from the record at offset {offset}")]
    Extract { offset: u64 },
}
