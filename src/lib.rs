//! limitwatch library - context-aware limit checking for telemetry records.
//!
//! Samples of each monitored parameter are classified into one of five
//! alarm zones against thresholds that depend on the instrument's operating
//! context. Zone and context changes produce alarm log entries, and the most
//! extreme value of every excursion is tracked until the parameter returns
//! to normal.
//!
//! # Modules
//!
//! - [`zone`] - Alarm zones, threshold sets and the classifier
//! - [`context`] - Operating contexts and their slot offsets
//! - [`checker`] - Per-parameter limit checker and its transition handling
//! - [`monitor`] - Running a list of checkers over records
//! - [`limits`] - Limits definition files
//! - [`timeindex`] - Binary search for a time window in a record file
//! - [`layout`] - JSON-described flat binary record layouts
//!
//! # Example
//!
//! ```no_run
//! use limitwatch::{load_limits_file, LimitList, LoadOptions, RecordLayout};
//! use std::path::Path;
//!
//! let layout = RecordLayout::from_file(Path::new("layout.json"))?;
//! let loaded = load_limits_file(
//!     Path::new("limits.txt"),
//!     &layout,
//!     layout.schema(),
//!     LoadOptions::default(),
//! )?;
//! let mut list = LimitList::with_checkers(layout.schema().clone(), loaded.checkers)?;
//!
//! let record = vec![0u8; layout.record_size()];
//! list.check_record(&layout, &record[..], &mut std::io::stdout())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod checker;
pub mod context;
pub mod error;
pub mod extract;
pub mod extreme;
pub mod layout;
pub mod limits;
pub mod monitor;
pub mod report;
pub mod scalar;
pub mod time;
pub mod timeindex;
pub mod transition;
pub mod zone;

// Re-export for convenience
pub use checker::{CheckOutcome, LimitChecker};
pub use context::{ContextAxis, ContextPair, ContextSchema, OperatingContext};
pub use error::{
    LimitError, ParseScalarError, ParseTimeError, SchemaError, SearchError, ThresholdError,
};
pub use extract::{Extractor, ParameterCatalog, ParameterDesc};
pub use extreme::{ExtremeValueRecord, ExtremeValueTracker};
pub use layout::RecordLayout;
pub use limits::{load_limits, load_limits_file, write_limits, LimitLoad, LoadOptions, SkippedEntry};
pub use monitor::{LimitList, RunStats, Severity};
pub use report::ReportClass;
pub use scalar::{Scalar, ScalarKind};
pub use time::OrderedTime;
pub use timeindex::{find_range, search_file, RecordRange, RecordTimes, TimeWindow};
pub use transition::{step, ActionSet};
pub use zone::{classify, AlarmZone, ThresholdSet};
