//! Flat binary record layouts.
//!
//! A layout file describes fixed-size little-endian records: an `i64`
//! millisecond timestamp, one byte per context axis, and parameters of a
//! declared kind at fixed offsets. The format looks like
//!
//! ```json
//! {
//!   "record_size": 16,
//!   "header_size": 0,
//!   "time_offset": 0,
//!   "context": [
//!     { "name": "Mode", "offset": 8, "labels": ["WOM", "CBM", "SBM", "ROM"] }
//!   ],
//!   "parameters": [
//!     { "name": "TWT Temp", "unit": "degC", "kind": "f32", "offset": 10 }
//!   ]
//! }
//! ```
//!
//! `header_size` and `context` may be omitted.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::context::{ContextAxis, ContextSchema, OperatingContext};
use crate::extract::{Extractor, ParameterCatalog, ParameterDesc};
use crate::scalar::{Scalar, ScalarKind};
use crate::time::OrderedTime;

const TIME_SIZE: usize = std::mem::size_of::<i64>();

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct LayoutConfig {
    record_size: usize,
    header_size: Option<u64>,
    time_offset: usize,
    context: Option<Vec<AxisConfig>>,
    parameters: Vec<ParameterConfig>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct AxisConfig {
    name: String,
    offset: usize,
    labels: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ParameterConfig {
    name: String,
    unit: String,
    kind: ScalarKind,
    offset: usize,
}

#[derive(Debug, Clone)]
struct ParameterField {
    desc: ParameterDesc,
    offset: usize,
}

/// A validated record layout.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    record_size: usize,
    header_size: u64,
    time_offset: usize,
    axis_offsets: Vec<usize>,
    schema: Arc<ContextSchema>,
    parameters: Vec<ParameterField>,
}

impl RecordLayout {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: LayoutConfig =
            serde_json::from_str(text).context("Failed to parse record layout")?;
        Self::from_config(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid layout file {}", path.display()))
    }

    fn from_config(config: LayoutConfig) -> Result<Self> {
        let record_size = config.record_size;
        if record_size == 0 {
            bail!("record_size must be non-zero");
        }
        let time_end = config.time_offset.checked_add(TIME_SIZE);
        if time_end.map_or(true, |end| end > record_size) {
            bail!(
                "time field at offset {} does not fit in a {} byte record",
                config.time_offset,
                record_size
            );
        }

        let mut axes = Vec::new();
        let mut axis_offsets = Vec::new();
        for axis in config.context.unwrap_or_default() {
            if axis.offset >= record_size {
                bail!(
                    "context axis {} at offset {} is outside the record",
                    axis.name,
                    axis.offset
                );
            }
            axis_offsets.push(axis.offset);
            axes.push(ContextAxis::new(axis.name, axis.labels));
        }
        let schema = ContextSchema::validated(axes)?;

        let mut parameters = Vec::new();
        let mut seen = HashSet::new();
        for param in config.parameters {
            if param.name.contains('"') || param.unit.contains('"') {
                bail!("parameter names and units may not contain '\"'");
            }
            if !seen.insert((param.name.clone(), param.unit.clone())) {
                bail!("parameter {} ({}) is defined twice", param.name, param.unit);
            }
            let end = param.offset.checked_add(param.kind.size());
            if end.map_or(true, |end| end > record_size) {
                bail!(
                    "parameter {} ({} at offset {}) does not fit in a {} byte record",
                    param.name,
                    param.kind,
                    param.offset,
                    record_size
                );
            }
            parameters.push(ParameterField {
                desc: ParameterDesc::new(param.name, param.unit, param.kind),
                offset: param.offset,
            });
        }

        Ok(RecordLayout {
            record_size,
            header_size: config.header_size.unwrap_or(0),
            time_offset: config.time_offset,
            axis_offsets,
            schema: Arc::new(schema),
            parameters,
        })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    pub fn schema(&self) -> &Arc<ContextSchema> {
        &self.schema
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDesc> {
        self.parameters.iter().map(|p| &p.desc)
    }

    /// Decode the timestamp of `record`.
    pub fn record_time(&self, record: &[u8]) -> Option<OrderedTime> {
        let raw: [u8; TIME_SIZE] = record
            .get(self.time_offset..self.time_offset + TIME_SIZE)?
            .try_into()
            .ok()?;
        Some(OrderedTime::from_millis(i64::from_le_bytes(raw)))
    }

    /// Decode the operating context of `record`.
    ///
    /// `None` if a byte is beyond its axis' labels.
    pub fn record_context(&self, record: &[u8]) -> Option<OperatingContext> {
        let values = self
            .axis_offsets
            .iter()
            .zip(self.schema.axes())
            .map(|(&offset, axis)| {
                let value = *record.get(offset)?;
                (usize::from(value) < axis.len()).then_some(value)
            })
            .collect::<Option<Vec<u8>>>()?;
        Some(OperatingContext::new(values))
    }
}

impl ParameterCatalog for RecordLayout {
    fn lookup(&self, name: &str, unit: &str) -> Option<ParameterDesc> {
        self.parameters
            .iter()
            .find(|p| p.desc.matches(name, unit))
            .map(|p| p.desc.clone())
    }
}

impl Extractor for RecordLayout {
    type Record = [u8];

    fn extract_time(&self, record: &[u8]) -> Option<OrderedTime> {
        self.record_time(record)
    }

    fn extract(
        &self,
        param: &ParameterDesc,
        record: &[u8],
    ) -> Option<(Scalar, OperatingContext)> {
        let field = self.parameters.iter().find(|p| p.desc == *param)?;
        let value = param.kind.from_le_bytes(record.get(field.offset..)?)?;
        Some((value, self.record_context(record)?))
    }
}
