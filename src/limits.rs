//! Limits definition files.
//!
//! One entry per line:
//!
//! ```text
//! "TWT Temp" "degC" Caution:(10, 20) Action:(0, 30) 1 Mode=SBM HVPS=*
//! ```
//!
//! The trailing `0|1` enables or disables the parameter. Context ids are
//! `Axis=Label` (label matched case-insensitively, or a numeric index) or
//! `Axis=*`; axes not named match every value. Blank lines and lines
//! starting with `#` are ignored, and later entries override earlier ones for
//! the same context. Lines that can't be used are skipped and returned as
//! [`SkippedEntry`] values rather than failing the whole load.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::checker::LimitChecker;
use crate::context::ContextSchema;
use crate::extract::ParameterCatalog;
use crate::scalar::ScalarKind;
use crate::zone::ThresholdSet;

static LIMIT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*"(?P<name>[^"]+)"\s+"(?P<unit>[^"]*)"\s+Caution:\s*\(\s*(?P<cl>[^,()\s]+)\s*,\s*(?P<ch>[^,()\s]+)\s*\)\s+Action:\s*\(\s*(?P<al>[^,()\s]+)\s*,\s*(?P<ah>[^,()\s]+)\s*\)\s+(?P<enable>[01])(?P<contexts>(?:\s+\S+)*)\s*$"#,
    )
    .expect("Invalid limit line regex pattern")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep checkers whose entries are disabled.
    pub keep_disabled: bool,
}

/// A line that was ignored while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LimitLoad {
    /// Checkers in order of first appearance.
    pub checkers: Vec<LimitChecker>,
    pub skipped: Vec<SkippedEntry>,
}

struct Entry<'a> {
    name: &'a str,
    unit: &'a str,
    thresholds: [&'a str; 4],
    enabled: bool,
    contexts: Vec<&'a str>,
}

fn parse_line(line: &str) -> Option<Entry<'_>> {
    let caps = LIMIT_LINE_RE.captures(line)?;
    let get = |name| caps.name(name).map_or("", |m| m.as_str());
    Some(Entry {
        name: get("name"),
        unit: get("unit"),
        thresholds: [get("cl"), get("ch"), get("al"), get("ah")],
        enabled: get("enable") == "1",
        contexts: get("contexts").split_whitespace().collect(),
    })
}

/// Per-axis constraint: `None` matches every value.
fn parse_contexts(schema: &ContextSchema, ids: &[&str]) -> Result<Vec<Option<u8>>, String> {
    let mut wanted = vec![None; schema.axes().len()];
    let mut named = vec![false; schema.axes().len()];
    for id in ids {
        let (axis_name, label) = id
            .split_once('=')
            .ok_or_else(|| format!("context id '{id}' is not Axis=Label"))?;
        let index = schema
            .axis_index(axis_name)
            .ok_or_else(|| format!("unknown context axis '{axis_name}'"))?;
        if std::mem::replace(&mut named[index], true) {
            return Err(format!("context axis '{axis_name}' given twice"));
        }
        if label == "*" {
            continue;
        }
        let axis = &schema.axes()[index];
        let value = axis
            .value_of(label)
            .ok_or_else(|| format!("unknown {} value '{label}'", axis.name()))?;
        wanted[index] = Some(value);
    }
    Ok(wanted)
}

fn build_thresholds(kind: ScalarKind, raw: [&str; 4]) -> Result<ThresholdSet, String> {
    let mut values = Vec::with_capacity(4);
    for text in raw {
        values.push(kind.parse(text).map_err(|e| e.to_string())?);
    }
    ThresholdSet::new(values[0], values[1], values[2], values[3]).map_err(|e| e.to_string())
}

/// Load limits from `reader`.
///
/// Only I/O failures are errors; unusable lines end up in
/// [`LimitLoad::skipped`].
pub fn load_limits<R, C>(
    reader: R,
    catalog: &C,
    schema: &Arc<ContextSchema>,
    options: LoadOptions,
) -> Result<LimitLoad>
where
    R: BufRead,
    C: ParameterCatalog + ?Sized,
{
    let mut checkers: Vec<LimitChecker> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut skipped = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let number = number + 1;
        let line = line.with_context(|| format!("failed to read limits line {number}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut skip = |reason: String| {
            warn!("Skipping limits line {}: {} ({})", number, reason, trimmed);
            skipped.push(SkippedEntry {
                line: number,
                text: trimmed.to_string(),
                reason,
            });
        };

        let Some(entry) = parse_line(trimmed) else {
            skip("not a limits entry".to_string());
            continue;
        };

        let key = (entry.name.to_string(), entry.unit.to_string());
        let existing = index.get(&key).copied();
        let param = match existing {
            Some(slot) => checkers[slot].param().clone(),
            None => match catalog.lookup(entry.name, entry.unit) {
                Some(param) => param,
                None => {
                    skip(format!(
                        "no such parameter \"{}\" \"{}\"",
                        entry.name, entry.unit
                    ));
                    continue;
                }
            },
        };

        let set = match build_thresholds(param.kind, entry.thresholds) {
            Ok(set) => set,
            Err(reason) => {
                skip(reason);
                continue;
            }
        };
        let wanted = match parse_contexts(schema, &entry.contexts) {
            Ok(wanted) => wanted,
            Err(reason) => {
                skip(reason);
                continue;
            }
        };

        // the parameter's enable flag comes from its first accepted line
        let slot = match existing {
            Some(slot) => {
                if checkers[slot].is_enabled() != entry.enabled {
                    skip("enable flag conflicts with an earlier entry".to_string());
                    continue;
                }
                slot
            }
            None => {
                checkers.push(LimitChecker::empty(param, schema.clone(), entry.enabled));
                index.insert(key, checkers.len() - 1);
                checkers.len() - 1
            }
        };
        let checker = &mut checkers[slot];

        for offset in 0..schema.num_contexts() {
            let Some(ctx) = schema.context_at(offset) else {
                continue;
            };
            let matches = wanted
                .iter()
                .zip(ctx.values())
                .all(|(want, value)| want.map_or(true, |w| w == *value));
            if !matches {
                continue;
            }
            if checker.set_thresholds(&ctx, set)?.is_some() {
                debug!(
                    "{}: line {} overrides thresholds for {}",
                    checker.param().name,
                    number,
                    schema.describe(&ctx)
                );
            }
        }
    }

    if !options.keep_disabled {
        let before = checkers.len();
        checkers.retain(LimitChecker::is_enabled);
        if before != checkers.len() {
            debug!("Dropped {} disabled parameters", before - checkers.len());
        }
    }

    info!(
        "Loaded limits for {} parameters ({} lines skipped)",
        checkers.len(),
        skipped.len()
    );
    Ok(LimitLoad { checkers, skipped })
}

pub fn load_limits_file<C>(
    path: &Path,
    catalog: &C,
    schema: &Arc<ContextSchema>,
    options: LoadOptions,
) -> Result<LimitLoad>
where
    C: ParameterCatalog + ?Sized,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open limits file {}", path.display()))?;
    load_limits(BufReader::new(file), catalog, schema, options)
        .with_context(|| format!("Failed to load limits from {}", path.display()))
}

/// Write one line per defined context slot, every axis spelled out.
pub fn write_limits<'a, W, I>(mut writer: W, checkers: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a LimitChecker>,
{
    for checker in checkers {
        let param = checker.param();
        let schema = checker.schema();
        for (ctx, set) in checker.defined_slots() {
            write!(
                writer,
                "\"{}\" \"{}\" Caution:({}, {}) Action:({}, {}) {}",
                param.name,
                param.unit,
                set.caution_low(),
                set.caution_high(),
                set.action_low(),
                set.action_high(),
                u8::from(checker.is_enabled())
            )?;
            for (axis, value) in schema.axes().iter().zip(ctx.values()) {
                match axis.label(*value) {
                    Some(label) => write!(writer, " {}={}", axis.name(), label)?,
                    None => write!(writer, " {}={}", axis.name(), value)?,
                }
            }
            writeln!(writer)?;
        }
    }
    writer.flush()
}

pub fn write_limits_file<'a, I>(path: &Path, checkers: I) -> Result<()>
where
    I: IntoIterator<Item = &'a LimitChecker>,
{
    let file = File::create(path)
        .with_context(|| format!("Failed to create limits file {}", path.display()))?;
    write_limits(io::BufWriter::new(file), checkers)
        .with_context(|| format!("Failed to write limits file {}", path.display()))
}
