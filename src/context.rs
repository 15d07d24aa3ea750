//! Operating contexts.
//!
//! A context is one small integer per axis (instrument mode, HV power
//! supply state, and so on). The [`ContextSchema`] names the axes and maps
//! each full context to a slot offset so a checker can hold one threshold set
//! per combination.

use std::collections::HashSet;
use std::fmt;

use crate::error::SchemaError;

/// One dimension of the operating context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAxis {
    name: String,
    labels: Vec<String>,
}

impl ContextAxis {
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        ContextAxis {
            name: name.into(),
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of distinct values on this axis.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Resolve a label (case-insensitive) or a numeric index to a value.
    pub fn value_of(&self, text: &str) -> Option<u8> {
        let text = text.trim();
        if let Some(pos) = self
            .labels
            .iter()
            .position(|label| label.eq_ignore_ascii_case(text))
        {
            return u8::try_from(pos).ok();
        }
        text.parse::<u8>()
            .ok()
            .filter(|v| usize::from(*v) < self.labels.len())
    }

    pub fn label(&self, value: u8) -> Option<&str> {
        self.labels.get(usize::from(value)).map(String::as_str)
    }
}

/// A concrete operating context: one value per schema axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OperatingContext(Vec<u8>);

impl OperatingContext {
    pub fn new(values: Vec<u8>) -> Self {
        OperatingContext(values)
    }

    pub fn values(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for OperatingContext {
    fn from(values: Vec<u8>) -> Self {
        OperatingContext(values)
    }
}

impl fmt::Display for OperatingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// The axes making up an operating context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSchema {
    axes: Vec<ContextAxis>,
}

impl ContextSchema {
    pub fn new(axes: Vec<ContextAxis>) -> Self {
        ContextSchema { axes }
    }

    /// Like [`ContextSchema::new`], but rejects axes that can't be written
    /// as `Axis=Label` context ids and read back.
    pub fn validated(axes: Vec<ContextAxis>) -> Result<Self, SchemaError> {
        let mut names = HashSet::new();
        for axis in &axes {
            if !is_context_token(&axis.name) || axis.name.contains('=') {
                return Err(SchemaError::AxisName(axis.name.clone()));
            }
            if !names.insert(axis.name.to_ascii_lowercase()) {
                return Err(SchemaError::DuplicateAxis(axis.name.clone()));
            }
            if axis.labels.is_empty() || axis.labels.len() > usize::from(u8::MAX) + 1 {
                return Err(SchemaError::LabelCount {
                    axis: axis.name.clone(),
                    count: axis.labels.len(),
                });
            }
            if let Some(bad) = axis.labels.iter().find(|l| !is_context_token(l)) {
                return Err(SchemaError::Label {
                    axis: axis.name.clone(),
                    label: bad.clone(),
                });
            }
        }
        Ok(ContextSchema { axes })
    }

    pub fn axes(&self) -> &[ContextAxis] {
        &self.axes
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes
            .iter()
            .position(|axis| axis.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Number of distinct contexts. An empty schema has exactly one.
    pub fn num_contexts(&self) -> usize {
        self.axes.iter().map(ContextAxis::len).product()
    }

    /// Slot offset of `ctx`, first axis most significant.
    ///
    /// `None` when the arity is wrong or a value is past its axis.
    pub fn offset(&self, ctx: &OperatingContext) -> Option<usize> {
        if ctx.0.len() != self.axes.len() {
            return None;
        }
        self.axes
            .iter()
            .zip(&ctx.0)
            .try_fold(0usize, |acc, (axis, &value)| {
                let value = usize::from(value);
                (value < axis.len()).then(|| acc * axis.len() + value)
            })
    }

    /// Inverse of [`ContextSchema::offset`].
    pub fn context_at(&self, mut offset: usize) -> Option<OperatingContext> {
        if offset >= self.num_contexts() {
            return None;
        }
        let mut values = vec![0u8; self.axes.len()];
        for (slot, axis) in values.iter_mut().zip(&self.axes).rev() {
            *slot = u8::try_from(offset % axis.len()).ok()?;
            offset /= axis.len();
        }
        Some(OperatingContext(values))
    }

    /// Render as `Mode=SBM, HVPS=ON`. Values past an axis print numerically.
    pub fn describe(&self, ctx: &OperatingContext) -> String {
        self.axes
            .iter()
            .zip(&ctx.0)
            .map(|(axis, &value)| match axis.label(value) {
                Some(label) => format!("{}={}", axis.name, label),
                None => format!("{}={}", axis.name, value),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Previous and current context of one checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPair {
    previous: OperatingContext,
    current: OperatingContext,
    changed: bool,
}

impl ContextPair {
    pub fn new(initial: OperatingContext) -> Self {
        ContextPair {
            previous: initial.clone(),
            current: initial,
            changed: false,
        }
    }

    /// Shift current into previous, store `new`, and report whether they differ.
    pub fn advance(&mut self, new: OperatingContext) -> bool {
        self.previous = std::mem::replace(&mut self.current, new);
        self.changed = self.previous != self.current;
        self.changed
    }

    pub fn previous(&self) -> &OperatingContext {
        &self.previous
    }

    pub fn current(&self) -> &OperatingContext {
        &self.current
    }

    pub fn changed(&self) -> bool {
        self.changed
    }
}

fn is_context_token(text: &str) -> bool {
    !text.is_empty() && !text.contains(char::is_whitespace) && !text.contains('*')
}
