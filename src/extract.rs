//! Interfaces to the record extraction layer.
//!
//! The engine never decodes records itself. An [`Extractor`] pulls the time,
//! a parameter's raw value and the operating context out of a record; a
//! [`ParameterCatalog`] resolves the names used in limits files.
//! [`crate::layout::RecordLayout`] implements both for flat binary records.

use crate::context::OperatingContext;
use crate::scalar::{Scalar, ScalarKind};
use crate::time::OrderedTime;

/// Identity and storage kind of a monitored parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterDesc {
    pub name: String,
    pub unit: String,
    pub kind: ScalarKind,
}

impl ParameterDesc {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, kind: ScalarKind) -> Self {
        ParameterDesc {
            name: name.into(),
            unit: unit.into(),
            kind,
        }
    }

    /// True if `name` and `unit` identify this parameter.
    pub fn matches(&self, name: &str, unit: &str) -> bool {
        self.name == name && self.unit == unit
    }
}

pub trait ParameterCatalog {
    fn lookup(&self, name: &str, unit: &str) -> Option<ParameterDesc>;
}

pub trait Extractor {
    type Record: ?Sized;

    fn extract_time(&self, record: &Self::Record) -> Option<OrderedTime>;

    /// The parameter's value and the context it was sampled in.
    ///
    /// `None` means the sample is absent from this record.
    fn extract(
        &self,
        param: &ParameterDesc,
        record: &Self::Record,
    ) -> Option<(Scalar, OperatingContext)>;
}

impl ParameterCatalog for [ParameterDesc] {
    fn lookup(&self, name: &str, unit: &str) -> Option<ParameterDesc> {
        self.iter().find(|p| p.matches(name, unit)).cloned()
    }
}

impl ParameterCatalog for Vec<ParameterDesc> {
    fn lookup(&self, name: &str, unit: &str) -> Option<ParameterDesc> {
        self.as_slice().lookup(name, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_catalog() {
        let catalog = vec![
            ParameterDesc::new("TWT Temp", "degC", ScalarKind::F32),
            ParameterDesc::new("TWT Temp", "raw", ScalarKind::U16),
        ];
        assert_eq!(
            catalog.lookup("TWT Temp", "raw").map(|p| p.kind),
            Some(ScalarKind::U16)
        );
        assert!(catalog.lookup("TWT Temp", "K").is_none());
        assert!(catalog.lookup("twt temp", "degC").is_none());
    }
}
