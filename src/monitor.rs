//! Running many checkers over a record stream.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::debug;

use crate::checker::{CheckOutcome, LimitChecker};
use crate::context::ContextSchema;
use crate::error::LimitError;
use crate::extract::Extractor;
use crate::zone::AlarmZone;

/// Coarse severity of a zone, used for the run's worst status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Ok,
    Caution,
    Action,
}

impl From<AlarmZone> for Severity {
    fn from(zone: AlarmZone) -> Self {
        match zone {
            AlarmZone::Ok => Severity::Ok,
            AlarmZone::CautionLow | AlarmZone::CautionHigh => Severity::Caution,
            AlarmZone::ActionLow | AlarmZone::ActionHigh => Severity::Action,
        }
    }
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub records: usize,
    pub records_without_time: usize,
    pub samples: usize,
    pub absent: usize,
    pub reports: usize,
}

/// The set of checkers for one telemetry source.
#[derive(Debug, Clone)]
pub struct LimitList {
    schema: Arc<ContextSchema>,
    checkers: Vec<LimitChecker>,
    worst: Severity,
    stats: RunStats,
}

impl LimitList {
    pub fn new(schema: Arc<ContextSchema>) -> Self {
        LimitList {
            schema,
            checkers: Vec::new(),
            worst: Severity::Ok,
            stats: RunStats::default(),
        }
    }

    /// Build a list from `checkers`, which must all use `schema`.
    pub fn with_checkers(
        schema: Arc<ContextSchema>,
        checkers: Vec<LimitChecker>,
    ) -> Result<Self, LimitError> {
        let mut list = Self::new(schema);
        for checker in checkers {
            list.insert(checker)?;
        }
        Ok(list)
    }

    pub fn schema(&self) -> &Arc<ContextSchema> {
        &self.schema
    }

    /// Add a checker, replacing any existing one for the same parameter.
    ///
    /// The checker's context schema must equal the list's, since every
    /// checker reads its context from the same records.
    pub fn insert(&mut self, checker: LimitChecker) -> Result<Option<LimitChecker>, LimitError> {
        if !Arc::ptr_eq(checker.schema(), &self.schema) && **checker.schema() != *self.schema {
            return Err(LimitError::SchemaMismatch {
                param: checker.param().name.clone(),
            });
        }
        let param = checker.param();
        Ok(match self
            .checkers
            .iter()
            .position(|c| c.param().matches(&param.name, &param.unit))
        {
            Some(index) => Some(std::mem::replace(&mut self.checkers[index], checker)),
            None => {
                self.checkers.push(checker);
                None
            }
        })
    }

    pub fn get(&self, name: &str, unit: &str) -> Option<&LimitChecker> {
        self.checkers.iter().find(|c| c.param().matches(name, unit))
    }

    pub fn get_mut(&mut self, name: &str, unit: &str) -> Option<&mut LimitChecker> {
        self.checkers.iter_mut().find(|c| c.param().matches(name, unit))
    }

    pub fn remove(&mut self, name: &str, unit: &str) -> Option<LimitChecker> {
        let index = self
            .checkers
            .iter()
            .position(|c| c.param().matches(name, unit))?;
        Some(self.checkers.remove(index))
    }

    pub fn checkers(&self) -> &[LimitChecker] {
        &self.checkers
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Worst severity of any classified sample so far.
    pub fn worst(&self) -> Severity {
        self.worst
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run one record through every checker, in list order.
    ///
    /// A record without a usable time is skipped as a whole.
    pub fn check_record<E: Extractor>(
        &mut self,
        extractor: &E,
        record: &E::Record,
        sink: &mut dyn Write,
    ) -> io::Result<()> {
        self.stats.records += 1;
        let Some(time) = extractor.extract_time(record) else {
            debug!("record {} has no time, skipped", self.stats.records);
            self.stats.records_without_time += 1;
            return Ok(());
        };

        for checker in &mut self.checkers {
            if !checker.is_enabled() {
                continue;
            }
            let Some((value, ctx)) = extractor.extract(checker.param(), record) else {
                self.stats.absent += 1;
                continue;
            };
            match checker.check(time, value, ctx, sink)? {
                CheckOutcome::Disabled => {}
                CheckOutcome::Absent => self.stats.absent += 1,
                CheckOutcome::Classified { zone, report } => {
                    self.stats.samples += 1;
                    if report.is_some() {
                        self.stats.reports += 1;
                    }
                    self.worst = self.worst.max(Severity::from(zone));
                }
            }
        }
        Ok(())
    }

    /// Write the final report of every checker left outside `Ok`.
    ///
    /// Returns how many checkers reported.
    pub fn final_report(&self, sink: &mut dyn Write) -> io::Result<usize> {
        let mut written = 0;
        for checker in &self.checkers {
            if checker.final_report(sink)? {
                written += 1;
            }
        }
        Ok(written)
    }
}
