//! Per-parameter limit checking.
//!
//! A [`LimitChecker`] owns one threshold slot per operating context, the
//! current alarm zone, the worst excursion seen since leaving `Ok`, and the
//! previous/current context. Each usable sample goes through
//! [`transition::step`] and the resulting actions are applied here.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::{ContextPair, ContextSchema, OperatingContext};
use crate::error::{LimitError, ThresholdError};
use crate::extract::ParameterDesc;
use crate::extreme::ExtremeValueTracker;
use crate::report::{self, ReportClass};
use crate::scalar::Scalar;
use crate::time::OrderedTime;
use crate::transition::{self, StatusPrint, TrackerOp};
use crate::zone::{AlarmZone, ThresholdSet};

/// What [`LimitChecker::check`] did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The checker is disabled; the sample was ignored.
    Disabled,
    /// The sample could not be used; no state changed.
    Absent,
    /// The sample was classified, and possibly reported.
    Classified {
        zone: AlarmZone,
        report: Option<ReportClass>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitChecker {
    param: ParameterDesc,
    schema: Arc<ContextSchema>,
    thresholds: Vec<Option<ThresholdSet>>,
    zone: AlarmZone,
    tracker: ExtremeValueTracker,
    contexts: Option<ContextPair>,
    enabled: bool,
}

impl LimitChecker {
    /// Build a checker with one threshold slot per context of `schema`.
    pub fn new(
        param: ParameterDesc,
        schema: Arc<ContextSchema>,
        thresholds: Vec<Option<ThresholdSet>>,
        enabled: bool,
    ) -> Result<Self, LimitError> {
        let expected = schema.num_contexts();
        if thresholds.len() != expected {
            return Err(LimitError::SlotCount {
                param: param.name.clone(),
                expected,
                got: thresholds.len(),
            });
        }
        for set in thresholds.iter().flatten() {
            check_kind(&param, set)?;
        }

        Ok(LimitChecker {
            param,
            schema,
            thresholds,
            zone: AlarmZone::Ok,
            tracker: ExtremeValueTracker::new(),
            contexts: None,
            enabled,
        })
    }

    /// A checker with no thresholds defined yet.
    pub fn empty(param: ParameterDesc, schema: Arc<ContextSchema>, enabled: bool) -> Self {
        let slots = schema.num_contexts();
        LimitChecker {
            param,
            schema,
            thresholds: vec![None; slots],
            zone: AlarmZone::Ok,
            tracker: ExtremeValueTracker::new(),
            contexts: None,
            enabled,
        }
    }

    pub fn param(&self) -> &ParameterDesc {
        &self.param
    }

    pub fn schema(&self) -> &Arc<ContextSchema> {
        &self.schema
    }

    pub fn zone(&self) -> AlarmZone {
        self.zone
    }

    pub fn tracker(&self) -> &ExtremeValueTracker {
        &self.tracker
    }

    pub fn contexts(&self) -> Option<&ContextPair> {
        self.contexts.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enable(&mut self) {
        self.set_enabled(true);
    }

    pub fn disable(&mut self) {
        self.set_enabled(false);
    }

    pub fn thresholds(&self, ctx: &OperatingContext) -> Option<&ThresholdSet> {
        let offset = self.schema.offset(ctx)?;
        self.thresholds.get(offset)?.as_ref()
    }

    /// Every context with thresholds defined, in slot order.
    pub fn defined_slots(&self) -> impl Iterator<Item = (OperatingContext, &ThresholdSet)> + '_ {
        self.thresholds
            .iter()
            .enumerate()
            .filter_map(|(offset, set)| Some((self.schema.context_at(offset)?, set.as_ref()?)))
    }

    /// Install `set` for `ctx`, returning the set it replaced.
    pub fn set_thresholds(
        &mut self,
        ctx: &OperatingContext,
        set: ThresholdSet,
    ) -> Result<Option<ThresholdSet>, LimitError> {
        check_kind(&self.param, &set)?;
        let slot = self
            .schema
            .offset(ctx)
            .and_then(|offset| self.thresholds.get_mut(offset))
            .ok_or_else(|| LimitError::ContextOutOfRange {
                param: self.param.name.clone(),
                context: ctx.to_string(),
            })?;
        Ok(slot.replace(set))
    }

    /// Feed one sample taken at `time` in context `ctx`.
    ///
    /// Reports are written to `sink`. Checker state is updated before
    /// anything is written, so a failed write loses only the text.
    pub fn check(
        &mut self,
        time: OrderedTime,
        value: Scalar,
        ctx: OperatingContext,
        sink: &mut dyn Write,
    ) -> io::Result<CheckOutcome> {
        if !self.enabled {
            return Ok(CheckOutcome::Disabled);
        }
        if value.is_nan() {
            warn!("{}: NaN sample at {} ignored", self.param.name, time);
            return Ok(CheckOutcome::Absent);
        }
        let Some(set) = self.thresholds(&ctx).copied() else {
            debug!(
                "{}: no thresholds for context {} at {}",
                self.param.name, ctx, time
            );
            return Ok(CheckOutcome::Absent);
        };
        let Ok(new) = set.classify(value) else {
            debug!(
                "{}: {} sample does not match {} thresholds",
                self.param.name,
                value.kind(),
                set.kind()
            );
            return Ok(CheckOutcome::Absent);
        };

        if self.contexts.is_none() {
            self.contexts = Some(ContextPair::new(ctx));
            return self.first_sample(time, value, new, &set, sink);
        }
        let changed = self
            .contexts
            .as_mut()
            .is_some_and(|pair| pair.advance(ctx));

        let old = self.zone;
        let actions = transition::step(old, new, changed);
        let previous_extreme = self.tracker.record().copied();

        match actions.tracker {
            Some(TrackerOp::Set) => self.tracker.set(value, time),
            Some(TrackerOp::Update) => {
                self.tracker.update(new, value, time);
            }
            Some(TrackerOp::Clear) => self.tracker.clear(set.caution_boundary(old), time),
            None => {}
        }
        self.zone = new;

        if !actions.reports() {
            return Ok(CheckOutcome::Classified {
                zone: new,
                report: None,
            });
        }

        report::write_header(sink, time, &self.param)?;
        if let (Some(which), Some(record)) = (actions.extreme, previous_extreme.as_ref()) {
            report::write_extreme(sink, which, record, &self.param)?;
        }
        if let (Some(which), Some(pair)) = (actions.context, self.contexts.as_ref()) {
            report::write_context(sink, which, &self.schema, pair)?;
        }
        let class = match actions.status {
            Some(StatusPrint::Entered) | Some(StatusPrint::Changed) | None => {
                if let Some(limit) = set.limit(new) {
                    report::write_alarm(sink, false, new, value, limit, &self.param)?;
                }
                ReportClass::Transition
            }
            Some(StatusPrint::Returned) => {
                if let Some(limit) = set.limit(old) {
                    report::write_returned(sink, old, value, limit, &self.param)?;
                }
                ReportClass::Cleared
            }
            Some(StatusPrint::ValueOk) => {
                report::write_value_ok(sink, value, &self.param)?;
                ReportClass::ContextChange
            }
        };

        Ok(CheckOutcome::Classified {
            zone: new,
            report: Some(class),
        })
    }

    fn first_sample(
        &mut self,
        time: OrderedTime,
        value: Scalar,
        zone: AlarmZone,
        set: &ThresholdSet,
        sink: &mut dyn Write,
    ) -> io::Result<CheckOutcome> {
        self.zone = zone;
        let Some(limit) = set.limit(zone) else {
            return Ok(CheckOutcome::Classified { zone, report: None });
        };
        self.tracker.set(value, time);

        report::write_header(sink, time, &self.param)?;
        if let Some(pair) = self.contexts.as_ref() {
            report::write_context(sink, transition::ContextPrint::Current, &self.schema, pair)?;
        }
        report::write_alarm(sink, true, zone, value, limit, &self.param)?;
        Ok(CheckOutcome::Classified {
            zone,
            report: Some(ReportClass::Initial),
        })
    }

    /// Summarize an excursion still open at the end of a run.
    ///
    /// Returns whether anything was written.
    pub fn final_report(&self, sink: &mut dyn Write) -> io::Result<bool> {
        if self.zone.is_ok() {
            return Ok(false);
        }
        match self.tracker.record() {
            Some(record) => {
                report::write_final(sink, self.zone, record, &self.param)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn check_kind(param: &ParameterDesc, set: &ThresholdSet) -> Result<(), LimitError> {
    if set.kind() != param.kind {
        return Err(LimitError::Thresholds {
            param: param.name.clone(),
            source: ThresholdError::KindMismatch {
                expected: param.kind,
                got: set.kind(),
            },
        });
    }
    Ok(())
}
