//! Worst-excursion tracking for one parameter.

use crate::scalar::Scalar;
use crate::time::OrderedTime;
use crate::zone::AlarmZone;

/// A value and the time it was observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremeValueRecord {
    pub value: Scalar,
    pub timestamp: OrderedTime,
}

/// Most extreme value seen since the parameter left `Ok`.
///
/// After [`clear`](ExtremeValueTracker::clear) the record still holds the
/// caution boundary it was reset to, but [`has_value`](Self::has_value) is
/// false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtremeValueTracker {
    record: Option<ExtremeValueRecord>,
    has_value: bool,
}

impl ExtremeValueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt `value` unconditionally.
    pub fn set(&mut self, value: Scalar, timestamp: OrderedTime) {
        self.record = Some(ExtremeValueRecord { value, timestamp });
        self.has_value = true;
    }

    /// Adopt `value` if it is further out in the direction of `zone`.
    ///
    /// Returns true if the record changed. `Ok` never updates.
    pub fn update(&mut self, zone: AlarmZone, value: Scalar, timestamp: OrderedTime) -> bool {
        let more_extreme = match (&self.record, self.has_value) {
            (Some(current), true) => {
                if zone.is_low() {
                    value < current.value
                } else if zone.is_high() {
                    value > current.value
                } else {
                    false
                }
            }
            _ => !zone.is_ok(),
        };
        if more_extreme {
            self.set(value, timestamp);
        }
        more_extreme
    }

    /// Reset to the caution `boundary` after returning to `Ok`.
    pub fn clear(&mut self, boundary: Scalar, timestamp: OrderedTime) {
        self.record = Some(ExtremeValueRecord {
            value: boundary,
            timestamp,
        });
        self.has_value = false;
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    /// The stored record, whether tracked or a cleared boundary.
    pub fn record(&self) -> Option<&ExtremeValueRecord> {
        self.record.as_ref()
    }

    /// The tracked extreme, `None` unless a value is being tracked.
    pub fn extreme(&self) -> Option<&ExtremeValueRecord> {
        self.record.as_ref().filter(|_| self.has_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ms: i64) -> OrderedTime {
        OrderedTime::from_millis(ms)
    }

    #[test]
    fn test_update_high_keeps_maximum() {
        let mut tracker = ExtremeValueTracker::new();
        tracker.set(Scalar::I32(25), t(1));
        assert!(tracker.update(AlarmZone::ActionHigh, Scalar::I32(35), t(2)));
        assert!(!tracker.update(AlarmZone::CautionHigh, Scalar::I32(25), t(3)));
        let rec = tracker.extreme().unwrap();
        assert_eq!(rec.value, Scalar::I32(35));
        assert_eq!(rec.timestamp, t(2));
    }

    #[test]
    fn test_update_low_keeps_minimum() {
        let mut tracker = ExtremeValueTracker::new();
        tracker.set(Scalar::F32(5.0), t(1));
        assert!(!tracker.update(AlarmZone::CautionLow, Scalar::F32(6.0), t(2)));
        assert!(tracker.update(AlarmZone::CautionLow, Scalar::F32(4.0), t(3)));
        assert_eq!(tracker.extreme().unwrap().value, Scalar::F32(4.0));
    }

    #[test]
    fn test_clear_keeps_boundary() {
        let mut tracker = ExtremeValueTracker::new();
        tracker.set(Scalar::I32(35), t(1));
        tracker.clear(Scalar::I32(20), t(5));
        assert!(!tracker.has_value());
        assert!(tracker.extreme().is_none());
        assert_eq!(tracker.record().unwrap().value, Scalar::I32(20));

        // first update after a clear adopts the value
        assert!(tracker.update(AlarmZone::CautionHigh, Scalar::I32(21), t(6)));
        assert_eq!(tracker.extreme().unwrap().value, Scalar::I32(21));
    }

    #[test]
    fn test_ok_never_updates() {
        let mut tracker = ExtremeValueTracker::new();
        assert!(!tracker.update(AlarmZone::Ok, Scalar::I32(1), t(1)));
        assert!(tracker.record().is_none());
    }
}
