//! The alarm transition decision function.
//!
//! [`step`] maps `(old zone, new zone, context changed)` to the ordered list
//! of things a checker must do: print a header, print the worst value of the
//! excursion being left, adjust the extreme tracker, print the context, and
//! print a status line. It has no side effects; [`crate::checker`] carries
//! the actions out.

use crate::zone::AlarmZone;

/// Which tracked extreme to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremePrint {
    /// Lowest value; `old_state` selects the "in old state" wording.
    Lowest { old_state: bool },
    Highest { old_state: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerOp {
    Set,
    Update,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPrint {
    Current,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPrint {
    /// Left `Ok`: "Above/Below the ... limit".
    Entered,
    /// Back to `Ok`: "Returned above/below the ... limit".
    Returned,
    /// Moved between two non-`Ok` zones.
    Changed,
    /// `Ok` in both contexts across a context change.
    ValueOk,
}

/// Actions for one sample, applied in field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub header: bool,
    pub extreme: Option<ExtremePrint>,
    pub tracker: Option<TrackerOp>,
    pub context: Option<ContextPrint>,
    pub status: Option<StatusPrint>,
}

impl ActionSet {
    /// True if the set writes anything to the alarm log.
    pub fn reports(&self) -> bool {
        self.header
    }
}

/// Decide what a zone change from `old` to `new` requires.
pub fn step(old: AlarmZone, new: AlarmZone, context_changed: bool) -> ActionSet {
    let header = old != new || context_changed;
    if !header {
        // same zone, same context: only the extreme may move
        return ActionSet {
            tracker: (!new.is_ok()).then_some(TrackerOp::Update),
            ..ActionSet::default()
        };
    }

    let extreme = if old.is_low() {
        Some(ExtremePrint::Lowest {
            old_state: context_changed,
        })
    } else if old.is_high() {
        Some(ExtremePrint::Highest {
            old_state: context_changed,
        })
    } else {
        None
    };

    let retreat = matches!(
        (old, new),
        (AlarmZone::ActionLow, AlarmZone::CautionLow)
            | (AlarmZone::ActionHigh, AlarmZone::CautionHigh)
    );
    let tracker = if new.is_ok() {
        (!old.is_ok()).then_some(TrackerOp::Clear)
    } else if retreat && !context_changed {
        Some(TrackerOp::Update)
    } else {
        Some(TrackerOp::Set)
    };

    let context = Some(if context_changed {
        ContextPrint::Change
    } else {
        ContextPrint::Current
    });

    let status = Some(match (old.is_ok(), new.is_ok()) {
        (true, true) => StatusPrint::ValueOk,
        (true, false) => StatusPrint::Entered,
        (false, true) => StatusPrint::Returned,
        (false, false) => StatusPrint::Changed,
    });

    ActionSet {
        header,
        extreme,
        tracker,
        context,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AlarmZone::*;

    #[test]
    fn test_ok_to_ok_unchanged_is_silent() {
        assert_eq!(step(Ok, Ok, false), ActionSet::default());
        assert!(!step(Ok, Ok, false).reports());
    }

    #[test]
    fn test_ok_to_ok_changed_context() {
        assert_eq!(
            step(Ok, Ok, true),
            ActionSet {
                header: true,
                extreme: None,
                tracker: None,
                context: Some(ContextPrint::Change),
                status: Some(StatusPrint::ValueOk),
            }
        );
    }

    #[test]
    fn test_same_zone_updates_silently() {
        for zone in [ActionLow, CautionLow, CautionHigh, ActionHigh] {
            let actions = step(zone, zone, false);
            assert!(!actions.reports());
            assert_eq!(actions.tracker, Some(TrackerOp::Update));
        }
    }

    #[test]
    fn test_same_zone_changed_context_restarts() {
        let actions = step(CautionHigh, CautionHigh, true);
        assert!(actions.header);
        assert_eq!(
            actions.extreme,
            Some(ExtremePrint::Highest { old_state: true })
        );
        assert_eq!(actions.tracker, Some(TrackerOp::Set));
        assert_eq!(actions.context, Some(ContextPrint::Change));
        assert_eq!(actions.status, Some(StatusPrint::Changed));
    }

    #[test]
    fn test_enter_and_return() {
        let enter = step(Ok, ActionLow, false);
        assert_eq!(enter.extreme, None);
        assert_eq!(enter.tracker, Some(TrackerOp::Set));
        assert_eq!(enter.context, Some(ContextPrint::Current));
        assert_eq!(enter.status, Some(StatusPrint::Entered));

        let ret = step(CautionLow, Ok, false);
        assert_eq!(
            ret.extreme,
            Some(ExtremePrint::Lowest { old_state: false })
        );
        assert_eq!(ret.tracker, Some(TrackerOp::Clear));
        assert_eq!(ret.status, Some(StatusPrint::Returned));
    }

    #[test]
    fn test_retreat_keeps_excursion() {
        assert_eq!(
            step(ActionHigh, CautionHigh, false).tracker,
            Some(TrackerOp::Update)
        );
        assert_eq!(
            step(ActionLow, CautionLow, false).tracker,
            Some(TrackerOp::Update)
        );
        assert_eq!(
            step(ActionHigh, CautionHigh, true).tracker,
            Some(TrackerOp::Set)
        );
        // escalation and side flips restart
        assert_eq!(
            step(CautionHigh, ActionHigh, false).tracker,
            Some(TrackerOp::Set)
        );
        assert_eq!(
            step(CautionLow, CautionHigh, false).tracker,
            Some(TrackerOp::Set)
        );
    }

    #[test]
    fn test_every_pair_is_defined() {
        for old in AlarmZone::ALL {
            for new in AlarmZone::ALL {
                for changed in [false, true] {
                    let actions = step(old, new, changed);
                    assert_eq!(actions.header, old != new || changed);
                    assert_eq!(actions.context.is_some(), actions.header);
                    assert_eq!(actions.status.is_some(), actions.header);
                    if new.is_ok() {
                        assert_ne!(actions.tracker, Some(TrackerOp::Set));
                    } else {
                        assert!(actions.tracker.is_some());
                    }
                    if !actions.header || old.is_ok() {
                        assert!(actions.extreme.is_none());
                    }
                }
            }
        }
    }
}
