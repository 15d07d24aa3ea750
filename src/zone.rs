//! Alarm zones and the threshold classifier.

use std::fmt;

use crate::error::ThresholdError;
use crate::scalar::{Scalar, ScalarKind};

/// Classification of a single sample, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlarmZone {
    ActionLow,
    CautionLow,
    Ok,
    CautionHigh,
    ActionHigh,
}

impl AlarmZone {
    pub const ALL: [AlarmZone; 5] = [
        AlarmZone::ActionLow,
        AlarmZone::CautionLow,
        AlarmZone::Ok,
        AlarmZone::CautionHigh,
        AlarmZone::ActionHigh,
    ];

    pub fn is_ok(self) -> bool {
        self == AlarmZone::Ok
    }

    pub fn is_low(self) -> bool {
        matches!(self, AlarmZone::ActionLow | AlarmZone::CautionLow)
    }

    pub fn is_high(self) -> bool {
        matches!(self, AlarmZone::CautionHigh | AlarmZone::ActionHigh)
    }

    pub fn is_action(self) -> bool {
        matches!(self, AlarmZone::ActionLow | AlarmZone::ActionHigh)
    }

    /// Upper-case label used in "Alarm State = ..." lines.
    pub fn label(self) -> &'static str {
        match self {
            AlarmZone::ActionLow => "ACTION LOW",
            AlarmZone::CautionLow => "CAUTION LOW",
            AlarmZone::Ok => "OK",
            AlarmZone::CautionHigh => "CAUTION HIGH",
            AlarmZone::ActionHigh => "ACTION HIGH",
        }
    }

    /// Name of the limit bounding this zone, as in "the Caution Low limit".
    pub fn limit_name(self) -> &'static str {
        match self {
            AlarmZone::ActionLow => "Action Low",
            AlarmZone::CautionLow => "Caution Low",
            AlarmZone::Ok => "OK",
            AlarmZone::CautionHigh => "Caution High",
            AlarmZone::ActionHigh => "Action High",
        }
    }
}

impl fmt::Display for AlarmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `value` against the four limits.
///
/// The checks run in a fixed order so the result stays defined even when the
/// limits are not nested (`action_low <= caution_low <= caution_high <=
/// action_high`). Values equal to either caution limit are `Ok`.
pub fn classify<T: PartialOrd>(
    value: &T,
    caution_low: &T,
    caution_high: &T,
    action_low: &T,
    action_high: &T,
) -> AlarmZone {
    if caution_low <= value && value <= caution_high {
        AlarmZone::Ok
    } else if action_low > value {
        AlarmZone::ActionLow
    } else if value > action_high {
        AlarmZone::ActionHigh
    } else if caution_low > value {
        AlarmZone::CautionLow
    } else {
        AlarmZone::CautionHigh
    }
}

/// Caution and action limits of one parameter in one operating context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    caution_low: Scalar,
    caution_high: Scalar,
    action_low: Scalar,
    action_high: Scalar,
}

impl ThresholdSet {
    /// Build a validated set: all four values share one kind, none is NaN,
    /// and `action_low <= caution_low <= caution_high <= action_high`.
    pub fn new(
        caution_low: Scalar,
        caution_high: Scalar,
        action_low: Scalar,
        action_high: Scalar,
    ) -> Result<Self, ThresholdError> {
        let kind = caution_low.kind();
        for other in [caution_high, action_low, action_high] {
            if other.kind() != kind {
                return Err(ThresholdError::KindMismatch {
                    expected: kind,
                    got: other.kind(),
                });
            }
        }

        for (name, value) in [
            ("caution low", caution_low),
            ("caution high", caution_high),
            ("action low", action_low),
            ("action high", action_high),
        ] {
            if value.is_nan() {
                return Err(ThresholdError::NotANumber(name));
            }
        }

        if !(action_low <= caution_low && caution_low <= caution_high && caution_high <= action_high)
        {
            return Err(ThresholdError::OutOfOrder {
                caution_low,
                caution_high,
                action_low,
                action_high,
            });
        }

        Ok(Self::unchecked(
            caution_low,
            caution_high,
            action_low,
            action_high,
        ))
    }

    /// Build a set without validation.
    ///
    /// Classification of a set with mixed kinds is meaningless; out-of-order
    /// limits still classify, with the zone picked by check order.
    pub fn unchecked(
        caution_low: Scalar,
        caution_high: Scalar,
        action_low: Scalar,
        action_high: Scalar,
    ) -> Self {
        ThresholdSet {
            caution_low,
            caution_high,
            action_low,
            action_high,
        }
    }

    pub fn kind(&self) -> ScalarKind {
        self.caution_low.kind()
    }

    pub fn caution_low(&self) -> Scalar {
        self.caution_low
    }

    pub fn caution_high(&self) -> Scalar {
        self.caution_high
    }

    pub fn action_low(&self) -> Scalar {
        self.action_low
    }

    pub fn action_high(&self) -> Scalar {
        self.action_high
    }

    /// Classify a sample of this set's kind.
    pub fn classify(&self, value: Scalar) -> Result<AlarmZone, ThresholdError> {
        if value.kind() != self.kind() {
            return Err(ThresholdError::KindMismatch {
                expected: self.kind(),
                got: value.kind(),
            });
        }
        Ok(classify(
            &value,
            &self.caution_low,
            &self.caution_high,
            &self.action_low,
            &self.action_high,
        ))
    }

    /// The limit that bounds `zone`, `None` for `Ok`.
    pub fn limit(&self, zone: AlarmZone) -> Option<Scalar> {
        match zone {
            AlarmZone::ActionLow => Some(self.action_low),
            AlarmZone::CautionLow => Some(self.caution_low),
            AlarmZone::Ok => None,
            AlarmZone::CautionHigh => Some(self.caution_high),
            AlarmZone::ActionHigh => Some(self.action_high),
        }
    }

    /// The caution limit on the side of `zone`; caution high for `Ok`.
    pub fn caution_boundary(&self, zone: AlarmZone) -> Scalar {
        if zone.is_low() {
            self.caution_low
        } else {
            self.caution_high
        }
    }
}
