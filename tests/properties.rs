//! Property tests for the classifier, the transition engine and the record
//! time search.

use std::io;
use std::sync::Arc;

use limitwatch::{
    classify, find_range, step, ActionSet, AlarmZone, CheckOutcome, ContextSchema, LimitChecker,
    OperatingContext, OrderedTime, ParameterDesc, Scalar, ScalarKind, SearchError, ThresholdSet,
    TimeWindow,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

const RECORD_SIZE: u64 = 8;

/// Four sorted values as (action low, caution low, caution high, action high).
fn ordered_limits() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    prop::collection::vec(-1000i32..1000, 4).prop_map(|mut v| {
        v.sort_unstable();
        (v[0], v[1], v[2], v[3])
    })
}

fn linear_range(times: &[i64], start: Option<i64>, end: Option<i64>) -> Option<(usize, usize)> {
    let first = times
        .iter()
        .position(|t| start.map_or(true, |s| *t >= s))?;
    let last = times.iter().rposition(|t| end.map_or(true, |e| *t <= e))?;
    (first <= last).then_some((first, last))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn classify_matches_zone_definitions(
        (al, cl, ch, ah) in ordered_limits(),
        value in -1100i32..1100,
    ) {
        let zone = classify(&value, &cl, &ch, &al, &ah);
        let expected = if cl <= value && value <= ch {
            AlarmZone::Ok
        } else if value < al {
            AlarmZone::ActionLow
        } else if value > ah {
            AlarmZone::ActionHigh
        } else if value < cl {
            AlarmZone::CautionLow
        } else {
            AlarmZone::CautionHigh
        };
        prop_assert_eq!(zone, expected);
        prop_assert_eq!(classify(&cl, &cl, &ch, &al, &ah), AlarmZone::Ok);
        prop_assert_eq!(classify(&ch, &cl, &ch, &al, &ah), AlarmZone::Ok);
    }

    #[test]
    fn classify_f32_boundaries_are_ok(
        (al, cl, ch, ah) in ordered_limits(),
    ) {
        let set = ThresholdSet::new(
            Scalar::F32(cl as f32 / 8.0),
            Scalar::F32(ch as f32 / 8.0),
            Scalar::F32(al as f32 / 8.0),
            Scalar::F32(ah as f32 / 8.0),
        ).unwrap();
        prop_assert_eq!(set.classify(set.caution_low()).unwrap(), AlarmZone::Ok);
        prop_assert_eq!(set.classify(set.caution_high()).unwrap(), AlarmZone::Ok);
        if al < cl {
            prop_assert!(!set.classify(set.action_low()).unwrap().is_ok());
        }
    }

    #[test]
    fn unchanged_context_ok_is_silent_and_headers_follow_changes(
        old in prop::sample::select(AlarmZone::ALL.to_vec()),
        new in prop::sample::select(AlarmZone::ALL.to_vec()),
        changed in any::<bool>(),
    ) {
        let actions = step(old, new, changed);
        prop_assert_eq!(actions.header, old != new || changed);
        if old.is_ok() && new.is_ok() && !changed {
            prop_assert_eq!(actions, ActionSet::default());
        }
    }

    #[test]
    fn checker_zone_always_matches_classifier(
        (al, cl, ch, ah) in ordered_limits(),
        values in prop::collection::vec(-1100i32..1100, 1..40),
    ) {
        let set = ThresholdSet::new(cl.into(), ch.into(), al.into(), ah.into()).unwrap();
        let mut checker = LimitChecker::new(
            ParameterDesc::new("P", "V", ScalarKind::I32),
            Arc::new(ContextSchema::default()),
            vec![Some(set)],
            true,
        ).unwrap();
        let mut extreme: Option<i32> = None;
        for (i, value) in values.iter().enumerate() {
            let outcome = checker.check(
                OrderedTime::from_millis(i as i64),
                Scalar::I32(*value),
                OperatingContext::default(),
                &mut io::sink(),
            ).unwrap();
            let zone = set.classify(Scalar::I32(*value)).unwrap();
            prop_assert!(
                matches!(outcome, CheckOutcome::Classified { zone: z, .. } if z == zone),
                "outcome {:?} for zone {:?}", outcome, zone
            );

            // excursion extreme: reset on Ok and on a side flip
            let previous = if i == 0 { None } else { Some(set.classify(Scalar::I32(values[i - 1])).unwrap()) };
            extreme = match (zone.is_ok(), previous) {
                (true, _) => None,
                (false, Some(prev))
                    if !prev.is_ok()
                        && prev.is_high() == zone.is_high()
                        && (prev.is_action() || !zone.is_action()) =>
                {
                    extreme.map(|e| if zone.is_high() { e.max(*value) } else { e.min(*value) })
                }
                _ => Some(*value),
            };
            if let Some(e) = extreme {
                prop_assert_eq!(checker.tracker().extreme().map(|r| r.value), Some(Scalar::I32(e)));
            } else {
                prop_assert!(checker.tracker().extreme().is_none());
            }
        }
    }

    #[test]
    fn search_agrees_with_linear_scan(
        mut times in prop::collection::vec(0i64..200, 0..60),
        start in prop::option::of(-10i64..210),
        end in prop::option::of(-10i64..210),
    ) {
        times.sort_unstable();
        let mut reader = |offset: u64| -> Result<OrderedTime, SearchError> {
            times
                .get((offset / RECORD_SIZE) as usize)
                .map(|ms| OrderedTime::from_millis(*ms))
                .ok_or(SearchError::Extract { offset })
        };
        let window = TimeWindow::new(
            start.map(OrderedTime::from_millis),
            end.map(OrderedTime::from_millis),
        );
        let found = find_range(
            &mut reader,
            0,
            times.len() as u64 * RECORD_SIZE,
            RECORD_SIZE,
            window,
        ).unwrap();

        let expected = match (start, end) {
            (Some(s), Some(e)) if s > e => None,
            _ => linear_range(&times, start, end),
        };
        let found = found.map(|r| {
            ((r.first_offset / RECORD_SIZE) as usize, (r.last_offset / RECORD_SIZE) as usize)
        });
        prop_assert_eq!(found, expected);
    }
}
