//! Alarm log formatting.
//!
//! Every report starts with a blank line and a `<time> <parameter>` header;
//! the remaining lines are indented three spaces. Times print in code A
//! form (see [`crate::time::CODE_A_FORMAT`]).

use std::io::{self, Write};

use crate::context::{ContextPair, ContextSchema};
use crate::extract::ParameterDesc;
use crate::extreme::ExtremeValueRecord;
use crate::scalar::Scalar;
use crate::time::OrderedTime;
use crate::transition::{ContextPrint, ExtremePrint};
use crate::zone::AlarmZone;

const INDENT: &str = "   ";

/// Kind of report a checker wrote for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportClass {
    /// First usable sample was already outside the `Ok` band.
    Initial,
    /// Zone changed to another non-`Ok` zone, or left `Ok`.
    Transition,
    /// Zone returned to `Ok`.
    Cleared,
    /// Context changed while the value stayed `Ok`.
    ContextChange,
}

pub fn write_header<W: Write + ?Sized>(
    sink: &mut W,
    time: OrderedTime,
    param: &ParameterDesc,
) -> io::Result<()> {
    write!(sink, "\n{} {}\n", time, param.name)
}

pub fn write_extreme<W: Write + ?Sized>(
    sink: &mut W,
    which: ExtremePrint,
    record: &ExtremeValueRecord,
    param: &ParameterDesc,
) -> io::Result<()> {
    let (word, old_state) = match which {
        ExtremePrint::Lowest { old_state } => ("Lowest", old_state),
        ExtremePrint::Highest { old_state } => ("Highest", old_state),
    };
    let in_old = if old_state { " in old state" } else { "" };
    writeln!(
        sink,
        "{INDENT}{word} value{in_old} was {} {} at {}",
        record.value, param.unit, record.timestamp
    )
}

/// Context line. Nothing is written for a schema without axes.
pub fn write_context<W: Write + ?Sized>(
    sink: &mut W,
    which: ContextPrint,
    schema: &ContextSchema,
    pair: &ContextPair,
) -> io::Result<()> {
    if schema.axes().is_empty() {
        return Ok(());
    }
    match which {
        ContextPrint::Current => writeln!(sink, "{INDENT}{}", schema.describe(pair.current())),
        ContextPrint::Change => writeln!(
            sink,
            "{INDENT}{} -> {}",
            schema.describe(pair.previous()),
            schema.describe(pair.current())
        ),
    }
}

fn write_state_line<W: Write + ?Sized>(
    sink: &mut W,
    prefix: &str,
    zone: AlarmZone,
    value: Scalar,
    param: &ParameterDesc,
) -> io::Result<()> {
    writeln!(
        sink,
        "{INDENT}{prefix}Alarm State = {}, Parameter Value = {} {}",
        zone.label(),
        value,
        param.unit
    )
}

/// Status for a sample outside the `Ok` band, naming the limit it crossed.
pub fn write_alarm<W: Write + ?Sized>(
    sink: &mut W,
    initial: bool,
    zone: AlarmZone,
    value: Scalar,
    limit: Scalar,
    param: &ParameterDesc,
) -> io::Result<()> {
    let prefix = if initial { "Initial " } else { "" };
    write_state_line(sink, prefix, zone, value, param)?;
    let side = if zone.is_high() { "Above" } else { "Below" };
    writeln!(
        sink,
        "{INDENT}{side} the {} limit of {} {}",
        zone.limit_name(),
        limit,
        param.unit
    )
}

/// Status for a return to `Ok` from `from`.
pub fn write_returned<W: Write + ?Sized>(
    sink: &mut W,
    from: AlarmZone,
    value: Scalar,
    limit: Scalar,
    param: &ParameterDesc,
) -> io::Result<()> {
    write_state_line(sink, "", AlarmZone::Ok, value, param)?;
    let side = if from.is_low() { "above" } else { "below" };
    writeln!(
        sink,
        "{INDENT}Returned {side} the {} limit of {} {}",
        from.limit_name(),
        limit,
        param.unit
    )
}

pub fn write_value_ok<W: Write + ?Sized>(
    sink: &mut W,
    value: Scalar,
    param: &ParameterDesc,
) -> io::Result<()> {
    write_state_line(sink, "", AlarmZone::Ok, value, param)?;
    writeln!(sink, "{INDENT}The value in the new state is OK")
}

/// End-of-run summary for a parameter still outside the `Ok` band.
pub fn write_final<W: Write + ?Sized>(
    sink: &mut W,
    zone: AlarmZone,
    record: &ExtremeValueRecord,
    param: &ParameterDesc,
) -> io::Result<()> {
    let (side, word) = if zone.is_low() {
        ("below", "Lowest")
    } else {
        ("above", "Highest")
    };
    writeln!(
        sink,
        "{INDENT}{} {} was {side} {} limit",
        record.timestamp,
        param.name,
        zone.limit_name()
    )?;
    writeln!(sink, "{INDENT}{word} value was {} {}", record.value, param.unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextAxis;
    use crate::scalar::ScalarKind;

    fn param() -> ParameterDesc {
        ParameterDesc::new("TWT Temp", "degC", ScalarKind::I32)
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_and_alarm() {
        let p = param();
        let out = render(|w| {
            write_header(w, OrderedTime::from_millis(0), &p)?;
            write_alarm(w, false, AlarmZone::ActionHigh, 35.into(), 30.into(), &p)
        });
        assert_eq!(
            out,
            "\n1970-01-01T00:00:00.000 TWT Temp\n\
             \x20  Alarm State = ACTION HIGH, Parameter Value = 35 degC\n\
             \x20  Above the Action High limit of 30 degC\n"
        );
    }

    #[test]
    fn test_initial_and_returned() {
        let p = param();
        let out = render(|w| write_alarm(w, true, AlarmZone::CautionLow, 5.into(), 10.into(), &p));
        assert!(out.starts_with("   Initial Alarm State = CAUTION LOW, Parameter Value = 5 degC\n"));
        assert!(out.ends_with("   Below the Caution Low limit of 10 degC\n"));

        let out = render(|w| write_returned(w, AlarmZone::CautionHigh, 15.into(), 20.into(), &p));
        assert!(out.contains("Alarm State = OK, Parameter Value = 15 degC"));
        assert!(out.contains("Returned below the Caution High limit of 20 degC"));
    }

    #[test]
    fn test_extreme_wording() {
        let p = param();
        let rec = ExtremeValueRecord {
            value: 35.into(),
            timestamp: OrderedTime::from_millis(1000),
        };
        let out = render(|w| write_extreme(w, ExtremePrint::Highest { old_state: true }, &rec, &p));
        assert_eq!(
            out,
            "   Highest value in old state was 35 degC at 1970-01-01T00:00:01.000\n"
        );
    }

    #[test]
    fn test_context_lines() {
        let schema = ContextSchema::new(vec![
            ContextAxis::new("Mode", vec!["WOM".into(), "SBM".into()]),
            ContextAxis::new("HVPS", vec!["OFF".into(), "ON".into()]),
        ]);
        let mut pair = ContextPair::new(vec![0, 0].into());
        pair.advance(vec![1, 1].into());
        let out = render(|w| write_context(w, ContextPrint::Change, &schema, &pair));
        assert_eq!(out, "   Mode=WOM, HVPS=OFF -> Mode=SBM, HVPS=ON\n");

        let out = render(|w| write_context(w, ContextPrint::Current, &ContextSchema::default(), &pair));
        assert!(out.is_empty());
    }

    #[test]
    fn test_final_report() {
        let p = param();
        let rec = ExtremeValueRecord {
            value: 35.into(),
            timestamp: OrderedTime::from_millis(0),
        };
        let out = render(|w| write_final(w, AlarmZone::ActionHigh, &rec, &p));
        assert_eq!(
            out,
            "   1970-01-01T00:00:00.000 TWT Temp was above Action High limit\n\
             \x20  Highest value was 35 degC\n"
        );
    }
}
