//! summary.rs
//! Human-readable and structured views of a node's current budget.

use super::node::NodeState;
use crate::store::{ChannelVolumes, StepVolumes};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Structured copy of one node's budget at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub name: String,
    /// Number of `calculate` calls made before this snapshot was taken (0 if none).
    pub ordinal: usize,
    pub state: NodeState,
    pub inflow: ChannelVolumes,
    pub outflow: ChannelVolumes,
    pub residual_old: Option<f64>,
    pub residual_new: Option<f64>,
}

/// `<name> inflow {..} outflow {..} residual <r>`, with `None` for a residual
/// that has not been calculated yet. Numbers are written the way Python's
/// `repr(float)` writes them (`nan`, `inf`, `1e+20`), so lines read the same as
/// those produced by Python drivers.
pub fn format_summary(name: &str, volumes: &StepVolumes, residual: Option<f64>) -> String {
    let mut out = String::with_capacity(64);
    let _ = write!(out, "{} inflow ", name);
    write_channels(&mut out, &volumes.inflow);
    out.push_str(" outflow ");
    write_channels(&mut out, &volumes.outflow);
    out.push_str(" residual ");
    match residual {
        Some(r) => write_float(&mut out, r),
        None => out.push_str("None"),
    }
    out
}

fn write_channels(out: &mut String, channels: &ChannelVolumes) {
    out.push('{');
    for (i, (name, volume)) in channels.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{:?}: ", name);
        write_float(out, *volume);
    }
    out.push('}');
}

/// Shortest round-trip form, with Python's spelling of non-finite values and
/// exponents (sign always shown, at least two digits).
fn write_float(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
        return;
    }
    let debug = format!("{:?}", value);
    match debug.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            let _ = write!(out, "{}e{}{:0>2}", mantissa, sign, digits);
        }
        None => out.push_str(&debug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(6.0, "6.0")]
    #[case(-3.0, "-3.0")]
    #[case(0.1, "0.1")]
    #[case(1e15, "1000000000000000.0")]
    #[case(1e16, "1e+16")]
    #[case(1e20, "1e+20")]
    #[case(-2.5e120, "-2.5e+120")]
    #[case(1e-5, "1e-05")]
    #[case(0.0001, "0.0001")]
    #[case(f64::NAN, "nan")]
    #[case(f64::INFINITY, "inf")]
    #[case(f64::NEG_INFINITY, "-inf")]
    fn test_float_matches_python_repr(#[case] value: f64, #[case] expected: &str) {
        let mut out = String::new();
        write_float(&mut out, value);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_format_non_finite_residual() {
        let mut v = StepVolumes::new();
        v.set_inflow("precip", f64::NAN);
        let s = format_summary("soil1", &v, Some(f64::NAN));
        assert_eq!(s, r#"soil1 inflow {"precip": nan} outflow {} residual nan"#);
    }

    #[test]
    fn test_format_empty() {
        let s = format_summary("soil1", &StepVolumes::new(), None);
        assert_eq!(s, "soil1 inflow {} outflow {} residual None");
    }

    #[test]
    fn test_format_sorted_channels() {
        let mut v = StepVolumes::new();
        v.set_inflow("snowmelt", 1.0);
        v.set_inflow("precip", 6.0);
        v.set_outflow("evap", -3.0);
        let s = format_summary("soil1", &v, Some(4.0));
        assert_eq!(
            s,
            r#"soil1 inflow {"precip": 6.0, "snowmelt": 1.0} outflow {"evap": -3.0} residual 4.0"#
        );
    }
}
