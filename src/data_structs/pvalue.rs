//! Probability types with an extended exponent range.
//!
//! Exact tail sums are generic over [`ProbReal`], implemented for plain `f64`
//! and for [`LogReal`], a log-domain real that cannot underflow. The outcome
//! of every test is a [`PValue`], which keeps whichever representation was
//! used so that values far below `f64::MIN_POSITIVE` survive until the
//! caller decides how to print or combine them.

use std::cmp::Ordering;
use std::fmt::{
    Debug,
    Display,
};
use std::ops::{
    Add,
    Div,
    Mul,
};
use std::str::FromStr;

use num::{
    One,
    Zero,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::EnrichError;

/// Natural log of the smallest probability still summed in native `f64`.
///
/// Below roughly `1e-290` the partial sums start to lose digits to
/// subnormal rounding, so anything that small is handled in log space.
pub const LN_NATIVE_FLOOR: f64 = -290.0 * std::f64::consts::LN_10;

/// Internal signal: a tail probability is expected to underflow `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UnderflowRisk;

/// Inspects the log-magnitude estimate of a probability before it is
/// summed.
pub(crate) fn check_underflow(ln_estimate: f64) -> Result<(), UnderflowRisk> {
    if ln_estimate < LN_NATIVE_FLOOR {
        Err(UnderflowRisk)
    }
    else {
        Ok(())
    }
}

/// Real-number type the exact tail sums are generic over.
pub trait ProbReal:
    Copy + PartialOrd + Debug + Zero + One + Mul<Output = Self> + Div<Output = Self>
{
    fn from_ln(ln: f64) -> Self;
    fn from_f64(value: f64) -> Self;
    fn to_ln(self) -> f64;
    fn into_pvalue(self) -> PValue;
}

impl ProbReal for f64 {
    fn from_ln(ln: f64) -> Self {
        ln.exp()
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_ln(self) -> f64 {
        self.ln()
    }

    fn into_pvalue(self) -> PValue {
        PValue::new(self)
    }
}

/// A non-negative real stored as its natural logarithm.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LogReal(f64);

impl LogReal {
    pub fn ln(&self) -> f64 {
        self.0
    }
}

impl Add for LogReal {
    type Output = LogReal;

    fn add(
        self,
        rhs: Self,
    ) -> Self::Output {
        let (hi, lo) = if self.0 >= rhs.0 {
            (self.0, rhs.0)
        }
        else {
            (rhs.0, self.0)
        };
        if lo == f64::NEG_INFINITY {
            return LogReal(hi);
        }
        LogReal(hi + (lo - hi).exp().ln_1p())
    }
}

impl Mul for LogReal {
    type Output = LogReal;

    fn mul(
        self,
        rhs: Self,
    ) -> Self::Output {
        LogReal(self.0 + rhs.0)
    }
}

impl Div for LogReal {
    type Output = LogReal;

    fn div(
        self,
        rhs: Self,
    ) -> Self::Output {
        LogReal(self.0 - rhs.0)
    }
}

impl Zero for LogReal {
    fn zero() -> Self {
        LogReal(f64::NEG_INFINITY)
    }

    fn is_zero(&self) -> bool {
        self.0 == f64::NEG_INFINITY
    }
}

impl One for LogReal {
    fn one() -> Self {
        LogReal(0.0)
    }
}

impl ProbReal for LogReal {
    fn from_ln(ln: f64) -> Self {
        LogReal(ln)
    }

    fn from_f64(value: f64) -> Self {
        LogReal(value.ln())
    }

    fn to_ln(self) -> f64 {
        self.0
    }

    fn into_pvalue(self) -> PValue {
        PValue::from_ln(self.0)
    }
}

/// A p-value in `[0, 1]`.
///
/// `Native` holds an ordinary double. `Extended` holds the natural log of a
/// value too small for `f64`; [`PValue::to_f64`] flushes it to zero while
/// [`PValue::ln`] and [`PValue::log10`] stay exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PValue {
    Native(f64),
    Extended(LogReal),
}

impl PValue {
    /// Wraps a double, clamping rounding overshoot into `[0, 1]`.
    pub fn new(value: f64) -> Self {
        PValue::Native(value.clamp(0.0, 1.0))
    }

    /// Builds a p-value from its natural log, choosing the native
    /// representation whenever it is accurate.
    pub fn from_ln(ln: f64) -> Self {
        let ln = ln.min(0.0);
        match check_underflow(ln) {
            Ok(()) => PValue::Native(ln.exp()),
            Err(UnderflowRisk) => PValue::Extended(LogReal(ln)),
        }
    }

    pub fn one() -> Self {
        PValue::Native(1.0)
    }

    pub fn zero() -> Self {
        PValue::Native(0.0)
    }

    /// The value as a double. Extended values flush to `0.0` or a subnormal.
    pub fn to_f64(&self) -> f64 {
        match self {
            PValue::Native(value) => *value,
            PValue::Extended(log) => log.ln().exp(),
        }
    }

    pub fn ln(&self) -> f64 {
        match self {
            PValue::Native(value) => value.ln(),
            PValue::Extended(log) => log.ln(),
        }
    }

    pub fn log10(&self) -> f64 {
        self.ln() / std::f64::consts::LN_10
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, PValue::Extended(_))
    }

    /// Mantissa in `[1, 10)` and decimal exponent, for any magnitude.
    pub fn mantissa_exponent(&self) -> (f64, i64) {
        if let PValue::Native(value) = self {
            if *value == 0.0 {
                return (0.0, 0);
            }
        }
        let log10 = self.log10();
        let exponent = log10.floor();
        let mut mantissa = 10f64.powf(log10 - exponent);
        let mut exponent = exponent as i64;
        if mantissa >= 10.0 {
            mantissa /= 10.0;
            exponent += 1;
        }
        (mantissa, exponent)
    }
}

impl PartialOrd for PValue {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        self.ln().partial_cmp(&other.ln())
    }
}

impl Display for PValue {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            PValue::Native(value) => write!(f, "{:.6e}", value),
            PValue::Extended(_) => {
                let (mantissa, exponent) = self.mantissa_exponent();
                write!(f, "{:.6}e{}", mantissa, exponent)
            },
        }
    }
}

impl FromStr for PValue {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_err = || EnrichError::Input(format!("malformed p-value '{s}'"));
        let (mantissa, exponent) = match s.split_once(['e', 'E']) {
            Some((m, e)) => {
                (
                    m.parse::<f64>().map_err(|_| parse_err())?,
                    e.parse::<i64>().map_err(|_| parse_err())?,
                )
            },
            None => (s.parse::<f64>().map_err(|_| parse_err())?, 0),
        };
        if mantissa.is_nan() || mantissa < 0.0 {
            return Err(parse_err());
        }
        if mantissa == 0.0 {
            return Ok(PValue::zero());
        }
        let ln = mantissa.ln() + exponent as f64 * std::f64::consts::LN_10;
        if ln > 1e-12 {
            return Err(EnrichError::Input(format!("p-value '{s}' exceeds 1")));
        }
        Ok(PValue::from_ln(ln))
    }
}

impl Serialize for PValue {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer, {
        match self {
            PValue::Native(value) => serializer.serialize_f64(*value),
            PValue::Extended(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for PValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>, {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(PValue::new(value)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn log_real_arithmetic() {
        let a = LogReal::from_f64(0.25);
        let b = LogReal::from_f64(0.5);
        assert_approx_eq!((a + b).to_ln().exp(), 0.75);
        assert_approx_eq!((a * b).to_ln().exp(), 0.125);
        assert_approx_eq!((a / b).to_ln().exp(), 0.5);
        assert_eq!(LogReal::zero() + a, a);
        assert!(LogReal::zero().is_zero());
    }

    #[test]
    fn log_real_sums_below_f64_range() {
        // 3 * 1e-400 == 3e-400
        let tiny = LogReal::from_ln(-400.0 * std::f64::consts::LN_10);
        let sum = tiny + tiny + tiny;
        let p = sum.into_pvalue();
        assert!(p.is_extended());
        assert_approx_eq!(p.log10(), -400.0 + 3f64.log10(), 1e-10);
        assert_eq!(p.to_f64(), 0.0);
    }

    #[test]
    fn display_extended() {
        let p = PValue::from_ln(-1000.0 * std::f64::consts::LN_10 + 2.5f64.ln());
        assert_eq!(p.to_string(), "2.500000e-1000");
        let back: PValue = p.to_string().parse().unwrap();
        assert_approx_eq!(back.log10(), p.log10(), 1e-9);
    }

    #[test]
    fn native_clamps() {
        assert_eq!(PValue::new(1.0000000001).to_f64(), 1.0);
        assert_eq!(PValue::new(-1e-18).to_f64(), 0.0);
        assert!(PValue::new(0.01) < PValue::new(0.02));
        assert!(PValue::from_ln(-2000.0) < PValue::new(1e-300));
    }

    #[test]
    fn serde_keeps_representation() {
        let native = serde_json::to_string(&PValue::new(0.5)).unwrap();
        assert_eq!(native, "0.5");
        let extended = PValue::from_ln(-1200.0);
        let json = serde_json::to_string(&extended).unwrap();
        let back: PValue = serde_json::from_str(&json).unwrap();
        assert!(back.is_extended());
        assert_approx_eq!(back.ln(), -1200.0, 1e-6);
    }
}
