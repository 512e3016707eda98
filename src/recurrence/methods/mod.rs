//! Solving methods.
//!
//! Each method inspects a classified [`Recurrence`] and either solves it,
//! recording its derivation, or reports why it does not apply. Substitution
//! runs last because it verifies a bound found by another method.

pub mod characteristic;
pub mod iteration;
pub mod master;
pub mod substitution;
pub mod tree;

use super::{Method, MethodResult, Recurrence};
use crate::config::RecurrenceConfig;
use crate::symbolic::{Growth, Rational};

use super::parse::Work;

/// Runs every method except substitution
pub(crate) fn attempt(method: Method, recurrence: &Recurrence, config: &RecurrenceConfig) -> MethodResult {
    match method {
        Method::Master => master::solve(recurrence, config),
        Method::Iteration => iteration::solve(recurrence, config),
        Method::Tree => tree::solve(recurrence, config),
        Method::Characteristic => characteristic::solve(recurrence),
        Method::Substitution => substitution::solve(recurrence, config, None),
    }
}

/// `log_b(a)`, the exponent of the leaf count `n^(log_b a)`
pub(crate) fn critical_exponent(a: u32, b: u32) -> f64 {
    f64::from(a).ln() / f64::from(b).ln()
}

/// Small-denominator rational equal to `x`, if any
pub(crate) fn rational_approx(x: f64) -> Option<Rational> {
    (1..=6i128).find_map(|den| {
        let num = (x * den as f64).round();
        if (num / den as f64 - x).abs() < 1e-9 {
            Rational::new(num as i128, den)
        } else {
            None
        }
    })
}

pub(crate) fn fmt_float(x: f64) -> String {
    let text = format!("{:.4}", x);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// `n^p log^k n` class text
pub(crate) fn power_class(exponent: f64, logs: i64) -> String {
    match rational_approx(exponent) {
        Some(degree) => Growth::polynomial("n", degree, logs).to_string(),
        None => {
            let power = format!("n^{}", fmt_float(exponent));
            match logs {
                0 => power,
                1 => format!("{} log n", power),
                k => format!("{} log^{} n", power, k),
            }
        }
    }
}

pub(crate) fn theta(class: impl std::fmt::Display) -> String {
    format!("Θ({})", class)
}

/// Outcome of comparing f(n) with the leaf count of `aT(n/b)`
pub(crate) struct DivideOutcome {
    pub case: u8,
    pub critical: f64,
    pub complexity: String,
    pub comparison: String,
}

pub(crate) fn divide_and_conquer(a: u32, b: u32, work: &Work, epsilon: f64) -> Option<DivideOutcome> {
    if !work.known {
        return None;
    }
    let critical = critical_exponent(a, b);
    let leaves = power_class(critical, 0);

    if work.is_exponential() {
        return Some(DivideOutcome {
            case: 3,
            critical,
            complexity: theta(&work.growth),
            comparison: format!("f(n) = {} is exponential and dominates {}", work.text, leaves),
        });
    }

    let k = work.growth.degree().to_f64();
    let logs = work.growth.log_count();
    let outcome = if k < critical - epsilon {
        DivideOutcome {
            case: 1,
            critical,
            complexity: theta(&leaves),
            comparison: format!("k = {} < log_{}({}) = {}", fmt_float(k), b, a, fmt_float(critical)),
        }
    } else if (k - critical).abs() <= epsilon {
        DivideOutcome {
            case: 2,
            critical,
            complexity: theta(Growth::with_logs("n", work.growth.degree(), logs + Rational::ONE)),
            comparison: format!("k = {} ≈ log_{}({}) = {}", fmt_float(k), b, a, fmt_float(critical)),
        }
    } else {
        DivideOutcome {
            case: 3,
            critical,
            complexity: theta(&work.growth),
            comparison: format!("k = {} > log_{}({}) = {}", fmt_float(k), b, a, fmt_float(critical)),
        }
    };
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_rendering() {
        assert_eq!(power_class(2.0, 0), "n^2");
        assert_eq!(power_class(1.0, 1), "n log n");
        assert_eq!(power_class(0.0, 1), "log n");
        assert_eq!(power_class(1.5, 0), "n^(3/2)");
        assert_eq!(power_class(critical_exponent(3, 2), 0), "n^1.585");
    }

    #[test]
    fn float_formatting() {
        assert_eq!(fmt_float(1.0), "1");
        assert_eq!(fmt_float(0.5), "0.5");
        assert_eq!(fmt_float(1.61803398), "1.618");
    }
}
