//! Characteristic equation for subtraction recurrences.
//!
//! `T(n) = Σ c_j T(n - d_j) + f(n)` has the characteristic polynomial
//! `x^D - Σ c_j x^(D - d_j)` with `D = max d_j`. Its dominant root fixes the
//! growth of the homogeneous part; f(n) only matters when it grows at least
//! as fast.

use super::iteration::{branching_growth, linear_chain};
use super::{fmt_float, theta};
use crate::recurrence::{Method, MethodResult, Recurrence, RecursiveTerm};
use crate::symbolic::{Growth, Poly, Rational};

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

pub fn solve(recurrence: &Recurrence) -> MethodResult {
    if recurrence.classification.is_division() {
        return MethodResult::not_applicable(
            Method::Characteristic,
            "the characteristic equation needs constant shifts T(n-b), not T(n/b)",
        );
    }
    let work = &recurrence.work;
    if !work.known {
        return MethodResult::not_applicable(
            Method::Characteristic,
            format!("no particular solution is known for f(n) = {}", work.text),
        );
    }

    let terms = &recurrence.terms;
    let equation = characteristic_polynomial(terms);
    let root = dominant_root(terms);
    let mut steps = vec![
        recurrence.render(),
        format!("Characteristic equation: {}", equation),
    ];
    if let Some((high, low)) = quadratic_roots(terms) {
        steps.push(format!("Roots: x = {}, x = {}", fmt_float(high), fmt_float(low)));
        steps.push(format!(
            "General solution: T(n) = α·{}^n + β·({})^n",
            fmt_float(high),
            fmt_float(low)
        ));
    }
    steps.push(format!("Dominant root r = {}", describe_root(root)));

    let (complexity, explanation) = match terms.as_slice() {
        [term] if term.coefficient == 1 => {
            steps.push(
                "r = 1: the homogeneous part is constant; the particular solution sums f(n)"
                    .to_string(),
            );
            let (growth, closed) = linear_chain(term.amount, recurrence);
            if let Some(closed) = closed {
                steps.push(format!("Σ f = {}", closed));
            }
            (theta(&growth), "a root of 1 leaves only the accumulated work")
        }
        [term] => {
            let growth = branching_growth(term.coefficient, term.amount, work);
            (theta(&growth), "the homogeneous solution grows as r^n")
        }
        _ => (
            multi_term_class(root, work, &mut steps),
            "the dominant root decides the growth of every solution",
        ),
    };
    steps.push(format!("T(n) = {}", complexity));

    MethodResult::solved(Method::Characteristic, steps, complexity, explanation)
}

fn multi_term_class(root: f64, work: &crate::recurrence::Work, steps: &mut Vec<String>) -> String {
    let homogeneous = if (root - GOLDEN_RATIO).abs() < 1e-9 {
        "φ^n".to_string()
    } else if (root - root.round()).abs() < 1e-9 {
        let base = Rational::from(root.round() as i64);
        Growth {
            exponentials: vec![(base, Poly::var("n"))],
            ..Growth::default()
        }
        .to_string()
    } else {
        format!("{}^n", fmt_float(root))
    };

    if work.is_exponential() {
        let rate = work.growth.exp_rate();
        if (rate - root.ln()).abs() < 1e-9 {
            steps.push(format!("f(n) = {} matches r^n; resonance adds a factor n", work.text));
            return theta(Growth::polynomial("n", Rational::ONE, 0).mul(&work.growth));
        }
        if rate > root.ln() {
            steps.push(format!("f(n) = {} outgrows r^n", work.text));
            return theta(&work.growth);
        }
    }
    steps.push(format!("f(n) = {} is dominated by r^n", work.text));
    theta(homogeneous)
}

fn describe_root(root: f64) -> String {
    if (root - GOLDEN_RATIO).abs() < 1e-9 {
        format!("(1+√5)/2 = φ ≈ {}", fmt_float(root))
    } else {
        fmt_float(root)
    }
}

/// Coefficient of `x^k` for each k, highest first
fn coefficients(terms: &[RecursiveTerm]) -> Vec<(u32, i64)> {
    let degree = terms.iter().map(|t| t.amount).max().unwrap_or(1);
    let mut lower: Vec<(u32, i64)> = Vec::new();
    for term in terms {
        let exponent = degree - term.amount;
        match lower.iter_mut().find(|(e, _)| *e == exponent) {
            Some(entry) => entry.1 -= i64::from(term.coefficient),
            None => lower.push((exponent, -i64::from(term.coefficient))),
        }
    }
    lower.sort_by(|a, b| b.0.cmp(&a.0));
    std::iter::once((degree, 1)).chain(lower).collect()
}

fn characteristic_polynomial(terms: &[RecursiveTerm]) -> String {
    let mut text = String::new();
    for (index, (exponent, coefficient)) in coefficients(terms).into_iter().enumerate() {
        let magnitude = coefficient.unsigned_abs();
        let power = match exponent {
            0 => String::new(),
            1 => "x".to_string(),
            e => format!("x^{}", e),
        };
        let body = match (magnitude, power.is_empty()) {
            (_, true) => magnitude.to_string(),
            (1, false) => power,
            (_, false) => format!("{}{}", magnitude, power),
        };
        if index == 0 {
            text.push_str(&body);
        } else if coefficient < 0 {
            text.push_str(&format!(" - {}", body));
        } else {
            text.push_str(&format!(" + {}", body));
        }
    }
    text.push_str(" = 0");
    text
}

fn evaluate(terms: &[RecursiveTerm], x: f64) -> f64 {
    coefficients(terms)
        .into_iter()
        .map(|(exponent, coefficient)| coefficient as f64 * x.powi(exponent as i32))
        .sum()
}

/// The unique positive root, found by bisection on `[1, Σc + 1]`
fn dominant_root(terms: &[RecursiveTerm]) -> f64 {
    let total: u32 = terms.iter().map(|t| t.coefficient).sum();
    let (mut low, mut high) = (1.0_f64, f64::from(total) + 1.0);
    if evaluate(terms, low) >= 0.0 {
        return low;
    }
    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        if evaluate(terms, mid) < 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

/// Both roots of `x^2 - px - q`
fn quadratic_roots(terms: &[RecursiveTerm]) -> Option<(f64, f64)> {
    let coefficients = coefficients(terms);
    if coefficients.first().map(|c| c.0) != Some(2) {
        return None;
    }
    let at = |exponent: u32| {
        coefficients
            .iter()
            .find(|(e, _)| *e == exponent)
            .map_or(0.0, |(_, c)| *c as f64)
    };
    let (p, q) = (-at(1), -at(0));
    let discriminant = (p * p + 4.0 * q).sqrt();
    Some(((p + discriminant) / 2.0, (p - discriminant) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Classification, Work};
    use pretty_assertions::assert_eq;

    fn subtraction(classification: Classification, terms: Vec<RecursiveTerm>, work: &str) -> MethodResult {
        solve(&Recurrence {
            classification,
            terms,
            work: Work::parse(work),
        })
    }

    #[test]
    fn fibonacci_grows_as_phi() {
        let result = subtraction(
            Classification::F6,
            vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(1, 2)],
            "1",
        );
        assert!(result.applicable);
        assert_eq!(result.complexity.as_deref(), Some("Θ(φ^n)"));
        assert_eq!(result.steps[1], "Characteristic equation: x^2 - x - 1 = 0");
        assert!(result.steps.iter().any(|s| s == "Roots: x = 1.618, x = -0.618"));
    }

    #[test]
    fn integer_and_irrational_roots() {
        let result = subtraction(
            Classification::F6,
            vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(2, 2)],
            "0",
        );
        assert_eq!(result.complexity.as_deref(), Some("Θ(2^n)"));

        let result = subtraction(
            Classification::F6,
            vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(1, 3)],
            "1",
        );
        assert_eq!(result.steps[1], "Characteristic equation: x^3 - x^2 - 1 = 0");
        assert_eq!(result.complexity.as_deref(), Some("Θ(1.4656^n)"));
    }

    #[test]
    fn factorial_root_is_one() {
        let result = subtraction(Classification::F4, vec![RecursiveTerm::subtraction(1, 1)], "1");
        assert_eq!(result.steps[1], "Characteristic equation: x - 1 = 0");
        assert_eq!(result.complexity.as_deref(), Some("Θ(n)"));

        let result = subtraction(Classification::F4, vec![RecursiveTerm::subtraction(1, 1)], "n");
        assert_eq!(result.complexity.as_deref(), Some("Θ(n^2)"));
    }

    #[test]
    fn branching_chain_and_exponential_work() {
        let result = subtraction(Classification::F5, vec![RecursiveTerm::subtraction(2, 1)], "1");
        assert_eq!(result.complexity.as_deref(), Some("Θ(2^n)"));

        let result = subtraction(
            Classification::F6,
            vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(1, 2)],
            "3^n",
        );
        assert_eq!(result.complexity.as_deref(), Some("Θ(3^n)"));
    }

    #[test]
    fn division_is_rejected() {
        let result = subtraction(Classification::F1, vec![RecursiveTerm::division(2, 2)], "n");
        assert!(!result.applicable);
    }
}
