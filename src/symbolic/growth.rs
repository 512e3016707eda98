//! Dominant-term extraction.
//!
//! Terms are ranked by exponential rate, then total polynomial degree over
//! the problem-size variables, then the number of logarithmic factors (a log
//! factor counts as degree 0 but wins ties).

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::poly::{Atom, Monomial, Poly};
use super::rational::Rational;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Growth {
    pub degrees: BTreeMap<String, Rational>,
    /// Power of `log var`; fractional after a root such as `sqrt(n log n)`
    pub logs: BTreeMap<String, Rational>,
    /// Exponential factors `base^exponent`
    pub exponentials: Vec<(Rational, Poly)>,
    /// Verbatim text when the expression holds opaque fragments
    pub opaque: Option<String>,
}

impl Growth {
    pub fn constant() -> Self {
        Self::default()
    }

    pub fn polynomial(var: &str, degree: Rational, logs: i64) -> Self {
        Self::with_logs(var, degree, Rational::from(logs))
    }

    /// `var^degree log^logs var`
    pub fn with_logs(var: &str, degree: Rational, logs: Rational) -> Self {
        let mut growth = Self::default();
        if !degree.is_zero() {
            growth.degrees.insert(var.to_string(), degree);
        }
        if !logs.is_zero() {
            growth.logs.insert(var.to_string(), logs);
        }
        growth
    }

    pub fn is_constant(&self) -> bool {
        self.degrees.is_empty()
            && self.logs.is_empty()
            && self.exponentials.is_empty()
            && self.opaque.is_none()
    }

    /// Total polynomial degree
    pub fn degree(&self) -> Rational {
        self.degrees
            .values()
            .fold(Rational::ZERO, |acc, d| acc + *d)
    }

    pub fn log_count(&self) -> Rational {
        self.logs.values().fold(Rational::ZERO, |acc, l| acc + *l)
    }

    pub fn exp_rate(&self) -> f64 {
        self.exponentials
            .iter()
            .map(|(base, exponent)| base.to_f64().ln() * leading_coefficient(exponent))
            .sum()
    }

    fn key(&self) -> (f64, f64, Rational) {
        (self.exp_rate(), self.degree().to_f64(), self.log_count())
    }

    pub fn cmp_growth(&self, other: &Growth) -> Ordering {
        let (a0, a1, a2) = self.key();
        let (b0, b1, b2) = other.key();
        a0.total_cmp(&b0)
            .then(a1.total_cmp(&b1))
            .then(a2.cmp(&b2))
    }

    pub fn mul(&self, other: &Growth) -> Growth {
        let mut result = self.clone();
        for (var, degree) in &other.degrees {
            let entry = result.degrees.entry(var.clone()).or_insert(Rational::ZERO);
            *entry = *entry + *degree;
        }
        result.degrees.retain(|_, d| !d.is_zero());
        for (var, logs) in &other.logs {
            let entry = result.logs.entry(var.clone()).or_insert(Rational::ZERO);
            *entry = *entry + *logs;
        }
        result.logs.retain(|_, l| !l.is_zero());
        result.exponentials.extend(other.exponentials.iter().cloned());
        if result.opaque.is_none() {
            result.opaque = other.opaque.clone();
        }
        result
    }

    fn scaled(&self, factor: Rational) -> Growth {
        let mut result = self.clone();
        for degree in result.degrees.values_mut() {
            *degree = *degree * factor;
        }
        for logs in result.logs.values_mut() {
            *logs = *logs * factor;
        }
        result.logs.retain(|_, l| !l.is_zero());
        result
    }

    /// Dominant term of `poly` over the given problem-size variables
    pub fn of_poly(poly: &Poly, problem_vars: &BTreeSet<String>) -> Growth {
        if poly.has_opaque() {
            return Growth {
                opaque: Some(poly.render_compact()),
                ..Growth::default()
            };
        }

        let positive: Vec<Growth> = poly
            .terms()
            .filter(|(_, c)| !c.is_negative())
            .map(|(m, _)| Growth::of_monomial(m, problem_vars))
            .collect();
        let candidates = if positive.is_empty() {
            poly.terms()
                .map(|(m, _)| Growth::of_monomial(m, problem_vars))
                .collect()
        } else {
            positive
        };

        candidates
            .into_iter()
            .max_by(|a, b| a.cmp_growth(b))
            .unwrap_or_default()
    }

    pub fn of_monomial(monomial: &Monomial, problem_vars: &BTreeSet<String>) -> Growth {
        let mut growth = Growth::constant();
        for (atom, exp) in monomial.factors() {
            let factor = match atom {
                Atom::Var(name) if problem_vars.contains(name) => {
                    Growth::polynomial(name, Rational::from(exp), 0)
                }
                Atom::Var(_) => Growth::constant(),
                Atom::Log(inner) => {
                    let inner = Growth::of_poly(inner, problem_vars);
                    match inner.dominant_var() {
                        Some(var) if inner.degree() > Rational::ZERO => {
                            Growth::polynomial(&var, Rational::ZERO, exp)
                        }
                        _ => Growth::constant(),
                    }
                }
                Atom::Exp(base, exponent) => {
                    let mentions = exponent.free_vars().iter().any(|v| problem_vars.contains(v));
                    if mentions && base.to_f64() > 1.0 {
                        Growth {
                            exponentials: vec![(*base, exponent.scale(Rational::from(exp)))],
                            ..Growth::default()
                        }
                    } else {
                        Growth::constant()
                    }
                }
                Atom::Power(base, e) => {
                    Growth::of_poly(base, problem_vars).scaled(*e * Rational::from(exp))
                }
                Atom::Min(a, b) => {
                    let (ga, gb) = (Growth::of_poly(a, problem_vars), Growth::of_poly(b, problem_vars));
                    if ga.cmp_growth(&gb) == Ordering::Greater {
                        gb
                    } else {
                        ga
                    }
                }
                Atom::Max(a, b) => {
                    let (ga, gb) = (Growth::of_poly(a, problem_vars), Growth::of_poly(b, problem_vars));
                    if ga.cmp_growth(&gb) == Ordering::Less {
                        gb
                    } else {
                        ga
                    }
                }
                Atom::Unresolved(text) | Atom::Unknown(text) => Growth {
                    opaque: Some(text.clone()),
                    ..Growth::default()
                },
            };
            growth = growth.mul(&factor);
        }
        growth
    }

    fn dominant_var(&self) -> Option<String> {
        self.degrees
            .iter()
            .max_by(|a, b| a.1.cmp(b.1))
            .map(|(v, _)| v.clone())
    }

    pub fn big_o(&self) -> String {
        format!("O({})", self)
    }

    pub fn omega(&self) -> String {
        format!("Ω({})", self)
    }

    pub fn theta(&self) -> String {
        format!("Θ({})", self)
    }
}

fn leading_coefficient(exponent: &Poly) -> f64 {
    exponent
        .terms()
        .filter(|(m, _)| !m.is_one())
        .map(|(_, c)| c.to_f64())
        .fold(0.0, f64::max)
}

fn render_power(var: &str, degree: Rational) -> String {
    if degree.is_one() {
        var.to_string()
    } else if degree.is_integer() && !degree.is_negative() {
        format!("{}^{}", var, degree)
    } else {
        format!("{}^({})", var, degree)
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.opaque {
            return write!(f, "{}", text);
        }

        let mut factors: Vec<String> = self
            .degrees
            .iter()
            .map(|(var, degree)| render_power(var, *degree))
            .collect();
        for (base, exponent) in &self.exponentials {
            let exponent_text = exponent.render_compact();
            if exponent.precedence() >= 4 {
                factors.push(format!("{}^{}", base, exponent_text));
            } else {
                factors.push(format!("{}^({})", base, exponent_text));
            }
        }
        let logs: Vec<String> = self
            .logs
            .iter()
            .map(|(var, count)| {
                if count.is_one() {
                    format!("log {}", var)
                } else if count.is_integer() {
                    format!("log^{} {}", count, var)
                } else {
                    format!("log^({}) {}", count, var)
                }
            })
            .collect();

        match (factors.is_empty(), logs.is_empty()) {
            (true, true) => write!(f, "1"),
            (false, true) => write!(f, "{}", factors.join("·")),
            (true, false) => write!(f, "{}", logs.join("·")),
            (false, false) => write!(f, "{} {}", factors.join("·"), logs.join("·")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{simplify, SymExpr};

    fn growth_of(text: &str) -> String {
        let expr = SymExpr::parse(text).unwrap();
        let vars = expr.free_vars();
        Growth::of_poly(&simplify(&expr).poly, &vars).to_string()
    }

    #[test]
    fn polynomial_degrees() {
        assert_eq!(growth_of("3*n**2/2 + 5*n + 7"), "n^2");
        assert_eq!(growth_of("2*n"), "n");
        assert_eq!(growth_of("4"), "1");
        assert_eq!(growth_of("n*m + n"), "m·n");
    }

    #[test]
    fn logs_win_ties() {
        assert_eq!(growth_of("n*log(n) + 5*n"), "n log n");
        assert_eq!(growth_of("log(n) + 1"), "log n");
        assert_eq!(growth_of("log(n)**2"), "log^2 n");
        assert_eq!(growth_of("n**2 + n*log(n)"), "n^2");
    }

    #[test]
    fn roots_keep_fractional_log_powers() {
        assert_eq!(growth_of("sqrt(n*log(n))"), "n^(1/2) log^(1/2) n");
        assert_eq!(growth_of("sqrt(n)"), "n^(1/2)");
        let root = Growth::with_logs("n", Rational::new(1, 2).unwrap(), Rational::new(1, 2).unwrap());
        let plain = Growth::polynomial("n", Rational::new(1, 2).unwrap(), 0);
        assert_eq!(root.cmp_growth(&plain), Ordering::Greater);
        assert_eq!(root.big_o(), "O(n^(1/2) log^(1/2) n)");
    }

    #[test]
    fn exponentials_dominate() {
        assert_eq!(growth_of("2**n + n**5"), "2^n");
        assert_eq!(growth_of("2**(n/2) + 2**n"), "2^n");
        assert_eq!(growth_of("Max(n, n**2)"), "n^2");
    }

    #[test]
    fn opaque_expressions_render_verbatim() {
        let (expr, _) = SymExpr::parse_lenient("n + foo(n)");
        let growth = Growth::of_poly(&simplify(&expr).poly, &expr.free_vars());
        assert_eq!(growth.big_o(), "O(n + unknown(foo(n)))");
    }
}
