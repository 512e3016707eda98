use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::{divide_and_conquer, fmt_float, theta};
use crate::config::RecurrenceConfig;
use crate::recurrence::{Method, MethodResult, Recurrence, RecursiveTerm};
use crate::symbolic::{simplify, Growth, Poly, Rational, SymExpr};

/// Unrolls the recurrence until the base case and sums the resulting series
pub fn solve(recurrence: &Recurrence, config: &RecurrenceConfig) -> MethodResult {
    match recurrence.terms.as_slice() {
        [term] if term.is_division() => divide(*term, recurrence, config),
        [term] => subtract(*term, recurrence),
        _ => MethodResult::not_applicable(
            Method::Iteration,
            "unrolling branches into chains of different lengths; there is no single series to sum",
        ),
    }
}

fn divide(term: RecursiveTerm, recurrence: &Recurrence, config: &RecurrenceConfig) -> MethodResult {
    let (a, b) = (term.coefficient, term.amount);
    let work = &recurrence.work;
    let Some(outcome) = divide_and_conquer(a, b, work, config.master_epsilon) else {
        return MethodResult::not_applicable(
            Method::Iteration,
            format!("the series Σ a^i·f(n/b^i) has no closed form for f(n) = {}", work.text),
        );
    };

    let mut steps = vec![
        recurrence.render(),
        format!(
            "T(n/{}) = {}T(n/{}) + {}",
            b,
            term_coefficient(a),
            u64::from(b) * u64::from(b),
            work.at(&format!("n/{}", b))
        ),
        format!(
            "After k expansions: T(n) = {}^k·T(n/{}^k) + Σ_{{i=0}}^{{k-1}} {}^i·f(n/{}^i)",
            a, b, a, b
        ),
        format!("Expansion stops at n/{}^k = 1, so k = log_{}(n)", b, b),
    ];

    if work.is_polylog() {
        let k = work.growth.degree().to_f64();
        let ratio = f64::from(a) / f64::from(b).powf(k);
        let shape = match outcome.case {
            1 => "increasing geometric series; the last level, n^log_b(a) leaves, dominates",
            2 => "every level contributes equally across log_b(n) levels",
            _ => "decreasing geometric series; the top level f(n) dominates",
        };
        steps.push(format!("Level ratio a/b^k = {}: {}", fmt_float(ratio), shape));
    } else {
        steps.push(format!("f(n) = {} outgrows the leaf count", work.text));
    }
    steps.push(format!("T(n) = {}", outcome.complexity));

    MethodResult::solved(
        Method::Iteration,
        steps,
        outcome.complexity,
        "the unrolled sum is geometric in the level index",
    )
}

fn subtract(term: RecursiveTerm, recurrence: &Recurrence) -> MethodResult {
    let (a, b) = (term.coefficient, term.amount);
    let work = &recurrence.work;
    let mut steps = vec![
        recurrence.render(),
        format!(
            "T(n-{}) = {}T(n-{}) + {}",
            b,
            term_coefficient(a),
            2 * b,
            work.at(&format!("n-{}", b))
        ),
    ];

    if a == 1 {
        steps.push(format!(
            "After k expansions: T(n) = T(n-{}k) + Σ_{{i=0}}^{{k-1}} f(n-{}i)",
            b, b
        ));
        steps.push(format!("Expansion stops at k = n/{}", b));

        let (growth, closed) = linear_chain(b, recurrence);
        if let Some(closed) = closed {
            steps.push(format!("Σ_{{i=1}}^{{n/{}}} f({}i) = {}", b, b, closed));
        } else {
            steps.push(format!("The sum of n/{} terms of f(n) = {} grows as n·f(n)", b, work.text));
        }
        let complexity = theta(&growth);
        steps.push(format!("T(n) = {}", complexity));
        return MethodResult::solved(
            Method::Iteration,
            steps,
            complexity,
            "a single chain of n/b calls, each paying f",
        );
    }

    steps.push(format!(
        "After k expansions: T(n) = {}^k·T(n-{}k) + Σ_{{i=0}}^{{k-1}} {}^i·f(n-{}i)",
        a, b, a, b
    ));
    steps.push(format!(
        "Expansion stops at k = n/{}; the leading term is {}^(n/{})·T(0)",
        b, a, b
    ));
    let growth = branching_growth(a, b, &recurrence.work);
    let complexity = theta(&growth);
    steps.push(format!(
        "Geometric series with ratio {} > 1 is dominated by its largest term",
        a
    ));
    steps.push(format!("T(n) = {}", complexity));
    MethodResult::solved(
        Method::Iteration,
        steps,
        complexity,
        "the number of calls multiplies by a at every level",
    )
}

fn term_coefficient(a: u32) -> String {
    if a == 1 {
        String::new()
    } else {
        a.to_string()
    }
}

fn size_vars() -> BTreeSet<String> {
    std::iter::once("n".to_string()).collect()
}

/// Σ f(b·i) for i = 1..n/b, closed form when the summation resolves
pub(crate) fn linear_chain(b: u32, recurrence: &Recurrence) -> (Growth, Option<String>) {
    let work = &recurrence.work;
    let fallback = || {
        if work.is_exponential() {
            work.growth.clone()
        } else {
            Growth::polynomial("n", Rational::ONE, 0).mul(&work.growth)
        }
    };

    let Some(expr) = work.expr.as_ref().filter(|_| work.known) else {
        return (fallback(), None);
    };
    let stride = SymExpr::int(i64::from(b));
    let body = expr.substitute("n", &stride.clone().mul(SymExpr::var("i")));
    let sum = SymExpr::sum(body, "i", SymExpr::one(), SymExpr::var("n").div(stride));
    let simplified = simplify(&sum);
    let growth = Growth::of_poly(&simplified.poly, &size_vars());
    if growth.opaque.is_some() {
        (fallback(), None)
    } else {
        (growth, Some(simplified.poly.render_compact()))
    }
}

/// `a^(n/b)` unless f itself grows faster
pub(crate) fn branching_growth(a: u32, b: u32, work: &crate::recurrence::Work) -> Growth {
    let exponent = Poly::var("n").scale(Rational::new(1, i128::from(b)).unwrap_or(Rational::ONE));
    let calls = Growth {
        exponentials: vec![(Rational::from(i64::from(a)), exponent)],
        ..Growth::default()
    };
    if work.is_exponential() && work.growth.cmp_growth(&calls) == Ordering::Greater {
        work.growth.clone()
    } else {
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Classification, Work};
    use pretty_assertions::assert_eq;

    fn chain(a: u32, b: u32, work: &str) -> MethodResult {
        let recurrence = Recurrence {
            classification: if a == 1 {
                Classification::F4
            } else {
                Classification::F5
            },
            terms: vec![RecursiveTerm::subtraction(a, b)],
            work: Work::parse(work),
        };
        solve(&recurrence, &RecurrenceConfig::default())
    }

    #[test]
    fn factorial_chain_is_linear() {
        let result = chain(1, 1, "1");
        assert!(result.applicable);
        assert_eq!(result.complexity.as_deref(), Some("Θ(n)"));
        assert!(result.steps.iter().any(|s| s.contains("= n")));
    }

    #[test]
    fn linear_work_on_a_chain_is_quadratic() {
        let result = chain(1, 1, "n");
        assert_eq!(result.complexity.as_deref(), Some("Θ(n^2)"));
        assert!(result.steps.iter().any(|s| s.ends_with("= n*(n + 1)/2")));
    }

    #[test]
    fn logarithmic_work_falls_back_to_n_times_f() {
        let result = chain(1, 1, "log n");
        assert_eq!(result.complexity.as_deref(), Some("Θ(n log n)"));
    }

    #[test]
    fn hanoi_is_exponential() {
        assert_eq!(chain(2, 1, "1").complexity.as_deref(), Some("Θ(2^n)"));
        assert_eq!(chain(3, 2, "n").complexity.as_deref(), Some("Θ(3^(n/2))"));
    }

    #[test]
    fn divide_and_conquer_unrolls_to_master_result() {
        let recurrence = Recurrence {
            classification: Classification::F1,
            terms: vec![RecursiveTerm::division(2, 2)],
            work: Work::parse("n"),
        };
        let result = solve(&recurrence, &RecurrenceConfig::default());
        assert_eq!(result.complexity.as_deref(), Some("Θ(n log n)"));
        assert!(result.steps[2].contains("k expansions"));
    }

    #[test]
    fn fibonacci_does_not_unroll() {
        let recurrence = Recurrence {
            classification: Classification::F6,
            terms: vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(1, 2)],
            work: Work::constant(),
        };
        assert!(!solve(&recurrence, &RecurrenceConfig::default()).applicable);
    }
}
