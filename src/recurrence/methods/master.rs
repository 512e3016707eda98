use super::{divide_and_conquer, fmt_float};
use crate::config::RecurrenceConfig;
use crate::recurrence::parse::Work;
use crate::recurrence::{Classification, Method, MethodResult, Recurrence};

/// Master theorem for `T(n) = aT(n/b) + f(n)`
pub fn solve(recurrence: &Recurrence, config: &RecurrenceConfig) -> MethodResult {
    let term = match (recurrence.classification, recurrence.terms.first()) {
        (Classification::F0 | Classification::F1, Some(term)) => *term,
        _ => {
            return MethodResult::not_applicable(
                Method::Master,
                "the master theorem covers a single term aT(n/b) only",
            )
        }
    };
    let (a, b) = (term.coefficient, term.amount);
    let work = &recurrence.work;

    let Some(outcome) = divide_and_conquer(a, b, work, config.master_epsilon) else {
        return MethodResult::not_applicable(
            Method::Master,
            format!("f(n) = {} has no polynomial order to compare", work.text),
        );
    };

    let mut steps = vec![
        format!("Identify a = {}, b = {}, f(n) = {}", a, b, work.text),
        format!(
            "Compute log_b(a) = log_{}({}) = {}",
            b,
            a,
            fmt_float(outcome.critical)
        ),
        format!("f(n) ∈ Θ({})", work.growth),
        format!("Case {}: {}", outcome.case, outcome.comparison),
    ];
    if outcome.case == 3 {
        match regularity_ratio(a, b, work) {
            Some(ratio) if ratio < 1.0 => steps.push(format!(
                "Regularity: a·f(n/b) = {}·f(n) with {} < 1",
                fmt_float(ratio),
                fmt_float(ratio)
            )),
            Some(ratio) => {
                return MethodResult::not_applicable(
                    Method::Master,
                    format!("regularity fails: a·f(n/b) = {}·f(n)", fmt_float(ratio)),
                )
            }
            None => steps.push("Regularity: a·f(n/b)/f(n) → 0 for exponential f(n)".to_string()),
        }
    }
    steps.push(format!("T(n) = {}", outcome.complexity));
    let explanation = match outcome.case {
        1 => "f(n) grows polynomially slower than n^log_b(a); the leaves dominate",
        2 => "f(n) matches n^log_b(a); every level of the recursion costs the same",
        _ => "f(n) dominates n^log_b(a) and satisfies the regularity condition a·f(n/b) ≤ c·f(n)",
    };

    tracing::debug!("master theorem case {} for {}", outcome.case, recurrence.render());

    let mut result = MethodResult::solved(Method::Master, steps, outcome.complexity, explanation);
    result.case = Some(outcome.case);
    result
}

/// `a/b^k`, the factor in `a·f(n/b) = (a/b^k)·f(n)` for `f(n) = n^k log^p n`;
/// `None` for exponential work
fn regularity_ratio(a: u32, b: u32, work: &Work) -> Option<f64> {
    if work.is_exponential() {
        return None;
    }
    let k = work.growth.degree().to_f64();
    Some(f64::from(a) / f64::from(b).powf(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecursiveTerm;
    use pretty_assertions::assert_eq;

    fn divide(a: u32, b: u32, work: &str) -> Recurrence {
        Recurrence {
            classification: if a == 1 {
                Classification::F0
            } else {
                Classification::F1
            },
            terms: vec![RecursiveTerm::division(a, b)],
            work: Work::parse(work),
        }
    }

    fn master(a: u32, b: u32, work: &str) -> MethodResult {
        solve(&divide(a, b, work), &RecurrenceConfig::default())
    }

    #[test]
    fn three_cases() {
        let case1 = master(8, 2, "n^2");
        assert_eq!(case1.case, Some(1));
        assert_eq!(case1.complexity.as_deref(), Some("Θ(n^3)"));

        let case2 = master(2, 2, "n");
        assert_eq!(case2.case, Some(2));
        assert_eq!(case2.complexity.as_deref(), Some("Θ(n log n)"));

        let case3 = master(2, 2, "n^2");
        assert_eq!(case3.case, Some(3));
        assert_eq!(case3.complexity.as_deref(), Some("Θ(n^2)"));
    }

    #[test]
    fn third_case_checks_regularity() {
        let result = master(2, 2, "n^2");
        assert!(result.applicable);
        assert_eq!(result.steps.len(), 6);
        assert_eq!(result.steps[4], "Regularity: a·f(n/b) = 0.5·f(n) with 0.5 < 1");

        let result = master(2, 2, "2^n");
        assert_eq!(result.case, Some(3));
        assert!(result.steps[4].contains("exponential"));
    }

    #[test]
    fn regularity_ratio_follows_degree() {
        assert_eq!(regularity_ratio(3, 4, &Work::parse("n^2")), Some(3.0 / 16.0));
        assert_eq!(regularity_ratio(4, 2, &Work::parse("n")), Some(2.0));
        assert_eq!(regularity_ratio(2, 2, &Work::parse("2^n")), None);
    }

    #[test]
    fn binary_search_is_logarithmic() {
        let result = master(1, 2, "1");
        assert!(result.applicable);
        assert_eq!(result.case, Some(2));
        assert_eq!(result.complexity.as_deref(), Some("Θ(log n)"));
        assert_eq!(result.steps.len(), 5);
    }

    #[test]
    fn extended_second_case_adds_a_log() {
        let result = master(2, 2, "n log n");
        assert_eq!(result.complexity.as_deref(), Some("Θ(n log^2 n)"));
    }

    #[test]
    fn subtraction_is_rejected() {
        let recurrence = Recurrence {
            classification: Classification::F4,
            terms: vec![RecursiveTerm::subtraction(1, 1)],
            work: Work::constant(),
        };
        let result = solve(&recurrence, &RecurrenceConfig::default());
        assert!(!result.applicable);
        assert!(result.complexity.is_none());
    }
}
