//! Substitution: guess a bound, then verify it by induction.
//!
//! The guess normally comes from the first method that solved the
//! recurrence. Without one, the homogeneous part supplies it.

use super::iteration::branching_growth;
use super::{attempt, critical_exponent, power_class, theta};
use crate::config::RecurrenceConfig;
use crate::recurrence::{Method, MethodResult, Recurrence, Work};
use crate::symbolic::Growth;

pub fn solve(recurrence: &Recurrence, config: &RecurrenceConfig, guess: Option<&str>) -> MethodResult {
    let (guess, borrowed) = match guess {
        Some(guess) => (guess.to_string(), true),
        None => match priority_guess(recurrence, config) {
            Some(guess) => (guess, true),
            None => (homogeneous_guess(recurrence), false),
        },
    };
    let (bound, class) = split_bound(&guess);
    let hypothesis = Work {
        text: class.to_string(),
        growth: Growth::default(),
        expr: None,
        known: false,
    };

    let substituted: Vec<String> = recurrence
        .terms
        .iter()
        .map(|term| {
            let scale = if term.coefficient == 1 {
                "c".to_string()
            } else {
                format!("{}c", term.coefficient)
            };
            format!("{}·{}", scale, hypothesis.at(&term.argument()))
        })
        .collect();
    let work_text = if recurrence.work.is_zero() {
        String::new()
    } else {
        format!(" + {}", recurrence.work.text)
    };

    let steps = vec![
        format!("Guess: T(n) = {}", guess),
        format!("Inductive hypothesis: T(m) ≤ c·{} for all m < n", class),
        format!("Substitute: T(n) ≤ {}{}", substituted.join(" + "), work_text),
        format!(
            "For a large enough constant c the right side is at most c·{}",
            class
        ),
        format!("T(n) = {}", guess),
    ];
    let explanation = if borrowed {
        format!("the {} bound {} holds inductively", bound, class)
    } else {
        format!(
            "guess taken from the homogeneous part; f(n) = {} is not accounted for",
            recurrence.work.text
        )
    };
    MethodResult::solved(Method::Substitution, steps, guess, explanation)
}

fn priority_guess(recurrence: &Recurrence, config: &RecurrenceConfig) -> Option<String> {
    recurrence
        .classification
        .method_priority()
        .iter()
        .filter(|m| **m != Method::Substitution)
        .map(|m| attempt(*m, recurrence, config))
        .find(|result| result.applicable)
        .and_then(|result| result.complexity)
}

fn homogeneous_guess(recurrence: &Recurrence) -> String {
    let total = recurrence.total_coefficient();
    let shortest = recurrence.terms.iter().map(|t| t.amount).min().unwrap_or(2);
    if recurrence.classification.is_division() {
        theta(power_class(critical_exponent(total, shortest), 0))
    } else if total == 1 {
        theta("n")
    } else {
        theta(branching_growth(total, shortest, &Work::constant()))
    }
}

/// `Θ(n log n)` to `("Θ", "n log n")`
fn split_bound(guess: &str) -> (&str, &str) {
    guess
        .split_once('(')
        .and_then(|(bound, rest)| rest.strip_suffix(')').map(|class| (bound, class)))
        .unwrap_or(("Θ", guess))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Classification, RecursiveTerm};
    use pretty_assertions::assert_eq;

    fn merge_sort() -> Recurrence {
        Recurrence {
            classification: Classification::F1,
            terms: vec![RecursiveTerm::division(2, 2)],
            work: Work::parse("n"),
        }
    }

    #[test]
    fn verifies_a_given_guess() {
        let result = solve(&merge_sort(), &RecurrenceConfig::default(), Some("Θ(n log n)"));
        assert!(result.applicable);
        assert_eq!(result.complexity.as_deref(), Some("Θ(n log n)"));
        assert_eq!(result.steps[0], "Guess: T(n) = Θ(n log n)");
        assert_eq!(result.steps[2], "Substitute: T(n) ≤ 2c·(n/2) log (n/2) + n");
    }

    #[test]
    fn finds_its_own_guess() {
        let result = solve(&merge_sort(), &RecurrenceConfig::default(), None);
        assert_eq!(result.complexity.as_deref(), Some("Θ(n log n)"));
    }

    #[test]
    fn falls_back_to_homogeneous_part() {
        let recurrence = Recurrence {
            classification: Classification::F1,
            terms: vec![RecursiveTerm::division(4, 2)],
            work: Work::parse("n!"),
        };
        let result = solve(&recurrence, &RecurrenceConfig::default(), None);
        assert_eq!(result.complexity.as_deref(), Some("Θ(n^2)"));
        assert!(result.explanation.contains("not accounted for"));
    }

    #[test]
    fn bound_splitting() {
        assert_eq!(split_bound("O(2^n)"), ("O", "2^n"));
        assert_eq!(split_bound("Θ(2^(n/2))"), ("Θ", "2^(n/2)"));
    }
}
