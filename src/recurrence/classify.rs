use rayon::prelude::*;

use super::methods::{attempt, substitution};
use super::parse::{parse_recurrence, salvage_work};
use super::{
    Classification, Method, MethodResult, Recurrence, RecurrenceInfo, RecurrenceParameters,
    RecursiveTerm, ReductionKind, Work,
};
use crate::config::RecurrenceConfig;
use crate::core::{AnalysisError, AnalysisResult, DegradationKind, DegradationLog};

/// Maps recursive terms to one of F0..F6
pub fn classify(terms: &[RecursiveTerm]) -> AnalysisResult<Classification> {
    let Some(first) = terms.first() else {
        return Err(AnalysisError::UnclassifiableRecurrence(
            "no recursive term".to_string(),
        ));
    };
    if terms.iter().any(|t| t.kind != first.kind) {
        return Err(AnalysisError::UnclassifiableRecurrence(
            "division and subtraction terms are mixed".to_string(),
        ));
    }

    let classification = match (first.kind, terms.len()) {
        (ReductionKind::Division, 1) if first.coefficient == 1 => Classification::F0,
        (ReductionKind::Division, 1) => Classification::F1,
        (ReductionKind::Division, 2) => Classification::F2,
        (ReductionKind::Division, _) => Classification::F3,
        (ReductionKind::Subtraction, 1) if first.coefficient == 1 => Classification::F4,
        (ReductionKind::Subtraction, 1) => Classification::F5,
        (ReductionKind::Subtraction, _) => Classification::F6,
    };
    Ok(classification)
}

/// Classifies a recurrence and runs every solving method on it
pub struct RecurrenceSolver {
    config: RecurrenceConfig,
}

impl RecurrenceSolver {
    pub fn new(config: &RecurrenceConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Lenient entry point: text that cannot be classified is solved as
    /// `2T(n/2) + f(n)` and the result is marked best-effort.
    pub fn solve_text(&self, text: &str) -> RecurrenceInfo {
        let mut notes = DegradationLog::new();
        let (terms, work) = match parse_recurrence(text) {
            Ok(parsed) => (parsed.terms, parsed.work),
            Err(e) => {
                tracing::warn!("{}; falling back to a divide-and-conquer guess", e);
                notes.record(
                    DegradationKind::UnclassifiableRecurrence,
                    format!("{}; assumed T(n) = 2T(n/2) + f(n)", e),
                );
                (vec![RecursiveTerm::division(2, 2)], salvage_work(text))
            }
        };
        self.solve_terms(text.trim(), terms, work, notes)
    }

    pub fn solve_terms(
        &self,
        raw: &str,
        terms: Vec<RecursiveTerm>,
        work: Work,
        mut notes: DegradationLog,
    ) -> RecurrenceInfo {
        let (classification, terms) = match classify(&terms) {
            Ok(classification) => (classification, terms),
            Err(e) => {
                notes.record(
                    DegradationKind::UnclassifiableRecurrence,
                    format!("{}; assumed T(n) = 2T(n/2) + f(n)", e),
                );
                (Classification::F1, vec![RecursiveTerm::division(2, 2)])
            }
        };
        let recurrence = Recurrence {
            classification,
            terms,
            work,
        };
        self.solve(recurrence, raw, notes)
    }

    pub fn solve(&self, recurrence: Recurrence, raw: &str, mut notes: DegradationLog) -> RecurrenceInfo {
        let classification = recurrence.classification;
        tracing::info!(
            "{} classified as {} ({})",
            recurrence.render(),
            classification,
            classification.description()
        );
        if !recurrence.work.known {
            notes.record(
                DegradationKind::UnrecognizedExpression,
                format!("f(n) = {} kept verbatim", recurrence.work.text),
            );
        }

        let priority = classification.method_priority();
        let order: Vec<Method> = priority
            .iter()
            .copied()
            .chain(Method::ALL.iter().copied().filter(|m| !priority.contains(m)))
            .collect();
        let direct: Vec<Method> = order
            .iter()
            .copied()
            .filter(|m| *m != Method::Substitution)
            .collect();

        let results: Vec<MethodResult> = if self.config.parallel_methods {
            direct
                .par_iter()
                .map(|m| attempt(*m, &recurrence, &self.config))
                .collect()
        } else {
            direct
                .iter()
                .map(|m| attempt(*m, &recurrence, &self.config))
                .collect()
        };

        let guess = priority
            .iter()
            .filter_map(|m| results.iter().find(|r| r.method == *m))
            .find(|r| r.applicable)
            .and_then(|r| r.complexity.clone());
        let verified = substitution::solve(&recurrence, &self.config, guess.as_deref());

        let mut remaining = results.into_iter();
        let methods_tried: Vec<MethodResult> = order
            .iter()
            .filter_map(|m| {
                if *m == Method::Substitution {
                    Some(verified.clone())
                } else {
                    remaining.next()
                }
            })
            .collect();

        let best = priority
            .iter()
            .filter_map(|m| methods_tried.iter().find(|r| r.method == *m))
            .find(|r| r.applicable);
        let (best_method, final_solution) = match best {
            Some(result) => (result.method, result.complexity.clone().unwrap_or_default()),
            None => (Method::Substitution, verified.complexity.clone().unwrap_or_default()),
        };
        tracing::info!("{} solved by {}: {}", classification, best_method, final_solution);

        RecurrenceInfo {
            raw: raw.to_string(),
            classification,
            parameters: RecurrenceParameters::from_terms(&recurrence.terms, &recurrence.work.text),
            terms: recurrence.terms,
            base_cases: Vec::new(),
            methods_tried,
            best_method,
            final_solution,
            confidence: notes.confidence(),
            notes: notes.into_notes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Confidence;
    use pretty_assertions::assert_eq;

    fn solve(text: &str) -> RecurrenceInfo {
        RecurrenceSolver::new(&RecurrenceConfig::default()).solve_text(text)
    }

    #[test]
    fn classification_table() {
        use RecursiveTerm as T;
        let cases = [
            (vec![T::division(1, 2)], Classification::F0),
            (vec![T::division(2, 2)], Classification::F1),
            (vec![T::division(1, 2), T::division(1, 3)], Classification::F2),
            (
                vec![T::division(1, 2), T::division(1, 3), T::division(1, 6)],
                Classification::F3,
            ),
            (vec![T::subtraction(1, 1)], Classification::F4),
            (vec![T::subtraction(2, 1)], Classification::F5),
            (vec![T::subtraction(1, 1), T::subtraction(1, 2)], Classification::F6),
        ];
        for (terms, expected) in cases {
            assert_eq!(classify(&terms).unwrap(), expected);
        }
        assert!(classify(&[]).is_err());
        assert!(classify(&[T::division(1, 2), T::subtraction(1, 1)]).is_err());
    }

    #[test]
    fn binary_search() {
        let info = solve("T(n) = T(n/2) + 1");
        assert_eq!(info.classification, Classification::F0);
        assert_eq!(info.best_method, Method::Master);
        assert_eq!(info.method(Method::Master).unwrap().case, Some(2));
        assert_eq!(info.final_solution, "Θ(log n)");
        assert_eq!(info.confidence, Confidence::Exact);
    }

    #[test]
    fn merge_sort() {
        let info = solve("T(n) = 2T(n/2) + n");
        assert_eq!(info.classification, Classification::F1);
        assert_eq!(info.parameters.a, 2);
        assert_eq!(info.parameters.b, 2);
        assert_eq!(info.parameters.f_n, "n");
        assert_eq!(info.final_solution, "Θ(n log n)");
    }

    #[test]
    fn fibonacci() {
        let info = solve("T(n) = T(n-1) + T(n-2) + 1");
        assert_eq!(info.classification, Classification::F6);
        assert_eq!(info.best_method, Method::Characteristic);
        assert_eq!(info.final_solution, "Θ(φ^n)");
        assert_eq!(info.parameters.c, Some(1));
        assert_eq!(info.parameters.d, Some(2));
    }

    #[test]
    fn factorial() {
        let info = solve("T(n) = T(n-1) + 1");
        assert_eq!(info.classification, Classification::F4);
        assert!(!info.method(Method::Tree).unwrap().applicable);
        assert_eq!(info.final_solution, "Θ(n)");
    }

    #[test]
    fn every_method_is_reported_in_priority_order() {
        let info = solve("T(n) = 2T(n/2) + n");
        let order: Vec<Method> = info.methods_tried.iter().map(|m| m.method).collect();
        assert_eq!(
            order,
            vec![
                Method::Master,
                Method::Iteration,
                Method::Tree,
                Method::Substitution,
                Method::Characteristic,
            ]
        );
        assert!(!info.method(Method::Characteristic).unwrap().applicable);
        assert!(info.method(Method::Substitution).unwrap().applicable);
    }

    #[test]
    fn unclassifiable_text_falls_back() {
        let info = solve("T(n) = T(n/2) + T(n-1) + n");
        assert_eq!(info.classification, Classification::F1);
        assert_eq!(info.confidence, Confidence::BestEffort);
        assert_eq!(info.notes[0].kind, DegradationKind::UnclassifiableRecurrence);
        assert_eq!(info.final_solution, "Θ(n log n)");
    }

    #[test]
    fn parallel_methods_match_sequential() {
        let sequential = solve("T(n) = 3T(n/4) + n^2");
        let config = RecurrenceConfig {
            parallel_methods: true,
            ..RecurrenceConfig::default()
        };
        let parallel = RecurrenceSolver::new(&config).solve_text("T(n) = 3T(n/4) + n^2");
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.final_solution, "Θ(n^2)");
    }
}
