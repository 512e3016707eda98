use crate::config::SolverConfig;
use crate::core::{Confidence, Degradation, DegradationKind, DegradationLog};
use crate::cost_model::{CostExpr, CostsOut, LineCost};
use crate::symbolic::{Growth, Simplifier, SymExpr, SymbolCache};

use super::{BigO, Bounds, Case, DerivationStep, ExactCosts, SolveOutput};

/// Result for one of the three cases
struct CaseSolution {
    case: Case,
    exact: String,
    growth: Growth,
    steps: Vec<(String, String)>,
    notes: Vec<Degradation>,
}

#[derive(Debug, Clone, Default)]
pub struct SeriesSolver {
    config: SolverConfig,
}

impl SeriesSolver {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn solve(&self, cost: &CostExpr) -> SolveOutput {
        self.solve_text(
            &cost.best.to_string(),
            &cost.avg.to_string(),
            &cost.worst.to_string(),
        )
    }

    /// Solves the total and, when enabled, derives the line-by-line form
    pub fn solve_costs(&self, costs: &CostsOut) -> SolveOutput {
        let mut output = self.solve(&costs.total);
        if self.config.line_steps {
            output.steps_by_line = self.solve_lines(&costs.per_line);
        }
        output
    }

    pub fn solve_text(&self, best: &str, avg: &str, worst: &str) -> SolveOutput {
        let cache = SymbolCache::new();

        let (best, avg, worst) = if self.config.parallel_cases {
            let (best, (avg, worst)) = rayon::join(
                || solve_case(Case::Best, best, &cache),
                || {
                    rayon::join(
                        || solve_case(Case::Average, avg, &cache),
                        || solve_case(Case::Worst, worst, &cache),
                    )
                },
            );
            (best, avg, worst)
        } else {
            (
                solve_case(Case::Best, best, &cache),
                solve_case(Case::Average, avg, &cache),
                solve_case(Case::Worst, worst, &cache),
            )
        };

        let best_class = best.growth.to_string();
        let worst_class = worst.growth.to_string();
        let theta = if best_class == worst_class {
            best.growth.theta()
        } else {
            avg.growth.theta()
        };
        let bounds = Bounds {
            omega: best.growth.omega(),
            theta,
            big_o: worst.growth.big_o(),
        };

        let mut notes = DegradationLog::new();
        let mut steps = Vec::new();
        for solution in [&best, &avg, &worst] {
            notes.extend(solution.notes.iter().cloned());
            for (description, expression) in &solution.steps {
                steps.push(DerivationStep {
                    step: steps.len() + 1,
                    case: Some(solution.case),
                    description: description.clone(),
                    expression: expression.clone(),
                });
            }
        }
        if !cache.is_empty() {
            tracing::warn!("{} opaque symbol(s) in cost expressions", cache.len());
        }

        tracing::info!(
            "solved: best {}, avg {}, worst {}",
            best.exact,
            avg.exact,
            worst.exact
        );

        SolveOutput {
            exact: ExactCosts {
                best: best.exact.clone(),
                avg: avg.exact.clone(),
                worst: worst.exact.clone(),
            },
            big_o: BigO {
                best: best.growth.big_o(),
                avg: avg.growth.big_o(),
                worst: worst.growth.big_o(),
            },
            bounds,
            steps,
            steps_by_line: Vec::new(),
            confidence: notes.confidence(),
            notes: notes.into_notes(),
        }
    }

    /// `T(n) = L₁ + L₂ + …` with each line's worst-case closed form
    pub fn solve_lines(&self, lines: &[LineCost]) -> Vec<DerivationStep> {
        let cache = SymbolCache::new();
        let charged: Vec<&LineCost> = lines.iter().filter(|l| !l.cost.worst.is_zero()).collect();
        if charged.is_empty() {
            return Vec::new();
        }

        let mut steps = Vec::new();
        let mut push = |description: String, expression: String| {
            steps.push(DerivationStep {
                step: steps.len() + 1,
                case: Some(Case::Worst),
                description,
                expression,
            });
        };

        let terms: Vec<String> = charged
            .iter()
            .map(|l| format!("L{}", l.line_number))
            .collect();
        push(
            "Total as the sum of line costs".to_string(),
            format!("T(n) = {}", terms.join(" + ")),
        );

        let mut total = SymExpr::zero();
        for line in &charged {
            let simplified = Simplifier::new(&cache).simplify(&line.cost.worst);
            let exact = simplified.poly.render_compact();
            push(
                format!("Line {}: {}", line.line_number, line.code),
                format!("L{} = {} = {}", line.line_number, line.cost.worst, exact),
            );
            total = total.add(SymExpr::Resolved(simplified.poly));
        }

        let simplified = Simplifier::new(&cache).simplify(&total);
        push(
            "Sum of line costs".to_string(),
            format!("T(n) = {}", simplified.poly.render_compact()),
        );
        steps
    }
}

fn solve_case(case: Case, text: &str, cache: &SymbolCache) -> CaseSolution {
    let (expr, unknown) = SymExpr::parse_lenient(text);
    let problem_vars = expr.free_vars();

    let mut notes = DegradationLog::new();
    for fragment in unknown {
        notes.record(DegradationKind::UnrecognizedExpression, fragment);
    }

    let mut steps = vec![("Cost expression".to_string(), expr.to_string())];

    let simplified = Simplifier::new(cache).simplify(&expr);
    notes.extend(simplified.notes.iter().cloned());

    for resolution in &simplified.resolutions {
        steps.push((
            format!("{} over {}", resolution.label(), resolution.var),
            format!("{} = {}", resolution.summation, resolution.result),
        ));
    }
    if !simplified.resolutions.is_empty() {
        steps.push((
            "Substitute resolved summations".to_string(),
            simplified.substituted.to_string(),
        ));
    }

    let expanded = simplified.poly.to_string();
    steps.push(("Expand and combine like terms".to_string(), expanded.clone()));
    if expr.has_fractional_constant() {
        steps.push(("Exact rational coefficients".to_string(), expanded.clone()));
    }

    let exact = simplified.poly.render_compact();
    if exact != expanded {
        steps.push(("Factor".to_string(), exact.clone()));
    }
    steps.push(("Final result".to_string(), exact.clone()));

    let growth = Growth::of_poly(&simplified.poly, &problem_vars);
    tracing::debug!("{} case: {} ∈ {}", case, exact, growth.big_o());

    CaseSolution {
        case,
        exact,
        growth,
        steps,
        notes: notes.into_notes(),
    }
}

/// Confidence of a full analysis: solver notes plus cost-model notes
pub fn combined_confidence(costs: &CostsOut, solution: &SolveOutput) -> Confidence {
    if costs.confidence == Confidence::Exact && solution.confidence == Confidence::Exact {
        Confidence::Exact
    } else {
        Confidence::BestEffort
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn solver() -> SeriesSolver {
        SeriesSolver::new(&SolverConfig::default())
    }

    #[test]
    fn single_sum_is_linear() {
        let out = solver().solve_text("Sum(2, (i, 1, n))", "Sum(2, (i, 1, n))", "Sum(2, (i, 1, n))");
        assert_eq!(out.exact.worst, "2*n");
        assert_eq!(out.big_o.worst, "O(n)");
        assert_eq!(out.bounds.theta, "Θ(n)");
        assert_eq!(out.bounds.omega, "Ω(n)");
        assert_eq!(out.confidence, Confidence::Exact);
    }

    #[test]
    fn triangular_sum_with_labeled_steps() {
        let text = "Sum(Sum(1, (j, i, n)), (i, 1, n))";
        let out = solver().solve_text("1", text, text);
        assert_eq!(out.exact.worst, "n*(n + 1)/2");
        assert_eq!(out.big_o.worst, "O(n^2)");
        assert_eq!(out.bounds.big_o, "O(n^2)");
        assert_eq!(out.bounds.omega, "Ω(1)");
        // best differs from worst: theta falls back to the average case
        assert_eq!(out.bounds.theta, "Θ(n^2)");

        let worst_steps: Vec<&str> = out
            .steps
            .iter()
            .filter(|s| s.case == Some(Case::Worst))
            .map(|s| s.description.as_str())
            .collect();
        assert_eq!(
            worst_steps,
            vec![
                "Cost expression",
                "Resolve innermost summation over j",
                "Resolve outermost summation over i",
                "Substitute resolved summations",
                "Expand and combine like terms",
                "Factor",
                "Final result",
            ]
        );
        let numbers: Vec<usize> = out.steps.iter().map(|s| s.step).collect();
        assert_eq!(numbers, (1..=out.steps.len()).collect::<Vec<_>>());
    }

    #[test]
    fn resolving_exact_output_is_a_fixpoint() {
        let first = solver().solve_text("3", "Sum(i, (i, 1, n)) + 0.5*n", "Sum(Sum(2, (j, 1, i)), (i, 1, n))");
        let second = solver().solve_text(&first.exact.best, &first.exact.avg, &first.exact.worst);
        assert_eq!(first.exact, second.exact);
        assert_eq!(first.big_o, second.big_o);
    }

    #[test]
    fn parallel_cases_match_sequential() {
        let parallel = SeriesSolver::new(&SolverConfig {
            parallel_cases: true,
            line_steps: true,
        });
        let text = "Sum(Sum(1, (j, 1, i)), (i, 1, n))";
        assert_eq!(
            parallel.solve_text("1", text, text),
            solver().solve_text("1", text, text)
        );
    }

    #[test]
    fn line_by_line_derivation() {
        use crate::config::CostModelConfig;
        use crate::cost_model::CostAnalyzer;

        let source = "f(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    x 🡨 x + 1\n  end\nend\n";
        let program = crate::parser::parse(source).unwrap();
        let costs = CostAnalyzer::new(&CostModelConfig::default())
            .unwrap()
            .analyze(&program, source);
        let out = solver().solve_costs(&costs);

        let expressions: Vec<&str> = out
            .steps_by_line
            .iter()
            .map(|s| s.expression.as_str())
            .collect();
        assert_eq!(
            expressions,
            vec!["T(n) = L5", "L5 = Sum(2, (i, 1, n)) = 2*n", "T(n) = 2*n"]
        );
        assert_eq!(out.steps_by_line[1].description, "Line 5: x 🡨 x + 1");
    }

    #[test]
    fn unknown_fragments_degrade() {
        let out = solver().solve_text("1", "n + mystery", "n + mystery(n)");
        assert!(out.big_o.worst.contains("unknown(mystery(n))"));
        assert_eq!(out.confidence, Confidence::BestEffort);
        assert_eq!(out.notes[0].kind, DegradationKind::UnrecognizedExpression);
    }
}
