//! Recursion tree.
//!
//! The tree is described level by level: how many nodes, what size each
//! subproblem has and what the level costs in total. Summing the levels gives
//! the bound. Subtraction trees with several terms are unbalanced, so only an
//! upper bound is reported for them.

use std::fmt::Write as _;

use super::iteration::branching_growth;
use super::{divide_and_conquer, fmt_float, power_class, theta};
use crate::config::RecurrenceConfig;
use crate::recurrence::{
    Classification, Method, MethodResult, Recurrence, RecursiveTerm, TreeData, TreeLevel, Work,
};
use crate::symbolic::{Growth, Rational};

const MAX_DIAGRAM_NODES: usize = 64;
const MAX_DIAGRAM_DEPTH: usize = 3;

pub fn solve(recurrence: &Recurrence, config: &RecurrenceConfig) -> MethodResult {
    let outcome = match recurrence.classification {
        Classification::F4 => {
            return MethodResult::not_applicable(
                Method::Tree,
                "a linear chain has one node per level; there is no branching to sum",
            )
        }
        Classification::F0 | Classification::F1 => single_division(recurrence, config),
        Classification::F2 | Classification::F3 => uneven_division(recurrence, config),
        Classification::F5 => branching_chain(recurrence, config),
        Classification::F6 => unbalanced_chain(recurrence, config),
    };

    match outcome {
        Ok(mut result) => {
            if let Some(tree) = result.tree.as_mut() {
                if config.render_tree_diagram {
                    tree.diagram = Some(diagram(recurrence, config.tree_levels));
                }
            }
            result
        }
        Err(reason) => MethodResult::not_applicable(Method::Tree, reason),
    }
}

type TreeOutcome = Result<MethodResult, String>;

fn single_division(recurrence: &Recurrence, config: &RecurrenceConfig) -> TreeOutcome {
    let term = recurrence
        .terms
        .first()
        .ok_or_else(|| "no recursive term".to_string())?;
    let (a, b) = (term.coefficient, term.amount);
    let work = &recurrence.work;
    let outcome = divide_and_conquer(a, b, work, config.master_epsilon)
        .ok_or_else(|| format!("level costs of f(n) = {} cannot be compared", work.text))?;

    let levels = (0..config.tree_levels)
        .map(|i| {
            let nodes = power_text(u64::from(a), i);
            let size = division_size(u64::from(b), i);
            let cost = work.at(&size);
            TreeLevel {
                level: i,
                total_level_cost: level_total(&nodes, &cost),
                num_nodes: nodes,
                problem_size: size,
                cost_per_node: cost,
            }
        })
        .collect();
    let height = format!("log_{}(n)", b);
    let leaves = power_class(outcome.critical, 0);

    let steps = vec![
        format!("Root cost: f(n) = {}", work.text),
        format!("Level i has {}^i nodes of size n/{}^i", a, b),
        format!("Height: {}, with n^log_{}({}) = {} leaves", height, b, a, leaves),
        format!("Sum of level costs: {}", outcome.comparison),
        format!("T(n) = {}", outcome.complexity),
    ];
    let explanation = match outcome.case {
        1 => "level costs grow toward the leaves, which dominate",
        2 => "every level costs the same, times the height",
        _ => "level costs shrink geometrically, the root dominates",
    };
    Ok(with_tree(
        MethodResult::solved(Method::Tree, steps, outcome.complexity, explanation),
        height,
        levels,
    ))
}

/// Akra-Bazzi style sum for `Σ c_j T(n/b_j) + f(n)`
fn uneven_division(recurrence: &Recurrence, config: &RecurrenceConfig) -> TreeOutcome {
    let work = &recurrence.work;
    if !work.known {
        return Err(format!("level costs of f(n) = {} cannot be compared", work.text));
    }
    let terms = &recurrence.terms;
    let smallest = terms.iter().map(|t| t.amount).min().unwrap_or(2);
    let largest = terms.iter().map(|t| t.amount).max().unwrap_or(2);
    let branching = recurrence.total_coefficient();
    let height = format!("log_{}(n)", smallest);

    let mut steps = vec![
        format!("Root cost: f(n) = {}", work.text),
        format!(
            "Each node splits into {}",
            terms
                .iter()
                .map(|t| format!("{}", t))
                .collect::<Vec<_>>()
                .join(" + ")
        ),
        format!("Longest path: {}, shortest: log_{}(n)", height, largest),
    ];

    let (complexity, ratio_text) = if work.is_exponential() {
        steps.push(format!("f(n) = {} is exponential; the root dominates", work.text));
        (theta(&work.growth), None)
    } else {
        let k = work.growth.degree().to_f64();
        let ratio = level_ratio(terms, k);
        let ratio_text = fmt_float(ratio);
        steps.push(format!(
            "Level cost ratio r = Σ c_j/b_j^{} = {}",
            fmt_float(k),
            ratio_text
        ));
        let complexity = if (ratio - 1.0).abs() <= config.master_epsilon {
            steps.push("r = 1: every level costs f(n) across the height".to_string());
            theta(Growth::with_logs(
                "n",
                work.growth.degree(),
                work.growth.log_count() + Rational::ONE,
            ))
        } else if ratio < 1.0 {
            steps.push("r < 1: decreasing geometric series, the root dominates".to_string());
            theta(&work.growth)
        } else {
            let p = akra_bazzi_exponent(terms, k);
            steps.push(format!(
                "r > 1: leaves dominate; Σ c_j/b_j^p = 1 gives p = {}",
                fmt_float(p)
            ));
            theta(power_class(p, 0))
        };
        (complexity, Some(ratio_text))
    };
    steps.push(format!("T(n) = {}", complexity));

    let levels = (0..config.tree_levels)
        .map(|i| {
            let size = if smallest == largest {
                division_size(u64::from(smallest), i)
            } else {
                format!(
                    "{} .. {}",
                    division_size(u64::from(largest), i),
                    division_size(u64::from(smallest), i)
                )
            };
            let total = match &ratio_text {
                Some(_) if i == 0 => work.text.clone(),
                Some(r) if i == 1 => format!("{}·{}", r, work.text),
                Some(r) => format!("{}^{}·{}", r, i, work.text),
                None => format!("≤ {}", work.at(&division_size(u64::from(smallest), i))),
            };
            TreeLevel {
                level: i,
                num_nodes: power_text(u64::from(branching), i),
                problem_size: size,
                cost_per_node: format!("≤ {}", work.at(&division_size(u64::from(smallest), i))),
                total_level_cost: total,
            }
        })
        .collect();

    Ok(with_tree(
        MethodResult::solved(
            Method::Tree,
            steps,
            complexity,
            "level costs form a geometric series with ratio r",
        ),
        height,
        levels,
    ))
}

fn branching_chain(recurrence: &Recurrence, config: &RecurrenceConfig) -> TreeOutcome {
    let term = recurrence
        .terms
        .first()
        .ok_or_else(|| "no recursive term".to_string())?;
    let (a, b) = (term.coefficient, term.amount);
    let work = &recurrence.work;
    let growth = branching_growth(a, b, work);
    let complexity = theta(&growth);
    let height = format!("n/{}", b);

    let levels = (0..config.tree_levels)
        .map(|i| {
            let nodes = power_text(u64::from(a), i);
            let size = subtraction_size(u64::from(b), i);
            let cost = work.at(&size);
            TreeLevel {
                level: i,
                total_level_cost: level_total(&nodes, &cost),
                num_nodes: nodes,
                problem_size: size,
                cost_per_node: cost,
            }
        })
        .collect();
    let steps = vec![
        format!("Root cost: f(n) = {}", work.text),
        format!("Level i has {}^i nodes of size n-{}i", a, b),
        format!("Height: {}, so the last level holds {}^(n/{}) nodes", height, a, b),
        format!("Level costs grow by a factor of {}; the deepest level dominates", a),
        format!("T(n) = {}", complexity),
    ];
    Ok(with_tree(
        MethodResult::solved(
            Method::Tree,
            steps,
            complexity,
            "a full a-ary tree of depth n/b",
        ),
        height,
        levels,
    ))
}

fn unbalanced_chain(recurrence: &Recurrence, config: &RecurrenceConfig) -> TreeOutcome {
    let terms = &recurrence.terms;
    let shortest = terms.iter().map(|t| t.amount).min().unwrap_or(1);
    let longest = terms.iter().map(|t| t.amount).max().unwrap_or(1);
    let branching = recurrence.total_coefficient();
    let work = &recurrence.work;
    let bound = format!("O({})", branching_growth(branching, shortest, work));
    let height = format!("n/{}", shortest);

    let levels = (0..config.tree_levels)
        .map(|i| {
            let nodes = power_text(u64::from(branching), i);
            let size = if shortest == longest {
                subtraction_size(u64::from(shortest), i)
            } else {
                format!(
                    "{} .. {}",
                    subtraction_size(u64::from(longest), i),
                    subtraction_size(u64::from(shortest), i)
                )
            };
            let cost = work.at(&subtraction_size(u64::from(shortest), i));
            TreeLevel {
                level: i,
                total_level_cost: format!("≤ {}", level_total(&nodes, &cost)),
                num_nodes: format!("≤ {}", nodes),
                problem_size: size,
                cost_per_node: format!("≤ {}", cost),
            }
        })
        .collect();
    let steps = vec![
        format!("Root cost: f(n) = {}", work.text),
        format!(
            "Each node has {} children; the longest path shrinks by {} per level",
            branching, shortest
        ),
        format!(
            "Height at most {}; shorter branches end early, so the tree is not full",
            height
        ),
        format!(
            "At most {}^(n/{}) nodes in total",
            branching, shortest
        ),
        format!("T(n) = {}", bound),
    ];
    Ok(with_tree(
        MethodResult::solved(
            Method::Tree,
            steps,
            bound,
            "upper bound from the full tree; the characteristic equation gives the tight rate",
        ),
        height,
        levels,
    ))
}

fn with_tree(mut result: MethodResult, height: String, levels: Vec<TreeLevel>) -> MethodResult {
    result.tree = Some(TreeData {
        height,
        levels,
        diagram: None,
    });
    result
}

fn level_ratio(terms: &[RecursiveTerm], k: f64) -> f64 {
    terms
        .iter()
        .map(|t| f64::from(t.coefficient) / f64::from(t.amount).powf(k))
        .sum()
}

/// Solves `Σ c_j/b_j^p = 1` by bisection; the sum is decreasing in p
fn akra_bazzi_exponent(terms: &[RecursiveTerm], lower: f64) -> f64 {
    let mut low = lower;
    let mut high = lower.max(1.0);
    while level_ratio(terms, high) > 1.0 && high < 64.0 {
        high *= 2.0;
    }
    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        if level_ratio(terms, mid) > 1.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

fn power_text(base: u64, exponent: usize) -> String {
    if base == 1 {
        return "1".to_string();
    }
    u32::try_from(exponent)
        .ok()
        .and_then(|e| base.checked_pow(e))
        .map_or_else(|| format!("{}^{}", base, exponent), |v| v.to_string())
}

fn division_size(b: u64, level: usize) -> String {
    match level {
        0 => "n".to_string(),
        _ => format!("n/{}", power_text(b, level)),
    }
}

fn subtraction_size(b: u64, level: usize) -> String {
    match level {
        0 => "n".to_string(),
        _ => format!("n-{}", b * level as u64),
    }
}

fn level_total(nodes: &str, cost: &str) -> String {
    match (nodes, cost) {
        ("1", _) => cost.to_string(),
        (_, "1") => nodes.to_string(),
        _ => format!("{}·{}", nodes, cost),
    }
}

#[derive(Clone, Copy)]
enum NodeSize {
    Divided(u64),
    Reduced(u64),
}

impl NodeSize {
    fn text(self) -> String {
        match self {
            NodeSize::Divided(1) | NodeSize::Reduced(0) => "n".to_string(),
            NodeSize::Divided(d) => format!("n/{}", d),
            NodeSize::Reduced(r) => format!("n-{}", r),
        }
    }

    fn child(self, term: &RecursiveTerm) -> Self {
        let amount = u64::from(term.amount);
        match self {
            NodeSize::Divided(d) => NodeSize::Divided(d.saturating_mul(amount)),
            NodeSize::Reduced(r) => NodeSize::Reduced(r.saturating_add(amount)),
        }
    }
}

/// Mermaid `graph TD` of the first few levels
fn diagram(recurrence: &Recurrence, levels: usize) -> String {
    let root = if recurrence.classification.is_division() {
        NodeSize::Divided(1)
    } else {
        NodeSize::Reduced(0)
    };
    let mut out = String::from("graph TD\n");
    let mut count = 1usize;
    let _ = writeln!(out, "    {}", node_label(1, root, &recurrence.work));

    let mut frontier = vec![(1usize, root)];
    for _ in 1..levels.min(MAX_DIAGRAM_DEPTH) {
        let mut next = Vec::new();
        for (parent, size) in &frontier {
            for term in &recurrence.terms {
                for _ in 0..term.coefficient {
                    if count >= MAX_DIAGRAM_NODES {
                        return out;
                    }
                    count += 1;
                    let child = size.child(term);
                    let _ = writeln!(out, "    {}", node_label(count, child, &recurrence.work));
                    let _ = writeln!(out, "    N{} --> N{}", parent, count);
                    next.push((count, child));
                }
            }
        }
        frontier = next;
    }
    out
}

fn node_label(id: usize, size: NodeSize, work: &Work) -> String {
    let text = size.text();
    format!("N{}[\"T({})<br/>cost: {}\"]", id, text, work.at(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recurrence(classification: Classification, terms: Vec<RecursiveTerm>, work: &str) -> Recurrence {
        Recurrence {
            classification,
            terms,
            work: Work::parse(work),
        }
    }

    #[test]
    fn merge_sort_levels() {
        let rec = recurrence(Classification::F1, vec![RecursiveTerm::division(2, 2)], "n");
        let result = solve(&rec, &RecurrenceConfig::default());
        assert_eq!(result.complexity.as_deref(), Some("Θ(n log n)"));

        let tree = result.tree.unwrap();
        assert_eq!(tree.height, "log_2(n)");
        assert_eq!(tree.levels.len(), 4);
        assert_eq!(tree.levels[2].num_nodes, "4");
        assert_eq!(tree.levels[2].problem_size, "n/4");
        assert_eq!(tree.levels[2].cost_per_node, "n/4");
        assert_eq!(tree.levels[2].total_level_cost, "4·n/4");

        let diagram = tree.diagram.unwrap();
        assert!(diagram.starts_with("graph TD"));
        assert!(diagram.contains("N1[\"T(n)<br/>cost: n\"]"));
        assert!(diagram.contains("N1 --> N2"));
        assert!(diagram.contains("T(n/4)"));
    }

    #[test]
    fn diagram_can_be_disabled() {
        let rec = recurrence(Classification::F0, vec![RecursiveTerm::division(1, 2)], "1");
        let config = RecurrenceConfig {
            render_tree_diagram: false,
            ..RecurrenceConfig::default()
        };
        let result = solve(&rec, &config);
        assert_eq!(result.complexity.as_deref(), Some("Θ(log n)"));
        assert!(result.tree.unwrap().diagram.is_none());
    }

    #[test]
    fn uneven_split_with_shrinking_levels() {
        let rec = recurrence(
            Classification::F2,
            vec![RecursiveTerm::division(1, 2), RecursiveTerm::division(1, 3)],
            "n",
        );
        let result = solve(&rec, &RecurrenceConfig::default());
        assert_eq!(result.complexity.as_deref(), Some("Θ(n)"));
        assert_eq!(result.tree.unwrap().height, "log_2(n)");
    }

    #[test]
    fn uneven_split_dominated_by_leaves() {
        // 1/2^p + 1/3^p + 1/4^p = 1 near p = 1.08
        let rec = recurrence(
            Classification::F3,
            vec![
                RecursiveTerm::division(1, 2),
                RecursiveTerm::division(1, 3),
                RecursiveTerm::division(1, 4),
            ],
            "1",
        );
        let result = solve(&rec, &RecurrenceConfig::default());
        let complexity = result.complexity.unwrap();
        assert!(complexity.starts_with("Θ(n^1.0"), "{}", complexity);
    }

    #[test]
    fn factorial_has_no_tree() {
        let rec = recurrence(Classification::F4, vec![RecursiveTerm::subtraction(1, 1)], "1");
        let result = solve(&rec, &RecurrenceConfig::default());
        assert!(!result.applicable);
        assert!(result.tree.is_none());
    }

    #[test]
    fn fibonacci_gets_an_upper_bound() {
        let rec = recurrence(
            Classification::F6,
            vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(1, 2)],
            "0",
        );
        let result = solve(&rec, &RecurrenceConfig::default());
        assert_eq!(result.complexity.as_deref(), Some("O(2^n)"));
        let tree = result.tree.unwrap();
        assert_eq!(tree.levels[1].problem_size, "n-2 .. n-1");
        assert_eq!(tree.levels[1].num_nodes, "≤ 2");
    }

    #[test]
    fn hanoi_tree() {
        let rec = recurrence(Classification::F5, vec![RecursiveTerm::subtraction(2, 1)], "1");
        let result = solve(&rec, &RecurrenceConfig::default());
        assert_eq!(result.complexity.as_deref(), Some("Θ(2^n)"));
        assert_eq!(result.tree.unwrap().levels[3].total_level_cost, "8");
    }
}
