//! Space used by a recursive function: call-stack depth times a constant
//! frame, plus arrays allocated inside loops.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::RecursiveTerm;
use crate::parser::{Block, Expr, Function, StmtKind};
use crate::symbolic::{Growth, Rational};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceAnalysis {
    pub recursion_depth: String,
    pub frame_size: String,
    pub auxiliary_space: String,
    pub total_space: String,
    pub explanation: String,
}

/// `functions` are the recursive function and the helpers it calls; an
/// empty slice means only the recurrence shape is known.
pub fn analyze_space(terms: &[RecursiveTerm], functions: &[&Function]) -> SpaceAnalysis {
    let (depth, depth_reason) = match terms.first().map(RecursiveTerm::is_division) {
        Some(true) => (
            Growth::polynomial("n", Rational::ZERO, 1),
            "the problem size divides at every call, so the stack is logarithmic",
        ),
        Some(false) => (
            Growth::polynomial("n", Rational::ONE, 0),
            "the problem size shrinks by a constant per call, so the stack is linear",
        ),
        None => (
            Growth::polynomial("n", Rational::ONE, 0),
            "no size reduction was recognized; a linear stack is assumed",
        ),
    };

    let writer = functions
        .iter()
        .find_map(|f| loop_allocated_array(f).map(|array| (f.name.as_str(), array)));
    let auxiliary = if writer.is_some() {
        Growth::polynomial("n", Rational::ONE, 0)
    } else {
        Growth::constant()
    };
    let total = match depth.cmp_growth(&auxiliary) {
        Ordering::Less => auxiliary.clone(),
        _ => depth.clone(),
    };

    let mut explanation = depth_reason.to_string();
    if let Some((function, array)) = writer {
        explanation.push_str(&format!("; {} fills array {} inside a loop", function, array));
    }
    tracing::debug!("space: depth {}, auxiliary {}", depth, auxiliary);

    SpaceAnalysis {
        recursion_depth: depth.big_o(),
        frame_size: Growth::constant().big_o(),
        auxiliary_space: auxiliary.big_o(),
        total_space: total.big_o(),
        explanation,
    }
}

/// First non-parameter array written inside a loop body
fn loop_allocated_array(function: &Function) -> Option<String> {
    fn scan(block: &Block, function: &Function, in_loop: bool) -> Option<String> {
        block.statements.iter().find_map(|stmt| {
            if let StmtKind::Assign {
                target: target @ Expr::ArrayAccess { .. },
                ..
            } = &stmt.kind
            {
                if let Some(name) = target.base_name() {
                    if in_loop && !function.has_param(name) {
                        return Some(name.to_string());
                    }
                }
            }
            let nested_loop =
                in_loop || matches!(stmt.kind, StmtKind::For { .. } | StmtKind::While { .. });
            stmt.blocks()
                .into_iter()
                .find_map(|b| scan(b, function, nested_loop))
        })
    }
    scan(&function.body, function, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn depth_from_terms_only() {
        let halving = analyze_space(&[RecursiveTerm::division(1, 2)], &[]);
        assert_eq!(halving.recursion_depth, "O(log n)");
        assert_eq!(halving.total_space, "O(log n)");
        assert_eq!(halving.frame_size, "O(1)");

        let chain = analyze_space(&[RecursiveTerm::subtraction(1, 1)], &[]);
        assert_eq!(chain.recursion_depth, "O(n)");
        assert_eq!(chain.auxiliary_space, "O(1)");
    }

    #[test]
    fn buffer_filled_in_a_loop_dominates() {
        let program = parse(
            "\
merge(A[], p, r)
begin
  for k 🡨 p to r do
  begin
    B[k] 🡨 A[k]
  end
end
",
        )
        .unwrap();
        let merge = &program.functions[0];
        let space = analyze_space(&[RecursiveTerm::division(2, 2)], &[merge]);
        assert_eq!(space.auxiliary_space, "O(n)");
        assert_eq!(space.total_space, "O(n)");
        assert!(space.explanation.contains("array B"));
    }

    #[test]
    fn writes_to_parameters_are_in_place() {
        let program = parse(
            "\
fill(A[], n)
begin
  for i 🡨 1 to n do
  begin
    A[i] 🡨 0
  end
end
",
        )
        .unwrap();
        let space = analyze_space(&[RecursiveTerm::subtraction(1, 1)], &[&program.functions[0]]);
        assert_eq!(space.auxiliary_space, "O(1)");
        assert_eq!(space.total_space, "O(n)");
    }
}
