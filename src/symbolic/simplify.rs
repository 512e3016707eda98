//! Reduction of a [`SymExpr`] to its [`Poly`] normal form.
//!
//! Summations are resolved innermost-first; every resolution is recorded so
//! the solver can print an auditable derivation.

use serde::{Deserialize, Serialize};

use super::cache::SymbolCache;
use super::expr::SymExpr;
use super::poly::{Atom, Poly};
use super::summation::sum_poly;
use crate::core::{Degradation, DegradationKind, DegradationLog};

/// One closed-form summation performed during simplification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumResolution {
    /// Nesting depth, 0 for an outermost sum
    pub depth: usize,
    /// Depth of the deepest summation chain in the expression
    pub levels: usize,
    pub var: String,
    pub summation: String,
    pub result: String,
}

impl SumResolution {
    pub fn label(&self) -> &'static str {
        if self.levels <= 1 {
            "Resolve summation"
        } else if self.depth + 1 == self.levels {
            "Resolve innermost summation"
        } else if self.depth == 0 {
            "Resolve outermost summation"
        } else {
            "Resolve intermediate summation"
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simplified {
    pub poly: Poly,
    /// Input with every summation replaced by its closed form
    pub substituted: SymExpr,
    pub resolutions: Vec<SumResolution>,
    pub notes: Vec<Degradation>,
}

pub struct Simplifier<'a> {
    cache: &'a SymbolCache,
    levels: usize,
    resolutions: Vec<SumResolution>,
    notes: DegradationLog,
}

impl<'a> Simplifier<'a> {
    pub fn new(cache: &'a SymbolCache) -> Self {
        Self {
            cache,
            levels: 0,
            resolutions: Vec::new(),
            notes: DegradationLog::new(),
        }
    }

    pub fn simplify(mut self, expr: &SymExpr) -> Simplified {
        self.levels = expr.sum_depth();
        let (poly, substituted) = self.reduce(expr, 0);
        Simplified {
            poly,
            substituted,
            resolutions: self.resolutions,
            notes: self.notes.into_notes(),
        }
    }

    /// Reduces one node; a node whose coefficients overflow becomes opaque
    fn reduce(&mut self, expr: &SymExpr, depth: usize) -> (Poly, SymExpr) {
        let (poly, substituted) = self.reduce_node(expr, depth);
        if !poly.has_overflow() {
            return (poly, substituted);
        }
        let text = expr.to_string();
        tracing::warn!("coefficient overflow in '{}'", text);
        self.cache.intern(&text);
        self.notes.record(
            DegradationKind::UnrecognizedExpression,
            format!("coefficient overflow in {}", text),
        );
        (Poly::atom(Atom::Unknown(text.clone())), SymExpr::Unknown(text))
    }

    fn reduce_node(&mut self, expr: &SymExpr, depth: usize) -> (Poly, SymExpr) {
        match expr {
            SymExpr::Num(v) => (Poly::constant(*v), expr.clone()),
            SymExpr::Var(name) => (Poly::var(name.clone()), expr.clone()),
            SymExpr::Resolved(poly) => (poly.clone(), expr.clone()),
            SymExpr::Unknown(text) => {
                let id = self.cache.intern(text);
                tracing::debug!("opaque symbol #{} for '{}'", id.0, text);
                self.notes
                    .record(DegradationKind::UnrecognizedExpression, text.clone());
                (Poly::atom(Atom::Unknown(text.clone())), expr.clone())
            }
            SymExpr::Add(items) => {
                let mut poly = Poly::zero();
                let mut rebuilt = SymExpr::zero();
                for item in items {
                    let (p, s) = self.reduce(item, depth);
                    poly = poly.add(&p);
                    rebuilt = rebuilt.add(s);
                }
                (poly, rebuilt)
            }
            SymExpr::Mul(items) => {
                let mut poly = Poly::one();
                let mut rebuilt = SymExpr::one();
                for item in items {
                    let (p, s) = self.reduce(item, depth);
                    poly = poly.mul(&p);
                    rebuilt = rebuilt.mul(s);
                }
                (poly, rebuilt)
            }
            SymExpr::Div(a, b) => {
                let (pa, sa) = self.reduce(a, depth);
                let (pb, sb) = self.reduce(b, depth);
                (pa.div(&pb), sa.div(sb))
            }
            SymExpr::Pow(a, b) => {
                let (pa, sa) = self.reduce(a, depth);
                let (pb, sb) = self.reduce(b, depth);
                (pa.power(&pb), sa.pow(sb))
            }
            SymExpr::Neg(a) => {
                let (pa, sa) = self.reduce(a, depth);
                (pa.neg(), sa.neg())
            }
            SymExpr::Log(a) => {
                let (pa, sa) = self.reduce(a, depth);
                (pa.log(), sa.log())
            }
            SymExpr::Min(a, b) => {
                let (pa, sa) = self.reduce(a, depth);
                let (pb, sb) = self.reduce(b, depth);
                (pa.min_with(&pb), sa.min(sb))
            }
            SymExpr::Max(a, b) => {
                let (pa, sa) = self.reduce(a, depth);
                let (pb, sb) = self.reduce(b, depth);
                (pa.max_with(&pb), sa.max(sb))
            }
            SymExpr::Sum {
                body,
                var,
                start,
                end,
            } => {
                let (body_poly, body_sub) = self.reduce(body, depth + 1);
                let (start_poly, start_sub) = self.reduce(start, depth);
                let (end_poly, end_sub) = self.reduce(end, depth);

                let outcome = sum_poly(&body_poly, var, &start_poly, &end_poly);
                if outcome.value.has_overflow() {
                    return (outcome.value, SymExpr::zero());
                }
                for text in &outcome.unresolved {
                    self.notes
                        .record(DegradationKind::UnresolvedSummation, text.clone());
                }

                let resolution = SumResolution {
                    depth,
                    levels: self.levels,
                    var: var.clone(),
                    summation: SymExpr::sum(body_sub, var.clone(), start_sub, end_sub)
                        .to_string(),
                    result: outcome.value.render_compact(),
                };
                tracing::debug!(
                    "{} over {}: {} = {}",
                    resolution.label(),
                    resolution.var,
                    resolution.summation,
                    resolution.result
                );
                self.resolutions.push(resolution);

                let substituted = SymExpr::Resolved(outcome.value.clone());
                (outcome.value, substituted)
            }
        }
    }
}

/// Simplifies with a fresh call-scoped symbol cache
pub fn simplify(expr: &SymExpr) -> Simplified {
    let cache = SymbolCache::new();
    Simplifier::new(&cache).simplify(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_sums_resolve_innermost_first() {
        let expr = SymExpr::parse("Sum(Sum(1, (j, 1, i)), (i, 1, n))").unwrap();
        let result = simplify(&expr);

        assert_eq!(result.poly.render_compact(), "n*(n + 1)/2");
        assert_eq!(result.resolutions.len(), 2);
        assert_eq!(result.resolutions[0].label(), "Resolve innermost summation");
        assert_eq!(result.resolutions[0].result, "i");
        assert_eq!(result.resolutions[1].label(), "Resolve outermost summation");
        assert_eq!(result.resolutions[1].summation, "Sum(i, (i, 1, n))");
        assert!(result.notes.is_empty());
    }

    #[test]
    fn unknown_fragments_are_noted() {
        let (expr, _) = SymExpr::parse_lenient("n + mystery(n)");
        let result = simplify(&expr);
        assert!(result.poly.has_opaque());
        assert_eq!(result.notes.len(), 1);
        assert_eq!(result.notes[0].kind, DegradationKind::UnrecognizedExpression);
    }

    #[test]
    fn overflowing_constants_degrade_to_opaque_terms() {
        let expr = SymExpr::parse("n + 100000000000*100000000000*100000000000*100000000000").unwrap();
        let result = simplify(&expr);
        assert!(result.poly.has_opaque());
        assert!(!result.poly.has_overflow());
        assert_eq!(result.notes.len(), 1);
        assert_eq!(result.notes[0].kind, DegradationKind::UnrecognizedExpression);
        assert!(result.notes[0].detail.contains("overflow"));
    }

    #[test]
    fn overflowing_summation_degrades() {
        let expr = SymExpr::parse("Sum(i**20, (i, 1, 100000000000*n))").unwrap();
        let result = simplify(&expr);
        assert!(result.poly.has_opaque());
        assert!(result.resolutions.is_empty());
        assert_eq!(result.notes[0].kind, DegradationKind::UnrecognizedExpression);
    }

    #[test]
    fn min_and_max_with_constant_difference() {
        let expr = SymExpr::parse("1 + Max(n + 2, n)").unwrap();
        assert_eq!(simplify(&expr).poly.to_string(), "n + 3");
    }

    #[test]
    fn min_and_max_pick_by_value_in_either_order() {
        for (text, expected) in [
            ("Min(n + 2, n)", "n"),
            ("Min(n, n + 2)", "n"),
            ("Max(n, n + 2)", "n + 2"),
            ("Max(n + 2, n)", "n + 2"),
            ("Max(5, 2)", "5"),
            ("Min(5, 2)", "2"),
        ] {
            let expr = SymExpr::parse(text).unwrap();
            assert_eq!(simplify(&expr).poly.to_string(), expected, "{}", text);
        }
        let expr = SymExpr::parse("Max(n, m)").unwrap();
        assert_eq!(simplify(&expr).poly.to_string(), "Max(m, n)");
    }
}
