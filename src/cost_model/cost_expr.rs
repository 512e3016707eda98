//! Three-way symbolic cost.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::symbolic::{Rational, SymExpr};

/// Best, average and worst case costs of a node or a source line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostExpr {
    pub best: SymExpr,
    pub avg: SymExpr,
    pub worst: SymExpr,
}

impl Default for CostExpr {
    fn default() -> Self {
        Self::zero()
    }
}

impl CostExpr {
    pub fn zero() -> Self {
        Self::uniform(SymExpr::zero())
    }

    pub fn constant(value: i64) -> Self {
        Self::uniform(SymExpr::int(value))
    }

    /// Same expression in all three cases
    pub fn uniform(expr: SymExpr) -> Self {
        Self {
            best: expr.clone(),
            avg: expr.clone(),
            worst: expr,
        }
    }

    pub fn new(best: SymExpr, avg: SymExpr, worst: SymExpr) -> Self {
        Self { best, avg, worst }
    }

    /// Parses the three textual forms; unparsable fragments become opaque symbols
    pub fn from_strings(best: &str, avg: &str, worst: &str) -> Self {
        Self {
            best: SymExpr::parse_lenient(best).0,
            avg: SymExpr::parse_lenient(avg).0,
            worst: SymExpr::parse_lenient(worst).0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.best.is_zero() && self.avg.is_zero() && self.worst.is_zero()
    }

    pub fn add(&self, other: &CostExpr) -> CostExpr {
        CostExpr {
            best: self.best.clone().add(other.best.clone()),
            avg: self.avg.clone().add(other.avg.clone()),
            worst: self.worst.clone().add(other.worst.clone()),
        }
    }

    pub fn scale(&self, factor: Rational) -> CostExpr {
        self.map(|e| e.scale(factor))
    }

    pub fn map(&self, f: impl Fn(SymExpr) -> SymExpr) -> CostExpr {
        CostExpr {
            best: f(self.best.clone()),
            avg: f(self.avg.clone()),
            worst: f(self.worst.clone()),
        }
    }

    /// `Σ_{var=start}^{end}` applied to all three cases
    pub fn sum_over(&self, var: &str, start: &SymExpr, end: &SymExpr) -> CostExpr {
        self.map(|e| SymExpr::sum(e, var, start.clone(), end.clone()))
    }

    /// Conditional: guard always paid, then min / weighted / max of the branches
    pub fn choice(
        guard: &SymExpr,
        then_cost: &CostExpr,
        else_cost: &CostExpr,
        probability: Rational,
    ) -> CostExpr {
        let complement = Rational::ONE - probability;
        CostExpr {
            best: guard
                .clone()
                .add(then_cost.best.clone().min(else_cost.best.clone())),
            avg: guard
                .clone()
                .add(then_cost.avg.clone().scale(probability))
                .add(else_cost.avg.clone().scale(complement)),
            worst: guard
                .clone()
                .add(then_cost.worst.clone().max(else_cost.worst.clone())),
        }
    }
}

impl fmt::Display for CostExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "best: {}, avg: {}, worst: {}",
            self.best, self.avg, self.worst
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_combines_branches() {
        let guard = SymExpr::int(1);
        let then_cost = CostExpr::constant(3);
        let cost = CostExpr::choice(
            &guard,
            &then_cost,
            &CostExpr::zero(),
            Rational::new(1, 2).unwrap(),
        );
        assert_eq!(cost.best.to_string(), "1");
        assert_eq!(cost.avg.to_string(), "5/2");
        assert_eq!(cost.worst.to_string(), "4");
    }

    #[test]
    fn serializes_as_strings() {
        let cost = CostExpr::constant(2).sum_over("i", &SymExpr::int(1), &SymExpr::var("n"));
        let json = serde_json::to_value(&cost).unwrap();
        assert_eq!(json["worst"], "Sum(2, (i, 1, n))");

        let back: CostExpr = serde_json::from_value(json).unwrap();
        assert_eq!(back, cost);
    }
}
