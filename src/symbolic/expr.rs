//! Symbolic cost expressions.
//!
//! `SymExpr` is the unevaluated tree built by the cost model (sums still
//! open, `min`/`max` kept literally). Its `Display` output is the textual
//! exchange format and is accepted back by [`SymExpr::parse`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use super::poly::Poly;
use super::rational::Rational;
use super::text;
use crate::core::AnalysisResult;

#[derive(Debug, Clone, PartialEq)]
pub enum SymExpr {
    Num(Rational),
    Var(String),
    /// Opaque fragment that could not be interpreted, kept verbatim
    Unknown(String),
    Add(Vec<SymExpr>),
    Mul(Vec<SymExpr>),
    Div(Box<SymExpr>, Box<SymExpr>),
    Pow(Box<SymExpr>, Box<SymExpr>),
    Neg(Box<SymExpr>),
    Log(Box<SymExpr>),
    Min(Box<SymExpr>, Box<SymExpr>),
    Max(Box<SymExpr>, Box<SymExpr>),
    Sum {
        body: Box<SymExpr>,
        var: String,
        start: Box<SymExpr>,
        end: Box<SymExpr>,
    },
    /// Already-simplified subterm
    Resolved(Poly),
}

impl SymExpr {
    pub fn zero() -> Self {
        SymExpr::Num(Rational::ZERO)
    }

    pub fn one() -> Self {
        SymExpr::Num(Rational::ONE)
    }

    pub fn int(value: i64) -> Self {
        SymExpr::Num(Rational::from(value))
    }

    pub fn num(value: Rational) -> Self {
        SymExpr::Num(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        SymExpr::Var(name.into())
    }

    pub fn unknown(text: impl Into<String>) -> Self {
        SymExpr::Unknown(text.into())
    }

    /// Strict parse of the textual form
    pub fn parse(input: &str) -> AnalysisResult<Self> {
        text::parse_expr(input)
    }

    /// Parse that never fails: top-level `+` terms that do not parse become
    /// [`SymExpr::Unknown`]. Returns the unparsed fragments alongside.
    pub fn parse_lenient(input: &str) -> (Self, Vec<String>) {
        text::parse_lenient(input)
    }

    pub fn as_num(&self) -> Option<Rational> {
        match self {
            SymExpr::Num(value) => Some(*value),
            SymExpr::Resolved(poly) => poly.as_constant(),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_num().map_or(false, |v| v.is_zero())
    }

    pub fn is_one(&self) -> bool {
        self.as_num().map_or(false, |v| v.is_one())
    }

    /// Flattening sum that drops zeros and folds numeric terms
    pub fn add(self, other: SymExpr) -> SymExpr {
        let mut terms = Vec::new();
        let mut constant = Rational::ZERO;
        for term in [self, other] {
            match term {
                SymExpr::Add(inner) => {
                    for t in inner {
                        match t.as_num().and_then(|v| constant.checked_add(&v)) {
                            Some(folded) => constant = folded,
                            None => terms.push(t),
                        }
                    }
                }
                t => match t.as_num().and_then(|v| constant.checked_add(&v)) {
                    Some(folded) => constant = folded,
                    None => terms.push(t),
                },
            }
        }
        if !constant.is_zero() {
            terms.push(SymExpr::Num(constant));
        }
        match terms.len() {
            0 => SymExpr::zero(),
            1 => terms.remove(0),
            _ => SymExpr::Add(terms),
        }
    }

    pub fn sub(self, other: SymExpr) -> SymExpr {
        self.add(other.neg())
    }

    pub fn neg(self) -> SymExpr {
        match self {
            SymExpr::Num(v) if !(-v).is_overflow() => SymExpr::Num(-v),
            SymExpr::Neg(inner) => *inner,
            other => SymExpr::Neg(Box::new(other)),
        }
    }

    /// Flattening product that short-circuits on zero and drops ones
    pub fn mul(self, other: SymExpr) -> SymExpr {
        let mut factors = Vec::new();
        let mut coefficient = Rational::ONE;
        for factor in [self, other] {
            match factor {
                SymExpr::Mul(inner) => {
                    for f in inner {
                        match f.as_num().and_then(|v| coefficient.checked_mul(&v)) {
                            Some(folded) => coefficient = folded,
                            None => factors.push(f),
                        }
                    }
                }
                f => match f.as_num().and_then(|v| coefficient.checked_mul(&v)) {
                    Some(folded) => coefficient = folded,
                    None => factors.push(f),
                },
            }
        }
        if coefficient.is_zero() {
            return SymExpr::zero();
        }
        if !coefficient.is_one() || factors.is_empty() {
            factors.insert(0, SymExpr::Num(coefficient));
        }
        match factors.len() {
            1 => factors.remove(0),
            _ => SymExpr::Mul(factors),
        }
    }

    pub fn scale(self, factor: Rational) -> SymExpr {
        SymExpr::Num(factor).mul(self)
    }

    pub fn div(self, other: SymExpr) -> SymExpr {
        if other.is_one() {
            return self;
        }
        if let (Some(a), Some(b)) = (self.as_num(), other.as_num()) {
            if let Some(q) = a.checked_div(&b) {
                return SymExpr::Num(q);
            }
        }
        SymExpr::Div(Box::new(self), Box::new(other))
    }

    pub fn pow(self, exponent: SymExpr) -> SymExpr {
        if exponent.is_one() {
            return self;
        }
        if exponent.is_zero() {
            return SymExpr::one();
        }
        SymExpr::Pow(Box::new(self), Box::new(exponent))
    }

    pub fn log(self) -> SymExpr {
        SymExpr::Log(Box::new(self))
    }

    /// `min(0, x)` collapses to 0: costs are never negative
    pub fn min(self, other: SymExpr) -> SymExpr {
        if self.is_zero() || other.is_zero() {
            return SymExpr::zero();
        }
        if self == other {
            return self;
        }
        if let (Some(a), Some(b)) = (self.as_num(), other.as_num()) {
            return SymExpr::Num(a.min(b));
        }
        SymExpr::Min(Box::new(self), Box::new(other))
    }

    pub fn max(self, other: SymExpr) -> SymExpr {
        if self.is_zero() {
            return other;
        }
        if other.is_zero() || self == other {
            return self;
        }
        if let (Some(a), Some(b)) = (self.as_num(), other.as_num()) {
            return SymExpr::Num(a.max(b));
        }
        SymExpr::Max(Box::new(self), Box::new(other))
    }

    pub fn sum(body: SymExpr, var: impl Into<String>, start: SymExpr, end: SymExpr) -> SymExpr {
        if body.is_zero() {
            return SymExpr::zero();
        }
        SymExpr::Sum {
            body: Box::new(body),
            var: var.into(),
            start: Box::new(start),
            end: Box::new(end),
        }
    }

    /// Variables not bound by an enclosing summation
    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_free_vars(&mut Vec::new(), &mut vars);
        vars
    }

    fn collect_free_vars(&self, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
        match self {
            SymExpr::Num(_) | SymExpr::Unknown(_) => {}
            SymExpr::Var(name) => {
                if !bound.contains(name) {
                    out.insert(name.clone());
                }
            }
            SymExpr::Resolved(poly) => {
                for name in poly.free_vars() {
                    if !bound.contains(&name) {
                        out.insert(name);
                    }
                }
            }
            SymExpr::Sum {
                body,
                var,
                start,
                end,
            } => {
                start.collect_free_vars(bound, out);
                end.collect_free_vars(bound, out);
                bound.push(var.clone());
                body.collect_free_vars(bound, out);
                bound.pop();
            }
            other => {
                for child in other.children() {
                    child.collect_free_vars(bound, out);
                }
            }
        }
    }

    fn children(&self) -> Vec<&SymExpr> {
        match self {
            SymExpr::Add(items) | SymExpr::Mul(items) => items.iter().collect(),
            SymExpr::Div(a, b) | SymExpr::Pow(a, b) | SymExpr::Min(a, b) | SymExpr::Max(a, b) => {
                vec![a.as_ref(), b.as_ref()]
            }
            SymExpr::Neg(a) | SymExpr::Log(a) => vec![a.as_ref()],
            SymExpr::Sum {
                body, start, end, ..
            } => vec![body.as_ref(), start.as_ref(), end.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Deepest chain of nested summations
    pub fn sum_depth(&self) -> usize {
        let below = self.children().iter().map(|c| c.sum_depth()).max().unwrap_or(0);
        match self {
            SymExpr::Sum { .. } => below + 1,
            _ => below,
        }
    }

    pub fn has_unknown(&self) -> bool {
        match self {
            SymExpr::Unknown(_) => true,
            SymExpr::Resolved(poly) => poly.has_opaque(),
            other => other.children().iter().any(|c| c.has_unknown()),
        }
    }

    /// True when a literal is not an integer (`0.5`, `1/3`)
    pub fn has_fractional_constant(&self) -> bool {
        match self {
            SymExpr::Num(v) => !v.is_integer(),
            other => other.children().iter().any(|c| c.has_fractional_constant()),
        }
    }

    /// Replaces free occurrences of `name`
    pub fn substitute(&self, name: &str, value: &SymExpr) -> SymExpr {
        match self {
            SymExpr::Var(v) if v == name => value.clone(),
            SymExpr::Num(_) | SymExpr::Var(_) | SymExpr::Unknown(_) => self.clone(),
            SymExpr::Resolved(poly) => match value {
                SymExpr::Var(_) | SymExpr::Num(_) | SymExpr::Resolved(_) => {
                    let replacement = Poly::from_sym_simple(value);
                    match replacement {
                        Some(r) => SymExpr::Resolved(poly.substitute(name, &r)),
                        None => self.clone(),
                    }
                }
                _ => self.clone(),
            },
            SymExpr::Add(items) => items
                .iter()
                .map(|i| i.substitute(name, value))
                .fold(SymExpr::zero(), SymExpr::add),
            SymExpr::Mul(items) => items
                .iter()
                .map(|i| i.substitute(name, value))
                .fold(SymExpr::one(), SymExpr::mul),
            SymExpr::Div(a, b) => a.substitute(name, value).div(b.substitute(name, value)),
            SymExpr::Pow(a, b) => a.substitute(name, value).pow(b.substitute(name, value)),
            SymExpr::Neg(a) => a.substitute(name, value).neg(),
            SymExpr::Log(a) => a.substitute(name, value).log(),
            SymExpr::Min(a, b) => a.substitute(name, value).min(b.substitute(name, value)),
            SymExpr::Max(a, b) => a.substitute(name, value).max(b.substitute(name, value)),
            SymExpr::Sum {
                body,
                var,
                start,
                end,
            } => {
                let body = if var == name {
                    (**body).clone()
                } else {
                    body.substitute(name, value)
                };
                SymExpr::sum(
                    body,
                    var.clone(),
                    start.substitute(name, value),
                    end.substitute(name, value),
                )
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            SymExpr::Add(_) => 1,
            SymExpr::Mul(_) | SymExpr::Div(..) | SymExpr::Neg(_) => 2,
            SymExpr::Num(v) if v.is_negative() || !v.is_integer() => 2,
            SymExpr::Pow(..) => 3,
            SymExpr::Resolved(poly) => poly.precedence(),
            _ => 4,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymExpr::Num(v) => write!(f, "{}", v),
            SymExpr::Var(name) => write!(f, "{}", name),
            SymExpr::Unknown(text) => write!(f, "unknown({})", text),
            SymExpr::Resolved(poly) => write!(f, "{}", poly),
            SymExpr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    match term {
                        SymExpr::Neg(inner) if i > 0 => {
                            write!(f, " - ")?;
                            inner.fmt_child(f, 2)?;
                        }
                        SymExpr::Num(v) if i > 0 && v.is_negative() => {
                            write!(f, " - {}", v.abs())?;
                        }
                        _ => {
                            if i > 0 {
                                write!(f, " + ")?;
                            }
                            term.fmt_child(f, 2)?;
                        }
                    }
                }
                Ok(())
            }
            SymExpr::Mul(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    // a leading fraction or negative constant still reads unambiguously
                    if i == 0 {
                        factor.fmt_child(f, 2)?;
                    } else {
                        factor.fmt_child(f, 3)?;
                    }
                }
                Ok(())
            }
            SymExpr::Div(a, b) => {
                a.fmt_child(f, 2)?;
                write!(f, "/")?;
                b.fmt_child(f, 3)
            }
            SymExpr::Pow(base, exp) => {
                base.fmt_child(f, 4)?;
                write!(f, "**")?;
                exp.fmt_child(f, 4)
            }
            SymExpr::Neg(inner) => {
                write!(f, "-")?;
                inner.fmt_child(f, 3)
            }
            SymExpr::Log(inner) => write!(f, "log({})", inner),
            SymExpr::Min(a, b) => write!(f, "Min({}, {})", a, b),
            SymExpr::Max(a, b) => write!(f, "Max({}, {})", a, b),
            SymExpr::Sum {
                body,
                var,
                start,
                end,
            } => write!(f, "Sum({}, ({}, {}, {}))", body, var, start, end),
        }
    }
}

impl Serialize for SymExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SymExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        SymExpr::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_constructors_fold_constants() {
        let e = SymExpr::int(1).add(SymExpr::int(2)).add(SymExpr::var("n"));
        assert_eq!(e.to_string(), "n + 3");
        assert!(SymExpr::var("n").mul(SymExpr::zero()).is_zero());
        assert_eq!(SymExpr::zero().min(SymExpr::var("n")), SymExpr::zero());
        assert_eq!(SymExpr::zero().max(SymExpr::var("n")), SymExpr::var("n"));
    }

    #[test]
    fn renders_sums_and_precedence() {
        let body = SymExpr::int(1).add(SymExpr::var("j"));
        let e = SymExpr::sum(body, "j", SymExpr::int(1), SymExpr::var("n"));
        assert_eq!(e.to_string(), "Sum(j + 1, (j, 1, n))");

        let product = SymExpr::int(2).mul(SymExpr::var("n").add(SymExpr::int(1)));
        assert_eq!(product.to_string(), "2*(n + 1)");

        let half = SymExpr::num(Rational::new(1, 2).unwrap()).mul(SymExpr::var("n"));
        assert_eq!(half.to_string(), "1/2*n");
        assert_eq!(SymExpr::var("n").sub(SymExpr::int(1)).to_string(), "n - 1");
    }

    #[test]
    fn free_vars_skip_bound_indices() {
        let inner = SymExpr::sum(SymExpr::var("i"), "j", SymExpr::int(1), SymExpr::var("i"));
        let e = SymExpr::sum(inner, "i", SymExpr::int(1), SymExpr::var("n"));
        let vars: Vec<String> = e.free_vars().into_iter().collect();
        assert_eq!(vars, vec!["n".to_string()]);
        assert_eq!(e.sum_depth(), 2);
    }

    #[test]
    fn display_round_trips_through_parser() {
        let e = SymExpr::sum(
            SymExpr::int(3).add(SymExpr::var("i").mul(SymExpr::int(2))),
            "i",
            SymExpr::int(1),
            SymExpr::var("n").div(SymExpr::int(2)),
        )
        .add(SymExpr::var("n").min(SymExpr::var("m")));
        let reparsed = SymExpr::parse(&e.to_string()).unwrap();
        assert_eq!(reparsed.to_string(), e.to_string());
    }
}
