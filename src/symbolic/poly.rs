//! Canonical normal form: a sum of rational-coefficient monomials over atoms.
//!
//! Two expressions that are equal after expansion have equal `Poly` values,
//! which makes the rendered text a fixpoint of parse → simplify → render.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::rational::Rational;

/// Irreducible factor of a monomial
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    Var(String),
    Log(Box<Poly>),
    Min(Box<Poly>, Box<Poly>),
    Max(Box<Poly>, Box<Poly>),
    /// Constant base raised to a symbolic exponent
    Exp(Rational, Box<Poly>),
    /// Power that cannot be expanded (fractional exponent or multi-term base)
    Power(Box<Poly>, Rational),
    /// Summation without a closed form, kept as text
    Unresolved(String),
    /// Fragment that could not be parsed
    Unknown(String),
}

impl Atom {
    pub fn is_opaque(&self) -> bool {
        match self {
            Atom::Unresolved(_) | Atom::Unknown(_) => true,
            Atom::Var(_) => false,
            Atom::Log(p) | Atom::Exp(_, p) | Atom::Power(p, _) => p.has_opaque(),
            Atom::Min(a, b) | Atom::Max(a, b) => a.has_opaque() || b.has_opaque(),
        }
    }

    fn has_overflow(&self) -> bool {
        match self {
            Atom::Var(_) | Atom::Unresolved(_) | Atom::Unknown(_) => false,
            Atom::Log(p) => p.has_overflow(),
            Atom::Exp(r, p) | Atom::Power(p, r) => r.is_overflow() || p.has_overflow(),
            Atom::Min(a, b) | Atom::Max(a, b) => a.has_overflow() || b.has_overflow(),
        }
    }

    /// Whether the atom depends on `name`
    pub fn mentions(&self, name: &str) -> bool {
        match self {
            Atom::Var(v) => v == name,
            Atom::Log(p) | Atom::Exp(_, p) | Atom::Power(p, _) => p.mentions(name),
            Atom::Min(a, b) | Atom::Max(a, b) => a.mentions(name) || b.mentions(name),
            Atom::Unresolved(text) | Atom::Unknown(text) => text_mentions(text, name),
        }
    }

    fn collect_vars(&self, out: &mut BTreeSet<String>) {
        match self {
            Atom::Var(v) => {
                out.insert(v.clone());
            }
            Atom::Log(p) | Atom::Exp(_, p) | Atom::Power(p, _) => p.collect_vars(out),
            Atom::Min(a, b) | Atom::Max(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Atom::Unresolved(_) | Atom::Unknown(_) => {}
        }
    }

    fn substitute(&self, name: &str, value: &Poly) -> Poly {
        match self {
            Atom::Var(v) if v == name => value.clone(),
            Atom::Var(_) | Atom::Unresolved(_) | Atom::Unknown(_) => Poly::atom(self.clone()),
            Atom::Log(p) => p.substitute(name, value).log(),
            Atom::Min(a, b) => a.substitute(name, value).min_with(&b.substitute(name, value)),
            Atom::Max(a, b) => a.substitute(name, value).max_with(&b.substitute(name, value)),
            Atom::Exp(base, p) => Poly::exp(*base, p.substitute(name, value)),
            Atom::Power(p, e) => p.substitute(name, value).power_rational(*e),
        }
    }

    /// Rendering needs parentheses when raised to a power
    fn needs_parens(&self) -> bool {
        match self {
            Atom::Exp(..) => true,
            Atom::Power(_, e) => *e != half(),
            _ => false,
        }
    }
}

fn half() -> Rational {
    Rational::new(1, 2).unwrap_or(Rational::ONE)
}

/// Identifier-level containment check for opaque text
pub fn text_mentions(text: &str, name: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .any(|word| word == name)
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Var(v) => write!(f, "{}", v),
            Atom::Log(p) => write!(f, "log({})", p),
            Atom::Min(a, b) => write!(f, "Min({}, {})", a, b),
            Atom::Max(a, b) => write!(f, "Max({}, {})", a, b),
            Atom::Exp(base, p) => {
                if base.is_integer() && !base.is_negative() {
                    write!(f, "{}", base)?;
                } else {
                    write!(f, "({})", base)?;
                }
                if p.precedence() < 4 {
                    write!(f, "**({})", p)
                } else {
                    write!(f, "**{}", p)
                }
            }
            Atom::Power(p, e) if *e == half() => write!(f, "sqrt({})", p),
            Atom::Power(p, e) => {
                if p.precedence() < 4 {
                    write!(f, "({})", p)?;
                } else {
                    write!(f, "{}", p)?;
                }
                if e.is_integer() && !e.is_negative() {
                    write!(f, "**{}", e)
                } else {
                    write!(f, "**({})", e)
                }
            }
            Atom::Unresolved(text) => write!(f, "{}", text),
            Atom::Unknown(text) => write!(f, "unknown({})", text),
        }
    }
}

/// Product of atoms with non-zero integer exponents
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monomial(BTreeMap<Atom, i64>);

impl Monomial {
    pub fn one() -> Self {
        Self::default()
    }

    pub fn of(atom: Atom, exponent: i64) -> Self {
        let mut map = BTreeMap::new();
        if exponent != 0 {
            map.insert(atom, exponent);
        }
        Self(map)
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    pub fn factors(&self) -> impl Iterator<Item = (&Atom, i64)> {
        self.0.iter().map(|(a, e)| (a, *e))
    }

    pub fn exponent_of(&self, atom: &Atom) -> i64 {
        self.0.get(atom).copied().unwrap_or(0)
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut map = self.0.clone();
        for (atom, exp) in &other.0 {
            let entry = map.entry(atom.clone()).or_insert(0);
            *entry = entry.saturating_add(*exp);
            if *entry == 0 {
                map.remove(atom);
            }
        }
        Monomial(map)
    }

    pub fn inverse(&self) -> Monomial {
        self.pow(-1)
    }

    pub fn pow(&self, exponent: i64) -> Monomial {
        Monomial(
            self.0
                .iter()
                .map(|(a, e)| (a.clone(), e.saturating_mul(exponent)))
                .filter(|(_, e)| *e != 0)
                .collect(),
        )
    }

    /// Exponent of `var` and the remaining factors
    pub fn split_var(&self, var: &str) -> (i64, Monomial) {
        let key = Atom::Var(var.to_string());
        let exponent = self.exponent_of(&key);
        let mut rest = self.0.clone();
        rest.remove(&key);
        (exponent, Monomial(rest))
    }

    fn without(&self, atom: &Atom, exponent: i64) -> Monomial {
        self.mul(&Monomial::of(atom.clone(), -exponent))
    }

    /// Ordering weight for rendering: exponentials first, then by degree
    fn weight(&self) -> (i64, Rational, usize) {
        let mut exponentials = 0;
        let mut degree = Rational::ZERO;
        for (atom, exp) in &self.0 {
            match atom {
                Atom::Exp(..) => exponentials += exp,
                Atom::Var(_) => degree = degree + Rational::from(*exp),
                Atom::Power(p, e) => {
                    degree = degree + p.max_degree() * *e * Rational::from(*exp)
                }
                _ => {}
            }
        }
        (exponentials, degree, self.0.len())
    }

    fn render_factors<'a>(factors: impl Iterator<Item = (&'a Atom, i64)>) -> Vec<String> {
        factors
            .map(|(atom, exp)| {
                let text = if exp != 1 && atom.needs_parens() {
                    format!("({})", atom)
                } else {
                    atom.to_string()
                };
                if exp == 1 {
                    text
                } else {
                    format!("{}**{}", text, exp)
                }
            })
            .collect()
    }
}

/// Sum of monomials with exact coefficients
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Poly(BTreeMap<Monomial, Rational>);

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(Rational::ONE)
    }

    pub fn constant(value: Rational) -> Self {
        Self::term(value, Monomial::one())
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Rational::from(value))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::atom(Atom::Var(name.into()))
    }

    pub fn atom(atom: Atom) -> Self {
        Self::term(Rational::ONE, Monomial::of(atom, 1))
    }

    pub fn term(coefficient: Rational, monomial: Monomial) -> Self {
        let mut map = BTreeMap::new();
        if !coefficient.is_zero() {
            map.insert(monomial, coefficient);
        }
        Self(map)
    }

    /// Converts the leaf forms of a symbolic expression
    pub fn from_sym_simple(expr: &super::SymExpr) -> Option<Poly> {
        match expr {
            super::SymExpr::Num(v) => Some(Poly::constant(*v)),
            super::SymExpr::Var(name) => Some(Poly::var(name.clone())),
            super::SymExpr::Resolved(p) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, Rational)> {
        self.0.iter().map(|(m, c)| (m, *c))
    }

    pub fn term_count(&self) -> usize {
        self.0.len()
    }

    pub fn as_constant(&self) -> Option<Rational> {
        match self.0.len() {
            0 => Some(Rational::ZERO),
            1 => self
                .0
                .iter()
                .next()
                .and_then(|(m, c)| m.is_one().then_some(*c)),
            _ => None,
        }
    }

    /// Constant term (coefficient of the empty monomial)
    pub fn constant_term(&self) -> Rational {
        self.0.get(&Monomial::one()).copied().unwrap_or(Rational::ZERO)
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut map = self.0.clone();
        for (m, c) in &other.0 {
            let sum = map.get(m).copied().unwrap_or(Rational::ZERO) + *c;
            if sum.is_zero() {
                map.remove(m);
            } else {
                map.insert(m.clone(), sum);
            }
        }
        Poly(map)
    }

    pub fn neg(&self) -> Poly {
        Poly(self.0.iter().map(|(m, c)| (m.clone(), -*c)).collect())
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.neg())
    }

    pub fn scale(&self, factor: Rational) -> Poly {
        if factor.is_zero() {
            return Poly::zero();
        }
        Poly(self.0.iter().map(|(m, c)| (m.clone(), *c * factor)).collect())
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut result = Poly::zero();
        for (m1, c1) in &self.0 {
            for (m2, c2) in &other.0 {
                result = result.add(&Poly::term(*c1 * *c2, m1.mul(m2)));
            }
        }
        result
    }

    pub fn pow_int(&self, exponent: i64) -> Poly {
        if exponent < 0 {
            return match self.single_term() {
                Some((m, c)) => match c.pow(exponent as i32) {
                    Some(c) => Poly::term(c, m.inverse().pow(-exponent)),
                    None => Poly::atom(Atom::Unknown(format!("({})**({})", self, exponent))),
                },
                None => Poly::atom(Atom::Power(
                    Box::new(self.clone()),
                    Rational::from(exponent),
                )),
            };
        }
        let mut result = Poly::one();
        for _ in 0..exponent {
            result = result.mul(self);
        }
        result
    }

    fn single_term(&self) -> Option<(&Monomial, Rational)> {
        if self.0.len() == 1 {
            self.0.iter().next().map(|(m, c)| (m, *c))
        } else {
            None
        }
    }

    /// Division; exact for constant or single-term divisors
    pub fn div(&self, other: &Poly) -> Poly {
        if let Some(c) = other.as_constant() {
            return match Rational::ONE.checked_div(&c) {
                Some(inv) => self.scale(inv),
                None => Poly::atom(Atom::Unknown(format!("({})/0", self))),
            };
        }
        self.mul(&other.pow_int(-1))
    }

    pub fn power_rational(&self, exponent: Rational) -> Poly {
        if let Some(k) = exponent.to_integer() {
            if (-64..=64).contains(&k) {
                return self.pow_int(k as i64);
            }
        }
        if let Some((m, c)) = self.single_term() {
            if c.is_one() {
                let scaled: Option<BTreeMap<Atom, i64>> = m
                    .factors()
                    .map(|(a, e)| {
                        let r = Rational::from(e) * exponent;
                        r.to_integer().map(|k| (a.clone(), k as i64))
                    })
                    .collect();
                if let Some(map) = scaled {
                    return Poly::term(Rational::ONE, Monomial(map));
                }
            }
        }
        if self.is_zero() {
            return Poly::zero();
        }
        Poly::atom(Atom::Power(Box::new(self.clone()), exponent))
    }

    pub fn power(&self, exponent: &Poly) -> Poly {
        if let Some(e) = exponent.as_constant() {
            return self.power_rational(e);
        }
        match self.as_constant() {
            Some(base) if !base.is_negative() => Poly::exp(base, exponent.clone()),
            _ => Poly::atom(Atom::Unknown(format!("({})**({})", self, exponent))),
        }
    }

    /// `base ** exponent`, pulling integer constant offsets into the coefficient
    pub fn exp(base: Rational, exponent: Poly) -> Poly {
        if base.is_one() {
            return Poly::one();
        }
        if base.is_zero() {
            return Poly::zero();
        }
        if let Some(c) = exponent.as_constant() {
            return Poly::constant(base).power_rational(c);
        }
        let offset = exponent.constant_term();
        if let Some(k) = offset.to_integer() {
            if k != 0 && k.abs() <= 64 {
                if let Some(factor) = base.pow(k as i32) {
                    let rest = exponent.sub(&Poly::constant(offset));
                    return Poly::atom(Atom::Exp(base, Box::new(rest))).scale(factor);
                }
            }
        }
        Poly::atom(Atom::Exp(base, Box::new(exponent)))
    }

    pub fn log(&self) -> Poly {
        if let Some(c) = self.as_constant() {
            if c.is_one() {
                return Poly::zero();
            }
            return Poly::atom(Atom::Log(Box::new(self.clone())));
        }
        match self.single_term() {
            Some((m, c)) => {
                let mut result = if c.is_one() {
                    Poly::zero()
                } else {
                    Poly::constant(c).log()
                };
                for (atom, exp) in m.factors() {
                    let part = match atom {
                        Atom::Exp(base, p) => p.mul(&Poly::constant(*base).log()),
                        Atom::Power(p, e) => p.log().scale(*e),
                        other => Poly::atom(Atom::Log(Box::new(Poly::atom(other.clone())))),
                    };
                    result = result.add(&part.scale(Rational::from(exp)));
                }
                result
            }
            None => Poly::atom(Atom::Log(Box::new(self.clone()))),
        }
    }

    pub fn min_with(&self, other: &Poly) -> Poly {
        self.extremum(other, true)
    }

    pub fn max_with(&self, other: &Poly) -> Poly {
        self.extremum(other, false)
    }

    fn extremum(&self, other: &Poly, take_min: bool) -> Poly {
        if self == other {
            return self.clone();
        }
        if let Some(diff) = self.sub(other).as_constant() {
            let self_smaller = diff.is_negative();
            return if self_smaller == take_min {
                self.clone()
            } else {
                other.clone()
            };
        }
        let (a, b) = if self <= other {
            (self.clone(), other.clone())
        } else {
            (other.clone(), self.clone())
        };
        let atom = if take_min {
            Atom::Min(Box::new(a), Box::new(b))
        } else {
            Atom::Max(Box::new(a), Box::new(b))
        };
        Poly::atom(atom)
    }

    pub fn substitute(&self, name: &str, value: &Poly) -> Poly {
        let mut result = Poly::zero();
        for (m, c) in &self.0 {
            let mut term = Poly::constant(*c);
            for (atom, exp) in m.factors() {
                let replaced = if atom.mentions(name) && !atom.is_opaque() {
                    atom.substitute(name, value).pow_int(exp)
                } else {
                    Poly::term(Rational::ONE, Monomial::of(atom.clone(), exp))
                };
                term = term.mul(&replaced);
            }
            result = result.add(&term);
        }
        result
    }

    pub fn mentions(&self, name: &str) -> bool {
        self.0.keys().any(|m| m.factors().any(|(a, _)| a.mentions(name)))
    }

    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut BTreeSet<String>) {
        for m in self.0.keys() {
            for (atom, _) in m.factors() {
                atom.collect_vars(out);
            }
        }
    }

    pub fn has_opaque(&self) -> bool {
        self.0.keys().any(|m| m.factors().any(|(a, _)| a.is_opaque()))
    }

    /// Whether some coefficient left the `i128` range
    pub fn has_overflow(&self) -> bool {
        self.0
            .iter()
            .any(|(m, c)| c.is_overflow() || m.factors().any(|(a, _)| a.has_overflow()))
    }

    /// Highest total degree over plain variables
    pub fn max_degree(&self) -> Rational {
        self.0
            .keys()
            .map(|m| m.weight().1)
            .max()
            .unwrap_or(Rational::ZERO)
    }

    /// Binding strength of the rendered text (1 = sum, 4 = atom)
    pub fn precedence(&self) -> u8 {
        match self.0.len() {
            0 => 4,
            1 => {
                let (m, c) = match self.single_term() {
                    Some(t) => t,
                    None => return 4,
                };
                if c.is_negative() || !c.is_integer() {
                    return 2;
                }
                if m.is_one() {
                    return 4;
                }
                if !c.is_one() || m.0.len() > 1 {
                    return 2;
                }
                match m.factors().next() {
                    Some((atom, 1)) if atom.needs_parens() => 3,
                    Some((_, 1)) => 4,
                    Some((_, e)) if e < 0 => 2,
                    _ => 3,
                }
            }
            _ => 1,
        }
    }

    fn sorted_terms(&self) -> Vec<(&Monomial, Rational)> {
        let mut terms: Vec<(&Monomial, Rational)> = self.terms().collect();
        terms.sort_by(|(a, ca), (b, cb)| {
            b.weight()
                .cmp(&a.weight())
                .then_with(|| ca.is_negative().cmp(&cb.is_negative()))
                .then_with(|| a.cmp(b))
        });
        terms
    }

    fn render_term(monomial: &Monomial, coefficient: Rational) -> String {
        let numer = coefficient.numer().abs();
        let denom = coefficient.denom();

        let mut top = Monomial::render_factors(monomial.factors().filter(|(_, e)| *e > 0));
        let mut bottom =
            Monomial::render_factors(monomial.factors().filter(|(_, e)| *e < 0).map(|(a, e)| (a, -e)));

        if numer != 1 || top.is_empty() {
            top.insert(0, numer.to_string());
        }
        if denom != 1 {
            bottom.insert(0, denom.to_string());
        }

        let top = top.join("*");
        match bottom.len() {
            0 => top,
            1 => format!("{}/{}", top, bottom[0]),
            _ => format!("{}/({})", top, bottom.join("*")),
        }
    }

    /// Factored rendering `c*m*(rest)/d`, when a common factor exists
    pub fn factored(&self) -> Option<String> {
        if self.0.len() < 2 {
            return None;
        }
        let terms = self.sorted_terms();
        let leading_negative = terms.first().map_or(false, |(_, c)| c.is_negative());

        let mut content = terms
            .iter()
            .map(|(_, c)| *c)
            .reduce(|a, b| a.gcd_with(&b))
            .unwrap_or(Rational::ONE);
        if leading_negative {
            content = -content;
        }

        let mut common = Monomial::one();
        if let Some((first, _)) = terms.first() {
            for (atom, _) in first.factors() {
                if !matches!(atom, Atom::Var(_)) {
                    continue;
                }
                let shared = terms
                    .iter()
                    .map(|(m, _)| m.exponent_of(atom))
                    .min()
                    .unwrap_or(0);
                if shared > 0 {
                    common = common.mul(&Monomial::of(atom.clone(), shared));
                }
            }
        }

        if content.is_one() && common.is_one() {
            return None;
        }

        let mut rest = Poly::zero();
        for (m, c) in &terms {
            let mut reduced = (*m).clone();
            for (atom, exp) in common.factors() {
                reduced = reduced.without(atom, exp);
            }
            let coefficient = c.checked_div(&content)?;
            rest = rest.add(&Poly::term(coefficient, reduced));
        }

        let mut parts = Vec::new();
        if content.numer().abs() != 1 {
            parts.push(content.numer().abs().to_string());
        }
        parts.extend(Monomial::render_factors(common.factors()));
        parts.push(format!("({})", rest));

        let mut text = parts.join("*");
        if content.is_negative() {
            text = format!("-{}", text);
        }
        if content.denom() != 1 {
            text = format!("{}/{}", text, content.denom());
        }
        Some(text)
    }

    /// Factored rendering when it is not longer than the expanded one
    pub fn render_compact(&self) -> String {
        let expanded = self.to_string();
        match self.factored() {
            Some(factored) if factored.len() <= expanded.len() => factored,
            _ => expanded,
        }
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0");
        }
        for (i, (m, c)) in self.sorted_terms().into_iter().enumerate() {
            let text = Poly::render_term(m, c);
            match (i, c.is_negative()) {
                (0, true) => write!(f, "-{}", text)?,
                (0, false) => write!(f, "{}", text)?,
                (_, true) => write!(f, " - {}", text)?,
                (_, false) => write!(f, " + {}", text)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Poly {
        Poly::var("n")
    }

    fn r(num: i128, den: i128) -> Rational {
        Rational::new(num, den).unwrap()
    }

    #[test]
    fn expansion_combines_like_terms() {
        let p = n().add(&Poly::one()).mul(&n());
        assert_eq!(p.to_string(), "n**2 + n");
        assert_eq!(p.scale(r(1, 2)).to_string(), "n**2/2 + n/2");
        assert_eq!(n().pow_int(2).scale(r(3, 2)).to_string(), "3*n**2/2");
        assert!(n().sub(&n()).is_zero());
    }

    #[test]
    fn factored_form_only_when_not_longer() {
        let p = n().mul(&n()).add(&n()).scale(r(1, 2));
        assert_eq!(p.render_compact(), "n*(n + 1)/2");

        let q = n().scale(r(2, 1)).add(&Poly::int(2));
        assert_eq!(q.factored().as_deref(), Some("2*(n + 1)"));
        assert_eq!(q.render_compact(), "2*n + 2");
    }

    #[test]
    fn division_and_negative_powers() {
        assert_eq!(n().div(&Poly::int(2)).to_string(), "n/2");
        assert_eq!(Poly::one().div(&n()).to_string(), "1/n");
        let sum = n().add(&Poly::one());
        assert_eq!(Poly::one().div(&sum).to_string(), "(n + 1)**(-1)");
    }

    #[test]
    fn logs_and_exponentials_normalize() {
        assert!(Poly::one().log().is_zero());
        assert_eq!(n().pow_int(2).log().to_string(), "2*log(n)");
        let e = Poly::exp(r(2, 1), n().add(&Poly::one()));
        assert_eq!(e.to_string(), "2*2**n");
        assert_eq!(Poly::int(2).power(&Poly::int(3)), Poly::int(8));
    }

    #[test]
    fn min_max_decide_constant_differences() {
        let a = n().add(&Poly::int(3));
        assert_eq!(a.min_with(&n()), n());
        assert_eq!(a.max_with(&n()), a);
        let m = n().min_with(&Poly::var("m"));
        assert_eq!(m.to_string(), "Min(m, n)");
    }

    #[test]
    fn substitution_replaces_variables() {
        let p = n().pow_int(2).add(&n());
        let replaced = p.substitute("n", &n().sub(&Poly::one()));
        assert_eq!(replaced.to_string(), "n**2 - n");
        assert!(p.mentions("n"));
        assert!(!p.mentions("m"));
    }
}
