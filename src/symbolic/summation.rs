//! Closed forms for finite sums `Σ_{v=start}^{end} body`.
//!
//! Power sums use Faulhaber's formula with Bernoulli numbers (B₁ = +1/2),
//! `Σ_{v=a}^{b} v^k = S_k(b) − S_k(a−1)`. Terms `r^(αv+β)` are summed as
//! geometric series. Any other term is kept as an unresolved atom.

use once_cell::sync::Lazy;

use super::poly::{Atom, Monomial, Poly};
use super::rational::Rational;

/// Largest power handled by Faulhaber's formula
const MAX_POWER: usize = 24;

static BERNOULLI: Lazy<Vec<Rational>> = Lazy::new(|| bernoulli_numbers(MAX_POWER + 1));

fn binomial(n: usize, k: usize) -> Rational {
    let mut result = Rational::ONE;
    for i in 0..k {
        result = result * Rational::from_integer((n - i) as i128);
        result = result
            .checked_div(&Rational::from_integer((i + 1) as i128))
            .unwrap_or(Rational::ZERO);
    }
    result
}

/// B₀..B_count with the B₁ = +1/2 convention
fn bernoulli_numbers(count: usize) -> Vec<Rational> {
    let mut b: Vec<Rational> = Vec::with_capacity(count + 1);
    for m in 0..=count {
        if m == 0 {
            b.push(Rational::ONE);
            continue;
        }
        let mut acc = Rational::ZERO;
        for (j, bj) in b.iter().enumerate() {
            acc = acc + binomial(m + 1, j) * *bj;
        }
        let bm = (-acc)
            .checked_div(&Rational::from_integer((m + 1) as i128))
            .unwrap_or(Rational::ZERO);
        b.push(bm);
    }
    if let Some(b1) = b.get_mut(1) {
        *b1 = -*b1;
    }
    b
}

/// `S_k(x) = Σ_{v=1}^{x} v^k` as a polynomial in `x`
fn power_sum(k: usize, x: &Poly) -> Poly {
    let mut result = Poly::zero();
    for j in 0..=k {
        let coefficient = binomial(k + 1, j) * BERNOULLI[j];
        if coefficient.is_zero() {
            continue;
        }
        result = result.add(&x.pow_int((k + 1 - j) as i64).scale(coefficient));
    }
    result
        .scale(Rational::new(1, (k + 1) as i128).unwrap_or(Rational::ONE))
}

/// Splits `p` into `α·var + β` when it is linear in `var` with constant `α`
fn linear_in(p: &Poly, var: &str) -> Option<(Rational, Poly)> {
    let mut alpha = Rational::ZERO;
    let mut beta = Poly::zero();
    for (monomial, coefficient) in p.terms() {
        let (exponent, rest) = monomial.split_var(var);
        match exponent {
            0 if !rest.factors().any(|(a, _)| a.mentions(var)) => {
                beta = beta.add(&Poly::term(coefficient, rest));
            }
            1 if rest.is_one() => alpha = alpha + coefficient,
            _ => return None,
        }
    }
    Some((alpha, beta))
}

/// Sum of one term of the body; `None` when there is no closed form
fn sum_term(
    coefficient: Rational,
    monomial: &Monomial,
    var: &str,
    start: &Poly,
    end: &Poly,
) -> Option<Poly> {
    let (power, rest) = monomial.split_var(var);

    let mut dependent: Vec<(&Atom, i64)> = Vec::new();
    let mut independent = Monomial::one();
    for (atom, exp) in rest.factors() {
        if atom.mentions(var) {
            dependent.push((atom, exp));
        } else {
            independent = independent.mul(&Monomial::of(atom.clone(), exp));
        }
    }
    let outer = Poly::term(coefficient, independent);

    match (power, dependent.as_slice()) {
        (k, []) if k >= 0 && (k as usize) <= MAX_POWER => {
            let k = k as usize;
            let upper = power_sum(k, end);
            let lower = power_sum(k, &start.sub(&Poly::one()));
            Some(outer.mul(&upper.sub(&lower)))
        }
        (0, [(Atom::Exp(base, exponent), times)]) => {
            let (alpha, beta) = linear_in(exponent, var)?;
            let alpha = alpha * Rational::from(*times);
            let beta = beta.scale(Rational::from(*times));
            let ratio = base.pow(alpha.to_integer()? as i32)?;
            if ratio.is_one() {
                let count = end.sub(start).add(&Poly::one());
                return Some(outer.mul(&Poly::exp(*base, beta)).mul(&count));
            }
            // (r^(α(end+1)+β) − r^(α·start+β)) / (r^α − 1)
            let high = Poly::exp(
                *base,
                end.add(&Poly::one()).scale(alpha).add(&beta),
            );
            let low = Poly::exp(*base, start.scale(alpha).add(&beta));
            let denominator = ratio - Rational::ONE;
            Some(
                outer
                    .mul(&high.sub(&low))
                    .scale(Rational::ONE.checked_div(&denominator)?),
            )
        }
        _ => None,
    }
}

/// Result of summing a polynomial body
#[derive(Debug, Clone, PartialEq)]
pub struct SumOutcome {
    pub value: Poly,
    /// Terms left without a closed form
    pub unresolved: Vec<String>,
}

/// Sums `body` over `var` from `start` to `end`, term by term
pub fn sum_poly(body: &Poly, var: &str, start: &Poly, end: &Poly) -> SumOutcome {
    let mut value = Poly::zero();
    let mut unresolved = Vec::new();

    for (monomial, coefficient) in body.terms() {
        let term = Poly::term(coefficient, monomial.clone());
        let closed = if monomial.factors().any(|(a, _)| a.is_opaque() && a.mentions(var)) {
            None
        } else {
            sum_term(coefficient, monomial, var, start, end)
        };
        match closed {
            Some(sum) => value = value.add(&sum),
            None => {
                let text = format!("Sum({}, ({}, {}, {}))", term, var, start, end);
                tracing::debug!("no closed form for {}", text);
                unresolved.push(text.clone());
                value = value.add(&Poly::atom(Atom::Unresolved(text)));
            }
        }
    }

    SumOutcome { value, unresolved }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn n() -> Poly {
        Poly::var("n")
    }

    #[test]
    fn bernoulli_prefix() {
        let b = bernoulli_numbers(4);
        assert_eq!(b[1], Rational::new(1, 2).unwrap());
        assert_eq!(b[2], Rational::new(1, 6).unwrap());
        assert!(b[3].is_zero());
        assert_eq!(b[4], Rational::new(-1, 30).unwrap());
    }

    #[test]
    fn constant_and_linear_sums() {
        let outcome = sum_poly(&Poly::int(2), "i", &Poly::one(), &n());
        assert_eq!(outcome.value.to_string(), "2*n");

        let outcome = sum_poly(&Poly::var("i"), "i", &Poly::one(), &n());
        assert_eq!(outcome.value.to_string(), "n**2/2 + n/2");
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn shifted_bounds() {
        // Σ_{j=i+1}^{n} 1 = n − i
        let outcome = sum_poly(
            &Poly::one(),
            "j",
            &Poly::var("i").add(&Poly::one()),
            &n(),
        );
        assert_eq!(outcome.value.to_string(), "n - i");
    }

    #[test]
    fn squares() {
        let body = Poly::var("k").pow_int(2);
        let outcome = sum_poly(&body, "k", &Poly::one(), &n());
        assert_eq!(outcome.value.to_string(), "n**3/3 + n**2/2 + n/6");
    }

    #[test]
    fn geometric_series() {
        let body = Poly::exp(Rational::from(2), Poly::var("i"));
        let outcome = sum_poly(&body, "i", &Poly::zero(), &n().sub(&Poly::one()));
        assert_eq!(outcome.value.to_string(), "2**n - 1");
    }

    #[test]
    fn harmonic_sum_stays_symbolic() {
        let body = Poly::one().div(&Poly::var("i"));
        let outcome = sum_poly(&body, "i", &Poly::one(), &n());
        assert_eq!(outcome.unresolved, vec!["Sum(1/i, (i, 1, n))".to_string()]);
        assert!(outcome.value.has_opaque());
    }
}
