//! Exact rational numbers over `i128`, always kept in lowest terms with a positive denominator.
//!
//! Results that leave the `i128` range become [`Rational::OVERFLOW`], which
//! absorbs every later operation so callers can detect it once at the end.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    num: i128,
    den: i128,
}

pub fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    i128::try_from(a).unwrap_or(1)
}

fn lcm(a: i128, b: i128) -> Option<i128> {
    if a == 0 || b == 0 {
        Some(0)
    } else {
        fit((a / gcd(a, b)).checked_mul(b)?.checked_abs())
    }
}

/// `i128::MIN` has no negation, so it counts as overflow too
fn fit(value: Option<i128>) -> Option<i128> {
    value.filter(|v| *v != i128::MIN)
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };
    pub const OVERFLOW: Rational = Rational { num: 1, den: 0 };

    /// `None` when `den` is zero or a part does not fit
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let (num, den) = (fit(Some(num))?, fit(Some(den))?);
        let g = gcd(num, den).max(1);
        let sign = if den < 0 { -1 } else { 1 };
        Some(Self {
            num: sign * num / g,
            den: sign * den / g,
        })
    }

    pub fn from_integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Parses `12`, `-3`, `0.25`, `3/4`
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some((num, den)) = text.split_once('/') {
            return Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?);
        }
        match text.split_once('.') {
            Some((whole, frac)) => {
                if frac.is_empty() || frac.len() > 18 || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let negative = whole.starts_with('-');
                let whole: i128 = if whole.is_empty() || whole == "-" {
                    0
                } else {
                    whole.parse().ok()?
                };
                let scale = 10i128.pow(frac.len() as u32);
                let frac: i128 = frac.parse().ok()?;
                let magnitude = fit(whole.checked_abs()?.checked_mul(scale)?.checked_add(frac))?;
                Self::new(if negative { -magnitude } else { magnitude }, scale)
            }
            None => fit(text.parse().ok()).map(Self::from_integer),
        }
    }

    /// Exact for finite decimals up to 12 places, rounded beyond that
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scale = 1_000_000_000_000i128;
        Self::new((value * scale as f64).round() as i128, scale)
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_overflow(&self) -> bool {
        self.den == 0
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -*self
        } else {
            *self
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Integer value when the denominator is one
    pub fn to_integer(&self) -> Option<i128> {
        self.is_integer().then_some(self.num)
    }

    pub fn recip(&self) -> Option<Self> {
        if self.is_overflow() {
            return Some(Self::OVERFLOW);
        }
        Self::new(self.den, self.num)
    }

    /// `None` only for division by zero; an out-of-range quotient is [`Rational::OVERFLOW`]
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        other.recip().map(|r| *self * r)
    }

    /// `None` when the exact sum does not fit in `i128`
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        if self.is_overflow() || rhs.is_overflow() {
            return None;
        }
        let den = lcm(self.den, rhs.den)?;
        let left = self.num.checked_mul(den / self.den)?;
        let right = rhs.num.checked_mul(den / rhs.den)?;
        Self::new(fit(left.checked_add(right))?, den)
    }

    /// `None` when the exact product does not fit in `i128`
    pub fn checked_mul(&self, rhs: &Self) -> Option<Self> {
        if self.is_overflow() || rhs.is_overflow() {
            return None;
        }
        let g1 = gcd(self.num, rhs.den).max(1);
        let g2 = gcd(rhs.num, self.den).max(1);
        let num = (self.num / g1).checked_mul(rhs.num / g2);
        let den = (self.den / g2).checked_mul(rhs.den / g1);
        Self::new(fit(num)?, fit(den)?)
    }

    pub fn pow(&self, exp: i32) -> Option<Self> {
        let base = if exp < 0 { self.recip()? } else { *self };
        let mut result = Self::ONE;
        for _ in 0..exp.unsigned_abs() {
            result = result * base;
        }
        Some(result)
    }

    /// Greatest common divisor of two fractions (gcd of numerators over lcm of denominators)
    pub fn gcd_with(&self, other: &Self) -> Self {
        if self.is_overflow() || other.is_overflow() {
            return Self::ONE;
        }
        let num = gcd(self.num, other.num);
        match lcm(self.den, other.den) {
            Some(den) => Self::new(num, den.max(1)).unwrap_or(Self::ONE),
            None => Self::ONE,
        }
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value as i128)
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        self.checked_add(&rhs).unwrap_or(Rational::OVERFLOW)
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        self + (-rhs)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        self.checked_mul(&rhs).unwrap_or(Rational::OVERFLOW)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        match fit(self.num.checked_neg()) {
            Some(num) if !self.is_overflow() => Rational { num, den: self.den },
            _ => Rational::OVERFLOW,
        }
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_overflow(), other.is_overflow()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        match (self.num.checked_mul(other.den), other.num.checked_mul(self.den)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self
                .to_f64()
                .partial_cmp(&other.to_f64())
                .unwrap_or(Ordering::Equal)
                .then_with(|| (self.num, self.den).cmp(&(other.num, other.den))),
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_overflow() {
            write!(f, "overflow")
        } else if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(num: i128, den: i128) -> Rational {
        Rational::new(num, den).unwrap()
    }

    #[test]
    fn normalizes_sign_and_terms() {
        assert_eq!(r(2, -4), r(-1, 2));
        assert_eq!(r(6, 3).to_integer(), Some(2));
        assert!(Rational::new(1, 0).is_none());
    }

    #[test]
    fn arithmetic() {
        assert_eq!(r(1, 2) + r(1, 3), r(5, 6));
        assert_eq!(r(1, 2) - r(1, 2), Rational::ZERO);
        assert_eq!(r(2, 3) * r(9, 4), r(3, 2));
        assert_eq!(r(1, 2).checked_div(&r(1, 4)), Some(r(2, 1)));
        assert_eq!(r(2, 3).pow(-2), Some(r(9, 4)));
        assert!(r(1, 3) < r(1, 2));
    }

    #[test]
    fn parses_decimals_and_fractions() {
        assert_eq!(Rational::parse("0.5"), Some(r(1, 2)));
        assert_eq!(Rational::parse("-1.25"), Some(r(-5, 4)));
        assert_eq!(Rational::parse("3/6"), Some(r(1, 2)));
        assert_eq!(Rational::parse("7"), Some(r(7, 1)));
        assert_eq!(Rational::parse("abc"), None);
        assert_eq!(Rational::from_f64(0.3), Some(r(3, 10)));
    }

    #[test]
    fn out_of_range_results_overflow_instead_of_panicking() {
        let big = Rational::from_integer(100_000_000_000);
        let product = big * big * big * big;
        assert!(product.is_overflow());
        assert!((product + Rational::ONE).is_overflow());
        assert!((-product).is_overflow());
        assert_eq!(big.checked_mul(&big), Some(Rational::from_integer(10i128.pow(22))));
        assert_eq!(Rational::from_integer(i128::MAX).checked_add(&Rational::ONE), None);
        assert!(Rational::from_integer(i128::MAX) > r(-1, 2));
        assert!(r(i128::MAX, 3) < r(i128::MAX, 2));
        assert!(product > Rational::from_integer(i128::MAX));
        assert_eq!(product.to_string(), "overflow");
    }

    #[test]
    fn gcd_of_fractions() {
        assert_eq!(r(1, 2).gcd_with(&r(3, 4)), r(1, 4));
        assert_eq!(r(6, 1).gcd_with(&r(9, 1)), r(3, 1));
        assert_eq!(r(1, 2).to_string(), "1/2");
    }
}
