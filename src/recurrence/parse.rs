//! Recurrence text parsing.
//!
//! Input is whitespace- and case-insensitive: `T(n) = 2T(n/2) + O(n)`,
//! `t(n)=2*t(n/2)+n`, `T(n) = T(⌊n/2⌋) + 1` and `T(n-1) + T(n-2)` are all
//! accepted. Repeated identical terms are merged into one coefficient.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::{RecursiveTerm, ReductionKind};
use crate::core::{AnalysisError, AnalysisResult};
use crate::symbolic::{simplify, Growth, SymExpr};

struct Patterns {
    term: Regex,
    rounding: Regex,
    log_var: Regex,
    implicit_log: Regex,
    implicit_num: Regex,
    bare_n: Regex,
    stray_term: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            term: Regex::new(r"(^|[^a-z_0-9.])(?:(\d+)\*?)?t\(n([/\-])(\d+)\)")?,
            rounding: Regex::new(r"(?:floor|ceil)\((n[/\-]\d+)\)")?,
            log_var: Regex::new(r"log([a-z])")?,
            implicit_log: Regex::new(r"([0-9a-z)])log\(")?,
            implicit_num: Regex::new(r"(^|[^a-z_0-9.])(\d+)([a-z(])")?,
            bare_n: Regex::new(r"\bn\b")?,
            stray_term: Regex::new(r"(^|[^a-z])t\(")?,
        })
    }
}

static PATTERNS: Lazy<Result<Patterns, regex::Error>> = Lazy::new(Patterns::compile);

fn patterns() -> AnalysisResult<&'static Patterns> {
    PATTERNS
        .as_ref()
        .map_err(|e| AnalysisError::UnclassifiableRecurrence(format!("pattern table: {}", e)))
}

const WRAPPERS: [&str; 7] = ["o(", "θ(", "ϴ(", "theta(", "ω(", "omega(", "big_o("];

/// Lowercase, strip whitespace, rounding glyphs and the `T(n) =` prefix
fn normalize(text: &str) -> AnalysisResult<String> {
    let mut normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '⌊' | '⌋' | '⌈' | '⌉'))
        .map(|c| match c {
            '·' | '×' => '*',
            '−' => '-',
            other => other,
        })
        .collect();
    if let Some((_, rhs)) = normalized.split_once('=') {
        normalized = rhs.to_string();
    }
    let patterns = patterns()?;
    Ok(patterns.rounding.replace_all(&normalized, "$1").into_owned())
}

fn strip_wrappers(text: &str) -> &str {
    let mut current = text;
    loop {
        let inner = WRAPPERS.iter().find_map(|prefix| {
            current
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(')'))
        });
        match inner {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

/// Non-recursive work f(n) with its growth class over `n`
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    pub text: String,
    pub growth: Growth,
    /// Parsed expression; every call costs at least a constant, so zero work reads as `1`
    pub expr: Option<SymExpr>,
    /// False when the text could not be read as an expression in `n`
    pub known: bool,
}

impl Work {
    pub fn constant() -> Self {
        Self {
            text: "1".to_string(),
            growth: Growth::constant(),
            expr: Some(SymExpr::one()),
            known: true,
        }
    }

    pub fn parse(text: &str) -> Self {
        let compact: String = text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if matches!(c, '·' | '×') { '*' } else { c })
            .collect();
        let inner = strip_wrappers(&compact);

        let expression = match inner {
            "" | "0" => return Self::zero(),
            "c" | "k" => "1".to_string(),
            other => match patterns() {
                Ok(p) => {
                    let text = p.log_var.replace_all(other, "log($1)");
                    let text = p.implicit_log.replace_all(&text, "$1*log(");
                    p.implicit_num.replace_all(&text, "$1$2*$3").into_owned()
                }
                Err(_) => other.to_string(),
            },
        };

        match SymExpr::parse(&expression) {
            Ok(expr) => {
                let poly = simplify(&expr).poly;
                if poly.is_zero() {
                    return Self::zero();
                }
                let vars: BTreeSet<String> = std::iter::once("n".to_string()).collect();
                let growth = Growth::of_poly(&poly, &vars);
                let known = growth.opaque.is_none();
                Self {
                    text: if known { growth.to_string() } else { inner.to_string() },
                    growth,
                    expr: Some(expr),
                    known,
                }
            }
            Err(_) => {
                tracing::warn!("f(n) = '{}' is not a recognized expression", text.trim());
                Self {
                    text: inner.to_string(),
                    growth: Growth {
                        opaque: Some(inner.to_string()),
                        ..Growth::default()
                    },
                    expr: None,
                    known: false,
                }
            }
        }
    }

    /// `n^k log^j n` work from a growth class, with size variables collapsed into `n`
    pub fn from_growth(growth: &Growth) -> Self {
        if let Some(opaque) = &growth.opaque {
            return Self::parse(opaque);
        }
        let degree = growth.degree();
        let logs = growth.log_count();
        let normalized = Growth::with_logs("n", degree, logs);

        let mut expr = if degree.is_zero() {
            SymExpr::one()
        } else {
            SymExpr::var("n").pow(SymExpr::num(degree))
        };
        if !logs.is_zero() {
            expr = expr.mul(SymExpr::var("n").log().pow(SymExpr::num(logs)));
        }
        Self {
            text: normalized.to_string(),
            growth: normalized,
            expr: Some(expr),
            known: true,
        }
    }

    fn zero() -> Self {
        Self {
            text: "0".to_string(),
            growth: Growth::constant(),
            expr: Some(SymExpr::one()),
            known: true,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.text == "0"
    }

    pub fn is_exponential(&self) -> bool {
        !self.growth.exponentials.is_empty()
    }

    /// Polynomial times polylog, the shape the master theorem compares
    pub fn is_polylog(&self) -> bool {
        self.known && !self.is_exponential()
    }

    /// f evaluated at `size`, e.g. `n` at `n/4` gives `n/4`
    pub fn at(&self, size: &str) -> String {
        if size == "n" {
            return self.text.clone();
        }
        if self.text == "n" {
            return size.to_string();
        }
        match patterns() {
            Ok(p) => p
                .bare_n
                .replace_all(&self.text, format!("({})", size).as_str())
                .into_owned(),
            Err(_) => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecurrence {
    pub raw: String,
    pub terms: Vec<RecursiveTerm>,
    pub work: Work,
}

/// Strict parse: fails when no recursive term is found or when division and
/// subtraction terms are mixed
pub fn parse_recurrence(text: &str) -> AnalysisResult<ParsedRecurrence> {
    let patterns = patterns()?;
    let rhs = normalize(text)?;

    let mut terms: Vec<RecursiveTerm> = Vec::new();
    for caps in patterns.term.captures_iter(&rhs) {
        let coefficient = caps
            .get(2)
            .map_or(Ok(1), |m| m.as_str().parse::<u32>())
            .map_err(|_| AnalysisError::UnclassifiableRecurrence(text.to_string()))?;
        let amount = caps[4]
            .parse::<u32>()
            .map_err(|_| AnalysisError::UnclassifiableRecurrence(text.to_string()))?;
        let kind = if &caps[3] == "/" {
            ReductionKind::Division
        } else {
            ReductionKind::Subtraction
        };

        let shrinks = match kind {
            ReductionKind::Division => amount >= 2,
            ReductionKind::Subtraction => amount >= 1,
        };
        if coefficient == 0 || !shrinks {
            return Err(AnalysisError::UnclassifiableRecurrence(format!(
                "{} (term {} does not shrink the problem)",
                text.trim(),
                &caps[0][caps[1].len()..]
            )));
        }

        match terms
            .iter_mut()
            .find(|t| t.kind == kind && t.amount == amount)
        {
            Some(existing) => existing.coefficient += coefficient,
            None => terms.push(RecursiveTerm {
                coefficient,
                kind,
                amount,
            }),
        }
    }

    if terms.is_empty() {
        return Err(AnalysisError::UnclassifiableRecurrence(text.trim().to_string()));
    }
    if terms.iter().any(|t| t.kind != terms[0].kind) {
        return Err(AnalysisError::UnclassifiableRecurrence(format!(
            "{} (mixes division and subtraction terms)",
            text.trim()
        )));
    }

    let remainder = remainder_of(&patterns.term.replace_all(&rhs, "$1"));
    if patterns.stray_term.is_match(&remainder) {
        return Err(AnalysisError::UnclassifiableRecurrence(format!(
            "{} (unsupported recursive term)",
            text.trim()
        )));
    }

    Ok(ParsedRecurrence {
        raw: text.trim().to_string(),
        terms,
        work: Work::parse(&remainder),
    })
}

/// Best-effort f(n) from text that failed the strict parse
pub(crate) fn salvage_work(text: &str) -> Work {
    let (Ok(patterns), Ok(rhs)) = (patterns(), normalize(text)) else {
        return Work::constant();
    };
    let remainder = remainder_of(&patterns.term.replace_all(&rhs, "$1"));
    if remainder.is_empty() || patterns.stray_term.is_match(&remainder) {
        Work::constant()
    } else {
        Work::parse(&remainder)
    }
}

/// What is left once the recursive terms are cut out
pub(crate) fn remainder_of(text: &str) -> String {
    let mut rest = text.to_string();
    while rest.contains("++") {
        rest = rest.replace("++", "+");
    }
    rest.trim_matches('+').to_string()
}
