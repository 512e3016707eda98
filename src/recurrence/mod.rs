/*!
# Recurrence Classification and Solving

Recurrences are matched against seven canonical shapes:

| Class | Form |
|---|---|
| F0 | `T(n/b) + f(n)` |
| F1 | `aT(n/b) + f(n)` |
| F2 | `T(n/b) + T(n/c) + f(n)` |
| F3 | `ΣT(n/bᵢ) + f(n)` |
| F4 | `T(n-b) + f(n)` |
| F5 | `aT(n-b) + f(n)` |
| F6 | `aT(n-b) + cT(n-d) + f(n)` |

Every class has a fixed method priority. All five methods are attempted and
reported; the first applicable one in priority order supplies the final
solution, with substitution as the universal fallback.

A recurrence can come from text (`T(n) = 2T(n/2) + n`) or be derived from a
recursive function's AST by [`RecurrenceBuilder`].
*/

pub mod builder;
pub mod classify;
pub mod methods;
pub mod parse;
pub mod space;

pub use builder::{DerivedRecurrence, RecurrenceBuilder};
pub use classify::{classify, RecurrenceSolver};
pub use parse::{parse_recurrence, ParsedRecurrence, Work};
pub use space::{analyze_space, SpaceAnalysis};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Confidence, Degradation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    F0,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
}

impl Classification {
    pub fn form(&self) -> &'static str {
        match self {
            Classification::F0 => "T(n) = T(n/b) + f(n)",
            Classification::F1 => "T(n) = aT(n/b) + f(n)",
            Classification::F2 => "T(n) = T(n/b) + T(n/c) + f(n)",
            Classification::F3 => "T(n) = T(n/b1) + ... + T(n/bk) + f(n)",
            Classification::F4 => "T(n) = T(n-b) + f(n)",
            Classification::F5 => "T(n) = aT(n-b) + f(n)",
            Classification::F6 => "T(n) = aT(n-b) + cT(n-d) + f(n)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Classification::F0 => "divide and conquer, single subproblem",
            Classification::F1 => "divide and conquer, several equal subproblems",
            Classification::F2 => "divide and conquer, two subproblem sizes",
            Classification::F3 => "divide and conquer, many subproblem sizes",
            Classification::F4 => "decrease and conquer, linear chain",
            Classification::F5 => "decrease and conquer, branching",
            Classification::F6 => "multiple subtraction terms (Fibonacci-like)",
        }
    }

    pub fn is_division(&self) -> bool {
        matches!(
            self,
            Classification::F0 | Classification::F1 | Classification::F2 | Classification::F3
        )
    }

    pub fn method_priority(&self) -> &'static [Method] {
        use Method::*;
        match self {
            Classification::F0 | Classification::F1 => &[Master, Iteration, Tree, Substitution],
            Classification::F2 | Classification::F3 => &[Tree, Substitution],
            Classification::F4 => &[Characteristic, Iteration, Substitution],
            Classification::F5 => &[Characteristic, Iteration, Tree, Substitution],
            Classification::F6 => &[Characteristic, Tree, Substitution],
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Master,
    Iteration,
    Tree,
    Characteristic,
    Substitution,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Master,
        Method::Iteration,
        Method::Tree,
        Method::Characteristic,
        Method::Substitution,
    ];
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Master => "master",
            Method::Iteration => "iteration",
            Method::Tree => "tree",
            Method::Characteristic => "characteristic",
            Method::Substitution => "substitution",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionKind {
    Division,
    Subtraction,
}

/// One `aT(n/b)` or `aT(n-b)` term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecursiveTerm {
    pub coefficient: u32,
    pub kind: ReductionKind,
    pub amount: u32,
}

impl RecursiveTerm {
    pub fn division(coefficient: u32, divisor: u32) -> Self {
        Self {
            coefficient,
            kind: ReductionKind::Division,
            amount: divisor,
        }
    }

    pub fn subtraction(coefficient: u32, amount: u32) -> Self {
        Self {
            coefficient,
            kind: ReductionKind::Subtraction,
            amount,
        }
    }

    pub fn is_division(&self) -> bool {
        self.kind == ReductionKind::Division
    }

    /// Argument text, `n/2` or `n-1`
    pub fn argument(&self) -> String {
        match self.kind {
            ReductionKind::Division => format!("n/{}", self.amount),
            ReductionKind::Subtraction => format!("n-{}", self.amount),
        }
    }
}

impl fmt::Display for RecursiveTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient != 1 {
            write!(f, "{}", self.coefficient)?;
        }
        write!(f, "T({})", self.argument())
    }
}

/// `a`, `b` from the first term and `c`, `d` from the second
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceParameters {
    pub a: u32,
    pub b: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<u32>,
    pub f_n: String,
    pub is_division: bool,
}

impl RecurrenceParameters {
    pub fn from_terms(terms: &[RecursiveTerm], f_n: &str) -> Self {
        let first = terms.first();
        let second = terms.get(1);
        Self {
            a: first.map_or(1, |t| t.coefficient),
            b: first.map_or(1, |t| t.amount),
            c: second.map(|t| t.coefficient),
            d: second.map(|t| t.amount),
            f_n: f_n.to_string(),
            is_division: first.map_or(false, RecursiveTerm::is_division),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLevel {
    pub level: usize,
    pub num_nodes: String,
    pub problem_size: String,
    pub cost_per_node: String,
    pub total_level_cost: String,
}

/// Recursion-tree facts; the diagram is presentation only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeData {
    pub height: String,
    pub levels: Vec<TreeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResult {
    pub method: Method,
    pub applicable: bool,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    pub explanation: String,
    /// Master theorem case (1, 2 or 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeData>,
}

impl MethodResult {
    pub fn not_applicable(method: Method, explanation: impl Into<String>) -> Self {
        Self {
            method,
            applicable: false,
            steps: Vec::new(),
            complexity: None,
            explanation: explanation.into(),
            case: None,
            tree: None,
        }
    }

    pub fn solved(
        method: Method,
        steps: Vec<String>,
        complexity: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            method,
            applicable: true,
            steps,
            complexity: Some(complexity.into()),
            explanation: explanation.into(),
            case: None,
            tree: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceInfo {
    pub raw: String,
    pub classification: Classification,
    pub parameters: RecurrenceParameters,
    pub terms: Vec<RecursiveTerm>,
    pub base_cases: Vec<String>,
    pub methods_tried: Vec<MethodResult>,
    pub best_method: Method,
    pub final_solution: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Degradation>,
}

impl RecurrenceInfo {
    pub fn method(&self, method: Method) -> Option<&MethodResult> {
        self.methods_tried.iter().find(|m| m.method == method)
    }
}

/// Classified recurrence handed to the solving methods
#[derive(Debug, Clone)]
pub struct Recurrence {
    pub classification: Classification,
    pub terms: Vec<RecursiveTerm>,
    pub work: Work,
}

impl Recurrence {
    /// Canonical text, e.g. `T(n) = 2T(n/2) + n`
    pub fn render(&self) -> String {
        let terms: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        if self.work.is_zero() {
            format!("T(n) = {}", terms.join(" + "))
        } else {
            format!("T(n) = {} + {}", terms.join(" + "), self.work.text)
        }
    }

    pub fn total_coefficient(&self) -> u32 {
        self.terms.iter().map(|t| t.coefficient).sum()
    }
}
