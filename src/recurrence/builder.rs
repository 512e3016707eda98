/*!
# Recurrence Derivation

Builds `T(n) = Σ aT(reduced n) + f(n)` for a recursive function:

- each self-call is classified by how its arguments shrink the problem: a
  division by a literal (directly or through a midpoint variable such as
  `q 🡨 ⌊(p+r)/2⌋`) or a parameter minus a constant;
- calls in the `then` and `else` arms of one `if` are mutually exclusive, so
  only the busier arm counts;
- f(n) is the worst-case cost of the body with every self-call removed, plus
  the bodies of the non-recursive functions it calls.
*/

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{RecursiveTerm, ReductionKind, Work};
use crate::config::AnalyzerConfig;
use crate::core::{AnalysisError, AnalysisResult, Degradation, DegradationKind, DegradationLog};
use crate::cost_model::CostAnalyzer;
use crate::parser::{BinaryOp, Block, Expr, Function, Literal, Program, Stmt, StmtKind};
use crate::recursion::RecursionDetector;
use crate::series::{SeriesSolver, SolveOutput};
use crate::symbolic::{simplify, Growth};

/// Recurrence read off a function body
#[derive(Debug, Clone, Serialize)]
pub struct DerivedRecurrence {
    pub function: String,
    /// Canonical text, e.g. `T(n) = 2T(n/2) + n`
    pub text: String,
    pub terms: Vec<RecursiveTerm>,
    #[serde(skip)]
    pub work: Work,
    pub base_cases: Vec<String>,
    /// Non-recursive functions folded into f(n)
    pub auxiliary: Vec<String>,
    /// Closed form of the residual body cost
    pub residual: SolveOutput,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Degradation>,
}

impl DerivedRecurrence {
    /// False when a call could not be read as a reduction of the problem size
    pub fn is_exact(&self) -> bool {
        self.notes
            .iter()
            .all(|n| n.kind != DegradationKind::UnclassifiableRecurrence)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Reduction {
    Divide(u32),
    Subtract(u32),
    Unknown(String),
}

pub struct RecurrenceBuilder {
    analyzer: CostAnalyzer,
    solver: SeriesSolver,
}

impl RecurrenceBuilder {
    pub fn new(config: &AnalyzerConfig) -> AnalysisResult<Self> {
        Ok(Self {
            analyzer: CostAnalyzer::new(&config.cost_model)?,
            solver: SeriesSolver::new(&config.solver),
        })
    }

    pub fn build(&self, program: &Program, name: &str, source: &str) -> AnalysisResult<DerivedRecurrence> {
        let function = program
            .function(name)
            .ok_or_else(|| AnalysisError::UnknownFunction(name.to_string()))?;
        let mut notes = DegradationLog::new();

        let midpoints = midpoint_divisors(&function.body);
        let reductions = call_reductions(&function.body, function, &midpoints);
        let mut terms: Vec<RecursiveTerm> = Vec::new();
        let mut unknown = Vec::new();
        for reduction in &reductions {
            let (kind, amount) = match reduction {
                Reduction::Divide(b) => (ReductionKind::Division, *b),
                Reduction::Subtract(b) => (ReductionKind::Subtraction, *b),
                Reduction::Unknown(args) => {
                    unknown.push(format!("T({})", args));
                    continue;
                }
            };
            match terms.iter_mut().find(|t| t.kind == kind && t.amount == amount) {
                Some(existing) => existing.coefficient += 1,
                None => terms.push(RecursiveTerm {
                    coefficient: 1,
                    kind,
                    amount,
                }),
            }
        }
        if !unknown.is_empty() {
            notes.record(
                DegradationKind::UnclassifiableRecurrence,
                format!(
                    "{}: no size reduction recognized in {}",
                    name,
                    unknown.join(", ")
                ),
            );
        }

        let auxiliary = auxiliary_functions(program, function);
        let residual_program = Program::new(
            std::iter::once(Function {
                body: strip_self_calls(&function.body, name),
                ..function.clone()
            })
            .chain(
                auxiliary
                    .iter()
                    .filter_map(|aux| program.function(aux))
                    .cloned(),
            )
            .collect(),
        );
        let costs = self.analyzer.analyze(&residual_program, source);
        notes.extend(costs.notes.iter().cloned());
        let residual = self.solver.solve(&costs.total);

        let worst = simplify(&costs.total.worst).poly;
        let growth = Growth::of_poly(&worst, &worst.free_vars());
        let work = if worst.is_zero() {
            Work::constant()
        } else {
            Work::from_growth(&growth)
        };
        if !work.known {
            notes.record(
                DegradationKind::UnrecognizedExpression,
                format!("{}: residual cost {}", name, work.text),
            );
        }

        let mut rendered: Vec<String> = terms.iter().map(ToString::to_string).collect();
        rendered.extend(unknown);
        let text = format!("T(n) = {} + {}", rendered.join(" + "), work.text);
        tracing::info!("{} derives {}", name, text);

        Ok(DerivedRecurrence {
            function: name.to_string(),
            text,
            terms,
            work,
            base_cases: base_cases(&function.body, name),
            auxiliary,
            residual,
            notes: notes.into_notes(),
        })
    }
}

/// Variables assigned from a division by a literal, with the divisor
fn midpoint_divisors(block: &Block) -> BTreeMap<String, u32> {
    let mut midpoints = BTreeMap::new();
    visit_statements(block, &mut |stmt| {
        if let StmtKind::Assign {
            target: Expr::Var { name },
            value,
        } = &stmt.kind
        {
            if let Some(divisor) = literal_divisor(value) {
                midpoints.insert(name.clone(), divisor);
            }
        }
    });
    midpoints
}

fn visit_statements(block: &Block, visit: &mut dyn FnMut(&Stmt)) {
    for stmt in &block.statements {
        visit(stmt);
        for nested in stmt.blocks() {
            visit_statements(nested, visit);
        }
    }
}

fn literal_divisor(expr: &Expr) -> Option<u32> {
    if let Expr::BinOp {
        op: BinaryOp::Div | BinaryOp::IntDiv,
        right,
        ..
    } = expr
    {
        if let Expr::Literal {
            value: Literal::Int(b),
        } = right.as_ref()
        {
            if *b >= 2 {
                return u32::try_from(*b).ok();
            }
        }
    }
    expr.children().into_iter().find_map(literal_divisor)
}

fn mentions_any(expr: &Expr, names: &BTreeMap<String, u32>) -> Option<u32> {
    match expr {
        Expr::Var { name } => names.get(name).copied(),
        other => other
            .children()
            .into_iter()
            .find_map(|child| mentions_any(child, names)),
    }
}

fn reduction_of(args: &[Expr], function: &Function, midpoints: &BTreeMap<String, u32>) -> Reduction {
    if let Some(divisor) = args
        .iter()
        .find_map(|arg| literal_divisor(arg).or_else(|| mentions_any(arg, midpoints)))
    {
        return Reduction::Divide(divisor);
    }
    let shift = args.iter().find_map(|arg| match arg {
        Expr::BinOp {
            op: BinaryOp::Sub,
            left,
            right,
        } => match (left.as_ref(), right.as_ref()) {
            (
                Expr::Var { name },
                Expr::Literal {
                    value: Literal::Int(k),
                },
            ) if function.has_param(name) && *k >= 1 => u32::try_from(*k).ok(),
            _ => None,
        },
        _ => None,
    });
    match shift {
        Some(k) => Reduction::Subtract(k),
        None => Reduction::Unknown(
            args.iter()
                .map(Expr::to_compact_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn self_calls_in<'a>(expr: &'a Expr, name: &str, out: &mut Vec<&'a [Expr]>) {
    if let Expr::Call { name: callee, args } = expr {
        if callee == name {
            out.push(args);
        }
    }
    for child in expr.children() {
        self_calls_in(child, name, out);
    }
}

/// Reductions of every self-call, counting the busier arm of each `if`
fn call_reductions(block: &Block, function: &Function, midpoints: &BTreeMap<String, u32>) -> Vec<Reduction> {
    let mut reductions = Vec::new();
    for stmt in &block.statements {
        let mut calls: Vec<&[Expr]> = Vec::new();
        if let StmtKind::CallStatement { name, args } = &stmt.kind {
            if name == &function.name {
                calls.push(args);
            }
        }
        for expr in stmt.expressions() {
            self_calls_in(expr, &function.name, &mut calls);
        }
        reductions.extend(
            calls
                .into_iter()
                .map(|args| reduction_of(args, function, midpoints)),
        );

        match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                let then_calls = call_reductions(then_block, function, midpoints);
                let else_calls = else_block
                    .as_ref()
                    .map(|b| call_reductions(b, function, midpoints))
                    .unwrap_or_default();
                if else_calls.len() > then_calls.len() {
                    reductions.extend(else_calls);
                } else {
                    reductions.extend(then_calls);
                }
            }
            _ => {
                for nested in stmt.blocks() {
                    reductions.extend(call_reductions(nested, function, midpoints));
                }
            }
        }
    }
    reductions
}

/// Non-recursive functions reachable from `function`, in call order
fn auxiliary_functions(program: &Program, function: &Function) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    seen.insert(function.name.clone());
    let mut pending = vec![function];

    while let Some(current) = pending.pop() {
        for callee in called_names(&current.body) {
            if !seen.insert(callee.clone()) {
                continue;
            }
            let Some(target) = program.function(&callee) else {
                continue;
            };
            if RecursionDetector::self_calls(target).is_empty() {
                found.push(callee);
                pending.push(target);
            }
        }
    }
    found
}

fn called_names(block: &Block) -> Vec<String> {
    fn from_expr(expr: &Expr, out: &mut Vec<String>) {
        if let Expr::Call { name, .. } = expr {
            out.push(name.clone());
        }
        for child in expr.children() {
            from_expr(child, out);
        }
    }

    let mut names = Vec::new();
    visit_statements(block, &mut |stmt| {
        if let StmtKind::CallStatement { name, .. } = &stmt.kind {
            names.push(name.clone());
        }
        for expr in stmt.expressions() {
            from_expr(expr, &mut names);
        }
    });
    names
}

/// Body with self-call statements dropped and self-call expressions zeroed
fn strip_self_calls(block: &Block, name: &str) -> Block {
    let statements = block
        .statements
        .iter()
        .filter(|stmt| !matches!(&stmt.kind, StmtKind::CallStatement { name: callee, .. } if callee == name))
        .map(|stmt| Stmt::new(strip_stmt(&stmt.kind, name), stmt.lines))
        .collect();
    Block::new(statements)
}

fn strip_stmt(kind: &StmtKind, name: &str) -> StmtKind {
    let expr = |e: &Expr| strip_expr(e, name);
    let block = |b: &Block| strip_self_calls(b, name);
    match kind {
        StmtKind::Assign { target, value } => StmtKind::Assign {
            target: expr(target),
            value: expr(value),
        },
        StmtKind::For {
            var,
            start,
            end,
            body,
        } => StmtKind::For {
            var: var.clone(),
            start: expr(start),
            end: expr(end),
            body: block(body),
        },
        StmtKind::While { cond, body } => StmtKind::While {
            cond: expr(cond),
            body: block(body),
        },
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => StmtKind::If {
            cond: expr(cond),
            then_block: block(then_block),
            else_block: else_block.as_ref().map(block),
        },
        StmtKind::Return { value } => StmtKind::Return {
            value: value.as_ref().map(expr),
        },
        StmtKind::ExprStmt { expr: inner } => StmtKind::ExprStmt { expr: expr(inner) },
        StmtKind::CallStatement { name: callee, args } => StmtKind::CallStatement {
            name: callee.clone(),
            args: args.iter().map(expr).collect(),
        },
        StmtKind::VarDeclaration { .. } | StmtKind::ActionStatement { .. } => kind.clone(),
    }
}

fn strip_expr(expr: &Expr, name: &str) -> Expr {
    match expr {
        Expr::Call { name: callee, .. } if callee == name => Expr::int(0),
        Expr::Var { .. } | Expr::Literal { .. } => expr.clone(),
        Expr::BinOp { op, left, right } => {
            Expr::binary(*op, strip_expr(left, name), strip_expr(right, name))
        }
        Expr::Compare { op, left, right } => {
            Expr::compare(*op, strip_expr(left, name), strip_expr(right, name))
        }
        Expr::UnOp { op, operand } => Expr::unary(*op, strip_expr(operand, name)),
        Expr::Call { name: callee, args } => Expr::call(
            callee.clone(),
            args.iter().map(|a| strip_expr(a, name)).collect(),
        ),
        Expr::ArrayAccess { array, index } => {
            Expr::index(strip_expr(array, name), strip_expr(index, name))
        }
        Expr::ArrayLiteral { elements } => Expr::ArrayLiteral {
            elements: elements.iter().map(|e| strip_expr(e, name)).collect(),
        },
    }
}

/// Conditions of `if` statements whose `then` arm returns without recursing
fn base_cases(block: &Block, name: &str) -> Vec<String> {
    let mut cases = Vec::new();
    visit_statements(block, &mut |stmt| {
        if let StmtKind::If {
            cond, then_block, ..
        } = &stmt.kind
        {
            let returns = then_block
                .statements
                .iter()
                .any(|s| matches!(s.kind, StmtKind::Return { .. }));
            let recurses = called_names(then_block).iter().any(|callee| callee == name);
            if returns && !recurses {
                cases.push(cond.to_compact_string());
            }
        }
    });
    cases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn derive(source: &str, name: &str) -> DerivedRecurrence {
        let program = parse(source).unwrap();
        RecurrenceBuilder::new(&AnalyzerConfig::default())
            .unwrap()
            .build(&program, name, source)
            .unwrap()
    }

    const FIBONACCI: &str = "\
fib(n)
begin
  if n <= 1 then
  begin
    return n
  end
  return CALL fib(n - 1) + CALL fib(n - 2)
end
";

    const MERGE_SORT: &str = "\
merge_sort(A[], p, r)
begin
  if p < r then
  begin
    q 🡨 ⌊(p + r) / 2⌋
    CALL merge_sort(A, p, q)
    CALL merge_sort(A, q + 1, r)
    CALL merge(A, p, q, r)
  end
end

merge(A[], p, q, r)
begin
  for k 🡨 p to r do
  begin
    B[k] 🡨 A[k]
  end
end
";

    const BINARY_SEARCH: &str = "\
search(A[], x, low, high)
begin
  if low > high then
  begin
    return -1
  end
  mid 🡨 (low + high) div 2
  if A[mid] = x then
  begin
    return mid
  end
  else if A[mid] < x then
  begin
    return CALL search(A, x, mid + 1, high)
  end
  else
  begin
    return CALL search(A, x, low, mid - 1)
  end
end
";

    #[test]
    fn fibonacci_terms_and_base_case() {
        let derived = derive(FIBONACCI, "fib");
        assert_eq!(
            derived.terms,
            vec![RecursiveTerm::subtraction(1, 1), RecursiveTerm::subtraction(1, 2)]
        );
        assert_eq!(derived.work.text, "1");
        assert_eq!(derived.text, "T(n) = T(n-1) + T(n-2) + 1");
        assert_eq!(derived.base_cases, vec!["n<=1".to_string()]);
        assert!(derived.is_exact());
    }

    #[test]
    fn merge_sort_folds_in_merge() {
        let derived = derive(MERGE_SORT, "merge_sort");
        assert_eq!(derived.terms, vec![RecursiveTerm::division(2, 2)]);
        assert_eq!(derived.auxiliary, vec!["merge".to_string()]);
        assert_eq!(derived.work.text, "n");
        assert_eq!(derived.text, "T(n) = 2T(n/2) + n");
    }

    #[test]
    fn exclusive_branches_count_once() {
        let derived = derive(BINARY_SEARCH, "search");
        assert_eq!(derived.terms, vec![RecursiveTerm::division(1, 2)]);
        assert_eq!(derived.work.text, "1");
        assert_eq!(
            derived.base_cases,
            vec!["low>high".to_string(), "A[mid]==x".to_string()]
        );
    }

    #[test]
    fn unrecognized_reduction_is_noted() {
        let source = "\
walk(n, m)
begin
  if n > 0 then
  begin
    CALL walk(m, n)
  end
end
";
        let derived = derive(source, "walk");
        assert!(derived.terms.is_empty());
        assert!(!derived.is_exact());
        assert!(derived.text.contains("T(m,n)"));
    }

    #[test]
    fn missing_function_is_an_error() {
        let program = parse(FIBONACCI).unwrap();
        let result = RecurrenceBuilder::new(&AnalyzerConfig::default())
            .unwrap()
            .build(&program, "nope", FIBONACCI);
        assert!(matches!(result, Err(AnalysisError::UnknownFunction(_))));
    }
}
