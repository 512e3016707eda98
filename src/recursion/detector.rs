use serde::{Deserialize, Serialize};

use crate::parser::{AstVisitor, Expr, Function, Program, Stmt, StmtKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursiveCall {
    pub line: usize,
    /// Compact argument text, e.g. `n-1`, `A[i]`
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursiveFunction {
    pub name: String,
    pub calls: Vec<RecursiveCall>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionReport {
    pub is_recursive: bool,
    pub recursive_functions: Vec<RecursiveFunction>,
}

impl RecursionReport {
    pub fn function(&self, name: &str) -> Option<&RecursiveFunction> {
        self.recursive_functions.iter().find(|f| f.name == name)
    }
}

struct SelfCallCollector<'a> {
    name: &'a str,
    calls: Vec<RecursiveCall>,
}

impl SelfCallCollector<'_> {
    fn push(&mut self, line: Option<usize>, args: &[Expr]) {
        self.calls.push(RecursiveCall {
            line: line.unwrap_or(0),
            args: args.iter().map(Expr::to_compact_string).collect(),
        });
    }
}

impl AstVisitor for SelfCallCollector<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::CallStatement { name, args } = &stmt.kind {
            if name == self.name {
                self.push(stmt.lines.line_start, args);
            }
        }
    }

    fn visit_expr(&mut self, expr: &Expr, line: Option<usize>) {
        if let Expr::Call { name, args } = expr {
            if name == self.name {
                self.push(line, args);
            }
        }
    }
}

/// Direct recursion finder
#[derive(Debug, Default, Clone)]
pub struct RecursionDetector;

impl RecursionDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, program: &Program) -> RecursionReport {
        let recursive_functions: Vec<RecursiveFunction> = program
            .functions
            .iter()
            .filter_map(|function| {
                let calls = Self::self_calls(function);
                (!calls.is_empty()).then(|| RecursiveFunction {
                    name: function.name.clone(),
                    calls,
                })
            })
            .collect();

        for function in &recursive_functions {
            tracing::debug!(
                "{} calls itself {} time(s)",
                function.name,
                function.calls.len()
            );
        }

        RecursionReport {
            is_recursive: !recursive_functions.is_empty(),
            recursive_functions,
        }
    }

    /// Self-calls of `function` in pre-order
    pub fn self_calls(function: &Function) -> Vec<RecursiveCall> {
        let mut collector = SelfCallCollector {
            name: &function.name,
            calls: Vec::new(),
        };
        collector.walk_block(&function.body);
        collector.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn fibonacci_calls_are_reported_with_arguments() {
        let program = parse(
            "\
fib(n)
begin
  if n <= 1 then
  begin
    return n
  end
  return CALL fib(n - 1) + CALL fib(n - 2)
end
",
        )
        .unwrap();
        let report = RecursionDetector::new().detect(&program);

        assert!(report.is_recursive);
        let fib = report.function("fib").unwrap();
        assert_eq!(
            fib.calls,
            vec![
                RecursiveCall {
                    line: 7,
                    args: vec!["n-1".to_string()],
                },
                RecursiveCall {
                    line: 7,
                    args: vec!["n-2".to_string()],
                },
            ]
        );
    }

    #[test]
    fn call_statements_and_array_arguments() {
        let program = parse(
            "\
sort(A, p, r)
begin
  if p < r then
  begin
    q 🡨 ⌊(p + r) / 2⌋
    CALL sort(A, p, q)
    CALL sort(A, q + 1, r)
    CALL show(A[q])
  end
end
",
        )
        .unwrap();
        let report = RecursionDetector::new().detect(&program);
        let calls = &report.recursive_functions[0].calls;

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].line, 6);
        assert_eq!(calls[1].args, vec!["A", "q+1", "r"]);
    }

    #[test]
    fn calls_to_other_functions_are_not_recursion() {
        let program = parse(
            "\
helper(n)
begin
  return n
end

main(n)
begin
  x 🡨 CALL helper(n - 1)
end
",
        )
        .unwrap();
        let report = RecursionDetector::new().detect(&program);
        assert!(!report.is_recursive);
        assert!(report.recursive_functions.is_empty());
    }
}
