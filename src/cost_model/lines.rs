//! Per-line attribution.
//!
//! Re-walks the tree in the same pre-order as the analyzer, charging each
//! node's own cost to its start line and re-applying the enclosing loop
//! summations and branch weights so nesting multiplicities compose.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::analyzer::{LoopInfo, LoopKind, NodeCost};
use super::cost_expr::CostExpr;
use crate::parser::{Block, Program, Stmt, StmtKind};
use crate::symbolic::{Rational, SymExpr};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCost {
    pub line_number: usize,
    /// Source text of the line, trimmed
    pub code: String,
    /// Node types starting on this line
    pub operations: Vec<String>,
    pub cost: CostExpr,
}

enum Scope {
    Loop(LoopInfo),
    Then,
    Else,
}

struct LineWalker<'a> {
    nodes: &'a [NodeCost],
    next: usize,
    scopes: Vec<Scope>,
    probability: Rational,
    source_lines: Vec<&'a str>,
    lines: BTreeMap<usize, LineCost>,
}

impl<'a> LineWalker<'a> {
    fn wrap(&self, cost: CostExpr) -> CostExpr {
        self.scopes.iter().rev().fold(cost, |cost, scope| match scope {
            Scope::Loop(info) if info.kind == LoopKind::For => {
                cost.sum_over(&info.var, &info.start, &info.end)
            }
            Scope::Loop(info) => {
                let avg_end = info.avg_end.as_ref().unwrap_or(&info.end);
                CostExpr::new(
                    SymExpr::zero(),
                    SymExpr::sum(cost.avg, &info.var, info.start.clone(), avg_end.clone()),
                    SymExpr::sum(cost.worst, &info.var, info.start.clone(), info.end.clone()),
                )
            }
            Scope::Then => CostExpr::new(
                SymExpr::zero(),
                cost.avg.scale(self.probability),
                cost.worst,
            ),
            Scope::Else => CostExpr::new(
                SymExpr::zero(),
                cost.avg.scale(Rational::ONE - self.probability),
                cost.worst,
            ),
        })
    }

    /// Guard of a while loop is evaluated once per iteration plus once at exit
    fn while_line_cost(guard: &CostExpr, info: &LoopInfo) -> CostExpr {
        let avg_end = info.avg_end.as_ref().unwrap_or(&info.end);
        let repeated = |g: &SymExpr, end: &SymExpr| {
            SymExpr::sum(g.clone(), &info.var, info.start.clone(), end.clone()).add(g.clone())
        };
        CostExpr::new(
            guard.best.clone(),
            repeated(&guard.avg, avg_end),
            repeated(&guard.worst, &info.end),
        )
    }

    fn walk_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        let nodes = self.nodes;
        let node = match nodes.get(self.next) {
            Some(node) => node,
            None => return,
        };
        self.next += 1;

        let own = match (&stmt.kind, &node.loop_info) {
            (StmtKind::While { .. }, Some(info)) => Self::while_line_cost(&node.own_cost, info),
            _ => node.own_cost.clone(),
        };
        let charged = self.wrap(own);

        if let Some(line) = stmt.lines.line_start {
            let code = self
                .source_lines
                .get(line.saturating_sub(1))
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            let entry = self.lines.entry(line).or_insert_with(|| LineCost {
                line_number: line,
                code,
                operations: Vec::new(),
                cost: CostExpr::zero(),
            });
            entry.cost = entry.cost.add(&charged);
            entry.operations.push(stmt.type_name().to_string());
        }

        match &stmt.kind {
            StmtKind::For { body, .. } | StmtKind::While { body, .. } => {
                match node.loop_info.clone() {
                    Some(info) => {
                        self.scopes.push(Scope::Loop(info));
                        self.walk_block(body);
                        self.scopes.pop();
                    }
                    None => self.walk_block(body),
                }
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                self.scopes.push(Scope::Then);
                self.walk_block(then_block);
                self.scopes.pop();
                if let Some(else_block) = else_block {
                    self.scopes.push(Scope::Else);
                    self.walk_block(else_block);
                    self.scopes.pop();
                }
            }
            _ => {}
        }
    }
}

/// Line costs for `program`, given node costs in analyzer pre-order
pub fn attribute_lines(
    program: &Program,
    nodes: &[NodeCost],
    source: &str,
    probability: Rational,
) -> Vec<LineCost> {
    let mut walker = LineWalker {
        nodes,
        next: 0,
        scopes: Vec::new(),
        probability,
        source_lines: source.lines().collect(),
        lines: BTreeMap::new(),
    };
    for function in &program.functions {
        walker.walk_block(&function.body);
    }
    walker.lines.into_values().collect()
}

#[cfg(test)]
mod tests {
    use crate::config::CostModelConfig;
    use crate::cost_model::CostAnalyzer;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_lines_carry_enclosing_sums() {
        let source = "\
bubble(A, n)
begin
  for i 🡨 1 to n do
  begin
    for j 🡨 1 to n do
    begin
      x 🡨 x + 1
    end
  end
end
";
        let program = parse(source).unwrap();
        let costs = CostAnalyzer::new(&CostModelConfig::default())
            .unwrap()
            .analyze(&program, source);

        let numbers: Vec<usize> = costs.per_line.iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![3, 5, 7]);

        let body = &costs.per_line[2];
        assert_eq!(body.code, "x 🡨 x + 1");
        assert_eq!(body.operations, vec!["Assign".to_string()]);
        assert_eq!(
            body.cost.worst.to_string(),
            "Sum(Sum(2, (j, 1, n)), (i, 1, n))"
        );
        assert!(costs.per_line[0].cost.is_zero());
    }

    #[test]
    fn branch_lines_are_weighted() {
        let source = "\
f(n)
begin
  if n > 0 then
  begin
    x 🡨 1
  end
  else
  begin
    y 🡨 2
  end
end
";
        let program = parse(source).unwrap();
        let config = CostModelConfig {
            branch_probability: 0.25,
            ..CostModelConfig::default()
        };
        let costs = CostAnalyzer::new(&config).unwrap().analyze(&program, source);

        let then_line = costs.per_line.iter().find(|l| l.line_number == 5).unwrap();
        assert_eq!(then_line.cost.best.to_string(), "0");
        assert_eq!(then_line.cost.avg.to_string(), "1/4");
        assert_eq!(then_line.cost.worst.to_string(), "1");

        let else_line = costs.per_line.iter().find(|l| l.line_number == 9).unwrap();
        assert_eq!(else_line.cost.avg.to_string(), "3/4");
    }
}
