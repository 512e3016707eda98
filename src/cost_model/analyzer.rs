/*!
# Cost Model Analyzer

Recursive descent over the AST producing a [`CostExpr`] per statement.

Counting rules: literals and variables are free, every operator, comparison
and call costs one, an assignment costs one plus its value, `return` costs
one. Loops wrap their body in a summation over a canonical per-depth
variable; conditionals pay the guard and combine their branches.
*/

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::cost_expr::CostExpr;
use super::lines::attribute_lines;
use super::{CostsOut, LineCost};
use crate::config::CostModelConfig;
use crate::core::{AnalysisResult, Confidence, DegradationKind, DegradationLog, LineSpan};
use crate::parser::{
    AstVisitor, BinaryOp, Block, Expr, Function, Literal, Program, Stmt, StmtKind, UnaryOp,
};
use crate::symbolic::{Rational, SymExpr};

/// Canonical loop variables by nesting depth
const CANONICAL_VARS: [&str; 8] = ["i", "j", "k", "l", "p", "q", "r", "s"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    For,
    While,
}

/// Summation range introduced by a loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopInfo {
    /// Canonical summation variable
    pub var: String,
    /// Loop variable as written (absent for while loops)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_var: Option<String>,
    pub start: SymExpr,
    pub end: SymExpr,
    /// Average-case bound when it differs from `end`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_end: Option<SymExpr>,
    pub kind: LoopKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCost {
    pub node_id: String,
    pub node_type: String,
    pub cost: CostExpr,
    /// Cost charged to the node itself, excluding nested blocks
    pub own_cost: CostExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_info: Option<LoopInfo>,
    #[serde(flatten)]
    pub lines: LineSpan,
}

struct LoopFrame {
    source_var: Option<String>,
    canonical: String,
    kind: LoopKind,
}

/// Mutable state of one analysis run
struct Walk {
    nodes: Vec<NodeCost>,
    counters: HashMap<&'static str, usize>,
    notes: DegradationLog,
    frames: Vec<LoopFrame>,
    reserved: BTreeSet<String>,
}

impl Walk {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            counters: HashMap::new(),
            notes: DegradationLog::new(),
            frames: Vec::new(),
            reserved: BTreeSet::new(),
        }
    }

    fn next_id(&mut self, stmt: &Stmt) -> String {
        let type_name = stmt.type_name();
        let counter = self.counters.entry(type_name).or_insert(0);
        *counter += 1;
        format!("{}{}", type_name.to_lowercase(), counter)
    }

    fn canonical_var(&self) -> String {
        let depth = self.frames.len();
        CANONICAL_VARS
            .iter()
            .skip(depth)
            .find(|name| {
                !self.reserved.contains(**name)
                    && !self.frames.iter().any(|f| f.canonical == **name)
            })
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("v{}", depth))
    }

    fn rename(&self, name: &str) -> String {
        self.frames
            .iter()
            .rev()
            .find(|f| f.source_var.as_deref() == Some(name))
            .map(|f| f.canonical.clone())
            .unwrap_or_else(|| name.to_string())
    }

    fn enclosing_for(&self) -> Option<&LoopFrame> {
        self.frames.iter().rev().find(|f| f.kind == LoopKind::For)
    }
}

/// Free names of a function (excluding for-loop variables)
#[derive(Default)]
struct NameCollector {
    names: BTreeSet<String>,
    loop_vars: BTreeSet<String>,
}

impl AstVisitor for NameCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::For { var, .. } = &stmt.kind {
            self.loop_vars.insert(var.clone());
        }
    }

    fn visit_expr(&mut self, expr: &Expr, _line: Option<usize>) {
        if let Expr::Var { name } = expr {
            self.names.insert(name.clone());
        }
    }
}

fn free_names(function: &Function) -> BTreeSet<String> {
    let mut collector = NameCollector::default();
    collector.walk_block(&function.body);
    let mut names: BTreeSet<String> = collector
        .names
        .difference(&collector.loop_vars)
        .cloned()
        .collect();
    names.extend(function.params.iter().map(|p| p.name.clone()));
    names
}

/// Operation count of an expression
pub fn expr_cost(expr: &Expr) -> i64 {
    match expr {
        Expr::Var { .. } | Expr::Literal { .. } => 0,
        Expr::BinOp { left, right, .. } | Expr::Compare { left, right, .. } => {
            1 + expr_cost(left) + expr_cost(right)
        }
        Expr::UnOp { operand, .. } => 1 + expr_cost(operand),
        Expr::Call { args, .. } => 1 + args.iter().map(expr_cost).sum::<i64>(),
        Expr::ArrayAccess { array, index } => expr_cost(array) + expr_cost(index),
        Expr::ArrayLiteral { elements } => elements.iter().map(expr_cost).sum(),
    }
}

pub struct CostAnalyzer {
    config: CostModelConfig,
    probability: Rational,
    while_average: SymExpr,
    while_worst: SymExpr,
}

impl CostAnalyzer {
    pub fn new(config: &CostModelConfig) -> AnalysisResult<Self> {
        let (while_average, while_worst) = config.while_bounds()?;
        Ok(Self {
            config: config.clone(),
            probability: config.probability(),
            while_average,
            while_worst,
        })
    }

    /// Per-node, per-line and total costs of every function in `program`
    pub fn analyze(&self, program: &Program, source: &str) -> CostsOut {
        let mut walk = Walk::new();
        let mut total = CostExpr::zero();

        for function in &program.functions {
            walk.reserved = free_names(function);
            let cost = self.block_cost(&function.body, &mut walk);
            tracing::debug!("function {} costs {}", function.name, cost);
            total = total.add(&cost);
        }

        let per_line: Vec<LineCost> =
            attribute_lines(program, &walk.nodes, source, self.probability);

        let notes = walk.notes.into_notes();
        tracing::info!(
            "cost model: {} node(s), {} line(s), {} note(s)",
            walk.nodes.len(),
            per_line.len(),
            notes.len()
        );

        CostsOut {
            confidence: Confidence::from_notes(&notes),
            per_node: walk.nodes,
            per_line,
            total,
            notes,
        }
    }

    fn block_cost(&self, block: &Block, walk: &mut Walk) -> CostExpr {
        block
            .statements
            .iter()
            .fold(CostExpr::zero(), |acc, stmt| acc.add(&self.stmt_cost(stmt, walk)))
    }

    fn stmt_cost(&self, stmt: &Stmt, walk: &mut Walk) -> CostExpr {
        // reserve the pre-order slot before visiting children
        let slot = walk.nodes.len();
        let node_id = walk.next_id(stmt);
        walk.nodes.push(NodeCost {
            node_id,
            node_type: stmt.type_name().to_string(),
            cost: CostExpr::zero(),
            own_cost: CostExpr::zero(),
            loop_info: None,
            lines: stmt.lines,
        });

        let (cost, own_cost, loop_info) = match &stmt.kind {
            StmtKind::Assign { value, .. } => {
                let own = CostExpr::constant(1 + expr_cost(value));
                (own.clone(), own, None)
            }
            StmtKind::VarDeclaration { .. } | StmtKind::Return { .. } => {
                let own = CostExpr::constant(1);
                (own.clone(), own, None)
            }
            StmtKind::ExprStmt { expr } => {
                let own = CostExpr::constant(expr_cost(expr));
                (own.clone(), own, None)
            }
            StmtKind::CallStatement { args, .. } => {
                let own = CostExpr::constant(1 + args.iter().map(expr_cost).sum::<i64>());
                (own.clone(), own, None)
            }
            StmtKind::ActionStatement { text } => {
                walk.notes.record(
                    DegradationKind::UnhandledNode,
                    format!(
                        "'{}' at line {} charged one operation",
                        text,
                        stmt.lines
                    ),
                );
                let own = CostExpr::constant(1);
                (own.clone(), own, None)
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => self.for_cost(var, start, end, body, walk),
            StmtKind::While { cond, body } => self.while_cost(cond, body, walk),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let guard = SymExpr::int(expr_cost(cond));
                let then_cost = self.block_cost(then_block, walk);
                let else_cost = match else_block {
                    Some(block) => self.block_cost(block, walk),
                    None => CostExpr::zero(),
                };
                let cost = CostExpr::choice(&guard, &then_cost, &else_cost, self.probability);
                (cost, CostExpr::uniform(guard), None)
            }
        };

        if let Some(node) = walk.nodes.get_mut(slot) {
            node.cost = cost.clone();
            node.own_cost = own_cost;
            node.loop_info = loop_info;
        }
        cost
    }

    fn for_cost(
        &self,
        var: &str,
        start: &Expr,
        end: &Expr,
        body: &Block,
        walk: &mut Walk,
    ) -> (CostExpr, CostExpr, Option<LoopInfo>) {
        let start = self.bound(start, walk);
        let end = self.bound(end, walk);
        let canonical = walk.canonical_var();

        walk.frames.push(LoopFrame {
            source_var: Some(var.to_string()),
            canonical: canonical.clone(),
            kind: LoopKind::For,
        });
        let body_cost = self.block_cost(body, walk);
        walk.frames.pop();

        let own = if self.config.count_loop_control {
            // init + (iterations + 1) comparisons + increments
            let span = end.clone().sub(start.clone());
            let comparisons = span.clone().add(SymExpr::int(2));
            let increments = span
                .add(SymExpr::one())
                .scale(Rational::from(self.config.increment_style.operations()));
            CostExpr::uniform(SymExpr::one().add(comparisons).add(increments))
        } else {
            CostExpr::zero()
        };

        let cost = own.add(&body_cost.sum_over(&canonical, &start, &end));
        let info = LoopInfo {
            var: canonical,
            source_var: Some(var.to_string()),
            start,
            end,
            avg_end: None,
            kind: LoopKind::For,
        };
        (cost, own, Some(info))
    }

    fn while_cost(
        &self,
        cond: &Expr,
        body: &Block,
        walk: &mut Walk,
    ) -> (CostExpr, CostExpr, Option<LoopInfo>) {
        let guard = SymExpr::int(expr_cost(cond));
        let (avg_bound, worst_bound) = match walk.enclosing_for() {
            Some(frame) => (
                SymExpr::var(frame.canonical.clone()),
                SymExpr::var(frame.canonical.clone()),
            ),
            None => (self.while_average.clone(), self.while_worst.clone()),
        };
        let canonical = walk.canonical_var();

        walk.frames.push(LoopFrame {
            source_var: None,
            canonical: canonical.clone(),
            kind: LoopKind::While,
        });
        let body_cost = self.block_cost(body, walk);
        walk.frames.pop();

        let iterate = |body: &SymExpr, bound: &SymExpr| {
            SymExpr::sum(
                guard.clone().add(body.clone()),
                canonical.clone(),
                SymExpr::one(),
                bound.clone(),
            )
            .add(guard.clone())
        };
        let cost = CostExpr::new(
            guard.clone(),
            iterate(&body_cost.avg, &avg_bound),
            iterate(&body_cost.worst, &worst_bound),
        );

        let info = LoopInfo {
            var: canonical,
            source_var: None,
            start: SymExpr::one(),
            end: worst_bound.clone(),
            avg_end: (avg_bound != worst_bound).then_some(avg_bound),
            kind: LoopKind::While,
        };
        (cost, CostExpr::uniform(guard), Some(info))
    }

    /// Loop bound as a symbolic expression, loop variables renamed
    fn bound(&self, expr: &Expr, walk: &mut Walk) -> SymExpr {
        let rename = |name: &str| walk.rename(name);
        let converted = to_symbolic(expr, &rename);
        match converted {
            Some(sym) => sym,
            None => {
                let text = expr.to_compact_string();
                walk.notes
                    .record(DegradationKind::UnrecognizedExpression, text.clone());
                SymExpr::unknown(text)
            }
        }
    }
}

/// Converts an arithmetic AST expression; `None` for value-dependent forms
pub fn to_symbolic(expr: &Expr, rename: &dyn Fn(&str) -> String) -> Option<SymExpr> {
    match expr {
        Expr::Var { name } => Some(SymExpr::var(rename(name))),
        Expr::Literal { value } => match value {
            Literal::Int(v) => Some(SymExpr::int(*v)),
            Literal::Float(v) => Rational::from_f64(*v).map(SymExpr::num),
            _ => None,
        },
        Expr::BinOp { op, left, right } => {
            let l = to_symbolic(left, rename)?;
            let r = to_symbolic(right, rename)?;
            match op {
                BinaryOp::Add => Some(l.add(r)),
                BinaryOp::Sub => Some(l.sub(r)),
                BinaryOp::Mul => Some(l.mul(r)),
                BinaryOp::Div | BinaryOp::IntDiv => Some(l.div(r)),
                BinaryOp::Pow => Some(l.pow(r)),
                _ => None,
            }
        }
        Expr::UnOp {
            op: UnaryOp::Neg,
            operand,
        } => to_symbolic(operand, rename).map(SymExpr::neg),
        Expr::Call { name, args } if args.len() == 1 => {
            let arg = &args[0];
            match name.to_lowercase().as_str() {
                "floor" | "ceil" | "round" | "trunc" => to_symbolic(arg, rename),
                "log" | "lg" | "ln" | "log2" => to_symbolic(arg, rename).map(SymExpr::log),
                "sqrt" => to_symbolic(arg, rename).map(|a| {
                    a.pow(SymExpr::num(Rational::new(1, 2).unwrap_or(Rational::ONE)))
                }),
                // the size of the input array is the problem size
                "length" | "len" | "size" | "count" => Some(SymExpr::var("n")),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::symbolic::simplify;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> CostsOut {
        let program = parse(source).unwrap();
        CostAnalyzer::new(&CostModelConfig::default())
            .unwrap()
            .analyze(&program, source)
    }

    #[test]
    fn single_loop_sums_body() {
        let source = "f(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    x 🡨 x + 1\n  end\nend\n";
        let costs = analyze(source);
        assert_eq!(costs.total.worst.to_string(), "Sum(2, (i, 1, n))");
        assert_eq!(costs.per_node[0].node_id, "for1");
        assert_eq!(costs.per_node[1].node_id, "assign1");
        assert_eq!(costs.confidence, Confidence::Exact);
    }

    #[test]
    fn loop_variables_are_canonical_by_depth() {
        let source = "f(n)\nbegin\n  for a 🡨 1 to n do\n  begin\n    for b 🡨 a to n do\n    begin\n      x 🡨 a\n    end\n  end\nend\n";
        let costs = analyze(source);
        assert_eq!(
            costs.total.worst.to_string(),
            "Sum(Sum(1, (j, i, n)), (i, 1, n))"
        );
    }

    #[test]
    fn canonical_names_skip_free_variables() {
        let source = "f(i)\nbegin\n  for a 🡨 1 to i do\n  begin\n    x 🡨 0\n  end\nend\n";
        let costs = analyze(source);
        assert_eq!(costs.total.worst.to_string(), "Sum(1, (j, 1, i))");
    }

    #[test]
    fn while_best_case_is_guard_only() {
        let source = "f(n)\nbegin\n  while x > 0 do\n  begin\n    x 🡨 x - 1\n  end\nend\n";
        let costs = analyze(source);
        assert_eq!(costs.total.best.to_string(), "1");
        assert_eq!(costs.total.worst.to_string(), "Sum(3, (i, 1, n)) + 1");
        assert_eq!(costs.total.avg.to_string(), "Sum(3, (i, 1, n/2)) + 1");
    }

    #[test]
    fn nested_while_uses_enclosing_for_variable() {
        let source = "f(n)\nbegin\n  for j 🡨 2 to n do\n  begin\n    while i > 0 do\n    begin\n      i 🡨 i - 1\n    end\n  end\nend\n";
        let costs = analyze(source);
        let worst = costs.total.worst.to_string();
        assert!(worst.contains("(k, 1, j)"), "{}", worst);
    }

    #[test]
    fn if_combines_branches() {
        let source = "f(n)\nbegin\n  if n > 0 then\n  begin\n    x 🡨 1\n    y 🡨 2\n  end\nend\n";
        let costs = analyze(source);
        assert_eq!(costs.total.best.to_string(), "1");
        assert_eq!(costs.total.avg.to_string(), "2");
        assert_eq!(costs.total.worst.to_string(), "3");
    }

    #[test]
    fn loop_control_counting() {
        let source = "f(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    x 🡨 0\n  end\nend\n";
        let program = parse(source).unwrap();
        let config = CostModelConfig {
            count_loop_control: true,
            ..CostModelConfig::default()
        };
        let costs = CostAnalyzer::new(&config).unwrap().analyze(&program, source);
        let own = simplify(&costs.per_node[0].own_cost.worst);
        assert_eq!(own.poly.to_string(), "2*n + 2");
    }

    #[test]
    fn action_lines_degrade_confidence() {
        let source = "f(n)\nbegin\n  swap A[i] and A[j]\nend\n";
        let costs = analyze(source);
        assert_eq!(costs.total.worst.to_string(), "1");
        assert_eq!(costs.confidence, Confidence::BestEffort);
        assert_eq!(costs.notes[0].kind, DegradationKind::UnhandledNode);
    }
}
