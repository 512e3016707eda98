/*!
# Abstract Syntax Tree for structured pseudocode

Typed tree produced once per parse and immutable afterwards. Statements are a
tagged union with explicit `Block` nesting; every statement carries the
1-based source lines it spans so costs can be mapped back to the text.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::LineSpan;

/// Whole parsed input: an ordered list of procedures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        Self { functions }
    }

    /// Finds a function by name (case-sensitive)
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Total number of statements, nested ones included
    pub fn statement_count(&self) -> usize {
        self.functions.iter().map(|f| f.body.statement_count()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    #[serde(flatten)]
    pub lines: LineSpan,
}

impl Function {
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub is_array: bool,
}

impl Param {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: false,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: true,
        }
    }
}

/// Ordered statement sequence. Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statement_count(&self) -> usize {
        self.statements
            .iter()
            .map(|s| 1 + s.blocks().iter().map(|b| b.statement_count()).sum::<usize>())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
    #[serde(flatten)]
    pub lines: LineSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StmtKind {
    Assign {
        target: Expr,
        value: Expr,
    },
    VarDeclaration {
        names: Vec<String>,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    If {
        cond: Expr,
        #[serde(rename = "then")]
        then_block: Block,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        else_block: Option<Block>,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    ExprStmt {
        expr: Expr,
    },
    CallStatement {
        name: String,
        args: Vec<Expr>,
    },
    /// Free-form action line kept verbatim
    ActionStatement {
        text: String,
    },
}

impl Stmt {
    pub fn new(kind: StmtKind, lines: LineSpan) -> Self {
        Self { kind, lines }
    }

    /// Tag used for node identifiers and per-line operation lists
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Assign { .. } => "Assign",
            StmtKind::VarDeclaration { .. } => "VarDeclaration",
            StmtKind::For { .. } => "For",
            StmtKind::While { .. } => "While",
            StmtKind::If { .. } => "If",
            StmtKind::Return { .. } => "Return",
            StmtKind::ExprStmt { .. } => "ExprStmt",
            StmtKind::CallStatement { .. } => "CallStatement",
            StmtKind::ActionStatement { .. } => "ActionStatement",
        }
    }

    /// Expressions owned directly by this statement (not by nested blocks)
    pub fn expressions(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::Assign { target, value } => vec![target, value],
            StmtKind::For { start, end, .. } => vec![start, end],
            StmtKind::While { cond, .. } | StmtKind::If { cond, .. } => vec![cond],
            StmtKind::Return { value } => value.iter().collect(),
            StmtKind::ExprStmt { expr } => vec![expr],
            StmtKind::CallStatement { args, .. } => args.iter().collect(),
            StmtKind::VarDeclaration { .. } | StmtKind::ActionStatement { .. } => Vec::new(),
        }
    }

    /// Nested blocks in source order
    pub fn blocks(&self) -> Vec<&Block> {
        match &self.kind {
            StmtKind::For { body, .. } | StmtKind::While { body, .. } => vec![body],
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                let mut blocks = vec![then_block];
                if let Some(else_block) = else_block {
                    blocks.push(else_block);
                }
                blocks
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Var {
        name: String,
    },
    Literal {
        value: Literal,
    },
    BinOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var { name: name.into() }
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal {
            value: Literal::Int(value),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::UnOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::ArrayAccess {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var { .. } | Expr::Literal { .. } => Vec::new(),
            Expr::BinOp { left, right, .. } | Expr::Compare { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
            Expr::UnOp { operand, .. } => vec![operand.as_ref()],
            Expr::Call { args, .. } => args.iter().collect(),
            Expr::ArrayAccess { array, index } => vec![array.as_ref(), index.as_ref()],
            Expr::ArrayLiteral { elements } => elements.iter().collect(),
        }
    }

    /// Root variable name of a variable, element access or dotted field
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Expr::Var { name } => Some(name.split('.').next().unwrap_or(name)),
            Expr::ArrayAccess { array, .. } => array.base_name(),
            _ => None,
        }
    }

    /// Compact rendering without spaces around operators, e.g. `n-1`, `A[i]`
    pub fn to_compact_string(&self) -> String {
        match self {
            Expr::Var { name } => name.clone(),
            Expr::Literal { value } => value.to_string(),
            Expr::BinOp { op, left, right } if op.is_word() => format!(
                "{} {} {}",
                left.to_compact_string(),
                op,
                right.to_compact_string()
            ),
            Expr::BinOp { op, left, right } => format!(
                "{}{}{}",
                left.to_compact_string(),
                op,
                right.to_compact_string()
            ),
            Expr::Compare { op, left, right } => format!(
                "{}{}{}",
                left.to_compact_string(),
                op,
                right.to_compact_string()
            ),
            Expr::UnOp { op, operand } => match op {
                UnaryOp::Neg => format!("-{}", operand.to_compact_string()),
                UnaryOp::Not => format!("not {}", operand.to_compact_string()),
            },
            Expr::ArrayAccess { array, index } => format!(
                "{}[{}]",
                array.to_compact_string(),
                index.to_compact_string()
            ),
            Expr::Call { name, args } => format!(
                "{}({})",
                name,
                args.iter()
                    .map(|a| a.to_compact_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Expr::ArrayLiteral { .. } => "?".to_string(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var { name } => write!(f, "{}", name),
            Expr::Literal { value } => write!(f, "{}", value),
            Expr::BinOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Compare { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expr::UnOp { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{}", operand),
                UnaryOp::Not => write!(f, "not {}", operand),
            },
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::ArrayAccess { array, index } => write!(f, "{}[{}]", array, index),
            Expr::ArrayLiteral { elements } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Bool(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "div")]
    IntDiv,
    #[serde(rename = "mod")]
    Mod,
    #[serde(rename = "^")]
    Pow,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::IntDiv => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Pow => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    /// Keyword operators need surrounding spaces when rendered
    pub fn is_word(&self) -> bool {
        matches!(
            self,
            BinaryOp::IntDiv | BinaryOp::Mod | BinaryOp::And | BinaryOp::Or
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "not")]
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// AST visitor with default pre-order traversal.
///
/// `visit_expr` receives the start line of the statement owning the expression.
pub trait AstVisitor {
    fn visit_stmt(&mut self, _stmt: &Stmt) {}

    fn visit_expr(&mut self, _expr: &Expr, _line: Option<usize>) {}

    fn walk_program(&mut self, program: &Program) {
        for function in &program.functions {
            self.walk_block(&function.body);
        }
    }

    fn walk_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        self.visit_stmt(stmt);
        let line = stmt.lines.line_start;
        for expr in stmt.expressions() {
            self.walk_expr(expr, line);
        }
        for block in stmt.blocks() {
            self.walk_block(block);
        }
    }

    fn walk_expr(&mut self, expr: &Expr, line: Option<usize>) {
        self.visit_expr(expr, line);
        for child in expr.children() {
            self.walk_expr(child, line);
        }
    }
}
