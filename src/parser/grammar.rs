/*!
# Operator grammar tables

The expression grammar is driven by a fixed infix table (binding power,
associativity, produced node) built once and kept for the process lifetime.
The statement grammar is keyword-directed and lives in the syntax analyzer.
*/

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::ast::{BinaryOp, CompareOp};
use super::lexer::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    /// Chaining is a syntax error (`a < b < c`)
    None,
}

/// Node produced by an infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixKind {
    Binary(BinaryOp),
    Compare(CompareOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfixRule {
    pub precedence: u8,
    pub assoc: Assoc,
    pub kind: InfixKind,
}

/// Binding powers, loosest first
pub mod precedence {
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const NOT: u8 = 3;
    pub const COMPARE: u8 = 4;
    pub const ADDITIVE: u8 = 5;
    pub const MULTIPLICATIVE: u8 = 6;
    pub const UNARY: u8 = 7;
    pub const POWER: u8 = 8;
}

pub struct Grammar {
    infix: HashMap<TokenType, InfixRule>,
}

static GRAMMAR: Lazy<Grammar> = Lazy::new(Grammar::build);

/// Process-wide grammar instance
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

impl Grammar {
    fn build() -> Self {
        use precedence::*;

        let binary = [
            (TokenType::Or, OR, Assoc::Left, BinaryOp::Or),
            (TokenType::And, AND, Assoc::Left, BinaryOp::And),
            (TokenType::Plus, ADDITIVE, Assoc::Left, BinaryOp::Add),
            (TokenType::Minus, ADDITIVE, Assoc::Left, BinaryOp::Sub),
            (TokenType::Multiply, MULTIPLICATIVE, Assoc::Left, BinaryOp::Mul),
            (TokenType::Divide, MULTIPLICATIVE, Assoc::Left, BinaryOp::Div),
            (TokenType::IntDiv, MULTIPLICATIVE, Assoc::Left, BinaryOp::IntDiv),
            (TokenType::Modulo, MULTIPLICATIVE, Assoc::Left, BinaryOp::Mod),
            (TokenType::Power, POWER, Assoc::Right, BinaryOp::Pow),
        ];
        let compare = [
            (TokenType::Equal, CompareOp::Eq),
            (TokenType::NotEqual, CompareOp::Ne),
            (TokenType::Less, CompareOp::Lt),
            (TokenType::LessEqual, CompareOp::Le),
            (TokenType::Greater, CompareOp::Gt),
            (TokenType::GreaterEqual, CompareOp::Ge),
        ];

        let mut infix = HashMap::new();
        for (token, precedence, assoc, op) in binary {
            infix.insert(
                token,
                InfixRule {
                    precedence,
                    assoc,
                    kind: InfixKind::Binary(op),
                },
            );
        }
        for (token, op) in compare {
            infix.insert(
                token,
                InfixRule {
                    precedence: COMPARE,
                    assoc: Assoc::None,
                    kind: InfixKind::Compare(op),
                },
            );
        }

        tracing::debug!("grammar initialized with {} infix operators", infix.len());
        Self { infix }
    }

    pub fn infix(&self, token: TokenType) -> Option<&InfixRule> {
        self.infix.get(&token)
    }

    /// Tokens that may begin an expression
    pub fn starts_expression(&self, token: TokenType) -> bool {
        matches!(
            token,
            TokenType::Identifier
                | TokenType::NumberLiteral
                | TokenType::StringLiteral
                | TokenType::True
                | TokenType::False
                | TokenType::Null
                | TokenType::LeftParen
                | TokenType::LeftBracket
                | TokenType::LeftCeil
                | TokenType::LeftFloor
                | TokenType::Minus
                | TokenType::Not
                | TokenType::Call
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let g = grammar();
        let plus = g.infix(TokenType::Plus).unwrap();
        let times = g.infix(TokenType::Multiply).unwrap();
        assert!(times.precedence > plus.precedence);
        assert_eq!(g.infix(TokenType::Power).unwrap().assoc, Assoc::Right);
    }

    #[test]
    fn comparisons_do_not_chain() {
        let rule = grammar().infix(TokenType::LessEqual).unwrap();
        assert_eq!(rule.assoc, Assoc::None);
        assert_eq!(rule.kind, InfixKind::Compare(CompareOp::Le));
        assert!(grammar().infix(TokenType::Assign).is_none());
    }
}
