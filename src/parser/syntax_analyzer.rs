/*!
# Pseudocode Syntax Analyzer

Single-pass recursive descent over the token stream. Statements are
keyword-directed; expressions use precedence climbing over the infix table
in [`grammar`](super::grammar). The first grammar violation aborts the parse
with a position-annotated [`ParseError`].
*/

use crate::core::{LineSpan, ParseError};
use crate::parser::ast::{
    Block, Expr, Function, Literal, Param, Program, Stmt, StmtKind, UnaryOp,
};
use crate::parser::grammar::{grammar, precedence, Assoc, InfixKind};
use crate::parser::lexer::{PseudoLexer, Token, TokenType};

type ParseResult<T> = Result<T, ParseError>;

/// Pseudocode syntax analyzer
pub struct SyntaxAnalyzer {
    /// Current token index
    current_index: usize,
    /// Tokens to analyze (always terminated by `Eof`)
    tokens: Vec<Token>,
}

impl SyntaxAnalyzer {
    pub fn new() -> Self {
        Self {
            current_index: 0,
            tokens: Vec::new(),
        }
    }

    /// Parses source text into a [`Program`]
    pub fn parse(&mut self, code: &str) -> ParseResult<Program> {
        self.tokens = PseudoLexer::new().tokenize(code)?;
        self.current_index = 0;
        self.parse_program()
    }

    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut functions = Vec::new();
        self.skip_semicolons();
        while !self.check(TokenType::Eof) {
            functions.push(self.parse_function()?);
            self.skip_semicolons();
        }

        if functions.is_empty() {
            return Err(self
                .error_here("Expected a procedure definition")
                .with_expected("procedure"));
        }
        Ok(Program::new(functions))
    }

    /// `[procedure] name(params) begin ... end`
    fn parse_function(&mut self) -> ParseResult<Function> {
        let start_line = self.peek().line();
        self.match_token(TokenType::Procedure);

        let name = self.expect_identifier("procedure name")?;
        self.expect(TokenType::LeftParen, "'('")?;

        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen, "')'")?;

        let body = self.parse_block()?;
        tracing::debug!("parsed procedure '{}' ({} params)", name, params.len());

        Ok(Function {
            name,
            params,
            body,
            lines: LineSpan::new(start_line, self.previous_line()),
        })
    }

    /// `name` or `name[...]` (dimension text is not interpreted)
    fn parse_param(&mut self) -> ParseResult<Param> {
        let name = self.expect_identifier("parameter name")?;
        let mut is_array = false;

        while self.match_token(TokenType::LeftBracket) {
            is_array = true;
            let mut depth = 1;
            while depth > 0 {
                match self.peek().token_type {
                    TokenType::LeftBracket => depth += 1,
                    TokenType::RightBracket => depth -= 1,
                    TokenType::Eof => {
                        return Err(self
                            .error_here("Unterminated array parameter")
                            .with_expected("']'"))
                    }
                    _ => {}
                }
                self.advance();
            }
        }

        Ok(Param { name, is_array })
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(TokenType::Begin, "'begin'")?;
        let statements = self.parse_statements_until(&[TokenType::End])?;
        self.expect(TokenType::End, "'end'")?;
        Ok(Block::new(statements))
    }

    fn parse_statements_until(&mut self, terminators: &[TokenType]) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            let token_type = self.peek().token_type;
            if terminators.contains(&token_type) {
                break;
            }
            if token_type == TokenType::Eof {
                let expected = terminators
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect::<Vec<_>>()
                    .join(" or ");
                return Err(self
                    .error_here(format!("Unexpected end of input, expected {}", expected))
                    .with_expected(expected));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let start_line = self.peek().line();
        let token_type = self.peek().token_type;

        let kind = match token_type {
            TokenType::For => self.parse_for()?,
            TokenType::While => self.parse_while()?,
            TokenType::Repeat => self.parse_repeat()?,
            TokenType::If => self.parse_if()?,
            TokenType::Return => self.parse_return()?,
            TokenType::Call => self.parse_call_statement()?,
            TokenType::Var => self.parse_var_declaration()?,
            TokenType::Identifier => self.parse_simple_statement()?,
            t if grammar().starts_expression(t) => StmtKind::ExprStmt {
                expr: self.parse_expression()?,
            },
            _ => return Err(self.unexpected("a statement")),
        };

        Ok(Stmt::new(kind, LineSpan::new(start_line, self.previous_line())))
    }

    /// `for v 🡨 a (to|downto) b do begin ... end`
    fn parse_for(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let var = self.expect_identifier("loop variable")?;
        self.expect(TokenType::Assign, "'🡨'")?;
        let first = self.parse_expression()?;

        let descending = if self.match_token(TokenType::Downto) {
            true
        } else {
            self.expect(TokenType::To, "'to'")?;
            false
        };
        let second = self.parse_expression()?;
        self.expect(TokenType::Do, "'do'")?;
        let body = self.parse_block()?;

        // Bounds are stored ascending; the iteration count is the same.
        let (start, end) = if descending {
            (second, first)
        } else {
            (first, second)
        };
        Ok(StmtKind::For {
            var,
            start,
            end,
            body,
        })
    }

    fn parse_while(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let cond = self.parse_expression()?;
        self.expect(TokenType::Do, "'do'")?;
        let body = self.parse_block()?;
        Ok(StmtKind::While { cond, body })
    }

    /// `repeat <stmts | block> until cond`, kept as `While{not cond}`
    fn parse_repeat(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let body = if self.check(TokenType::Begin) {
            self.parse_block()?
        } else {
            Block::new(self.parse_statements_until(&[TokenType::Until])?)
        };
        self.expect(TokenType::Until, "'until'")?;
        let cond = self.parse_expression()?;
        Ok(StmtKind::While {
            cond: Expr::unary(UnaryOp::Not, cond),
            body,
        })
    }

    /// `if c then begin ... end [else (begin ... end | if ...)]`
    fn parse_if(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let cond = self.parse_expression()?;
        self.expect(TokenType::Then, "'then'")?;
        let then_block = self.parse_block()?;

        let else_block = if self.match_token(TokenType::Else) {
            if self.check(TokenType::If) {
                Some(Block::new(vec![self.parse_statement()?]))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    /// The returned expression must start on the same line as `return`.
    fn parse_return(&mut self) -> ParseResult<StmtKind> {
        let keyword_line = self.advance().line();
        let next = self.peek();
        let value = if next.line() == keyword_line && grammar().starts_expression(next.token_type)
        {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(StmtKind::Return { value })
    }

    fn parse_call_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let name = self.expect_identifier("procedure name")?;
        let args = self.parse_arguments()?;
        Ok(StmtKind::CallStatement { name, args })
    }

    fn parse_var_declaration(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let mut names = vec![self.expect_identifier("variable name")?];
        while self.match_token(TokenType::Comma) {
            names.push(self.expect_identifier("variable name")?);
        }
        Ok(StmtKind::VarDeclaration { names })
    }

    /// Assignment, call expression, or an opaque action line
    fn parse_simple_statement(&mut self) -> ParseResult<StmtKind> {
        if self.is_action_line() {
            return Ok(self.parse_action_line());
        }

        let target = self.parse_expression()?;
        if self.match_token(TokenType::Assign) {
            if !matches!(target, Expr::Var { .. } | Expr::ArrayAccess { .. }) {
                return Err(self.error_here(format!("Cannot assign to '{}'", target)));
            }
            let value = self.parse_expression()?;
            return Ok(StmtKind::Assign { target, value });
        }

        match target {
            Expr::Call { .. } => Ok(StmtKind::ExprStmt { expr: target }),
            _ => Err(self.unexpected("'🡨'")),
        }
    }

    /// An identifier directly followed by another word on the same line
    fn is_action_line(&self) -> bool {
        let first = self.peek();
        let second = self.peek_at(1);
        second.line() == first.line()
            && matches!(
                second.token_type,
                TokenType::Identifier | TokenType::NumberLiteral | TokenType::StringLiteral
            )
    }

    fn parse_action_line(&mut self) -> StmtKind {
        let line = self.peek().line();
        let mut words = Vec::new();
        while self.peek().line() == line && !self.check(TokenType::Eof) {
            words.push(self.advance().value);
        }
        StmtKind::ActionStatement {
            text: words.join(" "),
        }
    }

    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_binary(precedence::OR)
    }

    /// Precedence climbing over the infix table
    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(rule) = grammar().infix(self.peek().token_type).copied() {
            if rule.precedence < min_precedence {
                break;
            }
            self.advance();

            let next_min = match rule.assoc {
                Assoc::Right => rule.precedence,
                Assoc::Left | Assoc::None => rule.precedence + 1,
            };
            let right = self.parse_binary(next_min)?;

            left = match rule.kind {
                InfixKind::Binary(op) => Expr::binary(op, left, right),
                InfixKind::Compare(op) => Expr::compare(op, left, right),
            };

            if rule.assoc == Assoc::None {
                if let Some(next) = grammar().infix(self.peek().token_type) {
                    if next.precedence == rule.precedence {
                        return Err(self.error_here("Comparison operators cannot be chained"));
                    }
                }
            }
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.peek().token_type {
            TokenType::Minus => {
                self.advance();
                let operand = self.parse_binary(precedence::UNARY)?;
                Ok(match operand {
                    Expr::Literal {
                        value: Literal::Int(v),
                    } => Expr::int(-v),
                    Expr::Literal {
                        value: Literal::Float(v),
                    } => Expr::Literal {
                        value: Literal::Float(-v),
                    },
                    other => Expr::unary(UnaryOp::Neg, other),
                })
            }
            TokenType::Not => {
                self.advance();
                let operand = self.parse_binary(precedence::COMPARE)?;
                Ok(Expr::unary(UnaryOp::Not, operand))
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match token.token_type {
            TokenType::NumberLiteral => {
                self.advance();
                parse_number(&token.value).ok_or_else(|| {
                    ParseError::new(format!("Invalid number '{}'", token.value), token.position)
                        .with_found(token.value.clone())
                })
            }
            TokenType::StringLiteral => {
                self.advance();
                let inner = token.value.trim_matches('"').to_string();
                Ok(Expr::Literal {
                    value: Literal::Str(inner),
                })
            }
            TokenType::True | TokenType::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(token.token_type == TokenType::True),
                })
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Null,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RightParen, "')'")?;
                Ok(inner)
            }
            TokenType::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenType::RightBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenType::RightBracket, "']'")?;
                Ok(Expr::ArrayLiteral { elements })
            }
            TokenType::LeftCeil => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RightCeil, "'⌉'")?;
                Ok(Expr::call("ceil", vec![inner]))
            }
            TokenType::LeftFloor => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RightFloor, "'⌋'")?;
                Ok(Expr::call("floor", vec![inner]))
            }
            TokenType::Call => {
                self.advance();
                let name = self.expect_identifier("procedure name")?;
                let args = self.parse_arguments()?;
                Ok(Expr::Call { name, args })
            }
            TokenType::Identifier => {
                self.advance();
                if self.check(TokenType::LeftParen) {
                    let args = self.parse_arguments()?;
                    return Ok(Expr::Call {
                        name: token.value,
                        args,
                    });
                }
                let mut name = token.value;
                while self.check(TokenType::Dot) && self.peek_at(1).token_type == TokenType::Identifier
                {
                    self.advance();
                    name.push('.');
                    name.push_str(&self.advance().value);
                }
                Ok(Expr::Var { name })
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `expr[i]`, `expr[i][j]`, `expr[i, j]`
    fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        while self.match_token(TokenType::LeftBracket) {
            loop {
                let index = self.parse_expression()?;
                expr = Expr::index(expr, index);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
            self.expect(TokenType::RightBracket, "']'")?;
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenType::LeftParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen, "')'")?;
        Ok(args)
    }

    // Token helpers

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, distance: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.current_index + distance).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.token_type != TokenType::Eof {
            self.current_index += 1;
        }
        token
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType, what: &str) -> ParseResult<Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        if self.check(TokenType::Identifier) {
            Ok(self.advance().value)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn skip_semicolons(&mut self) {
        while self.match_token(TokenType::Semicolon) {}
    }

    fn previous_line(&self) -> usize {
        self.current_index
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.line())
            .unwrap_or(1)
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::new(message, token.position).with_found(describe(token))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::new(
            format!("Unexpected {}, expected {}", describe(token), expected),
            token.position,
        )
        .with_expected(expected)
        .with_found(describe(token))
    }
}

impl Default for SyntaxAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".to_string(),
        _ => format!("'{}'", token.value),
    }
}

fn parse_number(text: &str) -> Option<Expr> {
    if text.contains('.') {
        text.parse::<f64>().ok().map(|v| Expr::Literal {
            value: Literal::Float(v),
        })
    } else {
        text.parse::<i64>().ok().map(Expr::int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{BinaryOp, CompareOp};
    use pretty_assertions::assert_eq;

    fn parse(code: &str) -> Program {
        SyntaxAnalyzer::new().parse(code).unwrap()
    }

    fn first_stmt(code: &str) -> Stmt {
        parse(code).functions[0].body.statements[0].clone()
    }

    #[test]
    fn parses_procedure_header_and_params() {
        let program = parse("procedure busqueda(A[], n, x)\nbegin\nend");
        let f = &program.functions[0];
        assert_eq!(f.name, "busqueda");
        assert_eq!(
            f.params,
            vec![Param::array("A"), Param::scalar("n"), Param::scalar("x")]
        );
        assert_eq!(f.lines, LineSpan::new(1, 3));
    }

    #[test]
    fn for_loop_records_lines() {
        let code = "f(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    x 🡨 x + 1\n  end\nend";
        let stmt = first_stmt(code);
        assert_eq!(stmt.lines, LineSpan::new(3, 6));
        match stmt.kind {
            StmtKind::For {
                var, start, end, body,
            } => {
                assert_eq!(var, "i");
                assert_eq!(start, Expr::int(1));
                assert_eq!(end, Expr::var("n"));
                assert_eq!(body.statements[0].lines, LineSpan::new(5, 5));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn downto_stores_ascending_bounds() {
        let stmt = first_stmt("f(n)\nbegin\nfor i 🡨 n downto 1 do\nbegin\nend\nend");
        match stmt.kind {
            StmtKind::For { start, end, .. } => {
                assert_eq!(start, Expr::int(1));
                assert_eq!(end, Expr::var("n"));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn precedence_and_associativity() {
        let stmt = first_stmt("f(n)\nbegin\nx 🡨 a + b * c ^ 2 ^ 3\nend");
        let StmtKind::Assign { value, .. } = stmt.kind else {
            panic!("expected Assign");
        };
        let expected = Expr::binary(
            BinaryOp::Add,
            Expr::var("a"),
            Expr::binary(
                BinaryOp::Mul,
                Expr::var("b"),
                Expr::binary(
                    BinaryOp::Pow,
                    Expr::var("c"),
                    Expr::binary(BinaryOp::Pow, Expr::int(2), Expr::int(3)),
                ),
            ),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn logical_operators_wrap_comparisons() {
        let stmt = first_stmt(
            "f(n)\nbegin\nwhile i ≤ n and not encontrado do\nbegin\ni 🡨 i + 1\nend\nend",
        );
        let StmtKind::While { cond, .. } = stmt.kind else {
            panic!("expected While");
        };
        let expected = Expr::binary(
            BinaryOp::And,
            Expr::compare(CompareOp::Le, Expr::var("i"), Expr::var("n")),
            Expr::unary(UnaryOp::Not, Expr::var("encontrado")),
        );
        assert_eq!(cond, expected);
    }

    #[test]
    fn repeat_until_becomes_negated_while() {
        let stmt = first_stmt("f(n)\nbegin\nrepeat\n  i 🡨 i + 1\nuntil i > n\nend");
        let StmtKind::While { cond, body } = stmt.kind else {
            panic!("expected While");
        };
        assert!(matches!(cond, Expr::UnOp { op: UnaryOp::Not, .. }));
        assert_eq!(body.statements.len(), 1);
    }

    #[test]
    fn else_if_chains_nest() {
        let code = "f(x)\nbegin\nif x = 1 then\nbegin\nreturn 1\nend\nelse if x = 2 then\nbegin\nreturn 2\nend\nelse\nbegin\nreturn 3\nend\nend";
        let StmtKind::If { else_block, .. } = first_stmt(code).kind else {
            panic!("expected If");
        };
        let else_block = else_block.unwrap();
        assert_eq!(else_block.statements.len(), 1);
        assert!(matches!(else_block.statements[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn return_value_must_be_on_same_line() {
        let program = parse("f(n)\nbegin\nreturn\nx 🡨 1\nreturn n - 1\nend");
        let stmts = &program.functions[0].body.statements;
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].kind, StmtKind::Return { value: None });
        assert!(matches!(
            stmts[2].kind,
            StmtKind::Return { value: Some(Expr::BinOp { .. }) }
        ));
    }

    #[test]
    fn calls_indexing_and_fields() {
        let code = "f(A, n)\nbegin\nCALL ordenar(A, 1, n)\nx 🡨 A[i][j] + A.length\ny 🡨 ⌊n / 2⌋\nmezclar(A, p)\nend";
        let stmts = parse(code).functions[0].body.statements.clone();
        assert!(matches!(stmts[0].kind, StmtKind::CallStatement { ref name, ref args } if name == "ordenar" && args.len() == 3));

        let StmtKind::Assign { value, .. } = &stmts[1].kind else {
            panic!("expected Assign");
        };
        assert_eq!(value.to_compact_string(), "A[i][j]+A.length");

        let StmtKind::Assign { value, .. } = &stmts[2].kind else {
            panic!("expected Assign");
        };
        assert!(matches!(value, Expr::Call { name, .. } if name == "floor"));
        assert!(matches!(stmts[3].kind, StmtKind::ExprStmt { .. }));
    }

    #[test]
    fn action_line_is_opaque() {
        let stmts = parse("f(A)\nbegin\nintercambiar A[i] con A[j]\nx 🡨 1\nend")
            .functions[0]
            .body
            .statements
            .clone();
        assert_eq!(stmts.len(), 2);
        match &stmts[0].kind {
            StmtKind::ActionStatement { text } => assert!(text.starts_with("intercambiar A")),
            other => panic!("expected ActionStatement, got {:?}", other),
        }
    }

    #[test]
    fn missing_end_is_reported_with_position() {
        let err = SyntaxAnalyzer::new()
            .parse("f(n)\nbegin\nx 🡨 1\n")
            .unwrap_err();
        assert!(err.message.contains("end of input"));
        assert_eq!(err.position.line, 4);
    }

    #[test]
    fn wrong_assignment_glyph_is_rejected() {
        let err = SyntaxAnalyzer::new()
            .parse("f(n)\nbegin\nx := 1\nend")
            .unwrap_err();
        assert_eq!(err.position.line, 3);
    }

    #[test]
    fn chained_comparison_is_rejected() {
        assert!(SyntaxAnalyzer::new()
            .parse("f(n)\nbegin\nx 🡨 a < b < c\nend")
            .is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = SyntaxAnalyzer::new().parse("  \n// nothing\n").unwrap_err();
        assert_eq!(err.expected, vec!["procedure".to_string()]);
    }
}
