/*!
# Pseudocode Parser

Deterministic single-pass parser for the canonical pseudocode dialect.

## Features

- **Fast lexical analysis** with logos lexer
- **Table-driven expressions** (precedence table loaded once per process)
- **Typed AST** with per-statement line spans
- **No error recovery**: the first violation is reported with its position

## Usage

```rust
use complexity_analyzer::parser::PseudoParser;

let parser = PseudoParser::new();
let program = parser.parse_text("suma(n)\nbegin\n  s 🡨 0\nend\n")?;
assert_eq!(program.functions[0].name, "suma");
# Ok::<(), complexity_analyzer::core::ParseError>(())
```
*/

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod syntax_analyzer;

pub use ast::{
    AstVisitor, BinaryOp, Block, CompareOp, Expr, Function, Literal, Param, Program, Stmt,
    StmtKind, UnaryOp,
};
pub use lexer::{read_source_file, PseudoLexer, Token, TokenType};
pub use syntax_analyzer::SyntaxAnalyzer;

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::ParseError;

/// Main pseudocode parser
#[derive(Debug, Default, Clone)]
pub struct PseudoParser;

impl PseudoParser {
    /// Creates a new parser instance
    pub fn new() -> Self {
        Self
    }

    /// Parses pseudocode from string
    pub fn parse_text(&self, input: &str) -> Result<Program, ParseError> {
        let program = SyntaxAnalyzer::new().parse(input)?;
        tracing::info!(
            "parsed {} procedure(s), {} statement(s)",
            program.functions.len(),
            program.statement_count()
        );
        Ok(program)
    }

    /// Parses a file with encoding detection and BOM handling
    pub fn parse_file<P: AsRef<Path>>(&self, file_path: P) -> Result<Program> {
        let content = read_source_file(file_path.as_ref())
            .with_context(|| format!("Failed to read file: {}", file_path.as_ref().display()))?;

        self.parse_text(&content).context("Syntax analysis failed")
    }
}

/// Parses source text with the process-wide grammar
pub fn parse(text: &str) -> Result<Program, ParseError> {
    PseudoParser::new().parse_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parser_creation() {
        let parser = PseudoParser::new();
        let program = parser.parse_text("f(n)\nbegin\nend").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert!(program.functions[0].body.is_empty());
    }

    #[test]
    fn test_multiple_procedures() {
        let code = r#"
procedure merge(A, p, q, r)
begin
    n1 🡨 q - p + 1
end

procedure mergeSort(A, p, r)
begin
    if p < r then
    begin
        q 🡨 ⌊(p + r) / 2⌋
        CALL mergeSort(A, p, q)
        CALL mergeSort(A, q + 1, r)
        CALL merge(A, p, q, r)
    end
end
"#;
        let program = parse(code).unwrap();
        assert_eq!(program.functions.len(), 2);
        assert!(program.function("mergeSort").is_some());
        assert_eq!(program.statement_count(), 6);
    }

    #[test]
    fn test_parse_file_reports_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "f(n)\nbegin\n  x 🡨\nend").unwrap();
        let err = PseudoParser::new().parse_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Syntax analysis failed"));
    }
}
