/*!
# Pseudocode Lexical Analyzer

Tokenizer for the canonical pseudocode dialect: lowercase keywords, the
`🡨` assignment glyph, bracket indexing and the usual arithmetic,
comparison and floor/ceiling glyphs. Whitespace, newlines and comments are
consumed here; every emitted token keeps its line/column so the parser can
annotate statements with source lines.
*/

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{ParseError, Position};

/// Reads a pseudocode file with encoding detection and BOM handling.
/// Returns the content as UTF-8 string with BOM removed.
pub fn read_source_file<P: AsRef<std::path::Path>>(path: P) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;

    let bom = (bytes.first().copied(), bytes.get(1).copied());
    let content = match bom {
        // UTF-16LE BOM: FF FE
        (Some(0xFF), Some(0xFE)) => {
            let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(&bytes);
            if had_errors {
                tracing::warn!("Errors detected while decoding UTF-16LE file");
            }
            decoded.into_owned()
        }
        // UTF-16BE BOM: FE FF
        (Some(0xFE), Some(0xFF)) => {
            let (decoded, _, had_errors) = encoding_rs::UTF_16BE.decode(&bytes);
            if had_errors {
                tracing::warn!("Errors detected while decoding UTF-16BE file");
            }
            decoded.into_owned()
        }
        _ => match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(err) => {
                tracing::debug!("UTF-8 decoding failed, trying Windows-1252");
                let (decoded, _, had_errors) =
                    encoding_rs::WINDOWS_1252.decode(err.as_bytes());
                if had_errors {
                    tracing::warn!("Errors detected while decoding Windows-1252 file");
                }
                decoded.into_owned()
            }
        },
    };

    Ok(strip_bom(&content).to_string())
}

/// Removes a leading U+FEFF if present
fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{FEFF}').unwrap_or(input)
}

/// Token types of the pseudocode dialect
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    // Keywords - Structure
    #[token("procedure")]
    #[token("function")]
    Procedure,
    #[token("begin")]
    Begin,
    #[token("end")]
    End,
    #[token("var")]
    Var,
    #[token("CALL")]
    #[token("call")]
    Call,
    #[token("return")]
    Return,

    // Keywords - Control Flow
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,

    // Keywords - Loops
    #[token("for")]
    For,
    #[token("to")]
    To,
    #[token("downto")]
    Downto,
    #[token("do")]
    Do,
    #[token("while")]
    While,
    #[token("repeat")]
    Repeat,
    #[token("until")]
    Until,

    // Keywords - Values
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Keywords - Operators
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("div")]
    IntDiv,
    #[token("mod")]
    #[token("%")]
    Modulo,

    // Arithmetic operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,
    #[token("^")]
    Power,

    // Comparison operators
    #[token("=")]
    #[token("==")]
    Equal,
    #[token("!=")]
    #[token("<>")]
    #[token("≠")]
    NotEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    #[token("≤")]
    LessEqual,
    #[token(">=")]
    #[token("≥")]
    GreaterEqual,

    // Assignment
    #[token("🡨")]
    Assign,

    // Delimiters
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("⌈")]
    LeftCeil,
    #[token("⌉")]
    RightCeil,
    #[token("⌊")]
    LeftFloor,
    #[token("⌋")]
    RightFloor,

    // Punctuation
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,

    // Literals
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,
    #[regex(r"\d+(\.\d+)?")]
    NumberLiteral,

    // Identifiers (lower priority to avoid conflicts with keywords)
    #[regex(r"[A-Za-zÀ-ÖØ-öø-ÿ_][A-Za-zÀ-ÖØ-öø-ÿ0-9_]*", priority = 1)]
    Identifier,

    // Comments
    #[regex(r"//[^\r\n]*")]
    #[regex(r"►[^\r\n]*")]
    LineComment,

    // Whitespace and newlines
    #[regex(r"[ \t\f]+")]
    Whitespace,
    #[regex(r"(\r\n|\r|\n)+")]
    Newline,

    // End of file
    Eof,
}

impl TokenType {
    /// Tokens that never reach the parser
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenType::Whitespace | TokenType::Newline | TokenType::LineComment
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenType::Procedure => "procedure",
            TokenType::Begin => "begin",
            TokenType::End => "end",
            TokenType::Var => "var",
            TokenType::Call => "CALL",
            TokenType::Return => "return",
            TokenType::If => "if",
            TokenType::Then => "then",
            TokenType::Else => "else",
            TokenType::For => "for",
            TokenType::To => "to",
            TokenType::Downto => "downto",
            TokenType::Do => "do",
            TokenType::While => "while",
            TokenType::Repeat => "repeat",
            TokenType::Until => "until",
            TokenType::True => "true",
            TokenType::False => "false",
            TokenType::Null => "null",
            TokenType::And => "and",
            TokenType::Or => "or",
            TokenType::Not => "not",
            TokenType::IntDiv => "div",
            TokenType::Modulo => "mod",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Multiply => "*",
            TokenType::Divide => "/",
            TokenType::Power => "^",
            TokenType::Equal => "=",
            TokenType::NotEqual => "!=",
            TokenType::Less => "<",
            TokenType::Greater => ">",
            TokenType::LessEqual => "<=",
            TokenType::GreaterEqual => ">=",
            TokenType::Assign => "🡨",
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::LeftBracket => "[",
            TokenType::RightBracket => "]",
            TokenType::LeftCeil => "⌈",
            TokenType::RightCeil => "⌉",
            TokenType::LeftFloor => "⌊",
            TokenType::RightFloor => "⌋",
            TokenType::Dot => ".",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Colon => ":",
            TokenType::StringLiteral => "STRING",
            TokenType::NumberLiteral => "NUMBER",
            TokenType::Identifier => "IDENTIFIER",
            TokenType::LineComment => "COMMENT",
            TokenType::Whitespace => "WHITESPACE",
            TokenType::Newline => "NEWLINE",
            TokenType::Eof => "EOF",
        };
        write!(f, "{}", text)
    }
}

/// Token with position information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: Position,
    pub length: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: String, position: Position) -> Self {
        let length = value.len();
        Self {
            token_type,
            value,
            position,
            length,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }
}

/// Pseudocode lexer with position tracking
#[derive(Debug, Default, Clone)]
pub struct PseudoLexer;

impl PseudoLexer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenizes source text. Trivia is dropped; an `Eof` token always terminates the stream.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, ParseError> {
        let cleaned_input = strip_bom(input);

        let mut tokens = Vec::new();
        let mut lexer = TokenType::lexer(cleaned_input);
        let mut line = 1;
        let mut column = 1;
        let mut offset = 0;

        while let Some(result) = lexer.next() {
            let token_text = lexer.slice();
            let position = Position::new(line, column, offset);

            match result {
                Ok(token_type) => {
                    if matches!(token_type, TokenType::Newline) {
                        line += newline_count(token_text);
                        column = 1;
                    } else {
                        column += token_text.chars().count();
                    }
                    offset += token_text.len();

                    if !token_type.is_trivia() {
                        tokens.push(Token::new(token_type, token_text.to_string(), position));
                    }
                }
                Err(_) => {
                    return Err(ParseError::new(
                        format!(
                            "Lexical error at line {}, column {}: unexpected character '{}'",
                            line, column, token_text
                        ),
                        position,
                    )
                    .with_found(token_text));
                }
            }
        }

        tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Position::new(line, column, offset),
        ));

        tracing::debug!("tokenized {} tokens over {} lines", tokens.len(), line);
        Ok(tokens)
    }
}

/// Counts line breaks, treating `\r\n` as one
fn newline_count(text: &str) -> usize {
    text.replace("\r\n", "\n").chars().filter(|c| *c == '\n' || *c == '\r').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn types(input: &str) -> Vec<TokenType> {
        PseudoLexer::new()
            .tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            types("for i 🡨 1 to n do"),
            vec![
                TokenType::For,
                TokenType::Identifier,
                TokenType::Assign,
                TokenType::NumberLiteral,
                TokenType::To,
                TokenType::Identifier,
                TokenType::Do,
                TokenType::Eof,
            ]
        );
        assert_eq!(types("format"), vec![TokenType::Identifier, TokenType::Eof]);
    }

    #[test]
    fn comparison_glyphs_collapse() {
        assert_eq!(
            types("a ≤ b <= c ≠ d <> e"),
            vec![
                TokenType::Identifier,
                TokenType::LessEqual,
                TokenType::Identifier,
                TokenType::LessEqual,
                TokenType::Identifier,
                TokenType::NotEqual,
                TokenType::Identifier,
                TokenType::NotEqual,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lines_and_columns_are_tracked() {
        let tokens = PseudoLexer::new()
            .tokenize("x 🡨 1 // set\r\n  y 🡨 2\n")
            .unwrap();
        let y = tokens.iter().find(|t| t.value == "y").unwrap();
        assert_eq!(y.position.line, 2);
        assert_eq!(y.position.column, 3);
        assert_eq!(tokens.last().unwrap().token_type, TokenType::Eof);
        assert_eq!(tokens.last().unwrap().line(), 3);
    }

    #[test]
    fn unexpected_character_reports_position() {
        let err = PseudoLexer::new().tokenize("x 🡨 1\ny @ 2").unwrap_err();
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 3);
        assert_eq!(err.found.as_deref(), Some("@"));
    }

    #[test]
    fn read_source_file_strips_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("\u{FEFF}f(n)\nbegin\nend\n".as_bytes()).unwrap();
        let content = read_source_file(file.path()).unwrap();
        assert!(content.starts_with("f(n)"));
    }

    #[test]
    fn read_source_file_decodes_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "f(n)".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        assert_eq!(read_source_file(file.path()).unwrap(), "f(n)");
    }
}
