//! nom grammar for the textual form of cost expressions.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | power
//! power  := atom (('**' | '^') unary)?
//! atom   := number | call | ident | '(' expr ')'
//! ```
//!
//! Calls: `Sum(body, (var, start, end))`, `min`/`Min`, `max`/`Max`,
//! `log`/`lg`/`ln`/`log2`, `sqrt`, `floor`/`ceil` (dropped), `unknown(<text>)`.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map, not, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

use super::expr::SymExpr;
use super::rational::Rational;
use crate::core::{AnalysisError, AnalysisResult};

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

fn number(input: &str) -> IResult<&str, SymExpr> {
    let (rest, text) = recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)?;
    match Rational::parse(text) {
        Some(value) => Ok((rest, SymExpr::Num(value))),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Text up to the matching close parenthesis (not consumed)
fn balanced(input: &str) -> IResult<&str, &str> {
    let mut depth = 0usize;
    for (idx, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Ok((&input[idx..], &input[..idx])),
            ')' => depth -= 1,
            _ => {}
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

fn sum_call(input: &str) -> IResult<&str, SymExpr> {
    let (input, _) = terminated(tag("Sum"), ws(char('(')))(input)?;
    let (input, body) = expr(input)?;
    let (input, _) = ws(char(','))(input)?;
    let (input, (var, _, start, _, end)) = delimited(
        ws(char('(')),
        tuple((ws(identifier), char(','), expr, char(','), expr)),
        ws(char(')')),
    )(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, SymExpr::sum(body, var, start, end)))
}

fn unknown_call(input: &str) -> IResult<&str, SymExpr> {
    map(
        delimited(
            pair(tag("unknown"), ws(char('('))),
            balanced,
            char(')'),
        ),
        |text: &str| SymExpr::unknown(text.trim()),
    )(input)
}

fn function_call(input: &str) -> IResult<&str, SymExpr> {
    let (rest, name) = identifier(input)?;
    let (rest, _) = ws(char('('))(rest)?;
    let (rest, first) = expr(rest)?;
    let (rest, second) = opt(preceded(char(','), expr))(rest)?;
    let (rest, _) = ws(char(')'))(rest)?;

    let result = match (name, second) {
        ("min" | "Min", Some(b)) => first.min(b),
        ("max" | "Max", Some(b)) => first.max(b),
        ("log" | "lg" | "ln" | "log2", None) => first.log(),
        ("sqrt", None) => first.pow(SymExpr::num(Rational::new(1, 2).unwrap_or(Rational::ONE))),
        ("floor" | "ceil", None) => first,
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )))
        }
    };
    Ok((rest, result))
}

fn atom(input: &str) -> IResult<&str, SymExpr> {
    ws(alt((
        number,
        sum_call,
        unknown_call,
        function_call,
        map(identifier, SymExpr::var),
        delimited(char('('), expr, char(')')),
    )))(input)
}

fn power(input: &str) -> IResult<&str, SymExpr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(ws(alt((tag("**"), tag("^")))), unary))(input)?;
    Ok((
        input,
        match exponent {
            Some(exp) => base.pow(exp),
            None => base,
        },
    ))
}

fn unary(input: &str) -> IResult<&str, SymExpr> {
    alt((
        map(preceded(ws(char('-')), unary), SymExpr::neg),
        power,
    ))(input)
}

fn term(input: &str) -> IResult<&str, SymExpr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(
        ws(alt((terminated(char('*'), not(char('*'))), char('/')))),
        unary,
    ))(input)?;
    Ok((
        input,
        rest.into_iter().fold(first, |acc, (op, rhs)| match op {
            '*' => acc.mul(rhs),
            _ => acc.div(rhs),
        }),
    ))
}

fn expr(input: &str) -> IResult<&str, SymExpr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(ws(alt((char('+'), char('-')))), term))(input)?;
    Ok((
        input,
        rest.into_iter().fold(first, |acc, (op, rhs)| match op {
            '+' => acc.add(rhs),
            _ => acc.sub(rhs),
        }),
    ))
}

pub(crate) fn parse_expr(input: &str) -> AnalysisResult<SymExpr> {
    match all_consuming(expr)(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(_) => Err(AnalysisError::UnrecognizedExpression(input.trim().to_string())),
    }
}

/// Splits on `+` outside parentheses
fn top_level_terms(input: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '+' if depth == 0 => {
                terms.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    terms.push(&input[start..]);
    terms
}

pub(crate) fn parse_lenient(input: &str) -> (SymExpr, Vec<String>) {
    if let Ok(parsed) = parse_expr(input) {
        return (parsed, Vec::new());
    }

    let mut unknown = Vec::new();
    let mut result = SymExpr::zero();
    for piece in top_level_terms(input) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match parse_expr(piece) {
            Ok(parsed) => result = result.add(parsed),
            Err(_) => {
                tracing::warn!("cost fragment '{}' kept as an opaque symbol", piece);
                unknown.push(piece.to_string());
                result = result.add(SymExpr::unknown(piece));
            }
        }
    }
    (result, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SymExpr {
        parse_expr(text).unwrap()
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(parse("1 + 2*n").to_string(), "2*n + 1");
        assert_eq!(parse("2*(n + 1)").to_string(), "2*(n + 1)");
        assert_eq!(parse("n**2").to_string(), "n**2");
        assert_eq!(parse("n^2").to_string(), "n**2");
        assert_eq!(parse("2**-1").to_string(), "2**(-1)");
    }

    #[test]
    fn parses_functions() {
        assert_eq!(parse("Sum(1, (i, 1, n))").to_string(), "Sum(1, (i, 1, n))");
        assert_eq!(parse("min(a, b)").to_string(), "Min(a, b)");
        assert_eq!(parse("lg(n)").to_string(), "log(n)");
        assert_eq!(parse("sqrt(n)").to_string(), "n**(1/2)");
        assert_eq!(parse("floor(n/2)").to_string(), "n/2");
        assert_eq!(parse("unknown(foo(x))"), SymExpr::unknown("foo(x)"));
    }

    #[test]
    fn decimals_become_fractions() {
        assert_eq!(parse("0.5*n").to_string(), "1/2*n");
        assert_eq!(parse("A.length").to_string(), "A.length");
    }

    #[test]
    fn strict_parse_rejects_garbage() {
        assert!(matches!(
            parse_expr("n + "),
            Err(AnalysisError::UnrecognizedExpression(_))
        ));
        assert!(parse_expr("foo(n)").is_err());
    }

    #[test]
    fn lenient_parse_keeps_unknown_fragments() {
        let (e, unknown) = parse_lenient("n + foo(n) + 1");
        assert_eq!(unknown, vec!["foo(n)".to_string()]);
        assert!(e.has_unknown());
        assert_eq!(e.to_string(), "n + unknown(foo(n)) + 1");
    }
}
