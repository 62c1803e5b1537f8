//! Arithmetic expression handler.
//!
//! A dedicated recursive-descent evaluator over `+ - * / ( )` and numeric
//! literals. Deliberately not a general expression engine: identifiers are
//! rejected with a name error and there is no attribute access, no function
//! calls, and no way to reach anything beyond arithmetic.
//!
//! Grammar:
//! ```text
//! expr   := term   (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := NUMBER | '-' factor | '(' expr ')'
//! ```

use crate::error::CommandError;
use crate::message::{CommandOutput, Request};

use super::registry::{BoxFuture, CommandHandler, HandlerOutcome};

/// Handler for `compute` requests.
pub struct ComputeHandler;

impl CommandHandler for ComputeHandler {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerOutcome> {
        Box::pin(async move {
            let expression = request.expression.ok_or_else(|| {
                CommandError::ExprSyntax("expression field is required".to_string())
            })?;

            let value = evaluate_expression(&expression)?;
            Ok(CommandOutput::Number(value))
        })
    }
}

/// Evaluate an arithmetic expression.
///
/// # Errors
///
/// - [`CommandError::ExprSyntax`] for malformed input
/// - [`CommandError::ExprName`] when the expression contains an identifier
/// - [`CommandError::ExprEval`] for division by zero
pub fn evaluate_expression(input: &str) -> Result<f64, CommandError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(CommandError::ExprSyntax(format!(
            "unexpected trailing input at position {}",
            parser.pos
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CommandError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal.parse::<f64>().map_err(|_| {
                    CommandError::ExprSyntax(format!("invalid numeric literal '{literal}'"))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                // Names never resolve; the math path is literals only.
                let mut ident = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                return Err(CommandError::ExprName(ident));
            }
            other => {
                return Err(CommandError::ExprSyntax(format!(
                    "unexpected character '{other}' at position {pos}"
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, CommandError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, CommandError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(CommandError::ExprEval("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, CommandError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CommandError::ExprSyntax(
                        "missing closing parenthesis".to_string(),
                    )),
                }
            }
            Some(token) => Err(CommandError::ExprSyntax(format!(
                "unexpected token {token:?}"
            ))),
            None => Err(CommandError::ExprSyntax(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_reference_expression() {
        assert_eq!(evaluate_expression("(6 + 4) * 8").unwrap(), 80.0);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate_expression("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate_expression("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate_expression("20 / 4 - 1").unwrap(), 4.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate_expression("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate_expression("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate_expression("-(1 + 2)").unwrap(), -3.0);
    }

    #[test]
    fn decimal_literals() {
        assert_eq!(evaluate_expression("1.5 * 2").unwrap(), 3.0);
    }

    #[test]
    fn whitespace_insensitive() {
        assert_eq!(
            evaluate_expression("  ( 10+5 )*4 ").unwrap(),
            evaluate_expression("(10 + 5) * 4").unwrap()
        );
    }

    #[test]
    fn identifier_is_a_name_error() {
        let err = evaluate_expression("invalid_expression").unwrap_err();
        assert!(matches!(err, CommandError::ExprName(_)));
        assert!(err
            .to_string()
            .contains("Invalid variable name in expression"));
    }

    #[test]
    fn identifier_inside_arithmetic_is_a_name_error() {
        let err = evaluate_expression("2 + x * 3").unwrap_err();
        assert_eq!(err, CommandError::ExprName("x".to_string()));
    }

    #[test]
    fn division_by_zero_is_eval_error() {
        let err = evaluate_expression("1 / 0").unwrap_err();
        assert!(matches!(err, CommandError::ExprEval(_)));
    }

    #[test]
    fn malformed_input_is_syntax_error() {
        for bad in ["2 +", "(1 + 2", "1 2", "*3", "", "4 $ 2", "1..2"] {
            let err = evaluate_expression(bad).unwrap_err();
            assert!(
                matches!(err, CommandError::ExprSyntax(_)),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn evaluation_is_pure() {
        let first = evaluate_expression("(10 + 5) * 4").unwrap();
        let second = evaluate_expression("(10 + 5) * 4").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 60.0);
    }

    #[tokio::test]
    async fn handler_requires_expression_field() {
        let request = Request {
            command_type: "compute".to_string(),
            command_name: None,
            parameters: Vec::new(),
            expression: None,
        };
        let err = ComputeHandler.call(request).await.unwrap_err();
        assert!(matches!(err, CommandError::ExprSyntax(_)));
    }

    #[tokio::test]
    async fn handler_returns_number_output() {
        let request = Request::compute("(6 + 4) * 8");
        let output = ComputeHandler.call(request).await.unwrap();
        assert_eq!(output.as_number(), Some(80.0));
    }
}
