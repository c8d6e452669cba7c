//! # Expression Parser — The Whitelisted Call Grammar
//!
//! Turns a schema expression string (`map(str(), int(min=1), key=str())`)
//! into a [`Validator`] tree. The grammar is deliberately tiny:
//!
//! ```text
//! expr    := call | literal | ident
//! call    := IDENT '(' [arg {',' arg} [',']] ')'
//! arg     := IDENT '=' expr | expr
//! literal := STRING | NUMBER | 'True' | 'False' | 'None'
//! ```
//!
//! Nothing else — no attribute access, no subscripting, no arithmetic, no
//! arbitrary names. Schema text is untrusted input, so the language is a
//! whitelist evaluated by a hand-written lexer and recursive-descent
//! parser, never by a host-language expression evaluator. Every call name
//! must resolve in the [`ValidatorRegistry`]; a bare registered identifier
//! is shorthand for calling it with no arguments.
//!
//! Evaluation is bottom-up: nested calls construct nested validators, so a
//! single pass both checks the expression shape and builds the tree.

use yamlet_core::Value;

use crate::error::SyntaxError;
use crate::validator::{Arg, Kwargs, Validator, ValidatorRegistry};

/// Parse a schema expression into a validator using `registry`.
///
/// # Errors
///
/// Returns a [`SyntaxError`] carrying the full expression for any lexical
/// error, grammar violation, unregistered name, or keyword whose value
/// cannot be converted to its declared type.
pub fn parse(expression: &str, registry: &ValidatorRegistry) -> Result<Validator, SyntaxError> {
    parse_inner(expression, registry)
        .map_err(|e| SyntaxError::in_expression(expression, e.message))
}

fn parse_inner(
    expression: &str,
    registry: &ValidatorRegistry,
) -> Result<Validator, SyntaxError> {
    let tokens = lex(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    parser.expect_end()?;

    match eval(&expr, registry)? {
        Arg::Validator(validator) => Ok(validator),
        Arg::Value(_) => Err(SyntaxError::new("expression is not a validator")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    True,
    False,
    None,
    LParen,
    RParen,
    Comma,
    Eq,
}

fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '\'' | '"' => {
                let (token, next) = lex_string(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            '-' | '+' => {
                let (token, next) = lex_number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c.is_ascii_digit() => {
                let (token, next) = lex_number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(match ident.as_str() {
                    "True" => Token::True,
                    "False" => Token::False,
                    "None" => Token::None,
                    _ => Token::Ident(ident),
                });
            }
            other => {
                return Err(SyntaxError::new(format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

fn lex_string(chars: &[char], start: usize) -> Result<(Token, usize), SyntaxError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| SyntaxError::new("unterminated string literal"))?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((Token::Str(value), i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(SyntaxError::new("unterminated string literal"))
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), SyntaxError> {
    let mut i = start;
    let mut text = String::new();
    let mut is_float = false;

    if chars[i] == '-' || chars[i] == '+' {
        text.push(chars[i]);
        i += 1;
    }
    let digits_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        text.push(chars[i]);
        i += 1;
    }
    if i == digits_start {
        return Err(SyntaxError::new(format!("invalid number '{text}'")));
    }
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        text.push('.');
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            text.push(chars[i]);
            i += 1;
        }
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        is_float = true;
        text.push(chars[i]);
        i += 1;
        if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
            text.push(chars[i]);
            i += 1;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            text.push(chars[i]);
            i += 1;
        }
    }

    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| SyntaxError::new(format!("invalid number '{text}'")))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| SyntaxError::new(format!("invalid number '{text}'")))?,
        )
    };
    Ok((token, i))
}

/// Expression tree produced by the grammar, before evaluation.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Call {
        name: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    Ident(String),
    Lit(Value),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, SyntaxError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| SyntaxError::new("unexpected end of expression"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(SyntaxError::new(format!(
                "unexpected trailing token {:?}",
                self.tokens[self.pos]
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        match self.next()? {
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.parse_call(name)
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::Str(s) => Ok(Expr::Lit(Value::Str(s))),
            Token::Int(i) => Ok(Expr::Lit(Value::Int(i))),
            Token::Float(f) => Ok(Expr::Lit(Value::Float(f))),
            Token::True => Ok(Expr::Lit(Value::Bool(true))),
            Token::False => Ok(Expr::Lit(Value::Bool(false))),
            Token::None => Ok(Expr::Lit(Value::Null)),
            other => Err(SyntaxError::new(format!("unexpected token {other:?}"))),
        }
    }

    /// Parse the argument list of `name(`; the opening paren is consumed.
    fn parse_call(&mut self, name: String) -> Result<Expr, SyntaxError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.pos += 1;
                    break;
                }
                None => return Err(SyntaxError::new("expected ')'")),
                _ => {}
            }

            // IDENT '=' starts a keyword argument; anything else is
            // positional.
            if let (Some(Token::Ident(kw)), Some(Token::Eq)) =
                (self.tokens.get(self.pos), self.tokens.get(self.pos + 1))
            {
                let kw = kw.clone();
                self.pos += 2;
                let value = self.parse_expr()?;
                if kwargs.iter().any(|(existing, _)| *existing == kw) {
                    return Err(SyntaxError::new(format!(
                        "keyword argument repeated: '{kw}'"
                    )));
                }
                kwargs.push((kw, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(SyntaxError::new(
                        "positional argument follows keyword argument",
                    ));
                }
                args.push(self.parse_expr()?);
            }

            match self.peek() {
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(Token::RParen) => {}
                _ => return Err(SyntaxError::new("expected ',' or ')'")),
            }
        }

        Ok(Expr::Call { name, args, kwargs })
    }
}

/// Evaluate an expression tree bottom-up, constructing validators through
/// the registry. Unregistered names and disallowed shapes fail here.
fn eval(expr: &Expr, registry: &ValidatorRegistry) -> Result<Arg, SyntaxError> {
    match expr {
        Expr::Lit(value) => Ok(Arg::Value(value.clone())),
        Expr::Ident(name) => {
            // A bare registered name is shorthand for a no-arg call.
            let builder = registry
                .get(name)
                .ok_or_else(|| SyntaxError::new(format!("name '{name}' is not defined")))?;
            builder(Vec::new(), Kwargs::default()).map(Arg::Validator)
        }
        Expr::Call { name, args, kwargs } => {
            let builder = registry
                .get(name)
                .ok_or_else(|| SyntaxError::new(format!("name '{name}' is not defined")))?;

            let mut built_args = Vec::with_capacity(args.len());
            for arg in args {
                built_args.push(eval(arg, registry)?);
            }

            let mut built_kwargs = Kwargs::default();
            for (kw, value) in kwargs {
                built_kwargs.insert(kw.clone(), eval(value, registry)?);
            }

            builder(built_args, built_kwargs).map(Arg::Validator)
        }
    }
}
