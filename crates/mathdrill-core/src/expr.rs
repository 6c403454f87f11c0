//! Arithmetic expression evaluator.
//!
//! Evaluates the small formula language used by variable definitions,
//! `{...}` placeholders and Cartesian function traces: numbers, variables,
//! `+ - * / ^`, unary minus, parentheses, implicit multiplication (`2x`,
//! `3(x+1)`) and a handful of functions. Trigonometric functions take
//! degrees. `randint`, `random` and `choice` draw from a caller-supplied RNG.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use thiserror::Error;

/// Variable values in scope while evaluating an expression.
pub type Bindings = BTreeMap<String, f64>;

/// Errors that can occur while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{name}() expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("{0}() needs a random source")]
    NoRandomSource(String),

    #[error("result is not a finite number")]
    NotFinite,
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Bin(Op, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Parse an expression.
    pub fn parse(src: &str) -> Result<Expr, ExprError> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some((offset, tok)) => Err(ExprError::Parse {
                offset: *offset,
                message: format!("unexpected {tok:?}"),
            }),
        }
    }

    /// Evaluate without a random source.
    pub fn eval(&self, vars: &Bindings) -> Result<f64, ExprError> {
        self.evaluate(vars, &mut None)
    }

    /// Evaluate, drawing `randint`/`random`/`choice` from `rng`.
    pub fn eval_random(&self, vars: &Bindings, rng: &mut dyn RngCore) -> Result<f64, ExprError> {
        self.evaluate(vars, &mut Some(rng))
    }

    fn evaluate(&self, vars: &Bindings, rng: &mut Option<&mut dyn RngCore>) -> Result<f64, ExprError> {
        let value = match self {
            Expr::Num(v) => *v,
            Expr::Var(name) => match vars.get(name) {
                Some(v) => *v,
                None if name == "pi" => std::f64::consts::PI,
                None => return Err(ExprError::UnknownVariable(name.clone())),
            },
            Expr::Neg(inner) => -inner.evaluate(vars, rng)?,
            Expr::Bin(op, lhs, rhs) => {
                let a = lhs.evaluate(vars, rng)?;
                let b = rhs.evaluate(vars, rng)?;
                match op {
                    Op::Add => a + b,
                    Op::Sub => a - b,
                    Op::Mul => a * b,
                    Op::Div => a / b,
                    Op::Pow => a.powf(b),
                }
            }
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|a| a.evaluate(vars, rng))
                    .collect::<Result<Vec<_>, _>>()?;
                call(name, &args, rng)?
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NotFinite)
        }
    }
}

/// Parse and evaluate `src` in one step.
pub fn eval(src: &str, vars: &Bindings) -> Result<f64, ExprError> {
    Expr::parse(src)?.eval(vars)
}

/// Format a number the way it appears in generated text: whole numbers
/// without decimals, everything else with at most two decimals.
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 && rounded.abs() < 1e15 {
        // Avoid "-0".
        return format!("{}", rounded as i64);
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn call(name: &str, args: &[f64], rng: &mut Option<&mut dyn RngCore>) -> Result<f64, ExprError> {
    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };
    let one = |f: fn(f64) -> f64| -> Result<f64, ExprError> {
        arity("1", args.len() == 1)?;
        Ok(f(args[0]))
    };

    match name {
        "sqrt" => one(f64::sqrt),
        "abs" => one(f64::abs),
        "round" => one(f64::round),
        "floor" => one(f64::floor),
        "ceil" => one(f64::ceil),
        "sin" => one(|d| d.to_radians().sin()),
        "cos" => one(|d| d.to_radians().cos()),
        "tan" => one(|d| d.to_radians().tan()),
        "min" => {
            arity("at least 1", !args.is_empty())?;
            Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
        }
        "max" => {
            arity("at least 1", !args.is_empty())?;
            Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        }
        "randint" => {
            arity("2", args.len() == 2)?;
            let rng = rng
                .as_mut()
                .ok_or_else(|| ExprError::NoRandomSource(name.to_string()))?;
            let (lo, hi) = (args[0].min(args[1]).ceil(), args[0].max(args[1]).floor());
            if lo > hi {
                return Ok(lo);
            }
            Ok(rng.gen_range(lo as i64..=hi as i64) as f64)
        }
        "random" => {
            arity("2", args.len() == 2)?;
            let rng = rng
                .as_mut()
                .ok_or_else(|| ExprError::NoRandomSource(name.to_string()))?;
            let (lo, hi) = (args[0].min(args[1]), args[0].max(args[1]));
            if !(hi - lo).is_finite() {
                return Err(ExprError::NotFinite);
            }
            let v: f64 = if lo == hi { lo } else { rng.gen_range(lo..hi) };
            Ok((v * 10.0).round() / 10.0)
        }
        "choice" => {
            arity("at least 1", !args.is_empty())?;
            let rng = rng
                .as_mut()
                .ok_or_else(|| ExprError::NoRandomSource(name.to_string()))?;
            Ok(args[rng.gen_range(0..args.len())])
        }
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|(_, c)| c).collect();
                let value = text.parse::<f64>().map_err(|_| ExprError::Parse {
                    offset,
                    message: format!("invalid number `{text}`"),
                })?;
                tokens.push((offset, Token::Num(value)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().map(|(_, c)| c).collect();
                tokens.push((offset, Token::Ident(ident)));
            }
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push((offset, Token::Op(c)));
                i += 1;
            }
            '×' => {
                tokens.push((offset, Token::Op('*')));
                i += 1;
            }
            '(' => {
                tokens.push((offset, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((offset, Token::RParen));
                i += 1;
            }
            ',' => {
                tokens.push((offset, Token::Comma));
                i += 1;
            }
            other => {
                return Err(ExprError::Parse {
                    offset,
                    message: format!("unexpected character `{other}`"),
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        tok
    }

    fn error(&self, message: &str) -> ExprError {
        let offset = self
            .tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|(o, _)| *o)
            .unwrap_or(0);
        ExprError::Parse {
            offset,
            message: message.to_string(),
        }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(c @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            let op = if c == '+' { Op::Add } else { Op::Sub };
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('*')) => Op::Mul,
                Some(Token::Op('/')) => Op::Div,
                // Implicit multiplication: `2x`, `3(x+1)`, `(a)(b)`.
                Some(Token::Ident(_)) | Some(Token::LParen) => {
                    let rhs = self.unary()?;
                    lhs = Expr::Bin(Op::Mul, Box::new(lhs), Box::new(rhs));
                    continue;
                }
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Bin(Op::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::Ident(name)) => {
                // A single letter before `(` is a variable times a group: `a(x-1)`.
                let is_call = name.chars().count() > 1;
                if is_call && self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if let Some(Token::RParen) = self.peek() {
                        self.pos += 1;
                        return Ok(Expr::Call(name, args));
                    }
                    loop {
                        args.push(self.expr()?);
                        match self.next() {
                            Some(Token::Comma) => continue,
                            Some(Token::RParen) => break,
                            _ => {
                                self.pos -= 1;
                                return Err(self.error("expected `,` or `)`"));
                            }
                        }
                    }
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => {
                        self.pos -= 1;
                        Err(self.error("expected `)`"))
                    }
                }
            }
            _ => {
                self.pos -= 1;
                Err(self.error("expected a number, variable or `(`"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn vars(pairs: &[(&str, f64)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn precedence_and_associativity() {
        let empty = Bindings::new();
        assert_eq!(eval("1 + 2 * 3", &empty).unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3", &empty).unwrap(), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2", &empty).unwrap(), 512.0);
        assert_eq!(eval("-3 ^ 2", &empty).unwrap(), -9.0);
        assert_eq!(eval("10 - 4 - 3", &empty).unwrap(), 3.0);
        assert_eq!(eval("8 / 4 / 2", &empty).unwrap(), 1.0);
    }

    #[test]
    fn variables_and_implicit_multiplication() {
        let v = vars(&[("x", 3.0), ("a", 2.0)]);
        assert_eq!(eval("2x + 1", &v).unwrap(), 7.0);
        assert_eq!(eval("a(x - 1)", &v).unwrap(), 4.0);
        assert_eq!(eval("90 - a", &v).unwrap(), 88.0);
        assert_eq!(
            eval("y", &v).unwrap_err(),
            ExprError::UnknownVariable("y".into())
        );
    }

    #[test]
    fn functions_use_degrees() {
        let empty = Bindings::new();
        assert!((eval("sin(30)", &empty).unwrap() - 0.5).abs() < 1e-12);
        assert!((eval("cos(60)", &empty).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(eval("sqrt(9) + abs(-2)", &empty).unwrap(), 5.0);
        assert_eq!(eval("max(1, 7, 3)", &empty).unwrap(), 7.0);
        assert!(matches!(
            eval("sqrt(1, 2)", &empty),
            Err(ExprError::Arity { .. })
        ));
        assert!(matches!(
            eval("foo(1)", &empty),
            Err(ExprError::UnknownFunction(_))
        ));
    }

    #[test]
    fn non_finite_results_are_errors() {
        let empty = Bindings::new();
        assert_eq!(eval("1 / 0", &empty).unwrap_err(), ExprError::NotFinite);
        assert_eq!(eval("sqrt(-1)", &empty).unwrap_err(), ExprError::NotFinite);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(Expr::parse("1 +"), Err(ExprError::Parse { .. })));
        assert!(matches!(Expr::parse("(1 + 2"), Err(ExprError::Parse { .. })));
        assert!(matches!(Expr::parse("2 $ 3"), Err(ExprError::Parse { .. })));
        assert!(matches!(Expr::parse("1 2"), Err(ExprError::Parse { .. })));
    }

    #[test]
    fn random_functions_need_a_source() {
        let expr = Expr::parse("randint(1, 6)").unwrap();
        assert_eq!(
            expr.eval(&Bindings::new()).unwrap_err(),
            ExprError::NoRandomSource("randint".into())
        );
    }

    #[test]
    fn random_functions_are_seeded() {
        let expr = Expr::parse("randint(1, 6)").unwrap();
        let draw = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20)
                .map(|_| expr.eval_random(&Bindings::new(), &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        let first = draw(7);
        assert_eq!(first, draw(7));
        assert!(first.iter().all(|v| (1.0..=6.0).contains(v) && v.fract() == 0.0));

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picked = Expr::parse("choice(2, 4, 8)")
            .unwrap()
            .eval_random(&Bindings::new(), &mut rng)
            .unwrap();
        assert!([2.0, 4.0, 8.0].contains(&picked));
    }

    #[test]
    fn random_over_overflowing_range_is_an_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let expr = Expr::parse("random(-10^308, 10^308)").unwrap();
        assert_eq!(
            expr.eval_random(&Bindings::new(), &mut rng).unwrap_err(),
            ExprError::NotFinite
        );
        let v = Expr::parse("random(1, 2)")
            .unwrap()
            .eval_random(&Bindings::new(), &mut rng)
            .unwrap();
        assert!((1.0..=2.0).contains(&v));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
        assert_eq!(format_number(-2.25), "-2.25");
        assert_eq!(format_number(12.10), "12.1");
    }
}
