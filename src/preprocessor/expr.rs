//! Preprocessor expression parsing and evaluation
//!
//! Handles integer/boolean expressions like:
//! - 1+2+4+5*3
//! - (0x10 << 2) | 1
//! - 3 > 2 && !0
//!
//! Identifiers are not resolved here; the macro evaluator substitutes them
//! before the text reaches the parser.

use std::fmt;

use crate::error::{PreprocessorError, Result};

/// Result of evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Integer view; booleans are 0 or 1
    pub fn as_int(self) -> i64 {
        match self {
            Value::Int(value) => value,
            Value::Bool(value) => value as i64,
        }
    }

    /// Truth value; integers are true when non-zero
    pub fn as_bool(self) -> bool {
        match self {
            Value::Int(value) => value != 0,
            Value::Bool(value) => value,
        }
    }

    /// Text form used when the value replaces a name in another expression
    pub fn to_expression_text(self) -> String {
        match self.as_int() {
            value if value < 0 => format!("({})", value),
            value => value.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == *other
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        match self {
            Value::Bool(value) => value == other,
            Value::Int(value) => *value == *other as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

/// Binary operators grouped from loosest to tightest binding
const PRECEDENCE: &[&[(&str, BinaryOp)]] = &[
    &[("||", BinaryOp::Or)],
    &[("&&", BinaryOp::And)],
    &[("|", BinaryOp::BitOr)],
    &[("^", BinaryOp::BitXor)],
    &[("&", BinaryOp::BitAnd)],
    &[("==", BinaryOp::Eq), ("!=", BinaryOp::Ne)],
    &[
        ("<", BinaryOp::Lt),
        (">", BinaryOp::Gt),
        ("<=", BinaryOp::Le),
        (">=", BinaryOp::Ge),
    ],
    &[("<<", BinaryOp::Shl), (">>", BinaryOp::Shr)],
    &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
    &[
        ("*", BinaryOp::Mul),
        ("/", BinaryOp::Div),
        ("%", BinaryOp::Rem),
    ],
];

/// Operators recognised by the tokenizer, longest first
const OPERATORS: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+", "-", "*", "/", "%", "&", "|", "^", "~",
    "!", "<", ">", "(", ")",
];

impl BinaryOp {
    fn apply(self, left: Value, right: Value) -> Result<Value> {
        let (a, b) = (left.as_int(), right.as_int());
        let value = match self {
            BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
            BinaryOp::Div if b == 0 => return Err(PreprocessorError::DivisionByZero),
            BinaryOp::Div => Value::Int(a.wrapping_div(b)),
            BinaryOp::Rem if b == 0 => return Err(PreprocessorError::DivisionByZero),
            BinaryOp::Rem => Value::Int(a.wrapping_rem(b)),
            BinaryOp::Add => Value::Int(a.wrapping_add(b)),
            BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
            BinaryOp::Shl => Value::Int(a << shift_amount(b)?),
            BinaryOp::Shr => Value::Int(a >> shift_amount(b)?),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::Le => Value::Bool(a <= b),
            BinaryOp::Ge => Value::Bool(a >= b),
            BinaryOp::Eq => Value::Bool(a == b),
            BinaryOp::Ne => Value::Bool(a != b),
            BinaryOp::BitAnd => Value::Int(a & b),
            BinaryOp::BitXor => Value::Int(a ^ b),
            BinaryOp::BitOr => Value::Int(a | b),
            BinaryOp::And => Value::Bool(left.as_bool() && right.as_bool()),
            BinaryOp::Or => Value::Bool(left.as_bool() || right.as_bool()),
        };
        Ok(value)
    }
}

fn shift_amount(amount: i64) -> Result<u32> {
    u32::try_from(amount)
        .ok()
        .filter(|amount| *amount < i64::BITS)
        .ok_or_else(|| {
            PreprocessorError::invalid_expression(format!("shift amount {} out of range", amount))
        })
}

/// Preprocessor expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Value),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate the expression; `&&` and `||` short-circuit
    pub fn eval(&self) -> Result<Value> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Unary(op, operand) => {
                let value = operand.eval()?;
                Ok(match op {
                    UnaryOp::Neg => Value::Int(value.as_int().wrapping_neg()),
                    UnaryOp::Plus => Value::Int(value.as_int()),
                    UnaryOp::Not => Value::Bool(!value.as_bool()),
                    UnaryOp::BitNot => Value::Int(!value.as_int()),
                })
            }
            Expr::Binary(BinaryOp::And, left, right) => {
                Ok(Value::Bool(left.eval()?.as_bool() && right.eval()?.as_bool()))
            }
            Expr::Binary(BinaryOp::Or, left, right) => {
                Ok(Value::Bool(left.eval()?.as_bool() || right.eval()?.as_bool()))
            }
            Expr::Binary(op, left, right) => op.apply(left.eval()?, right.eval()?),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(i64),
    Identifier(String),
    Operator(&'static str),
}

/// Parser for preprocessor expressions
pub struct ExprParser {
    tokens: Vec<Token>,
    position: usize,
}

impl ExprParser {
    pub fn new(text: &str) -> Result<Self> {
        Ok(Self {
            tokens: Self::tokenize(text)?,
            position: 0,
        })
    }

    fn tokenize(text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut rest = text;

        while let Some(ch) = rest.chars().next() {
            if ch.is_whitespace() {
                rest = &rest[ch.len_utf8()..];
                continue;
            }

            if is_ident_char(ch) {
                let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
                let (word, tail) = rest.split_at(end);
                rest = tail;
                if ch.is_ascii_digit() {
                    tokens.push(Token::Number(parse_number(word)?));
                } else {
                    tokens.push(Token::Identifier(word.to_string()));
                }
                continue;
            }

            let operator = OPERATORS
                .iter()
                .find(|op| rest.starts_with(**op))
                .ok_or_else(|| {
                    PreprocessorError::invalid_expression(format!("unexpected character '{}'", ch))
                })?;
            tokens.push(Token::Operator(*operator));
            rest = &rest[operator.len()..];
        }

        Ok(tokens)
    }

    /// Parse the whole token stream as one expression
    pub fn parse(&mut self) -> Result<Expr> {
        if self.tokens.is_empty() {
            return Err(PreprocessorError::invalid_expression("empty expression"));
        }

        let expr = self.parse_binary(0)?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(PreprocessorError::invalid_expression(format!(
                "unexpected {}",
                describe(token)
            ))),
        }
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr> {
        let Some(operators) = PRECEDENCE.get(level) else {
            return self.parse_unary();
        };

        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek_binary(operators) {
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn peek_binary(&self, operators: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        match self.peek() {
            Some(Token::Operator(symbol)) => operators
                .iter()
                .find(|(candidate, _)| candidate == symbol)
                .map(|(_, op)| *op),
            _ => None,
        }
    }

    /// Parse unary expression (-, +, !, ~)
    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Operator("-")) => UnaryOp::Neg,
            Some(Token::Operator("+")) => UnaryOp::Plus,
            Some(Token::Operator("!")) => UnaryOp::Not,
            Some(Token::Operator("~")) => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    /// Parse primary expression (number, parenthesized)
    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Literal(Value::Int(value))),
            Some(Token::Operator("(")) => {
                let expr = self.parse_binary(0)?;
                match self.advance() {
                    Some(Token::Operator(")")) => Ok(expr),
                    Some(token) => Err(PreprocessorError::invalid_expression(format!(
                        "expected ')', found {}",
                        describe(&token)
                    ))),
                    None => Err(PreprocessorError::invalid_expression("expected ')'")),
                }
            }
            Some(token) => Err(PreprocessorError::invalid_expression(format!(
                "unexpected {}",
                describe(&token)
            ))),
            None => Err(PreprocessorError::invalid_expression(
                "unexpected end of expression",
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(value) => format!("number {}", value),
        Token::Identifier(name) => format!("identifier '{}'", name),
        Token::Operator(op) => format!("'{}'", op),
    }
}

/// Parse a literal: decimal, `0x` hex, `0o`/leading-`0` octal or `0b` binary
fn parse_number(literal: &str) -> Result<i64> {
    let digits = strip_suffix(literal);
    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits),
    };

    u64::from_str_radix(body, radix)
        .map(|value| value as i64)
        .map_err(|_| {
            PreprocessorError::invalid_expression(format!("invalid numeric literal '{}'", literal))
        })
}

/// Characters of identifiers and numeric literals
pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn strip_suffix(literal: &str) -> &str {
    literal.trim_end_matches(['u', 'U', 'l', 'L'])
}

/// Remove `u`/`U`/`l`/`L` suffixes from numeric literals, keeping prefixes
///
/// Identifiers are left untouched, so `0x10UL + FOO_UL` becomes `0x10 + FOO_UL`.
pub fn strip_literal_suffixes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if !is_ident_char(ch) {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        let (word, tail) = rest.split_at(end);
        out.push_str(if ch.is_ascii_digit() { strip_suffix(word) } else { word });
        rest = tail;
    }

    out
}

/// Parse expression text into an AST
pub fn parse_expression(text: &str) -> Result<Expr> {
    ExprParser::new(text)?.parse()
}

/// Parse and evaluate expression text
pub fn eval_expression(text: &str) -> Result<Value> {
    parse_expression(text)?.eval()
}
