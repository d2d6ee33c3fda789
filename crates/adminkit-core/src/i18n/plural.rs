//! Evaluation of gettext `Plural-Forms` expressions.
//!
//! Catalog headers carry a C-like expression over `n`, for example
//! `plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);`.
//! [`PluralRule::parse`] compiles it once, [`PluralRule::index`] picks the
//! translation slot for a count.

use std::fmt;

/// A compiled plural-forms expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralRule {
    expr: Expr,
}

impl Default for PluralRule {
    /// The Germanic rule `n != 1`.
    fn default() -> Self {
        Self {
            expr: Expr::Binary(BinOp::Ne, Box::new(Expr::N), Box::new(Expr::Num(1))),
        }
    }
}

impl PluralRule {
    /// Parses the right-hand side of `plural=`.
    pub fn parse(source: &str) -> Result<Self, PluralParseError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.ternary()?;
        if parser.pos != parser.tokens.len() {
            return Err(PluralParseError(format!(
                "unexpected trailing input in '{source}'"
            )));
        }
        Ok(Self { expr })
    }

    /// Returns the plural slot for `n`.
    pub fn index(&self, n: u64) -> usize {
        usize::try_from(self.expr.eval(n)).unwrap_or(0)
    }
}

/// A malformed plural-forms expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralParseError(String);

impl fmt::Display for PluralParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plural expression: {}", self.0)
    }
}

impl std::error::Error for PluralParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    N,
    Num(u64),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, n: u64) -> u64 {
        match self {
            Self::N => n,
            Self::Num(v) => *v,
            Self::Not(inner) => u64::from(inner.eval(n) == 0),
            Self::Ternary(cond, then, otherwise) => {
                if cond.eval(n) == 0 {
                    otherwise.eval(n)
                } else {
                    then.eval(n)
                }
            }
            Self::Binary(op, lhs, rhs) => {
                let a = lhs.eval(n);
                // Short-circuit before evaluating the right side.
                match op {
                    BinOp::Or if a != 0 => return 1,
                    BinOp::And if a == 0 => return 0,
                    _ => {}
                }
                let b = rhs.eval(n);
                match op {
                    BinOp::Or | BinOp::And => u64::from(b != 0),
                    BinOp::Eq => u64::from(a == b),
                    BinOp::Ne => u64::from(a != b),
                    BinOp::Lt => u64::from(a < b),
                    BinOp::Le => u64::from(a <= b),
                    BinOp::Gt => u64::from(a > b),
                    BinOp::Ge => u64::from(a >= b),
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::Div => a.checked_div(b).unwrap_or(0),
                    BinOp::Rem => a.checked_rem(b).unwrap_or(0),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(&'static str),
    LParen,
    RParen,
    Question,
    Colon,
}

fn tokenize(source: &str) -> Result<Vec<Token>, PluralParseError> {
    const OPERATORS: [&str; 14] = [
        "||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!",
    ];

    let mut tokens = Vec::new();
    let mut rest = source.trim().trim_end_matches(';');

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if c == 'n' {
            tokens.push(Token::N);
            rest = &rest[1..];
            continue;
        }
        if c.is_ascii_digit() {
            let end = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            let value = rest[..end]
                .parse()
                .map_err(|e| PluralParseError(format!("bad number: {e}")))?;
            tokens.push(Token::Num(value));
            rest = &rest[end..];
            continue;
        }
        let simple = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            _ => None,
        };
        if let Some(token) = simple {
            tokens.push(token);
            rest = &rest[1..];
            continue;
        }
        let op = OPERATORS
            .iter()
            .find(|op| rest.starts_with(*op))
            .ok_or_else(|| PluralParseError(format!("unexpected character '{c}'")))?;
        tokens.push(Token::Op(op));
        rest = &rest[op.len()..];
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

    fn eat_op(&mut self, ops: &[&str]) -> Option<&'static str> {
        if let Some(Token::Op(op)) = self.peek() {
            if ops.contains(op) {
                let op = *op;
                self.pos += 1;
                return Some(op);
            }
        }
        None
    }

    fn expect(&mut self, token: &Token) -> Result<(), PluralParseError> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(PluralParseError(format!(
                "expected {token:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn ternary(&mut self) -> Result<Expr, PluralParseError> {
        let cond = self.binary(0)?;
        if self.peek() == Some(&Token::Question) {
            self.pos += 1;
            let then = self.ternary()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.ternary()?;
            return Ok(Expr::Ternary(
                Box::new(cond),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        Ok(cond)
    }

    /// Precedence climbing over the binary operator levels, loosest first.
    fn binary(&mut self, level: usize) -> Result<Expr, PluralParseError> {
        const LEVELS: [&[&str]; 6] = [
            &["||"],
            &["&&"],
            &["==", "!="],
            &["<", "<=", ">", ">="],
            &["+", "-"],
            &["*", "/", "%"],
        ];

        if level == LEVELS.len() {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self.eat_op(LEVELS[level]) {
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary(bin_op(op), Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, PluralParseError> {
        if self.eat_op(&["!"]).is_some() {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        match self.tokens.get(self.pos).cloned() {
            Some(Token::N) => {
                self.pos += 1;
                Ok(Expr::N)
            }
            Some(Token::Num(v)) => {
                self.pos += 1;
                Ok(Expr::Num(v))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.ternary()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(PluralParseError(format!("unexpected token {other:?}"))),
        }
    }
}

fn bin_op(op: &str) -> BinOp {
    match op {
        "||" => BinOp::Or,
        "&&" => BinOp::And,
        "==" => BinOp::Eq,
        "!=" => BinOp::Ne,
        "<" => BinOp::Lt,
        "<=" => BinOp::Le,
        ">" => BinOp::Gt,
        ">=" => BinOp::Ge,
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        _ => BinOp::Rem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UKRAINIAN: &str = "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)";

    #[test]
    fn test_default_rule() {
        let rule = PluralRule::default();
        assert_eq!(rule.index(1), 0);
        assert_eq!(rule.index(0), 1);
        assert_eq!(rule.index(5), 1);
    }

    #[test]
    fn test_ukrainian_rule() {
        let rule = PluralRule::parse(UKRAINIAN).unwrap();
        assert_eq!(rule.index(1), 0);
        assert_eq!(rule.index(21), 0);
        assert_eq!(rule.index(11), 2);
        assert_eq!(rule.index(2), 1);
        assert_eq!(rule.index(24), 1);
        assert_eq!(rule.index(12), 2);
        assert_eq!(rule.index(5), 2);
        assert_eq!(rule.index(0), 2);
    }

    #[test]
    fn test_single_form_rule() {
        let rule = PluralRule::parse("0").unwrap();
        assert_eq!(rule.index(1), 0);
        assert_eq!(rule.index(42), 0);
    }

    #[test]
    fn test_negation_and_trailing_semicolon() {
        let rule = PluralRule::parse("!(n == 1);").unwrap();
        assert_eq!(rule.index(1), 0);
        assert_eq!(rule.index(3), 1);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let rule = PluralRule::parse("n / 0").unwrap();
        assert_eq!(rule.index(7), 0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(PluralRule::parse("n ==").is_err());
        assert!(PluralRule::parse("(n != 1").is_err());
        assert!(PluralRule::parse("n $ 2").is_err());
        assert!(PluralRule::parse("n 1").is_err());
    }
}
