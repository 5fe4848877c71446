use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;
use std::vec::IntoIter;

use crate::error::{FeError, Result};

/// Abstract syntax tree of a monotone boolean policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolExpr {
    Attr(String),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
}

impl BoolExpr {
    /// Evaluates the policy for the set of attributes held.
    pub fn eval(&self, attribs: &HashSet<&str>) -> bool {
        match self {
            BoolExpr::Attr(a) => attribs.contains(a.as_str()),
            BoolExpr::And(l, r) => l.eval(attribs) && r.eval(attribs),
            BoolExpr::Or(l, r) => l.eval(attribs) || r.eval(attribs),
        }
    }

    /// Attribute labels in left-to-right order, repeats included.
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            BoolExpr::Attr(a) => vec![a.as_str()],
            BoolExpr::And(l, r) | BoolExpr::Or(l, r) => {
                let mut attrs = l.attributes();
                attrs.extend(r.attributes());
                attrs
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::And => write!(f, "AND"),
            Op::Or => write!(f, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Op(Op),
    Atom(String),
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut atom = String::new();

    let flush = |atom: &mut String, tokens: &mut Vec<Token>| {
        if atom.is_empty() {
            return;
        }
        let word = std::mem::take(atom);
        tokens.push(match word.as_str() {
            "AND" => Token::Op(Op::And),
            "OR" => Token::Op(Op::Or),
            _ => Token::Atom(word),
        });
    };

    for c in expr.chars() {
        match c {
            '(' | ')' => {
                flush(&mut atom, &mut tokens);
                tokens.push(if c == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => flush(&mut atom, &mut tokens),
            c => atom.push(c),
        }
    }
    flush(&mut atom, &mut tokens);
    tokens
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

fn parse_err(msg: impl Into<String>) -> FeError {
    FeError::Parse(msg.into())
}

impl Parser {
    // expr := operand (op operand)*, a single operator per level
    fn expr(&mut self) -> Result<BoolExpr> {
        let mut operands = vec![self.operand()?];
        let mut level_op: Option<Op> = None;

        while let Some(Token::Op(op)) = self.tokens.peek().cloned() {
            self.tokens.next();
            match level_op {
                Some(prev) if prev != op => {
                    return Err(parse_err(format!(
                        "{} and {} mixed without parentheses",
                        prev, op
                    )));
                }
                _ => level_op = Some(op),
            }
            operands.push(self.operand()?);
        }

        // a AND b AND c is a AND (b AND c)
        let mut expr = operands.pop().ok_or_else(|| parse_err("empty expression"))?;
        while let Some(left) = operands.pop() {
            expr = match level_op {
                Some(Op::And) => BoolExpr::And(Box::new(left), Box::new(expr)),
                _ => BoolExpr::Or(Box::new(left), Box::new(expr)),
            };
        }
        Ok(expr)
    }

    // operand := ATOM | '(' expr ')'
    fn operand(&mut self) -> Result<BoolExpr> {
        match self.tokens.next() {
            Some(Token::Atom(a)) => Ok(BoolExpr::Attr(a)),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.tokens.next() {
                    Some(Token::Close) => Ok(inner),
                    Some(t) => Err(parse_err(format!("expected ')', found {:?}", t))),
                    None => Err(parse_err("unbalanced parentheses")),
                }
            }
            Some(Token::Close) => Err(parse_err("empty sub-expression")),
            Some(Token::Op(op)) => Err(parse_err(format!("{} is missing its left operand", op))),
            None => Err(parse_err("missing operand")),
        }
    }
}

/// Parses a policy such as `"(1 OR 4) AND (2 OR (0 AND 1))"`.
///
/// Attributes are any words other than the keywords `AND` and `OR`.
/// Chains of a single operator (`a AND b AND c`) need no parentheses,
/// mixing both at the same level does.
pub fn parse(expr: &str) -> Result<BoolExpr> {
    let mut parser = Parser {
        tokens: tokenize(expr).into_iter().peekable(),
    };
    let tree = parser.expr()?;
    match parser.tokens.next() {
        None => Ok(tree),
        Some(t) => Err(parse_err(format!("unexpected trailing {:?}", t))),
    }
}
