// SPDX-License-Identifier: MIT

//! The [`Event`] value type, [`EventFilter`] pattern/predicate matching, and
//! the small boolean expression language a filter's predicate is written in.
//!
//! The predicate language replaces a hosting-language `eval` with a
//! hand-written tokeniser, recursive-descent parser, and tree walker so a
//! user-supplied condition string is never handed to a general interpreter.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An immutable event record dispatched through a workflow's [`crate::graph`]
/// of subscribers. Once emitted, an `Event` is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "sourceNodeId", default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<NodeId>,
    /// Epoch milliseconds, stamped by the emitting [`crate::clock::Clock`].
    pub timestamp: u64,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: Value, timestamp: u64) -> Self {
        Self { event_type: event_type.into(), payload, source_node_id: None, timestamp }
    }

    pub fn with_source(mut self, source_node_id: NodeId) -> Self {
        self.source_node_id = Some(source_node_id);
        self
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}

/// `{event: pattern, condition?: predicate-expression}` (§3, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFilter {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl EventFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { event: pattern.into(), condition: None }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Pattern match, then (if present) predicate evaluation. A predicate
    /// that fails to parse or evaluate is fail-closed: no match (§4.1).
    pub fn matches(&self, event: &Event) -> bool {
        if !pattern_matches(&self.event, &event.event_type) {
            return false;
        }
        match &self.condition {
            None => true,
            Some(expr) => evaluate_predicate(expr, event).unwrap_or(false),
        }
    }
}

/// Pattern matching is total (P4): never raises, always returns a bool.
///
/// `"*"` matches anything; an exact string matches exactly; any other
/// pattern containing `*` is translated to an anchored regex (`.` escaped,
/// `*` → `.*`).
pub fn pattern_matches(pattern: &str, event_type: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == event_type;
    }
    let mut regex_src = String::with_capacity(pattern.len() * 2 + 2);
    regex_src.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => regex_src.push_str(".*"),
            '.' => regex_src.push_str(r"\."),
            other => regex_src.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex_src.push('$');
    match regex::Regex::new(&regex_src) {
        Ok(re) => re.is_match(event_type),
        Err(_) => false,
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to parse predicate `{0}`: {1}")]
    Parse(String, String),
    #[error("unknown identifier `{0}` in predicate")]
    UnknownIdent(String),
}

/// Parses and evaluates `expr` against `event`. Any failure is surfaced as a
/// [`FilterError`]; callers (see [`EventFilter::matches`]) treat that as
/// fail-closed "no match", never as a crash (§4.1, §7 FilterEvaluationError).
pub fn evaluate_predicate(expr: &str, event: &Event) -> Result<bool, FilterError> {
    let tokens = tokenize(expr).map_err(|e| FilterError::Parse(expr.to_string(), e))?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let ast = parser.parse_expr().map_err(|e| FilterError::Parse(expr.to_string(), e))?;
    if parser.pos != parser.tokens.len() {
        return Err(FilterError::Parse(expr.to_string(), "trailing tokens".into()));
    }
    eval_node(&ast, event)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Dot,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut normalized = src.replace("&&", " and ").replace("||", " or ");
    normalized = normalized.replace("===", "==").replace("!==", "!=");
    let chars: Vec<char> = normalized.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Le);
                i += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ge);
                i += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err("unterminated string literal".into());
                }
                tokens.push(Token::Str(chars[start..j].iter().collect()));
                i = j + 1;
            }
            c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text.parse::<f64>().map_err(|_| format!("bad number literal `{text}`"))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" | "True" => Token::True,
                    "false" | "False" => Token::False,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone)]
enum Ast {
    Path(Path),
    Literal(Value),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Not(Box<Ast>),
    Cmp(CmpOp, Box<Ast>, Box<Ast>),
}

#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
enum Path {
    EventField(String),
    Type,
    Source,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn parse_expr(&mut self) -> Result<Ast, String> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Ast, String> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Ast::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Ast, String> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Ast::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Ast, String> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.bump();
            return Ok(Ast::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Ast, String> {
        let lhs = self.parse_operand()?;
        let op = match self.peek() {
            Some(Token::Eq) => Some(CmpOp::Eq),
            Some(Token::Ne) => Some(CmpOp::Ne),
            Some(Token::Lt) => Some(CmpOp::Lt),
            Some(Token::Le) => Some(CmpOp::Le),
            Some(Token::Gt) => Some(CmpOp::Gt),
            Some(Token::Ge) => Some(CmpOp::Ge),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        self.bump();
        let rhs = self.parse_operand()?;
        Ok(Ast::Cmp(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_operand(&mut self) -> Result<Ast, String> {
        match self.bump().cloned() {
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected `)`".into()),
                }
            }
            Some(Token::True) => Ok(Ast::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Ast::Literal(Value::Bool(false))),
            Some(Token::Number(n)) => Ok(Ast::Literal(serde_json::json!(n))),
            Some(Token::Str(s)) => Ok(Ast::Literal(Value::String(s))),
            Some(Token::Ident(ident)) if ident == "type" => Ok(Ast::Path(Path::Type)),
            Some(Token::Ident(ident)) if ident == "source" => Ok(Ast::Path(Path::Source)),
            Some(Token::Ident(ident)) if ident == "event" => {
                match self.bump() {
                    Some(Token::Dot) => {}
                    _ => return Err("expected `.` after `event`".into()),
                }
                match self.bump().cloned() {
                    Some(Token::Ident(field)) => Ok(Ast::Path(Path::EventField(field))),
                    _ => Err("expected field name after `event.`".into()),
                }
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

fn eval_node(ast: &Ast, event: &Event) -> Result<bool, FilterError> {
    Ok(match ast {
        Ast::And(l, r) => eval_node(l, event)? && eval_node(r, event)?,
        Ast::Or(l, r) => eval_node(l, event)? || eval_node(r, event)?,
        Ast::Not(n) => !eval_node(n, event)?,
        Ast::Cmp(op, l, r) => {
            let lv = resolve(l, event)?;
            let rv = resolve(r, event)?;
            compare(*op, &lv, &rv)
        }
        Ast::Path(_) | Ast::Literal(_) => truthy(&resolve(ast, event)?),
    })
}

fn resolve(ast: &Ast, event: &Event) -> Result<Value, FilterError> {
    match ast {
        Ast::Literal(v) => Ok(v.clone()),
        Ast::Path(Path::Type) => Ok(Value::String(event.event_type.clone())),
        Ast::Path(Path::Source) => Ok(event
            .source_node_id
            .as_ref()
            .map(|n| Value::String(n.as_str().to_string()))
            .unwrap_or(Value::Null)),
        Ast::Path(Path::EventField(name)) => Ok(event.field(name).cloned().unwrap_or(Value::Null)),
        _ => Err(FilterError::UnknownIdent("boolean sub-expression used as a value".into())),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Type mismatches resolve to `false` rather than erroring, preserving the
/// fail-closed rule at comparison granularity (§4.1.1).
fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            match op {
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
            }
        }
        (Value::String(a), Value::String(b)) => match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            _ => false,
        },
        (Value::Null, Value::Null) => matches!(op, CmpOp::Eq),
        _ => false,
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
