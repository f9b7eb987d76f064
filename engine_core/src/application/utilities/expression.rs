//! A small, sandboxed expression language for `transform` and `query` nodes
//! (§9 design note: "fixed grammar ... arithmetic + comparison + field
//! reference + string functions"). No I/O, no name lookup outside the
//! current record, no reflection: everything an expression can see is
//! either a literal or a field of the record it is evaluated against.
//!
//! Grammar (lowest to highest precedence):
//! ```text
//! expr    := or
//! or      := and ("||" and)*
//! and     := cmp ("&&" cmp)*
//! cmp     := add (("==" | "!=" | ">" | "<" | ">=" | "<=") add)?
//! add     := mul (("+" | "-") mul)*
//! mul     := unary (("*" | "/") unary)*
//! unary   := "!" unary | "-" unary | call
//! call    := IDENT "(" (expr ("," expr)*)? ")" | primary
//! primary := NUMBER | STRING | "true" | "false" | "null" | IDENT | "(" expr ")"
//! ```

use pipeline_flow_domain::{PipelineError, Record};
use serde_json::Value as Json;

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    Field(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy)]
enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    And,
    Or,
}

/// A parsed expression, ready to be evaluated per record without re-parsing.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    ast: Expr,
}

impl CompiledExpression {
    pub fn compile(source: &str) -> Result<Self, PipelineError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.parse_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(PipelineError::expression_error(format!("unexpected trailing tokens in {source:?}")));
        }
        Ok(Self { source: source.to_string(), ast })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, record: &Record) -> Result<Json, PipelineError> {
        eval_node(&self.ast, record)
    }

    /// Evaluates the expression as a row predicate (`query`'s usage).
    pub fn eval_bool(&self, record: &Record) -> Result<bool, PipelineError> {
        match self.eval(record)? {
            Json::Bool(b) => Ok(b),
            other => Err(PipelineError::expression_error(format!("expression {:?} did not evaluate to a boolean, got {other:?}", self.source))),
        }
    }
}

fn eval_node(expr: &Expr, record: &Record) -> Result<Json, PipelineError> {
    match expr {
        Expr::Number(n) => Ok(json_num(*n)),
        Expr::String(s) => Ok(Json::String(s.clone())),
        Expr::Bool(b) => Ok(Json::Bool(*b)),
        Expr::Null => Ok(Json::Null),
        Expr::Field(name) => Ok(record.get(name).cloned().unwrap_or(Json::Null)),
        Expr::Unary(op, inner) => {
            let value = eval_node(inner, record)?;
            match op {
                UnaryOp::Not => Ok(Json::Bool(!truthy(&value))),
                UnaryOp::Neg => Ok(json_num(-as_number(&value)?)),
            }
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, record),
        Expr::Call(name, args) => {
            let values: Result<Vec<Json>, PipelineError> = args.iter().map(|a| eval_node(a, record)).collect();
            eval_call(name, values?)
        }
    }
}

fn eval_binary(op: BinOp, lhs: &Expr, rhs: &Expr, record: &Record) -> Result<Json, PipelineError> {
    match op {
        BinOp::And => {
            let l = eval_node(lhs, record)?;
            if !truthy(&l) {
                return Ok(Json::Bool(false));
            }
            Ok(Json::Bool(truthy(&eval_node(rhs, record)?)))
        }
        BinOp::Or => {
            let l = eval_node(lhs, record)?;
            if truthy(&l) {
                return Ok(Json::Bool(true));
            }
            Ok(Json::Bool(truthy(&eval_node(rhs, record)?)))
        }
        _ => {
            let l = eval_node(lhs, record)?;
            let r = eval_node(rhs, record)?;
            match op {
                BinOp::Add => match (&l, &r) {
                    (Json::String(a), _) => Ok(Json::String(format!("{a}{}", json_display(&r)))),
                    (_, Json::String(b)) => Ok(Json::String(format!("{}{b}", json_display(&l)))),
                    _ => Ok(json_num(as_number(&l)? + as_number(&r)?)),
                },
                BinOp::Sub => Ok(json_num(as_number(&l)? - as_number(&r)?)),
                BinOp::Mul => Ok(json_num(as_number(&l)? * as_number(&r)?)),
                BinOp::Div => Ok(json_num(as_number(&l)? / as_number(&r)?)),
                BinOp::Eq => Ok(Json::Bool(l == r)),
                BinOp::Ne => Ok(Json::Bool(l != r)),
                BinOp::Gt => Ok(Json::Bool(compare(&l, &r)? == std::cmp::Ordering::Greater)),
                BinOp::Lt => Ok(Json::Bool(compare(&l, &r)? == std::cmp::Ordering::Less)),
                BinOp::Ge => Ok(Json::Bool(compare(&l, &r)? != std::cmp::Ordering::Less)),
                BinOp::Le => Ok(Json::Bool(compare(&l, &r)? != std::cmp::Ordering::Greater)),
                BinOp::And | BinOp::Or => unreachable!("handled above"),
            }
        }
    }
}

fn eval_call(name: &str, args: Vec<Json>) -> Result<Json, PipelineError> {
    let arg0 = || args.first().cloned().unwrap_or(Json::Null);
    match name {
        "upper" => Ok(Json::String(json_display(&arg0()).to_uppercase())),
        "lower" => Ok(Json::String(json_display(&arg0()).to_lowercase())),
        "trim" => Ok(Json::String(json_display(&arg0()).trim().to_string())),
        "len" => Ok(json_num(json_display(&arg0()).chars().count() as f64)),
        "concat" => Ok(Json::String(args.iter().map(json_display).collect::<Vec<_>>().join(""))),
        other => Err(PipelineError::expression_error(format!("unknown function {other:?}"))),
    }
}

fn truthy(value: &Json) -> bool {
    match value {
        Json::Bool(b) => *b,
        Json::Null => false,
        Json::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}

fn as_number(value: &Json) -> Result<f64, PipelineError> {
    match value {
        Json::Number(n) => n.as_f64().ok_or_else(|| PipelineError::expression_error("non-finite number")),
        Json::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| PipelineError::expression_error(format!("cannot coerce {s:?} to a number"))),
        other => Err(PipelineError::expression_error(format!("cannot coerce {other:?} to a number"))),
    }
}

fn compare(lhs: &Json, rhs: &Json) -> Result<std::cmp::Ordering, PipelineError> {
    if let (Json::String(a), Json::String(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    let (a, b) = (as_number(lhs)?, as_number(rhs)?);
    a.partial_cmp(&b).ok_or_else(|| PipelineError::expression_error("cannot compare NaN"))
}

fn json_display(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_num(n: f64) -> Json {
    serde_json::Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
}

// ---- Lexer ----

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    String(String),
    Ident(String),
    Symbol(&'static str),
}

fn tokenize(source: &str) -> Result<Vec<Token>, PipelineError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let n = text
                .parse::<f64>()
                .map_err(|_| PipelineError::expression_error(format!("invalid number literal {text:?}")))?;
            tokens.push(Token::Number(n));
            continue;
        }
        if c == '"' || c == '\'' {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err(PipelineError::expression_error("unterminated string literal"));
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::String(text));
            i += 1;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::Ident(text));
            continue;
        }
        let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
        let symbol = match two.as_str() {
            "==" | "!=" | ">=" | "<=" | "&&" | "||" => {
                i += 2;
                match two.as_str() {
                    "==" => "==",
                    "!=" => "!=",
                    ">=" => ">=",
                    "<=" => "<=",
                    "&&" => "&&",
                    "||" => "||",
                    _ => unreachable!(),
                }
            }
            _ => {
                i += 1;
                match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    '>' => ">",
                    '<' => "<",
                    '!' => "!",
                    '(' => "(",
                    ')' => ")",
                    ',' => ",",
                    other => return Err(PipelineError::expression_error(format!("unexpected character {other:?}"))),
                }
            }
        };
        tokens.push(Token::Symbol(symbol));
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

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat_symbol(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Some(Token::Symbol(s)) if *s == sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, PipelineError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, PipelineError> {
        let mut lhs = self.parse_and()?;
        while self.eat_symbol("||") {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, PipelineError> {
        let mut lhs = self.parse_cmp()?;
        while self.eat_symbol("&&") {
            let rhs = self.parse_cmp()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, PipelineError> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Symbol("==")) => Some(BinOp::Eq),
            Some(Token::Symbol("!=")) => Some(BinOp::Ne),
            Some(Token::Symbol(">")) => Some(BinOp::Gt),
            Some(Token::Symbol("<")) => Some(BinOp::Lt),
            Some(Token::Symbol(">=")) => Some(BinOp::Ge),
            Some(Token::Symbol("<=")) => Some(BinOp::Le),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let rhs = self.parse_add()?;
                Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
            }
            None => Ok(lhs),
        }
    }

    fn parse_add(&mut self) -> Result<Expr, PipelineError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Symbol("+")) => BinOp::Add,
                Some(Token::Symbol("-")) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, PipelineError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Symbol("*")) => BinOp::Mul,
                Some(Token::Symbol("/")) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, PipelineError> {
        if self.eat_symbol("!") {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)));
        }
        if self.eat_symbol("-") {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)));
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expr, PipelineError> {
        if let Some(Token::Ident(name)) = self.peek().cloned() {
            if matches!(self.tokens.get(self.pos + 1), Some(Token::Symbol("("))) {
                self.pos += 2; // ident + '('
                let mut args = Vec::new();
                if !self.eat_symbol(")") {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.eat_symbol(",") {
                            continue;
                        }
                        break;
                    }
                    if !self.eat_symbol(")") {
                        return Err(PipelineError::expression_error("expected ')' after call arguments"));
                    }
                }
                return Ok(Expr::Call(name, args));
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, PipelineError> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::String(s)) => Ok(Expr::String(s)),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                _ => Ok(Expr::Field(name)),
            },
            Some(Token::Symbol("(")) => {
                let inner = self.parse_expr()?;
                if !self.eat_symbol(")") {
                    return Err(PipelineError::expression_error("expected closing ')'"));
                }
                Ok(inner)
            }
            other => Err(PipelineError::expression_error(format!("unexpected token {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(pairs: &[(&str, Json)]) -> Record {
        let mut r = BTreeMap::new();
        for (k, v) in pairs {
            r.insert(k.to_string(), v.clone());
        }
        r
    }

    #[test]
    fn arithmetic_and_field_reference() {
        let expr = CompiledExpression::compile("price * quantity").unwrap();
        let rec = record(&[("price", Json::from(3.0)), ("quantity", Json::from(4.0))]);
        assert_eq!(expr.eval(&rec).unwrap(), Json::from(12.0));
    }

    #[test]
    fn comparison_as_predicate() {
        let expr = CompiledExpression::compile("amount > 100").unwrap();
        assert!(!expr.eval_bool(&record(&[("amount", Json::from(50))])).unwrap());
        assert!(expr.eval_bool(&record(&[("amount", Json::from(150))])).unwrap());
    }

    #[test]
    fn and_or_short_circuit() {
        let expr = CompiledExpression::compile("a > 0 && b > 0").unwrap();
        assert!(!expr.eval_bool(&record(&[("a", Json::from(-1)), ("b", Json::from(1))])).unwrap());
        assert!(expr.eval_bool(&record(&[("a", Json::from(1)), ("b", Json::from(1))])).unwrap());
    }

    #[test]
    fn string_function_call() {
        let expr = CompiledExpression::compile("upper(name)").unwrap();
        let rec = record(&[("name", Json::from("bob"))]);
        assert_eq!(expr.eval(&rec).unwrap(), Json::from("BOB"));
    }

    #[test]
    fn unknown_function_is_expression_error() {
        let expr = CompiledExpression::compile("reflect(name)").unwrap();
        let rec = record(&[("name", Json::from("bob"))]);
        assert!(expr.eval(&rec).is_err());
    }

    #[test]
    fn missing_field_is_null_not_error() {
        let expr = CompiledExpression::compile("missing == null").unwrap();
        assert!(expr.eval_bool(&record(&[])).unwrap());
    }
}
