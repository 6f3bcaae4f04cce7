//! Stack-based evaluation of a postfix condition against a tuple.

use std::cmp::Ordering;

use crate::error::PredicateError;
use crate::types::{Schema, Value};

/// A comparison operator of the condition grammar.
#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn from_token(token: &str) -> Option<CmpOp> {
        match token {
            "==" => Some(CmpOp::Eq),
            "!=" => Some(CmpOp::Ne),
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::Le),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::Ge),
            _ => None,
        }
    }

    fn eval(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

/// An entry of the heterogeneous operand stack: a raw token not yet
/// interpreted, or the Boolean outcome of a subexpression.
#[derive(Debug)]
enum Operand {
    Token(String),
    Bool(bool),
}

fn pop_token(stack: &mut Vec<Operand>) -> Result<String, PredicateError> {
    match stack.pop() {
        Some(Operand::Token(t)) => Ok(t),
        Some(Operand::Bool(_)) => Err(PredicateError::IllFormed(
            "comparison operand is a Boolean".to_string(),
        )),
        None => Err(PredicateError::IllFormed(
            "operator is missing an operand".to_string(),
        )),
    }
}

fn pop_bool(stack: &mut Vec<Operand>) -> Result<bool, PredicateError> {
    match stack.pop() {
        Some(Operand::Bool(b)) => Ok(b),
        Some(Operand::Token(t)) => Err(PredicateError::IllFormed(format!(
            "expected a Boolean operand, found `{t}`"
        ))),
        None => Err(PredicateError::IllFormed(
            "operator is missing an operand".to_string(),
        )),
    }
}

/// Evaluate a postfix condition against a tuple of the given schema.
///
/// `None` stands for the empty condition and is always true. A comparison
/// resolves whichever side names a schema attribute and parses the other
/// side with that attribute's domain; `==`/`!=` use the domain's natural
/// equality. The tuple must match the schema positionally.
pub fn eval_tuple(
    postfix: Option<&[String]>,
    tuple: &[Value],
    schema: &Schema,
) -> Result<bool, PredicateError> {
    let Some(postfix) = postfix else {
        return Ok(true);
    };
    let mut stack: Vec<Operand> = Vec::new();
    for token in postfix {
        if let Some(op) = CmpOp::from_token(token) {
            let rhs = pop_token(&mut stack)?;
            let lhs = pop_token(&mut stack)?;
            let outcome = if let Some(pos) = schema.position(&lhs) {
                let literal = parse_literal(schema, pos, &rhs)?;
                op.eval(tuple[pos].cmp(&literal))
            } else if let Some(pos) = schema.position(&rhs) {
                let literal = parse_literal(schema, pos, &lhs)?;
                op.eval(literal.cmp(&tuple[pos]))
            } else {
                return Err(PredicateError::IllFormed(format!(
                    "comparison `{lhs} {token} {rhs}` references no schema attribute"
                )));
            };
            stack.push(Operand::Bool(outcome));
        } else if token == "&" || token == "|" {
            let rhs = pop_bool(&mut stack)?;
            let lhs = pop_bool(&mut stack)?;
            let outcome = if token == "&" { lhs && rhs } else { lhs || rhs };
            stack.push(Operand::Bool(outcome));
        } else {
            stack.push(Operand::Token(token.clone()));
        }
    }
    let result = pop_bool(&mut stack)?;
    if !stack.is_empty() {
        return Err(PredicateError::IllFormed(
            "condition leaves operands unconsumed".to_string(),
        ));
    }
    Ok(result)
}

/// Parse `literal` in the domain of the attribute at column `pos`.
fn parse_literal(schema: &Schema, pos: usize, literal: &str) -> Result<Value, PredicateError> {
    let attr = &schema.attributes()[pos];
    attr.domain.parse(literal).ok_or_else(|| {
        PredicateError::IllFormed(format!(
            "`{literal}` is not comparable with attribute `{}` ({:?})",
            attr.name, attr.domain
        ))
    })
}
