//! Selection conditions: infix tokenization, conversion to postfix, and
//! stack-based evaluation against a tuple.
//!
//! A condition is a whitespace-tokenized infix expression over attribute
//! names, literals, six comparison operators (`==`, `!=`, `<`, `<=`, `>`,
//! `>=`), and two Boolean operators (`&`, `|`), with no parentheses, e.g.
//! `1979 < year & year < 1990`.

pub mod eval;
pub mod postfix;

pub use eval::eval_tuple;
pub use postfix::infix_to_postfix;
