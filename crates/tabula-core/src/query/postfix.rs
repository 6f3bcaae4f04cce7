//! Infix → postfix conversion for selection conditions.

/// Whether `token` is one of the six comparison operators.
pub fn is_comparison(token: &str) -> bool {
    matches!(token, "==" | "!=" | "<" | "<=" | ">" | ">=")
}

/// Whether `token` is any operator of the condition grammar.
pub fn is_operator(token: &str) -> bool {
    is_comparison(token) || token == "&" || token == "|"
}

/// Operator binding strength, highest first. Operands rank 0.
fn precedence(token: &str) -> u8 {
    match token {
        "==" => 8,
        "!=" => 7,
        "<" => 6,
        "<=" => 5,
        ">" => 4,
        ">=" => 3,
        "&" => 2,
        "|" => 1,
        _ => 0,
    }
}

/// Convert a whitespace-tokenized infix condition to postfix with the
/// shunting-yard algorithm (all operators are left-associative, so an
/// operator pops every stacked operator of equal or higher precedence).
///
/// Single-quoted string literals lose their quotes on emission. An empty or
/// whitespace-only condition denotes the always-true predicate and yields
/// `None`.
pub fn infix_to_postfix(condition: &str) -> Option<Vec<String>> {
    if condition.trim().is_empty() {
        return None;
    }
    let mut postfix: Vec<String> = Vec::new();
    let mut ops: Vec<&str> = Vec::new();
    for token in condition.split_whitespace() {
        if is_operator(token) {
            while let Some(top) = ops.last() {
                if precedence(token) > precedence(top) {
                    break;
                }
                postfix.push(ops.pop().unwrap().to_string());
            }
            ops.push(token);
        } else if token.starts_with('\'') && token.ends_with('\'') && token.len() >= 2 {
            postfix.push(token[1..token.len() - 1].to_string());
        } else {
            postfix.push(token.to_string());
        }
    }
    while let Some(op) = ops.pop() {
        postfix.push(op.to_string());
    }
    Some(postfix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_postfix(condition: &str) -> Vec<String> {
        infix_to_postfix(condition).unwrap()
    }

    #[test]
    fn test_operator_classification() {
        for op in ["==", "!=", "<", "<=", ">", ">="] {
            assert!(is_comparison(op));
            assert!(is_operator(op));
        }
        assert!(!is_comparison("&"));
        assert!(is_operator("&"));
        assert!(is_operator("|"));
        assert!(!is_operator("year"));
        assert!(!is_operator("1979"));
    }

    #[test]
    fn test_single_comparison() {
        assert_eq!(to_postfix("year < 1990"), ["year", "1990", "<"]);
    }

    #[test]
    fn test_conjunction_of_comparisons() {
        // Comparisons bind tighter than `&`.
        assert_eq!(
            to_postfix("1979 < year & year < 1990"),
            ["1979", "year", "<", "year", "1990", "<", "&"]
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            to_postfix("a == 1 | b == 2 & c == 3"),
            ["a", "1", "==", "b", "2", "==", "c", "3", "==", "&", "|"]
        );
    }

    #[test]
    fn test_equal_precedence_is_left_associative() {
        assert_eq!(to_postfix("a & b & c"), ["a", "b", "&", "c", "&"]);
    }

    #[test]
    fn test_quoted_literal_is_stripped() {
        assert_eq!(
            to_postfix("title == 'Star_Wars'"),
            ["title", "Star_Wars", "=="]
        );
    }

    #[test]
    fn test_empty_condition_is_always_true() {
        assert_eq!(infix_to_postfix(""), None);
        assert_eq!(infix_to_postfix("   "), None);
    }
}
