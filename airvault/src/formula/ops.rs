//! Single-pass operator rewrites.
//!
//! Airtable uses `&` for string concatenation and a bare `=` for equality;
//! the vault formula grammar uses `+` and `==`. Both rewrites respect
//! string-literal boundaries so operator characters inside quotes survive
//! unchanged.

use super::scan::LiteralTracker;

/// Replaces every `&` outside string literals with `+`.
pub fn convert_concatenation_operator(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut literals = LiteralTracker::new();
    for ch in formula.chars() {
        if !literals.step(ch) && ch == '&' {
            out.push('+');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rewrites each bare `=` outside string literals to `==`.
///
/// A `=` is left alone when it is already part of a multi-character
/// operator: preceded by `!`, `>`, `<`, or `=`, or followed by `=`.
/// A standalone `=` at position 0 still converts.
pub fn convert_equality_operator(formula: &str) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut literals = LiteralTracker::new();
    for (idx, &ch) in chars.iter().enumerate() {
        if literals.step(ch) || ch != '=' {
            out.push(ch);
            continue;
        }
        let prev = idx.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(idx + 1).copied();
        let part_of_operator =
            matches!(prev, Some('!' | '>' | '<' | '=')) || next == Some('=');
        if part_of_operator {
            out.push('=');
        } else {
            out.push_str("==");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_outside_literals_becomes_plus() {
        assert_eq!(convert_concatenation_operator("{A} & {B}"), "{A} + {B}");
    }

    #[test]
    fn concatenation_inside_literals_survives() {
        assert_eq!(
            convert_concatenation_operator(r#"CONCATENATE("A & B", {X}) & "y""#),
            r#"CONCATENATE("A & B", {X}) + "y""#
        );
    }

    #[test]
    fn bare_equals_becomes_double() {
        assert_eq!(convert_equality_operator("{A} = 1"), "{A} == 1");
    }

    #[test]
    fn multi_character_operators_are_preserved() {
        assert_eq!(convert_equality_operator("a != b"), "a != b");
        assert_eq!(convert_equality_operator("a >= b"), "a >= b");
        assert_eq!(convert_equality_operator("a <= b"), "a <= b");
        assert_eq!(convert_equality_operator("a == b"), "a == b");
    }

    #[test]
    fn equals_inside_literal_survives() {
        assert_eq!(
            convert_equality_operator(r#"IF({A}="x=y", 1, 0)"#),
            r#"IF({A}=="x=y", 1, 0)"#
        );
    }

    #[test]
    fn equals_at_position_zero_converts() {
        assert_eq!(convert_equality_operator("=1"), "==1");
    }
}
