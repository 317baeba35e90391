//! Quote- and paren-aware character scanners.
//!
//! Every transformation in this module operates on a balanced-parenthesis,
//! string-literal-aware view of the formula text. A literal is terminated
//! only by an unescaped quote of the same kind that opened it (`'` and `"`
//! each close only their own kind).

/// Tracks string-literal state while scanning a formula left to right.
#[derive(Debug, Default)]
pub(crate) struct LiteralTracker {
    quote: Option<char>,
    escaped: bool,
}

impl LiteralTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances over one character. Returns true if the character is part
    /// of a string literal (delimiters included).
    pub fn step(&mut self, ch: char) -> bool {
        match self.quote {
            Some(quote) => {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == quote {
                    self.quote = None;
                }
                true
            }
            None => {
                if ch == '\'' || ch == '"' {
                    self.quote = Some(ch);
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Splits a comma-separated argument list at top level only.
///
/// Commas nested inside parentheses, brackets, or string literals do not
/// split. Arguments are trimmed. Empty input yields an empty list.
pub fn parse_arguments(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut literals = LiteralTracker::new();

    for ch in args.chars() {
        let in_literal = literals.step(ch);
        if !in_literal {
            match ch {
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                ',' if depth == 0 => {
                    out.push(current.trim().to_string());
                    current.clear();
                    continue;
                }
                _ => {}
            }
        }
        current.push(ch);
    }

    let last = current.trim();
    if !last.is_empty() || !out.is_empty() {
        out.push(last.to_string());
    }
    out
}

/// Given the byte index of an opening `(`, returns the byte index of the
/// matching `)`, ignoring parens inside string literals.
/// Returns None if the expression is unterminated.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut literals = LiteralTracker::new();
    for (idx, ch) in text[open..].char_indices() {
        if literals.step(ch) {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_top_level_arguments_only() {
        let args = parse_arguments("A=1,\"a,b\",SUM(1,2)");
        assert_eq!(args, vec!["A=1", "\"a,b\"", "SUM(1,2)"]);
    }

    #[test]
    fn commas_inside_brackets_do_not_split() {
        let args = parse_arguments("[1, 2, 3], x");
        assert_eq!(args, vec!["[1, 2, 3]", "x"]);
    }

    #[test]
    fn empty_input_yields_no_arguments() {
        assert!(parse_arguments("").is_empty());
        assert!(parse_arguments("   ").is_empty());
    }

    #[test]
    fn trailing_empty_argument_is_kept() {
        assert_eq!(parse_arguments("a,"), vec!["a", ""]);
    }

    #[test]
    fn escaped_quote_does_not_end_literal() {
        let args = parse_arguments(r#""a\",b",c"#);
        assert_eq!(args, vec![r#""a\",b""#, "c"]);
    }

    #[test]
    fn single_and_double_quotes_close_only_their_own_kind() {
        let args = parse_arguments(r#"'a",b',c"#);
        assert_eq!(args, vec![r#"'a",b'"#, "c"]);
    }

    #[test]
    fn matching_paren_skips_nested_and_quoted_parens() {
        let text = r#"IF(SUM(1, 2) > "x)", 1, 0)"#;
        let open = text.find('(').unwrap();
        let close = find_matching_paren(text, open).unwrap();
        assert_eq!(&text[close..], ")");
        assert_eq!(close, text.len() - 1);
    }

    #[test]
    fn unterminated_expression_returns_none() {
        assert_eq!(find_matching_paren("IF(a, b", 2), None);
        assert_eq!(find_matching_paren("IF(\"unclosed)", 2), None);
    }
}
