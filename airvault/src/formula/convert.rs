//! Formula conversion driver.
//!
//! There is no explicit AST: the model is the formula string plus a scan
//! cursor, and every transformation preserves overall expression validity
//! by operating on a balanced-parenthesis, quote-aware view of the text.
//! The only deliberately naive substitutions are the literal-producing
//! zero-argument calls (`TRUE()` → `true`, …), which take no arguments
//! and cannot be fooled by surrounding parens.
//!
//! Conversion failure is not an error: [`convert_airtable_formula`]
//! returns `None` and the field converter falls back to a static value.

use std::collections::HashMap;

use super::{
    mapping::{Conversion, is_literal_function, lookup},
    ops::{convert_concatenation_operator, convert_equality_operator},
    scan::{LiteralTracker, find_matching_paren, parse_arguments},
    special::{SpecialOutcome, handle_special_cases},
};

/// Bound on fixed-point rewrite passes, to guarantee termination on
/// pathological inputs. One pass handles one nesting level, so this
/// comfortably covers any real formula.
const MAX_REWRITE_PASSES: usize = 20;

// a function-call token: NAME followed (possibly after whitespace) by '('
#[derive(Debug)]
struct Call {
    start: usize,
    name: String,
    open: usize,
}

fn is_word_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Finds the next function-call token at or after byte offset `from`,
/// skipping string literals. A token does not match when preceded by `.`
/// (method position) or a word character (suffix of a longer name).
fn next_call(text: &str, from: usize) -> Option<Call> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut literals = LiteralTracker::new();
    let mut idx = 0;
    while idx < chars.len() {
        let (pos, ch) = chars[idx];
        if literals.step(ch) {
            idx += 1;
            continue;
        }
        if !is_word_start(ch) {
            idx += 1;
            continue;
        }
        let prev = idx.checked_sub(1).map(|p| chars[p].1);
        let blocked = matches!(prev, Some(c) if is_word_char(c) || c == '.');
        let mut end = idx + 1;
        while end < chars.len() && is_word_char(chars[end].1) {
            end += 1;
        }
        let mut after = end;
        while after < chars.len() && chars[after].1.is_whitespace() {
            after += 1;
        }
        if !blocked && pos >= from && after < chars.len() && chars[after].1 == '(' {
            let name: String = chars[idx..end].iter().map(|&(_, c)| c).collect();
            return Some(Call {
                start: pos,
                name,
                open: chars[after].0,
            });
        }
        // word characters can't open a literal, so skipping them keeps
        // the tracker consistent
        idx = end;
    }
    None
}

/// Pre-flight scan: true when every function referenced in the formula
/// has a supported mapping. The converter trusts this result and does
/// not re-validate mid-conversion.
pub fn can_convert_formula(formula: &str) -> bool {
    let mut pos = 0;
    while let Some(call) = next_call(formula, pos) {
        if !is_literal_function(&call.name) {
            match lookup(&call.name) {
                Some(Conversion::Unsupported) | None => return false,
                Some(_) => {}
            }
        }
        pos = call.start + 1;
    }
    true
}

/// Replaces `{Field Name}` / `{fieldId}` references with `note["Name"]`.
/// Field ids resolve through the id→name map; unresolved ids fall back to
/// the bracketed text verbatim.
fn replace_field_references(formula: &str, field_names: &HashMap<String, String>) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut literals = LiteralTracker::new();
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        if literals.step(ch) {
            out.push(ch);
            idx += 1;
            continue;
        }
        if ch == '{'
            && let Some(close) = (idx + 1..chars.len()).find(|&j| chars[j] == '}')
        {
            let inner: String = chars[idx + 1..close].iter().collect();
            let inner = inner.trim();
            let resolved = field_names
                .get(inner)
                .map_or_else(|| inner.to_string(), Clone::clone);
            out.push_str("note[\"");
            out.push_str(&resolved.replace('"', "\\\""));
            out.push_str("\"]");
            idx = close + 1;
            continue;
        }
        out.push(ch);
        idx += 1;
    }
    out
}

/// Rewrites the literal-producing zero-argument calls, case-insensitively
/// and tolerant of whitespace inside the parens.
fn rewrite_literal_calls(formula: &str) -> String {
    let mut text = formula.to_string();
    let mut pos = 0;
    while let Some(call) = next_call(&text, pos) {
        let replacement = match call.name.to_ascii_uppercase().as_str() {
            "TRUE" => "true",
            "FALSE" => "false",
            "ERROR" => "\"!ERROR\"",
            "BLANK" => "\"\"",
            _ => {
                pos = call.start + 1;
                continue;
            }
        };
        let Some(close) = find_matching_paren(&text, call.open) else {
            pos = call.start + 1;
            continue;
        };
        if !text[call.open + 1..close].trim().is_empty() {
            // not the zero-argument literal form; leave it alone
            pos = call.start + 1;
            continue;
        }
        text.replace_range(call.start..=close, replacement);
        pos = call.start + replacement.len();
    }
    text
}

// one left-to-right pass over the text, rewriting every call it finds
fn rewrite_pass(text: &str) -> Option<(String, bool)> {
    let mut text = text.to_string();
    let mut changed = false;
    let mut pos = 0;
    while let Some(call) = next_call(&text, pos) {
        let Some(conversion) = lookup(&call.name) else {
            pos = call.start + 1;
            continue;
        };
        // malformed (unbalanced) input counts as conversion failure
        let close = find_matching_paren(&text, call.open)?;
        let args_str = text[call.open + 1..close].to_string();
        let upper = call.name.to_ascii_uppercase();
        let replacement = match handle_special_cases(&upper, &args_str) {
            SpecialOutcome::Converted(replacement) => replacement,
            SpecialOutcome::Unsupported => return None,
            SpecialOutcome::NotSpecial => {
                let args = parse_arguments(&args_str);
                match conversion {
                    Conversion::Global(name) => format!("{name}({})", args.join(", ")),
                    Conversion::Property(name) => {
                        let [arg] = args.as_slice() else {
                            return None;
                        };
                        format!("({arg}).{name}")
                    }
                    Conversion::Method(name) => {
                        let (receiver, rest) = args.split_first()?;
                        format!("({receiver}).{name}({})", rest.join(", "))
                    }
                    // specials are handled above and unsupported names
                    // are rejected up front; reaching here means the
                    // tables are out of sync
                    Conversion::Special | Conversion::Unsupported => return None,
                }
            }
        };
        if replacement != text[call.start..=close] {
            changed = true;
            text.replace_range(call.start..=close, &replacement);
        }
        // advance minimally so calls nested inside the replacement (or
        // inside an already-converted outer call) are still visited
        pos = call.start + 1;
    }
    Some((text, changed))
}

/// Converts an Airtable formula into the vault base formula grammar.
///
/// Returns `None` when the formula uses an unsupported function, is
/// malformed, or fails to reach a rewrite fixed point — the caller falls
/// back to a static value in all three cases.
///
/// `field_names` maps field ids to display names for `{fldXXX}`
/// references; `{Field Name}` references pass through by name.
pub fn convert_airtable_formula(
    formula: &str,
    field_names: &HashMap<String, String>,
) -> Option<String> {
    if !can_convert_formula(formula) {
        return None;
    }
    let mut text = replace_field_references(formula, field_names);
    text = convert_concatenation_operator(&text);
    text = convert_equality_operator(&text);
    text = rewrite_literal_calls(&text);

    for _ in 0..MAX_REWRITE_PASSES {
        let (next, changed) = rewrite_pass(&text)?;
        if !changed {
            return Some(next);
        }
        text = next;
    }
    // still churning after the cap: safer to fail than to emit a
    // partially rewritten formula
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, name)| ((*id).to_string(), (*name).to_string()))
            .collect()
    }

    #[test]
    fn field_references_resolve_ids_and_names() {
        let map = names(&[("fld001", "Hours")]);
        assert_eq!(
            convert_airtable_formula("{fld001} + {Rate}", &map).unwrap(),
            "note[\"Hours\"] + note[\"Rate\"]"
        );
    }

    #[test]
    fn concatenation_and_equality_rewrite_together() {
        let result = convert_airtable_formula("{A} & \"x\" = {B}", &HashMap::new()).unwrap();
        assert_eq!(result, "note[\"A\"] + \"x\" == note[\"B\"]");
    }

    #[test]
    fn literal_calls_rewrite_case_insensitively() {
        let result =
            convert_airtable_formula("IF({Done}, true(), Blank( ))", &HashMap::new()).unwrap();
        assert_eq!(result, "if(note[\"Done\"], true, \"\")");
    }

    #[test]
    fn error_literal_becomes_marker_string() {
        let result = convert_airtable_formula("IF({X}, ERROR(), 1)", &HashMap::new()).unwrap();
        assert_eq!(result, "if(note[\"X\"], \"!ERROR\", 1)");
    }

    #[test]
    fn property_shape_converts_len() {
        let result = convert_airtable_formula("LEN({Name})", &HashMap::new()).unwrap();
        assert_eq!(result, "(note[\"Name\"]).length");
    }

    #[test]
    fn method_shape_converts_round() {
        let result = convert_airtable_formula("ROUND({Price}, 2)", &HashMap::new()).unwrap();
        assert_eq!(result, "(note[\"Price\"]).round(2)");
    }

    #[test]
    fn nested_calls_rewrite_completely() {
        let result = convert_airtable_formula("ROUND(SUM({A},{B}), 2)", &HashMap::new()).unwrap();
        assert_eq!(result, "((note[\"A\"] + note[\"B\"])).round(2)");
    }

    #[test]
    fn string_literal_contents_survive_conversion() {
        let result =
            convert_airtable_formula("CONCATENATE(\"A & B\", \"x=y\")", &HashMap::new()).unwrap();
        assert_eq!(result, "(\"A & B\" + \"x=y\")");
    }

    #[test]
    fn unsupported_function_short_circuits() {
        let formula = "REGEX_EXTRACT({Name}, \"a.*\")";
        assert!(!can_convert_formula(formula));
        assert_eq!(convert_airtable_formula(formula, &HashMap::new()), None);
    }

    #[test]
    fn unknown_function_short_circuits() {
        assert!(!can_convert_formula("FROBNICATE({A})"));
    }

    #[test]
    fn unsupported_name_inside_literal_is_ignored() {
        assert!(can_convert_formula("IF({A} = \"REGEX_EXTRACT(\", 1, 0)"));
    }

    #[test]
    fn unbalanced_parens_fail_conversion_not_panic() {
        assert_eq!(convert_airtable_formula("IF({A}, 1", &HashMap::new()), None);
    }

    #[test]
    fn dateadd_converts_through_driver() {
        let result =
            convert_airtable_formula("DATEADD({Date}, 1, 'days')", &HashMap::new()).unwrap();
        assert_eq!(result, "((note[\"Date\"]) + \"1d\")");
    }

    #[test]
    fn and_uses_truthy_coercion() {
        let result = convert_airtable_formula("AND({A}, {B})", &HashMap::new()).unwrap();
        assert_eq!(
            result,
            "((note[\"A\"]).isTruthy() && (note[\"B\"]).isTruthy())"
        );
    }

    #[test]
    fn ceiling_with_significance_fails_whole_formula() {
        // in the table (so the pre-flight check passes) but the two-arg
        // form is rejected during rewrite
        assert!(can_convert_formula("CEILING({A}, 0.5)"));
        assert_eq!(
            convert_airtable_formula("CEILING({A}, 0.5)", &HashMap::new()),
            None
        );
    }

    #[test]
    fn converted_output_is_stable_under_reconversion_passes() {
        // lowercase target names are re-found by the scanner but their
        // rewrite is the identity, so the fixed point is reached
        let result = convert_airtable_formula("IF(MAX({A}, 2), 1, 0)", &HashMap::new()).unwrap();
        assert_eq!(result, "if(max(note[\"A\"], 2), 1, 0)");
    }
}
