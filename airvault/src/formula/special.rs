//! Bespoke rewrites for functions whose translation is not a simple
//! rename. Tried before the generic table-driven shapes.

use super::scan::parse_arguments;

/// Result of attempting a bespoke rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialOutcome {
    /// Not one of the special functions; fall back to the mapping table.
    NotSpecial,
    /// Rewritten successfully.
    Converted(String),
    /// The particular use (e.g. arity) has no target equivalent; the
    /// whole formula falls back to a static value.
    Unsupported,
}

/// Airtable DATEADD unit name → duration suffix in the target grammar.
fn duration_suffix(unit: &str) -> Option<&'static str> {
    match unit {
        "years" | "year" | "y" => Some("y"),
        "months" | "month" => Some("M"),
        "weeks" | "week" | "w" => Some("w"),
        "days" | "day" | "d" => Some("d"),
        "hours" | "hour" | "h" => Some("h"),
        "minutes" | "minute" | "m" => Some("m"),
        "seconds" | "second" | "s" => Some("s"),
        _ => None,
    }
}

// strips one layer of matching quotes from a (trimmed) argument
fn unquote(arg: &str) -> Option<&str> {
    let bytes = arg.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return Some(&arg[1..arg.len() - 1]);
        }
    }
    None
}

fn truthy_chain(args: &[String], joiner: &str) -> SpecialOutcome {
    if args.is_empty() {
        return SpecialOutcome::Unsupported;
    }
    let parts: Vec<String> = args.iter().map(|arg| format!("({arg}).isTruthy()")).collect();
    SpecialOutcome::Converted(format!("({})", parts.join(joiner)))
}

fn list_literal(args: &[String]) -> String {
    format!("list({})", args.join(", "))
}

/// Handles the functions whose rewrite is bespoke. Returns `NotSpecial`
/// for everything else so the caller can fall back to the mapping table.
///
/// `name` must already be uppercased; `args_str` is the raw text between
/// the call's parentheses.
#[allow(clippy::too_many_lines)]
pub fn handle_special_cases(name: &str, args_str: &str) -> SpecialOutcome {
    use SpecialOutcome::{Converted, NotSpecial, Unsupported};

    let args = parse_arguments(args_str);
    match name {
        // boolean coercion: Airtable treats blank, 0, and "" as false,
        // so every operand goes through isTruthy()
        "AND" => truthy_chain(&args, " && "),
        "OR" => truthy_chain(&args, " || "),
        "NOT" => match args.as_slice() {
            [arg] => Converted(format!("!({arg}).isTruthy()")),
            _ => Unsupported,
        },

        "CONCATENATE" | "SUM" => {
            if args.is_empty() {
                return Unsupported;
            }
            Converted(format!("({})", args.join(" + ")))
        }
        "AVERAGE" => {
            if args.is_empty() {
                return Unsupported;
            }
            let count = args.len();
            Converted(format!("(({}) / {count})", args.join(" + ")))
        }

        // three distinct counting semantics
        "COUNT" => Converted(format!(
            "{}.filter(value.isType(\"number\")).length",
            list_literal(&args)
        )),
        "COUNTA" => Converted(format!(
            "{}.filter(!value.isEmpty()).length",
            list_literal(&args)
        )),
        "COUNTALL" => Converted(format!("{}.length", list_literal(&args))),

        // string slicing: Airtable positions are 1-based, slice() is 0-based
        "LEFT" => match args.as_slice() {
            [text, count] => Converted(format!("({text}).slice(0, {count})")),
            _ => Unsupported,
        },
        "RIGHT" => match args.as_slice() {
            [text, count] => Converted(format!("({text}).slice(-({count}))")),
            _ => Unsupported,
        },
        "MID" => match args.as_slice() {
            [text, start, count] => {
                // fold the offset when both positions are literal numbers
                if let (Ok(start), Ok(count)) = (start.parse::<i64>(), count.parse::<i64>()) {
                    Converted(format!(
                        "({text}).slice({}, {})",
                        start - 1,
                        start - 1 + count
                    ))
                } else {
                    Converted(format!(
                        "({text}).slice(({start}) - 1, ({start}) - 1 + ({count}))"
                    ))
                }
            }
            _ => Unsupported,
        },

        // date arithmetic uses duration-string addition in the target
        "DATEADD" => match args.as_slice() {
            [date, amount, unit] => {
                let Some(unit) = unquote(unit).and_then(|u| duration_suffix(&u.to_lowercase()))
                else {
                    return Unsupported;
                };
                // the duration must be a literal string, so a dynamic
                // amount expression cannot be represented
                let Ok(amount) = amount.parse::<i64>() else {
                    return Unsupported;
                };
                Converted(format!("(({date}) + \"{amount}{unit}\")"))
            }
            _ => Unsupported,
        },
        "DATETIME_PARSE" => match args.as_slice() {
            [text] => Converted(format!("date({text})")),
            // format/locale arguments have no target equivalent
            _ => Unsupported,
        },
        "IS_BEFORE" => match args.as_slice() {
            [a, b] => Converted(format!("(({a}) < ({b}))")),
            _ => Unsupported,
        },
        "IS_AFTER" => match args.as_slice() {
            [a, b] => Converted(format!("(({a}) > ({b}))")),
            _ => Unsupported,
        },
        "IS_SAME" => match args.as_slice() {
            [a, b] => Converted(format!("(({a}) == ({b}))")),
            // unit-granularity comparison has no target equivalent
            _ => Unsupported,
        },
        "CREATED_TIME" => match args.as_slice() {
            [] => Converted("file.ctime".to_string()),
            _ => Unsupported,
        },
        "LAST_MODIFIED_TIME" => match args.as_slice() {
            [] => Converted("file.mtime".to_string()),
            // field-restricted variants track specific columns, which
            // files don't have
            _ => Unsupported,
        },

        "MOD" => match args.as_slice() {
            [a, b] => Converted(format!("(({a}) % ({b}))")),
            _ => Unsupported,
        },
        "EXACT" => match args.as_slice() {
            [a, b] => Converted(format!("(({a}) == ({b}))")),
            _ => Unsupported,
        },

        "ARRAYCOMPACT" => match args.as_slice() {
            [arg] => Converted(format!("({arg}).filter(!value.isEmpty())")),
            _ => Unsupported,
        },

        // strict: a significance argument changes the rounding grid and
        // cannot be expressed with plain ceil()/floor()
        "CEILING" => match args.as_slice() {
            [arg] => Converted(format!("({arg}).ceil()")),
            _ => Unsupported,
        },
        "FLOOR" => match args.as_slice() {
            [arg] => Converted(format!("({arg}).floor()")),
            _ => Unsupported,
        },

        _ => NotSpecial,
    }
}

#[cfg(test)]
mod tests {
    use super::SpecialOutcome::{Converted, NotSpecial, Unsupported};
    use super::*;

    #[test]
    fn and_coerces_each_operand() {
        assert_eq!(
            handle_special_cases("AND", "a, b > 1"),
            Converted("((a).isTruthy() && (b > 1).isTruthy())".into())
        );
    }

    #[test]
    fn not_requires_exactly_one_argument() {
        assert_eq!(
            handle_special_cases("NOT", "x"),
            Converted("!(x).isTruthy()".into())
        );
        assert_eq!(handle_special_cases("NOT", "x, y"), Unsupported);
    }

    #[test]
    fn sum_joins_with_plus() {
        assert_eq!(
            handle_special_cases("SUM", "1, 2, 3"),
            Converted("(1 + 2 + 3)".into())
        );
    }

    #[test]
    fn count_variants_differ() {
        assert_eq!(
            handle_special_cases("COUNT", "a, b"),
            Converted("list(a, b).filter(value.isType(\"number\")).length".into())
        );
        assert_eq!(
            handle_special_cases("COUNTA", "a, b"),
            Converted("list(a, b).filter(!value.isEmpty()).length".into())
        );
        assert_eq!(
            handle_special_cases("COUNTALL", "a, b"),
            Converted("list(a, b).length".into())
        );
    }

    #[test]
    fn mid_is_rebased_to_zero() {
        assert_eq!(
            handle_special_cases("MID", "x, 3, 4"),
            Converted("(x).slice(2, 6)".into())
        );
    }

    #[test]
    fn mid_with_dynamic_positions_emits_arithmetic() {
        assert_eq!(
            handle_special_cases("MID", "x, n, 4"),
            Converted("(x).slice((n) - 1, (n) - 1 + (4))".into())
        );
    }

    #[test]
    fn dateadd_maps_unit_names() {
        assert_eq!(
            handle_special_cases("DATEADD", "d, 3, 'days'"),
            Converted("((d) + \"3d\")".into())
        );
        assert_eq!(
            handle_special_cases("DATEADD", "d, 2, \"months\""),
            Converted("((d) + \"2M\")".into())
        );
    }

    #[test]
    fn dateadd_rejects_unknown_units_and_dynamic_amounts() {
        assert_eq!(handle_special_cases("DATEADD", "d, 1, 'fortnights'"), Unsupported);
        assert_eq!(handle_special_cases("DATEADD", "d, {N}, 'days'"), Unsupported);
    }

    #[test]
    fn ceiling_with_significance_is_a_failure() {
        assert_eq!(
            handle_special_cases("CEILING", "x"),
            Converted("(x).ceil()".into())
        );
        assert_eq!(handle_special_cases("CEILING", "x, 0.5"), Unsupported);
        assert_eq!(handle_special_cases("FLOOR", "x, 10"), Unsupported);
    }

    #[test]
    fn non_special_functions_fall_through() {
        assert_eq!(handle_special_cases("ROUND", "x, 2"), NotSpecial);
        assert_eq!(handle_special_cases("IF", "a, b, c"), NotSpecial);
    }
}
