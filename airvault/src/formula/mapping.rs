//! Function mapping table: Airtable function name → target shape.
//!
//! Most functions translate by shape alone (rename, method on the first
//! argument, or property access). Functions whose translation needs
//! bespoke rewriting are tagged [`Conversion::Special`] and handled in
//! [`super::special`]. Functions with no target equivalent are tagged
//! [`Conversion::Unsupported`], which makes the whole formula fall back
//! to a static value.
//!
//! Boolean coercion follows the strict semantics: `AND`/`OR`/`NOT`
//! coerce each operand through `isTruthy()` so Airtable's loose truth
//! rules (blank, 0, "") carry over, and `CEILING`/`FLOOR` given a
//! significance argument are a conversion failure rather than a silently
//! wrong `.ceil()`/`.floor()`.

use std::collections::HashMap;
use std::sync::LazyLock;

/// How one Airtable function maps into the target formula grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Renamed global call: `IF(a, b, c)` → `if(a, b, c)`
    Global(&'static str),
    /// First argument becomes the receiver: `ROUND(x, 2)` → `(x).round(2)`
    Method(&'static str),
    /// Unary call becomes a property access: `LEN(x)` → `(x).length`
    Property(&'static str),
    /// Bespoke rewrite in [`super::special`]
    Special,
    /// No target equivalent; formulas using it cannot convert
    Unsupported,
}

/// Zero-argument pseudo-functions rewritten as literals before function
/// rewriting begins (`TRUE()` → `true`, etc.). These are skipped by the
/// convertibility check because they never reach the mapping table.
pub const LITERAL_FUNCTIONS: [&str; 4] = ["TRUE", "FALSE", "ERROR", "BLANK"];

static FUNCTION_MAPPING: LazyLock<HashMap<&'static str, Conversion>> = LazyLock::new(|| {
    use Conversion::{Global, Method, Property, Special, Unsupported};
    HashMap::from([
        // renames
        ("IF", Global("if")),
        ("NOW", Global("now")),
        ("TODAY", Global("today")),
        ("MAX", Global("max")),
        ("MIN", Global("min")),
        ("VALUE", Global("number")),
        // methods on the first argument
        ("LOWER", Method("lower")),
        ("UPPER", Method("upper")),
        ("TRIM", Method("trim")),
        ("ROUND", Method("round")),
        ("ABS", Method("abs")),
        ("INT", Method("floor")),
        ("SUBSTITUTE", Method("replace")),
        ("DATETIME_FORMAT", Method("format")),
        ("ARRAYJOIN", Method("join")),
        ("ARRAYUNIQUE", Method("unique")),
        ("ARRAYFLATTEN", Method("flat")),
        // property accesses
        ("LEN", Property("length")),
        ("YEAR", Property("year")),
        ("MONTH", Property("month")),
        ("DAY", Property("day")),
        ("HOUR", Property("hour")),
        ("MINUTE", Property("minute")),
        ("SECOND", Property("second")),
        // bespoke rewrites
        ("AND", Special),
        ("OR", Special),
        ("NOT", Special),
        ("CONCATENATE", Special),
        ("SUM", Special),
        ("AVERAGE", Special),
        ("COUNT", Special),
        ("COUNTA", Special),
        ("COUNTALL", Special),
        ("LEFT", Special),
        ("RIGHT", Special),
        ("MID", Special),
        ("DATEADD", Special),
        ("DATETIME_PARSE", Special),
        ("MOD", Special),
        ("EXACT", Special),
        ("IS_BEFORE", Special),
        ("IS_AFTER", Special),
        ("IS_SAME", Special),
        ("CREATED_TIME", Special),
        ("LAST_MODIFIED_TIME", Special),
        ("ARRAYCOMPACT", Special),
        ("CEILING", Special),
        ("FLOOR", Special),
        // no target equivalent
        ("REGEX_EXTRACT", Unsupported),
        ("REGEX_MATCH", Unsupported),
        ("REGEX_REPLACE", Unsupported),
        ("ROUNDUP", Unsupported),
        ("ROUNDDOWN", Unsupported),
        ("EVEN", Unsupported),
        ("ODD", Unsupported),
        ("POWER", Unsupported),
        ("SQRT", Unsupported),
        ("LOG", Unsupported),
        ("EXP", Unsupported),
        ("XOR", Unsupported),
        ("SWITCH", Unsupported),
        ("SEARCH", Unsupported),
        ("FIND", Unsupported),
        ("REPT", Unsupported),
        ("T", Unsupported),
        ("ISERROR", Unsupported),
        ("RECORD_ID", Unsupported),
        ("DATETIME_DIFF", Unsupported),
        ("TONOW", Unsupported),
        ("FROMNOW", Unsupported),
        ("WEEKDAY", Unsupported),
        ("WEEKNUM", Unsupported),
        ("TIMESTR", Unsupported),
        ("DATESTR", Unsupported),
        ("SET_LOCALE", Unsupported),
        ("SET_TIMEZONE", Unsupported),
        ("ENCODE_URL_COMPONENT", Unsupported),
        ("LAST_MODIFIED_BY", Unsupported),
        ("CREATED_BY", Unsupported),
    ])
});

/// Looks up a function by name, case-insensitively.
pub fn lookup(name: &str) -> Option<Conversion> {
    FUNCTION_MAPPING
        .get(name.to_ascii_uppercase().as_str())
        .copied()
}

/// True if the name is one of the literal pseudo-functions.
pub fn is_literal_function(name: &str) -> bool {
    LITERAL_FUNCTIONS
        .iter()
        .any(|lit| lit.eq_ignore_ascii_case(name))
}
