//! # Airtable formula conversion
//!
//! Translates Airtable formula text into the vault base formula grammar.
//! The pipeline in [`convert_airtable_formula`] runs in a fixed order:
//! field references, concatenation and equality operators, literal
//! pseudo-functions, then repeated table-driven call rewriting until a
//! fixed point.
//!
//! ```
//! use std::collections::HashMap;
//! use airvault::formula::convert_airtable_formula;
//!
//! let converted = convert_airtable_formula("LOWER({Name})", &HashMap::new());
//! assert_eq!(converted.as_deref(), Some("(note[\"Name\"]).lower()"));
//! ```

mod convert;
mod mapping;
mod ops;
mod scan;
mod special;

pub use convert::{can_convert_formula, convert_airtable_formula};
pub use mapping::{Conversion, lookup};
pub use ops::{convert_concatenation_operator, convert_equality_operator};
pub use scan::{find_matching_paren, parse_arguments};
