//! # airvault
//!
//! Imports Airtable bases into a Markdown vault: one folder per table,
//! one note per record (YAML frontmatter + templated body), and one
//! `.base` view-definition file per table describing the table's views.
//!
//! The interesting parts:
//!
//! - [`formula`] - a source-to-source compiler rewriting Airtable formula
//!   expressions into vault base formulas, used so that formula, rollup,
//!   and count columns can stay *live* in the vault instead of being
//!   frozen to the values they had at import time.
//! - [`fields`] - per-field-type value conversion into frontmatter
//!   properties, with a static fallback whenever a formula can't be
//!   rewritten.
//! - [`importer`] - the two-phase orchestrator: fetch everything first
//!   (schema, records, per-view memberships), then write files with
//!   idempotent re-import behavior.
//!
//! File I/O goes through the [`vault::Vault`] trait, so the importer can
//! target a real directory ([`vault::FsVault`]) or an in-memory store in
//! tests.
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unused_async)]

pub mod attachments;
pub mod basefile;
pub mod context;
pub mod fields;
pub mod formula;
pub mod frontmatter;
pub mod importer;
pub mod test_util;
pub mod vault;
