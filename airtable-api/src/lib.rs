//! # Airtable Rust API Client
//!
//! An ergonomic Airtable Web API client in Rust.
//!
//! ## Features
//!
//! - metadata API: bases, table schemas (fields + views)
//! - record listing with cursor-token pagination
//! - per-view record membership queries
//! - http middleware with rate limiting and 429 recovery
//! - typed field schemas with a closed field-type enum
//! - metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airtable_api::prelude::*;
//! # async fn example() -> Result<(), AirtableError> {
//! let client = AirtableClient::new("pat_xxx")?;
//!
//! // List bases the token can read
//! for base in client.list_bases().await? {
//!     println!("{} {}", base.id, base.name);
//! }
//!
//! // Fetch the full schema for one base
//! let tables = client.base_schema("appXXXXXXXXXXXXXX").await?;
//! for table in &tables {
//!     println!("{} ({} fields, {} views)", table.name, table.fields.len(), table.views.len());
//! }
//!
//! // Fetch every record of a table
//! let records = client.list_records("appXXXXXXXXXXXXXX", "tblYYYYYYYYYYYYYY").await?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ### Notes on API design
//!
//! - Airtable paginates with an opaque `offset` continuation token in the
//!   response body, not numeric limit/offset. The list methods thread the
//!   token internally and return the fully collected result.
//! - All requests go through a single HTTP pipeline that enforces a minimum
//!   inter-request delay and recovers from 429 responses by waiting and
//!   retrying. Rate limits are never surfaced as errors (the Airtable docs
//!   specify a 30 second penalty window, after which requests succeed again).
//! - The rate limiter is owned by the client, not global, so independent
//!   client instances (e.g. under test) do not interfere.
//!
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::must_use_candidate)] // pedantic
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

pub mod bases;
pub mod client;
pub mod error;
mod http_client;
pub mod limiter;
pub mod records;
pub mod schema;

/// Result type alias using `AirtableError` as the default error.
pub type Result<T, E = crate::error::AirtableError> = std::result::Result<T, E>;

/// Prelude module - import (nearly) all the things with `use airtable_api::prelude::*;`
pub mod prelude {
    pub use super::AIRTABLE_API_URL;
    pub use crate::error::*;
    pub use crate::{
        bases::Base,
        client::{AirtableClient, ClientConfig},
        limiter::RateLimiter,
        records::Record,
        schema::{FieldOptions, FieldSchema, FieldType, Table, View, ViewType},
    };
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// Airtable Web API endpoint
pub const AIRTABLE_API_URL: &str = "https://api.airtable.com";

pub(crate) mod config {
    /// Environment variable for overriding the endpoint URL (useful for tests)
    pub const AIRTABLE_URL_ENV: &str = "AIRTABLE_URL";

    /// Minimum delay between consecutive requests (milliseconds).
    /// Airtable allows 5 requests/sec per base; 50ms keeps a margin
    /// below that without slowing large imports noticeably.
    pub const MIN_REQUEST_DELAY_MS: u64 = 50;

    /// Wait after a 429 response when the server doesn't say how long.
    /// The Airtable docs specify a 30 second penalty window.
    pub const RATE_LIMIT_BACKOFF_SECS: u64 = 30;

    /// Page size requested for record listings (API max: 100)
    pub const RECORD_PAGE_SIZE: u32 = 100;
}
