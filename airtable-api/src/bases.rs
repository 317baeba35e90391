//! # Airtable bases
//!
//! - [`list_bases`](crate::client::AirtableClient::list_bases) - list bases readable by the token
//!
//! The metadata API paginates base listings with an opaque `offset`
//! continuation token; `list_bases` follows the token until exhausted.

use serde::{Deserialize, Serialize};

use crate::{Result, client::AirtableClient};

/// One base readable by the configured token.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Base {
    /// Base identifier ("app...")
    pub id: String,
    /// Display name
    pub name: String,
    /// Access level granted to the token (e.g. "read", "create")
    pub permission_level: String,
}

#[derive(Debug, Deserialize)]
struct BasesResponse {
    bases: Vec<Base>,
    offset: Option<String>,
}

impl AirtableClient {
    /// Lists every base the token can read, following pagination.
    pub async fn list_bases(&self) -> Result<Vec<Base>> {
        let mut bases = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let query: Vec<(String, String)> = offset
                .iter()
                .map(|token| ("offset".to_string(), token.clone()))
                .collect();
            let page: BasesResponse = self.http().get_request("/v0/meta/bases", &query).await?;
            bases.extend(page.bases);
            match page.offset {
                Some(token) => offset = Some(token),
                None => break,
            }
        }
        Ok(bases)
    }
}
