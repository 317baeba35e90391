//! # Airtable records
//!
//! - [`list_records`](crate::client::AirtableClient::list_records) - fetch every record of a table
//! - [`list_view_record_ids`](crate::client::AirtableClient::list_view_record_ids) - record
//!   membership of one view (IDs only)
//!
//! Record listings paginate with an opaque `offset` continuation token in
//! the response body. Pages are fetched sequentially (never in parallel),
//! which keeps the client inside Airtable's per-base rate limit together
//! with the pacing enforced by the HTTP middleware.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, client::AirtableClient, config::RECORD_PAGE_SIZE};

/// One record of a table. `fields` values are dynamically typed per the
/// table schema; fields whose value is empty are absent from the map.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Record identifier ("rec..."), stable across runs
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub created_time: DateTime<FixedOffset>,
}

impl Record {
    /// Returns a field value by name, or None if absent (empty).
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<Record>,
    offset: Option<String>,
}

// membership queries only need the id, so the fields map is not requested
#[derive(Debug, Deserialize)]
struct RecordIdOnly {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RecordIdsResponse {
    records: Vec<RecordIdOnly>,
    offset: Option<String>,
}

impl AirtableClient {
    /// Fetches every record of a table, following the continuation token
    /// until the listing is exhausted.
    pub async fn list_records(
        &self,
        base_id: impl AsRef<str>,
        table_id: impl AsRef<str>,
    ) -> Result<Vec<Record>> {
        let base_id = base_id.as_ref();
        let table_id = table_id.as_ref();
        self.validate_id(base_id, "base_id")?;
        self.validate_id(table_id, "table_id")?;

        let path = format!("/v0/{base_id}/{table_id}");
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut query = vec![("pageSize".to_string(), RECORD_PAGE_SIZE.to_string())];
            if let Some(token) = &offset {
                query.push(("offset".to_string(), token.clone()));
            }
            let page: RecordsResponse = self.http().get_request(&path, &query).await?;
            records.extend(page.records);
            match page.offset {
                Some(token) => offset = Some(token),
                None => break,
            }
        }
        Ok(records)
    }

    /// Fetches the record-ID membership list of one view, in view order.
    /// Requests an empty field projection so only IDs cross the wire.
    pub async fn list_view_record_ids(
        &self,
        base_id: impl AsRef<str>,
        table_id: impl AsRef<str>,
        view_id: impl AsRef<str>,
    ) -> Result<Vec<String>> {
        let base_id = base_id.as_ref();
        let table_id = table_id.as_ref();
        let view_id = view_id.as_ref();
        self.validate_id(base_id, "base_id")?;
        self.validate_id(table_id, "table_id")?;
        self.validate_id(view_id, "view_id")?;

        let path = format!("/v0/{base_id}/{table_id}");
        let mut ids = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut query = vec![
                ("pageSize".to_string(), RECORD_PAGE_SIZE.to_string()),
                ("view".to_string(), view_id.to_string()),
                // empty projection: the API returns records with no fields map
                ("fields[]".to_string(), String::new()),
            ];
            if let Some(token) = &offset {
                query.push(("offset".to_string(), token.clone()));
            }
            let page: RecordIdsResponse = self.http().get_request(&path, &query).await?;
            ids.extend(page.records.into_iter().map(|r| r.id));
            match page.offset {
                Some(token) => offset = Some(token),
                None => break,
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_with_dynamic_fields() {
        let json = r#"{
            "id": "rec001",
            "createdTime": "2024-03-01T10:30:00.000Z",
            "fields": {
                "Name": "Widget",
                "Count": 3,
                "Done": true,
                "Tags": ["a", "b"]
            }
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "rec001");
        assert_eq!(record.field("Count"), Some(&serde_json::json!(3)));
        assert_eq!(record.created_time.format("%Y").to_string(), "2024");
    }

    #[test]
    fn record_with_no_fields_deserializes() {
        // empty-projection membership responses omit the fields map
        let json = r#"{"id": "rec002", "createdTime": "2024-03-01T10:30:00.000Z"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert!(record.fields.is_empty());
    }

    #[test]
    fn records_page_carries_continuation_token() {
        let json = r#"{
            "records": [{"id": "rec001", "createdTime": "2024-03-01T10:30:00.000Z"}],
            "offset": "itrXYZ/rec001"
        }"#;
        let page: RecordsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.offset.as_deref(), Some("itrXYZ/rec001"));
    }
}
