//! # Airtable table schemas
//!
//! Typed models for the metadata API's per-base table listing:
//! tables, field schemas (with a closed [`FieldType`] enum), and views.
//!
//! - [`base_schema`](crate::client::AirtableClient::base_schema) - fetch all table schemas for a base
//!
//! Schemas are immutable once fetched; converters treat them as read-only.

use serde::{Deserialize, Serialize};

use crate::{Result, client::AirtableClient};

/// Airtable field (column) types.
///
/// Closed enum covering the types the Web API documents; anything the
/// API adds later deserializes as `Unknown` rather than failing.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FieldType {
    #[default]
    SingleLineText,
    MultilineText,
    RichText,
    Email,
    Url,
    PhoneNumber,
    SingleSelect,
    MultipleSelects,
    SingleCollaborator,
    MultipleCollaborators,
    Number,
    Currency,
    Percent,
    Duration,
    Rating,
    AutoNumber,
    Checkbox,
    Date,
    DateTime,
    CreatedTime,
    LastModifiedTime,
    CreatedBy,
    LastModifiedBy,
    Barcode,
    Button,
    Formula,
    Rollup,
    Count,
    MultipleLookupValues,
    MultipleRecordLinks,
    MultipleAttachments,
    AiText,
    ExternalSyncSource,
    /// Catch-all for field types this client doesn't know about
    #[serde(other)]
    Unknown,
}

/// One select choice, for `singleSelect`/`multipleSelects` fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectChoice {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

/// The result type of a formula/rollup/lookup field, nested in options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldResult {
    #[serde(rename = "type")]
    pub result_type: FieldType,
}

/// Type-dependent field options. Only the option keys the converters
/// consume are modeled; everything else is ignored on deserialization.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    /// Formula expression (formula fields)
    pub formula: Option<String>,

    /// Result type of a formula, rollup, or lookup field
    pub result: Option<FieldResult>,

    /// The link field this rollup/lookup reads through
    pub record_link_field_id: Option<String>,

    /// The field in the linked table a rollup aggregates
    pub field_id_in_linked_table: Option<String>,

    /// Table a link field points at
    pub linked_table_id: Option<String>,

    /// Select choices
    #[serde(default)]
    pub choices: Vec<SelectChoice>,
}

/// Describes one column of a table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldSchema {
    /// Field identifier ("fld...")
    pub id: String,
    /// Display name of the field
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Type-dependent options
    pub options: Option<FieldOptions>,
}

/// View layouts reported by the metadata API.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ViewType {
    Grid,
    Gallery,
    List,
    Kanban,
    Calendar,
    Form,
    Timeline,
    Block,
    Levels,
    #[serde(other)]
    Unknown,
}

impl ViewType {
    /// Whether record membership can be fetched for this view layout.
    /// Form and similar layouts don't hold a meaningful record set.
    pub fn supports_record_listing(self) -> bool {
        matches!(self, Self::Grid | Self::Gallery | Self::List)
    }
}

/// One view defined on a table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct View {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: ViewType,
}

/// Full schema of one table: fields and views.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    pub primary_field_id: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub views: Vec<View>,
}

impl Table {
    /// Builds the field-id → field-name map used by formula conversion.
    pub fn field_id_names(&self) -> std::collections::HashMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.id.clone(), f.name.clone()))
            .collect()
    }

    /// The primary field schema, if the schema names one.
    pub fn primary_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == self.primary_field_id)
    }
}

// ============================================================================
// RESPONSE TYPES (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TablesResponse {
    tables: Vec<Table>,
}

// ============================================================================
// AIRTABLECLIENT METHODS
// ============================================================================

impl AirtableClient {
    /// Fetches the full schema (fields and views) for every table in a base.
    pub async fn base_schema(&self, base_id: impl AsRef<str>) -> Result<Vec<Table>> {
        let base_id = base_id.as_ref();
        self.validate_id(base_id, "base_id")?;
        let response: TablesResponse = self
            .http()
            .get_request(&format!("/v0/meta/bases/{base_id}/tables"), &[])
            .await?;
        Ok(response.tables)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_deserializes_camel_case() {
        let ty: FieldType = serde_json::from_str("\"multipleRecordLinks\"").unwrap();
        assert_eq!(ty, FieldType::MultipleRecordLinks);
        let ty: FieldType = serde_json::from_str("\"aiText\"").unwrap();
        assert_eq!(ty, FieldType::AiText);
    }

    #[test]
    fn unknown_field_type_does_not_fail() {
        let ty: FieldType = serde_json::from_str("\"someFutureType\"").unwrap();
        assert_eq!(ty, FieldType::Unknown);
    }

    #[test]
    fn table_schema_deserializes() {
        let json = serde_json::json!({
            "id": "tbl123",
            "name": "Projects",
            "primaryFieldId": "fld001",
            "fields": [
                {"id": "fld001", "name": "Name", "type": "singleLineText"},
                {"id": "fld002", "name": "Total", "type": "formula",
                 "options": {"formula": "{fld003}+1", "result": {"type": "number"}}},
                {"id": "fld003", "name": "Hours", "type": "number", "options": {"precision": 0}}
            ],
            "views": [
                {"id": "viw001", "name": "All", "type": "grid"},
                {"id": "viw002", "name": "Board", "type": "kanban"}
            ]
        });
        let table: Table = serde_json::from_value(json).unwrap();
        assert_eq!(table.fields.len(), 3);
        assert_eq!(table.fields[1].field_type, FieldType::Formula);
        let options = table.fields[1].options.as_ref().unwrap();
        assert_eq!(options.formula.as_deref(), Some("{fld003}+1"));
        assert_eq!(
            options.result.as_ref().unwrap().result_type,
            FieldType::Number
        );
        assert_eq!(table.primary_field().unwrap().name, "Name");
        assert!(table.views[0].view_type.supports_record_listing());
        assert!(!table.views[1].view_type.supports_record_listing());

        let names = table.field_id_names();
        assert_eq!(names.get("fld003").map(String::as_str), Some("Hours"));
    }
}
