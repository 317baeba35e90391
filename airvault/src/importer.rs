//! # Two-phase import orchestrator
//!
//! Phase 1 fetches everything (schema, records, per-view memberships)
//! into immutable [`PreparedTableData`] snapshots, one per selected
//! table; Phase 2 writes files from the snapshots and touches the
//! network not at all. Keeping the phases separate means a mid-run fetch
//! failure can never leave a table half-written, and Phase 2 is fully
//! testable against an in-memory vault.
//!
//! All state lives in the one importer instance; awaits are sequential,
//! so there is no locking here.

use std::collections::{HashMap, HashSet};

use anyhow::{Context as _, Result, anyhow, bail};
use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing::{debug, info};

use airtable_api::{
    client::AirtableClient,
    records::Record,
    schema::{FieldType, Table},
};

use crate::attachments::{AttachmentDescriptor, AttachmentPipeline};
use crate::basefile::BaseFile;
use crate::context::ImportContext;
use crate::fields::{ConvertContext, FormulaStrategy, convert_field_value, is_record_empty};
use crate::formula::convert_airtable_formula;
use crate::frontmatter::{self, Frontmatter, sanitize_file_name};
use crate::vault::{Vault, property_type_for_field};

/// One table the user selected for import. The selection tree UI is a
/// host concern; the importer takes the flattened result.
#[derive(Debug, Clone)]
pub struct TableSelection {
    pub base_id: String,
    pub base_name: String,
    pub table_id: String,
}

/// Import run configuration.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Vault folder everything is written under.
    pub output_folder: String,
    /// Keep `airtable-id` markers and skip records already imported.
    pub incremental: bool,
    pub strategy: FormulaStrategy,
    /// Frontmatter key holding the view-membership references.
    pub view_property_key: String,
    /// Note body template; `{{Field Name}}` placeholders are replaced
    /// with the field's converted value. No template means empty bodies.
    pub body_template: Option<String>,
    pub tables: Vec<TableSelection>,
}

impl ImportOptions {
    pub fn new(output_folder: impl Into<String>) -> Self {
        Self {
            output_folder: output_folder.into(),
            incremental: false,
            strategy: FormulaStrategy::default(),
            view_property_key: "base".to_string(),
            body_template: None,
            tables: Vec::new(),
        }
    }
}

/// Everything Phase 1 learned about one table. Immutable once built.
#[derive(Debug, Clone)]
pub struct PreparedTableData {
    pub base_id: String,
    pub base_name: String,
    pub table: Table,
    pub records: Vec<Record>,
    /// Record id → `[[Table.base#View]]` references, one per view the
    /// record appears in.
    pub record_view_memberships: HashMap<String, Vec<String>>,
}

/// End-of-run counters. Skips are benign (empty records, incremental
/// duplicates) and reported separately from failures.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "imported {} notes ({} skipped, {} failed)",
            self.imported, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Clone)]
struct RecordPath {
    path: String,
    title: String,
}

enum RecordOutcome {
    Written(String),
    AlreadyImported,
}

/// The importer. Owns the run configuration; borrows the vault and the
/// attachment pipeline.
pub struct AirtableImporter<'a> {
    vault: &'a dyn Vault,
    attachments: &'a dyn AttachmentPipeline,
    options: ImportOptions,
}

impl<'a> AirtableImporter<'a> {
    pub fn new(
        vault: &'a dyn Vault,
        attachments: &'a dyn AttachmentPipeline,
        options: ImportOptions,
    ) -> Self {
        Self {
            vault,
            attachments,
            options,
        }
    }

    /// Runs a full import: validate, fetch, write.
    pub async fn run(
        &self,
        client: &AirtableClient,
        ctx: &dyn ImportContext,
    ) -> Result<ImportSummary> {
        self.validate()?;
        let prepared = self.fetch_phase(client, ctx).await;
        let summary = self.write_phase(&prepared, ctx)?;
        ctx.status(&summary.to_string());
        Ok(summary)
    }

    // surfaced before any network or file I/O begins
    fn validate(&self) -> Result<()> {
        if self.options.output_folder.trim().is_empty() {
            bail!("no output folder selected");
        }
        if self.options.tables.is_empty() {
            bail!("no tables selected for import");
        }
        Ok(())
    }

    /// Phase 1: fetch schema, records, and view memberships for every
    /// selected table. A table whose fetch fails is reported and dropped;
    /// the rest of the run proceeds.
    pub async fn fetch_phase(
        &self,
        client: &AirtableClient,
        ctx: &dyn ImportContext,
    ) -> Vec<PreparedTableData> {
        let mut schemas: HashMap<String, Vec<Table>> = HashMap::new();
        let mut prepared = Vec::new();

        for selection in &self.options.tables {
            if ctx.is_cancelled() {
                break;
            }
            match self.fetch_table(client, ctx, selection, &mut schemas).await {
                Ok(data) => prepared.push(data),
                Err(err) => {
                    ctx.report_failed(&selection.table_id, &format!("{err:#}"));
                }
            }
        }
        prepared
    }

    async fn fetch_table(
        &self,
        client: &AirtableClient,
        ctx: &dyn ImportContext,
        selection: &TableSelection,
        schemas: &mut HashMap<String, Vec<Table>>,
    ) -> Result<PreparedTableData> {
        if !schemas.contains_key(&selection.base_id) {
            ctx.status(&format!("Reading schema of {}", selection.base_name));
            let tables = client
                .base_schema(&selection.base_id)
                .await
                .with_context(|| format!("fetching schema of base {}", selection.base_name))?;
            schemas.insert(selection.base_id.clone(), tables);
        }
        let table = schemas[&selection.base_id]
            .iter()
            .find(|t| t.id == selection.table_id)
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "table {} not found in base {}",
                    selection.table_id,
                    selection.base_name
                )
            })?;

        ctx.status(&format!("Fetching records of {}", table.name));
        let records = client
            .list_records(&selection.base_id, &table.id)
            .await
            .with_context(|| format!("fetching records of {}", table.name))?;

        let mut record_view_memberships: HashMap<String, Vec<String>> = HashMap::new();
        let base_name = sanitize_file_name(&table.name);
        for view in &table.views {
            if ctx.is_cancelled() {
                break;
            }
            if !view.view_type.supports_record_listing() {
                continue;
            }
            let ids = client
                .list_view_record_ids(&selection.base_id, &table.id, &view.id)
                .await
                .with_context(|| format!("fetching view {} of {}", view.name, table.name))?;
            let reference = format!("[[{base_name}.base#{}]]", view.name);
            for id in ids {
                record_view_memberships
                    .entry(id)
                    .or_default()
                    .push(reference.clone());
            }
        }

        debug!(table = %table.name, records = records.len(), "table prepared");
        Ok(PreparedTableData {
            base_id: selection.base_id.clone(),
            base_name: selection.base_name.clone(),
            table,
            records,
            record_view_memberships,
        })
    }

    /// Phase 2: write folders, `.base` files, and notes from the
    /// prepared snapshots. Network-free, so tests drive it directly.
    pub fn write_phase(
        &self,
        prepared: &[PreparedTableData],
        ctx: &dyn ImportContext,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        // field ids resolve across the whole run so rollup targets in
        // linked tables are found too
        let mut field_names: HashMap<String, String> = HashMap::new();
        for table in prepared {
            field_names.extend(table.table.field_id_names());
        }

        // every record's output path, decided before anything is written,
        // so links between records resolve in a single pass
        let mut used_paths: HashSet<String> = HashSet::new();
        let mut record_paths: HashMap<String, RecordPath> = HashMap::new();
        for table in prepared {
            let folder = self.table_folder(&table.table.name);
            let primary = table.table.primary_field().map(|f| f.name.clone());
            for record in &table.records {
                let title = sanitize_file_name(&record_title(record, primary.as_deref()));
                let entry = claim_path(&folder, &title, &mut used_paths);
                record_paths.insert(record.id.clone(), entry);
            }
        }

        let cx = ConvertContext {
            strategy: self.options.strategy,
            field_names: &field_names,
        };
        let mut written: Vec<String> = Vec::new();

        if !prepared.is_empty() {
            self.vault.mkdir(&self.options.output_folder)?;
        }

        'tables: for table in prepared {
            if ctx.is_cancelled() {
                break;
            }
            let folder = self.table_folder(&table.table.name);
            if let Err(err) = self.prepare_table_outputs(table, &folder, &field_names) {
                // this table's notes can't land anywhere; the rest of
                // the run proceeds
                ctx.report_failed(&table.table.name, &format!("{err:#}"));
                summary.failed += 1;
                continue;
            }

            let total = table.records.len();
            ctx.status(&format!("Writing {total} notes for {}", table.table.name));
            for (index, record) in table.records.iter().enumerate() {
                if ctx.is_cancelled() {
                    break 'tables;
                }
                ctx.report_progress(index + 1, total);

                let title = record_paths[&record.id].title.clone();
                if is_record_empty(&record.fields) {
                    ctx.report_skipped(&title, "record has no content");
                    summary.skipped += 1;
                    continue;
                }

                match self.write_record(table, record, &cx, &mut record_paths, &mut used_paths) {
                    Ok(RecordOutcome::Written(path)) => {
                        written.push(path);
                        ctx.report_note_success(&title);
                        summary.imported += 1;
                    }
                    Ok(RecordOutcome::AlreadyImported) => {
                        ctx.report_skipped(&title, "already imported");
                        summary.skipped += 1;
                    }
                    Err(err) => {
                        ctx.report_failed(&title, &format!("{err:#}"));
                        summary.failed += 1;
                    }
                }
            }
        }

        // full imports are meant to look hand-authored afterward, so the
        // id marker only survives incremental runs
        if !self.options.incremental {
            for path in &written {
                if let Some(content) = self.vault.read(path)? {
                    self.vault
                        .write(path, &frontmatter::strip_key(&content, "airtable-id")?)?;
                }
            }
        }

        info!(%summary, "import finished");
        Ok(summary)
    }

    // folder, merged `.base` file, and property types for one table
    fn prepare_table_outputs(
        &self,
        table: &PreparedTableData,
        folder: &str,
        field_names: &HashMap<String, String>,
    ) -> Result<()> {
        self.vault.mkdir(folder)?;
        self.write_base_file(table, folder, field_names)?;
        self.register_property_types(table)
    }

    fn table_folder(&self, table_name: &str) -> String {
        format!(
            "{}/{}",
            self.options.output_folder,
            sanitize_file_name(table_name)
        )
    }

    fn write_base_file(
        &self,
        table: &PreparedTableData,
        folder: &str,
        field_names: &HashMap<String, String>,
    ) -> Result<()> {
        let mut formulas = IndexMap::new();
        if self.options.strategy == FormulaStrategy::Hybrid {
            for field in &table.table.fields {
                let Some(expression) = field
                    .options
                    .as_ref()
                    .and_then(|o| o.formula.as_deref())
                else {
                    continue;
                };
                if let Some(converted) = convert_airtable_formula(expression, field_names) {
                    formulas.insert(field.name.clone(), converted);
                }
            }
        }

        let path = format!(
            "{}/{}.base",
            self.options.output_folder,
            sanitize_file_name(&table.table.name)
        );
        let fresh = BaseFile::for_table(&table.table, folder, formulas);
        let merged = match self.vault.read(&path)? {
            Some(existing) => fresh.merge_into(BaseFile::from_yaml(&existing)?),
            None => fresh,
        };
        self.vault.write(&path, &merged.to_yaml()?)
    }

    fn register_property_types(&self, table: &PreparedTableData) -> Result<()> {
        for field in &table.table.fields {
            if let Some(property_type) = property_type_for_field(field.field_type) {
                self.vault.register_property_type(&field.name, property_type)?;
            }
        }
        self.vault
            .register_property_type(&self.options.view_property_key, "multitext")
    }

    fn write_record(
        &self,
        table: &PreparedTableData,
        record: &Record,
        cx: &ConvertContext<'_>,
        record_paths: &mut HashMap<String, RecordPath>,
        used_paths: &mut HashSet<String>,
    ) -> Result<RecordOutcome> {
        let folder = self.table_folder(&table.table.name);
        let planned = record_paths[&record.id].clone();
        let Some(target) = self.settle_path(&record.id, &folder, &planned, used_paths)? else {
            return Ok(RecordOutcome::AlreadyImported);
        };
        if target.path != planned.path {
            // later records' links pick up the moved note
            record_paths.insert(record.id.clone(), target.clone());
        }

        let mut properties = Frontmatter::new();
        properties.insert("airtable-id".to_string(), json!(record.id));
        properties.insert(
            "airtable-created".to_string(),
            json!(record.created_time.to_rfc3339()),
        );
        if let Some(memberships) = table.record_view_memberships.get(&record.id)
            && !memberships.is_empty()
        {
            properties.insert(self.options.view_property_key.clone(), json!(memberships));
        }

        for field in &table.table.fields {
            let Some(value) = convert_field_value(record.field(&field.name), field, cx) else {
                continue;
            };
            let value = match field.field_type {
                FieldType::MultipleRecordLinks => resolve_record_links(&value, record_paths),
                FieldType::MultipleAttachments => self.resolve_attachments(&value),
                _ => value,
            };
            properties.insert(field.name.clone(), value);
        }

        let body = self.render_body(&properties);
        let content = frontmatter::compose(&properties, &body)?;
        self.vault.write(&target.path, &content)?;
        Ok(RecordOutcome::Written(target.path))
    }

    // Incremental mode: an existing file holding this record's id means
    // "already imported"; a file holding someone else's means the new
    // note moves to the next free suffixed path.
    fn settle_path(
        &self,
        record_id: &str,
        folder: &str,
        planned: &RecordPath,
        used_paths: &mut HashSet<String>,
    ) -> Result<Option<RecordPath>> {
        if !self.options.incremental {
            return Ok(Some(planned.clone()));
        }
        let mut current = planned.clone();
        let mut suffix = 0usize;
        loop {
            let Some(content) = self.vault.read(&current.path)? else {
                return Ok(Some(current));
            };
            let (map, _) = frontmatter::parse(&content)?;
            if map.get("airtable-id").and_then(|v| v.as_str()) == Some(record_id) {
                return Ok(None);
            }
            loop {
                suffix += 1;
                let title = format!("{} {suffix}", planned.title);
                let path = format!("{folder}/{title}.md");
                if used_paths.insert(path.clone()) {
                    current = RecordPath { path, title };
                    break;
                }
            }
        }
    }

    fn resolve_attachments(&self, value: &Value) -> Value {
        let Some(items) = value.as_array() else {
            return value.clone();
        };
        Value::Array(
            items
                .iter()
                .filter_map(AttachmentDescriptor::from_value)
                .map(|descriptor| json!(self.attachments.resolve(&descriptor).property_value()))
                .collect(),
        )
    }

    fn render_body(&self, properties: &Frontmatter) -> String {
        let Some(template) = &self.options.body_template else {
            return String::new();
        };
        let mut body = template.clone();
        for (name, value) in properties {
            let placeholder = format!("{{{{{name}}}}}");
            if body.contains(&placeholder) {
                body = body.replace(&placeholder, &template_value(value));
            }
        }
        body
    }
}

// linked-record ids become note links once the target's path is known;
// ids outside the run stay as raw ids
fn resolve_record_links(value: &Value, record_paths: &HashMap<String, RecordPath>) -> Value {
    let Some(items) = value.as_array() else {
        return value.clone();
    };
    Value::Array(
        items
            .iter()
            .map(|item| {
                let Some(id) = item.as_str() else {
                    return item.clone();
                };
                match record_paths.get(id) {
                    Some(entry) => json!(format!("[[{}]]", entry.title)),
                    None => item.clone(),
                }
            })
            .collect(),
    )
}

fn record_title(record: &Record, primary_field: Option<&str>) -> String {
    primary_field
        .and_then(|name| record.field(name))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| record.id.clone())
}

// in-run uniquification: " 1", " 2", ... suffixes within a folder
fn claim_path(folder: &str, title: &str, used_paths: &mut HashSet<String>) -> RecordPath {
    let mut candidate = title.to_string();
    let mut suffix = 0usize;
    loop {
        let path = format!("{folder}/{candidate}.md");
        if used_paths.insert(path.clone()) {
            return RecordPath {
                path,
                title: candidate,
            };
        }
        suffix += 1;
        candidate = format!("{title} {suffix}");
    }
}

fn template_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(template_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::RemoteAttachments;
    use crate::test_util::{CollectingContext, MemoryVault};

    #[test]
    fn paths_uniquify_within_a_folder() {
        let mut used = HashSet::new();
        let a = claim_path("Import/Projects", "Widget", &mut used);
        let b = claim_path("Import/Projects", "Widget", &mut used);
        let c = claim_path("Import/Projects", "Widget", &mut used);
        assert_eq!(a.path, "Import/Projects/Widget.md");
        assert_eq!(b.path, "Import/Projects/Widget 1.md");
        assert_eq!(c.path, "Import/Projects/Widget 2.md");
        assert_eq!(c.title, "Widget 2");
    }

    #[test]
    fn record_title_falls_back_to_the_record_id() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": "rec42",
            "createdTime": "2024-03-01T10:30:00.000Z",
            "fields": {"Name": "  "}
        }))
        .unwrap();
        assert_eq!(record_title(&record, Some("Name")), "rec42");
        assert_eq!(record_title(&record, None), "rec42");
    }

    #[test]
    fn validation_rejects_an_empty_selection() {
        let vault = MemoryVault::new();
        let importer =
            AirtableImporter::new(&vault, &RemoteAttachments, ImportOptions::new("Import"));
        assert!(importer.validate().is_err());

        let mut options = ImportOptions::new("   ");
        options.tables.push(TableSelection {
            base_id: "app1".to_string(),
            base_name: "Base".to_string(),
            table_id: "tbl1".to_string(),
        });
        let importer = AirtableImporter::new(&vault, &RemoteAttachments, options);
        assert!(importer.validate().is_err());
    }

    #[tokio::test]
    async fn run_validates_before_any_io() {
        let vault = MemoryVault::new();
        let ctx = CollectingContext::new();
        let client = AirtableClient::new("pat_test").unwrap();
        let importer =
            AirtableImporter::new(&vault, &RemoteAttachments, ImportOptions::new("Import"));
        assert!(importer.run(&client, &ctx).await.is_err());
        assert!(vault.file_paths().is_empty());
        assert!(ctx.events().is_empty());
    }
}
