//! `.base` view-definition files.
//!
//! Each imported table gets one YAML `.base` file next to its folder:
//! a folder-restricting filter, one view per supported table view, and
//! the live formula columns that were converted instead of frozen into
//! frontmatter. Writes are merge-on-write so a re-import doesn't clobber
//! views the user added by hand.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use airtable_api::schema::{Table, ViewType};

/// Layouts a view definition can use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BaseViewKind {
    Table,
    Cards,
    List,
}

/// The layout an Airtable view maps to, or None for layouts (kanban,
/// calendar, form, ...) that have no equivalent and are skipped.
pub fn layout_for_view(view_type: ViewType) -> Option<BaseViewKind> {
    match view_type {
        ViewType::Grid => Some(BaseViewKind::Table),
        ViewType::Gallery => Some(BaseViewKind::Cards),
        ViewType::List => Some(BaseViewKind::List),
        _ => None,
    }
}

/// One view inside a `.base` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseView {
    #[serde(rename = "type")]
    pub kind: BaseViewKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<String>,
}

/// A full `.base` view-definition file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub formulas: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<BaseView>,
}

impl BaseFile {
    /// Builds the definition for one table: every supported view in
    /// schema order, column order following the field order, plus the
    /// converted live formula columns.
    pub fn for_table(table: &Table, folder: &str, formulas: IndexMap<String, String>) -> Self {
        let order: Vec<String> = table.fields.iter().map(|f| f.name.clone()).collect();
        let views = table
            .views
            .iter()
            .filter_map(|view| {
                layout_for_view(view.view_type).map(|kind| BaseView {
                    kind,
                    name: view.name.clone(),
                    filters: None,
                    order: order.clone(),
                })
            })
            .collect();
        BaseFile {
            filters: Some(format!("file.inFolder(\"{folder}\")")),
            formulas,
            views,
        }
    }

    /// Merges `self` (the freshly generated definition) over an existing
    /// file: views are keyed by name and new definitions win on conflict,
    /// while existing views and formulas with no new counterpart survive.
    pub fn merge_into(self, existing: BaseFile) -> BaseFile {
        let mut views = self.views;
        for old in existing.views {
            if !views.iter().any(|v| v.name == old.name) {
                views.push(old);
            }
        }
        let mut formulas = self.formulas;
        for (name, expr) in existing.formulas {
            formulas.entry(name).or_insert(expr);
        }
        BaseFile {
            filters: self.filters.or(existing.filters),
            formulas,
            views,
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serializing base file")
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parsing base file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airtable_api::schema::{FieldSchema, FieldType, View};

    fn table() -> Table {
        Table {
            id: "tbl1".to_string(),
            name: "Projects".to_string(),
            primary_field_id: "fld1".to_string(),
            fields: vec![
                FieldSchema {
                    id: "fld1".to_string(),
                    name: "Name".to_string(),
                    field_type: FieldType::SingleLineText,
                    options: None,
                },
                FieldSchema {
                    id: "fld2".to_string(),
                    name: "Done".to_string(),
                    field_type: FieldType::Checkbox,
                    options: None,
                },
            ],
            views: vec![
                View {
                    id: "viw1".to_string(),
                    name: "All".to_string(),
                    view_type: ViewType::Grid,
                },
                View {
                    id: "viw2".to_string(),
                    name: "Board".to_string(),
                    view_type: ViewType::Kanban,
                },
                View {
                    id: "viw3".to_string(),
                    name: "Cards".to_string(),
                    view_type: ViewType::Gallery,
                },
            ],
        }
    }

    #[test]
    fn unsupported_layouts_are_skipped() {
        let base = BaseFile::for_table(&table(), "Import/Projects", IndexMap::new());
        assert_eq!(base.views.len(), 2);
        assert_eq!(base.views[0].kind, BaseViewKind::Table);
        assert_eq!(base.views[1].kind, BaseViewKind::Cards);
        assert_eq!(
            base.filters.as_deref(),
            Some("file.inFolder(\"Import/Projects\")")
        );
        assert_eq!(base.views[0].order, vec!["Name", "Done"]);
    }

    #[test]
    fn merge_prefers_new_views_and_keeps_unrelated_ones() {
        let mut existing = BaseFile::for_table(&table(), "Import/Projects", IndexMap::new());
        existing.views[0].order = vec!["Old".to_string()];
        existing.views.push(BaseView {
            kind: BaseViewKind::List,
            name: "Hand-made".to_string(),
            filters: Some("note[\"Done\"] == true".to_string()),
            order: vec![],
        });

        let fresh = BaseFile::for_table(&table(), "Import/Projects", IndexMap::new());
        let merged = fresh.merge_into(existing);

        assert_eq!(merged.views.len(), 3);
        let all = merged.views.iter().find(|v| v.name == "All").unwrap();
        assert_eq!(all.order, vec!["Name", "Done"]);
        assert!(merged.views.iter().any(|v| v.name == "Hand-made"));
    }

    #[test]
    fn yaml_round_trips_with_formulas() {
        let mut formulas = IndexMap::new();
        formulas.insert("Total".to_string(), "(note[\"A\"] + note[\"B\"])".to_string());
        let base = BaseFile::for_table(&table(), "Import/Projects", formulas);
        let yaml = base.to_yaml().unwrap();
        assert!(yaml.contains("type: table"));
        assert_eq!(BaseFile::from_yaml(&yaml).unwrap(), base);
    }
}
