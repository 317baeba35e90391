//! Pluggable note store.
//!
//! The importer writes through the [`Vault`] trait so it can target a
//! real directory ([`FsVault`]) or the in-memory store in
//! [`crate::test_util`]. Paths are store-relative, `/`-separated, and
//! already sanitized by the caller.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use tracing::debug;

use airtable_api::schema::FieldType;

/// Destination file store for imported notes.
pub trait Vault: Send + Sync {
    /// Reads a file, or returns None if it doesn't exist.
    fn read(&self, path: &str) -> Result<Option<String>>;

    /// Writes (or overwrites) a text file. Parent folders must exist.
    fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Writes (or overwrites) a binary file. Parent folders must exist.
    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Whether a file exists at the path.
    fn exists(&self, path: &str) -> bool;

    /// Creates a folder, including missing parents. Existing folders are
    /// not an error.
    fn mkdir(&self, path: &str) -> Result<()>;

    /// Registers a frontmatter property type with the host's type
    /// registry. First writer wins: re-registration of an already-typed
    /// property is a no-op.
    fn register_property_type(&self, name: &str, property_type: &str) -> Result<()>;
}

/// The frontmatter property type a field maps to, or None when the host
/// should infer it (formula-backed fields, in particular, carry whatever
/// type their expression produces).
pub fn property_type_for_field(field_type: FieldType) -> Option<&'static str> {
    use FieldType::{
        AutoNumber, Checkbox, CreatedTime, Currency, Date, DateTime, Duration, Email,
        LastModifiedTime, MultilineText, MultipleCollaborators, MultipleRecordLinks,
        MultipleSelects, Number, Percent, PhoneNumber, Rating, RichText, SingleLineText,
        SingleSelect, Url,
    };
    match field_type {
        Checkbox => Some("checkbox"),
        MultipleSelects | MultipleCollaborators | MultipleRecordLinks => Some("multitext"),
        Number | Currency | Percent | Duration | Rating | AutoNumber => Some("number"),
        Date => Some("date"),
        DateTime | CreatedTime | LastModifiedTime => Some("datetime"),
        SingleLineText | MultilineText | RichText | Email | Url | PhoneNumber | SingleSelect => {
            Some("text")
        }
        _ => None,
    }
}

/// A vault rooted at a directory on the local filesystem.
pub struct FsVault {
    root: PathBuf,
    // the real host keeps this registry in its own metadata store; a
    // plain directory has nowhere durable to put it
    property_types: Mutex<BTreeMap<String, String>>,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            property_types: Mutex::new(BTreeMap::new()),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() || Path::new(path).components().any(|c| {
            matches!(
                c,
                std::path::Component::ParentDir | std::path::Component::RootDir
            )
        }) {
            bail!("invalid vault path {path:?}");
        }
        Ok(self.root.join(path))
    }

    /// The property types registered during this run.
    pub fn registered_property_types(&self) -> BTreeMap<String, String> {
        self.property_types.lock().unwrap().clone()
    }
}

impl Vault for FsVault {
    fn read(&self, path: &str) -> Result<Option<String>> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {path}")),
        }
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::write(&full, content).with_context(|| format!("writing {path}"))
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        fs::write(&full, bytes).with_context(|| format!("writing {path}"))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|full| full.exists())
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).with_context(|| format!("creating folder {path}"))
    }

    fn register_property_type(&self, name: &str, property_type: &str) -> Result<()> {
        let mut types = self.property_types.lock().unwrap();
        if !types.contains_key(name) {
            debug!(name, property_type, "registering property type");
            types.insert(name.to_string(), property_type.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_vault_reads_back_what_it_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path());
        vault.mkdir("Projects").unwrap();
        vault.write("Projects/Widget.md", "content\n").unwrap();
        assert!(vault.exists("Projects/Widget.md"));
        assert_eq!(
            vault.read("Projects/Widget.md").unwrap().as_deref(),
            Some("content\n")
        );
        assert_eq!(vault.read("Projects/Missing.md").unwrap(), None);
    }

    #[test]
    fn fs_vault_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path());
        assert!(vault.read("../outside.md").is_err());
        assert!(vault.write("a/../../outside.md", "x").is_err());
        assert!(!vault.exists("../outside.md"));
    }

    #[test]
    fn property_type_registration_is_first_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FsVault::new(dir.path());
        vault.register_property_type("Done", "checkbox").unwrap();
        vault.register_property_type("Done", "text").unwrap();
        assert_eq!(
            vault.registered_property_types().get("Done").map(String::as_str),
            Some("checkbox")
        );
    }

    #[test]
    fn formula_backed_fields_have_no_static_property_type() {
        assert_eq!(property_type_for_field(FieldType::Checkbox), Some("checkbox"));
        assert_eq!(
            property_type_for_field(FieldType::MultipleSelects),
            Some("multitext")
        );
        assert_eq!(property_type_for_field(FieldType::Formula), None);
        assert_eq!(property_type_for_field(FieldType::Rollup), None);
        assert_eq!(property_type_for_field(FieldType::Count), None);
    }
}
