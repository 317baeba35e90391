//! In-memory doubles for the vault and the import context, used by unit
//! and integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::context::ImportContext;
use crate::vault::Vault;

/// A [`Vault`] backed by maps.
#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<String, String>>,
    binaries: Mutex<BTreeMap<String, Vec<u8>>>,
    folders: Mutex<BTreeSet<String>>,
    property_types: Mutex<BTreeMap<String, String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn folders(&self) -> Vec<String> {
        self.folders.lock().unwrap().iter().cloned().collect()
    }

    pub fn property_type(&self, name: &str) -> Option<String> {
        self.property_types.lock().unwrap().get(name).cloned()
    }

    /// Seeds a file, for pre-existing-vault scenarios.
    pub fn seed(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }
}

impl Vault for MemoryVault {
    fn read(&self, path: &str) -> Result<Option<String>> {
        Ok(self.file(path))
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        self.seed(path, content);
        Ok(())
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.binaries
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
            || self.binaries.lock().unwrap().contains_key(path)
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        self.folders.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    fn register_property_type(&self, name: &str, property_type: &str) -> Result<()> {
        self.property_types
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| property_type.to_string());
        Ok(())
    }
}

/// One reported import event, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    Status(String),
    Progress(usize, usize),
    Success(String),
    Skipped(String, String),
    Failed(String, String),
}

/// An [`ImportContext`] that records every event and exposes a settable
/// cancellation flag.
#[derive(Default)]
pub struct CollectingContext {
    events: Mutex<Vec<ImportEvent>>,
    cancelled: AtomicBool,
}

impl CollectingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<ImportEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ImportEvent::Success(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ImportEvent::Skipped(name, reason) => Some((name, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ImportEvent::Failed(name, reason) => Some((name, reason)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ImportEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ImportContext for CollectingContext {
    fn status(&self, message: &str) {
        self.push(ImportEvent::Status(message.to_string()));
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn report_progress(&self, current: usize, total: usize) {
        self.push(ImportEvent::Progress(current, total));
    }

    fn report_note_success(&self, name: &str) {
        self.push(ImportEvent::Success(name.to_string()));
    }

    fn report_skipped(&self, name: &str, reason: &str) {
        self.push(ImportEvent::Skipped(name.to_string(), reason.to_string()));
    }

    fn report_failed(&self, name: &str, reason: &str) {
        self.push(ImportEvent::Failed(name.to_string(), reason.to_string()));
    }
}
