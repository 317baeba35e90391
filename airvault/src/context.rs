//! Host-side progress reporting and cancellation.

/// Write-only sink for import progress, plus the cooperative
/// cancellation flag. The importer never inspects return values; a host
/// that doesn't care about an event can ignore it.
pub trait ImportContext {
    /// Coarse status line ("Fetching Projects...").
    fn status(&self, message: &str);

    /// Polled at the top of every table, view, and record loop. Once
    /// true, in-flight requests finish but nothing new starts.
    fn is_cancelled(&self) -> bool;

    fn report_progress(&self, current: usize, total: usize);

    fn report_note_success(&self, name: &str);

    /// Benign no-op (empty record, incremental duplicate).
    fn report_skipped(&self, name: &str, reason: &str);

    /// Unexpected per-record or per-table error.
    fn report_failed(&self, name: &str, reason: &str);
}
