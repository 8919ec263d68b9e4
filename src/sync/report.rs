//! Per-run counters.

use std::fmt;

/// What one sync run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tuners that answered discovery with a usable identity.
    pub tuners_discovered: usize,
    /// Tuners whose discovery or storage listing failed.
    pub tuner_failures: usize,
    /// Recording groups already seen on another tuner this run.
    pub duplicate_groups: usize,
    /// Recording groups whose episode listing failed.
    pub group_failures: usize,
    /// Recordings skipped because their category has no library root.
    pub unconfigured: usize,
    /// Recordings skipped because the tuner is still writing them.
    pub still_recording: usize,
    /// Recordings skipped because they could not be placed in the library.
    pub unplaceable: usize,
    /// Recordings whose live episode is already complete.
    pub already_downloaded: usize,
    pub queued: usize,
    pub downloaded: usize,
    /// Jobs whose transfer failed; retried next run.
    pub download_failures: usize,
    pub deleted: usize,
    /// Remote deletes that hit a transport error; retried next run.
    pub delete_failures: usize,
    pub artwork_fetched: usize,
    pub artwork_failures: usize,
    /// The run stopped early on the interrupt flag.
    pub interrupted: bool,
}

impl SyncReport {
    /// True when any branch of the run failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.tuner_failures
            + self.group_failures
            + self.download_failures
            + self.delete_failures
            + self.artwork_failures
            > 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tuner(s), {} queued, {} downloaded, {} deleted",
            self.tuners_discovered, self.queued, self.downloaded, self.deleted
        )?;
        if self.has_failures() {
            write!(
                f,
                ", failures: {} tuner, {} group, {} download, {} delete, {} artwork",
                self.tuner_failures,
                self.group_failures,
                self.download_failures,
                self.delete_failures,
                self.artwork_failures
            )?;
        }
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}
