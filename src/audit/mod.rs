use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument};

mod entry;
mod error;
mod filter;
#[cfg(test)]
mod tests;

pub use entry::{AuditEntry, AuditEntryBuilder};
pub use error::Error;
pub use filter::AuditFilter;

/// Append-only, process-wide collection of audit entries.
///
/// Entries are never evicted: the store grows for as long as the process runs.
/// Listings are sorted by timestamp, most recent first; entries sharing a timestamp are
/// listed in reverse append order.
#[derive(Debug, Default)]
pub struct AuditStore {
    entries: RwLock<Vec<Arc<AuditEntry>>>,
}

impl AuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: AuditEntry) {
        info!(
            "Audit entry logged: {} by {} at {}",
            entry.action(),
            entry.user_name().unwrap_or("Anonymous"),
            entry.timestamp()
        );

        debug!("Storing audit entry {}", entry.id());
        let entry = Arc::new(entry);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn try_append(&self, entry: Option<AuditEntry>) -> Result<(), Error> {
        let entry = entry
            .ok_or_else(|| Error::InvalidArgument("audit entry is required".to_string()))?;
        self.append(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list_all(&self) -> Vec<Arc<AuditEntry>> {
        self.select(|_| true)
    }

    /// Entries with `from <= timestamp <= to`.
    #[instrument(skip(self))]
    pub fn list_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<Arc<AuditEntry>> {
        self.select(|entry| entry.timestamp() >= from && entry.timestamp() <= to)
    }

    #[instrument(skip(self))]
    pub fn list_by_user(&self, user_id: Option<&str>) -> Result<Vec<Arc<AuditEntry>>, Error> {
        let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) else {
            return Err(Error::InvalidArgument(
                "user id cannot be null or empty".to_string(),
            ));
        };

        Ok(self.select(|entry| entry.user_id() == Some(user_id)))
    }

    fn select<F>(&self, predicate: F) -> Vec<Arc<AuditEntry>>
    where
        F: Fn(&AuditEntry) -> bool,
    {
        let mut selected: Vec<(usize, Arc<AuditEntry>)> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .enumerate()
            .filter(|(_, entry)| predicate(Arc::as_ref(entry)))
            .map(|(sequence, entry)| (sequence, Arc::clone(entry)))
            .collect();

        selected.sort_by(|(a_sequence, a), (b_sequence, b)| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then(b_sequence.cmp(a_sequence))
        });

        debug!("Selected {} audit entries", selected.len());
        selected.into_iter().map(|(_, entry)| entry).collect()
    }
}
