use crate::error::RedirectError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One active redirection. Created once, never changed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RedirectionRecord {
    source: String,
    destination: String,
    source_address: usize,
    destination_address: usize,
    sequence: usize,
}

impl RedirectionRecord {
    /// Create a record, addresses unknown.
    #[must_use]
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            source_address: 0,
            destination_address: 0,
            sequence: 0,
        }
    }

    /// Attach the entry addresses the jump was written between.
    #[must_use]
    pub fn with_addresses(mut self, source_address: usize, destination_address: usize) -> Self {
        self.source_address = source_address;
        self.destination_address = destination_address;
        self
    }

    /// Identity of the redirected function.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identity of the function that now runs instead.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn source_address(&self) -> usize {
        self.source_address
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn destination_address(&self) -> usize {
        self.destination_address
    }

    /// Position in registration order.
    #[must_use]
    pub fn sequence(&self) -> usize {
        self.sequence
    }
}

/// Maps a source identity to the destination it was redirected to.
///
/// Append-only: a source is redirected at most once for the lifetime of the registry,
/// matching the single jump target its entry bytes can encode.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    records: DashMap<String, RedirectionRecord>,
    sequence: AtomicUsize,
}

impl FunctionRegistry {
    /// Record `record` unless its source is already redirected.
    pub fn register(
        &self,
        mut record: RedirectionRecord,
    ) -> Result<RedirectionRecord, RedirectError> {
        match self.records.entry(record.source.clone()) {
            Entry::Occupied(existing) => Err(RedirectError::AlreadyRedirected {
                source: record.source,
                existing: existing.get().destination.clone(),
            }),
            Entry::Vacant(vacant) => {
                record.sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
                _ = vacant.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// The destination `source` was redirected to.
    #[must_use]
    pub fn lookup(&self, source: &str) -> Option<String> {
        self.records
            .get(source)
            .map(|record| record.destination.clone())
    }

    /// The full record of `source`.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<RedirectionRecord> {
        self.records.get(source).map(|record| record.clone())
    }

    /// All records, in registration order.
    #[must_use]
    pub fn enumerate(&self) -> Vec<RedirectionRecord> {
        let mut records: Vec<RedirectionRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(RedirectionRecord::sequence);
        records
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_once() {
        let registry = FunctionRegistry::default();
        assert!(registry.is_empty());
        let record = registry
            .register(RedirectionRecord::new("A.F", "B.F").with_addresses(0x10, 0x20))
            .unwrap();
        assert_eq!(0, record.sequence());
        assert_eq!(Some("B.F".to_string()), registry.lookup("A.F"));

        let error = registry
            .register(RedirectionRecord::new("A.F", "C.F"))
            .unwrap_err();
        assert!(matches!(
            error,
            RedirectError::AlreadyRedirected { ref existing, .. } if existing == "B.F"
        ));
        assert_eq!(Some("B.F".to_string()), registry.lookup("A.F"));
        assert_eq!(Some(0x10), registry.get("A.F").map(|r| r.source_address()));
        assert_eq!(None, registry.lookup("A.G"));
    }

    #[test]
    fn enumerate_in_registration_order() {
        let registry = FunctionRegistry::default();
        for name in ["Z.F", "A.F", "M.F"] {
            _ = registry
                .register(RedirectionRecord::new(name, "Patch.F"))
                .unwrap();
        }
        let sources: Vec<String> = registry
            .enumerate()
            .iter()
            .map(|r| r.source().to_string())
            .collect();
        assert_eq!(vec!["Z.F", "A.F", "M.F"], sources);
        assert_eq!(3, registry.len());
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let registry = std::sync::Arc::new(FunctionRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .register(RedirectionRecord::new("A.F", format!("P{i}.F")))
                        .is_ok()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(1, winners);
        assert_eq!(1, registry.len());
    }
}
