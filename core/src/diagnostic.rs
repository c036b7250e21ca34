use crate::common::constants::UNFLUSHED_GROUP;
use crate::{info, warn};
use std::fmt::Write;
use std::sync::Mutex;

/// Buffers successful redirections of one discovery pass and reports them as a single message.
///
/// Outside a group every redirection is reported on its own.
#[derive(Debug, Default)]
pub struct DiagnosticBatcher {
    batch: Mutex<Option<Vec<(String, String)>>>,
}

impl DiagnosticBatcher {
    /// Start accumulating into a fresh batch.
    ///
    /// A group that is still open is reported first, so its pairs never show up in the new one.
    /// Returns that report, if there was anything to report.
    pub fn begin_group(&self) -> Option<String> {
        let stale = self
            .batch
            .lock()
            .expect("lock failed")
            .replace(Vec::new())?;
        if stale.is_empty() {
            return None;
        }
        warn!(
            "a new group began before the previous one was flushed, reporting {} redirection(s)",
            stale.len()
        );
        Some(Self::report(UNFLUSHED_GROUP, &stale))
    }

    /// Append a redirection to the open group, or report it right away if there is none.
    pub fn record(&self, source: &str, destination: &str) {
        let mut batch = self.batch.lock().expect("lock failed");
        if let Some(batch) = batch.as_mut() {
            batch.push((source.to_string(), destination.to_string()));
            return;
        }
        info!("redirected {} -> {}", source, destination);
    }

    /// Close the group and report its redirections in order.
    ///
    /// Returns the emitted message, `None` if the group was empty.
    pub fn flush_group(&self, label: &str) -> Option<String> {
        let pairs = self.batch.lock().expect("lock failed").take()?;
        if pairs.is_empty() {
            return None;
        }
        Some(Self::report(label, &pairs))
    }

    fn report(label: &str, pairs: &[(String, String)]) -> String {
        let mut message = format!("{label}: redirected {} function(s)", pairs.len());
        for (source, destination) in pairs {
            _ = write!(message, "\n    {source} -> {destination}");
        }
        info!("{}", message);
        message
    }

    /// Returns `true` while a group is open.
    #[must_use]
    pub fn is_grouping(&self) -> bool {
        self.batch.lock().expect("lock failed").is_some()
    }

    /// Number of redirections waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.batch
            .lock()
            .expect("lock failed")
            .as_ref()
            .map_or(0, Vec::len)
    }

    /// Open a group that is flushed under `label` when the returned guard drops,
    /// early returns and panics included.
    pub fn group(&self, label: impl Into<String>) -> GroupGuard<'_> {
        _ = self.begin_group();
        GroupGuard {
            batcher: self,
            label: label.into(),
        }
    }
}

/// Flushes its group on drop, see [`DiagnosticBatcher::group`].
#[derive(Debug)]
pub struct GroupGuard<'g> {
    batcher: &'g DiagnosticBatcher,
    label: String,
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        _ = self.batcher.flush_group(&self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_lists_pairs_in_order() {
        let batcher = DiagnosticBatcher::default();
        _ = batcher.begin_group();
        batcher.record("Window.Draw()", "PatchedWindow.Draw()");
        batcher.record("Window.Close()", "PatchedWindow.Close()");
        assert_eq!(2, batcher.pending());
        assert_eq!(
            Some(
                "ui: redirected 2 function(s)\n    Window.Draw() -> PatchedWindow.Draw()\n    \
                 Window.Close() -> PatchedWindow.Close()"
                    .to_string()
            ),
            batcher.flush_group("ui")
        );
        assert!(!batcher.is_grouping());
        assert_eq!(None, batcher.flush_group("ui"));
    }

    #[test]
    fn empty_group_emits_nothing() {
        let batcher = DiagnosticBatcher::default();
        _ = batcher.begin_group();
        assert_eq!(None, batcher.flush_group("empty"));
        assert!(!batcher.is_grouping());
    }

    #[test]
    fn ungrouped_records_are_not_buffered() {
        let batcher = DiagnosticBatcher::default();
        batcher.record("A.F", "B.F");
        assert_eq!(0, batcher.pending());
        assert!(!batcher.is_grouping());
    }

    #[test]
    fn new_group_starts_empty() {
        let batcher = DiagnosticBatcher::default();
        assert_eq!(None, batcher.begin_group());
        batcher.record("Stale.A", "X.A");
        assert_eq!(
            Some(format!("{UNFLUSHED_GROUP}: redirected 1 function(s)\n    Stale.A -> X.A")),
            batcher.begin_group()
        );
        assert_eq!(0, batcher.pending());
        batcher.record("Fresh.B", "X.B");
        assert_eq!(
            Some("second: redirected 1 function(s)\n    Fresh.B -> X.B".to_string()),
            batcher.flush_group("second")
        );
    }

    #[test]
    fn guard_flushes_on_drop() {
        let batcher = DiagnosticBatcher::default();
        {
            let _group = batcher.group("scoped");
            batcher.record("A.F", "B.F");
            assert!(batcher.is_grouping());
        }
        assert!(!batcher.is_grouping());
        assert_eq!(0, batcher.pending());
    }
}
