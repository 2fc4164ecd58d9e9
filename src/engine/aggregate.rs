//! Run-wide aggregation of tagged reports.

use super::report::{Report, Severity};

/// A report together with the qualified name of the rule that produced
/// it. The origin is attached exactly once, by the runner, immediately
/// after the rule yields the report.
#[derive(Debug, Clone)]
pub struct TaggedReport {
    pub origin: &'static str,
    pub report: Report,
}

/// Append-only table of every tagged report recorded during one run,
/// bucketed by severity. Owned by the engine; a fresh engine (and thus a
/// fresh table) is constructed per analysis run.
#[derive(Default)]
pub struct AggregateTable {
    entries: Vec<TaggedReport>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: TaggedReport) {
        self.entries.push(entry);
    }

    /// Entries of one severity bucket, in recording order.
    pub fn bucket(&self, severity: Severity) -> impl Iterator<Item = &TaggedReport> {
        self.entries
            .iter()
            .filter(move |e| e.report.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.bucket(severity).count()
    }

    /// Origin names of one bucket, in recording order (duplicates kept:
    /// a rule may fire several times, e.g. once per offending line).
    pub fn origins(&self, severity: Severity) -> Vec<&'static str> {
        self.bucket(severity).map(|e| e.origin).collect()
    }

    /// Whether a given rule recorded a Success report this run. Used by
    /// qualification tiers to detect earlier tiers.
    pub fn has_success_from(&self, origin: &str) -> bool {
        self.bucket(Severity::Success).any(|e| e.origin == origin)
    }

    /// Whether the run as a whole fails (any Error or Critical entry).
    pub fn has_blockers(&self) -> bool {
        self.entries.iter().any(|e| e.report.severity.blocks_pass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(origin: &'static str, report: Report) -> TaggedReport {
        TaggedReport { origin, report }
    }

    #[test]
    fn test_buckets_and_counts() {
        let mut table = AggregateTable::new();
        table.record(tag("a.one", Report::warning("w1")));
        table.record(tag("a.two", Report::error("e1")));
        table.record(tag("a.one", Report::warning("w2")));

        assert_eq!(table.count(Severity::Warning), 2);
        assert_eq!(table.count(Severity::Error), 1);
        assert_eq!(table.count(Severity::Critical), 0);
        assert_eq!(table.origins(Severity::Warning), vec!["a.one", "a.one"]);
    }

    #[test]
    fn test_has_blockers() {
        let mut table = AggregateTable::new();
        table.record(tag("a.one", Report::warning("w")));
        assert!(!table.has_blockers());

        table.record(tag("a.two", Report::critical("c")));
        assert!(table.has_blockers());
    }

    #[test]
    fn test_has_success_from() {
        let mut table = AggregateTable::new();
        assert!(!table.has_success_from("app.qualify_for_level_7"));

        table.record(tag("app.qualify_for_level_7", Report::success("yay")));
        assert!(table.has_success_from("app.qualify_for_level_7"));
    }
}
