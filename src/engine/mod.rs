//! Suite execution engine.
//!
//! The [`Engine`] owns the rule [`Registry`], the run-wide
//! [`AggregateTable`] and the output mode. One engine is constructed per
//! analysis run; nothing about a run lives in globals, so two runs in the
//! same process cannot contaminate each other.

mod aggregate;
mod registry;
mod report;

pub use aggregate::{AggregateTable, TaggedReport};
pub use registry::{EngineError, Registry, Rule, RuleFn, Scope, Subject};
pub use report::{Report, Severity, SEVERITIES};

use crate::render::{self, OutputMode};

/// A late-stage rule: runs after every ordinary suite and additionally
/// sees the aggregation table accumulated so far.
pub type FinalRuleFn<S> = fn(&S, &AggregateTable) -> Vec<Report>;

pub struct Engine {
    registry: Registry,
    table: AggregateTable,
    mode: OutputMode,
}

impl Engine {
    pub fn new(registry: Registry, mode: OutputMode) -> Self {
        Self {
            registry,
            table: AggregateTable::new(),
            mode,
        }
    }

    /// Run every registered rule applicable to `subject`.
    ///
    /// Rules run in declaration order; each report is tagged with the
    /// qualified name of the rule that produced it, rendered under the
    /// subject's header, and recorded in the aggregation table.
    pub fn run_suite<S: Subject + 'static>(&mut self, subject: &S) -> Result<(), EngineError> {
        let mut produced = Vec::new();
        for rule in self.registry.rules_for::<S>()? {
            if !rule.scope.applies_to(subject.identity()) {
                continue;
            }
            for report in (rule.check)(subject) {
                produced.push(TaggedReport {
                    origin: rule.name,
                    report,
                });
            }
        }

        render::suite(self.mode, &subject.display_label(), &produced);
        for tagged in produced {
            self.table.record(tagged);
        }
        Ok(())
    }

    /// Run one late-stage rule directly, bypassing registry and scope.
    /// Its reports are rendered without a suite header but tagged and
    /// aggregated exactly like ordinary ones.
    pub fn run_final_rule<S: Subject>(
        &mut self,
        subject: &S,
        name: &'static str,
        check: FinalRuleFn<S>,
    ) {
        for report in check(subject, &self.table) {
            let tagged = TaggedReport {
                origin: name,
                report,
            };
            render::single(self.mode, &tagged);
            self.table.record(tagged);
        }
    }

    /// Print a human-mode-only progress note.
    pub fn note(&self, message: &str) {
        render::note(self.mode, message);
    }

    pub fn table(&self) -> &AggregateTable {
        &self.table
    }

    /// Emit the end-of-run output for the active mode and report whether
    /// the run passed (no Error, no Critical).
    pub fn finish(self) -> anyhow::Result<bool> {
        match self.mode {
            OutputMode::Human => render::summary_line(self.mode, &self.table),
            OutputMode::Json => render::write_json_summary(&self.table)?,
        }
        Ok(!self.table.has_blockers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        name: &'static str,
    }

    impl Subject for Fake {
        fn identity(&self) -> &str {
            self.name
        }

        fn display_label(&self) -> String {
            format!("Fake {}", self.name)
        }
    }

    fn one_warning(_f: &Fake) -> Vec<Report> {
        vec![Report::warning("careful")]
    }

    fn one_error(_f: &Fake) -> Vec<Report> {
        vec![Report::error("broken")]
    }

    fn nothing(_f: &Fake) -> Vec<Report> {
        vec![]
    }

    fn registry_with(rules: Vec<Rule<Fake>>) -> Registry {
        let mut registry = Registry::new();
        registry.register::<Fake>(rules);
        registry
    }

    #[test]
    fn test_run_suite_tags_and_records() {
        let registry = registry_with(vec![
            Rule::new("fake.one_warning", one_warning),
            Rule::new("fake.one_error", one_error),
        ]);
        let mut engine = Engine::new(registry, OutputMode::Json);
        engine.run_suite(&Fake { name: "a" }).unwrap();

        let table = engine.table();
        assert_eq!(table.origins(Severity::Warning), vec!["fake.one_warning"]);
        assert_eq!(table.origins(Severity::Error), vec!["fake.one_error"]);
        assert!(table.has_blockers());
    }

    #[test]
    fn test_run_suite_respects_scope() {
        let registry = registry_with(vec![
            Rule::scoped("fake.install_only", Scope::only(&["install"]), one_warning),
            Rule::scoped("fake.not_remove", Scope::ignore(&["remove"]), one_warning),
            Rule::new("fake.quiet", nothing),
        ]);
        let mut engine = Engine::new(registry, OutputMode::Json);
        engine.run_suite(&Fake { name: "remove" }).unwrap();

        assert_eq!(engine.table().count(Severity::Warning), 0);

        engine.run_suite(&Fake { name: "install" }).unwrap();
        assert_eq!(
            engine.table().origins(Severity::Warning),
            vec!["fake.install_only", "fake.not_remove"]
        );
    }

    #[test]
    fn test_run_suite_unregistered_subject_fails() {
        struct Unregistered;
        impl Subject for Unregistered {
            fn identity(&self) -> &str {
                "x"
            }
            fn display_label(&self) -> String {
                "x".into()
            }
        }

        let mut engine = Engine::new(Registry::new(), OutputMode::Json);
        assert!(engine.run_suite(&Unregistered).is_err());
    }

    #[test]
    fn test_final_rule_sees_table() {
        fn promote_if_clean(_f: &Fake, table: &AggregateTable) -> Vec<Report> {
            if table.has_blockers() {
                vec![]
            } else {
                vec![Report::success("qualified")]
            }
        }

        let registry = registry_with(vec![Rule::new("fake.one_warning", one_warning)]);
        let mut engine = Engine::new(registry, OutputMode::Json);
        engine.run_suite(&Fake { name: "a" }).unwrap();
        engine.run_final_rule(&Fake { name: "a" }, "fake.qualify", promote_if_clean);

        assert!(engine.table().has_success_from("fake.qualify"));
    }

    #[test]
    fn test_finish_verdict() {
        let registry = registry_with(vec![Rule::new("fake.one_warning", one_warning)]);
        let mut engine = Engine::new(registry, OutputMode::Json);
        engine.run_suite(&Fake { name: "a" }).unwrap();
        assert!(engine.finish().unwrap());

        let registry = registry_with(vec![Rule::new("fake.one_error", one_error)]);
        let mut engine = Engine::new(registry, OutputMode::Json);
        engine.run_suite(&Fake { name: "a" }).unwrap();
        assert!(!engine.finish().unwrap());
    }
}
