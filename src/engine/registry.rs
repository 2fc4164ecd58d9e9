//! Rule registration and scope filtering.
//!
//! Rules are declared as compile-time lists of function pointers per
//! subject type and registered into an engine-owned [`Registry`] during
//! setup. Adding a rule stays a one-line change in the suite module that
//! owns it; no other wiring is needed.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use thiserror::Error;

use super::report::Report;

/// Errors that indicate a registration bug, not a packaging problem.
///
/// These are never caught: a suite with zero rules means the setup phase
/// forgot to register it, and silently skipping it would lose checks.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no rules registered for subject type {0}")]
    NoRules(&'static str),
}

/// An analyzable unit: the package itself, the manifest, one script,
/// the configuration bundle, or the catalog snapshot.
pub trait Subject {
    /// Name used for scope filtering (e.g. the script name "install").
    fn identity(&self) -> &str;

    /// Human-readable label used as the suite header in terminal output.
    fn display_label(&self) -> String;
}

/// Restricts which subject instances a rule applies to, keyed by the
/// subject's identity. `only` and `ignore` are cumulative: a rule
/// declaring both runs only for identities in `only` and not in `ignore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope {
    only: Option<&'static [&'static str]>,
    ignore: Option<&'static [&'static str]>,
}

impl Scope {
    pub const fn always() -> Self {
        Self {
            only: None,
            ignore: None,
        }
    }

    pub const fn only(names: &'static [&'static str]) -> Self {
        Self {
            only: Some(names),
            ignore: None,
        }
    }

    pub const fn ignore(names: &'static [&'static str]) -> Self {
        Self {
            only: None,
            ignore: Some(names),
        }
    }

    pub fn applies_to(&self, identity: &str) -> bool {
        if let Some(only) = self.only {
            if !only.contains(&identity) {
                return false;
            }
        }
        if let Some(ignore) = self.ignore {
            if ignore.contains(&identity) {
                return false;
            }
        }
        true
    }
}

/// A rule body: a pure function of a subject producing zero or more
/// reports, finite and consumed exactly once per invocation.
pub type RuleFn<S> = fn(&S) -> Vec<Report>;

/// One registered rule: qualified name, scope, and body.
pub struct Rule<S> {
    pub name: &'static str,
    pub scope: Scope,
    pub check: RuleFn<S>,
}

impl<S> Rule<S> {
    pub const fn new(name: &'static str, check: RuleFn<S>) -> Self {
        Self {
            name,
            scope: Scope::always(),
            check,
        }
    }

    pub const fn scoped(name: &'static str, scope: Scope, check: RuleFn<S>) -> Self {
        Self { name, scope, check }
    }
}

/// Table mapping each subject type to its declared rules, in declaration
/// order. Owned by the engine; filled once during setup, never mutated
/// afterwards.
#[derive(Default)]
pub struct Registry {
    rules: HashMap<TypeId, Box<dyn Any>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record rules for a subject type, preserving declaration order.
    /// Repeated calls for the same type append.
    pub fn register<S: Subject + 'static>(&mut self, rules: Vec<Rule<S>>) {
        let slot = self
            .rules
            .entry(TypeId::of::<S>())
            .or_insert_with(|| Box::new(Vec::<Rule<S>>::new()));
        slot.downcast_mut::<Vec<Rule<S>>>()
            .expect("registry slot holds rules of the keyed subject type")
            .extend(rules);
    }

    /// The registered rules for a subject type, or a loud failure if the
    /// type was never registered.
    pub fn rules_for<S: Subject + 'static>(&self) -> Result<&[Rule<S>], EngineError> {
        self.rules
            .get(&TypeId::of::<S>())
            .and_then(|slot| slot.downcast_ref::<Vec<Rule<S>>>())
            .map(|rules| rules.as_slice())
            .filter(|rules| !rules.is_empty())
            .ok_or_else(|| EngineError::NoRules(std::any::type_name::<S>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        name: String,
    }

    impl Subject for Dummy {
        fn identity(&self) -> &str {
            &self.name
        }

        fn display_label(&self) -> String {
            format!("dummy {}", self.name)
        }
    }

    fn always_warn(_d: &Dummy) -> Vec<Report> {
        vec![Report::warning("w")]
    }

    #[test]
    fn test_scope_only() {
        let scope = Scope::only(&["install"]);
        assert!(scope.applies_to("install"));
        assert!(!scope.applies_to("remove"));
    }

    #[test]
    fn test_scope_ignore() {
        let scope = Scope::ignore(&["_common.sh"]);
        assert!(!scope.applies_to("_common.sh"));
        assert!(scope.applies_to("install"));
    }

    #[test]
    fn test_scope_always() {
        assert!(Scope::always().applies_to("anything"));
    }

    #[test]
    fn test_registry_roundtrip() {
        let mut registry = Registry::new();
        registry.register::<Dummy>(vec![Rule::new("dummy.always_warn", always_warn)]);

        let rules = registry.rules_for::<Dummy>().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "dummy.always_warn");
    }

    #[test]
    fn test_registry_unknown_type_is_loud() {
        let registry = Registry::new();
        assert!(matches!(
            registry.rules_for::<Dummy>(),
            Err(EngineError::NoRules(_))
        ));
    }

    #[test]
    fn test_registry_preserves_declaration_order() {
        let mut registry = Registry::new();
        registry.register::<Dummy>(vec![
            Rule::new("dummy.first", always_warn),
            Rule::new("dummy.second", always_warn),
        ]);
        registry.register::<Dummy>(vec![Rule::new("dummy.third", always_warn)]);

        let names: Vec<_> = registry
            .rules_for::<Dummy>()
            .unwrap()
            .iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["dummy.first", "dummy.second", "dummy.third"]);
    }
}
