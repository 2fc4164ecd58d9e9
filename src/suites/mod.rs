//! The rule suites, one module per analyzed subject.

pub mod catalog;
pub mod configurations;
pub mod manifest;
pub mod package;
pub mod script;

use crate::engine::Registry;

/// Build a registry holding every suite, in analysis order.
pub fn register_all() -> Registry {
    let mut registry = Registry::new();
    registry.register(manifest::rules());
    registry.register(script::rules());
    registry.register(package::rules());
    registry.register(configurations::rules());
    registry.register(catalog::rules());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::catalog::AppCatalog;
    use crate::suites::configurations::Configurations;
    use crate::suites::manifest::Manifest;
    use crate::suites::package::App;
    use crate::suites::script::Script;

    #[test]
    fn test_every_suite_is_registered() {
        let registry = register_all();
        assert!(registry.rules_for::<Manifest>().is_ok());
        assert!(registry.rules_for::<Script>().is_ok());
        assert!(registry.rules_for::<App>().is_ok());
        assert!(registry.rules_for::<Configurations>().is_ok());
        assert!(registry.rules_for::<AppCatalog>().is_ok());
    }

    #[test]
    fn test_rule_names_are_qualified_and_unique() {
        let mut names: Vec<&str> = Vec::new();
        names.extend(manifest::rules().iter().map(|r| r.name));
        names.extend(script::rules().iter().map(|r| r.name));
        names.extend(package::rules().iter().map(|r| r.name));
        names.extend(configurations::rules().iter().map(|r| r.name));
        names.extend(catalog::rules().iter().map(|r| r.name));

        for name in &names {
            assert!(name.contains('.'), "unqualified rule name: {}", name);
        }
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }
}
