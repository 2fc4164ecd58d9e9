//! End-to-end runs of the analyzer over whole fixture packages.

use std::fs;
use std::path::{Path, PathBuf};

use packlint::engine::{Engine, Severity};
use packlint::render::{JsonSummary, OutputMode};
use packlint::suites::{self, package::App};
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("goodapp_ynh")
}

/// Analyze a package offline and hand back the engine for inspection.
fn analyze(path: &Path, mode: OutputMode) -> Engine {
    let app = App::load(path, true).expect("fixture should load");
    let mut engine = Engine::new(suites::register_all(), mode);
    app.analyze(&mut engine).expect("all suites are registered");
    engine
}

fn write_app(dir: &TempDir, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

#[test]
fn test_clean_package_passes_and_reaches_level_7() {
    let engine = analyze(&fixture_path(), OutputMode::Json);
    let table = engine.table();

    assert_eq!(
        table.count(Severity::Critical),
        0,
        "unexpected criticals: {:?}",
        table.origins(Severity::Critical)
    );
    assert_eq!(
        table.count(Severity::Error),
        0,
        "unexpected errors: {:?}",
        table.origins(Severity::Error)
    );
    assert_eq!(
        table.count(Severity::Warning),
        0,
        "unexpected warnings: {:?}",
        table.origins(Severity::Warning)
    );

    assert!(table.has_success_from("app.qualify_for_level_7"));
    // Level 8 needs catalog data, which an offline run never has
    assert!(!table.has_success_from("app.qualify_for_level_8"));

    assert!(engine.finish().unwrap());
}

#[test]
fn test_broken_package_fails_with_aggregated_reports() {
    let dir = TempDir::new().unwrap();
    write_app(
        &dir,
        &[
            ("manifest.toml", "id = \"badapp\"\n[install]\n"),
            (
                "scripts/install",
                "#!/bin/bash\ndomain=$1\nrm -rf /var/www/badapp\nexit 1\n",
            ),
            ("scripts/remove", "#!/bin/bash\nrm -rf /var/www/badapp\n"),
        ],
    );

    let engine = analyze(dir.path(), OutputMode::Json);
    let table = engine.table();

    // manifest.mandatory_fields + script.argument_fetching
    assert!(table.count(Severity::Critical) >= 2);
    let errors = table.origins(Severity::Error);
    // rm -rf appears in two scripts, both occurrences must be kept
    assert_eq!(
        errors
            .iter()
            .filter(|o| *o == &"script.unsafe_remove")
            .count(),
        2
    );
    assert!(errors.contains(&"script.exit_ynhdie"));

    assert!(!table.has_success_from("app.qualify_for_level_7"));
    assert!(!engine.finish().unwrap());
}

#[test]
fn test_missing_scripts_are_skipped_not_analyzed() {
    let dir = TempDir::new().unwrap();
    write_app(
        &dir,
        &[
            ("manifest.toml", "id = \"tinyapp\"\n[install]\n"),
            ("scripts/install", "#!/bin/bash\nexit 1\n"),
        ],
    );

    let app = App::load(dir.path(), true).unwrap();
    let existing: Vec<&str> = app
        .scripts
        .iter()
        .filter(|s| s.exists)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(existing, vec!["install"]);

    // The exit error comes from the one existing script only
    let engine = analyze(dir.path(), OutputMode::Json);
    let exit_errors = engine
        .table()
        .origins(Severity::Error)
        .iter()
        .filter(|o| *o == &"script.exit_ynhdie")
        .count();
    assert_eq!(exit_errors, 1);
}

#[test]
fn test_output_mode_does_not_change_what_is_recorded() {
    let human = analyze(&fixture_path(), OutputMode::Human);
    let json = analyze(&fixture_path(), OutputMode::Json);

    assert_eq!(
        JsonSummary::from_table(human.table()),
        JsonSummary::from_table(json.table())
    );
}

#[test]
fn test_json_summary_buckets_rule_names() {
    let dir = TempDir::new().unwrap();
    write_app(
        &dir,
        &[
            ("manifest.toml", "id = \"badapp\"\n[install]\n"),
            ("scripts/install", "#!/bin/bash\nrm -rf /tmp/x\n"),
        ],
    );

    let engine = analyze(dir.path(), OutputMode::Json);
    let summary = JsonSummary::from_table(engine.table());
    assert!(summary.error.iter().any(|o| o == "script.unsafe_remove"));
    assert!(summary
        .critical
        .iter()
        .any(|o| o == "manifest.mandatory_fields"));
}
