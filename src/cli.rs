//! Command-line interface for packlint.

use std::path::PathBuf;

use clap::Parser;

use crate::engine::Engine;
use crate::render::OutputMode;
use crate::suites::{self, package::App};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Static analyzer for YunoHost application packages.
///
/// Packlint checks a package against the packaging conventions: manifest
/// correctness, shell script hygiene, configuration file pitfalls, and
/// the app's standing in the application catalog. It exits non-zero when
/// any check reports an error.
#[derive(Parser)]
#[command(name = "packlint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the package to analyze
    pub path: PathBuf,

    /// Print a machine-readable JSON summary instead of the full report
    #[arg(short, long)]
    pub json: bool,

    /// Never touch the network (catalog and license-list checks are skipped)
    #[arg(long)]
    pub offline: bool,
}

/// Run the analysis.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let path = match cli.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", cli.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !path.join("manifest.toml").exists() {
        eprintln!(
            "Error: no manifest.toml in {} - is this a packaging v2 app?",
            path.display()
        );
        return Ok(EXIT_ERROR);
    }

    let app = App::load(&path, cli.offline)?;
    let mut engine = Engine::new(suites::register_all(), mode);
    app.analyze(&mut engine)?;

    if engine.finish()? {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}
