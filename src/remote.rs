//! Remote reference data: cached HTTP fetches and the application
//! catalog repository.
//!
//! Everything here degrades gracefully. Network failures fall back to a
//! stale cache when one exists, and otherwise to a neutral result with a
//! note on stderr; a flaky connection must never abort an analysis run.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

const SPDX_LICENSES_URL: &str = "https://spdx.org/licenses/licenses.json";
const APPS_REPO_URL: &str = "https://github.com/YunoHost/apps";

/// How long fetched data stays fresh before it is re-downloaded.
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

fn cache_dir() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "packlint")?;
    let dir = dirs.cache_dir().to_path_buf();
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn file_age(path: &PathBuf) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

fn http_get(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("packlint/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.text()?)
}

/// Fetch `url`, caching the body under the user cache directory for
/// [`CACHE_TTL`]. A stale cache beats a failed download.
pub fn fetch_cached(name: &str, url: &str) -> Result<String> {
    let cached = cache_dir().map(|dir| dir.join(name));

    if let Some(path) = &cached {
        if file_age(path).is_some_and(|age| age < CACHE_TTL) {
            if let Ok(body) = fs::read_to_string(path) {
                return Ok(body);
            }
        }
    }

    match http_get(url) {
        Ok(body) => {
            if let Some(path) = &cached {
                let _ = fs::write(path, &body);
            }
            Ok(body)
        }
        Err(err) => {
            if let Some(path) = &cached {
                if let Ok(stale) = fs::read_to_string(path) {
                    eprintln!("Could not refresh {} ({}), using stale cache", url, err);
                    return Ok(stale);
                }
            }
            Err(err).with_context(|| format!("could not fetch {}", url))
        }
    }
}

/// Whether a URL answers with something other than 404. Network errors
/// count as "unknown" and are reported as `true` so callers don't nag
/// about repositories they could not actually check.
pub fn url_exists(url: &str) -> bool {
    let Ok(client) = reqwest::blocking::Client::builder()
        .user_agent(concat!("packlint/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
    else {
        return true;
    };
    match client.head(url).send() {
        Ok(response) => response.status() != reqwest::StatusCode::NOT_FOUND,
        Err(_) => true,
    }
}

#[derive(Deserialize)]
struct SpdxList {
    licenses: Vec<SpdxLicense>,
}

#[derive(Deserialize)]
struct SpdxLicense {
    #[serde(rename = "licenseId")]
    license_id: String,
}

/// Known SPDX license identifiers, or an empty list when the list cannot
/// be obtained (the license rule then skips its SPDX membership check).
pub fn spdx_licenses() -> Vec<String> {
    let body = match fetch_cached("spdx_licenses.json", SPDX_LICENSES_URL) {
        Ok(body) => body,
        Err(err) => {
            eprintln!("SPDX license list unavailable: {}", err);
            return Vec::new();
        }
    };
    match serde_json::from_str::<SpdxList>(&body) {
        Ok(list) => list.licenses.into_iter().map(|l| l.license_id).collect(),
        Err(err) => {
            eprintln!("SPDX license list unreadable: {}", err);
            Vec::new()
        }
    }
}

/// A local clone of the application catalog repository, refreshed at most
/// once per [`CACHE_TTL`] (tracked by a flag file, as clones do not have a
/// useful mtime of their own).
pub struct AppsRepo {
    root: PathBuf,
}

impl AppsRepo {
    /// Clone or refresh the catalog repository under the cache directory.
    pub fn open_or_refresh() -> Result<Self> {
        let dir = cache_dir().ok_or_else(|| anyhow!("no usable cache directory"))?;
        let root = dir.join("apps");
        let flag = dir.join("apps.fetched");

        if !root.join(".git").exists() {
            run_git(&dir, &["clone", "--quiet", APPS_REPO_URL, "apps"])?;
            let _ = fs::write(&flag, now_secs().to_string());
        } else if file_age(&flag).map_or(true, |age| age >= CACHE_TTL) {
            run_git(&root, &["fetch", "--quiet", "origin"])?;
            run_git(&root, &["reset", "--quiet", "--hard", "origin/main"])?;
            let _ = fs::write(&flag, now_secs().to_string());
        }

        Ok(Self { root })
    }

    /// The current catalog (`apps.toml` of the checked-out tree).
    pub fn catalog(&self) -> Result<toml::Table> {
        let raw = fs::read_to_string(self.root.join("apps.toml"))
            .context("catalog repository has no apps.toml")?;
        Ok(raw.parse::<toml::Table>()?)
    }

    /// The catalog as it was at a given unix timestamp, or `None` when
    /// history does not reach that far back. Older history carries the
    /// catalog as `apps.json`, newer as `apps.toml`.
    pub fn snapshot_at(&self, timestamp: u64) -> Option<toml::Table> {
        let commit = git_output(
            &self.root,
            &[
                "rev-list",
                "-1",
                &format!("--before=@{}", timestamp),
                "origin/main",
            ],
        )
        .ok()?;
        let commit = commit.trim();
        if commit.is_empty() {
            return None;
        }

        if let Ok(raw) = git_output(&self.root, &["show", &format!("{}:apps.toml", commit)]) {
            return raw.parse::<toml::Table>().ok();
        }
        let raw = git_output(&self.root, &["show", &format!("{}:apps.json", commit)]).ok()?;
        json_to_toml_table(&raw)
    }
}

fn run_git(cwd: &PathBuf, args: &[&str]) -> Result<()> {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .status()
        .context("could not run git")?;
    if !status.success() {
        return Err(anyhow!("git {} failed", args.join(" ")));
    }
    Ok(())
}

fn git_output(cwd: &PathBuf, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .context("could not run git")?;
    if !output.status.success() {
        return Err(anyhow!("git {} failed", args.join(" ")));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn json_to_toml_table(raw: &str) -> Option<toml::Table> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let text = toml::to_string(&value).ok()?;
    text.parse::<toml::Table>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_to_toml_table() {
        let raw = r#"{"myapp": {"state": "working", "level": 7}}"#;
        let table = json_to_toml_table(raw).unwrap();
        let entry = table["myapp"].as_table().unwrap();
        assert_eq!(entry["state"].as_str(), Some("working"));
        assert_eq!(entry["level"].as_integer(), Some(7));
    }

    #[test]
    fn test_spdx_list_shape() {
        let body = r#"{"licenses": [{"licenseId": "MIT"}, {"licenseId": "GPL-3.0-only"}]}"#;
        let list: SpdxList = serde_json::from_str(body).unwrap();
        let ids: Vec<_> = list.licenses.into_iter().map(|l| l.license_id).collect();
        assert_eq!(ids, vec!["MIT", "GPL-3.0-only"]);
    }
}
