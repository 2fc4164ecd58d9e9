//! Catalog suite: checks on the app's entry in the application catalog.
//!
//! All remote access happens at load time; rule bodies only look at what
//! was loaded. With `--offline` the suite is simply never built, which
//! leaves the run neutral with respect to catalog checks.

use toml::Value;

use crate::engine::{Report, Rule, Subject};
use crate::remote::{self, AppsRepo};

/// Sampled history points: two per month over a trailing year.
const HISTORY_POINTS: u64 = 24;
const HALF_MONTH_SECS: u64 = 15 * 24 * 3600;
/// Share of sampled points that must be good quality, in percent.
const GOOD_QUALITY_CUTOFF: u64 = 80;
/// Catalog level at or above which a snapshot counts as good quality.
const GOOD_QUALITY_LEVEL: i64 = 5;

pub struct AppCatalog {
    pub app_id: String,
    /// This app's catalog entry, when the catalog knows about it.
    pub entry: Option<toml::Table>,
    /// Whether the app repo exists under one of the community orgs.
    /// Only probed when the app has no catalog entry.
    pub known_repo_exists: bool,
    /// Whether the app was present, working and at a decent level for
    /// most of the sampled history. `None` when history was unavailable.
    pub long_term_good_quality: Option<bool>,
}

impl AppCatalog {
    pub fn load(app_id: &str) -> anyhow::Result<Self> {
        let repo = AppsRepo::open_or_refresh()?;
        let catalog = repo.catalog()?;
        let entry = catalog
            .get(app_id)
            .and_then(Value::as_table)
            .cloned();

        let known_repo_exists = if entry.is_some() {
            true
        } else {
            remote::url_exists(&org_repo_url(app_id))
                || remote::url_exists(&brique_repo_url(app_id))
        };

        let long_term_good_quality = Some(Self::compute_long_term_quality(&repo, app_id));

        Ok(Self {
            app_id: app_id.to_string(),
            entry,
            known_repo_exists,
            long_term_good_quality,
        })
    }

    /// Walk catalog history and count the sampled points at which the app
    /// was known, flagged working and at level >= [`GOOD_QUALITY_LEVEL`].
    fn compute_long_term_quality(repo: &AppsRepo, app_id: &str) -> bool {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let score = (1..=HISTORY_POINTS)
            .filter_map(|i| repo.snapshot_at(now - i * HALF_MONTH_SECS))
            .filter(|catalog| {
                catalog
                    .get(app_id)
                    .and_then(Value::as_table)
                    .is_some_and(good_quality)
            })
            .count() as u64;

        100 * score / HISTORY_POINTS > GOOD_QUALITY_CUTOFF
    }

    pub fn entry_str(&self, key: &str) -> Option<&str> {
        self.entry.as_ref()?.get(key)?.as_str()
    }

    pub fn antifeatures(&self) -> Vec<&str> {
        self.entry
            .as_ref()
            .and_then(|e| e.get("antifeatures"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_flagged_high_quality(&self) -> bool {
        self.entry
            .as_ref()
            .and_then(|e| e.get("high_quality"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn good_quality(infos: &toml::Table) -> bool {
    infos.get("state").and_then(Value::as_str) == Some("working")
        && infos
            .get("level")
            .and_then(Value::as_integer)
            .unwrap_or(-1)
            >= GOOD_QUALITY_LEVEL
}

fn org_repo_url(app_id: &str) -> String {
    format!("https://github.com/YunoHost-Apps/{}_ynh", app_id)
}

fn brique_repo_url(app_id: &str) -> String {
    format!("https://github.com/labriqueinternet/{}_ynh", app_id)
}

impl Subject for AppCatalog {
    fn identity(&self) -> &str {
        "catalog"
    }

    fn display_label(&self) -> String {
        "Catalog infos".to_string()
    }
}

pub fn rules() -> Vec<Rule<AppCatalog>> {
    vec![
        Rule::new("catalog.is_in_catalog", is_in_catalog),
        Rule::new("catalog.revision_is_head", revision_is_head),
        Rule::new("catalog.state_is_working", state_is_working),
        Rule::new("catalog.has_category", has_category),
        Rule::new("catalog.is_in_github_org", is_in_github_org),
        Rule::new("catalog.is_long_term_good_quality", is_long_term_good_quality),
    ]
}

fn is_in_catalog(c: &AppCatalog) -> Vec<Report> {
    if c.entry.is_none() {
        vec![Report::critical(
            "This app is not in the application catalog",
        )]
    } else {
        vec![]
    }
}

fn revision_is_head(c: &AppCatalog) -> Vec<Report> {
    if c.entry.is_some() && c.entry_str("revision").unwrap_or("HEAD") != "HEAD" {
        vec![Report::error(
            "You should make sure that the revision used in the apps catalog is HEAD...",
        )]
    } else {
        vec![]
    }
}

fn state_is_working(c: &AppCatalog) -> Vec<Report> {
    if c.entry.is_some() && c.entry_str("state").unwrap_or("working") != "working" {
        vec![Report::error(
            "The application is not flagged as working in the apps catalog",
        )]
    } else {
        vec![]
    }
}

fn has_category(c: &AppCatalog) -> Vec<Report> {
    let uncategorized = c
        .entry
        .as_ref()
        .is_some_and(|e| e.get("category").and_then(Value::as_str).unwrap_or("").is_empty());
    if uncategorized {
        vec![Report::warning(
            "The application has no associated category in the apps catalog",
        )]
    } else {
        vec![]
    }
}

fn is_in_github_org(c: &AppCatalog) -> Vec<Report> {
    let org_repo = org_repo_url(&c.app_id);
    let brique_repo = brique_repo_url(&c.app_id);

    match &c.entry {
        Some(_) => {
            let url = c.entry_str("url").unwrap_or("").to_lowercase();
            if url == org_repo.to_lowercase() || url == brique_repo.to_lowercase() {
                vec![]
            } else if url.starts_with("https://github.com/yunohost-apps/") {
                vec![Report::warning(format!(
                    "The URL for this app in the catalog should be {}",
                    org_repo
                ))]
            } else {
                vec![Report::info(
                    "Consider adding your app to the YunoHost-Apps organization to \
                     allow the community to contribute more easily",
                )]
            }
        }
        None => {
            if c.known_repo_exists {
                vec![]
            } else {
                vec![Report::info(
                    "Consider adding your app to the YunoHost-Apps organization to \
                     allow the community to contribute more easily",
                )]
            }
        }
    }
}

fn is_long_term_good_quality(c: &AppCatalog) -> Vec<Report> {
    if c.long_term_good_quality == Some(true) {
        vec![Report::success(
            "The app is long-term good quality in the catalog!",
        )]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Severity;

    fn catalog_with(entry: Option<&str>) -> AppCatalog {
        AppCatalog {
            app_id: "myapp".to_string(),
            entry: entry.map(|raw| raw.parse::<toml::Table>().unwrap()),
            known_repo_exists: true,
            long_term_good_quality: Some(false),
        }
    }

    #[test]
    fn test_absent_from_catalog_is_critical() {
        let reports = is_in_catalog(&catalog_with(None));
        assert_eq!(reports[0].severity, Severity::Critical);
    }

    #[test]
    fn test_non_head_revision() {
        let c = catalog_with(Some("url = \"x\"\nrevision = \"1234abcd\"\n"));
        assert_eq!(revision_is_head(&c)[0].severity, Severity::Error);

        let c = catalog_with(Some("url = \"x\"\nrevision = \"HEAD\"\n"));
        assert!(revision_is_head(&c).is_empty());
    }

    #[test]
    fn test_not_working_state() {
        let c = catalog_with(Some("url = \"x\"\nstate = \"notworking\"\n"));
        assert_eq!(state_is_working(&c)[0].severity, Severity::Error);
    }

    #[test]
    fn test_github_org_url_normalization() {
        let c = catalog_with(Some(
            "url = \"https://github.com/YunoHost-Apps/myapp_ynh\"\ncategory = \"dev\"\n",
        ));
        assert!(is_in_github_org(&c).is_empty());

        let c = catalog_with(Some(
            "url = \"https://github.com/YunoHost-Apps/MyApp_ynh_old\"\n",
        ));
        assert_eq!(is_in_github_org(&c)[0].severity, Severity::Warning);

        let c = catalog_with(Some("url = \"https://example.org/myapp\"\n"));
        assert_eq!(is_in_github_org(&c)[0].severity, Severity::Info);
    }

    #[test]
    fn test_long_term_quality_success() {
        let mut c = catalog_with(Some("url = \"x\"\n"));
        c.long_term_good_quality = Some(true);
        let reports = is_long_term_good_quality(&c);
        assert_eq!(reports[0].severity, Severity::Success);
    }

    #[test]
    fn test_good_quality_thresholds() {
        let good = "state = \"working\"\nlevel = 7\n".parse::<toml::Table>().unwrap();
        assert!(good_quality(&good));

        let low = "state = \"working\"\nlevel = 4\n".parse::<toml::Table>().unwrap();
        assert!(!good_quality(&low));

        let broken = "state = \"notworking\"\nlevel = 8\n".parse::<toml::Table>().unwrap();
        assert!(!good_quality(&broken));
    }
}
