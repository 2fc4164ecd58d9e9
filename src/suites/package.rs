//! App suite: package-level checks plus the analysis traversal and the
//! final qualification rules.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::engine::{AggregateTable, Engine, EngineError, Report, Rule, Severity, Subject};
use crate::remote;
use crate::suites::catalog::AppCatalog;
use crate::suites::configurations::Configurations;
use crate::suites::manifest::Manifest;
use crate::suites::script::{Script, SCRIPT_NAMES};

/// Warnings tolerated while still qualifying for level 7.
const LEVEL_7_WARNING_CUTOFF: usize = 0;

/// Catalog antifeature flags that disqualify an app from level 8.
const DISQUALIFYING_ANTIFEATURES: [&str; 4] = [
    "package-not-maintained",
    "deprecated-software",
    "alpha-software",
    "replaced-by-another-app",
];

/// Helpers that packaging v2 made obsolete, with their replacement.
const DEPRECATED_HELPERS_IN_V2: [(&str, &str); 23] = [
    ("ynh_clean_setup", "(?)"),
    ("ynh_abort_if_errors", "nothing, handled by the core, just get rid of it"),
    ("ynh_backup_before_upgrade", "nothing, handled by the core, just get rid of it"),
    ("ynh_restore_upgradebackup", "nothing, handled by the core, just get rid of it"),
    ("ynh_system_user_create", "the system_user resource"),
    ("ynh_system_user_delete", "the system_user resource"),
    ("ynh_webpath_register", "the permission resource"),
    ("ynh_webpath_available", "the permission resource"),
    ("ynh_permission_update", "the permission resource"),
    ("ynh_permission_create", "the permission resource"),
    ("ynh_permission_exists", "the permission resource"),
    ("ynh_legacy_permissions_exists", "the permission resource"),
    ("ynh_legacy_permissions_delete_all", "the permission resource"),
    ("ynh_install_app_dependencies", "the apt resource"),
    ("ynh_install_extra_app_dependencies", "the apt source"),
    ("ynh_remove_app_dependencies", "the apt resource"),
    ("ynh_psql_test_if_first_run", "the database resource"),
    ("ynh_mysql_setup_db", "the database resource"),
    ("ynh_psql_setup_db", "the database resource"),
    ("ynh_mysql_remove_db", "the database resource"),
    ("ynh_psql_remove_db", "the database resource"),
    ("ynh_find_port", "the port resource"),
    ("ynh_send_readme_to_admin", "the doc/POST_INSTALL.md or POST_UPGRADE.md mechanism"),
];

/// The whole package: owns the manifest, scripts, configurations and
/// catalog subjects, and is itself the subject of the app-level rules.
pub struct App {
    pub path: PathBuf,
    pub manifest: Manifest,
    pub scripts: Vec<Script>,
    pub configurations: Configurations,
    pub catalog: Option<AppCatalog>,
}

impl App {
    /// Load all subjects. With `offline` set, no network access happens
    /// at all: the SPDX check degrades and the catalog suite is skipped.
    pub fn load(path: &Path, offline: bool) -> Result<Self> {
        let spdx = if offline {
            Vec::new()
        } else {
            remote::spdx_licenses()
        };
        let manifest = Manifest::load(path, spdx)?;
        let app_id = manifest.id().to_string();

        let scripts = SCRIPT_NAMES
            .iter()
            .map(|name| Script::load(path, name, &app_id))
            .collect();

        let catalog = if offline {
            None
        } else {
            match AppCatalog::load(&app_id) {
                Ok(catalog) => Some(catalog),
                Err(err) => {
                    eprintln!("Could not load the app catalog ({}), skipping catalog checks", err);
                    None
                }
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            scripts,
            configurations: Configurations::new(path),
            catalog,
        })
    }

    pub fn script(&self, name: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.name == name)
    }

    /// Run every suite over this package, then the qualification rules.
    pub fn analyze(&self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.note(&format!("  Analyzing app {} ...", self.path.display()));
        engine.note("");

        engine.run_suite(&self.manifest)?;
        for script in self.scripts.iter().filter(|s| s.exists) {
            engine.run_suite(script)?;
        }
        engine.run_suite(self)?;
        engine.run_suite(&self.configurations)?;
        if let Some(catalog) = &self.catalog {
            engine.run_suite(catalog)?;
        }

        engine.note(" =======");
        engine.run_final_rule(self, "app.qualify_for_level_7", qualify_for_level_7);
        engine.run_final_rule(self, "app.qualify_for_level_8", qualify_for_level_8);
        engine.run_final_rule(self, "app.qualify_for_level_9", qualify_for_level_9);
        Ok(())
    }

    /// Lines of every text file in the tree, excluding `.git` and
    /// optionally `doc/`. Files that are not valid UTF-8 are skipped.
    fn tree_lines(&self, skip_doc: bool) -> Vec<String> {
        let mut lines = Vec::new();
        for entry in WalkDir::new(&self.path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_str().unwrap_or("");
                name != ".git" && !(skip_doc && name == "doc")
            })
            .flatten()
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(content) = fs::read_to_string(entry.path()) {
                lines.extend(content.lines().map(str::to_string));
            }
        }
        lines
    }

    fn doc_lines(&self) -> Vec<String> {
        let doc = self.path.join("doc");
        let mut lines = Vec::new();
        for entry in WalkDir::new(doc).sort_by_file_name().into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(content) = fs::read_to_string(entry.path()) {
                lines.extend(content.lines().map(str::to_string));
            }
        }
        lines
    }

    /// `ynh_*` helper names used across the main action scripts.
    fn helpers_used(&self) -> BTreeSet<String> {
        static HELPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"ynh_\w+").unwrap());
        let mut used = BTreeSet::new();
        for name in ["install", "remove", "upgrade", "backup", "restore"] {
            if let Some(script) = self.script(name) {
                for m in HELPER_RE.find_iter(&script.raw) {
                    used.insert(m.as_str().to_string());
                }
            }
        }
        used
    }
}

fn not_empty(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|t| !t.trim().is_empty())
}

impl Subject for App {
    fn identity(&self) -> &str {
        "app"
    }

    fn display_label(&self) -> String {
        "General stuff, misc helper usage".to_string()
    }
}

pub fn rules() -> Vec<Rule<App>> {
    vec![
        Rule::new("app.mandatory_files", mandatory_files),
        Rule::new("app.doc_dir", doc_dir),
        Rule::new("app.doc_description", doc_description),
        Rule::new("app.admin_has_to_finish_install", admin_has_to_finish_install),
        Rule::new("app.disclaimer_placeholder_wording", disclaimer_placeholder_wording),
        Rule::new("app.custom_python_version", custom_python_version),
        Rule::new("app.change_url_script", change_url_script),
        Rule::new("app.config_panel", config_panel),
        Rule::new("app.badges_in_readme", badges_in_readme),
        Rule::new("app.remaining_placeholder_id", remaining_placeholder_id),
        Rule::new("app.supervisor_usage", supervisor_usage),
        Rule::new("app.git_clone_usage", git_clone_usage),
        Rule::new("app.helpers_deprecated_in_v2", helpers_deprecated_in_v2),
        Rule::new("app.helper_consistency_apt_deps", helper_consistency_apt_deps),
        Rule::new("app.helper_consistency_service_add", helper_consistency_service_add),
        Rule::new("app.references_to_superold_stuff", references_to_superold_stuff),
        Rule::new("app.sso_conf_tweaking", sso_conf_tweaking),
        Rule::new("app.app_data_in_unofficial_dir", app_data_in_unofficial_dir),
    ]
}

fn mandatory_files(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();
    let filenames = [
        "LICENSE",
        "README.md",
        "scripts/install",
        "scripts/remove",
        "scripts/upgrade",
        "scripts/backup",
        "scripts/restore",
    ];
    for filename in filenames {
        if !not_empty(&app.path.join(filename)) {
            reports.push(Report::error(format!("Providing {} is mandatory", filename)));
        }
    }

    if let Ok(license) = fs::read_to_string(app.path.join("LICENSE")) {
        if license.contains("File containing the license of your package") {
            reports.push(Report::error("You should put an actual license in LICENSE..."));
        }
    }
    reports
}

fn doc_dir(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();
    let doc = app.path.join("doc");

    if !doc.exists() {
        reports.push(Report::error(
            "Having a doc/ folder is now mandatory in packaging v2 and is expected to contain :\n\
             - (recommended) doc/DESCRIPTION.md : a long description of the app, typically \
             around 5~20 lines, for example to list features\n\
             - (recommended) doc/screenshots/ : a folder containing at least one .png (or \
             .jpg) screenshot of the app\n\
             - (if relevant) doc/ADMIN.md : an admin doc page meant to provide general info \
             about administrating this app\n\
             - (if relevant) doc/PRE_INSTALL.md, POST_INSTALL.md : important information to \
             display to the user before/after the install",
        ));
        return reports;
    }

    let screenshots = doc.join("screenshots");
    if screenshots.exists() {
        let total_size: u64 = WalkDir::new(&screenshots)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum();
        let size_message = "Please keep the content of doc/screenshots under ~512Kb. \
                            Having screenshots bigger than 512kb is probably a waste of \
                            resource and will take unnecessarily long time to load on the \
                            webadmin UI and app catalog.";
        if total_size > 1024 * 1000 {
            reports.push(Report::warning(size_message));
        } else if total_size > 512 * 1000 {
            reports.push(Report::info(size_message));
        }

        let image_exts = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
        let has_stray_file = WalkDir::new(&screenshots)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_str().unwrap_or("").to_lowercase())
            .any(|name| name != ".gitkeep" && !image_exts.iter().any(|ext| name.ends_with(ext)));
        if has_stray_file {
            reports.push(Report::warning(
                "In the doc/screenshots folder, only .jpg, .jpeg, .png, .webp and .gif \
                 are accepted",
            ));
        }
    }
    reports
}

static DESCRIPTION_PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Some long and extensive description|lorem ipsum dolor sit amet|Ut enim ad minim veniam").unwrap()
});

fn doc_description(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();
    let doc = app.path.join("doc");
    if !doc.exists() {
        return reports;
    }

    let description = doc.join("DESCRIPTION.md");
    if !description.exists() {
        reports.push(Report::error(
            "A DESCRIPTION.md is now mandatory in packaging v2 and is meant to contain \
             an extensive description of what the app is and does. Consider also adding \
             a 'doc/screenshots/' folder with a few screenshots of what the app looks \
             like.",
        ));
    } else if fs::read_to_string(&description)
        .is_ok_and(|content| DESCRIPTION_PLACEHOLDER_RE.is_match(&content))
    {
        reports.push(Report::error(
            "It looks like DESCRIPTION.md just contains placeholder texts",
        ));
    }

    if doc.join("DISCLAIMER.md").exists() {
        reports.push(Report::warning(
            "DISCLAIMER.md has been replaced with several files in packaging v2 to \
             provide the user with key information at the appropriate step of the app \
             install / upgrade cycles.\n\
             You are encouraged to split its infos into:\n\
             - Integration-related infos -> the 'integration' section of manifest.toml\n\
             - Antifeatures-related infos -> the 'antifeatures' mechanism in the app \
             catalog\n\
             - Important infos the admin should know *before* or *after* the install -> \
             doc/PRE_INSTALL.md / doc/POST_INSTALL.md (the __FOOBAR__ syntax is \
             supported and replaced with the corresponding 'foobar' setting)\n\
             - General admin-related infos -> doc/ADMIN.md, shown in the app info page \
             of the webadmin after installation",
        ));
    }
    reports
}

fn admin_has_to_finish_install(app: &App) -> Vec<Report> {
    // my_webapp has a legit use case for this
    if app.manifest.id() == "my_webapp" {
        return vec![];
    }
    if app.doc_lines().iter().any(|line| line.contains("__DB_PWD__")) {
        vec![Report::warning(
            "(doc folder) It looks like this app requires the admin to finish the \
             install by entering DB credentials. Unless it's absolutely not easily \
             automatizable, this should be handled automatically by the app install \
             script using curl calls, or CLI tools provided by the upstream.",
        )]
    } else {
        vec![]
    }
}

fn disclaimer_placeholder_wording(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();
    let lines = app.doc_lines();

    if lines.iter().any(|l| {
        l.contains("Any known limitations, constrains or stuff not working, such as")
            || l.contains("Other infos that people should be")
    }) {
        reports.push(Report::warning(
            "In DISCLAIMER.md: 'Any known limitations [...] such as' and 'Other infos \
             [...] such as' are supposed to be placeholder sentences meant to explain \
             to packagers what the expected content is, but are not an appropriate \
             wording for end users :/",
        ));
    }
    if lines
        .iter()
        .any(|l| l.contains("This is a dummy") || l.contains("Ceci est une fausse"))
    {
        reports.push(Report::warning(
            "The doc/ folder seems to still contain some dummy, placeholder messages in \
             the .md markdown files. If those files are not useful in the context of \
             your app, simply remove them.",
        ));
    }
    reports
}

static INSTALL_PYTHON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^#]*install_python").unwrap());

fn custom_python_version(app: &App) -> Vec<Report> {
    let installs_python = app
        .scripts
        .iter()
        .any(|s| s.raw.lines().any(|line| INSTALL_PYTHON_RE.is_match(line)));
    if installs_python {
        vec![Report::warning(
            "It looks like this app installs a custom version of Python which is \
             heavily discouraged, both because compiling Python locally takes a huge \
             amount of time, and because it is likely to create complications once the \
             system gets upgraded to a newer Debian version...",
        )]
    } else {
        vec![]
    }
}

fn change_url_script(app: &App) -> Vec<Report> {
    let has_domain_arg = app
        .manifest
        .table
        .get("install")
        .and_then(toml::Value::as_table)
        .is_some_and(|install| install.contains_key("domain"));
    if has_domain_arg && !not_empty(&app.path.join("scripts").join("change_url")) {
        vec![Report::info(
            "Consider adding a change_url script to support changing where the app can \
             be reached",
        )]
    } else {
        vec![]
    }
}

fn config_panel(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();

    if not_empty(&app.path.join("config_panel.json")) {
        reports.push(Report::error(
            "JSON config panels are not supported anymore, should be replaced by a toml \
             version",
        ));
    }
    if not_empty(&app.path.join("config_panel.toml.example")) {
        reports.push(Report::warning(
            "Please do not commit config_panel.toml.example ... This is just a \
             'documentation' for the config panel syntax",
        ));
    }

    let panel = app.path.join("config_panel.toml");
    let config_script = app.path.join("scripts").join("config");
    if !not_empty(&panel) && not_empty(&config_script) {
        reports.push(Report::warning(
            "The script 'config' exists but there is no config_panel.toml ... Please \
             remove the 'config' script if this is just an example leftover, or add a \
             proper config_panel.toml if the point is really to have a config panel",
        ));
    }

    if not_empty(&panel) {
        let panel_content = fs::read_to_string(&panel).unwrap_or_default();
        if panel_content.contains("version = \"0.1\"") {
            reports.push(Report::error(
                "Config panels version 0.1 are not supported anymore, should be adapted \
                 for version 1.0",
            ));
        } else if fs::read_to_string(&config_script).is_ok_and(|content| {
            content.contains("YNH_CONFIG_") || content.contains("yunohost app action")
        }) {
            reports.push(Report::error(
                "The config panel is set to version 1.x, but the config script is \
                 apparently still using some old code from 0.1 such as \
                 '$YNH_CONFIG_STUFF' or 'yunohost app action'",
            ));
        }
    }
    reports
}

fn badges_in_readme(app: &App) -> Vec<Report> {
    let Ok(content) = fs::read_to_string(app.path.join("README.md")) else {
        return vec![];
    };
    let id = app.manifest.id();

    let has_badge = content.contains(&format!("dash.yunohost.org/integration/{}.svg", id))
        || content.contains(&format!("https://apps.yunohost.org/badge/integration/{}", id));
    let has_app_link = content.contains(&format!("https://apps.yunohost.org/app/{}", id))
        || content.contains(&format!(
            "https://raw.githubusercontent.com/YunoHost/apps/main/logos/{}.png",
            id
        ));

    if !content.contains("This README was automatically generated") || (!has_badge && !has_app_link)
    {
        vec![Report::warning(
            "It looks like the README was not generated automatically by the \
             README-generator. Note that nowadays you are not supposed to edit \
             README.md manually; the bot will usually update it automatically if your \
             app is hosted in the YunoHost-Apps org, or you can run the \
             README-generator yourself.",
        )]
    } else {
        vec![]
    }
}

fn remaining_placeholder_id(app: &App) -> Vec<Report> {
    if app
        .tree_lines(false)
        .iter()
        .any(|l| l.contains("REPLACEBYYOURAPP"))
    {
        vec![Report::error(
            "You should replace all occurences of REPLACEBYYOURAPP.",
        )]
    } else {
        vec![]
    }
}

static SUPERVISORCTL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*supervisorctl").unwrap());

fn supervisor_usage(app: &App) -> Vec<Report> {
    if app
        .tree_lines(false)
        .iter()
        .any(|l| SUPERVISORCTL_RE.is_match(l))
    {
        vec![Report::warning(
            "Please don't rely on supervisor to run services. The standard is to use \
             systemd units...",
        )]
    } else {
        vec![]
    }
}

fn git_clone_usage(app: &App) -> Vec<Report> {
    let clones_upstream = ["install", "_common.sh"]
        .iter()
        .filter_map(|name| app.script(name))
        .flat_map(|s| s.raw.lines())
        .any(|line| {
            line.contains("git clone")
                && !line.contains("xxenv")
                && !line.contains("rbenv")
                && !line.contains("oracledb")
        });
    if clones_upstream {
        vec![Report::warning(
            "Using 'git clone' is not recommended ... most forges provide the ability \
             to download a proper archive of the code for a specific commit. Please use \
             the 'sources' resource in the manifest.toml in combination with \
             ynh_setup_source.",
        )]
    } else {
        vec![]
    }
}

fn helpers_deprecated_in_v2(app: &App) -> Vec<Report> {
    let used = app.helpers_used();
    DEPRECATED_HELPERS_IN_V2
        .iter()
        .filter(|(helper, _)| used.contains(*helper))
        .map(|(helper, replacement)| {
            Report::warning(format!(
                "Using helper {} is deprecated when using packaging v2 ... It is \
                 replaced by: {}",
                helper, replacement
            ))
        })
        .collect()
}

fn helper_consistency_apt_deps(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();

    let installs_deps = app
        .script("install")
        .is_some_and(|s| s.contains("ynh_install_app_dependencies"));
    if installs_deps {
        for name in ["upgrade", "restore"] {
            let missing = app
                .script(name)
                .is_some_and(|s| s.exists && !s.contains("ynh_install_app_dependencies"));
            if missing {
                reports.push(Report::warning(format!(
                    "ynh_install_app_dependencies should also be in {} script",
                    name
                )));
            }
        }
    }

    let extra_repo_without_key = app.scripts.iter().flat_map(|s| s.raw.lines()).any(|line| {
        line.contains("install_extra_app_dependencies")
            && !line.contains("key")
            && line.contains("http://")
    });
    if extra_repo_without_key {
        reports.push(Report::warning(
            "When installing dependencies from an extra repository, please include a \
             `--key` argument (yes, even for official debian repos such as backports - \
             because systems like Raspbian do not ship Debian's key by default!)",
        ));
    }
    reports
}

fn helper_consistency_service_add(app: &App) -> Vec<Report> {
    let mut reports = Vec::new();

    let occurrences_for = |name: &str| -> Vec<String> {
        app.script(name)
            .filter(|s| s.exists)
            .map(|s| s.occurences("yunohost service add"))
            .unwrap_or_default()
            .into_iter()
            .map(|cmd| cmd.replace("\"$app\"", "$app"))
            .collect()
    };
    let scripts = ["install", "upgrade", "restore"];
    let occurrences: Vec<(&str, Vec<String>)> =
        scripts.iter().map(|name| (*name, occurrences_for(name))).collect();

    let all: Vec<&String> = occurrences.iter().flat_map(|(_, cmds)| cmds).collect();
    let inconsistent = all
        .iter()
        .any(|cmd| occurrences.iter().any(|(_, cmds)| !cmds.contains(cmd)));
    if inconsistent {
        let details: Vec<String> = occurrences
            .iter()
            .map(|(name, cmds)| {
                let listed = if cmds.is_empty() {
                    "\n      ...None?...".to_string()
                } else {
                    cmds.iter().map(|c| format!("\n      {}", c)).collect()
                };
                format!("   {} : {}", name, listed)
            })
            .collect();
        reports.push(Report::warning(format!(
            "Some inconsistencies were found in the 'yunohost service add' commands \
             between install, upgrade and restore:\n{}",
            details.join("\n")
        )));
    }

    if all.iter().any(|cmd| cmd.contains("--log_type systemd")) {
        reports.push(Report::warning(
            "Using option '--log_type systemd' with 'yunohost service add' is not \
             relevant anymore",
        ));
    }

    let install_adds = occurrences
        .iter()
        .any(|(name, cmds)| *name == "install" && !cmds.is_empty());
    let remove_removes = app
        .script("remove")
        .is_some_and(|s| s.contains("yunohost service remove"));
    if install_adds && !remove_removes {
        reports.push(Report::error(
            "You used 'yunohost service add' in the install script, but not 'yunohost \
             service remove' in the remove script.",
        ));
    }
    reports
}

fn references_to_superold_stuff(app: &App) -> Vec<Report> {
    let any_script = |needles: &[&str]| {
        app.scripts
            .iter()
            .filter(|s| s.exists)
            .any(|s| needles.iter().any(|needle| s.contains(needle)))
    };

    let mut reports = Vec::new();
    if any_script(&["jessie"]) {
        reports.push(Report::error(
            "The app still contains references to jessie, which could probably be \
             cleaned up...",
        ));
    }
    for (needles, era) in [
        (["/etc/php5", "php5-fpm"], "php5 (from the jessie era!!)"),
        (["/etc/php/7.0", "php7.0-fpm"], "php7.0 (from the stretch era!!)"),
        (["/etc/php/7.3", "php7.3-fpm"], "php7.3 (from the buster era!!)"),
    ] {
        if any_script(&needles) {
            reports.push(Report::error(format!(
                "This app still has references to {} which tends to indicate that it's \
                 not up to date with recent packaging practices.",
                era
            )));
        }
    }
    reports
}

fn sso_conf_tweaking(app: &App) -> Vec<Report> {
    if app
        .tree_lines(true)
        .iter()
        .any(|l| l.contains("/etc/ssowat/conf.json.persistent"))
    {
        vec![Report::error(
            "Don't do black magic with /etc/ssowat/conf.json.persistent!",
        )]
    } else {
        vec![]
    }
}

static HOME_LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/home/yunohost[^/ ]*/|/home/\$app").unwrap());

const ALLOWED_HOME_LOCATIONS: [&str; 4] = [
    "/home/yunohost.app",
    "/home/yunohost.conf",
    "/home/yunohost.backup",
    "/home/yunohost.multimedia",
];

fn app_data_in_unofficial_dir(app: &App) -> Vec<Report> {
    let mut forbidden = BTreeSet::new();
    for script in &app.scripts {
        for m in HOME_LOCATION_RE.find_iter(&script.raw) {
            let location = m.as_str().trim_end_matches('/');
            if !ALLOWED_HOME_LOCATIONS.contains(&location) {
                forbidden.insert(location.to_string());
            }
        }
    }

    if forbidden.is_empty() {
        return vec![];
    }
    vec![Report::warning(format!(
        "The app seems to be storing data in the 'forbidden' locations {}. The \
         recommended practice is rather to store data in /home/yunohost.app/$app or \
         /home/yunohost.multimedia (depending on the use case)",
        forbidden.into_iter().collect::<Vec<_>>().join(", ")
    ))]
}

// Qualification rules. These run after all ordinary suites and read the
// aggregation table to decide whether the app reaches the higher tiers.
// They are advisory: they never affect the exit code.

pub fn qualify_for_level_7(_app: &App, table: &AggregateTable) -> Vec<Report> {
    let clean = !table.has_blockers()
        && table.count(Severity::Warning) <= LEVEL_7_WARNING_CUTOFF;
    if clean {
        vec![Report::success(
            "Not even a warning! Congratz and thank you for keeping this package up to \
             date with good practices! This app qualifies for level 7!",
        )]
    } else {
        vec![]
    }
}

pub fn qualify_for_level_8(app: &App, table: &AggregateTable) -> Vec<Report> {
    let antifeatures: Vec<&str> = app
        .catalog
        .as_ref()
        .map(|c| c.antifeatures())
        .unwrap_or_default();
    if antifeatures
        .iter()
        .any(|af| DISQUALIFYING_ANTIFEATURES.contains(af))
    {
        return vec![];
    }

    if table.has_success_from("app.qualify_for_level_7")
        && table.has_success_from("catalog.is_long_term_good_quality")
    {
        vec![Report::success(
            "The app is maintained and long-term good quality, and therefore qualifies \
             for level 8!",
        )]
    } else {
        vec![]
    }
}

pub fn qualify_for_level_9(app: &App, _table: &AggregateTable) -> Vec<Report> {
    let high_quality = app
        .catalog
        .as_ref()
        .is_some_and(|c| c.is_flagged_high_quality());
    if high_quality {
        vec![Report::success(
            "The app is flagged as high-quality in the app catalog",
        )]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaggedReport;
    use tempfile::TempDir;

    fn minimal_app(dir: &TempDir) -> App {
        let path = dir.path();
        fs::create_dir_all(path.join("scripts")).unwrap();
        fs::write(path.join("manifest.toml"), "id = \"myapp\"\n[install]\n").unwrap();
        App::load(path, true).unwrap()
    }

    fn record(table: &mut AggregateTable, origin: &'static str, report: Report) {
        table.record(TaggedReport { origin, report });
    }

    #[test]
    fn test_mandatory_files_missing() {
        let dir = TempDir::new().unwrap();
        let app = minimal_app(&dir);
        let reports = mandatory_files(&app);
        assert!(reports.iter().all(|r| r.severity == Severity::Error));
        assert!(reports.iter().any(|r| r.message.contains("LICENSE")));
        assert!(reports.iter().any(|r| r.message.contains("scripts/install")));
    }

    #[test]
    fn test_placeholder_license() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("LICENSE"),
            "File containing the license of your package.",
        )
        .unwrap();
        let app = minimal_app(&dir);
        assert!(mandatory_files(&app)
            .iter()
            .any(|r| r.message.contains("actual license")));
    }

    #[test]
    fn test_missing_doc_dir() {
        let dir = TempDir::new().unwrap();
        let app = minimal_app(&dir);
        assert_eq!(doc_dir(&app)[0].severity, Severity::Error);
    }

    #[test]
    fn test_deprecated_helpers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::write(
            dir.path().join("scripts/install"),
            "ynh_system_user_create --username=$app\n",
        )
        .unwrap();
        fs::write(dir.path().join("manifest.toml"), "id = \"myapp\"\n[install]\n").unwrap();
        let app = App::load(dir.path(), true).unwrap();

        let reports = helpers_deprecated_in_v2(&app);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("the system_user resource"));
    }

    #[test]
    fn test_service_add_without_remove() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::write(
            dir.path().join("scripts/install"),
            "yunohost service add $app --description=\"thing\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("scripts/remove"), "ynh_remove_systemd_config\n").unwrap();
        fs::write(dir.path().join("manifest.toml"), "id = \"myapp\"\n[install]\n").unwrap();
        let app = App::load(dir.path(), true).unwrap();

        let reports = helper_consistency_service_add(&app);
        assert!(reports
            .iter()
            .any(|r| r.severity == Severity::Error && r.message.contains("service remove")));
    }

    #[test]
    fn test_qualify_level_7() {
        let dir = TempDir::new().unwrap();
        let app = minimal_app(&dir);

        let mut table = AggregateTable::new();
        assert_eq!(qualify_for_level_7(&app, &table).len(), 1);

        record(&mut table, "script.unsafe_remove", Report::error("bad"));
        assert!(qualify_for_level_7(&app, &table).is_empty());
    }

    #[test]
    fn test_qualify_level_8_requires_level_7() {
        let dir = TempDir::new().unwrap();
        let app = minimal_app(&dir);

        let mut table = AggregateTable::new();
        record(
            &mut table,
            "catalog.is_long_term_good_quality",
            Report::success("good"),
        );
        assert!(qualify_for_level_8(&app, &table).is_empty());

        record(
            &mut table,
            "app.qualify_for_level_7",
            Report::success("clean"),
        );
        assert_eq!(qualify_for_level_8(&app, &table).len(), 1);
    }

    #[test]
    fn test_unofficial_home_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::write(
            dir.path().join("scripts/install"),
            "mkdir -p /home/yunohost.custom/$app\ncp -r x /home/yunohost.app/$app\n",
        )
        .unwrap();
        fs::write(dir.path().join("manifest.toml"), "id = \"myapp\"\n[install]\n").unwrap();
        let app = App::load(dir.path(), true).unwrap();

        let reports = app_data_in_unofficial_dir(&app);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("/home/yunohost.custom"));
    }
}
