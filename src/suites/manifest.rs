//! Manifest suite: checks on `manifest.toml`.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use toml::Value;

use crate::engine::{Report, Rule, Subject};

const PACKAGING_FORMAT: i64 = 2;

/// Upstream version matching, followed by the package revision suffix.
/// The upstream part mirrors PEP 440's version grammar, since upstream
/// projects version their releases in all the shapes that grammar allows.
static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^
        v?
        (?:
            (?:[0-9]+!)?                                  # epoch
            [0-9]+(?:\.[0-9]+)*                           # release segment
            (?:[-_\.]?(?:a|b|c|rc|alpha|beta|pre|preview)[-_\.]?[0-9]*)?   # pre-release
            (?:(?:-[0-9]+)|(?:[-_\.]?(?:post|rev|r)[-_\.]?[0-9]*))?       # post release
            (?:[-_\.]?dev[-_\.]?[0-9]*)?                  # dev release
        )
        (?:\+[a-z0-9]+(?:[-_\.][a-z0-9]+)*)?              # local version
        ~ynh[0-9]+$",
    )
    .unwrap()
});

static APP_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]((_|-)?[a-z0-9])+$").unwrap());

static YUNOHOST_REQ_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^>=\s*[\d\.]+\d$").unwrap());

/// The parsed manifest plus its raw text (some rules grep the raw form).
/// Key order is preserved by the parser; one rule depends on it.
pub struct Manifest {
    pub raw: String,
    pub table: toml::Table,
    pub spdx_licenses: Vec<String>,
}

impl Manifest {
    /// Load and parse `manifest.toml`. A syntax error here is fatal to
    /// the whole run; every suite reads the manifest.
    pub fn load(app_path: &Path, spdx_licenses: Vec<String>) -> Result<Self> {
        let raw = std::fs::read_to_string(app_path.join("manifest.toml"))
            .context("could not read manifest.toml")?;
        let table = raw
            .parse::<toml::Table>()
            .context("looks like there's a syntax issue in your manifest?")?;
        Ok(Self {
            raw,
            table,
            spdx_licenses,
        })
    }

    pub fn id(&self) -> &str {
        self.table.get("id").and_then(Value::as_str).unwrap_or("")
    }

    fn str_field(&self, key: &str) -> &str {
        self.table.get(key).and_then(Value::as_str).unwrap_or("")
    }

    fn section(&self, key: &str) -> Option<&toml::Table> {
        self.table.get(key).and_then(Value::as_table)
    }

    fn upstream_str(&self, key: &str) -> &str {
        self.section("upstream")
            .and_then(|u| u.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Apt packages declared in the resources section, whether written
    /// as a list or as a space/comma separated string.
    pub fn apt_packages(&self) -> Vec<String> {
        let packages = self
            .section("resources")
            .and_then(|r| r.get("apt"))
            .and_then(Value::as_table)
            .and_then(|apt| apt.get("packages"));
        match packages {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split([' ', ','])
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Subject for Manifest {
    fn identity(&self) -> &str {
        "manifest"
    }

    fn display_label(&self) -> String {
        "Manifest".to_string()
    }
}

pub fn rules() -> Vec<Rule<Manifest>> {
    vec![
        Rule::new("manifest.mandatory_fields", mandatory_fields),
        Rule::new("manifest.maintainer_sensible_values", maintainer_sensible_values),
        Rule::new("manifest.upstream_fields", upstream_fields),
        Rule::new("manifest.upstream_placeholders", upstream_placeholders),
        Rule::new("manifest.fixme_markers", fixme_markers),
        Rule::new("manifest.yunohost_version_requirement", yunohost_version_requirement),
        Rule::new("manifest.basic_fields_format", basic_fields_format),
        Rule::new("manifest.license", license),
        Rule::new("manifest.description", description),
        Rule::new("manifest.version_format", version_format),
        Rule::new("manifest.custom_install_dir", custom_install_dir),
        Rule::new("manifest.install_args", install_args),
        Rule::new("manifest.obsolete_or_missing_ask_strings", obsolete_or_missing_ask_strings),
        Rule::new("manifest.old_php_version", old_php_version),
        Rule::new("manifest.resource_consistency", resource_consistency),
    ]
}

fn mandatory_fields(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();

    let fields = [
        "packaging_format",
        "id",
        "name",
        "description",
        "version",
        "maintainers",
        "upstream",
        "integration",
        "install",
        "resources",
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| !m.table.contains_key(**f))
        .copied()
        .collect();
    if !missing.is_empty() {
        reports.push(Report::critical(format!(
            "The following mandatory fields are missing: {:?}",
            missing
        )));
    }

    if m.section("upstream").map_or(true, |u| !u.contains_key("license")) {
        reports.push(Report::error(
            "The license key in the upstream section is missing",
        ));
    }
    reports
}

fn maintainer_sensible_values(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();
    let maintainers = m
        .table
        .get("maintainers")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for value in maintainers.iter().filter_map(Value::as_str) {
        if value.trim().is_empty() {
            reports.push(Report::error(
                "Please don't put empty string as a maintainer x_x",
            ));
        } else if value.contains(',') {
            reports.push(Report::error(
                "Please don't use comma in maintainers value, this is supposed to be a list \
                 such as ['foo', 'bar'], not ['foo, bar'] x_x",
            ));
        }
    }
    reports
}

fn upstream_fields(m: &Manifest) -> Vec<Report> {
    if m.table.contains_key("upstream") {
        return vec![];
    }
    vec![Report::warning(
        "READMEs are to be automatically generated from the manifest.\n\
         You are encouraged to add an 'upstream' section filled with the website, \
         demo, repo, license of the upstream app. Not all infos are mandatory, \
         you can remove irrelevant entries.",
    )]
}

fn upstream_placeholders(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();
    if !m.table.contains_key("upstream") {
        return reports;
    }

    if m.upstream_str("admindoc").contains("yunohost.org") {
        reports.push(Report::error(
            "The field 'admindoc' should point to the **official** admin doc, not the \
             YunoHost documentation. If there's no official admin doc, simply remove \
             the admindoc key entirely.",
        ));
    }
    if m.upstream_str("website").contains("github.com") {
        reports.push(Report::warning(
            "The field 'website' is not meant to point to a code repository ... this is \
             to be handled by the 'code' key ... If the app has no proper website, just \
             remove the 'website' key entirely",
        ));
    }
    if m.upstream_str("userdoc").contains("yunohost.org") {
        reports.push(Report::warning(
            "The field 'userdoc' should point to the **official** user doc, not the \
             YunoHost documentation. If there's no official user doc, simply remove the \
             userdoc key entirely.",
        ));
    }
    if m.upstream_str("demo").contains("example.com")
        || m.upstream_str("website").contains("example.com")
    {
        reports.push(Report::error(
            "It seems like the upstream section still contains placeholder values such \
             as 'example.com' ...",
        ));
    }
    let code = m.upstream_str("code");
    if !code.is_empty() && (code == m.upstream_str("userdoc") || code == m.upstream_str("admindoc"))
    {
        reports.push(Report::warning(
            "userdoc or admindoc: A code repository is not a documentation x_x",
        ));
    }
    reports
}

fn fixme_markers(m: &Manifest) -> Vec<Report> {
    if m.raw.contains("FIXME") {
        vec![Report::warning(
            "There are still some FIXMEs remaining in the manifest",
        )]
    } else {
        vec![]
    }
}

fn yunohost_version_requirement(m: &Manifest) -> Vec<Report> {
    let requirement = m
        .section("integration")
        .and_then(|i| i.get("yunohost"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim_start_matches(['>', '=', ' ']);
    if requirement.starts_with("4.") {
        vec![Report::critical(
            "Your app only requires yunohost >= 4.x, which tends to indicate that it \
             may not be up to date with recommended packaging practices and helpers.",
        )]
    } else if requirement.starts_with("11.0") {
        vec![Report::error(
            "Your app only requires yunohost >= 11.0, which tends to indicate that it \
             may not be up to date with recommended packaging practices and helpers.",
        )]
    } else {
        vec![]
    }
}

type IntegrationValidator = fn(&Value) -> bool;

const INTEGRATION_KEYS: [(&str, IntegrationValidator, &str); 7] = [
    (
        "yunohost",
        |v| v.as_str().is_some_and(|s| YUNOHOST_REQ_RE.is_match(s)),
        "Expected something like '>= 4.5.6'",
    ),
    (
        "architectures",
        |v| match v {
            Value::String(s) => s == "all",
            Value::Array(items) => items.iter().all(|item| {
                item.as_str()
                    .is_some_and(|s| ["i386", "amd64", "armhf", "arm64"].contains(&s))
            }),
            _ => false,
        },
        "'all' or a list of values in ['i386', 'amd64', 'armhf', 'arm64']",
    ),
    (
        "multi_instance",
        |v| v.as_bool().is_some(),
        "Expected a boolean (true or false, no quotes!)",
    ),
    (
        "ldap",
        |v| v.as_bool().is_some() || v.as_str() == Some("not_relevant"),
        "Expected a boolean (true or false, no quotes!) or 'not_relevant'",
    ),
    (
        "sso",
        |v| v.as_bool().is_some() || v.as_str() == Some("not_relevant"),
        "Expected a boolean (true or false, no quotes!) or 'not_relevant'",
    ),
    ("disk", |v| v.as_str().is_some(), "Expected a string"),
    (
        "ram",
        |v| {
            v.as_table().is_some_and(|t| {
                t.get("build").and_then(Value::as_str).is_some()
                    && t.get("runtime").and_then(Value::as_str).is_some()
            })
        },
        "Expected to find ram.build and ram.runtime with string values",
    ),
];

fn basic_fields_format(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();

    if m.table.get("packaging_format").and_then(Value::as_integer) != Some(PACKAGING_FORMAT) {
        reports.push(Report::error(format!(
            "packaging_format should be {}",
            PACKAGING_FORMAT
        )));
    }
    if !APP_ID_RE.is_match(m.id()) {
        reports.push(Report::error("The app id is not a valid app id"));
    } else if m.id().ends_with("_ynh") {
        reports.push(Report::warning(
            "The app id is not supposed to end with _ynh :| ...",
        ));
    }
    if m.str_field("name").len() > 22 {
        reports.push(Report::error("The app name is too long"));
    }

    let integration = m.section("integration");
    for (key, validate, expectation) in INTEGRATION_KEYS {
        match integration.and_then(|i| i.get(key)) {
            None => reports.push(Report::error(format!(
                "Missing key in the integration section: {}",
                key
            ))),
            Some(value) if !validate(value) => reports.push(Report::error(format!(
                "Error found with key {} in the 'integration' section: {}, got: {}",
                key, expectation, value
            ))),
            Some(_) => {}
        }
    }

    if m.upstream_str("license").is_empty() {
        reports.push(Report::error("Missing 'license' key in the upstream section"));
    }
    reports
}

fn license(m: &Manifest) -> Vec<Report> {
    // There may be multiple comma-separated licenses (c.f. Seafile).
    for license in m.upstream_str("license").split(',') {
        let license = license.trim();
        if license.is_empty() {
            continue;
        }

        if license.replace('-', "").contains("nonfree") {
            return vec![Report::warning(
                "'non-free' apps cannot be integrated in the app catalog.",
            )];
        }

        if !m.spdx_licenses.is_empty() && !m.spdx_licenses.iter().any(|id| id == license) {
            return vec![Report::warning(format!(
                "The license id '{}' is not registered in https://spdx.org/licenses/.",
                license
            ))];
        }
    }
    vec![]
}

fn description(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();

    let descr = match m.table.get("description") {
        Some(Value::Table(t)) => t.get("en").and_then(Value::as_str).unwrap_or(""),
        Some(Value::String(s)) => s,
        _ => "",
    };
    let descr_lower = descr.to_lowercase();
    let id = m.id().to_lowercase();
    let name = m.str_field("name").to_lowercase();

    if descr.len() < 5 || descr.len() > 150 {
        reports.push(Report::warning(
            "The description of your app is either missing, too short or too long... \
             Please describe in *concise* terms what the app is/does.",
        ));
    }
    if descr_lower.contains("for yunohost") {
        reports.push(Report::error(
            "The 'description' should explain what the app actually does. No need to \
             say that it is 'for YunoHost' - of course we know it is for YunoHost ;-).",
        ));
    }
    if (!id.is_empty() && descr_lower.starts_with(&id))
        || (!name.is_empty() && descr_lower.starts_with(&name))
    {
        reports.push(Report::warning(
            "Try to avoid starting the description by '$app is' ... explain what the \
             app is/does directly!",
        ));
    }
    reports
}

fn version_format(m: &Manifest) -> Vec<Report> {
    if VERSION_RE.is_match(m.str_field("version")) {
        return vec![];
    }
    vec![Report::error(
        "The 'version' field should match the format <upstreamversion>~ynh<packageversion>. \
         For example: 4.3-2~ynh3. It is composed of the upstream version number (in the \
         example, 4.3-2) and an incremental number for each change in the package without \
         upstream change (in the example, 3). This incremental number can be reset to 1 \
         each time the upstream version changes.",
    )]
}

fn custom_install_dir(m: &Manifest) -> Vec<Report> {
    let dir = m
        .section("resources")
        .and_then(|r| r.get("install_dir"))
        .and_then(Value::as_table)
        .and_then(|d| d.get("dir"))
        .and_then(Value::as_str)
        .unwrap_or("");
    if dir.starts_with("/opt/yunohost") {
        vec![Report::warning(
            "Installing apps in /opt/yunohost is deprecated ... the standard is to \
             install in /var/www/__APP__ (yes, even if not a webapp). Please stick to \
             the default value; the resource system automatically moves the install \
             dir if needed so backward compatibility is handled for you.",
        )]
    } else {
        vec![]
    }
}

const RECOGNIZED_ARG_TYPES: [&str; 21] = [
    "string", "text", "select", "tags", "email", "url", "date", "time", "color", "password",
    "path", "boolean", "domain", "user", "group", "number", "range", "alert", "markdown", "file",
    "app",
];

fn install_args(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();
    let Some(install) = m.section("install") else {
        return reports;
    };

    for (name, argument) in install {
        let Some(argument) = argument.as_table() else {
            continue;
        };

        if argument.get("optional").is_some_and(|v| v.as_bool().is_none()) {
            reports.push(Report::warning(format!(
                "The key 'optional' value for setting {} should be a boolean (true or false)",
                name
            )));
        }

        let arg_type = argument.get("type").and_then(Value::as_str);
        match arg_type {
            None => reports.push(Report::warning(format!(
                "You should specify the type of the argument '{}'. You can use: {}.",
                name,
                RECOGNIZED_ARG_TYPES.join(", ")
            ))),
            Some(t) if !RECOGNIZED_ARG_TYPES.contains(&t) => {
                reports.push(Report::warning(format!(
                    "The type '{}' for argument '{}' is not recognized... it probably \
                     doesn't behave as you expect? Choose among those instead: {}",
                    t,
                    name,
                    RECOGNIZED_ARG_TYPES.join(", ")
                )));
            }
            Some("boolean") => {
                if argument.get("default").is_some_and(|v| v.as_bool().is_none()) {
                    reports.push(Report::warning(
                        "Default value for boolean-type arguments should be a boolean... \
                         (in particular, make sure it's not a string!)",
                    ));
                }
            }
            Some("domain" | "user" | "password") => {
                if argument.contains_key("default") {
                    reports.push(Report::info(format!(
                        "Default value for argument {} is superfluous, will be ignored",
                        name
                    )));
                }
                if argument.contains_key("example") {
                    reports.push(Report::info(format!(
                        "Example value for argument {} is superfluous, will be ignored",
                        name
                    )));
                }
            }
            Some(_) => {}
        }

        if let Some(choices) = argument.get("choices").and_then(Value::as_array) {
            let choices: Vec<String> = choices
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_lowercase)
                .collect();
            if choices.len() == 2 {
                let has = |a: &str, b: &str| {
                    choices.iter().any(|c| c == a) && choices.iter().any(|c| c == b)
                };
                if has("true", "false") || has("yes", "no") {
                    reports.push(Report::warning(format!(
                        "Argument {} : you might want to simply use a boolean-type \
                         argument. No need to specify the choices list yourself.",
                        name
                    )));
                }
            }
        }
    }
    reports
}

/// Arg name/type pairs for which the core provides the 'ask' string.
const ASK_MANAGED_BY_CORE: [(&str, &str); 6] = [
    ("domain", "domain"),
    ("path", "path"),
    ("admin", "user"),
    ("is_public", "boolean"),
    ("password", "password"),
    ("init_main_permission", "group"),
];

fn obsolete_or_missing_ask_strings(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();
    let Some(install) = m.section("install") else {
        return reports;
    };

    for (name, argument) in install {
        let Some(argument) = argument.as_table() else {
            continue;
        };
        let arg_type = argument.get("type").and_then(Value::as_str).unwrap_or("");
        let managed = ASK_MANAGED_BY_CORE.contains(&(name.as_str(), arg_type));
        let has_ask = argument.contains_key("ask");

        if has_ask && managed {
            reports.push(Report::warning(format!(
                "'ask' string for argument {} is superfluous / will be ignored. The core \
                 handles the 'ask' string for some recurring arg name/type for \
                 consistency and easier i18n.",
                name
            )));
        } else if !has_ask && !managed {
            reports.push(Report::warning(format!(
                "You should add 'ask' strings for argument {}",
                name
            )));
        }
    }
    reports
}

fn old_php_version(m: &Manifest) -> Vec<Report> {
    let packages = m.apt_packages().join(" ");
    if packages.contains("php7.4-") {
        vec![Report::warning(
            "The app currently runs on php7.4 which is pretty old (unsupported by the \
             PHP group since January 2023). Ideally, upgrade it to at least php8.2.",
        )]
    } else if packages.contains("php8.0-") {
        vec![Report::warning(
            "The app currently runs on php8.0 which is pretty old (unsupported by the \
             PHP group since January 2024). Ideally, upgrade it to at least php8.2.",
        )]
    } else if packages.contains("php8.1-") {
        vec![Report::info(
            "The app currently runs on php8.1 which is deprecated since January 2024. \
             Ideally, upgrade it to at least php8.2.",
        )]
    } else {
        vec![]
    }
}

fn resource_consistency(m: &Manifest) -> Vec<Report> {
    let mut reports = Vec::new();
    let Some(resources) = m.section("resources") else {
        return reports;
    };

    if let Some(database) = resources.get("database").and_then(Value::as_table) {
        if !resources.contains_key("apt") {
            reports.push(Report::warning(
                "Having an 'apt' resource is mandatory when using a 'database' resource, \
                 to also install postgresql/mysql if needed",
            ));
        } else {
            let position = |key: &str| resources.keys().position(|k| k == key);
            if position("database") < position("apt") {
                reports.push(Report::warning(
                    "The 'apt' resource should be placed before the 'database' resource, \
                     to install postgresql/mysql if needed *before* provisioning the \
                     database",
                ));
            }

            let dbtype = database.get("type").and_then(Value::as_str).unwrap_or("");
            let apt_packages = m.apt_packages();
            if dbtype == "mysql" && !apt_packages.iter().any(|p| p == "mariadb-server") {
                reports.push(Report::warning(
                    "When using a mysql database, you should add mariadb-server in apt \
                     dependencies. Even though it's currently installed by default, it \
                     might not be in the future !",
                ));
            }
            if dbtype == "postgresql" && !apt_packages.iter().any(|p| p == "postgresql") {
                reports.push(Report::warning(
                    "When using a postgresql database, you should add postgresql in apt \
                     dependencies.",
                ));
            }
        }
    }

    let main_perm = resources
        .get("permissions")
        .and_then(Value::as_table)
        .and_then(|p| p.get("main"))
        .and_then(Value::as_table);
    if let Some(main_perm) = main_perm {
        let has_url = main_perm.get("url").and_then(Value::as_str).is_some();
        let has_init_question = m
            .section("install")
            .is_some_and(|i| i.contains_key("init_main_permission"));
        if has_url && !has_init_question && !main_perm.contains_key("allowed") {
            reports.push(Report::warning(
                "You should add a 'init_main_permission' question, or define `allowed` \
                 for main permission to have the app ready to be accessed right after \
                 installation.",
            ));
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Severity;

    fn manifest(raw: &str) -> Manifest {
        Manifest {
            raw: raw.to_string(),
            table: raw.parse::<toml::Table>().unwrap(),
            spdx_licenses: vec!["MIT".to_string(), "GPL-3.0-only".to_string()],
        }
    }

    const MINIMAL: &str = r#"
packaging_format = 2
id = "myapp"
name = "MyApp"
description = "Lightweight photo gallery with tagging"
version = "4.3-2~ynh3"
maintainers = ["jane"]

[upstream]
license = "MIT"
code = "https://github.com/upstream/myapp"

[integration]
yunohost = ">= 11.2"
architectures = "all"
multi_instance = true
ldap = false
sso = false
disk = "50M"
ram.build = "100M"
ram.runtime = "50M"

[install]
[install.domain]
type = "domain"

[resources]
[resources.apt]
packages = ["mariadb-server"]
[resources.database]
type = "mysql"
"#;

    #[test]
    fn test_minimal_manifest_is_quiet() {
        let m = manifest(MINIMAL);
        assert!(mandatory_fields(&m).is_empty());
        assert!(basic_fields_format(&m).is_empty());
        assert!(version_format(&m).is_empty());
        assert!(license(&m).is_empty());
        assert!(resource_consistency(&m).is_empty());
    }

    #[test]
    fn test_mandatory_fields_missing_is_critical() {
        let m = manifest("id = \"myapp\"\n");
        let reports = mandatory_fields(&m);
        assert!(reports.iter().any(|r| r.severity == Severity::Critical));
    }

    #[test]
    fn test_version_format() {
        let ok = ["1.2.3~ynh1", "4.3-2~ynh3", "v2.0rc1~ynh12", "1.0+deb1~ynh2"];
        let bad = ["1.2.3", "1.2.3-ynh1", "latest~ynh1", "1.2.3~ynh"];
        for v in ok {
            assert!(VERSION_RE.is_match(v), "{} should match", v);
        }
        for v in bad {
            assert!(!VERSION_RE.is_match(v), "{} should not match", v);
        }
    }

    #[test]
    fn test_app_id_pattern() {
        assert!(APP_ID_RE.is_match("my_app2"));
        assert!(!APP_ID_RE.is_match("MyApp"));
        assert!(!APP_ID_RE.is_match("my__app"));
    }

    #[test]
    fn test_old_yunohost_requirement() {
        let raw = MINIMAL.replace(">= 11.2", ">= 4.3");
        let reports = yunohost_version_requirement(&manifest(&raw));
        assert_eq!(reports[0].severity, Severity::Critical);

        let raw = MINIMAL.replace(">= 11.2", ">= 11.0");
        let reports = yunohost_version_requirement(&manifest(&raw));
        assert_eq!(reports[0].severity, Severity::Error);
    }

    #[test]
    fn test_unknown_license() {
        let raw = MINIMAL.replace("\"MIT\"", "\"MadeUp-1.0\"");
        let reports = license(&manifest(&raw));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].severity, Severity::Warning);
    }

    #[test]
    fn test_description_mentions_for_yunohost() {
        let raw = MINIMAL.replace(
            "Lightweight photo gallery with tagging",
            "A photo gallery for YunoHost",
        );
        let reports = description(&manifest(&raw));
        assert!(reports.iter().any(|r| r.severity == Severity::Error));
    }

    #[test]
    fn test_resource_order_matters() {
        let raw = r#"
[install]
[resources]
[resources.database]
type = "mysql"
[resources.apt]
packages = ["mariadb-server"]
"#;
        let reports = resource_consistency(&manifest(raw));
        assert!(reports
            .iter()
            .any(|r| r.message.contains("should be placed before")));
    }

    #[test]
    fn test_install_args_boolean_choices() {
        let raw = r#"
[install.enable_thing]
type = "select"
ask.en = "Enable?"
choices = ["yes", "no"]
"#;
        let reports = install_args(&manifest(raw));
        assert!(reports.iter().any(|r| r.message.contains("boolean-type")));
    }

    #[test]
    fn test_superfluous_ask_string() {
        let raw = r#"
[install.domain]
type = "domain"
ask.en = "Pick a domain"
"#;
        let reports = obsolete_or_missing_ask_strings(&manifest(raw));
        assert!(reports.iter().any(|r| r.message.contains("superfluous")));
    }
}
