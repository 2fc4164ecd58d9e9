//! Configurations suite: checks on `tests.toml` and the files under
//! `conf/` (systemd units, php-fpm pools, nginx snippets).

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::engine::{Report, Rule, Severity, Subject};

pub struct Configurations {
    pub app_path: PathBuf,
}

impl Configurations {
    pub fn new(app_path: &Path) -> Self {
        Self {
            app_path: app_path.to_path_buf(),
        }
    }

    fn conf_dir(&self) -> PathBuf {
        self.app_path.join("conf")
    }

    /// Regular files directly under `conf/`, sorted by name so reports
    /// come out in a stable order.
    fn conf_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.conf_dir()) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        files
    }
}

impl Subject for Configurations {
    fn identity(&self) -> &str {
        "configurations"
    }

    fn display_label(&self) -> String {
        "Configuration files".to_string()
    }
}

/// Reading an individual config file can fail without sinking the suite.
enum FileText {
    Text(String),
    NotText,
    Unreadable(std::io::Error),
}

fn read_text(path: &Path) -> FileText {
    match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => FileText::Text(text),
            Err(_) => FileText::NotText,
        },
        Err(err) => FileText::Unreadable(err),
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Degraded report for a file that could not be read as text, or `None`
/// with the content when it could.
fn text_or_report(path: &Path) -> Result<String, Option<Report>> {
    match read_text(path) {
        FileText::Text(text) => Ok(text),
        FileText::NotText => Err(Some(Report::info(format!(
            "{} does not look like a text file.",
            file_name(path)
        )))),
        FileText::Unreadable(err) => Err(Some(Report::warning(format!(
            "Can't open/read {} : {}",
            file_name(path),
            err
        )))),
    }
}

pub fn rules() -> Vec<Rule<Configurations>> {
    vec![
        Rule::new("configurations.tests_toml", tests_toml),
        Rule::new("configurations.encourage_extra_php_conf", encourage_extra_php_conf),
        Rule::new("configurations.misc_source_management", misc_source_management),
        Rule::new("configurations.systemd_config_specific_user", systemd_config_specific_user),
        Rule::new("configurations.systemd_config_harden_security", systemd_config_harden_security),
        Rule::new("configurations.php_config_specific_user", php_config_specific_user),
        Rule::new("configurations.nginx_http_host", nginx_http_host),
        Rule::new("configurations.nginx_https_redirect", nginx_https_redirect),
        Rule::new("configurations.nginx_add_header", nginx_add_header),
        Rule::new("configurations.nginx_more_set_headers", nginx_more_set_headers),
        Rule::new("configurations.nginx_regex_in_location", nginx_regex_in_location),
        Rule::new("configurations.bind_public_ip", bind_public_ip),
    ]
}

fn tests_toml(c: &Configurations) -> Vec<Report> {
    let path = c.app_path.join("tests.toml");
    let raw = fs::read_to_string(&path).unwrap_or_default();
    if raw.trim().is_empty() {
        return vec![Report::error(
            "The 'check_process' file that interfaces with the app CI has now been \
             replaced with the 'tests.toml' format and is now mandatory for apps v2.",
        )];
    }
    if let Err(err) = raw.parse::<toml::Table>() {
        return vec![Report::error(format!(
            "tests.toml doesn't look like valid TOML: {}",
            err
        ))];
    }
    vec![]
}

fn encourage_extra_php_conf(c: &Configurations) -> Vec<Report> {
    let php_conf = c.conf_dir().join("php-fpm.conf");
    let non_empty = fs::read_to_string(php_conf).is_ok_and(|t| !t.trim().is_empty());
    if non_empty {
        vec![Report::info(
            "For the php configuration, consider getting rid of php-fpm.conf and using \
             the --usage and --footprint option of ynh_add_fpm_config. This will use an \
             auto-generated php conf file. Additionally you can provide a \
             conf/extra_php-fpm.conf for custom PHP settings that will automatically be \
             appended to the autogenerated conf.",
        )]
    } else {
        vec![]
    }
}

fn misc_source_management(c: &Configurations) -> Vec<Report> {
    let source_dir = c.app_path.join("sources");
    let file_count = fs::read_dir(&source_dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0);
    if file_count > 5 {
        vec![Report::error(
            "Upstream app sources shouldn't be stored in the 'sources' folder of this \
             git repository as a copy/paste. During installation, the package should \
             download sources from upstream via 'ynh_setup_source'. See the helper \
             documentation.",
        )]
    } else {
        vec![]
    }
}

static ONESHOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ *Type=oneshot").unwrap());
static UNIT_USER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ *User=(\S+)").unwrap());

fn systemd_config_specific_user(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for file in c.conf_files() {
        let name = file_name(&file);
        if !name.ends_with(".service") {
            continue;
        }
        // Some apps only provide an override conf, which is different
        // from the full/base service config (c.f. ffsync)
        if name.contains("override") {
            continue;
        }

        let content = match text_or_report(&file) {
            Ok(content) => content,
            Err(report) => {
                reports.extend(report);
                continue;
            }
        };
        if !content.contains("[Unit]") {
            continue;
        }

        // oneshot units run once and exit; a missing User= is less of a deal
        let severity = if ONESHOT_RE.is_match(&content) {
            Severity::Info
        } else {
            Severity::Warning
        };

        let users: Vec<&str> = UNIT_USER_RE
            .captures_iter(&content)
            .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
            .collect();
        if users.is_empty() {
            reports.push(Report::new(
                severity,
                "You should specify a 'User=' directive in the systemd config !",
            ));
            continue;
        }
        if users.iter().any(|u| *u == "root" || *u == "www-data") {
            reports.push(Report::new(
                severity,
                "DO NOT run the app's systemd service as root or www-data! Use a \
                 dedicated system user for this app! If your app requires administrator \
                 privileges, you should consider adding the user to the sudoers (and \
                 restrict the commands it can use!)",
            ));
        }
    }
    reports
}

static HARDENING_RES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        Regex::new(r"(?m)^ *CapabilityBoundingSet=").unwrap(),
        Regex::new(r"(?m)^ *Protect.*=").unwrap(),
        Regex::new(r"(?m)^ *SystemCallFilter=").unwrap(),
        Regex::new(r"(?m)^ *PrivateTmp=").unwrap(),
    ]
});

fn systemd_config_harden_security(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for file in c.conf_files() {
        let name = file_name(&file);
        if !name.ends_with(".service") {
            continue;
        }
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        if HARDENING_RES.iter().any(|re| !re.is_match(&content)) {
            reports.push(Report::info(format!(
                "You are encouraged to harden the security of the systemd configuration \
                 {}. You can have a look at \
                 https://github.com/YunoHost/example_ynh/blob/master/conf/systemd.service#L14-L46 \
                 for a baseline.",
                name
            )));
        }
    }
    reports
}

static PHP_USER_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^ *(user|group) = (\S+)").unwrap());

fn php_config_specific_user(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for file in c.conf_files() {
        let name = file_name(&file);
        if !name.starts_with("php") || !name.ends_with(".conf") {
            continue;
        }

        let content = match text_or_report(&file) {
            Ok(content) => content,
            Err(report) => {
                reports.extend(report);
                continue;
            }
        };

        let matches: Vec<(&str, &str)> = PHP_USER_GROUP_RE
            .captures_iter(&content)
            .map(|caps| {
                (
                    caps.get(1).map_or("", |m| m.as_str()),
                    caps.get(2).map_or("", |m| m.as_str()),
                )
            })
            .collect();

        if !matches.iter().any(|(key, _)| *key == "user") {
            reports.push(Report::error(
                "You should at least specify a 'user =' directive in your PHP conf file",
            ));
            continue;
        }
        if matches
            .iter()
            .any(|(key, value)| *value == "root" || (*key == "user" && *value == "www-data"))
        {
            reports.push(Report::error(
                "DO NOT run the app PHP worker as root or www-data! Use a dedicated \
                 system user for this app!",
            ));
        }
    }
    reports
}

fn nginx_http_host(c: &Configurations) -> Vec<Report> {
    let Ok(content) = fs::read_to_string(c.conf_dir().join("nginx.conf")) else {
        return vec![];
    };
    if content.contains("$http_host") {
        vec![Report::info(
            "In nginx.conf : please don't use $http_host but $host instead. C.f. \
             https://github.com/yandex/gixy/blob/master/docs/en/plugins/hostspoofing.md",
        )]
    } else {
        vec![]
    }
}

fn nginx_conf_files(c: &Configurations) -> Vec<(String, String)> {
    c.conf_files()
        .into_iter()
        .filter(|p| file_name(p).contains("nginx"))
        .filter_map(|p| {
            let name = file_name(&p).to_string();
            fs::read_to_string(&p).ok().map(|content| (name, content))
        })
        .collect()
}

fn nginx_https_redirect(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for (_, content) in nginx_conf_files(c) {
        if content.contains("if ($scheme = http)") && content.contains("rewrite ^ https") {
            reports.push(Report::error(
                "The http->https redirect is handled by the core, therefore having an \
                 if ($scheme = http) { rewrite ^ https://... } block in the nginx \
                 config file is deprecated. (This helps with supporting the \
                 behind-reverse-proxy use case)",
            ));
        }
    }
    reports
}

fn nginx_add_header(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for (_, content) in nginx_conf_files(c) {
        if content.contains("location") && content.contains("add_header") {
            reports.push(Report::error(
                "Do not use 'add_header' in the NGINX conf. Use 'more_set_headers' \
                 instead. (See \
                 https://www.peterbe.com/plog/be-very-careful-with-your-add_header-in-nginx \
                 and https://github.com/openresty/headers-more-nginx-module#more_set_headers )",
            ));
        }
    }
    reports
}

static MORE_SET_HEADERS_OK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"more_set_headers +["'][\w-]+\s?: .*["'];"#).unwrap());

fn nginx_more_set_headers(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for (_, content) in nginx_conf_files(c) {
        if !content.contains("location") || !content.contains("more_set_headers") {
            continue;
        }
        let offending: Vec<&str> = content
            .lines()
            .filter(|line| line.contains("more_set_headers"))
            .filter(|line| !MORE_SET_HEADERS_OK_RE.is_match(line))
            .map(str::trim)
            .collect();
        if !offending.is_empty() {
            reports.push(Report::error(format!(
                "It looks like the syntax for the 'more_set_headers' instruction is \
                 incorrect in the NGINX conf (N.B. : it's different than the \
                 'add_header' syntax!)... The syntax should look like: \
                 more_set_headers \"Header-Name: value\"\nOffending line(s) [{}]",
                offending.join(", ")
            )));
        }
    }
    reports
}

fn nginx_regex_in_location(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    for (_, content) in nginx_conf_files(c) {
        if content.contains("location ~ __PATH__") {
            reports.push(Report::warning(
                "When using regexp in the nginx location field (location ~ __PATH__), \
                 start the path with ^ (location ~ ^__PATH__).",
            ));
        }
    }
    reports
}

static IP_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[ \t,='"(){}\[\]]"#).unwrap());

fn bind_public_ip(c: &Configurations) -> Vec<Report> {
    let mut reports = Vec::new();
    let conf_dir = c.conf_dir();
    if !conf_dir.exists() {
        return reports;
    }

    for entry in WalkDir::new(&conf_dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let content = match text_or_report(entry.path()) {
            Ok(content) => content,
            Err(report) => {
                reports.extend(report);
                continue;
            }
        };

        let rel = entry
            .path()
            .strip_prefix(&c.app_path)
            .unwrap_or(entry.path())
            .display()
            .to_string();
        for (number, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            let commented = ["#", "//", ";", "/*", "*"]
                .iter()
                .any(|c| trimmed.starts_with(c));
            if commented || (!line.contains("0.0.0.0") && !line.contains("::")) {
                continue;
            }
            let binds_public = IP_SPLIT_RE
                .split(line)
                .any(|token| token == "::" || token.starts_with("0.0.0.0"));
            if binds_public {
                reports.push(Report::info(format!(
                    "{}:{}: Binding to '0.0.0.0' or '::' can result in a security issue \
                     as the reverse proxy and the SSO can be bypassed by knowing a \
                     public IP (typically an IPv6) and the app port. Please be sure \
                     that this behavior is intentional. Maybe use '127.0.0.1' or '::1' \
                     instead.",
                    rel,
                    number + 1
                )));
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Severity;
    use tempfile::TempDir;

    fn app_with(files: &[(&str, &str)]) -> (TempDir, Configurations) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let configurations = Configurations::new(dir.path());
        (dir, configurations)
    }

    #[test]
    fn test_missing_tests_toml_is_error() {
        let (_dir, c) = app_with(&[]);
        let reports = tests_toml(&c);
        assert_eq!(reports[0].severity, Severity::Error);
    }

    #[test]
    fn test_valid_tests_toml_is_quiet() {
        let (_dir, c) = app_with(&[("tests.toml", "test_format = 1.0\n")]);
        assert!(tests_toml(&c).is_empty());
    }

    #[test]
    fn test_systemd_user_directive() {
        let unit = "[Unit]\nDescription=x\n[Service]\nExecStart=/usr/bin/x\n";
        let (_dir, c) = app_with(&[("conf/myapp.service", unit)]);
        let reports = systemd_config_specific_user(&c);
        assert_eq!(reports[0].severity, Severity::Warning);
        assert!(reports[0].message.contains("User="));
    }

    #[test]
    fn test_systemd_oneshot_downgrades_to_info() {
        let unit = "[Unit]\n[Service]\nType=oneshot\nExecStart=/usr/bin/x\n";
        let (_dir, c) = app_with(&[("conf/myapp.service", unit)]);
        let reports = systemd_config_specific_user(&c);
        assert_eq!(reports[0].severity, Severity::Info);
    }

    #[test]
    fn test_systemd_root_user() {
        let unit = "[Unit]\n[Service]\nUser=root\nExecStart=/usr/bin/x\n";
        let (_dir, c) = app_with(&[("conf/myapp.service", unit)]);
        let reports = systemd_config_specific_user(&c);
        assert!(reports[0].message.contains("DO NOT run"));
    }

    #[test]
    fn test_php_pool_needs_user() {
        let (_dir, c) = app_with(&[("conf/php-fpm.conf", "[__APP__]\nlisten = x\n")]);
        let reports = php_config_specific_user(&c);
        assert_eq!(reports[0].severity, Severity::Error);
    }

    #[test]
    fn test_nginx_add_header() {
        let conf = "location __PATH__/ {\n  add_header X-Foo bar;\n}\n";
        let (_dir, c) = app_with(&[("conf/nginx.conf", conf)]);
        assert_eq!(nginx_add_header(&c)[0].severity, Severity::Error);
    }

    #[test]
    fn test_nginx_more_set_headers_syntax() {
        let good = "location / {\n  more_set_headers \"X-Foo: bar\";\n}\n";
        let (_dir, c) = app_with(&[("conf/nginx.conf", good)]);
        assert!(nginx_more_set_headers(&c).is_empty());

        let bad = "location / {\n  more_set_headers X-Foo bar;\n}\n";
        let (_dir, c) = app_with(&[("conf/nginx.conf", bad)]);
        assert_eq!(nginx_more_set_headers(&c).len(), 1);
    }

    #[test]
    fn test_bind_public_ip() {
        let conf = "bind_address = 0.0.0.0\n# listen :: is commented\n";
        let (_dir, c) = app_with(&[("conf/app.ini", conf)]);
        let reports = bind_public_ip(&c);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].severity, Severity::Info);
        assert!(reports[0].message.contains("conf/app.ini:1"));
    }
}
