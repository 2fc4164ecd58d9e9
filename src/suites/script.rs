//! Script suite: checks on the shell scripts under `scripts/`.
//!
//! One `Script` subject is built per script name, and the same rule list
//! runs for each of them; per-script applicability is expressed through
//! rule scopes (`only` / `ignore` on the script name).

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::{Report, Rule, Scope, Subject};
use crate::shell;

/// The script names analyzed, in traversal order.
pub const SCRIPT_NAMES: [&str; 6] = [
    "_common.sh",
    "install",
    "remove",
    "upgrade",
    "backup",
    "restore",
];

/// Weight spread above which the progress bar becomes meaningless.
const WEIGHT_STDEV_CUTOFF: f64 = 50.0;

pub struct Script {
    pub name: String,
    pub app_path: PathBuf,
    pub app_id: String,
    pub path: PathBuf,
    pub exists: bool,
    /// Raw file content; some rules look at comments and exact quoting.
    pub raw: String,
    /// Tokenized logical lines (comments stripped, continuations merged).
    pub lines: Vec<Vec<String>>,
}

impl Script {
    pub fn load(app_path: &Path, name: &str, app_id: &str) -> Self {
        let path = app_path.join("scripts").join(name);
        let raw = std::fs::read_to_string(&path).unwrap_or_default();
        let exists = !raw.trim().is_empty();

        let mut lines = Vec::new();
        let mut parse_failures = 0usize;
        if exists {
            for line in shell::logical_lines(&raw) {
                match shell::split_words(&line) {
                    Ok(words) => lines.push(words),
                    Err(_) => parse_failures += 1,
                }
            }
            if parse_failures > 0 {
                eprintln!(
                    "Some lines could not be parsed in script {}. (That's probably not really critical)",
                    name
                );
            }
        }

        Self {
            name: name.to_string(),
            app_path: app_path.to_path_buf(),
            app_id: app_id.to_string(),
            path,
            exists,
            raw,
            lines,
        }
    }

    /// Tokenized lines re-joined with single spaces; substring and regex
    /// matching happens on this normalized form.
    fn joined_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().map(|words| words.join(" "))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.joined_lines().any(|line| line.contains(needle))
    }

    pub fn contains_regex(&self, re: &Regex) -> bool {
        self.joined_lines().any(|line| re.is_match(&line))
    }

    pub fn occurences(&self, needle: &str) -> Vec<String> {
        self.joined_lines()
            .filter(|line| line.contains(needle))
            .collect()
    }
}

impl Subject for Script {
    fn identity(&self) -> &str {
        &self.name
    }

    fn display_label(&self) -> String {
        format!("scripts/{}", self.name)
    }
}

pub fn rules() -> Vec<Rule<Script>> {
    vec![
        Rule::new("script.error_handling", error_handling),
        // Custom not-yet-official helpers sometimes legitimately need raw apt
        Rule::scoped("script.raw_apt_commands", Scope::ignore(&["_common.sh"]), raw_apt_commands),
        Rule::new("script.obsolete_helpers", obsolete_helpers),
        Rule::scoped("script.deprecated_arg_fetching", Scope::only(&["install"]), deprecated_arg_fetching),
        Rule::scoped("script.deprecated_replace_string", Scope::only(&["install", "upgrade"]), deprecated_replace_string),
        Rule::new("script.bad_if_syntax", bad_if_syntax),
        Rule::new("script.bad_ynh_exec_syntax", bad_ynh_exec_syntax),
        Rule::new("script.setup_source_keep_absolute_path", setup_source_keep_absolute_path),
        Rule::new("script.npm_global_install", npm_global_install),
        Rule::new("script.fpm_config_package_option", fpm_config_package_option),
        Rule::new("script.set_is_public_setting", set_is_public_setting),
        Rule::scoped("script.get_is_public_setting", Scope::ignore(&["install", "_common.sh"]), get_is_public_setting),
        Rule::scoped("script.default_php_version_in_common", Scope::only(&["_common.sh"]), default_php_version_in_common),
        Rule::scoped("script.visitors_toggle_during_upgrade", Scope::only(&["upgrade"]), visitors_toggle_during_upgrade),
        Rule::new("script.set_legacy_permissions", set_legacy_permissions),
        Rule::new("script.normalize_url_path", normalize_url_path),
        Rule::new("script.unsafe_remove", unsafe_remove),
        Rule::new("script.fixme_markers", fixme_markers),
        Rule::new("script.nginx_restart", nginx_restart),
        Rule::new("script.raw_systemctl_start", raw_systemctl_start),
        Rule::new("script.bad_line_match", bad_line_match),
        Rule::new("script.quiet_systemctl_enable", quiet_systemctl_enable),
        Rule::new("script.quiet_wget", quiet_wget),
        Rule::scoped("script.argument_fetching", Scope::only(&["install"]), argument_fetching),
        Rule::scoped("script.sources_list_tweaking", Scope::only(&["install"]), sources_list_tweaking),
        Rule::new("script.firewall_consistency", firewall_consistency),
        Rule::new("script.exit_ynhdie", exit_ynhdie),
        Rule::new("script.old_regenconf", old_regenconf),
        Rule::new("script.ssowatconf_or_nginx_reload", ssowatconf_or_nginx_reload),
        Rule::new("script.sed_in_place", sed_in_place),
        Rule::new("script.sudo_usage", sudo_usage),
        Rule::new("script.chown_root", chown_root),
        Rule::new("script.chmod777", chmod777),
        Rule::new("script.weak_random", weak_random),
        Rule::scoped("script.progression", Scope::only(&["install"]), progression),
        Rule::scoped("script.progression_in_backup", Scope::only(&["backup"]), progression_in_backup),
        Rule::new("script.progression_time", progression_time),
        Rule::scoped("script.progression_meaningful_weights", Scope::ignore(&["_common.sh", "backup"]), progression_meaningful_weights),
        Rule::scoped("script.php_version_in_deps", Scope::only(&["install", "_common.sh"]), php_version_in_deps),
        Rule::scoped("script.systemd_during_backup", Scope::only(&["backup"]), systemd_during_backup),
        Rule::new("script.helpers_sourcing_after_official", helpers_sourcing_after_official),
        Rule::scoped("script.helpers_sourcing_backuprestore", Scope::only(&["backup", "restore"]), helpers_sourcing_backuprestore),
        Rule::scoped("script.no_progress_in_common", Scope::only(&["_common.sh"]), no_progress_in_common),
        Rule::scoped("script.no_log_remove", Scope::only(&["remove"]), no_log_remove),
    ]
}

fn error_handling(s: &Script) -> Vec<Report> {
    if s.contains("ynh_abort_if_errors") || s.contains("set -eu") || s.contains("set -u") {
        vec![Report::error(
            "ynh_abort_if_errors or set -eu is now handled by the core in packaging v2, \
             you should not have to add it to your script !",
        )]
    } else {
        vec![]
    }
}

fn raw_apt_commands(s: &Script) -> Vec<Report> {
    let mut reports = Vec::new();
    if s.contains("ynh_package_install")
        || s.contains("apt install")
        || s.contains("apt-get install")
    {
        reports.push(Report::error(
            "You should not use `ynh_package_install` or `apt-get install`, use \
             `ynh_install_app_dependencies` instead",
        ));
    }
    if s.contains("ynh_package_remove") || s.contains("apt remove") || s.contains("apt-get remove")
    {
        reports.push(Report::error(
            "You should not use `ynh_package_remove` or `apt-get remove`, use \
             `ynh_remove_app_dependencies` instead",
        ));
    }
    reports
}

fn obsolete_helpers(s: &Script) -> Vec<Report> {
    let mut reports = Vec::new();
    if s.contains("yunohost app setting") {
        reports.push(Report::critical(
            "Do not use 'yunohost app setting' directly. Please use \
             'ynh_app_setting_(set,get,delete)' instead.",
        ));
    }
    if s.contains("ynh_detect_arch") {
        reports.push(Report::warning(
            "Using ynh_detect_arch is deprecated, an $YNH_ARCH variable is directly \
             available in the global context. Its value directly corresponds to \
             `dpkg --print-architecture`.",
        ));
    }
    reports
}

fn deprecated_arg_fetching(s: &Script) -> Vec<Report> {
    let deprecated = s
        .raw
        .lines()
        .any(|line| line.contains("YNH_APP_ARG") && !line.contains("YNH_APP_ARG_PASSWORD"));
    if deprecated {
        vec![Report::warning(
            "Using the YNH_APP_ARG_ syntax is deprecated and will be removed in the \
             future (except for password-type questions which are a specific case). \
             Questions are saved as settings and directly available as bash variable \
             $foobar (instead of $YNH_APP_ARG_FOOBAR)",
        )]
    } else {
        vec![]
    }
}

static REPLACE_STRING_TEMPLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_replace_string.*__\w+__").unwrap());

fn deprecated_replace_string(s: &Script) -> Vec<Report> {
    let total = s
        .raw
        .lines()
        .filter(|line| line.contains("ynh_replace_string"))
        .count();
    let templated = s
        .raw
        .lines()
        .filter(|line| REPLACE_STRING_TEMPLATE_RE.is_match(line))
        .count();
    if templated > 0 || total >= 5 {
        vec![Report::info(
            "Please consider using 'ynh_add_config' to handle config files instead of \
             gazillions of manual cp + 'ynh_replace_string' + chmod",
        )]
    } else {
        vec![]
    }
}

static BAD_IF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\s*!?\s*"?(\$\(|`).*(\)|`)"?\s\]\s*(;?\s*then\s*$|&&|$)"#).unwrap()
});

fn bad_if_syntax(s: &Script) -> Vec<Report> {
    let culprits: Vec<&str> = s
        .raw
        .lines()
        .filter(|line| {
            BAD_IF_RE.is_match(line)
                && !line.contains(" == ")
                && !line.contains(" != ")
                && !line.contains(" = ")
        })
        .collect();
    if culprits.is_empty() {
        return vec![];
    }
    vec![Report::warning(format!(
        "Syntaxes like « if [ $(cmd) ] » are pretty much nonsense in bash and probably \
         don't mean what you think they mean ... If you want to check that the output of \
         the command is non-empty, use « [ -n \"$(cmd)\" ] ». If you want to check for \
         the return-code of the command, simply use « if cmd ».\nCulprit(s):\n\n{}",
        culprits.join("\n")
    ))]
}

static BAD_YNH_EXEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"ynh_exec_(err|warn|warn_less|quiet|fully_quiet) ("|').*("|')$"#).unwrap()
});

fn bad_ynh_exec_syntax(s: &Script) -> Vec<Report> {
    if s.raw.lines().any(|line| BAD_YNH_EXEC_RE.is_match(line)) {
        vec![Report::warning(
            "When using ynh_exec_*, please don't wrap your command between quotes \
             (typically DON'T write ynh_exec_warn_less 'foo --bar --baz')",
        )]
    } else {
        vec![]
    }
}

static SETUP_SOURCE_KEEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_setup_source.*keep.*install_dir").unwrap());

fn setup_source_keep_absolute_path(s: &Script) -> Vec<Report> {
    if s.raw.lines().any(|line| SETUP_SOURCE_KEEP_RE.is_match(line)) {
        vec![Report::info(
            "The --keep option of ynh_setup_source expects relative paths, not absolute \
             paths ... you do not need to prefix everything with '$install_dir' in the \
             --keep arg ...",
        )]
    } else {
        vec![]
    }
}

static NPM_GLOBAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"ynh_npm.*install.*global").unwrap());

fn npm_global_install(s: &Script) -> Vec<Report> {
    if s.contains_regex(&NPM_GLOBAL_RE) {
        vec![Report::warning(
            "Please don't install stuff on global scope with npm install --global é_è",
        )]
    } else {
        vec![]
    }
}

static FPM_PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_add_fpm_config .*package=.*").unwrap());

fn fpm_config_package_option(s: &Script) -> Vec<Report> {
    if s.contains_regex(&FPM_PACKAGE_RE) {
        vec![Report::error(
            "Option --package for ynh_add_fpm_config is deprecated : please use \
             'ynh_install_app_dependencies' with **all** your apt dependencies instead \
             (no need to define a special 'extra_php_dependencies'). Any phpX.Y-fpm / \
             phpX.Y-common is installed automatically if needed.",
        )]
    } else {
        vec![]
    }
}

static SET_IS_PUBLIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_app_setting_set .*is_public.*").unwrap());

fn set_is_public_setting(s: &Script) -> Vec<Report> {
    if !s.contains_regex(&SET_IS_PUBLIC_RE) {
        return vec![];
    }
    let message = "permission system: it should not be needed to save is_public with \
                   ynh_app_setting_set ... this setting should only be used during \
                   installation to initialize the permission. The admin is likely to \
                   manually tweak the permission later.";
    if s.name == "upgrade" {
        vec![Report::error(message)]
    } else {
        vec![Report::warning(message)]
    }
}

fn get_is_public_setting(s: &Script) -> Vec<Report> {
    if s.contains("is_public=") || s.contains("$is_public") {
        vec![Report::warning(
            "permission system: there should be no need to fetch or use $is_public ... \
             is_public should only be used during installation to initialize the \
             permission. The admin is likely to manually tweak the permission later.",
        )]
    } else {
        vec![]
    }
}

fn default_php_version_in_common(s: &Script) -> Vec<Report> {
    if s.contains("YNH_DEFAULT_PHP_VERSION") {
        vec![Report::warning(
            "Do not use YNH_DEFAULT_PHP_VERSION in _common.sh ... _common.sh is usually \
             sourced *before* the helpers, which define YNH_DEFAULT_PHP_VERSION (hence \
             it gets replaced with empty string). Instead, please explicitly state the \
             PHP version in the package, e.g. dependencies='php8.2-cli php8.2-imagemagick'",
        )]
    } else {
        vec![]
    }
}

static VISITORS_ADD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_permission_update.*add.*visitors").unwrap());
static VISITORS_REMOVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_permission_update.*remove.*visitors").unwrap());

fn visitors_toggle_during_upgrade(s: &Script) -> Vec<Report> {
    if s.contains_regex(&VISITORS_ADD_RE) && s.contains_regex(&VISITORS_REMOVE_RE) {
        vec![Report::warning(
            "permission system: there should be no need to temporarily add 'visitors' \
             to the main permission. ynh_local_curl will temporarily enable visitors \
             access if needed",
        )]
    } else {
        vec![]
    }
}

static LEGACY_URIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_app_setting_set .*(protected_uris|skipped_uris)").unwrap());
static LEGACY_PERMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_app_setting_set .*(protected_|skipped_)").unwrap());

fn set_legacy_permissions(s: &Script) -> Vec<Report> {
    if s.contains_regex(&LEGACY_URIS_RE) {
        vec![Report::error(
            "permission system: it looks like the app is still using super-legacy \
             (un)protected/skipped_uris settings. This is now completely deprecated. \
             Please check https://yunohost.org/packaging_apps_permissions for how to \
             migrate to the new permission system.",
        )]
    } else if s.contains_regex(&LEGACY_PERMS_RE) {
        vec![Report::warning(
            "permission system: it looks like the app is still using the legacy \
             permission system (unprotected/protected/skipped uris/regexes setting). \
             Please check https://yunohost.org/packaging_apps_permissions for how to \
             migrate to the new permission system.",
        )]
    } else {
        vec![]
    }
}

fn normalize_url_path(s: &Script) -> Vec<Report> {
    if s.contains("ynh_normalize_url_path") {
        vec![Report::warning(
            "You probably don't need to call 'ynh_normalize_url_path'... this is only \
             relevant for upgrades from super-old versions",
        )]
    } else {
        vec![]
    }
}

fn unsafe_remove(s: &Script) -> Vec<Report> {
    if s.contains("rm -r") || s.contains("rm -R") || s.contains("rm -fr") || s.contains("rm -fR") {
        vec![Report::error(
            "You should not be using 'rm -rf', please use 'ynh_secure_remove' instead",
        )]
    } else {
        vec![]
    }
}

fn fixme_markers(s: &Script) -> Vec<Report> {
    let mut reports = Vec::new();
    if s.raw.contains("#REMOVEME?") {
        reports.push(Report::warning(
            "There are still some REMOVEME? flags to be taken care of",
        ));
    }
    if s.raw.contains("# FIXMEhelpers2.1") {
        reports.push(Report::warning(
            "There are still some FIXMEhelpers2.1 flags to be taken care of",
        ));
    }
    reports
}

fn nginx_restart(s: &Script) -> Vec<Report> {
    if s.contains("systemctl restart nginx") || s.contains("service nginx restart") {
        vec![Report::error(
            "Restarting NGINX is quite dangerous (especially for web installs) and \
             should be avoided at all cost. Use 'reload' instead.",
        )]
    } else {
        vec![]
    }
}

static RAW_SYSTEMCTL_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"systemctl start "?[^. ]+(\.service)?"?\s"#).unwrap());

fn raw_systemctl_start(s: &Script) -> Vec<Report> {
    if s.contains_regex(&RAW_SYSTEMCTL_START_RE) {
        vec![Report::warning(
            "Please do not use 'systemctl start' to start services. Instead, you should \
             use 'ynh_systemd_action' which will display the service log in case it \
             fails to start. You can also use '--line_match' to wait until some specific \
             word appears in the log, signaling the service indeed fully started.",
        )]
    } else {
        vec![]
    }
}

static BAD_LINE_MATCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--line_match=(Started|Stopped)$").unwrap());

fn bad_line_match(s: &Script) -> Vec<Report> {
    if s.contains_regex(&BAD_LINE_MATCH_RE) {
        vec![Report::warning(
            "Using --line_match=\"Started\" or \"Stopped\" in ynh_systemd_action is \
             counter productive because it will match the systemd message and not the \
             actual app message ... Please check the log of the service to find an \
             actual, relevant message to match, or remove the --line_match option \
             entirely",
        )]
    } else {
        vec![]
    }
}

static SYSTEMCTL_ENABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*systemctl.*(enable|disable)").unwrap());

fn quiet_systemctl_enable(s: &Script) -> Vec<Report> {
    let noisy = s
        .joined_lines()
        .filter(|line| SYSTEMCTL_ENABLE_RE.is_match(line))
        .any(|line| !line.contains("-q"));
    if noisy {
        vec![Report::warning(
            "Please add --quiet to systemctl enable/disable commands to avoid \
             unnecessary warnings when the script runs",
        )]
    } else {
        vec![]
    }
}

fn quiet_wget(s: &Script) -> Vec<Report> {
    let noisy = s
        .joined_lines()
        .filter(|line| line.starts_with("wget "))
        .any(|line| !line.contains(" -q ") && !line.contains("--quiet") && !line.contains("2>"));
    if noisy {
        vec![Report::warning(
            "Please redirect wget's stderr to stdout with 2>&1 to avoid unnecessary \
             warnings when the script runs (yes, wget is annoying and displays a \
             warning even when things are going okay >_> ...)",
        )]
    } else {
        vec![]
    }
}

static POSITIONAL_ARG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+=\$\{?[0-9]").unwrap());

fn argument_fetching(s: &Script) -> Vec<Report> {
    if s.contains_regex(&POSITIONAL_ARG_RE) {
        vec![Report::critical(
            "Do not fetch arguments from manifest using 'variable=$N' (e.g. \
             domain=$1...) Instead, use 'name=$YNH_APP_ARG_NAME'",
        )]
    } else {
        vec![]
    }
}

fn sources_list_tweaking(s: &Script) -> Vec<Report> {
    let common = std::fs::read_to_string(s.app_path.join("scripts").join("_common.sh"))
        .unwrap_or_default();
    let tweaked_in_common =
        common.contains("/etc/apt/sources.list") && !common.contains("ynh_add_repo");
    if s.contains("/etc/apt/sources.list") || tweaked_in_common {
        vec![Report::error(
            "Manually messing with apt's sources.lists is strongly discouraged and \
             should be avoided. Please use 'ynh_install_extra_app_dependencies' if you \
             need to install dependencies from a custom apt repo.",
        )]
    } else {
        vec![]
    }
}

fn firewall_consistency(s: &Script) -> Vec<Report> {
    let mut reports = Vec::new();
    if s.contains("yunohost firewall allow") && !s.contains("--needs_exposed_ports") {
        reports.push(Report::info(
            "You used 'yunohost firewall allow' to expose a port on the outside but did \
             not use 'yunohost service add' with '--needs_exposed_ports' ... If you are \
             ABSOLUTELY SURE that the service needs to be exposed on THE OUTSIDE, then \
             add '--needs_exposed_ports' to 'yunohost service add' with the relevant \
             port number. Otherwise, opening the port leads to a significant security \
             risk and you should keep the damn port closed !",
        ));
    }
    if s.contains("Configuring firewall") && !s.contains("yunohost firewall allow") {
        reports.push(Report::warning(
            "Some message is talking about 'Configuring firewall' but there's no \
             mention of 'yunohost firewall allow' ... If you're only finding an \
             available port for *internal reverse proxy*, this has nothing to do with \
             'Configuring the firewall', so the message should be changed to avoid \
             confusion...",
        ));
    }
    reports
}

static EXIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexit\b").unwrap());

fn exit_ynhdie(s: &Script) -> Vec<Report> {
    if s.contains_regex(&EXIT_RE) {
        vec![Report::error(
            "'exit' command shouldn't be used. Please use 'ynh_die' instead.",
        )]
    } else {
        vec![]
    }
}

fn old_regenconf(s: &Script) -> Vec<Report> {
    if s.contains("yunohost service regen-conf") {
        vec![Report::error(
            "'yunohost service regen-conf' has been replaced by 'yunohost tools \
             regen-conf'.",
        )]
    } else {
        vec![]
    }
}

fn ssowatconf_or_nginx_reload(s: &Script) -> Vec<Report> {
    // Only the trailing lines matter: the bad practice is doing this at
    // the very end, some apps legitimately need it mid-script.
    let tail: Vec<String> = {
        let all: Vec<String> = s.joined_lines().collect();
        let start = all.len().saturating_sub(10);
        all[start..].to_vec()
    };

    let mut reports = Vec::new();
    if tail.iter().any(|l| l.contains("yunohost app ssowatconf")) {
        reports.push(Report::warning(
            "You probably don't need to run 'yunohost app ssowatconf' in the app \
             script. It's supposed to be ran automatically after the script.",
        ));
    }
    if s.name != "restore"
        && tail
            .iter()
            .any(|l| l.contains("ynh_systemd_action --service_name=nginx --action=reload"))
    {
        reports.push(Report::warning(
            "You should not need to reload nginx at the end of the script ... it's \
             already taken care of by ynh_add_nginx_config",
        ));
    }
    reports
}

static SED_IN_PLACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sed\s+(-i|--in-place)\s+(-r\s+)?s").unwrap());
static SED_IN_PLACE_AFTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sed\s+s\S*\s+(-i|--in-place)").unwrap());

fn sed_in_place(s: &Script) -> Vec<Report> {
    if s.contains_regex(&SED_IN_PLACE_RE) || s.contains_regex(&SED_IN_PLACE_AFTER_RE) {
        vec![Report::info(
            "You should avoid using 'sed -i' for substitutions, please use \
             'ynh_replace_string' or 'ynh_add_config' instead",
        )]
    } else {
        vec![]
    }
}

// \w avoids matching 'sudo -u', a legit use while ynh_exec_as is not official
static SUDO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"sudo \w").unwrap());

fn sudo_usage(s: &Script) -> Vec<Report> {
    if s.contains_regex(&SUDO_RE) {
        vec![Report::warning(
            "You should not need to use 'sudo', the script is being run as root. (If \
             you need to run a command using a specific user, use 'ynh_exec_as' (or \
             'sudo -u'))",
        )]
    } else {
        vec![]
    }
}

static CHOWN_ROOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*chown.* root:?[^$]* .*install_dir").unwrap());

fn chown_root(s: &Script) -> Vec<Report> {
    // my_webapp has a legit use case for this because of SFTP
    if s.app_id == "my_webapp" {
        return vec![];
    }
    if s.contains_regex(&CHOWN_ROOT_RE) && !s.contains("chown root:root $install_dir") {
        vec![Report::warning(
            "Using 'chown root $install_dir' is usually symptomatic of misconfigured \
             and wide-open 'other' permissions ... Usually ynh_setup_source should now \
             set sane default permissions on $install_dir ... Otherwise, consider using \
             'chown $app', 'chown nobody' or 'chmod' to limit access to $install_dir ...",
        )]
    } else {
        vec![]
    }
}

static CHMOD_777_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"chmod .*(777|o\+w)").unwrap());

fn chmod777(s: &Script) -> Vec<Report> {
    if s.contains_regex(&CHMOD_777_RE) {
        vec![Report::warning(
            "DO NOT use chmod 777 or chmod o+w that gives write permission to every \
             user on the system!!! If you have permission issues, just make sure that \
             the owner and/or group owner is right...",
        )]
    } else {
        vec![]
    }
}

fn weak_random(s: &Script) -> Vec<Report> {
    if s.contains("dd if=/dev/urandom") || s.contains("openssl rand") {
        vec![Report::error(
            "Instead of 'dd if=/dev/urandom' or 'openssl rand', you should use \
             'ynh_string_random'",
        )]
    } else {
        vec![]
    }
}

fn progression(s: &Script) -> Vec<Report> {
    if !s.contains("ynh_script_progression") {
        vec![Report::warning(
            "Please add a few messages for the user using 'ynh_script_progression' to \
             explain what is going on (in friendly, not-too-technical terms) during the \
             installation. (and ideally in scripts remove, upgrade and restore too)",
        )]
    } else {
        vec![]
    }
}

fn progression_in_backup(s: &Script) -> Vec<Report> {
    if s.contains("ynh_script_progression") {
        vec![Report::warning(
            "We recommend to *not* use 'ynh_script_progression' in backup scripts \
             because no actual work happens when running the script : only the list of \
             things to backup is fetched (apart from the DB dumps which effectively \
             happen during the script...). Consider using a simple message like this \
             instead: 'ynh_print_info \"Declaring files to be backed up...\"'",
        )]
    } else {
        vec![]
    }
}

static PROGRESSION_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_script_progression.*--time").unwrap());

fn progression_time(s: &Script) -> Vec<Report> {
    if s.contains_regex(&PROGRESSION_TIME_RE) {
        vec![Report::info(
            "Using 'ynh_script_progression --time' should only be for calibrating the \
             weight (c.f. '--weight'). It's not meant to be kept for production \
             versions.",
        )]
    } else {
        vec![]
    }
}

static PROGRESSION_WEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ynh_script_progression.*--weight=([0-9]+)").unwrap());

fn progression_meaningful_weights(s: &Script) -> Vec<Report> {
    let weights: Vec<f64> = s
        .joined_lines()
        .filter(|line| line.contains("ynh_script_progression"))
        .map(|line| {
            PROGRESSION_WEIGHT_RE
                .captures(&line)
                .and_then(|caps| caps[1].parse::<f64>().ok())
                .unwrap_or(1.0)
        })
        .collect();

    if weights.len() > 3 && sample_stdev(&weights) > WEIGHT_STDEV_CUTOFF {
        vec![Report::warning(
            "To have a meaningful progress bar, try to keep the weights in the same \
             range of values, for example [1,10], or [10,100]... otherwise, if you have \
             super-huge weight differences, the progress bar rendering will be \
             completely dominated by one or two steps... If these steps are really \
             long, just try to indicate in the message that this will take a while.",
        )]
    } else {
        vec![]
    }
}

fn sample_stdev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

static PHP_UNVERSIONED_DEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"dependencies.*php-").unwrap());

fn php_version_in_deps(s: &Script) -> Vec<Report> {
    if !s.contains_regex(&PHP_UNVERSIONED_DEP_RE) {
        return vec![];
    }
    // Some apps depend on php-pear or php-php-gettext and there's no
    // phpX.Y-pear / phpX.Y-php-gettext equivalent.
    if !s.contains("php-pear") || !s.contains("php-php-gettext") {
        vec![Report::warning(
            "You should avoid having dependencies like 'php-foobar'. Instead, specify \
             the exact version you want like 'php8.2-foobar'. Otherwise, the *wrong* \
             version of the dependency may be installed if sury is also installed.",
        )]
    } else {
        vec![]
    }
}

static SYSTEMD_ACTION_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ynh_systemd_action").unwrap());

fn systemd_during_backup(s: &Script) -> Vec<Report> {
    if s.contains_regex(&SYSTEMD_ACTION_LINE_RE) {
        vec![Report::warning(
            "Unless you really have a good reason to do so, starting/stopping services \
             during backup has no benefit and leads to unnecessary service \
             interruptions when creating backups... Running the backup script is only a \
             *declaration* of what needs to be backed up; the real copy and archive \
             creation happens *after* the backup script is ran.",
        )]
    } else {
        vec![]
    }
}

static OFFICIAL_HELPERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*source\s+/usr/share/yunohost/helpers").unwrap());
static SOURCE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*source\s+(\S+)").unwrap());

fn helpers_sourcing_after_official(s: &Script) -> Vec<Report> {
    let head: Vec<&str> = s.raw.lines().take(30).collect();
    let Some(official_at) = head.iter().position(|line| OFFICIAL_HELPERS_RE.is_match(line))
    else {
        return vec![];
    };

    let late_sources: Vec<&str> = head
        .iter()
        .skip(official_at + 1)
        .take(10)
        .filter_map(|line| SOURCE_LINE_RE.captures(line))
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .collect();

    if late_sources.is_empty() {
        return vec![];
    }
    vec![Report::warning(format!(
        "Please avoid sourcing additional helpers after the official helpers (in this \
         case file {})",
        late_sources.join(", ")
    ))]
}

fn helpers_sourcing_backuprestore(s: &Script) -> Vec<Report> {
    if s.contains("source _common.sh") || s.contains("source ./_common.sh") {
        vec![Report::error(
            "In the context of backup and restore scripts, you should load _common.sh \
             with \"source ../settings/scripts/_common.sh\"",
        )]
    } else {
        vec![]
    }
}

fn no_progress_in_common(s: &Script) -> Vec<Report> {
    if s.contains("ynh_script_progression") {
        vec![Report::warning(
            "You should not use `ynh_script_progression` in _common.sh because it will \
             produce warnings when trying to install the application.",
        )]
    } else {
        vec![]
    }
}

static LOG_REMOVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(ynh_secure_remove|ynh_safe_rm|rm).*(/var/log/)").unwrap());

fn no_log_remove(s: &Script) -> Vec<Report> {
    if s.contains_regex(&LOG_REMOVE_RE) {
        vec![Report::warning(
            "Do not delete logs on app removal, else they will be erased if the app \
             upgrade fails. This is handled by the core.",
        )]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Severity;

    fn script(name: &str, content: &str) -> Script {
        let raw = content.to_string();
        let lines = shell::logical_lines(&raw)
            .iter()
            .filter_map(|l| shell::split_words(l).ok())
            .collect();
        Script {
            name: name.to_string(),
            app_path: PathBuf::from("/nonexistent"),
            app_id: "myapp".to_string(),
            path: PathBuf::from("/nonexistent/scripts").join(name),
            exists: true,
            raw,
            lines,
        }
    }

    #[test]
    fn test_unsafe_remove() {
        let s = script("remove", "rm -rf \"$install_dir\"\n");
        let reports = unsafe_remove(&s);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].severity, Severity::Error);

        let s = script("remove", "ynh_secure_remove --file=\"$install_dir\"\n");
        assert!(unsafe_remove(&s).is_empty());
    }

    #[test]
    fn test_contains_ignores_comments() {
        let s = script("install", "# rm -rf is bad\nynh_setup_source\n");
        assert!(unsafe_remove(&s).is_empty());
    }

    #[test]
    fn test_obsolete_helpers_is_critical() {
        let s = script("install", "yunohost app setting $app foo --value=bar\n");
        let reports = obsolete_helpers(&s);
        assert_eq!(reports[0].severity, Severity::Critical);
    }

    #[test]
    fn test_set_is_public_severity_depends_on_script() {
        let line = "ynh_app_setting_set --app=$app --key=is_public --value=1\n";
        assert_eq!(
            set_is_public_setting(&script("upgrade", line))[0].severity,
            Severity::Error
        );
        assert_eq!(
            set_is_public_setting(&script("install", line))[0].severity,
            Severity::Warning
        );
    }

    #[test]
    fn test_argument_fetching() {
        let s = script("install", "domain=$1\n");
        assert_eq!(argument_fetching(&s)[0].severity, Severity::Critical);

        let s = script("install", "domain=$YNH_APP_ARG_DOMAIN\n");
        assert!(argument_fetching(&s).is_empty());
    }

    #[test]
    fn test_exit_word_boundary() {
        assert!(exit_ynhdie(&script("install", "ynh_exit_properly\n")).is_empty());
        assert_eq!(exit_ynhdie(&script("install", "exit 1\n")).len(), 1);
    }

    #[test]
    fn test_quiet_systemctl() {
        let s = script("install", "systemctl enable $app.service\n");
        assert_eq!(quiet_systemctl_enable(&s).len(), 1);

        let s = script("install", "systemctl enable --quiet $app.service\n");
        assert!(quiet_systemctl_enable(&s).is_empty());
    }

    #[test]
    fn test_progression_weights_spread() {
        let balanced: String = (0..5)
            .map(|_| "ynh_script_progression --message=\"step\" --weight=2\n")
            .collect();
        assert!(progression_meaningful_weights(&script("install", &balanced)).is_empty());

        let skewed = "ynh_script_progression --message=a --weight=1\n\
                      ynh_script_progression --message=b --weight=1\n\
                      ynh_script_progression --message=c --weight=1\n\
                      ynh_script_progression --message=d --weight=200\n";
        assert_eq!(
            progression_meaningful_weights(&script("install", skewed)).len(),
            1
        );
    }

    #[test]
    fn test_helpers_sourcing_after_official() {
        let s = script(
            "install",
            "#!/bin/bash\nsource /usr/share/yunohost/helpers\nsource ./extra.sh\n",
        );
        let reports = helpers_sourcing_after_official(&s);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("./extra.sh"));
    }

    #[test]
    fn test_fixme_markers_look_at_comments() {
        let s = script("install", "#REMOVEME? ynh_legacy_thing\n");
        assert_eq!(fixme_markers(&s).len(), 1);
    }

    #[test]
    fn test_backup_restore_sourcing() {
        let s = script("backup", "source ../settings/scripts/_common.sh\n");
        assert!(helpers_sourcing_backuprestore(&s).is_empty());

        let s = script("backup", "source ./_common.sh\n");
        assert_eq!(
            helpers_sourcing_backuprestore(&s)[0].severity,
            Severity::Error
        );
    }
}
