//! Best-effort shell tokenization for script rules.
//!
//! This is deliberately not a shell parser. Rules only need logical lines
//! split into words with quoting honored; anything fancier (substitutions,
//! redirections, compound commands) stays as plain words. Lines that
//! cannot be split are skipped and counted, never fatal.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellParseError {
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// Logical lines of a script: trailing whitespace stripped, blank lines
/// and full-line comments dropped, backslash continuations merged.
pub fn logical_lines(raw: &str) -> Vec<String> {
    let kept: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    kept.join("\n").replace("\\\n", "").lines().map(str::to_string).collect()
}

/// Split one logical line into words, honoring single quotes, double
/// quotes and backslash escapes. An unquoted `#` starts a comment and
/// ends the line.
pub fn split_words(line: &str) -> Result<Vec<String>, ShellParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => current.push(inner),
                        None => return Err(ShellParseError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => {
                                if !matches!(escaped, '"' | '\\' | '$' | '`') {
                                    current.push('\\');
                                }
                                current.push(escaped);
                            }
                            None => return Err(ShellParseError::UnterminatedQuote),
                        },
                        Some(inner) => current.push(inner),
                        None => return Err(ShellParseError::UnterminatedQuote),
                    }
                }
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    in_word = true;
                    current.push(escaped);
                }
            }
            '#' if !in_word => break,
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_lines_strip_comments_and_blanks() {
        let raw = "#!/bin/bash\n\n# setup\nynh_setup_source --dest_dir=$install_dir\n";
        assert_eq!(
            logical_lines(raw),
            vec!["ynh_setup_source --dest_dir=$install_dir"]
        );
    }

    #[test]
    fn test_logical_lines_merge_continuations() {
        let raw = "ynh_install_app_dependencies \\\n    postgresql";
        assert_eq!(
            logical_lines(raw),
            vec!["ynh_install_app_dependencies postgresql"]
        );
    }

    #[test]
    fn test_split_words_basic() {
        assert_eq!(
            split_words("rm -rf \"$install_dir\"").unwrap(),
            vec!["rm", "-rf", "$install_dir"]
        );
    }

    #[test]
    fn test_split_words_quotes() {
        assert_eq!(
            split_words("echo 'a b' c\\ d").unwrap(),
            vec!["echo", "a b", "c d"]
        );
    }

    #[test]
    fn test_split_words_trailing_comment() {
        assert_eq!(
            split_words("systemctl restart nginx # reload conf").unwrap(),
            vec!["systemctl", "restart", "nginx"]
        );
    }

    #[test]
    fn test_split_words_hash_inside_word_kept() {
        assert_eq!(split_words("echo a#b").unwrap(), vec!["echo", "a#b"]);
    }

    #[test]
    fn test_split_words_unterminated_quote() {
        assert_eq!(
            split_words("echo \"oops").unwrap_err(),
            ShellParseError::UnterminatedQuote
        );
    }
}
