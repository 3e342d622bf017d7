//! Terminal capability detection

use is_terminal::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub is_tty: bool,
    pub supports_color: bool,
    pub supports_unicode: bool,
    pub is_ci: bool,
}

impl TerminalCapabilities {
    /// Plain output: no color, ASCII icons.
    pub fn plain() -> Self {
        Self {
            is_tty: false,
            supports_color: false,
            supports_unicode: false,
            is_ci: false,
        }
    }
}

/// Capabilities of stderr, where progress is written.
pub fn detect_capabilities(no_color: bool) -> TerminalCapabilities {
    let caps =
        detect_capabilities_impl(|key| std::env::var(key).ok(), std::io::stderr().is_terminal());
    if no_color {
        TerminalCapabilities {
            supports_color: false,
            ..caps
        }
    } else {
        caps
    }
}

fn detect_capabilities_impl(
    get_env: impl Fn(&str) -> Option<String>,
    is_tty: bool,
) -> TerminalCapabilities {
    let term = get_env("TERM").unwrap_or_default();
    let term_is_dumb = term.eq_ignore_ascii_case("dumb");

    let no_color = get_env("NO_COLOR").is_some();
    let is_ci = is_ci_env(&get_env);

    TerminalCapabilities {
        is_tty,
        supports_color: is_tty && !term_is_dumb && !no_color,
        supports_unicode: !term_is_dumb && unicode_locale(&get_env),
        is_ci,
    }
}

fn is_ci_env(get_env: &impl Fn(&str) -> Option<String>) -> bool {
    const KEYS: &[&str] = &[
        "CI",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "JENKINS_HOME",
        "BUILDKITE",
        "CIRCLECI",
        "CODEBUILD_BUILD_ID",
    ];

    KEYS.iter().any(|k| get_env(k).is_some())
}

fn unicode_locale(get_env: &impl Fn(&str) -> Option<String>) -> bool {
    const KEYS: &[&str] = &["LC_ALL", "LC_CTYPE", "LANG"];
    for k in KEYS {
        if let Some(val) = get_env(k) {
            let v = val.to_lowercase();
            if v == "c" || v == "posix" {
                return false;
            }
            if v.contains("utf-8") || v.contains("utf8") {
                return true;
            }
        }
    }

    true
}
