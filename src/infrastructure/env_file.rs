//! `KEY=VALUE` environment files

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ValidationError;

/// Read an env file into a map.
///
/// Blank lines, `#` comments and lines without `=` are skipped. Keys and
/// values are trimmed; later keys win.
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, ValidationError> {
    let content = fs::read_to_string(path).map_err(|e| ValidationError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parse_env(&content))
}

pub fn parse_env(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_blanks_and_malformed_lines() {
        let env = parse_env("# comment\n\nA=1\nnot a pair\n B = two words \nURL=http://x?a=b\n");
        assert_eq!(env.len(), 3);
        assert_eq!(env["A"], "1");
        assert_eq!(env["B"], "two words");
        assert_eq!(env["URL"], "http://x?a=b");
    }

    #[test]
    fn later_keys_win() {
        let env = parse_env("A=1\nA=2\n");
        assert_eq!(env["A"], "2");
    }

    #[test]
    fn missing_file_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.env");
        let err = read_env_file(&path).unwrap_err();
        assert!(matches!(err, ValidationError::EnvFile { .. }));
    }
}
