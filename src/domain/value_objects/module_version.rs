//! Module version value object
//!
//! `<line>.<patch>`, e.g. `2.4.1`. Everything before the last dot is the
//! release line; the patch is a plain number. A lookup accepts the requested
//! patch and the next few patches of the same line.

use std::fmt;
use std::str::FromStr;

use crate::domain::entities::TagFilter;
use crate::error::ValidationError;

/// Resource tag carrying the family a revision belongs to
pub const FAMILY_TAG: &str = "Family";
/// Resource tag carrying the module version a revision was built from
pub const MODULE_VERSION_TAG: &str = "ModuleVersion";

/// Patches accepted by a lookup, the requested one included.
const COMPATIBLE_PATCHES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleVersion {
    line: String,
    patch: u32,
}

impl ModuleVersion {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidModuleVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (line, patch) = input
            .rsplit_once('.')
            .ok_or_else(|| invalid("expected <major>.<minor>.<patch>"))?;
        if line.is_empty() || line.chars().any(char::is_whitespace) {
            return Err(invalid("missing release line before the patch"));
        }
        if patch.is_empty() || !patch.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("patch must be a number"));
        }
        let patch = patch
            .parse()
            .map_err(|_| invalid("patch is out of range"))?;

        Ok(Self {
            line: line.to_string(),
            patch,
        })
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// This version and the patches after it on the same line.
    pub fn compatible_versions(&self) -> Vec<String> {
        let last = self.patch.saturating_add(COMPATIBLE_PATCHES - 1);
        (self.patch..=last)
            .map(|patch| format!("{}.{patch}", self.line))
            .collect()
    }

    /// Tag conditions selecting revisions of `family` built from a
    /// compatible version.
    pub fn tag_filters(&self, family: &str) -> Vec<TagFilter> {
        vec![
            TagFilter::new(FAMILY_TAG, vec![family.to_string()]),
            TagFilter::new(MODULE_VERSION_TAG, self.compatible_versions()),
        ]
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.patch)
    }
}

impl FromStr for ModuleVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn splits_on_the_last_dot() {
        let version = ModuleVersion::parse("2.4.1").unwrap();
        assert_eq!(version.line(), "2.4");
        assert_eq!(version.patch(), 1);
        assert_eq!(version.to_string(), "2.4.1");
    }

    #[test]
    fn accepts_the_next_nine_patches() {
        let versions = ModuleVersion::parse("1.0.3").unwrap().compatible_versions();
        assert_eq!(versions.len(), 10);
        assert_eq!(versions.first().map(String::as_str), Some("1.0.3"));
        assert_eq!(versions.last().map(String::as_str), Some("1.0.12"));
        assert!(!versions.contains(&"1.0.2".to_string()));
        assert!(!versions.contains(&"1.1.3".to_string()));
    }

    #[test]
    fn filters_match_family_and_version_tags() {
        let filters = ModuleVersion::parse("3.2.0").unwrap().tag_filters("web");
        let tags: BTreeMap<String, String> = [
            (FAMILY_TAG.to_string(), "web".to_string()),
            (MODULE_VERSION_TAG.to_string(), "3.2.7".to_string()),
        ]
        .into();
        assert!(filters.iter().all(|f| f.matches(&tags)));

        let other_line: BTreeMap<String, String> = [
            (FAMILY_TAG.to_string(), "web".to_string()),
            (MODULE_VERSION_TAG.to_string(), "3.3.0".to_string()),
        ]
        .into();
        assert!(!filters.iter().all(|f| f.matches(&other_line)));
    }

    #[test]
    fn malformed_versions_are_rejected() {
        for input in ["", "7", ".3", "1.2.", "1.2.x", "1.2.+3", "1 .2.3"] {
            assert!(
                matches!(
                    ModuleVersion::parse(input),
                    Err(ValidationError::InvalidModuleVersion { .. })
                ),
                "expected '{input}' to be rejected"
            );
        }
    }
}
