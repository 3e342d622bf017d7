//! Task definition reference value object
//!
//! Accepted forms, in priority order:
//! - full ARN (`arn:...:task-definition/family:revision`), used as-is
//! - `family:revision`, an exact revision
//! - bare `family`, the most recent revision
//!
//! Anything else is rejected; there is no silent fallback.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_FAMILY_LEN: usize = 255;

/// Reference to a task definition revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskRef {
    Arn(String),
    FamilyRevision { family: String, revision: u32 },
    Family(String),
}

impl TaskRef {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidTaskRef {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("reference is empty"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(invalid("reference contains whitespace"));
        }

        if input.starts_with("arn:") {
            let (_, tail) = input
                .split_once(":task-definition/")
                .ok_or_else(|| invalid("ARN is not a task-definition ARN"))?;
            // The tail must itself be a well-formed family:revision.
            return match Self::parse(tail) {
                Ok(TaskRef::FamilyRevision { .. }) => Ok(TaskRef::Arn(input.to_string())),
                _ => Err(invalid("ARN must end in family:revision")),
            };
        }

        match input.split_once(':') {
            Some((family, revision)) => {
                validate_family(family).map_err(|reason| invalid(&reason))?;
                if revision.is_empty() {
                    return Err(invalid("missing revision after ':'"));
                }
                if revision.contains(':') {
                    return Err(invalid("ambiguous reference with more than one ':'"));
                }
                // Plain digits only, so the reference prints back unchanged
                if !revision.bytes().all(|b| b.is_ascii_digit()) || revision.starts_with('0') {
                    return Err(invalid("revision must be a positive integer"));
                }
                let revision: u32 = revision
                    .parse()
                    .map_err(|_| invalid("revision is out of range"))?;
                Ok(TaskRef::FamilyRevision {
                    family: family.to_string(),
                    revision,
                })
            }
            None => {
                validate_family(input).map_err(|reason| invalid(&reason))?;
                Ok(TaskRef::Family(input.to_string()))
            }
        }
    }

    /// Family name if it can be read without asking the registry.
    pub fn family(&self) -> Option<&str> {
        match self {
            TaskRef::Family(family) | TaskRef::FamilyRevision { family, .. } => Some(family),
            TaskRef::Arn(arn) => arn
                .rsplit_once(":task-definition/")
                .and_then(|(_, tail)| tail.split_once(':'))
                .map(|(family, _)| family),
        }
    }

    /// Exact revision, if the reference pins one.
    pub fn revision(&self) -> Option<u32> {
        match self {
            TaskRef::FamilyRevision { revision, .. } => Some(*revision),
            TaskRef::Arn(arn) => arn.rsplit_once(':').and_then(|(_, r)| r.parse().ok()),
            TaskRef::Family(_) => None,
        }
    }
}

fn validate_family(family: &str) -> Result<(), String> {
    if family.is_empty() {
        return Err("family name is empty".to_string());
    }
    if family.len() > MAX_FAMILY_LEN {
        return Err(format!("family name exceeds {} characters", MAX_FAMILY_LEN));
    }
    if !family
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("family name may only contain letters, digits, '-' and '_'".to_string());
    }
    Ok(())
}

impl FromStr for TaskRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TaskRef {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaskRef> for String {
    fn from(value: TaskRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskRef::Arn(arn) => write!(f, "{}", arn),
            TaskRef::FamilyRevision { family, revision } => write!(f, "{}:{}", family, revision),
            TaskRef::Family(family) => write!(f, "{}", family),
        }
    }
}
