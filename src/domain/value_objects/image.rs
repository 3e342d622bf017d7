//! Container image reference value object
//!
//! Splits `repository[:tag][@digest]` so the tag component can be replaced
//! without touching the repository (which may carry a registry host port).

use std::fmt;

/// A parsed container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    /// Parse an image string. Parsing never fails; emptiness is checked by callers.
    pub fn parse(image: &str) -> Self {
        let (name, digest) = match image.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (image, None),
        };

        // Only a colon after the last path separator starts a tag;
        // `registry:5000/app` has a port, not a tag.
        let last_segment = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_segment..].rfind(':') {
            Some(colon) => {
                let split = last_segment + colon;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        Self {
            repository: repository.to_string(),
            tag,
            digest,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// True for `repo@sha256:...` references without a tag component.
    pub fn is_digest_only(&self) -> bool {
        self.tag.is_none() && self.digest.is_some()
    }

    /// Same repository with a new tag. A digest would pin the old content, so it is dropped.
    pub fn with_tag(&self, tag: &str) -> Self {
        Self {
            repository: self.repository.clone(),
            tag: Some(tag.to_string()),
            digest: None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
