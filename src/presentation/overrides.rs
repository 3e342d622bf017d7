//! Command-line override flags to [`OverrideSet`]

use std::path::Path;

use crate::domain::entities::{KeyUpsert, OverrideSet};
use crate::domain::value_objects::TaskRef;
use crate::error::ValidationError;
use crate::infrastructure::read_env_file;

use super::cli::OverrideArgs;

impl OverrideArgs {
    /// Validate the flags and read any env files.
    pub fn to_override_set(&self) -> Result<OverrideSet, ValidationError> {
        let mut builder = OverrideSet::builder().env_defaults(self.env_file_upserts()?);

        if let Some(tag) = &self.tag {
            builder = builder.tag(tag);
        }
        for pair in self.image.chunks_exact(2) {
            builder = builder.image(&pair[0], &pair[1]);
        }
        for triple in self.env.chunks_exact(3) {
            builder = builder.env(&triple[0], &triple[1], &triple[2]);
        }
        for triple in self.secret.chunks_exact(3) {
            builder = builder.secret(&triple[0], &triple[1], &triple[2]);
        }
        for pair in self.command.chunks_exact(2) {
            builder = builder.command(&pair[0], &pair[1]);
        }
        for pair in self.task_tag.chunks_exact(2) {
            builder = builder.task_tag(&pair[0], &pair[1]);
        }
        if let Some(role) = &self.role {
            builder = builder.task_role(role);
        }
        if let Some(role) = &self.execution_role {
            builder = builder.execution_role(role);
        }
        if let Some(task) = &self.source_task {
            builder = builder.source_task(TaskRef::parse(task)?);
        }

        builder
            .exclusive_env(self.exclusive_env)
            .exclusive_secrets(self.exclusive_secrets)
            .build()
    }

    /// Env file entries, in flag order, as upserts that explicit `--env` overrides.
    fn env_file_upserts(&self) -> Result<Vec<KeyUpsert>, ValidationError> {
        let mut upserts = Vec::new();
        for pair in self.env_file.chunks_exact(2) {
            let (container, path) = (&pair[0], Path::new(&pair[1]));
            for (key, value) in read_env_file(path)? {
                upserts.push(KeyUpsert::new(container.as_str(), key, value));
            }
        }
        Ok(upserts)
    }
}
