//! Revision Planning
//!
//! Shared first half of every action: fetch the base revision, merge the
//! overrides onto it and list what changed. Nothing here mutates the
//! registry until [`RevisionPlan::register`] is called.

use tracing::{debug, info, warn};

use crate::domain::entities::{OverrideSet, RevisionChange, RevisionId, TaskDefinitionSpec};
use crate::domain::ports::{DeployEvent, RegistryError};
use crate::domain::services::{diff, merge};
use crate::domain::value_objects::{ModuleVersion, TaskRef};
use crate::error::{RolloutResult, ValidationError};

use super::context::RolloutContext;

/// Base revision, merged draft and the differences between them
#[derive(Debug, Clone)]
pub struct RevisionPlan {
    pub base: TaskDefinitionSpec,
    pub base_id: RevisionId,
    pub merged: TaskDefinitionSpec,
    pub changes: Vec<RevisionChange>,
}

impl RevisionPlan {
    /// Describe `task`, merge `overrides` onto it and diff the result.
    ///
    /// `overrides.source_task_ref` takes precedence over `task`.
    pub fn resolve(
        ctx: &RolloutContext,
        task: &TaskRef,
        overrides: &OverrideSet,
    ) -> RolloutResult<Self> {
        let task = overrides.source_task_ref.as_ref().unwrap_or(task);
        let base = ctx.client().describe_task_definition(task)?;
        let base_id = base
            .revision_id()
            .ok_or_else(|| RegistryError::Protocol {
                operation: "DescribeTaskDefinition".to_string(),
                message: format!("{task} was described without a revision or ARN"),
            })?;
        debug!(revision = %base_id, "resolved base revision");
        ctx.emit(DeployEvent::BaseResolved {
            revision: base_id.clone(),
        });

        let merged = merge(&base, overrides)?;
        let changes = diff(&base, &merged);
        for change in &changes {
            ctx.emit(DeployEvent::RevisionChanged {
                change: change.clone(),
            });
        }

        Ok(Self {
            base,
            base_id,
            merged,
            changes,
        })
    }

    /// Register the merged draft as a new revision.
    pub fn register(&self, ctx: &RolloutContext) -> RolloutResult<RevisionId> {
        let revision = ctx.client().register_task_definition(&self.merged)?;
        info!(revision = %revision, changes = self.changes.len(), "registered revision");
        ctx.emit(DeployEvent::RevisionRegistered {
            revision: revision.clone(),
        });
        Ok(revision)
    }
}

/// The reference an action starts from. With a module version, `task` must
/// be a bare family and the newest revision tagged with a compatible
/// version is chosen.
pub fn select_base(
    ctx: &RolloutContext,
    task: &TaskRef,
    module_version: Option<&ModuleVersion>,
) -> RolloutResult<TaskRef> {
    let Some(version) = module_version else {
        return Ok(task.clone());
    };
    let TaskRef::Family(family) = task else {
        return Err(ValidationError::ModuleVersionNeedsFamily {
            task: task.to_string(),
        }
        .into());
    };

    let arns = ctx
        .client()
        .find_task_definitions(&version.tag_filters(family))?;
    let newest = arns
        .into_iter()
        .filter_map(|arn| match TaskRef::parse(&arn) {
            Ok(found) => found.revision().map(|revision| (revision, found)),
            Err(err) => {
                warn!(%arn, error = %err, "skipping unparsable task definition ARN");
                None
            }
        })
        .max_by_key(|(revision, _)| *revision);

    match newest {
        Some((_, found)) => {
            info!(
                %family,
                module_version = %version,
                task = %found,
                "selected revision by module version"
            );
            Ok(found)
        }
        None => Err(RegistryError::NotFound {
            resource: format!("task definition [Family={family}, ModuleVersion={version}]"),
        }
        .into()),
    }
}

/// Mark `revision` inactive.
pub fn deregister(ctx: &RolloutContext, revision: &RevisionId) -> RolloutResult<()> {
    ctx.client().deregister_task_definition(revision)?;
    info!(revision = %revision, "deregistered revision");
    ctx.emit(DeployEvent::RevisionDeregistered {
        revision: revision.clone(),
    });
    Ok(())
}

/// Identity of the revision a service was running before it was updated.
pub(crate) fn previous_revision(
    ctx: &RolloutContext,
    plan: &RevisionPlan,
    previous_arn: &str,
) -> RolloutResult<RevisionId> {
    if plan.base_id.arn == previous_arn {
        return Ok(plan.base_id.clone());
    }
    let described = ctx
        .client()
        .describe_task_definition(&TaskRef::Arn(previous_arn.to_string()))?;
    described.revision_id().ok_or_else(|| {
        RegistryError::Protocol {
            operation: "DescribeTaskDefinition".to_string(),
            message: format!("{previous_arn} was described without a revision"),
        }
        .into()
    })
}
