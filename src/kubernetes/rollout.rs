// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Triggering Deployment rollouts through a pod template annotation

use crate::error::Result;
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{api::PostParams, Api};
use tracing::{debug, instrument};

/// Outcome of a rollout request for one Deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutOutcome {
    Restarted,
    /// The Deployment was deleted before it could be updated
    Gone,
}

/// Set `annotation` on the pod template of Deployment `name` to the current time.
///
/// The update carries the fetched resourceVersion, so a concurrent write fails
/// with a conflict instead of being overwritten.
#[instrument(skip(api))]
pub async fn restart_deployment(
    api: &Api<Deployment>,
    name: &str,
    annotation: &str,
) -> Result<RolloutOutcome> {
    let Some(mut deployment) = api.get_opt(name).await? else {
        debug!("Deployment {} no longer exists, skipping rollout", name);
        return Ok(RolloutOutcome::Gone);
    };

    let restarted_at = Utc::now().to_rfc3339();
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(Default::default)
        .insert(annotation.to_string(), restarted_at);

    match api.replace(name, &PostParams::default(), &deployment).await {
        Ok(_) => Ok(RolloutOutcome::Restarted),
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Deployment {} was deleted before the update, skipping rollout", name);
            Ok(RolloutOutcome::Gone)
        }
        Err(e) => Err(e.into()),
    }
}
