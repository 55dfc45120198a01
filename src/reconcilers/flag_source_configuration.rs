// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! FlagSourceConfiguration reconciler - rolls dependent Deployments and keeps the flagd-proxy present.

use crate::config::{AnnotationKeys, Config};
use crate::error::{OperatorError, Result};
use crate::kubernetes::{restart_deployment, AnnotationIndex, FlagdProxyHandler, RolloutOutcome};
use crate::types::FlagSourceConfiguration;
use futures::{future::join_all, StreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub struct FlagSourceConfigurationReconciler {
    client: Client,
    index: AnnotationIndex,
    proxy: FlagdProxyHandler,
    annotations: AnnotationKeys,
}

impl FlagSourceConfigurationReconciler {
    pub fn new(client: Client, config: &Config, index: AnnotationIndex) -> Self {
        let proxy = FlagdProxyHandler::new(client.clone(), config.proxy.clone());
        Self {
            client,
            index,
            proxy,
            annotations: config.annotations.clone(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let configurations: Api<FlagSourceConfiguration> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(configurations, watcher::Config::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled flag source configuration: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Bring the cluster in line with the FlagSourceConfiguration `namespace/name`.
    ///
    /// Waits for the annotation index to finish its first listing. A configuration
    /// that no longer exists is not an error.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<Action> {
        if !self.index.is_ready() {
            debug!("Waiting for the deployment index to sync");
            self.index.wait_until_ready().await;
        }

        let configurations: Api<FlagSourceConfiguration> =
            Api::namespaced(self.client.clone(), namespace);

        let Some(configuration) = configurations.get_opt(name).await? else {
            debug!("FlagSourceConfiguration {}/{} not found, nothing to do", namespace, name);
            return Ok(Action::await_change());
        };

        if configuration.uses_flagd_proxy() {
            debug!("Configuration uses flagd-proxy, ensuring it is present");
            self.proxy
                .ensure_present(&self.proxy.config().namespace)
                .await?;
        }

        let dependents = self.index.dependents_of(namespace, name);
        if dependents.is_empty() {
            debug!("No workloads depend on {}/{}", namespace, name);
            return Ok(Action::await_change());
        }

        if !configuration.rollout_on_change() {
            debug!(
                "Rollout on change disabled, leaving {} dependent workload(s) alone",
                dependents.len()
            );
            return Ok(Action::await_change());
        }

        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let results = join_all(dependents.iter().map(|workload| {
            let deployments = &deployments;
            async move {
                let outcome =
                    restart_deployment(deployments, &workload.name, &self.annotations.restarted_at)
                        .await;
                (workload, outcome)
            }
        }))
        .await;

        let mut failures = Vec::new();
        for (workload, outcome) in results {
            match outcome {
                Ok(RolloutOutcome::Restarted) => info!("Triggered rollout of {}", workload),
                Ok(RolloutOutcome::Gone) => debug!("{} disappeared, skipped", workload),
                Err(e) => {
                    error!("Failed to roll out {}: {}", workload, e);
                    failures.push((workload.to_string(), e.to_string()));
                }
            }
        }

        if !failures.is_empty() {
            return Err(OperatorError::Rollout(failures));
        }

        Ok(Action::await_change())
    }
}

async fn reconcile(
    configuration: Arc<FlagSourceConfiguration>,
    ctx: Arc<FlagSourceConfigurationReconciler>,
) -> Result<Action> {
    let name = configuration.name_any();
    let Some(namespace) = configuration.namespace() else {
        return Err(OperatorError::InvalidConfiguration(format!(
            "FlagSourceConfiguration {} has no namespace",
            name
        )));
    };

    ctx.reconcile(&namespace, &name).await
}

fn error_policy(
    _configuration: Arc<FlagSourceConfiguration>,
    error: &OperatorError,
    _ctx: Arc<FlagSourceConfigurationReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
