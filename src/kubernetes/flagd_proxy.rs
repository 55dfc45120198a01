// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle of the shared flagd-proxy Deployment and Service

use crate::config::FlagdProxyConfig;
use crate::constants::{labels, OPERATOR_NAME};
use crate::error::{OperatorError, Result};
use crate::kubernetes::create::create_if_absent;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{api::ObjectMeta, Api, Client};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Makes sure the flagd-proxy exists; never updates it once created
#[derive(Clone)]
pub struct FlagdProxyHandler {
    client: Client,
    config: FlagdProxyConfig,
}

impl FlagdProxyHandler {
    pub fn new(client: Client, config: FlagdProxyConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FlagdProxyConfig {
        &self.config
    }

    /// Create the proxy Deployment and Service in `namespace` if either is missing.
    ///
    /// Both objects are checked independently, so a Service that failed to be
    /// created is retried on the next call even though the Deployment exists.
    #[instrument(skip(self))]
    pub async fn ensure_present(&self, namespace: &str) -> Result<()> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);

        let created = create_if_absent(&deployments, &self.deployment(namespace))
            .await
            .map_err(|e| {
                OperatorError::ProxyError(format!(
                    "deployment {}/{}: {}",
                    namespace, self.config.deployment_name, e
                ))
            })?;
        if created {
            info!(
                "Created flagd-proxy deployment {}/{} with image {}",
                namespace,
                self.config.deployment_name,
                self.config.image_reference()
            );
        }

        create_if_absent(&services, &self.service(namespace))
            .await
            .map_err(|e| {
                OperatorError::ProxyError(format!(
                    "service {}/{}: {}",
                    namespace, self.config.service_name, e
                ))
            })?;

        Ok(())
    }

    fn selector_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(labels::APP.to_string(), self.config.deployment_name.clone())])
    }

    fn deployment(&self, namespace: &str) -> Deployment {
        let mut pod_labels = self.selector_labels();
        pod_labels.insert(labels::MANAGED_BY.to_string(), OPERATOR_NAME.to_string());
        pod_labels.insert(labels::VERSION.to_string(), self.config.tag.clone());

        let mut args = vec![
            "start".to_string(),
            "--port".to_string(),
            self.config.port.to_string(),
            "--management-port".to_string(),
            self.config.management_port.to_string(),
        ];
        if self.config.debug_logging {
            args.push("--debug".to_string());
        }

        Deployment {
            metadata: ObjectMeta {
                name: Some(self.config.deployment_name.clone()),
                namespace: Some(namespace.to_string()),
                labels: Some(pod_labels.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: LabelSelector {
                    match_labels: Some(self.selector_labels()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(pod_labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        service_account_name: Some(self.config.service_account_name.clone()),
                        containers: vec![Container {
                            name: self.config.deployment_name.clone(),
                            image: Some(self.config.image_reference()),
                            args: Some(args),
                            ports: Some(vec![
                                ContainerPort {
                                    name: Some("port".to_string()),
                                    container_port: self.config.port,
                                    ..Default::default()
                                },
                                ContainerPort {
                                    name: Some("management-port".to_string()),
                                    container_port: self.config.management_port,
                                    ..Default::default()
                                },
                            ]),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn service(&self, namespace: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(self.config.service_name.clone()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    labels::MANAGED_BY.to_string(),
                    OPERATOR_NAME.to_string(),
                )])),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(self.selector_labels()),
                ports: Some(vec![ServicePort {
                    name: Some(self.config.deployment_name.clone()),
                    port: self.config.port,
                    target_port: Some(IntOrString::Int(self.config.port)),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
