// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "core.openfeature.dev",
    version = "v1alpha1",
    kind = "FlagSourceConfiguration"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct FlagSourceConfigurationSpec {
    #[serde(default)]
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_on_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sync_provider: Option<SyncProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_logging: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_var_prefix: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub source: String,
    #[serde(default)]
    pub provider: SyncProvider,
}

/// How flagd receives flag data from a source
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SyncProvider {
    #[default]
    Kubernetes,
    Filepath,
    Http,
    Grpc,
    /// Served through the shared flagd-proxy
    FlagdProxy,
    #[serde(other)]
    Unknown,
}

impl FlagSourceConfiguration {
    /// Whether any source is delivered through the flagd-proxy
    pub fn uses_flagd_proxy(&self) -> bool {
        self.spec
            .sources
            .iter()
            .any(|s| s.provider == SyncProvider::FlagdProxy)
    }

    /// Whether dependent workloads should be restarted when this configuration changes
    pub fn rollout_on_change(&self) -> bool {
        self.spec.rollout_on_change.unwrap_or(false)
    }
}
