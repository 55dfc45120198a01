// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used to link workloads to a FlagSourceConfiguration
pub mod annotations {
    /// When truthy, the workload opts in to rollouts on configuration change
    pub const OPT_IN: &str =
        "spec.template.metadata.annotations.openfeature.dev/flagsourceconfiguration";
    /// `namespace/name` of the FlagSourceConfiguration the workload depends on
    pub const ROOT_POINTER: &str = "openfeature.dev/flagsourceconfiguration";
    /// Changing this pod template annotation makes the Deployment roll its pods
    pub const RESTARTED_AT: &str = "kubectl.kubernetes.io/restartedAt";
}

/// Defaults for the shared flagd-proxy
pub mod flagd_proxy {
    pub const DEPLOYMENT_NAME: &str = "flagd-proxy";
    pub const SERVICE_NAME: &str = "flagd-proxy-svc";
    pub const SERVICE_ACCOUNT_NAME: &str = "open-feature-operator-flagd-proxy";
    pub const DEFAULT_IMAGE: &str = "ghcr.io/open-feature/flagd-proxy";
    pub const DEFAULT_TAG: &str = "v0.2.2";
    pub const DEFAULT_PORT: i32 = 8015;
    pub const DEFAULT_MANAGEMENT_PORT: i32 = 8016;
    pub const DEFAULT_NAMESPACE: &str = "open-feature-operator-system";
}

/// Standard Kubernetes labels set on objects the operator creates
pub mod labels {
    pub const APP: &str = "app";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    pub const VERSION: &str = "app.kubernetes.io/version";
}

/// The operator name, used as field manager and managed-by label value
pub const OPERATOR_NAME: &str = "open-feature-operator";
