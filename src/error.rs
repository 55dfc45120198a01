// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("flagd-proxy setup failed: {0}")]
    ProxyError(String),

    #[error("Rollout failed for {} workload(s): {}", .0.len(), format_failures(.0))]
    Rollout(Vec<(String, String)>),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(workload, reason)| format!("{}: {}", workload, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, OperatorError>;
