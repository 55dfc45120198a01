// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, flagd_proxy};
use anyhow::{Context, Result};
use std::env;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub proxy: FlagdProxyConfig,
    pub annotations: AnnotationKeys,
}

/// Well-known names and wiring of the shared flagd-proxy
#[derive(Debug, Clone)]
pub struct FlagdProxyConfig {
    /// Namespace the proxy deployment and service live in
    pub namespace: String,
    pub deployment_name: String,
    pub service_name: String,
    pub service_account_name: String,
    pub image: String,
    pub tag: String,
    pub port: i32,
    pub management_port: i32,
    pub debug_logging: bool,
}

impl FlagdProxyConfig {
    pub fn image_reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

impl Default for FlagdProxyConfig {
    fn default() -> Self {
        Self {
            namespace: flagd_proxy::DEFAULT_NAMESPACE.to_string(),
            deployment_name: flagd_proxy::DEPLOYMENT_NAME.to_string(),
            service_name: flagd_proxy::SERVICE_NAME.to_string(),
            service_account_name: flagd_proxy::SERVICE_ACCOUNT_NAME.to_string(),
            image: flagd_proxy::DEFAULT_IMAGE.to_string(),
            tag: flagd_proxy::DEFAULT_TAG.to_string(),
            port: flagd_proxy::DEFAULT_PORT,
            management_port: flagd_proxy::DEFAULT_MANAGEMENT_PORT,
            debug_logging: false,
        }
    }
}

/// Annotation keys linking workloads to configurations
#[derive(Debug, Clone)]
pub struct AnnotationKeys {
    pub opt_in: String,
    pub root_pointer: String,
    pub restarted_at: String,
}

impl Default for AnnotationKeys {
    fn default() -> Self {
        Self {
            opt_in: annotations::OPT_IN.to_string(),
            root_pointer: annotations::ROOT_POINTER.to_string(),
            restarted_at: annotations::RESTARTED_AT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve variables, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut proxy = FlagdProxyConfig::default();

        if let Some(namespace) = lookup("POD_NAMESPACE") {
            proxy.namespace = namespace;
        }
        if let Some(image) = lookup("FLAGD_PROXY_IMAGE") {
            proxy.image = image;
        }
        if let Some(tag) = lookup("FLAGD_PROXY_TAG") {
            proxy.tag = tag;
        }
        if let Some(port) = lookup("FLAGD_PROXY_PORT") {
            proxy.port = port
                .parse()
                .with_context(|| format!("FLAGD_PROXY_PORT is not a valid port: {}", port))?;
        }
        if let Some(port) = lookup("FLAGD_PROXY_MANAGEMENT_PORT") {
            proxy.management_port = port.parse().with_context(|| {
                format!("FLAGD_PROXY_MANAGEMENT_PORT is not a valid port: {}", port)
            })?;
        }
        if let Some(debug) = lookup("FLAGD_PROXY_DEBUG_LOGGING") {
            proxy.debug_logging = debug.parse().with_context(|| {
                format!("FLAGD_PROXY_DEBUG_LOGGING is not a boolean: {}", debug)
            })?;
        }

        Ok(Config {
            proxy,
            annotations: AnnotationKeys::default(),
        })
    }
}
