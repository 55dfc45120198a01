// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod flag_source_configuration;

pub use flag_source_configuration::FlagSourceConfigurationReconciler;
