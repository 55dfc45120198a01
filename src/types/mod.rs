// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types watched by the operator.

pub mod flag_source_configuration;

pub use flag_source_configuration::{
    FlagSourceConfiguration, FlagSourceConfigurationSpec, Source, SyncProvider,
};
