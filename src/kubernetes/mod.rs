// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes building blocks: the annotation index, proxy lifecycle and rollouts.

pub mod create;
pub mod flagd_proxy;
pub mod index;
pub mod rollout;

pub use create::create_if_absent;
pub use flagd_proxy::FlagdProxyHandler;
pub use index::{AnnotationIndex, WorkloadRef};
pub use rollout::{restart_deployment, RolloutOutcome};
