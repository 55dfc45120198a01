// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compare-and-create for objects that must exist but are never updated

use crate::error::Result;
use k8s_openapi::NamespaceResourceScope;
use kube::{api::PostParams, Api, Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, info};

/// Create `object` unless an object with the same name already exists.
///
/// Returns `true` when this call created it. A `409 AlreadyExists` from a racing
/// creator counts as present. Existing objects are never compared or updated.
pub async fn create_if_absent<K>(api: &Api<K>, object: &K) -> Result<bool>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned,
    K::DynamicType: Default,
{
    let name = object.name_any();
    let kind = K::kind(&K::DynamicType::default()).to_string();

    if api.get_opt(&name).await?.is_some() {
        debug!("{} {} already exists", kind, name);
        return Ok(false);
    }

    match api.create(&PostParams::default(), object).await {
        Ok(_) => {
            info!("{} {} created", kind, name);
            Ok(true)
        }
        Err(kube::Error::Api(err)) if err.code == 409 => {
            debug!("{} {} was created concurrently", kind, name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
