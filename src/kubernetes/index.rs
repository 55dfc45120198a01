// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Index from FlagSourceConfiguration identity to the Deployments depending on it

use crate::config::AnnotationKeys;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client, ResourceExt};
use kube_runtime::{watcher, WatchStreamExt};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Identity of a workload in the index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    pub fn from_deployment(deployment: &Deployment) -> Self {
        Self {
            namespace: deployment.namespace().unwrap_or_default(),
            name: deployment.name_any(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Index key of a FlagSourceConfiguration
pub fn config_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Mirrors Go's `strconv.ParseBool` true values
fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "true" | "TRUE" | "True")
}

/// Project a Deployment onto its index key.
///
/// Returns the root pointer only when the pod template carries both the opt-in
/// marker (truthy) and a non-empty root pointer.
pub fn index_key(deployment: &Deployment, keys: &AnnotationKeys) -> Option<String> {
    let annotations = deployment
        .spec
        .as_ref()?
        .template
        .metadata
        .as_ref()?
        .annotations
        .as_ref()?;

    if !annotations.get(&keys.opt_in).is_some_and(|v| is_truthy(v)) {
        return None;
    }

    annotations
        .get(&keys.root_pointer)
        .filter(|v| !v.is_empty())
        .cloned()
}

#[derive(Default)]
struct IndexState {
    by_config: HashMap<String, BTreeSet<WorkloadRef>>,
    by_workload: HashMap<WorkloadRef, String>,
    /// Entries collected during a relist, swapped in on `InitDone`
    pending: Vec<(WorkloadRef, String)>,
}

impl IndexState {
    fn remove(&mut self, workload: &WorkloadRef) {
        if let Some(key) = self.by_workload.remove(workload) {
            if let Some(set) = self.by_config.get_mut(&key) {
                set.remove(workload);
                if set.is_empty() {
                    self.by_config.remove(&key);
                }
            }
        }
    }

    fn insert(&mut self, workload: WorkloadRef, key: String) {
        self.by_config
            .entry(key.clone())
            .or_default()
            .insert(workload.clone());
        self.by_workload.insert(workload, key);
    }

    fn rebuild(&mut self, entries: Vec<(WorkloadRef, String)>) {
        self.by_config.clear();
        self.by_workload.clear();
        for (workload, key) in entries {
            self.insert(workload, key);
        }
    }
}

/// Relation table from configuration identity to dependent workloads.
///
/// Cloning shares the underlying table. The index becomes ready after its
/// first full listing.
#[derive(Clone)]
pub struct AnnotationIndex {
    keys: AnnotationKeys,
    state: Arc<RwLock<IndexState>>,
    ready: Arc<watch::Sender<bool>>,
}

impl AnnotationIndex {
    pub fn new(keys: AnnotationKeys) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            keys,
            state: Arc::new(RwLock::new(IndexState::default())),
            ready: Arc::new(ready),
        }
    }

    /// Insert or move a Deployment according to its current annotations
    pub fn apply(&self, deployment: &Deployment) {
        let workload = WorkloadRef::from_deployment(deployment);
        let key = index_key(deployment, &self.keys);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.remove(&workload);
        if let Some(key) = key {
            debug!("Indexing {} under {}", workload, key);
            state.insert(workload, key);
        }
    }

    pub fn delete(&self, deployment: &Deployment) {
        let workload = WorkloadRef::from_deployment(deployment);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.remove(&workload);
    }

    /// Rebuild the whole index from a full listing and mark it ready
    pub fn replace_all<'a>(&self, deployments: impl IntoIterator<Item = &'a Deployment>) {
        let entries = deployments
            .into_iter()
            .filter_map(|d| {
                index_key(d, &self.keys).map(|key| (WorkloadRef::from_deployment(d), key))
            })
            .collect();
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            state.pending.clear();
            state.rebuild(entries);
        }
        self.mark_ready();
    }

    /// Apply one event of a Deployment watch stream
    pub fn handle_event(&self, event: watcher::Event<Deployment>) {
        match event {
            watcher::Event::Init => {
                let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                state.pending.clear();
            }
            watcher::Event::InitApply(d) => {
                if let Some(key) = index_key(&d, &self.keys) {
                    let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                    state.pending.push((WorkloadRef::from_deployment(&d), key));
                }
            }
            watcher::Event::InitDone => {
                {
                    let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                    let entries = std::mem::take(&mut state.pending);
                    info!("Indexed {} dependent deployments", entries.len());
                    state.rebuild(entries);
                }
                self.mark_ready();
            }
            watcher::Event::Apply(d) => self.apply(&d),
            watcher::Event::Delete(d) => self.delete(&d),
        }
    }

    fn mark_ready(&self) {
        self.ready.send_if_modified(|ready| !std::mem::replace(ready, true));
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until the first full listing has been indexed
    pub async fn wait_until_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Workloads in `namespace` whose root pointer names `namespace/name`
    pub fn dependents_of(&self, namespace: &str, name: &str) -> BTreeSet<WorkloadRef> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state
            .by_config
            .get(&config_key(namespace, name))
            .map(|set| {
                set.iter()
                    .filter(|w| w.namespace == namespace)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Keep the index in sync with all Deployments in the cluster
    pub async fn run(self, client: Client) -> anyhow::Result<()> {
        let deployments: Api<Deployment> = Api::all(client);

        info!("Starting Deployment annotation index");

        let mut stream = watcher(deployments, watcher::Config::default())
            .default_backoff()
            .boxed();

        loop {
            match stream.try_next().await {
                Ok(Some(event)) => self.handle_event(event),
                Ok(None) => break,
                Err(e) => warn!("Deployment watch error: {}", e),
            }
        }

        Ok(())
    }
}
