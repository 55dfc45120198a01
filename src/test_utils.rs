// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for running code against an in-memory Kubernetes API.

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Value>,
    failures: HashMap<(String, String), VecDeque<u16>>,
    requests: Vec<(String, String)>,
    resource_version: u64,
}

/// A fake API server keeping objects in memory, keyed by their REST path.
///
/// Supports GET of single objects, POST to collections and PUT of existing
/// objects. Anything else is answered with 404 or 405.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object into `collection` (e.g. `/apis/apps/v1/namespaces/ns/deployments`)
    pub fn with_object(self, collection: &str, object: &impl serde::Serialize) -> Self {
        let value = serde_json::to_value(object).unwrap();
        let name = value["metadata"]["name"].as_str().unwrap().to_string();
        {
            let mut state = self.state.lock().unwrap();
            let value = stamp(&mut state, value);
            state.objects.insert(format!("{}/{}", collection, name), value);
        }
        self
    }

    /// Fail the next request matching method and exact path with `status`
    pub fn fail_once(self, method: &str, path: &str, status: u16) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(status);
        self
    }

    pub fn remove(&self, path: &str) {
        self.state.lock().unwrap().objects.remove(path);
    }

    /// Build a kube Client talking to this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    /// Paths of stored objects under `collection`
    pub fn names_in(&self, collection: &str) -> Vec<String> {
        let prefix = format!("{}/", collection);
        self.state
            .lock()
            .unwrap()
            .objects
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(|rest| rest.to_string())
            .collect()
    }

    /// Number of requests received for method and path
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    /// Number of POST and PUT requests received
    pub fn mutations(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, _)| m == "POST" || m == "PUT")
            .count()
    }

    fn handle(&self, method: &str, path: &str, body: Bytes) -> (u16, String) {
        let mut state = self.state.lock().unwrap();
        state.requests.push((method.to_string(), path.to_string()));

        if let Some(status) = state
            .failures
            .get_mut(&(method.to_string(), path.to_string()))
            .and_then(|q| q.pop_front())
        {
            return (status, status_json(status, path));
        }

        match method {
            "GET" => match state.objects.get(path) {
                Some(object) => (200, object.to_string()),
                None => (404, status_json(404, path)),
            },
            "POST" => {
                let Ok(object) = serde_json::from_slice::<Value>(&body) else {
                    return (400, status_json(400, path));
                };
                let Some(name) = object["metadata"]["name"].as_str().map(str::to_string) else {
                    return (422, status_json(422, path));
                };
                let key = format!("{}/{}", path, name);
                if state.objects.contains_key(&key) {
                    return (409, status_json(409, &key));
                }
                let object = stamp(&mut state, object);
                state.objects.insert(key, object.clone());
                (201, object.to_string())
            }
            "PUT" => {
                if !state.objects.contains_key(path) {
                    return (404, status_json(404, path));
                }
                let Ok(object) = serde_json::from_slice::<Value>(&body) else {
                    return (400, status_json(400, path));
                };
                let object = stamp(&mut state, object);
                state.objects.insert(path.to_string(), object.clone());
                (200, object.to_string())
            }
            _ => (405, status_json(405, path)),
        }
    }
}

fn stamp(state: &mut State, mut object: Value) -> Value {
    state.resource_version += 1;
    object["metadata"]["resourceVersion"] = Value::String(state.resource_version.to_string());
    object
}

fn status_json(code: u16, path: &str) -> String {
    let reason = match code {
        404 => "NotFound",
        409 => "AlreadyExists",
        422 => "Invalid",
        405 => "MethodNotAllowed",
        400 => "BadRequest",
        _ => "InternalError",
    };
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} {}", reason, path),
        "reason": reason,
        "code": code
    })
    .to_string()
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        Box::pin(async move {
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(_) => Bytes::new(),
            };
            let (status, body) = server.handle(&method, &path, body);
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// REST collection path of Deployments in `namespace`
pub fn deployments_path(namespace: &str) -> String {
    format!("/apis/apps/v1/namespaces/{}/deployments", namespace)
}

/// REST collection path of Services in `namespace`
pub fn services_path(namespace: &str) -> String {
    format!("/api/v1/namespaces/{}/services", namespace)
}

/// REST collection path of FlagSourceConfigurations in `namespace`
pub fn flag_source_configurations_path(namespace: &str) -> String {
    format!(
        "/apis/core.openfeature.dev/v1alpha1/namespaces/{}/flagsourceconfigurations",
        namespace
    )
}
