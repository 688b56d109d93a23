//! In-memory [`RemoteApi`] for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{Result, StretchError};
use crate::http_client::RemoteApi;

enum Scripted {
    Ok(Value),
    Status(u16, String),
}

/// Replays queued responses per `(method, path)`. The last response for a
/// route repeats once its queue drains. Unscripted routes answer 404.
#[derive(Default)]
pub struct ScriptedApi {
    routes: Mutex<HashMap<(String, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, String, Option<Value>)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, method: &str, path: &str, body: Value) -> Self {
        self.push(method, path, Scripted::Ok(body))
    }

    pub fn fail(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.push(method, path, Scripted::Status(status, body.to_string()))
    }

    fn push(self, method: &str, path: &str, s: Scripted) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(s);
        self
    }

    /// `(method, path)` of every call, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (m.clone(), p.clone()))
            .collect()
    }

    pub fn bodies_sent_to(&self, method: &str, path: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p, _)| m == method && p == path)
            .filter_map(|(_, _, b)| b.clone())
            .collect()
    }

    fn call(&self, method: &str, path: &str, body: Option<&Value>) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), path.to_string(), body.cloned()));

        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method.to_string(), path.to_string()));
        let scripted = match queue {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().map(|s| match s {
                Scripted::Ok(v) => Scripted::Ok(v.clone()),
                Scripted::Status(c, b) => Scripted::Status(*c, b.clone()),
            }),
            None => None,
        };
        match scripted {
            Some(Scripted::Ok(v)) => Ok(v),
            Some(Scripted::Status(status, body)) => Err(StretchError::Http {
                method: method.to_string(),
                path: path.to_string(),
                status,
                body,
            }),
            None => Err(StretchError::Http {
                method: method.to_string(),
                path: path.to_string(),
                status: 404,
                body: "unscripted route".to_string(),
            }),
        }
    }
}

#[async_trait]
impl RemoteApi for ScriptedApi {
    async fn get(&self, path: &str) -> Result<Value> {
        self.call("GET", path, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.call("POST", path, Some(body))
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.call("PATCH", path, Some(body))
    }
}
