//! In-process transport for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header};

use super::ServiceWorker;
use crate::fetch::{Request, Response, ResponseType, Transport};
use frost_core::{AppConfig, CacheDb, Error};

pub(crate) const SCOPE: &str = "http://localhost:8080/";
pub(crate) const INDEX: &str = "http://localhost:8080/index.html";
pub(crate) const APP_JS: &str = "http://localhost:8080/js/app.js";
pub(crate) const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js";

pub(crate) fn test_config(version: &str) -> AppConfig {
    AppConfig {
        cache_name: version.to_string(),
        scope: SCOPE.to_string(),
        static_assets: vec!["./".into(), "./index.html".into(), "./js/app.js".into()],
        external_assets: vec![CHART_JS.into()],
        ..Default::default()
    }
}

struct Route {
    status: StatusCode,
    response_type: ResponseType,
    body: Bytes,
}

#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A transport serving every URL of [`test_config`]'s manifest.
    pub(crate) fn serving_manifest(tag: &str) -> Self {
        let transport = Self::new();
        transport.serve(SCOPE, &format!("<html>{tag}</html>"));
        transport.serve(INDEX, &format!("<html>{tag}</html>"));
        transport.serve(APP_JS, &format!("// app {tag}"));
        transport.serve_with(CHART_JS, StatusCode::OK, ResponseType::Cors, &format!("// chart {tag}"));
        transport
    }

    pub(crate) fn serve(&self, url: &str, body: &str) {
        self.serve_with(url, StatusCode::OK, ResponseType::Basic, body);
    }

    pub(crate) fn serve_with(&self, url: &str, status: StatusCode, response_type: ResponseType, body: &str) {
        let route = Route { status, response_type, body: Bytes::from(body.to_string()) };
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }

    pub(crate) fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.to_string();

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(Error::NetworkFailure(format!("{url}: connection refused")));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));

        let routes = self.routes.lock().unwrap();
        let response = match routes.get(&url) {
            Some(route) => Response {
                url: request.url.clone(),
                status: route.status,
                response_type: route.response_type,
                headers,
                body: route.body.clone(),
            },
            None => Response {
                url: request.url.clone(),
                status: StatusCode::NOT_FOUND,
                response_type: ResponseType::Basic,
                headers,
                body: Bytes::new(),
            },
        };
        Ok(response)
    }
}

pub(crate) fn worker(version: &str, db: &CacheDb, transport: &Arc<MockTransport>) -> ServiceWorker<MockTransport> {
    ServiceWorker::from_app_config(&test_config(version), db.clone(), Arc::clone(transport)).unwrap()
}
