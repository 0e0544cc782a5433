use std::sync::Arc;

use async_trait::async_trait;
use miviaje_core::{FetchError, Method, Network, Request, Response};
use serde::{Deserialize, Serialize};
use url::Url;

/// Options for a page-initiated HTTP call, stored verbatim in the offline queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub method: Method,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestOptions {
    /// JSON request with `body` serialized
    pub fn json<T: Serialize>(method: Method, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(serde_json::to_string(body)?),
        })
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, options: &RequestOptions) -> Result<Response, FetchError>;
}

/// Transport over a `Network`, resolving relative URLs against the page origin.
pub struct NetworkTransport {
    network: Arc<dyn Network>,
    origin: Url,
}

impl NetworkTransport {
    pub fn new(network: Arc<dyn Network>, origin: Url) -> Self {
        Self { network, origin }
    }

    fn build_request(&self, url: &str, options: &RequestOptions) -> Result<Request, FetchError> {
        let url = self
            .origin
            .join(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        let mut request = Request::new(options.method, url);
        for (name, value) in &options.headers {
            request = request.with_header(name.clone(), value.clone());
        }
        if let Some(body) = &options.body {
            request = request.with_body(body.clone().into_bytes());
        }
        Ok(request)
    }
}

#[async_trait]
impl Transport for NetworkTransport {
    async fn send(&self, url: &str, options: &RequestOptions) -> Result<Response, FetchError> {
        let request = self.build_request(url, options)?;
        self.network.fetch(&request).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use miviaje_core::ResponseType;

    use super::*;

    /// Transport answering from per-URL scripted results; unscripted URLs fail.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        results: Mutex<HashMap<String, VecDeque<Result<(u16, String), String>>>>,
        pub(crate) sent: Mutex<Vec<(String, RequestOptions)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
            self.results
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(Ok((status, body.to_string())));
        }

        pub(crate) fn fail(&self, url: &str) {
            self.results
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(Err("Failed to fetch".to_string()));
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, url: &str, options: &RequestOptions) -> Result<Response, FetchError> {
            self.sent.lock().unwrap().push((url.to_string(), options.clone()));
            let next = self
                .results
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| queue.pop_front());
            match next {
                Some(Ok((status, body))) => {
                    let url = Url::parse("http://localhost:5000").unwrap().join(url).unwrap();
                    Ok(Response::new(status, ResponseType::Basic, url.as_str()).with_body(body))
                }
                Some(Err(reason)) => Err(FetchError::Unreachable(reason)),
                None => Err(FetchError::Unreachable(format!("no route for {}", url))),
            }
        }
    }

    /// Network fake recording the requests it receives.
    #[derive(Default)]
    struct RecordingNetwork {
        requests: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl Network for RecordingNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(Response::new(201, ResponseType::Basic, request.url.as_str()))
        }
    }

    #[tokio::test]
    async fn test_network_transport_builds_request() {
        let network = Arc::new(RecordingNetwork::default());
        let transport = NetworkTransport::new(network.clone(), Url::parse("http://localhost:5000").unwrap());
        let options = RequestOptions::json(Method::Post, &serde_json::json!({"monto": 12.5})).unwrap();

        let response = transport.send("/api/viajes/3/gastos", &options).await.unwrap();
        assert_eq!(response.status, 201);

        let requests = network.requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url.as_str(), "http://localhost:5000/api/viajes/3/gastos");
        assert_eq!(requests[0].headers, vec![("Content-Type".to_string(), "application/json".to_string())]);
        assert_eq!(requests[0].body.as_deref(), Some(br#"{"monto":12.5}"#.as_slice()));
    }
}
