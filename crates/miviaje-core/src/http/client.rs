//! Network access for both execution contexts.
//!
//! `Network` is the seam the service worker and the page send requests
//! through. `HttpNetwork` is the real implementation on top of reqwest; tests
//! substitute in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{FetchError, Method, Request, Response, ResponseType};

#[async_trait]
pub trait Network: Send + Sync {
    /// Send a request. Only transport failures are errors; any HTTP status is a response.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// reqwest-backed network for a single app origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        if ResponseType::classify(&self.origin, request) == ResponseType::Error {
            return Err(FetchError::CrossOrigin(request.url.to_string()));
        }

        let mut builder = self
            .client
            .request(Self::method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(
            url = %request.url,
            final_url = %response.url(),
            status = status.as_u16(),
            "Network response"
        );

        // Redirects may have left the origin
        let response_type = ResponseType::for_url(&self.origin, response.url(), request.mode);
        if response_type == ResponseType::Error {
            return Err(FetchError::CrossOrigin(response.url().to_string()));
        }

        if response_type == ResponseType::Opaque {
            return Ok(Response::opaque());
        }

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let url = response.url().to_string();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            response_type,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestMode;

    #[tokio::test]
    async fn test_fetch_same_origin_is_basic() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/static/js/app.js")
            .with_status(200)
            .with_header("content-type", "text/javascript")
            .with_body("console.log('hola');")
            .create_async()
            .await;

        let origin = Url::parse(&server.url()).unwrap();
        let network = HttpNetwork::new(origin.clone(), Duration::from_secs(5)).unwrap();
        let request = Request::resolve(&origin, "/static/js/app.js").unwrap();

        let response = network.fetch(&request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.response_type, ResponseType::Basic);
        assert_eq!(response.text(), "console.log('hola');");
        assert_eq!(response.header("content-type"), Some("text/javascript"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_still_a_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/gastos")
            .with_status(500)
            .create_async()
            .await;

        let origin = Url::parse(&server.url()).unwrap();
        let network = HttpNetwork::new(origin.clone(), Duration::from_secs(5)).unwrap();
        let request = Request::new(Method::Post, origin.join("/api/gastos").unwrap())
            .with_header("content-type", "application/json")
            .with_body(r#"{"monto": 12.5}"#);

        let response = network.fetch(&request).await.unwrap();
        assert_eq!(response.status, 500);
        assert!(!response.ok());
    }

    #[tokio::test]
    async fn test_same_origin_mode_rejects_cross_origin() {
        let origin = Url::parse("http://localhost:5000").unwrap();
        let network = HttpNetwork::new(origin.clone(), Duration::from_secs(5)).unwrap();
        let request = Request::resolve(&origin, "https://fonts.googleapis.com/css2")
            .unwrap()
            .with_mode(RequestMode::SameOrigin);

        let err = network.fetch(&request).await.unwrap_err();
        assert!(matches!(err, FetchError::CrossOrigin(_)));
    }

    #[tokio::test]
    async fn test_redirect_to_other_origin_is_not_basic() {
        let mut app = mockito::Server::new_async().await;
        let mut cdn = mockito::Server::new_async().await;
        let target = format!("{}/css/styles.css", cdn.url());
        app.mock("GET", "/static/css/styles.css")
            .with_status(302)
            .with_header("location", &target)
            .expect(2)
            .create_async()
            .await;
        cdn.mock("GET", "/css/styles.css")
            .with_status(200)
            .with_body("body {}")
            .create_async()
            .await;

        let origin = Url::parse(&app.url()).unwrap();
        let network = HttpNetwork::new(origin.clone(), Duration::from_secs(5)).unwrap();
        let request = Request::resolve(&origin, "/static/css/styles.css").unwrap();

        let response = network.fetch(&request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.url, target);
        assert_eq!(response.response_type, ResponseType::Cors);

        let strict = request.with_mode(RequestMode::SameOrigin);
        let err = network.fetch(&strict).await.unwrap_err();
        assert!(matches!(err, FetchError::CrossOrigin(url) if url == target));
    }
}
