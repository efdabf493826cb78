//! Common utilities for the IPAC API client
//!
//! Provides the HTTP plumbing shared by every resource: URL building,
//! JSON requests, and translation of error responses.

pub mod query;

use crate::error::IpamError;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Error body shape returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client wrapper bound to the API base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Make a GET request with query parameters
    pub async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, IpamError> {
        let url = query::with_query(&self.build_url(path), params);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(IpamError::Http)?;

        let response = check_status(path, response).await?;
        response.json().await.map_err(IpamError::Http)
    }

    /// Make a POST request and decode the JSON response
    pub async fn post<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, IpamError> {
        let response = self.send_json(Method::POST, path, body).await?;
        response.json().await.map_err(IpamError::Http)
    }

    /// Make a POST request and return the raw response body
    pub async fn post_bytes<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>, IpamError> {
        let response = self.send_json(Method::POST, path, body).await?;
        let bytes = response.bytes().await.map_err(IpamError::Http)?;
        Ok(bytes.to_vec())
    }

    /// Make a POST or PUT request, discarding the response body
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), IpamError> {
        self.send_json(method, path, body).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), IpamError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(IpamError::Http)?;

        check_status(path, response).await?;
        Ok(())
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, IpamError> {
        let url = self.build_url(path);
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(IpamError::Http)?;

        check_status(path, response).await
    }
}

/// Turn a non-2xx response into an [`IpamError`]
async fn check_status(path: &str, response: Response) -> Result<Response, IpamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == 404 {
        return Err(IpamError::NotFound(format!("{} - {}", path, extract_message(&body))));
    }
    Err(IpamError::Api {
        status: status.as_u16(),
        message: extract_message(&body),
    })
}

/// Pull `message` out of a JSON error body, falling back to the raw text
pub(crate) fn extract_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { message: Some(message) }) => message,
        Ok(ErrorBody { message: None }) => String::new(),
        Err(_) => body.chars().take(500).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_base_and_path() {
        let http = HttpClient::new(Client::new(), "http://ipac:8080/api/".to_string());
        assert_eq!(http.base_url(), "http://ipac:8080/api");
        assert_eq!(http.build_url("/hosts"), "http://ipac:8080/api/hosts");
        assert_eq!(http.build_url("https://elsewhere/x"), "https://elsewhere/x");
    }

    #[test]
    fn extract_message_reads_json_message() {
        assert_eq!(extract_message(r#"{"message":"duplicate IP"}"#), "duplicate IP");
        assert_eq!(extract_message(r#"{"detail":"x"}"#), "");
        assert_eq!(extract_message("Bad Gateway"), "Bad Gateway");
    }
}
