//! IPAC API client
//!
//! Implements the REST client for the IPAC inventory backend:
//! /dashboard/overview, /subnets, /hosts, /racks and /reports/export.

use crate::common::HttpClient;
use crate::error::IpamError;
use crate::ipam_trait::IpamClientTrait;
use crate::models::*;
use reqwest::{Client, Method};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// IPAC API client
#[derive(Debug, Clone)]
pub struct IpamClient {
    http: HttpClient,
}

impl IpamClient {
    /// Create a new client with the default 10 second timeout
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g., "http://ipac:8080/api")
    pub fn new(base_url: String) -> Result<Self, IpamError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with an explicit request timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self, IpamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IpamError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, base_url),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Fetch the dashboard aggregate
    pub async fn get_dashboard_overview(&self) -> Result<DashboardOverview, IpamError> {
        self.http.get("/dashboard/overview", &[]).await
    }

    /// List subnets with their member hosts
    pub async fn list_subnets(&self) -> Result<Vec<Subnet>, IpamError> {
        self.http.get("/subnets", &[]).await
    }

    /// Create a subnet
    pub async fn create_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        debug!("Creating subnet {}", subnet.cidr);
        self.http.send(Method::POST, "/subnets", subnet).await
    }

    /// Replace an existing subnet
    pub async fn update_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        let path = format!("/subnets/{}", require_id("subnet", &subnet.id)?);
        self.http.send(Method::PUT, &path, subnet).await
    }

    /// Delete a subnet
    pub async fn delete_subnet(&self, id: &str) -> Result<(), IpamError> {
        let path = format!("/subnets/{}", require_id("subnet", id)?);
        self.http.delete(&path).await
    }

    /// List hosts matching a filter
    ///
    /// # Arguments
    /// * `filter` - Sent as query parameters; empty dimensions are omitted
    pub async fn list_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>, IpamError> {
        self.http.get("/hosts", &filter.to_query_pairs()).await
    }

    /// Create a host
    pub async fn create_host(&self, host: &Host) -> Result<(), IpamError> {
        debug!("Creating host {} ({})", host.hostname, host.ip_address);
        self.http.send(Method::POST, "/hosts", host).await
    }

    /// Replace an existing host
    pub async fn update_host(&self, host: &Host) -> Result<(), IpamError> {
        let path = format!("/hosts/{}", require_id("host", &host.id)?);
        self.http.send(Method::PUT, &path, host).await
    }

    /// Delete a host
    pub async fn delete_host(&self, id: &str) -> Result<(), IpamError> {
        let path = format!("/hosts/{}", require_id("host", id)?);
        self.http.delete(&path).await
    }

    /// Ping several hosts at once
    pub async fn bulk_ping(&self, ids: &[String]) -> Result<Vec<PingResult>, IpamError> {
        self.http.post("/hosts/bulk/ping", &json!({ "ids": ids })).await
    }

    /// List racks
    pub async fn list_racks(&self) -> Result<Vec<Rack>, IpamError> {
        self.http.get("/racks", &[]).await
    }

    /// Export a report; the response body is the file content
    pub async fn export_report(&self, filter: &ReportFilter, format: ExportFormat) -> Result<Vec<u8>, IpamError> {
        self.http
            .post_bytes("/reports/export", &json!({ "filter": filter, "format": format }))
            .await
    }
}

fn require_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, IpamError> {
    if id.is_empty() {
        return Err(IpamError::InvalidRequest(format!("{} id is required", kind)));
    }
    Ok(id)
}

#[async_trait::async_trait]
impl IpamClientTrait for IpamClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn get_dashboard_overview(&self) -> Result<DashboardOverview, IpamError> {
        self.get_dashboard_overview().await
    }

    async fn list_subnets(&self) -> Result<Vec<Subnet>, IpamError> {
        self.list_subnets().await
    }

    async fn create_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        self.create_subnet(subnet).await
    }

    async fn update_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        self.update_subnet(subnet).await
    }

    async fn delete_subnet(&self, id: &str) -> Result<(), IpamError> {
        self.delete_subnet(id).await
    }

    async fn list_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>, IpamError> {
        self.list_hosts(filter).await
    }

    async fn create_host(&self, host: &Host) -> Result<(), IpamError> {
        self.create_host(host).await
    }

    async fn update_host(&self, host: &Host) -> Result<(), IpamError> {
        self.update_host(host).await
    }

    async fn delete_host(&self, id: &str) -> Result<(), IpamError> {
        self.delete_host(id).await
    }

    async fn bulk_ping(&self, ids: &[String]) -> Result<Vec<PingResult>, IpamError> {
        self.bulk_ping(ids).await
    }

    async fn list_racks(&self) -> Result<Vec<Rack>, IpamError> {
        self.list_racks().await
    }

    async fn export_report(&self, filter: &ReportFilter, format: ExportFormat) -> Result<Vec<u8>, IpamError> {
        self.export_report(filter, format).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_without_id_is_rejected_before_any_request() {
        let client = IpamClient::new("http://127.0.0.1:9".to_string()).unwrap();
        let err = client.delete_host("").await.unwrap_err();
        assert!(matches!(err, IpamError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_surfaces_http_error() {
        let client =
            IpamClient::with_timeout("http://127.0.0.1:9".to_string(), Duration::from_millis(200)).unwrap();
        let err = client.list_subnets().await.unwrap_err();
        assert!(matches!(err, IpamError::Http(_)));
    }
}
