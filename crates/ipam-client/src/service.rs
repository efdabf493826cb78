//! Data access layer
//!
//! Reads never fail: any error (timeout, non-2xx, connection refused,
//! undecodable body) is logged and replaced by the bundled dataset from
//! [`crate::fallback`]. Mutations propagate the error untouched so forms can
//! report it.

use crate::error::IpamError;
use crate::fallback;
use crate::ipam_trait::IpamClientTrait;
use crate::models::*;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Backend access with offline fallback for reads
#[derive(Clone)]
pub struct IpamService {
    client: Arc<dyn IpamClientTrait>,
}

impl std::fmt::Debug for IpamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpamService")
            .field("base_url", &self.client.base_url())
            .finish()
    }
}

fn or_fallback<T>(resource: &str, result: Result<T, IpamError>, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("[{}] falling back to bundled dataset: {}", resource, e);
            fallback()
        }
    }
}

fn logged<T>(action: &str, result: Result<T, IpamError>) -> Result<T, IpamError> {
    match &result {
        Ok(_) => info!("{} succeeded", action),
        Err(e) => error!("{} failed: {}", action, e),
    }
    result
}

impl IpamService {
    /// Wrap a client
    pub fn new(client: Arc<dyn IpamClientTrait>) -> Self {
        Self { client }
    }

    /// Base URL of the underlying client
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Dashboard aggregate, or the bundled one
    pub async fn dashboard_overview(&self) -> DashboardOverview {
        or_fallback("dashboard overview", self.client.get_dashboard_overview().await, fallback::dashboard)
    }

    /// Subnets with hosts, or the bundled ones
    pub async fn subnets(&self) -> Vec<Subnet> {
        or_fallback("subnets", self.client.list_subnets().await, fallback::subnets)
    }

    /// Hosts matching `filter`, or the full bundled inventory.
    ///
    /// The fallback is not filtered; callers re-apply the filter locally.
    pub async fn hosts(&self, filter: &HostFilter) -> Vec<Host> {
        or_fallback("hosts", self.client.list_hosts(filter).await, fallback::hosts)
    }

    /// Racks, or the bundled ones
    pub async fn racks(&self) -> Vec<Rack> {
        or_fallback("racks", self.client.list_racks().await, fallback::racks)
    }

    /// Ping results, or a deterministic stand-in per id
    pub async fn bulk_ping(&self, ids: &[String]) -> Vec<PingResult> {
        or_fallback("bulk ping", self.client.bulk_ping(ids).await, || fallback::ping(ids))
    }

    /// Create a subnet when `id` is empty, otherwise replace it
    pub async fn save_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        if subnet.id.is_empty() {
            logged(&format!("create subnet {}", subnet.cidr), self.client.create_subnet(subnet).await)
        } else {
            logged(&format!("update subnet {}", subnet.id), self.client.update_subnet(subnet).await)
        }
    }

    /// Delete a subnet
    pub async fn delete_subnet(&self, id: &str) -> Result<(), IpamError> {
        logged(&format!("delete subnet {}", id), self.client.delete_subnet(id).await)
    }

    /// Create a host when `id` is empty, otherwise replace it
    pub async fn save_host(&self, host: &Host) -> Result<(), IpamError> {
        if host.id.is_empty() {
            logged(&format!("create host {}", host.hostname), self.client.create_host(host).await)
        } else {
            logged(&format!("update host {}", host.id), self.client.update_host(host).await)
        }
    }

    /// Delete a host
    pub async fn delete_host(&self, id: &str) -> Result<(), IpamError> {
        logged(&format!("delete host {}", id), self.client.delete_host(id).await)
    }

    /// Export a report; failures propagate so the caller decides on a substitute
    pub async fn export_report(&self, filter: &ReportFilter, format: ExportFormat) -> Result<Vec<u8>, IpamError> {
        logged(
            &format!("export {} report as {}", filter.report_type, format),
            self.client.export_report(filter, format).await,
        )
    }
}
