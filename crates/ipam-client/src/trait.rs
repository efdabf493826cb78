//! IpamClient trait for mocking
//!
//! This trait abstracts the REST client so the data access layer and the
//! page controllers can be exercised against an in-memory implementation.

use crate::error::IpamError;
use crate::models::*;

/// Trait for IPAC API operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait IpamClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    // Dashboard
    /// Aggregate counts for the dashboard
    async fn get_dashboard_overview(&self) -> Result<DashboardOverview, IpamError>;

    // Subnets
    /// All subnets with their member hosts
    async fn list_subnets(&self) -> Result<Vec<Subnet>, IpamError>;
    /// Create a subnet
    async fn create_subnet(&self, subnet: &Subnet) -> Result<(), IpamError>;
    /// Replace a subnet by id
    async fn update_subnet(&self, subnet: &Subnet) -> Result<(), IpamError>;
    /// Delete a subnet
    async fn delete_subnet(&self, id: &str) -> Result<(), IpamError>;

    // Hosts
    /// Hosts matching `filter`
    async fn list_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>, IpamError>;
    /// Create a host
    async fn create_host(&self, host: &Host) -> Result<(), IpamError>;
    /// Replace a host by id
    async fn update_host(&self, host: &Host) -> Result<(), IpamError>;
    /// Delete a host
    async fn delete_host(&self, id: &str) -> Result<(), IpamError>;
    /// Ping each host; one result per id
    async fn bulk_ping(&self, ids: &[String]) -> Result<Vec<PingResult>, IpamError>;

    // Racks
    /// All racks
    async fn list_racks(&self) -> Result<Vec<Rack>, IpamError>;

    // Reports
    /// Rendered report file
    async fn export_report(&self, filter: &ReportFilter, format: ExportFormat) -> Result<Vec<u8>, IpamError>;
}
