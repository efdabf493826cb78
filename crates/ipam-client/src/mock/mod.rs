//! Mock IpamClient for unit testing
//!
//! This module provides a mock implementation of IpamClientTrait that can be used
//! in unit tests without requiring a running backend.
//!
//! The mock is organized into resource-specific modules:
//! - `hosts.rs` - host CRUD, bulk ping
//! - `subnets.rs` - subnet CRUD, racks, dashboard, report export

#![allow(clippy::unwrap_used, reason = "poisoned locks only happen after a panicking test")]

mod hosts;
mod subnets;

use crate::error::IpamError;
use crate::ipam_trait::IpamClientTrait;
use crate::models::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock IpamClient for testing
///
/// Stores resources in memory, records every call as `"<METHOD> <path>"`,
/// and can be switched into failing reads or failing mutations.
#[derive(Clone, Debug)]
pub struct MockIpamClient {
    pub(crate) base_url: String,
    // In-memory storage for resources
    pub(crate) hosts: Arc<Mutex<Vec<Host>>>,
    pub(crate) subnets: Arc<Mutex<Vec<Subnet>>>,
    pub(crate) racks: Arc<Mutex<Vec<Rack>>>,
    pub(crate) dashboard: Arc<Mutex<Option<DashboardOverview>>>,
    pub(crate) export: Arc<Mutex<Vec<u8>>>,
    pub(crate) unreachable_hosts: Arc<Mutex<Vec<String>>>,
    // Failure switches and call log
    pub(crate) fail_reads: Arc<AtomicBool>,
    pub(crate) fail_mutations: Arc<AtomicBool>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    // Counter for generating IDs
    pub(crate) next_id: Arc<Mutex<u64>>,
}

impl MockIpamClient {
    /// Create a new, empty mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            hosts: Arc::new(Mutex::new(Vec::new())),
            subnets: Arc::new(Mutex::new(Vec::new())),
            racks: Arc::new(Mutex::new(Vec::new())),
            dashboard: Arc::new(Mutex::new(None)),
            export: Arc::new(Mutex::new(b"hostname,ip\n".to_vec())),
            unreachable_hosts: Arc::new(Mutex::new(Vec::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_mutations: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Create a mock pre-loaded with the bundled subnets, hosts and racks
    pub fn seeded(base_url: impl Into<String>) -> Self {
        let mock = Self::new(base_url);
        for subnet in crate::fallback::subnets() {
            mock.add_subnet(subnet);
        }
        for host in crate::fallback::hosts() {
            mock.add_host(host);
        }
        for rack in crate::fallback::racks() {
            mock.add_rack(rack);
        }
        mock
    }

    /// Make every read return an error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every mutation return an error
    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Calls made so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Add a host to the mock store (for test setup)
    pub fn add_host(&self, host: Host) {
        self.hosts.lock().unwrap().push(host);
    }

    /// Add a subnet to the mock store (for test setup); member hosts are ignored
    pub fn add_subnet(&self, mut subnet: Subnet) {
        subnet.hosts.clear();
        self.subnets.lock().unwrap().push(subnet);
    }

    /// Add a rack to the mock store (for test setup)
    pub fn add_rack(&self, rack: Rack) {
        self.racks.lock().unwrap().push(rack);
    }

    /// Set the dashboard returned by the overview endpoint
    pub fn set_dashboard(&self, overview: DashboardOverview) {
        *self.dashboard.lock().unwrap() = Some(overview);
    }

    /// Set the bytes returned by the export endpoint
    pub fn set_export(&self, bytes: Vec<u8>) {
        *self.export.lock().unwrap() = bytes;
    }

    /// Hosts that answer a bulk ping with failure
    pub fn set_unreachable(&self, ids: &[&str]) {
        *self.unreachable_hosts.lock().unwrap() = ids.iter().map(|id| id.to_string()).collect();
    }

    /// Snapshot of stored hosts
    pub fn hosts(&self) -> Vec<Host> {
        self.hosts.lock().unwrap().clone()
    }

    /// Snapshot of stored subnets (without member hosts)
    pub fn stored_subnets(&self) -> Vec<Subnet> {
        self.subnets.lock().unwrap().clone()
    }

    /// Generate next ID
    pub(crate) fn next_id(&self, prefix: &str) -> String {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        format!("{}-mock-{}", prefix, current)
    }

    pub(crate) fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub(crate) fn check_read(&self) -> Result<(), IpamError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(IpamError::Api {
                status: 503,
                message: "mock backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_mutation(&self) -> Result<(), IpamError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(IpamError::Api {
                status: 500,
                message: "mock mutation rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IpamClientTrait for MockIpamClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_dashboard_overview(&self) -> Result<DashboardOverview, IpamError> {
        self.get_dashboard_overview_impl()
    }

    async fn list_subnets(&self) -> Result<Vec<Subnet>, IpamError> {
        self.list_subnets_impl()
    }

    async fn create_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        self.create_subnet_impl(subnet)
    }

    async fn update_subnet(&self, subnet: &Subnet) -> Result<(), IpamError> {
        self.update_subnet_impl(subnet)
    }

    async fn delete_subnet(&self, id: &str) -> Result<(), IpamError> {
        self.delete_subnet_impl(id)
    }

    async fn list_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>, IpamError> {
        self.list_hosts_impl(filter)
    }

    async fn create_host(&self, host: &Host) -> Result<(), IpamError> {
        self.create_host_impl(host)
    }

    async fn update_host(&self, host: &Host) -> Result<(), IpamError> {
        self.update_host_impl(host)
    }

    async fn delete_host(&self, id: &str) -> Result<(), IpamError> {
        self.delete_host_impl(id)
    }

    async fn bulk_ping(&self, ids: &[String]) -> Result<Vec<PingResult>, IpamError> {
        self.bulk_ping_impl(ids)
    }

    async fn list_racks(&self) -> Result<Vec<Rack>, IpamError> {
        self.list_racks_impl()
    }

    async fn export_report(&self, filter: &ReportFilter, format: ExportFormat) -> Result<Vec<u8>, IpamError> {
        self.export_report_impl(filter, format)
    }
}
