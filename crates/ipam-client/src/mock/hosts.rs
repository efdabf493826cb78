//! Host operations for the mock client

use super::MockIpamClient;
use crate::common::query::build_query_string;
use crate::error::IpamError;
use crate::models::*;

impl MockIpamClient {
    /// Returns every stored host; filtering is left to the caller
    pub(crate) fn list_hosts_impl(&self, filter: &HostFilter) -> Result<Vec<Host>, IpamError> {
        let query = build_query_string(&filter.to_query_pairs());
        if query.is_empty() {
            self.record("GET /hosts");
        } else {
            self.record(format!("GET /hosts?{}", query));
        }
        self.check_read()?;
        Ok(self.hosts.lock().unwrap().clone())
    }

    pub(crate) fn create_host_impl(&self, host: &Host) -> Result<(), IpamError> {
        self.record("POST /hosts");
        self.check_mutation()?;

        let mut created = host.clone();
        if created.id.is_empty() {
            created.id = self.next_id("host");
        }
        self.adjust_used_hosts(&created.subnet_id, 1);
        self.hosts.lock().unwrap().push(created);
        Ok(())
    }

    pub(crate) fn update_host_impl(&self, host: &Host) -> Result<(), IpamError> {
        self.record(format!("PUT /hosts/{}", host.id));
        self.check_mutation()?;

        let previous_subnet = {
            let mut hosts = self.hosts.lock().unwrap();
            let existing = hosts
                .iter_mut()
                .find(|h| h.id == host.id)
                .ok_or_else(|| IpamError::NotFound(format!("Host {} not found", host.id)))?;
            let previous = existing.subnet_id.clone();
            *existing = host.clone();
            previous
        };

        if previous_subnet != host.subnet_id {
            self.adjust_used_hosts(&previous_subnet, -1);
            self.adjust_used_hosts(&host.subnet_id, 1);
        }
        Ok(())
    }

    pub(crate) fn delete_host_impl(&self, id: &str) -> Result<(), IpamError> {
        self.record(format!("DELETE /hosts/{}", id));
        self.check_mutation()?;

        let removed = {
            let mut hosts = self.hosts.lock().unwrap();
            let index = hosts
                .iter()
                .position(|h| h.id == id)
                .ok_or_else(|| IpamError::NotFound(format!("Host {} not found", id)))?;
            hosts.remove(index)
        };
        self.adjust_used_hosts(&removed.subnet_id, -1);
        Ok(())
    }

    pub(crate) fn bulk_ping_impl(&self, ids: &[String]) -> Result<Vec<PingResult>, IpamError> {
        self.record("POST /hosts/bulk/ping");
        self.check_read()?;

        let unreachable = self.unreachable_hosts.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| PingResult {
                id: id.clone(),
                success: !unreachable.contains(id),
            })
            .collect())
    }

    pub(crate) fn adjust_used_hosts(&self, subnet_id: &str, delta: i64) {
        let mut subnets = self.subnets.lock().unwrap();
        if let Some(subnet) = subnets.iter_mut().find(|s| s.id == subnet_id) {
            let next = i64::from(subnet.used_hosts) + delta;
            subnet.used_hosts = next.max(0) as u32;
        }
    }
}
