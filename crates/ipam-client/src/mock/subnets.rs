//! Subnet, rack, dashboard and report operations for the mock client

use super::MockIpamClient;
use crate::error::IpamError;
use crate::models::*;

impl MockIpamClient {
    pub(crate) fn get_dashboard_overview_impl(&self) -> Result<DashboardOverview, IpamError> {
        self.record("GET /dashboard/overview");
        self.check_read()?;
        self.dashboard
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| IpamError::NotFound("dashboard overview not configured".to_string()))
    }

    /// Subnets with member hosts joined from the host store
    pub(crate) fn list_subnets_impl(&self) -> Result<Vec<Subnet>, IpamError> {
        self.record("GET /subnets");
        self.check_read()?;

        let hosts = self.hosts.lock().unwrap();
        Ok(self
            .subnets
            .lock()
            .unwrap()
            .iter()
            .map(|subnet| {
                let mut subnet = subnet.clone();
                subnet.hosts = hosts.iter().filter(|h| h.subnet_id == subnet.id).cloned().collect();
                subnet
            })
            .collect())
    }

    pub(crate) fn create_subnet_impl(&self, subnet: &Subnet) -> Result<(), IpamError> {
        self.record("POST /subnets");
        self.check_mutation()?;

        let mut created = subnet.clone();
        if created.id.is_empty() {
            created.id = self.next_id("subnet");
        }
        created.hosts.clear();
        self.subnets.lock().unwrap().push(created);
        Ok(())
    }

    pub(crate) fn update_subnet_impl(&self, subnet: &Subnet) -> Result<(), IpamError> {
        self.record(format!("PUT /subnets/{}", subnet.id));
        self.check_mutation()?;

        let mut subnets = self.subnets.lock().unwrap();
        let existing = subnets
            .iter_mut()
            .find(|s| s.id == subnet.id)
            .ok_or_else(|| IpamError::NotFound(format!("Subnet {} not found", subnet.id)))?;
        *existing = Subnet {
            hosts: Vec::new(),
            ..subnet.clone()
        };
        Ok(())
    }

    pub(crate) fn delete_subnet_impl(&self, id: &str) -> Result<(), IpamError> {
        self.record(format!("DELETE /subnets/{}", id));
        self.check_mutation()?;

        let mut subnets = self.subnets.lock().unwrap();
        let before = subnets.len();
        subnets.retain(|s| s.id != id);
        if subnets.len() == before {
            return Err(IpamError::NotFound(format!("Subnet {} not found", id)));
        }
        Ok(())
    }

    pub(crate) fn list_racks_impl(&self) -> Result<Vec<Rack>, IpamError> {
        self.record("GET /racks");
        self.check_read()?;
        Ok(self.racks.lock().unwrap().clone())
    }

    pub(crate) fn export_report_impl(&self, _filter: &ReportFilter, _format: ExportFormat) -> Result<Vec<u8>, IpamError> {
        self.record("POST /reports/export");
        self.check_mutation()?;
        Ok(self.export.lock().unwrap().clone())
    }
}
