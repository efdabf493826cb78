//! Dashboard page: headline counts, subnet utilisation and service mix.

use ipam_client::{DashboardOverview, Host, IpamService, ServiceType};
use serde::Serialize;

/// Palette cycled over utilisation bars and service slices
pub const CHART_COLORS: [&str; 6] = ["#2563eb", "#7c3aed", "#22c55e", "#f97316", "#ef4444", "#0ea5e9"];

/// Recent hosts shown per reachability column
pub const RECENT_LIMIT: usize = 5;

/// One bar of the utilisation chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationBar {
    pub subnet_id: String,
    pub subnet_name: String,
    pub usage: u32,
    pub color: &'static str,
}

/// One slice of the service distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSlice {
    pub service_type: ServiceType,
    pub count: u32,
    /// Share of all counted hosts, rounded to a whole percent
    pub percent: u32,
    pub color: &'static str,
}

/// Everything the dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub total_ips: u32,
    pub online_hosts: u32,
    pub offline_hosts: u32,
    pub conflict_count: u32,
    pub utilization: Vec<UtilizationBar>,
    pub services: Vec<ServiceSlice>,
    pub recent_online: Vec<Host>,
    pub recent_offline: Vec<Host>,
}

impl DashboardView {
    /// Derive the view from an overview
    pub fn from_overview(overview: &DashboardOverview) -> Self {
        let utilization = overview
            .utilization_by_subnet
            .iter()
            .zip(CHART_COLORS.iter().copied().cycle())
            .map(|(row, color)| UtilizationBar {
                subnet_id: row.subnet_id.clone(),
                subnet_name: row.subnet_name.clone(),
                usage: row.usage.min(100),
                color,
            })
            .collect();

        let counted: u32 = overview.service_distribution.iter().map(|s| s.count).sum();
        let services = overview
            .service_distribution
            .iter()
            .zip(CHART_COLORS.iter().copied().cycle())
            .map(|(bucket, color)| ServiceSlice {
                service_type: bucket.service_type,
                count: bucket.count,
                percent: if counted == 0 {
                    0
                } else {
                    (f64::from(bucket.count) * 100.0 / f64::from(counted)).round() as u32
                },
                color,
            })
            .collect();

        Self {
            total_ips: overview.total_ips,
            online_hosts: overview.online_hosts,
            offline_hosts: overview.offline_hosts,
            conflict_count: overview.conflict_count,
            utilization,
            services,
            recent_online: overview.recent_hosts.online.iter().take(RECENT_LIMIT).cloned().collect(),
            recent_offline: overview.recent_hosts.offline.iter().take(RECENT_LIMIT).cloned().collect(),
        }
    }

    /// Subnets at or above `threshold` percent, busiest first
    pub fn saturated(&self, threshold: u32) -> Vec<&UtilizationBar> {
        let mut rows: Vec<&UtilizationBar> = self.utilization.iter().filter(|r| r.usage >= threshold).collect();
        rows.sort_by(|a, b| b.usage.cmp(&a.usage));
        rows
    }
}

/// Dashboard page state
#[derive(Debug)]
pub struct DashboardPage {
    service: IpamService,
    view: Option<DashboardView>,
}

impl DashboardPage {
    /// Page over `service`; nothing is fetched yet
    pub fn new(service: IpamService) -> Self {
        Self { service, view: None }
    }

    /// Fetch (or refetch) the overview
    pub async fn refresh(&mut self) -> &DashboardView {
        let overview = self.service.dashboard_overview().await;
        self.view.insert(DashboardView::from_overview(&overview))
    }

    /// Last loaded view
    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::seeded;
    use ipam_client::{RecentHosts, ServiceCount, SubnetUtilization, fallback};

    fn overview(rows: usize) -> DashboardOverview {
        DashboardOverview {
            total_ips: 10,
            online_hosts: 1,
            offline_hosts: 0,
            conflict_count: 0,
            utilization_by_subnet: (0..rows)
                .map(|i| SubnetUtilization {
                    subnet_id: format!("s{i}"),
                    subnet_name: format!("S{i}"),
                    usage: (i as u32) * 20,
                })
                .collect(),
            recent_hosts: RecentHosts {
                online: fallback::hosts(),
                offline: Vec::new(),
            },
            service_distribution: vec![
                ServiceCount {
                    service_type: ServiceType::Web,
                    count: 1,
                },
                ServiceCount {
                    service_type: ServiceType::Database,
                    count: 2,
                },
            ],
        }
    }

    #[test]
    fn colors_cycle_and_recent_hosts_are_capped() {
        let view = DashboardView::from_overview(&overview(8));
        assert_eq!(view.utilization[6].color, CHART_COLORS[0]);
        assert_eq!(view.utilization[7].usage, 100);
        assert_eq!(view.recent_online.len(), RECENT_LIMIT);
        assert!(view.recent_offline.is_empty());
    }

    #[test]
    fn service_shares_are_percentages() {
        let view = DashboardView::from_overview(&overview(1));
        let shares: Vec<u32> = view.services.iter().map(|s| s.percent).collect();
        assert_eq!(shares, [33, 67]);
    }

    #[test]
    fn saturated_subnets_are_sorted_busiest_first() {
        let view = DashboardView::from_overview(&overview(5));
        let ids: Vec<&str> = view.saturated(40).iter().map(|r| r.subnet_id.as_str()).collect();
        assert_eq!(ids, ["s4", "s3", "s2"]);
    }

    #[tokio::test]
    async fn refresh_uses_bundled_overview_when_backend_has_none() {
        let (mock, service) = seeded();
        let mut page = DashboardPage::new(service);
        assert!(page.view().is_none());

        let view = page.refresh().await.clone();
        assert_eq!(view, DashboardView::from_overview(&fallback::dashboard()));
        assert_eq!(mock.calls(), ["GET /dashboard/overview"]);
    }
}
