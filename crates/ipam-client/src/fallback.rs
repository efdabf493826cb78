//! Bundled datasets substituted for failed reads.
//!
//! Everything here is deterministic: timestamps are anchored to a fixed
//! instant and the bulk ping outcome is derived from the host id, so two
//! calls always return identical data.

use crate::models::*;
use chrono::{DateTime, TimeDelta, Utc};

/// 2024-06-01T08:00:00Z
const ANCHOR_SECS: i64 = 1_717_228_800;

/// Fixed "now" used by the bundled datasets
pub fn anchor() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(ANCHOR_SECS)
}

fn days_ago(days: f64) -> DateTime<Utc> {
    anchor() - TimeDelta::seconds((days * 86_400.0) as i64)
}

fn tag(id: &str, label: &str, color: &str) -> HostTag {
    HostTag {
        id: id.to_string(),
        label: label.to_string(),
        color: color.to_string(),
    }
}

struct Seed {
    id: &'static str,
    hostname: &'static str,
    ip: &'static str,
    mac: &'static str,
    subnet: (&'static str, &'static str),
    status: HostStatus,
    service: ServiceType,
    os: &'static str,
    seen_days_ago: f64,
    description: Option<&'static str>,
}

impl Seed {
    fn into_host(self, tags: Vec<HostTag>) -> Host {
        Host {
            id: self.id.to_string(),
            hostname: self.hostname.to_string(),
            ip_address: self.ip.to_string(),
            mac_address: self.mac.to_string(),
            subnet_id: self.subnet.0.to_string(),
            subnet_name: self.subnet.1.to_string(),
            status: self.status,
            service_type: self.service,
            os: self.os.to_string(),
            last_seen_at: days_ago(self.seen_days_ago),
            description: self.description.map(str::to_string),
            tags,
            host_type: None,
            parent_host_id: None,
            vm_count: None,
            rack_id: None,
            rack_position: None,
            rack_units: None,
        }
    }
}

const OFFICE_A: (&str, &str) = ("subnet-a", "Office LAN A");
const DATACENTER_B: (&str, &str) = ("subnet-b", "Datacenter B");
const IOT_C: (&str, &str) = ("subnet-c", "IoT Management");

fn racked(mut host: Host, host_type: HostType, rack: &str, position: u8, units: u8) -> Host {
    host.host_type = Some(host_type);
    host.rack_id = Some(rack.to_string());
    host.rack_position = Some(position);
    host.rack_units = Some(units);
    host
}

fn guest_of(mut host: Host, parent: &str) -> Host {
    host.host_type = Some(HostType::Vm);
    host.parent_host_id = Some(parent.to_string());
    host
}

/// Bundled host inventory
pub fn hosts() -> Vec<Host> {
    let mut hosts = vec![
        Seed {
            id: "host-001",
            hostname: "web-gateway-01",
            ip: "10.10.0.12",
            mac: "00:1A:2B:3C:4D:5E",
            subnet: OFFICE_A,
            status: HostStatus::Online,
            service: ServiceType::Web,
            os: "Ubuntu 22.04",
            seen_days_ago: 0.0,
            description: Some("Core web API gateway"),
        }
        .into_host(vec![
            tag("prod", "Production", "#2563EB"),
            tag("critical", "Critical", "#DC2626"),
        ]),
        Seed {
            id: "host-002",
            hostname: "db-primary",
            ip: "10.10.0.50",
            mac: "00:1A:2B:3C:4D:5F",
            subnet: OFFICE_A,
            status: HostStatus::Online,
            service: ServiceType::Database,
            os: "Rocky Linux 9",
            seen_days_ago: 0.3,
            description: Some("PostgreSQL cluster node"),
        }
        .into_host(vec![tag("db", "Database", "#7C3AED")]),
        racked(
            Seed {
                id: "host-003",
                hostname: "nas-backup-01",
                ip: "10.20.10.10",
                mac: "00:1A:2B:3C:4D:60",
                subnet: DATACENTER_B,
                status: HostStatus::Offline,
                service: ServiceType::File,
                os: "TrueNAS 13",
                seen_days_ago: 1.6,
                description: Some("Nightly backup NAS"),
            }
            .into_host(vec![tag("backup", "Backup", "#0EA5E9")]),
            HostType::Physical,
            "rack-a1",
            20,
            4,
        ),
        Seed {
            id: "host-004",
            hostname: "monitor-core",
            ip: "10.10.0.99",
            mac: "00:1A:2B:3C:4D:61",
            subnet: OFFICE_A,
            status: HostStatus::Online,
            service: ServiceType::Monitoring,
            os: "Debian 12",
            seen_days_ago: 0.1,
            description: None,
        }
        .into_host(vec![tag("observability", "Observability", "#16A34A")]),
        Seed {
            id: "host-005",
            hostname: "iot-gateway",
            ip: "172.16.0.30",
            mac: "00:1A:2B:3C:4D:62",
            subnet: IOT_C,
            status: HostStatus::Offline,
            service: ServiceType::Application,
            os: "Ubuntu Core",
            seen_days_ago: 0.8,
            description: Some("IoT device management gateway"),
        }
        .into_host(vec![tag("iot", "IoT", "#F97316")]),
        Seed {
            id: "host-006",
            hostname: "security-hub",
            ip: "172.16.0.40",
            mac: "00:1A:2B:3C:4D:63",
            subnet: IOT_C,
            status: HostStatus::Online,
            service: ServiceType::Security,
            os: "AlmaLinux 9",
            seen_days_ago: 0.05,
            description: None,
        }
        .into_host(vec![tag("security", "Security", "#F43F5E")]),
        racked(
            Seed {
                id: "host-007",
                hostname: "hv-node-01",
                ip: "10.20.10.21",
                mac: "00:1A:2B:3C:4D:64",
                subnet: DATACENTER_B,
                status: HostStatus::Online,
                service: ServiceType::Application,
                os: "Proxmox VE 8",
                seen_days_ago: 0.02,
                description: Some("Virtualisation node"),
            }
            .into_host(vec![tag("prod", "Production", "#2563EB")]),
            HostType::Physical,
            "rack-a1",
            10,
            2,
        ),
        guest_of(
            Seed {
                id: "host-008",
                hostname: "app-vm-01",
                ip: "10.20.10.31",
                mac: "00:1A:2B:3C:4D:65",
                subnet: DATACENTER_B,
                status: HostStatus::Online,
                service: ServiceType::Application,
                os: "Ubuntu 22.04",
                seen_days_ago: 0.02,
                description: None,
            }
            .into_host(Vec::new()),
            "host-007",
        ),
        guest_of(
            Seed {
                id: "host-009",
                hostname: "app-vm-02",
                ip: "10.20.10.32",
                mac: "00:1A:2B:3C:4D:66",
                subnet: DATACENTER_B,
                status: HostStatus::Idle,
                service: ServiceType::Application,
                os: "Ubuntu 22.04",
                seen_days_ago: 0.4,
                description: None,
            }
            .into_host(Vec::new()),
            "host-007",
        ),
    ];

    if let Some(node) = hosts.iter_mut().find(|h| h.id == "host-007") {
        node.vm_count = Some(2);
    }
    hosts
}

fn subnet(
    (id, name): (&str, &str),
    cidr: &str,
    description: &str,
    used_hosts: u32,
    color: &str,
    hosts: &[Host],
) -> Subnet {
    Subnet {
        id: id.to_string(),
        name: name.to_string(),
        cidr: cidr.to_string(),
        description: Some(description.to_string()),
        total_hosts: 254,
        used_hosts,
        color: color.to_string(),
        tags: Vec::new(),
        hosts: hosts.iter().filter(|h| h.subnet_id == id).cloned().collect(),
    }
}

/// Bundled subnets, each carrying its member hosts
pub fn subnets() -> Vec<Subnet> {
    let hosts = hosts();
    vec![
        subnet(OFFICE_A, "10.10.0.0/24", "Main office core segment", 180, "#2563EB", &hosts),
        subnet(DATACENTER_B, "10.20.10.0/24", "Standby datacenter and backup gear", 150, "#7C3AED", &hosts),
        subnet(IOT_C, "172.16.0.0/24", "IoT and OT devices", 120, "#F97316", &hosts),
    ]
}

/// Bundled racks
pub fn racks() -> Vec<Rack> {
    let hosts = hosts();
    let used_units = |rack_id: &str| -> u8 {
        hosts
            .iter()
            .filter(|h| h.rack_id.as_deref() == Some(rack_id))
            .map(Host::rack_units)
            .sum()
    };
    vec![
        Rack {
            id: "rack-a1".to_string(),
            name: "Rack A1".to_string(),
            location: "Datacenter B / Row 1".to_string(),
            total_units: DEFAULT_RACK_UNITS,
            used_units: used_units("rack-a1"),
            power_capacity: 8000,
            description: None,
            color: Some("#7C3AED".to_string()),
        },
        Rack {
            id: "rack-b1".to_string(),
            name: "Rack B1".to_string(),
            location: "Datacenter B / Row 2".to_string(),
            total_units: DEFAULT_RACK_UNITS,
            used_units: used_units("rack-b1"),
            power_capacity: 6000,
            description: Some("Reserved for expansion".to_string()),
            color: None,
        },
    ]
}

/// Bundled dashboard, derived from the bundled hosts and subnets
pub fn dashboard() -> DashboardOverview {
    let hosts = hosts();
    let subnets = subnets();
    let online: Vec<Host> = hosts.iter().filter(|h| h.status == HostStatus::Online).cloned().collect();
    let offline: Vec<Host> = hosts.iter().filter(|h| h.status != HostStatus::Online).cloned().collect();

    DashboardOverview {
        total_ips: subnets.iter().map(|s| s.total_hosts).sum(),
        online_hosts: online.len() as u32,
        offline_hosts: offline.len() as u32,
        conflict_count: 2,
        utilization_by_subnet: subnets
            .iter()
            .map(|s| SubnetUtilization {
                subnet_id: s.id.clone(),
                subnet_name: s.name.clone(),
                usage: s.usage_percent(),
            })
            .collect(),
        recent_hosts: RecentHosts {
            online: online.into_iter().take(5).collect(),
            offline: offline.into_iter().take(5).collect(),
        },
        service_distribution: [
            (ServiceType::Web, 12),
            (ServiceType::Database, 7),
            (ServiceType::Monitoring, 5),
            (ServiceType::File, 3),
            (ServiceType::Security, 4),
            (ServiceType::Application, 6),
        ]
        .into_iter()
        .map(|(service_type, count)| ServiceCount { service_type, count })
        .collect(),
    }
}

/// Deterministic stand-in for a bulk ping: roughly seven in ten ids succeed
pub fn ping(ids: &[String]) -> Vec<PingResult> {
    ids.iter()
        .map(|id| PingResult {
            id: id.clone(),
            success: fnv1a(id.as_bytes()) % 10 >= 3,
        })
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Plain-text summary used when the export endpoint fails
pub fn report_export(report_type: ReportType, generated_at: DateTime<Utc>) -> String {
    format!(
        "Report Type: {}\nGenerated At: {}\nSummary: This is a mock export.",
        report_type,
        generated_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasets_are_deterministic() {
        assert_eq!(hosts(), hosts());
        assert_eq!(subnets(), subnets());
        assert_eq!(dashboard(), dashboard());
        let ids = vec!["host-001".to_string(), "host-002".to_string()];
        assert_eq!(ping(&ids), ping(&ids));
    }

    #[test]
    fn subnets_own_their_hosts() {
        for subnet in subnets() {
            assert!(subnet.used_hosts <= subnet.total_hosts);
            assert!(subnet.hosts.iter().all(|h| h.subnet_id == subnet.id));
        }
        let total: usize = subnets().iter().map(|s| s.hosts.len()).sum();
        assert_eq!(total, hosts().len());
    }

    #[test]
    fn vms_reference_physical_hosts() {
        let hosts = hosts();
        for vm in hosts.iter().filter(|h| h.is_vm()) {
            let parent = vm.parent_host_id.as_deref().unwrap();
            assert!(hosts.iter().any(|h| h.id == parent && h.is_physical()));
        }
    }

    #[test]
    fn dashboard_counts_match_hosts() {
        let overview = dashboard();
        let hosts = hosts();
        assert_eq!(overview.online_hosts + overview.offline_hosts, hosts.len() as u32);
        assert_eq!(overview.total_ips, 254 * 3);
        assert_eq!(overview.utilization_by_subnet[0].usage, 71);
        assert!(overview.recent_hosts.online.len() <= 5);
    }

    #[test]
    fn rack_usage_is_summed_from_slots() {
        let racks = racks();
        assert_eq!(racks[0].used_units, 6);
        assert_eq!(racks[1].used_units, 0);
    }

    #[test]
    fn report_export_lists_summary_lines() {
        let text = report_export(ReportType::Inventory, anchor());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Report Type: inventory");
        assert!(lines[1].starts_with("Generated At: 2024-06-01T08:00:00"));
        assert!(lines[2].starts_with("Summary:"));
    }
}
