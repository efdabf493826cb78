//! IPAC API models
//!
//! These models match the JSON documents exchanged with the IPAC backend,
//! which uses camelCase field names throughout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slots in a standard rack
pub const DEFAULT_RACK_UNITS: u8 = 42;

/// Reachability status of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    /// Answered the last ping
    Online,
    /// Did not answer the last ping
    Offline,
    /// Reachable but not serving traffic
    Idle,
}

impl HostStatus {
    /// All statuses, in display order
    pub const ALL: [HostStatus; 3] = [HostStatus::Online, HostStatus::Offline, HostStatus::Idle];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Online => "online",
            HostStatus::Offline => "offline",
            HostStatus::Idle => "idle",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Whether a host is bare metal or a guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// Bare-metal machine, may sit in a rack
    Physical,
    /// Virtual machine running on a physical host
    Vm,
}

/// Service classification of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Web server or proxy
    Web,
    /// Database server
    Database,
    /// Application server
    Application,
    /// File or storage server
    File,
    /// Monitoring stack
    Monitoring,
    /// Firewall, VPN or other security appliance
    Security,
    /// Anything else
    Other,
}

impl ServiceType {
    /// All service types, in display order
    pub const ALL: [ServiceType; 7] = [
        ServiceType::Web,
        ServiceType::Database,
        ServiceType::Application,
        ServiceType::File,
        ServiceType::Monitoring,
        ServiceType::Security,
        ServiceType::Other,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Web => "Web",
            ServiceType::Database => "Database",
            ServiceType::Application => "Application",
            ServiceType::File => "File",
            ServiceType::Monitoring => "Monitoring",
            ServiceType::Security => "Security",
            ServiceType::Other => "Other",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Labelled marker attached to hosts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostTag {
    /// Stable identifier, unique across the palette
    pub id: String,
    /// Text shown on the badge
    pub label: String,
    /// Badge colour as a CSS hex string
    pub color: String,
}

/// Managed network device (physical machine or VM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Backend identifier
    pub id: String,
    /// DNS-style host name
    pub hostname: String,
    /// IPv4 address, unique across hosts
    pub ip_address: String,
    /// Colon-separated MAC address
    pub mac_address: String,
    /// Subnet the host belongs to
    pub subnet_id: String,
    /// Display name of that subnet, denormalised by the backend
    pub subnet_name: String,
    /// Reachability
    pub status: HostStatus,
    /// Service classification
    pub service_type: ServiceType,
    /// Operating system name and version
    pub os: String,
    /// Last time the host answered
    pub last_seen_at: DateTime<Utc>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attached tags
    #[serde(default)]
    pub tags: Vec<HostTag>,
    /// Physical or virtual; `None` for hosts the backend has not classified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<HostType>,
    /// Physical host this VM runs on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_host_id: Option<String>,
    /// Derived VM count reported by the backend; not authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_count: Option<u32>,
    /// Rack holding the host, physical hosts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<String>,
    /// Lowest U slot occupied (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_position: Option<u8>,
    /// Slot height in U, see [`Host::rack_units`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_units: Option<u8>,
}

impl Host {
    /// Slot height, defaulting to 1U
    pub fn rack_units(&self) -> u8 {
        self.rack_units.unwrap_or(1).max(1)
    }

    /// True when the host is a physical machine
    pub fn is_physical(&self) -> bool {
        self.host_type == Some(HostType::Physical)
    }

    /// True when the host is a virtual machine
    pub fn is_vm(&self) -> bool {
        self.host_type == Some(HostType::Vm)
    }

    /// True when the host carries the tag with the given id
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|tag| tag.id == tag_id)
    }
}

/// Address block grouping hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    /// Backend identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Address block in CIDR notation
    pub cidr: String,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Usable addresses in the block
    pub total_hosts: u32,
    /// Addresses held by hosts
    pub used_hosts: u32,
    /// Colour of the subnet in charts and topology areas
    pub color: String,
    /// Labels attached to the subnet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Member hosts, in display order
    #[serde(default)]
    pub hosts: Vec<Host>,
}

impl Subnet {
    /// Utilisation as a whole percentage (0 when the subnet has no capacity)
    pub fn usage_percent(&self) -> u32 {
        if self.total_hosts == 0 {
            return 0;
        }
        let ratio = f64::from(self.used_hosts) / f64::from(self.total_hosts);
        (ratio * 100.0).round() as u32
    }
}

/// Physical enclosure holding physical hosts by U slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rack {
    /// Backend identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Room or row
    pub location: String,
    /// Height in U
    #[serde(default = "default_rack_units")]
    pub total_units: u8,
    /// U slots held by hosts, as reported by the backend
    pub used_units: u8,
    /// Power budget in watts
    pub power_capacity: u32,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Colour in the rack view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn default_rack_units() -> u8 {
    DEFAULT_RACK_UNITS
}

/// Utilisation row of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetUtilization {
    /// Subnet the row describes
    pub subnet_id: String,
    /// Display name of the subnet
    pub subnet_name: String,
    /// Percentage, 0..=100
    pub usage: u32,
}

/// Recently seen hosts, split by reachability
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentHosts {
    /// Hosts that answered recently
    pub online: Vec<Host>,
    /// Hosts that stopped answering recently
    pub offline: Vec<Host>,
}

/// Histogram bucket of the service distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCount {
    /// Bucket
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Hosts in the bucket
    pub count: u32,
}

/// Read-only aggregate shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    /// Addresses in use across all subnets
    pub total_ips: u32,
    /// Hosts currently online
    pub online_hosts: u32,
    /// Hosts currently offline
    pub offline_hosts: u32,
    /// Addresses claimed by more than one host
    pub conflict_count: u32,
    /// Utilisation per subnet
    pub utilization_by_subnet: Vec<SubnetUtilization>,
    /// Recently seen hosts
    pub recent_hosts: RecentHosts,
    /// Host count per service type
    pub service_distribution: Vec<ServiceCount>,
}

/// Host list filter, sent as query parameters and re-applied client side.
///
/// Empty dimensions do not constrain the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostFilter {
    /// Case-insensitive substring matched against hostname and IP, trimmed first
    #[serde(default)]
    pub search: String,
    /// Subnet ids; a host matches any of them
    #[serde(default)]
    pub subnets: Vec<String>,
    /// Service types; a host matches any of them
    #[serde(default)]
    pub services: Vec<ServiceType>,
    /// Statuses; a host matches any of them
    #[serde(default)]
    pub statuses: Vec<HostStatus>,
    /// Tag ids; a host matches when it carries any of them
    #[serde(default)]
    pub tags: Vec<String>,
}

impl HostFilter {
    /// True when no dimension is active
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.subnets.is_empty()
            && self.services.is_empty()
            && self.statuses.is_empty()
            && self.tags.is_empty()
    }

    /// Query parameters for `GET /hosts`; list dimensions repeat their key
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs.extend(self.subnets.iter().map(|id| ("subnets", id.clone())));
        pairs.extend(self.services.iter().map(|s| ("services", s.as_str().to_string())));
        pairs.extend(self.statuses.iter().map(|s| ("statuses", s.as_str().to_string())));
        pairs.extend(self.tags.iter().map(|id| ("tags", id.clone())));
        pairs
    }
}

/// Outcome of pinging one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    /// Host id
    pub id: String,
    /// True when the host answered
    pub success: bool,
}

/// Report category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Subnet utilisation over time
    Usage,
    /// Conflicts and unreachable hosts
    Security,
    /// Full host inventory
    Inventory,
}

impl ReportType {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Usage => "usage",
            ReportType::Security => "security",
            ReportType::Inventory => "inventory",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Spreadsheet
    Xlsx,
}

impl ExportFormat {
    /// File extension, also used as the format token in file names
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// MIME type of a server-produced export
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => "application/vnd.ms-excel",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.extension())
    }
}

/// Inclusive date range of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub from: NaiveDate,
    /// Last day
    pub to: NaiveDate,
}

/// Report export parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    /// Days covered
    pub date_range: DateRange,
    /// Report category
    #[serde(rename = "type")]
    pub report_type: ReportType,
    /// Include one row per host
    pub include_details: bool,
}
